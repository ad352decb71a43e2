use chrono::Utc;
use indexmap::IndexMap;
use itertools::Itertools;

mod error;
pub mod types;

use crate::storage::KeyValueStorage;
pub use error::UserStoreError;
use types::{checked_add, GameData, GameId, UserRecord};

const CURRENT_USER_KEY: &str = "currentUser";
const ALL_USERS_KEY: &str = "allUsers";
const MIN_USERNAME_LEN: usize = 3;
const LEADERBOARD_SIZE: usize = 10;

pub const USER_CREATED_MESSAGE: &str = "User created successfully!";
pub const LOGGED_IN_MESSAGE: &str = "Logged in successfully!";
pub const POINTS_ADDED_MESSAGE: &str = "Points added!";
pub const USER_DELETED_MESSAGE: &str = "User deleted!";

/// Accounts and scores, mirrored in memory and written through to storage on
/// every change.
pub struct UserStore<S: KeyValueStorage> {
    storage: S,
    current_user: Option<String>,
    users: IndexMap<String, UserRecord>,
}

fn normalize_username(username: &str) -> String {
    username.trim().to_uppercase()
}

impl<S: KeyValueStorage> UserStore<S> {
    /// Loads the session and all users from storage. Anything missing or
    /// unreadable starts out empty.
    pub fn new(storage: S) -> Self {
        let users = Self::load_all_users(&storage);
        let current_user = Self::load_current_user(&storage).filter(|username| {
            let exists = users.contains_key(username);
            if !exists {
                log::warn!(
                    "Saved session for {} has no matching user, starting logged out",
                    username
                );
            }
            exists
        });

        log::debug!("Loaded {} users, session: {:?}", users.len(), current_user);

        Self {
            storage,
            current_user,
            users,
        }
    }

    fn load_current_user(storage: &S) -> Option<String> {
        match storage.get(CURRENT_USER_KEY) {
            Ok(username) => username.filter(|username| !username.is_empty()),
            Err(e) => {
                log::warn!("problem reading the saved session, ignoring it {}", e);
                None
            }
        }
    }

    fn load_all_users(storage: &S) -> IndexMap<String, UserRecord> {
        match storage.get(ALL_USERS_KEY) {
            Ok(Some(saved)) => serde_json::from_str(&saved).unwrap_or_else(|e| {
                log::warn!("saved users are corrupt, starting empty {}", e);
                IndexMap::new()
            }),
            Ok(None) => IndexMap::new(),
            Err(e) => {
                log::warn!("problem reading the saved users, starting empty {}", e);
                IndexMap::new()
            }
        }
    }

    fn save_users(&self) -> Result<(), UserStoreError> {
        let serialized = serde_json::to_string(&self.users)?;
        self.storage.set(ALL_USERS_KEY, &serialized)?;
        log::debug!("Saved {} users", self.users.len());
        Ok(())
    }

    pub fn create_user(&mut self, username: &str) -> Result<&UserRecord, UserStoreError> {
        let username = normalize_username(username);

        if username.is_empty() {
            return Err(UserStoreError::Validation("Username cannot be empty!".to_string()));
        }

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(UserStoreError::Validation(format!(
                "Username must be at least {} characters!",
                MIN_USERNAME_LEN
            )));
        }

        if self.users.contains_key(&username) {
            return Err(UserStoreError::Duplicate);
        }

        let (index, _) = self.users.insert_full(
            username.clone(),
            UserRecord::new(username.clone(), Utc::now()),
        );

        if let Err(e) = self.save_users() {
            log::error!("problem saving new user {}, rolling back {}", username, e);
            self.users.shift_remove(&username);
            return Err(e);
        }

        log::info!("Created user {}", username);
        Ok(&self.users[index])
    }

    pub fn login(&mut self, username: &str) -> Result<&UserRecord, UserStoreError> {
        let username = normalize_username(username);
        let Some(index) = self.users.get_index_of(&username) else {
            return Err(UserStoreError::NotFound);
        };

        self.storage.set(CURRENT_USER_KEY, &username)?;
        log::info!("{} logged in", username);
        self.current_user = Some(username);

        Ok(&self.users[index])
    }

    pub fn logout(&mut self) -> Result<(), UserStoreError> {
        let previous = self.current_user.take();
        if let Err(e) = self.storage.remove(CURRENT_USER_KEY) {
            self.current_user = previous;
            return Err(e.into());
        }

        if let Some(username) = previous {
            log::info!("{} logged out", username);
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn get_current_user_data(&self) -> Option<&UserRecord> {
        self.current_user
            .as_deref()
            .and_then(|username| self.users.get(username))
    }

    /// Looks a user up by name, in any letter case.
    pub fn get_user(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(&normalize_username(username))
    }

    /// Records a finished game for the logged-in user.
    ///
    /// Game ids that aren't known still count towards the user's total points
    /// and games played, but no per-game stats are touched.
    pub fn add_points(
        &mut self,
        game: &str,
        points: u64,
        data: &GameData,
    ) -> Result<&UserRecord, UserStoreError> {
        let index = self
            .current_user
            .as_deref()
            .and_then(|username| self.users.get_index_of(username))
            .ok_or(UserStoreError::NoSession)?;

        let previous = self.users[index].clone();
        let recorded = Self::record_points(&mut self.users[index], game, points, data);

        if let Err(e) = recorded.and_then(|_| self.save_users()) {
            log::error!(
                "problem saving points for {}, rolling back {}",
                previous.username,
                e
            );
            self.users[index] = previous;
            return Err(e);
        }

        log::debug!("{} scored {} points in {}", previous.username, points, game);
        Ok(&self.users[index])
    }

    fn record_points(
        user: &mut UserRecord,
        game: &str,
        points: u64,
        data: &GameData,
    ) -> Result<(), UserStoreError> {
        let total_points = checked_add(user.total_points, points)?;
        let games_played = checked_add(user.games_played, 1)?;

        match game.parse::<GameId>() {
            Ok(GameId::Wordle) => user.games.wordle.record(points, data)?,
            Ok(GameId::NumberGuessing) => user.games.number_guessing.record(points, data)?,
            Ok(GameId::Palindrome) => user.games.palindrome.record(points)?,
            Err(_) => log::debug!("Unknown game {}, only updating totals", game),
        }

        user.total_points = total_points;
        user.games_played = games_played;
        Ok(())
    }

    /// The top users by total points. Users with equal points keep the order
    /// they were created in.
    pub fn get_leaderboard(&self) -> Vec<&UserRecord> {
        self.users
            .values()
            .sorted_by(|a, b| b.total_points.cmp(&a.total_points))
            .take(LEADERBOARD_SIZE)
            .collect()
    }

    /// Returns whether a user was deleted. Deleting the logged-in user also
    /// logs them out.
    pub fn delete_user(&mut self, username: &str) -> Result<bool, UserStoreError> {
        let username = normalize_username(username);
        let Some((index, key, record)) = self.users.shift_remove_full(&username) else {
            return Ok(false);
        };

        if let Err(e) = self.save_users() {
            log::error!("problem deleting user {}, rolling back {}", username, e);
            self.users.shift_insert(index, key, record);
            return Err(e);
        }

        log::info!("Deleted user {}", username);

        if self.current_user.as_deref() == Some(username.as_str()) {
            // the user is already gone, so the session goes regardless of the write
            self.current_user = None;
            if let Err(e) = self.storage.remove(CURRENT_USER_KEY) {
                log::warn!("problem clearing the saved session for {} {}", username, e);
            }
        }

        Ok(true)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
