use std::env;

use crate::{
    storage::{SqliteStorage, StorageCreater},
    userstore::UserStore,
};

#[cfg(test)]
use crate::storage::MockStorage;

const DEFAULT_STORE_PATH: &str = "local.db";
const STORE_PATH_ENV: &str = "GAME_USER_STORE_PATH";

/// Where the real store keeps its data, `GAME_USER_STORE_PATH` if set.
pub fn store_path() -> String {
    env::var(STORE_PATH_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
}

pub fn new_real_user_store() -> Result<UserStore<SqliteStorage>, anyhow::Error> {
    let path = store_path();
    log::info!("Opening user store at {}", path);

    Ok(UserStore::new(StorageCreater::open_else_new(&path).start()?))
}

pub fn new_memory_user_store() -> Result<UserStore<SqliteStorage>, anyhow::Error> {
    Ok(UserStore::new(StorageCreater::open_in_memory().start()?))
}

#[cfg(test)]
pub fn new_testing_user_store(storage: MockStorage) -> UserStore<MockStorage> {
    UserStore::new(storage)
}
