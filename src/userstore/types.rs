use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserStoreError;

pub(super) fn checked_add(value: u64, amount: u64) -> Result<u64, UserStoreError> {
    value.checked_add(amount).ok_or(UserStoreError::PointsOverflow)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub total_points: u64,
    pub games_played: u64,
    pub games: GameStats,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(username: String, created_at: DateTime<Utc>) -> Self {
        Self {
            username,
            total_points: 0,
            games_played: 0,
            games: GameStats::default(),
            created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub wordle: RoundStats,
    pub number_guessing: RoundStats,
    pub palindrome: CheckStats,
}

/// Stats for games that are won or lost, where a lower score is better.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundStats {
    pub wins: u64,
    pub plays: u64,
    pub best_score: Option<f64>,
    pub total_points: u64,
}

impl RoundStats {
    /// Leaves the stats untouched when a counter would overflow.
    pub fn record(&mut self, points: u64, data: &GameData) -> Result<(), UserStoreError> {
        let plays = checked_add(self.plays, 1)?;
        let total_points = checked_add(self.total_points, points)?;
        let wins = if data.won {
            checked_add(self.wins, 1)?
        } else {
            self.wins
        };

        self.plays = plays;
        self.total_points = total_points;
        self.wins = wins;
        // non-finite scores don't survive a JSON round trip
        if let Some(score) = data.score.filter(|score| score.is_finite()) {
            match self.best_score {
                Some(best) if best <= score => {}
                _ => self.best_score = Some(score),
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckStats {
    pub checks: u64,
    pub total_points: u64,
}

impl CheckStats {
    pub fn record(&mut self, points: u64) -> Result<(), UserStoreError> {
        let checks = checked_add(self.checks, 1)?;
        self.total_points = checked_add(self.total_points, points)?;
        self.checks = checks;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameId {
    Wordle,
    NumberGuessing,
    Palindrome,
}

impl FromStr for GameId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wordle" => Ok(GameId::Wordle),
            "numberGuessing" => Ok(GameId::NumberGuessing),
            "palindrome" => Ok(GameId::Palindrome),
            _ => Err(()),
        }
    }
}

/// What a single finished game reports alongside its points.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameData {
    pub won: bool,
    pub score: Option<f64>,
}

impl GameData {
    pub fn won_with_score(score: f64) -> Self {
        Self {
            won: true,
            score: Some(score),
        }
    }

    pub fn lost_with_score(score: f64) -> Self {
        Self {
            won: false,
            score: Some(score),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}
