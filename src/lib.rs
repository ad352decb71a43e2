//! Player accounts and per-game scores for a small game suite, persisted to a
//! local key-value store.

pub mod appstate;
pub mod storage;
pub mod userstore;
