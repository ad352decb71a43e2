use rusqlite::OptionalExtension;

#[cfg(test)]
use std::{cell::RefCell, collections::HashMap};

/// A synchronous string key-value store, the only thing the user store needs
/// from its backend.
pub trait KeyValueStorage {
    // Gets the value stored under key, if there is one
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;

    // Stores value under key, replacing whatever was there
    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error>;

    // Removes key. Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), anyhow::Error>;
}

#[derive(Default, Debug)]
pub struct StorageCreater {
    file_path: Option<String>,
}

pub struct SqliteStorage {
    connection: rusqlite::Connection,
}

impl StorageCreater {
    pub fn open_else_new(file_path: &str) -> Self {
        Self {
            file_path: Some(file_path.to_string()),
        }
    }

    pub fn open_in_memory() -> Self {
        Self::default()
    }

    fn initialize_table_if_needed(storage: SqliteStorage) -> Result<SqliteStorage, anyhow::Error> {
        let statement = r#"
CREATE TABLE IF NOT EXISTS "kv_store" (
  "KEY"	TEXT NOT NULL,
  "VALUE"	TEXT NOT NULL,
  PRIMARY KEY("KEY")
);
"#;
        let _ = storage.connection.execute(statement, ())?;
        Ok(storage)
    }

    pub fn start(self) -> Result<SqliteStorage, anyhow::Error> {
        let storage = match self.file_path {
            Some(path) => {
                log::debug!("Opening key-value store at {}", path);
                SqliteStorage {
                    connection: rusqlite::Connection::open(path)?,
                }
            }
            None => SqliteStorage {
                connection: rusqlite::Connection::open_in_memory()?,
            },
        };

        Self::initialize_table_if_needed(storage)
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut statement = self
            .connection
            .prepare(r#"SELECT VALUE FROM kv_store WHERE KEY = ? LIMIT 1;"#)?;
        Ok(statement
            .query_row((key,), |row| row.get::<_, String>(0))
            .optional()?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let statement = r#"INSERT OR REPLACE INTO kv_store (KEY, VALUE) VALUES (?, ?);"#;
        let _ = self.connection.execute(statement, (key, value))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        let _ = self
            .connection
            .execute(r#"DELETE FROM kv_store WHERE KEY = ?;"#, (key,))?;
        Ok(())
    }
}

#[cfg(test)]
pub struct MockStorage {
    pub entries: RefCell<HashMap<String, String>>,
    pub get_ret_val: Result<(), anyhow::Error>,
    pub set_ret_val: Result<(), anyhow::Error>,
    pub remove_ret_val: Result<(), anyhow::Error>,
}

#[cfg(test)]
impl Default for MockStorage {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            get_ret_val: Ok(()),
            set_ret_val: Ok(()),
            remove_ret_val: Ok(()),
        }
    }
}

#[cfg(test)]
impl MockStorage {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let storage = Self::default();
        storage.entries.borrow_mut().extend(
            entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        storage
    }

    fn mock_result(ret_val: &Result<(), anyhow::Error>) -> Result<(), anyhow::Error> {
        ret_val
            .as_ref()
            .map_err(|e| anyhow::anyhow!("mock error {}", e))
            .cloned()
    }
}

#[cfg(test)]
impl KeyValueStorage for MockStorage {
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Self::mock_result(&self.get_ret_val)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        Self::mock_result(&self.set_ret_val)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        Self::mock_result(&self.remove_ret_val)?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
