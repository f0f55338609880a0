use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Primary manager for SQLite database operations; provides async-friendly access to the synchronous rusqlite connection using tokio's spawn_blocking.
#[derive(Clone)]
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// Open the SQLite database at `db_path` and configure it for concurrent readers.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref();
        let connection = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        connection
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;",
            )
            .context("Failed to configure database")?;

        info!("Opened database at {}", path.display());

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Private in-memory database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("Failed to open in-memory database")?;
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to configure database")?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Execute a blocking database operation on tokio's blocking thread pool.
    /// The closure gets exclusive access to the connection, so it may open a transaction.
    pub async fn execute_blocking<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connection.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            operation(&mut conn)
        })
        .await
        .context("Failed to execute blocking database operation - task join error")?
        .context("Database operation failed")
    }

    /// Create all tables; reads and executes schema.sql statement by statement.
    pub async fn initialize_database(&self) -> Result<()> {
        let schema = include_str!("schema.sql");

        self.execute_blocking(move |connection| {
            for (i, statement) in schema.split(';').enumerate() {
                let sql = statement
                    .lines()
                    .filter(|line| !line.trim_start().starts_with("--"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let trimmed = sql.trim();

                if trimmed.is_empty() {
                    continue;
                }

                if let Err(e) = connection.execute(trimmed, []) {
                    error!("Schema statement {} failed: {}", i + 1, e);
                    debug!("Full statement: {}", trimmed);
                    return Err(e);
                }
                debug!("Schema statement {} applied", i + 1);
            }
            Ok(())
        })
        .await
        .context("Failed to initialize database schema")?;

        info!("Database schema ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_creates_every_table() {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.initialize_database().await.unwrap();
        // applying it twice is harmless
        db.initialize_database().await.unwrap();

        let tables: Vec<String> = db
            .execute_blocking(|conn| {
                let mut stmt =
                    conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert_eq!(tables, vec!["dosages", "medicines", "patients", "regimens", "tasks"]);
    }
}
