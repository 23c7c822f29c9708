use std::path::Path;

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

/// Handle to the SQLite store. Open it once at start-up and clone it into
/// whatever needs to run queries; every clone talks to the same background
/// connection thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database file at `path`, run the bootstrap schema,
    /// and return a live handle. Foreign keys are switched on so reservations
    /// cannot point at customers that do not exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(Error::from)?;
        Self::with_schema(conn).await
    }

    /// Private in-memory database with the schema applied.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(Error::from)?;
        Self::with_schema(conn).await
    }

    async fn with_schema(conn: tokio_rusqlite::Connection) -> Result<Self> {
        let db = Self { conn };
        db.call(|conn| ensure_schema(conn)).await?;
        Ok(db)
    }

    /// Run `query` on the connection's background thread. This is the only
    /// place the async side of the crate touches SQLite.
    pub async fn call<F, T>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.conn.call(query).await.map_err(Error::from_call)
    }

    /// Close the connection. Every clone of the handle is closed with it.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(Error::from_call)?;
        info!("database closed");
        Ok(())
    }
}

/// Enable foreign keys and create the two tables the queries rely on. This is
/// a fixed bootstrap, not a migration runner: existing tables are left alone.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            notes TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            num_guests INTEGER NOT NULL,
            start_at TEXT NOT NULL,
            notes TEXT,
            FOREIGN KEY(customer_id) REFERENCES customers(id) ON DELETE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS reservations_customer_id ON reservations (customer_id)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_applied_in_memory() {
        let db = Database::open_in_memory().await.unwrap();

        let tables: Vec<String> = db
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(names)
            })
            .await
            .unwrap();

        assert_eq!(tables, vec!["customers", "reservations"]);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        db.call(|conn| ensure_schema(conn)).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory().await.unwrap();

        let err = db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO reservations (customer_id, num_guests, start_at) VALUES (99, 2, '2024-01-01 19:00:00')",
                    [],
                )
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), 500);
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn storage_errors_surface_unchanged() {
        let db = Database::open_in_memory().await.unwrap();

        let err = db
            .call(|conn| conn.execute("SELECT * FROM no_such_table", []))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no_such_table"));
    }

    #[tokio::test]
    async fn failed_query_leaves_handle_usable() {
        let db = Database::open_in_memory().await.unwrap();

        let err = db
            .call(|conn| conn.execute("INSERT INTO nowhere VALUES (1)", []))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        let count: i64 = db
            .call(|conn| conn.query_row("SELECT count(*) FROM customers", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn close_shuts_every_clone() {
        let db = Database::open_in_memory().await.unwrap();
        let shared = db.clone();

        db.close().await.unwrap();
        let err = shared
            .call(|conn| conn.query_row("SELECT count(*) FROM customers", [], |row| row.get::<_, i64>(0)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(err.status(), 500);
    }
}
