//! Document-store abstraction backing data ingestion.
//!
//! The pipeline only needs "fetch all records from collection X in database
//! Y as rows of named fields". The production implementation keeps one
//! SQLite file per database under a root directory, one table per
//! collection, each document stored as a JSON body.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub trait DocumentStore: Send + Sync {
    /// Fetch every document of a collection, in insertion order.
    fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Map<String, Value>>>;
}

/// SQLite-backed document store.
pub struct SqliteDocumentStore {
    root: PathBuf,
}

impl SqliteDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Insert documents into a collection, creating database and table on
    /// first use. Returns the number of inserted documents.
    pub fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: &[Map<String, Value>],
    ) -> Result<usize> {
        let table = table_name(collection)?;
        let mut conn = self.open(database, false)?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL)"
            ),
            [],
        )?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {table} (body) VALUES (?1)"))?;
            for doc in documents {
                let body = serde_json::to_string(doc)?;
                stmt.execute([body])?;
            }
        }
        tx.commit()?;
        Ok(documents.len())
    }

    fn open(&self, database: &str, read_only: bool) -> Result<rusqlite::Connection> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create store root {}", self.root.display()))?;
        let path = self.root.join(format!("{database}.db"));
        let conn = if read_only {
            rusqlite::Connection::open_with_flags(
                &path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
            )
            .with_context(|| format!("open database {}", path.display()))?
        } else {
            rusqlite::Connection::open(&path)
                .with_context(|| format!("open database {}", path.display()))?
        };
        Ok(conn)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Map<String, Value>>> {
        let table = table_name(collection)?;
        let conn = self.open(database, true)?;
        let mut stmt = conn.prepare(&format!("SELECT body FROM {table} ORDER BY id"))?;

        let mut documents = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let body: String = row.get(0)?;
            let doc: Map<String, Value> = serde_json::from_str(&body)
                .with_context(|| format!("malformed document in {database}.{collection}"))?;
            documents.push(doc);
        }
        Ok(documents)
    }
}

/// Collection names become table names, so restrict them to identifiers.
fn table_name(collection: &str) -> Result<String> {
    if collection.is_empty()
        || !collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || collection.chars().next().is_some_and(|c| c.is_ascii_digit())
    {
        bail!("invalid collection name: {collection:?}");
    }
    Ok(collection.to_string())
}
