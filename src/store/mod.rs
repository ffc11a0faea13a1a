// Document store module
//
// The store lives under <root>/.shoptrack/. Callers keep only the root path;
// every operation opens a short-lived connection with pragmas set.

pub mod documents;
pub mod migrations;
pub mod subscription;

use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;

use crate::constants::{BUSY_TIMEOUT_MS, DB_FILENAME, SHOPTRACK_FOLDER, UPLOADS_FOLDER};

pub use documents::{Document, DocumentStore};
pub use subscription::{Subscription, SubscriptionHub};

/// Get the database path for a store root
pub fn get_db_path(root: &Path) -> PathBuf {
    root.join(SHOPTRACK_FOLDER).join(DB_FILENAME)
}

/// Get the .shoptrack folder path for a store root
pub fn get_shoptrack_path(root: &Path) -> PathBuf {
    root.join(SHOPTRACK_FOLDER)
}

/// Get the uploads folder path for a store root
pub fn get_uploads_path(root: &Path) -> PathBuf {
    root.join(SHOPTRACK_FOLDER).join(UPLOADS_FOLDER)
}

/// Default store root when none is given: the user's home directory.
pub fn default_root() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(dirs.home_dir().to_path_buf())
}

/// Initialize store folder structure and schema at the given root.
pub fn init_store(root: &Path) -> Result<()> {
    std::fs::create_dir_all(get_shoptrack_path(root))?;
    std::fs::create_dir_all(get_uploads_path(root))?;

    let conn = open_db(&get_db_path(root))?;
    drop(conn);
    Ok(())
}

/// Open or create a database at the given path, running migrations.
pub fn open_db(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    set_pragmas(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Open a short-lived connection with pragmas set. Does NOT run migrations.
pub fn open_store_connection(root: &Path) -> Result<Connection> {
    let db_path = get_db_path(root);
    if !db_path.exists() {
        anyhow::bail!("No store found at {}", root.display());
    }
    let conn = Connection::open(&db_path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

fn set_pragmas(conn: &Connection) -> Result<()> {
    // Foreign keys must be enabled per connection
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // WAL mode so CLI invocations and tests may overlap safely
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_store_creates_folders_and_db() {
        let tmp = TempDir::new().unwrap();
        init_store(tmp.path()).unwrap();

        assert!(get_db_path(tmp.path()).exists());
        assert!(get_uploads_path(tmp.path()).is_dir());

        // Re-init is harmless
        init_store(tmp.path()).unwrap();
    }

    #[test]
    fn open_store_connection_requires_existing_store() {
        let tmp = TempDir::new().unwrap();
        assert!(open_store_connection(tmp.path()).is_err());

        init_store(tmp.path()).unwrap();
        assert!(open_store_connection(tmp.path()).is_ok());
    }
}
