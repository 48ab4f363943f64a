//! SQLite driver implementation

use async_trait::async_trait;
use sqlfan_core::{ConnectionParams, Driver, Result, Session, SessionFactory};
use std::path::{Path, PathBuf};

use crate::SqliteSession;

/// Opens sessions on one SQLite database file.
///
/// Works both as a [`SessionFactory`] and as a [`Driver`]; the driver form
/// ignores the credential bundle. With the path `:memory:` every session gets
/// its own private in-memory database.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    path: PathBuf,
}

impl SqliteDriver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::debug!(path = %path.display(), "SQLite driver initialized");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_session(&self) -> Result<Box<dyn Session>> {
        let session = SqliteSession::open(&self.path).await?;
        Ok(Box::new(session))
    }
}

#[async_trait]
impl SessionFactory for SqliteDriver {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        self.open_session().await
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[tracing::instrument(skip_all, fields(path = %self.path.display(), account = %params.account))]
    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        self.open_session().await
    }
}
