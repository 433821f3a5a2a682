//! Store connection lifecycle.
//!
//! One `Connection` is created per process and shared by cloning. Lifecycle
//! failures are returned as values like every other adapter operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::StoreConfig;
use tracing::{error, info};

use crate::infra::Database;

use super::backend::DocumentBackend;
use super::error::{StoreError, StoreResult};
use super::memory::MemoryBackend;
use super::sql::SqlBackend;

/// Shared handle to the connected document backend.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    backend: Arc<dyn DocumentBackend>,
    connected: AtomicBool,
}

impl Connection {
    /// Connect using a connection string and default pool bounds.
    ///
    /// `memory://` selects the in-process backend; anything else is handed
    /// to SeaORM and pending migrations are applied.
    pub async fn init(connection_string: &str) -> StoreResult<Self> {
        Self::init_with(&StoreConfig::new(connection_string)).await
    }

    /// Connect using a full store configuration.
    pub async fn init_with(config: &StoreConfig) -> StoreResult<Self> {
        let backend: Arc<dyn DocumentBackend> = if config.is_memory() {
            Arc::new(MemoryBackend::new())
        } else {
            let db = Database::connect(config).await.map_err(|e| {
                error!("Error connecting to database: {}", e);
                StoreError::Connection(e.to_string())
            })?;
            Arc::new(SqlBackend::new(db.get_connection()))
        };

        info!("Connected to database");
        Ok(Self::with_backend(backend))
    }

    /// Wrap an already connected backend.
    pub fn with_backend(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                backend,
                connected: AtomicBool::new(true),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Round-trip to the backend.
    pub async fn ping(&self) -> StoreResult<()> {
        self.backend()?
            .ping()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    /// Tear the connection down. Calling it again is a no-op.
    pub async fn shutdown(&self) -> StoreResult<()> {
        if !self.inner.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        self.inner.backend.close().await.map_err(|e| {
            error!("Error disconnecting from database: {}", e);
            StoreError::Disconnect(e.to_string())
        })?;

        info!("Disconnected from database");
        Ok(())
    }

    pub(crate) fn backend(&self) -> StoreResult<&dyn DocumentBackend> {
        if self.is_connected() {
            Ok(self.inner.backend.as_ref())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}
