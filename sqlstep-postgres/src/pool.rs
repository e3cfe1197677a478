//! Lazily connected PostgreSQL pool.
//!
//! A migration run issues its statements one after another, so the pool is
//! small by default. Connections are opened on first use, which lets a
//! caller build a pool (and a gateway) before the server is reachable.

use std::sync::Arc;
use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::{debug, info};

use crate::config::PgConfig;
use crate::connection::PgConnection;
use crate::error::{PgError, PgResult};

/// Default number of pooled connections.
pub const DEFAULT_MAX_SIZE: usize = 2;

/// Size and timeout limits applied to a [`PgPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLimits {
    /// Upper bound on open connections.
    pub max_size: usize,
    /// How long a caller waits for a free connection.
    pub wait_timeout: Option<Duration>,
    /// How long opening a new connection may take.
    pub create_timeout: Option<Duration>,
    /// How long checking an idle connection before reuse may take.
    pub recycle_timeout: Option<Duration>,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            wait_timeout: Some(Duration::from_secs(30)),
            create_timeout: Some(Duration::from_secs(30)),
            recycle_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Point-in-time view of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections currently open.
    pub size: usize,
    /// Open connections not checked out.
    pub available: usize,
    /// Configured upper bound.
    pub max_size: usize,
    /// Callers blocked waiting for a connection.
    pub waiting: usize,
}

/// A pool of PostgreSQL connections shared by the gateway.
#[derive(Clone)]
pub struct PgPool {
    inner: Pool,
    config: Arc<PgConfig>,
}

impl PgPool {
    /// Build a pool with default limits.
    pub async fn new(config: PgConfig) -> PgResult<Self> {
        Self::with_limits(config, PoolLimits::default()).await
    }

    /// Build a pool with explicit limits. No connection is opened here.
    pub async fn with_limits(config: PgConfig, limits: PoolLimits) -> PgResult<Self> {
        let manager = Manager::from_config(
            config.to_pg_config(),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let inner = Pool::builder(manager)
            .runtime(Runtime::Tokio1)
            .max_size(limits.max_size)
            .wait_timeout(limits.wait_timeout)
            .create_timeout(limits.create_timeout)
            .recycle_timeout(limits.recycle_timeout)
            .build()
            .map_err(|e| PgError::config(format!("cannot build connection pool: {}", e)))?;

        info!(
            target_db = %config.display_target(),
            max_size = limits.max_size,
            "PostgreSQL pool ready"
        );

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Start building a pool.
    pub fn builder() -> PgPoolBuilder {
        PgPoolBuilder::default()
    }

    /// Check out a connection, opening one if none is idle.
    pub async fn get(&self) -> PgResult<PgConnection> {
        let client = self.inner.get().await?;
        debug!(target_db = %self.config.display_target(), "Checked out connection");
        Ok(PgConnection::new(client))
    }

    /// Current occupancy.
    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            size: status.size as usize,
            available: status.available as usize,
            max_size: status.max_size as usize,
            waiting: status.waiting as usize,
        }
    }

    /// Connection settings the pool was built from.
    pub fn config(&self) -> &PgConfig {
        &self.config
    }
}

/// Builder for [`PgPool`]. Either a URL or a parsed config is required.
#[derive(Debug, Default)]
pub struct PgPoolBuilder {
    url: Option<String>,
    config: Option<PgConfig>,
    limits: PoolLimits,
}

impl PgPoolBuilder {
    /// Connect using a `postgresql://` URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Connect using an already parsed config. Takes precedence over [`url`](Self::url).
    pub fn config(mut self, config: PgConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.limits.max_size = max_size;
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.limits.wait_timeout = Some(timeout);
        self
    }

    pub fn create_timeout(mut self, timeout: Duration) -> Self {
        self.limits.create_timeout = Some(timeout);
        self
    }

    /// Build the pool.
    pub async fn build(self) -> PgResult<PgPool> {
        let config = match (self.config, self.url) {
            (Some(config), _) => config,
            (None, Some(url)) => PgConfig::from_url(url)?,
            (None, None) => {
                return Err(PgError::config("a database URL or config is required"));
            }
        };

        PgPool::with_limits(config, self.limits).await
    }
}
