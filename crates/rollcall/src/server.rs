//! `RollcallServer` builder and serve loop.
//!
//! This is the entry point for running the service. It ties the layers
//! together: file store → session engine → HTTP router.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use rollcall_session::{AttendanceManager, FenceConfig, SessionConfig};
use rollcall_store::FileStore;
use tokio::net::TcpListener;

use crate::handler::{AppState, router};
use crate::{Authenticator, RollcallError, ServerConfig};

/// Builder for configuring and starting a Rollcall server.
///
/// # Example
///
/// ```rust,no_run
/// use rollcall::prelude::*;
///
/// # async fn run() -> Result<(), RollcallError> {
/// let server = RollcallServer::<DevAuthenticator>::builder()
///     .bind("0.0.0.0:5000")
///     .build(DevAuthenticator)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RollcallServerBuilder {
    config: ServerConfig,
}

impl RollcallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. with one read by
    /// [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the root directory of the file store.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Sets the session engine configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the check-in fence configuration.
    pub fn fence(mut self, config: FenceConfig) -> Self {
        self.config.fence = config;
        self
    }

    /// Opens the store and the session engine. Doesn't bind yet.
    ///
    /// # Errors
    /// [`RollcallError::Store`] if the data directory can't be created,
    /// or [`RollcallError::Attendance`] if the stored sessions can't be
    /// read.
    pub async fn build<A: Authenticator>(self, auth: A) -> Result<RollcallServer<A>, RollcallError> {
        let store = Arc::new(FileStore::open(&self.config.data_dir).await?);
        let manager = AttendanceManager::open(store, self.config.session.clone())
            .await?
            .with_fence_config(&self.config.fence);

        if self.config.fence.enabled {
            tracing::info!(
                lat = self.config.fence.latitude,
                lng = self.config.fence.longitude,
                radius_m = self.config.fence.radius_m,
                "check-in fence enabled"
            );
        }

        Ok(RollcallServer {
            config: self.config,
            state: AppState {
                manager: Arc::new(manager),
                auth: Arc::new(auth),
            },
        })
    }
}

/// A configured Rollcall server.
///
/// Call [`run()`](Self::run) to start accepting requests, or take the
/// [`router()`](Self::router) to drive it in-process.
pub struct RollcallServer<A: Authenticator> {
    config: ServerConfig,
    state: AppState<A>,
}

impl<A: Authenticator> RollcallServer<A> {
    /// Creates a new builder.
    pub fn builder() -> RollcallServerBuilder {
        RollcallServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The full route table.
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Binds `bind_addr` and serves until Ctrl-C.
    pub async fn run(self) -> Result<(), RollcallError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            data_dir = %self.config.data_dir.display(),
            "Rollcall server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Rollcall server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
