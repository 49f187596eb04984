//! `rollcalld`: runs the Rollcall HTTP service.
//!
//! Configuration comes from the environment (and a `.env` file, if
//! present); see [`ServerConfig`](rollcall::ServerConfig). Log verbosity
//! follows `RUST_LOG`, defaulting to `info`.

use rollcall::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RollcallError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // Real sign-in is left to a deployment-specific Authenticator.
    tracing::warn!("using the development authenticator: bearer tokens are trusted as-is");

    RollcallServer::<DevAuthenticator>::builder()
        .config(config)
        .build(DevAuthenticator)
        .await?
        .run()
        .await
}
