use crate::{api, cli::telemetry, domain::RemoteAuth, gateway::Gateway};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub upstream_url: Url,
    pub upstream_token: Option<SecretString>,
    pub upstream_connect_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the upstream client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth = RemoteAuth::new(
        &args.upstream_url,
        args.upstream_token,
        args.upstream_connect_timeout,
    )
    .context("Failed to build upstream authentication client")?;

    info!("Forwarding authentication to {}", auth.base_url());

    let gateway = Arc::new(Gateway::new(Arc::new(auth)));

    let result = api::new(args.port, gateway).await;

    telemetry::shutdown_tracer();

    result
}
