//! Two simulated links driving the status coordinator through a connect,
//! a recovered retry attempt, a cancelled retry attempt, and client
//! shutdown.
//!
//! Run with `RUST_LOG=debug cargo run --example link_simulation` to see
//! the rejected transitions as well.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uplink_conn::{ConnectionStatus, LinkId, RetryToken, StatusCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let coordinator = Arc::new(StatusCoordinator::default());

    // Both links come up. An untouched link compares as disabled, so the
    // guarded form works from the very first transition.
    for link in LinkId::ALL {
        coordinator.request_transition_from(
            link,
            ConnectionStatus::Disabled,
            ConnectionStatus::Connected,
        );
    }
    info!(client = %coordinator.client_status(), "links established");

    // The telemetry link drops; its retry attempt succeeds on the second
    // try and reconnects the link.
    let result = coordinator.request_transition(LinkId::Telemetry, ConnectionStatus::Retrying);
    let Some(token) = result.retry_token else {
        anyhow::bail!("entering retrying should have issued a token");
    };
    let telemetry = tokio::spawn(retry_loop(
        Arc::clone(&coordinator),
        LinkId::Telemetry,
        token,
        2,
    ));
    telemetry.await?;
    info!(client = %coordinator.client_status(), "telemetry recovered");

    // The commands link drops too, but its backoff is still running when
    // the client shuts down, so its attempt is cancelled instead.
    let result = coordinator.request_transition(LinkId::Commands, ConnectionStatus::Retrying);
    let Some(token) = result.retry_token else {
        anyhow::bail!("entering retrying should have issued a token");
    };
    let commands = tokio::spawn(retry_loop(
        Arc::clone(&coordinator),
        LinkId::Commands,
        token,
        u32::MAX,
    ));

    sleep(Duration::from_millis(40)).await;
    coordinator.disable_all();
    commands.await?;

    // Terminal means terminal: nothing reopens after shutdown.
    let revived = coordinator.request_transition(LinkId::Commands, ConnectionStatus::Connected);
    info!(
        accepted = revived.accepted(),
        client = %coordinator.client_status(),
        "client shut down"
    );
    Ok(())
}

/// Cooperative retry attempt: backs off between tries and reconnects the
/// link after `succeeds_after` failures, unless the token fires first.
async fn retry_loop(
    coordinator: Arc<StatusCoordinator>,
    link: LinkId,
    token: RetryToken,
    succeeds_after: u32,
) {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let backoff = Duration::from_millis(u64::from(attempt) * 20);
        if token.run_until_cancelled(sleep(backoff)).await.is_none() {
            warn!(link = %link, attempt, "retry attempt cancelled");
            return;
        }
        if attempt >= succeeds_after {
            let result = coordinator.request_transition_from(
                link,
                ConnectionStatus::Retrying,
                ConnectionStatus::Connected,
            );
            if result.accepted() {
                info!(link = %link, attempt, "link reconnected");
            } else {
                warn!(link = %link, attempt, "link state moved on, giving up");
            }
            return;
        }
        info!(link = %link, attempt, "retry attempt failed, backing off");
    }
}
