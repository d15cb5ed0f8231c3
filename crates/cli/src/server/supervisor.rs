use axum::Router;
use dohgate_domain::config::ServerConfig;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{start_fcgi_server, start_http_server, start_https_server};

type ListenerResult = (&'static str, anyhow::Result<()>);

/// How long cancelled listeners get to finish open connections before they
/// are aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Starts every enabled listener and waits for the first one to finish.
///
/// Listeners are expected to run forever, so any completion (error or not)
/// ends the process with an error. Ctrl-C stops all listeners and returns
/// `Ok`. Either way the remaining listeners are aborted if they are still
/// draining connections after [`SHUTDOWN_GRACE`].
pub async fn run_listeners(config: &ServerConfig, router: Router) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let listeners = spawn_listeners(config, router, &shutdown);

    if listeners.is_empty() {
        anyhow::bail!("All listeners (http, https, fcgi) are disabled");
    }

    supervise(listeners, shutdown, tokio::signal::ctrl_c(), SHUTDOWN_GRACE).await
}

fn spawn_listeners(
    config: &ServerConfig,
    router: Router,
    shutdown: &CancellationToken,
) -> JoinSet<ListenerResult> {
    let mut listeners = JoinSet::new();

    if let Some(addr) = config.http_addr().address() {
        let (addr, router, token) = (addr.to_string(), router.clone(), shutdown.clone());
        listeners.spawn(async move { ("http", start_http_server(addr, router, token).await) });
    }

    if let Some(addr) = config.https_addr().address() {
        let (addr, router, token) = (addr.to_string(), router.clone(), shutdown.clone());
        let (cert, key) = (config.cert.clone(), config.key.clone());
        listeners.spawn(async move {
            (
                "https",
                start_https_server(addr, cert, key, router, token).await,
            )
        });
    }

    if let Some(addr) = config.fcgi_addr().address() {
        let (addr, router, token) = (addr.to_string(), router, shutdown.clone());
        let remove_socket = config.remove_fcgi_socket;
        listeners.spawn(async move {
            (
                "fcgi",
                start_fcgi_server(addr, remove_socket, router, token).await,
            )
        });
    }

    listeners
}

async fn supervise<F>(
    mut listeners: JoinSet<ListenerResult>,
    shutdown: CancellationToken,
    stop_signal: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    let outcome = tokio::select! {
        Some(joined) = listeners.join_next() => {
            let err = match joined {
                Ok((name, Ok(()))) => anyhow::anyhow!("{} listener stopped unexpectedly", name),
                Ok((name, Err(e))) => e.context(format!("{} listener failed", name)),
                Err(e) => anyhow::anyhow!("listener task failed: {}", e),
            };
            error!(error = %format!("{:#}", err), "Listener terminated");
            Err(err)
        }
        signal = stop_signal => {
            match signal {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!(error = %e, "Unable to listen for shutdown signal"),
            }
            Ok(())
        }
    };

    shutdown.cancel();
    let drained = tokio::time::timeout(grace, async {
        while listeners.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            grace_secs = grace.as_secs_f64(),
            remaining = listeners.len(),
            "Listeners still busy after shutdown grace period, aborting"
        );
        listeners.abort_all();
        while listeners.join_next().await.is_some() {}
    }

    info!("All listeners stopped");
    outcome
}
