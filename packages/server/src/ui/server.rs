//! Server execution logic.
//!
//! The accept loop never waits on the worker pool: every accepted socket is
//! spawned right away as a task that first acquires a permit from a semaphore
//! of `max_clients` permits. Connections beyond the limit stay queued (their
//! frames are not read) until a running session ends.

use std::{future::Future, io, net::SocketAddr, sync::Arc};

use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Semaphore, oneshot},
    task::JoinSet,
};

use crate::{config::ServerConfig, error::ServerError};

use super::{
    handler::{handle_connection, router},
    signal::shutdown_signal,
    state::AppState,
};

/// TCP chat server
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(build_app_state(&config).await?);
/// let server = Server::bind(&config, state).await?;
/// server.run().await?;
/// ```
pub struct Server {
    listener: TcpListener,
    http_listener: Option<TcpListener>,
    state: Arc<AppState>,
    max_clients: usize,
}

impl Server {
    /// Bind the chat listener (and the status API listener, if configured)
    pub async fn bind(config: &ServerConfig, state: Arc<AppState>) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = bind_listener(config.bind_addr()).await?;
        let http_listener = match config.http_bind_addr() {
            Some(addr) => Some(bind_listener(addr).await?),
            None => None,
        };

        Ok(Self {
            listener,
            http_listener,
            state,
            max_clients: config.max_clients,
        })
    }

    /// Address of the chat listener
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Address of the status API listener, if enabled
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok())
    }

    /// Run until Ctrl+C / SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves or the listener fails.
    ///
    /// On return the listener is closed and every in-flight session has been
    /// aborted, which drops its socket.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            listener,
            http_listener,
            state,
            max_clients,
        } = self;

        tracing::info!(
            "Chat server listening on {} (max {} concurrent sessions)",
            listener.local_addr()?,
            max_clients
        );

        let (http_stop_tx, http_stop_rx) = oneshot::channel::<()>();
        let http_task = http_listener.map(|http_listener| {
            let app = router(state.clone());
            tokio::spawn(async move {
                if let Ok(addr) = http_listener.local_addr() {
                    tracing::info!("Status API listening on http://{}", addr);
                }
                let result = axum::serve(http_listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = http_stop_rx.await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!("Status API failed: {}", e);
                }
            })
        });

        let pool = Arc::new(Semaphore::new(max_clients));
        let mut sessions = JoinSet::new();
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break Ok(());
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        tracing::error!("Session task panicked: {}", e);
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!("Accepted connection from {}", peer);
                        if pool.available_permits() == 0 {
                            tracing::info!(
                                "All {} workers busy, {} queued for a slot",
                                max_clients,
                                peer
                            );
                        }
                        sessions.spawn(serve(stream, peer, pool.clone(), state.clone()));
                    }
                    Err(e) if is_transient(&e) => {
                        tracing::warn!("Transient accept error: {}", e);
                    }
                    Err(e) => {
                        tracing::error!("Listener failed: {}", e);
                        break Err(ServerError::Accept(e));
                    }
                },
            }
        };

        drop(listener);
        tracing::info!("Closing {} in-flight session(s)", sessions.len());
        sessions.shutdown().await;

        let _ = http_stop_tx.send(());
        if let Some(task) = http_task
            && let Err(e) = task.await
        {
            tracing::error!("Status API task failed: {}", e);
        }

        tracing::info!("Server shutdown complete");
        result
    }
}

/// Wait for a worker slot, then run the session
async fn serve(stream: TcpStream, peer: SocketAddr, pool: Arc<Semaphore>, state: Arc<AppState>) {
    let _permit = match pool.acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return,
    };
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
    }
    handle_connection(stream, peer, state).await;
    tracing::info!("Connection from {} closed", peer);
}

async fn bind_listener(addr: String) -> Result<TcpListener, ServerError> {
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Accept errors that concern a single connection, not the listener
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_accept_errors() {
        // テスト項目: 接続単位のエラーだけが一時的なエラーとして扱われる
        // given (前提条件):
        let transient = io::Error::from(io::ErrorKind::ConnectionAborted);
        let fatal = io::Error::from(io::ErrorKind::PermissionDenied);

        // when (操作):

        // then (期待する結果):
        assert!(is_transient(&transient));
        assert!(!is_transient(&fatal));
    }
}
