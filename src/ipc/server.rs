//! Daemon side of the RPC interface.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use futures::StreamExt;
use tarpc::context;
use tarpc::serde_transport;
use tarpc::server::{BaseChannel, Channel};
use tokio::net::{UnixListener, UnixStream};
use tokio_serde::formats::Json;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use super::{
    Calculator, ClearResponse, EvalRequest, EvalResponse, HistoryResponse, StatsResponse,
};
use crate::calculator::evaluate_expression;
use crate::config::Config;
use crate::history::{HistoryStore, Mode};

/// Request handler shared by every connection.
#[derive(Clone)]
pub struct CalcServer {
    history: Arc<Mutex<HistoryStore>>,
    page_size: usize,
}

impl CalcServer {
    pub fn new(history: HistoryStore, page_size: usize) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
            page_size,
        }
    }

    fn store(&self) -> MutexGuard<'_, HistoryStore> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle_eval(&self, request: EvalRequest) -> EvalResponse {
        let expression = request.expression.unwrap_or_default();
        let mode = Mode::from_request(request.mode.as_deref());

        let outcome = evaluate_expression(&expression);
        if let Ok(result) = &outcome {
            debug!(%expression, %result, mode = mode.as_str(), "evaluated");
            if let Err(err) = self.store().record(mode, &expression, result) {
                warn!(error = %err, "failed to persist history entry");
            }
        }
        outcome.into()
    }

    fn handle_history(&self) -> HistoryResponse {
        HistoryResponse {
            ok: true,
            items: self.store().recent(self.page_size),
        }
    }

    fn handle_clear(&self) -> ClearResponse {
        if let Err(err) = self.store().clear() {
            warn!(error = %err, "failed to persist cleared history");
        }
        info!("history cleared");
        ClearResponse { ok: true }
    }

    fn handle_stats(&self) -> StatsResponse {
        let stats = self.store().stats();
        StatsResponse {
            ok: true,
            total: stats.total,
            last: stats.last,
        }
    }
}

impl Calculator for CalcServer {
    async fn eval(self, _: context::Context, request: EvalRequest) -> EvalResponse {
        self.handle_eval(request)
    }

    async fn history(self, _: context::Context) -> HistoryResponse {
        self.handle_history()
    }

    async fn clear_history(self, _: context::Context) -> ClearResponse {
        self.handle_clear()
    }

    async fn stats(self, _: context::Context) -> StatsResponse {
        self.handle_stats()
    }
}

/// Run the daemon until Ctrl-C.
pub async fn run(config: &Config) -> Result<()> {
    let history = if config.history.persist {
        HistoryStore::open(&config.history.path, config.history.max_entries)
    } else {
        HistoryStore::in_memory(config.history.max_entries)
    };
    let server = CalcServer::new(history, config.history.page_size);

    let socket_path = &config.socket_path;
    let listener = bind(socket_path).await?;
    info!(socket = %socket_path.display(), "safecalc daemon listening");

    let outcome = tokio::select! {
        result = accept_loop(listener, server) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    };

    if let Err(err) = std::fs::remove_file(socket_path) {
        debug!(error = %err, "failed to remove socket");
    }
    outcome
}

/// Bind the socket, replacing a stale one left by a daemon that crashed.
pub(super) async fn bind(socket_path: &Path) -> Result<UnixListener> {
    if socket_path.exists() {
        if UnixStream::connect(socket_path).await.is_ok() {
            anyhow::bail!(
                "another safecalc daemon is already listening on {}",
                socket_path.display()
            );
        }
        std::fs::remove_file(socket_path)
            .with_context(|| format!("failed to remove stale socket {}", socket_path.display()))?;
    }

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    UnixListener::bind(socket_path)
        .with_context(|| format!("failed to bind {}", socket_path.display()))
}

pub(super) async fn accept_loop(listener: UnixListener, server: CalcServer) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await.context("failed to accept connection")?;
        tokio::spawn(serve_connection(stream, server.clone()));
    }
}

async fn serve_connection(stream: UnixStream, server: CalcServer) {
    debug!("client connected");
    let transport = serde_transport::new(
        Framed::new(stream, LengthDelimitedCodec::new()),
        Json::default(),
    );

    BaseChannel::with_defaults(transport)
        .execute(server.serve())
        .for_each(spawn)
        .await;
    debug!("client disconnected");
}

async fn spawn(fut: impl Future<Output = ()> + Send + 'static) {
    tokio::spawn(fut);
}
