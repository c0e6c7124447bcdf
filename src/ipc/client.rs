//! Client side of the RPC interface, used by the CLI subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use tarpc::{client, context, serde_transport};
use tokio::net::UnixStream;
use tokio_serde::formats::Json;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use super::{
    CalculatorClient, ClearResponse, EvalRequest, EvalResponse, HistoryResponse, StatsResponse,
};

/// Connection to a running daemon.
pub struct DaemonClient {
    inner: CalculatorClient,
}

impl DaemonClient {
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await.with_context(|| {
            format!(
                "failed to connect to {} (is `safecalc serve` running?)",
                socket_path.display()
            )
        })?;

        let transport = serde_transport::new(
            Framed::new(stream, LengthDelimitedCodec::new()),
            Json::default(),
        );
        let inner = CalculatorClient::new(client::Config::default(), transport).spawn();
        Ok(Self { inner })
    }

    pub async fn eval(&self, request: EvalRequest) -> Result<EvalResponse> {
        self.inner
            .eval(context::current(), request)
            .await
            .context("eval request failed")
    }

    pub async fn history(&self) -> Result<HistoryResponse> {
        self.inner
            .history(context::current())
            .await
            .context("history request failed")
    }

    pub async fn clear_history(&self) -> Result<ClearResponse> {
        self.inner
            .clear_history(context::current())
            .await
            .context("clear request failed")
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        self.inner
            .stats(context::current())
            .await
            .context("stats request failed")
    }
}
