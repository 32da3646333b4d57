//! gRPC transport over a `tonic` channel.
//!
//! Calls are issued through [`tonic::client::Grpc`] with a
//! [`ProstCodec`](tonic::codec::ProstCodec), the same machinery generated
//! service clients use. One channel is connected up front and shared by all
//! calls of a session.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::StreamExt;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::GrpcMethod;
use tracing::{debug, info};

use crate::proto::{
    RunRequest, RunResponse, TaskRequest, ADAPTER_SERVICE, AGENT_SERVICE, RUN_PATH, RUN_TASK_PATH,
};
use crate::transport::{AgentTransport, FrameStream};
use crate::{AppError, Result};

/// Default connect timeout for the adapter channel.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`AgentTransport`] backed by a connected gRPC channel.
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    inner: tonic::client::Grpc<Channel>,
}

impl GrpcTransport {
    /// Connect to the adapter at `endpoint` (e.g. `http://localhost:50051`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `endpoint` is not a valid URI and
    /// [`AppError::Transport`] if the connection cannot be established.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let endpoint = Endpoint::from_shared(endpoint.to_owned())
            .map_err(|err| AppError::Config(format!("invalid endpoint {endpoint}: {err}")))?
            .connect_timeout(CONNECT_TIMEOUT);

        let channel = endpoint.connect().await?;
        info!(uri = %endpoint.uri(), "adapter channel connected");
        Ok(Self::new(channel))
    }

    /// Wrap an already-connected channel.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn server_streaming<M>(
        &self,
        request: M,
        path: &'static str,
        service: &'static str,
        method: &'static str,
    ) -> Result<FrameStream>
    where
        M: prost::Message + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|err| AppError::Transport(format!("service was not ready: {err}")))?;

        let mut request = tonic::Request::new(request);
        request
            .extensions_mut()
            .insert(GrpcMethod::new(service, method));

        let codec: ProstCodec<M, RunResponse> = ProstCodec::default();
        let response = grpc
            .server_streaming(request, PathAndQuery::from_static(path), codec)
            .await?;
        debug!(path, "response stream opened");

        let frames = response
            .into_inner()
            .map(|item| item.map_err(AppError::from));
        Ok(Box::pin(frames))
    }
}

impl AgentTransport for GrpcTransport {
    fn run(
        &self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FrameStream>> + Send + '_>> {
        Box::pin(self.server_streaming(request, RUN_PATH, ADAPTER_SERVICE, "Run"))
    }

    fn run_task(
        &self,
        request: TaskRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FrameStream>> + Send + '_>> {
        Box::pin(self.server_streaming(request, RUN_TASK_PATH, AGENT_SERVICE, "RunTask"))
    }
}
