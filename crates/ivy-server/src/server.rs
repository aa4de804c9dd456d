//! HTTP/1.1 transport bootstrap.
//!
//! The [`Server`] binds a TCP listener, serves every connection with hyper
//! and hands each request, body fully buffered, to
//! [`Router::resolve_route`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ivy_config::ConfigLoader;
//! use ivy_core::Handler;
//! use ivy_server::{logging, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("IVY").load()?;
//!     logging::init_logging(&config.logging)?;
//!
//!     let mut router = Router::new();
//!     router.get("/", Handler::sync(|_, _| "ok"), None)?;
//!
//!     Server::builder()
//!         .router(router)
//!         .config(&config.app)
//!         .on_ready(|addr| tracing::info!(%addr, "Listening"))
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use ivy_config::AppConfig;
use ivy_core::BufferedResponse;
use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Default time to wait for open connections on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default request body limit (2 MiB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

type ReadyCallback = Box<dyn FnOnce(SocketAddr) + Send>;

/// Serves a [`Router`] over HTTP/1.1.
pub struct Server {
    router: Arc<Router>,
    app: AppConfig,
    shutdown_timeout: Duration,
    max_body_size: usize,
    on_ready: Option<ReadyCallback>,
}

impl Server {
    /// Creates a server for `router` with the default listener settings
    /// (all interfaces, ephemeral port).
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::builder().router(router).build()
    }

    /// Starts building a server.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Binds the listener.
    ///
    /// Starting at the configured port, moves to the next port while the
    /// current one is in use. Port `0` lets the operating system choose.
    /// The returned future does not borrow the server.
    ///
    /// # Errors
    ///
    /// - [`ServerError::PortsExhausted`] if no port up to 65535 is free
    /// - [`ServerError::Bind`] for any other bind failure
    pub fn bind(
        &self,
    ) -> impl Future<Output = Result<TcpListener, ServerError>> + Send + 'static {
        bind_first_free(self.app.bind_host().to_string(), self.app.port)
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let bind = self.bind();
        let listener = bind.await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// is triggered, then waits for open connections to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let Self {
            router,
            app,
            shutdown_timeout,
            max_body_size,
            on_ready,
        } = self;

        let addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: app.bind_host().to_string(),
            source,
        })?;
        tracing::info!(%addr, "Server listening");
        if let Some(on_ready) = on_ready {
            on_ready(addr);
        }

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let router = Arc::clone(&router);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            let served =
                                handle_connection(router, stream, max_body_size, shutdown).await;
                            if let Err(err) = served {
                                tracing::debug!(%remote_addr, error = %err, "Connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "Failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        tracing::info!(
            active = tracker.active_connections(),
            timeout = ?shutdown_timeout,
            "Waiting for connections to close"
        );
        tokio::select! {
            () = tracker.wait_for_shutdown() => tracing::info!("All connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => tracing::warn!(
                active = tracker.active_connections(),
                "Shutdown timeout reached"
            ),
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn bind_first_free(host: String, start: u16) -> Result<TcpListener, ServerError> {
    let mut port = start;

    loop {
        match TcpListener::bind((host.as_str(), port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if err.kind() == io::ErrorKind::AddrInUse && port != 0 => {
                tracing::warn!(port, "Port in use, trying the next one");
                port = port
                    .checked_add(1)
                    .ok_or(ServerError::PortsExhausted { start })?;
            }
            Err(source) => {
                return Err(ServerError::Bind {
                    addr: format!("{host}:{port}"),
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("router", &self.router)
            .field("app", &self.app)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

async fn handle_connection(
    router: Arc<Router>,
    stream: TcpStream,
    max_body_size: usize,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(handle_request(&router, req, max_body_size).await) }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        () = shutdown.recv() => Ok(()),
    }
}

async fn handle_request(
    router: &Router,
    req: Request<Incoming>,
    max_body_size: usize,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::warn!(limit = max_body_size, "Request body too large");
            return plain_response(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large");
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read request body");
            return plain_response(StatusCode::BAD_REQUEST, "Bad request");
        }
    };

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let request = Request::from_parts(parts, body);

    let mut response = BufferedResponse::new();
    router.resolve_route(request, &mut response).await;

    tracing::debug!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Request completed"
    );
    response.into_response().map(Full::new)
}

fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    router: Option<Router>,
    app: AppConfig,
    shutdown_timeout: Option<Duration>,
    max_body_size: Option<usize>,
    on_ready: Option<ReadyCallback>,
}

impl ServerBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the router. Defaults to an empty [`Router`].
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Takes host and port from the `[app]` configuration section.
    pub fn config(mut self, app: &AppConfig) -> Self {
        self.app = app.clone();
        self
    }

    /// Sets the host to bind.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.app.host = host.into();
        self
    }

    /// Sets the first port to try.
    pub fn port(mut self, port: u16) -> Self {
        self.app.port = port;
        self
    }

    /// Sets how long shutdown waits for open connections.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Sets the largest request body accepted; larger bodies get `413`.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    /// Called once with the bound address before the first accept.
    pub fn on_ready<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SocketAddr) + Send + 'static,
    {
        self.on_ready = Some(Box::new(f));
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server {
            router: Arc::new(self.router.unwrap_or_default()),
            app: self.app,
            shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
            max_body_size: self.max_body_size.unwrap_or(DEFAULT_MAX_BODY_SIZE),
            on_ready: self.on_ready,
        }
    }
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("app", &self.app)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let server = Server::builder().build();
        assert_eq!(server.app, AppConfig::default());
        assert_eq!(server.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
        assert_eq!(server.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_builder_config() {
        let app = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let server = Server::builder().config(&app).port(3001).build();
        assert_eq!(server.app.host, "127.0.0.1");
        assert_eq!(server.app.port, 3001);
    }

    #[tokio::test]
    async fn test_bind_skips_taken_port() {
        let taken = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = Server::builder().host("127.0.0.1").port(port).build();
        let listener = server.bind().await.unwrap();
        let bound = listener.local_addr().unwrap().port();

        assert_ne!(bound, port);
        assert!(bound > port);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = Server::builder().host("127.0.0.1").build();
        let listener = server.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_server_future_spawns_on_multi_thread_runtime() {
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let shutdown = ShutdownSignal::new();
        let server = Server::builder()
            .host("127.0.0.1")
            .on_ready(move |addr| {
                let _ = ready_tx.send(addr);
            })
            .build();

        let handle = tokio::spawn(server.run_with_shutdown(shutdown.clone()));
        let addr: SocketAddr = ready_rx.await.unwrap();
        assert_ne!(addr.port(), 0);

        shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
