//! Real-socket tests: bind, serve, request with an HTTP client, shut down.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ivy_core::{Handler, Params, Query, Reply, ResponseSink, RouteOptions};
use ivy_middleware::{FnMiddleware, MiddlewareContainer, MiddlewareError};
use ivy_server::{Router, Server, ServerBuilder, ShutdownSignal};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Running {
    base: String,
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<(), ivy_server::ServerError>>,
}

impl Running {
    async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop")
            .expect("server task should not panic");
        assert!(result.is_ok());
    }
}

async fn start(router: Router) -> Running {
    start_with(Server::builder().router(router)).await
}

async fn start_with(builder: ServerBuilder) -> Running {
    let (ready_tx, ready_rx) = oneshot::channel::<SocketAddr>();
    let shutdown = ShutdownSignal::new();

    let server = builder
        .host("127.0.0.1")
        .port(0)
        .shutdown_timeout(Duration::from_secs(1))
        .on_ready(move |addr| {
            let _ = ready_tx.send(addr);
        })
        .build();

    let handle = tokio::spawn(server.run_with_shutdown(shutdown.clone()));
    let addr = ready_rx.await.expect("server should report its address");

    Running {
        base: format!("http://{addr}"),
        shutdown,
        handle,
    }
}

fn router() -> Router {
    let middleware = Arc::new(MiddlewareContainer::new());
    middleware.register(FnMiddleware::new("test", |ctx| {
        ctx.params_mut().insert("id", "33");
        Ok(())
    }));
    middleware.register(FnMiddleware::new("test1", |_| {
        Err(MiddlewareError::rejected("Cant go through!"))
    }));

    let mut router = Router::builder().middleware(middleware).build();
    router
        .get("/", Handler::sync(|_, _| "ok"), None)
        .unwrap()
        .get(
            "/headers-test",
            Handler::sync(|_, _| {
                Reply::respond(|res: &mut dyn ResponseSink| {
                    res.set_header("my-header", "asdqwe");
                    res.end(Bytes::from_static(b"ok"));
                })
            }),
            None,
        )
        .unwrap()
        .get(
            "/async",
            Handler::future(|_, _| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                "ok"
            }),
            None,
        )
        .unwrap()
        .get(
            "/query-test",
            Handler::sync(|_, query: Query| query.get("q").unwrap_or_default().to_string()),
            None,
        )
        .unwrap()
        .get(
            "/:id",
            Handler::sync(|params: Params, _| params.get("id").unwrap_or_default().to_string()),
            RouteOptions::new().middleware("test"),
        )
        .unwrap()
        .get(
            "/error",
            Handler::sync(|_, _| "unreachable"),
            RouteOptions::new().middleware("test1"),
        )
        .unwrap()
        .post(
            "/echo",
            Handler::sync(|_, _| serde_json::json!({ "echo": true })),
            None,
        )
        .unwrap();
    router
}

#[tokio::test]
async fn test_request_handling() {
    let server = start(router()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(format!("{}/headers-test", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers().get("my-header").and_then(|v| v.to_str().ok()),
        Some("asdqwe")
    );
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(format!("{}/async", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client
        .get(format!("{}/query-test?q=fastText", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "fastText");

    server.stop().await;
}

#[tokio::test]
async fn test_middleware_over_the_wire() {
    let server = start(router()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/20", server.base)).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "33");

    let res = client
        .get(format!("{}/error", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(
        res.text().await.unwrap(),
        "Error piping through middleware. Cant go through!"
    );

    server.stop().await;
}

#[tokio::test]
async fn test_not_found_and_json() {
    let server = start(router()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/a/b/c", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "Route not found");

    let res = client
        .post(format!("{}/echo", server.base))
        .body("ignored")
        .send()
        .await
        .unwrap();
    assert_eq!(
        res.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(res.text().await.unwrap(), "{\n    \"echo\": true\n}");

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let server = start_with(Server::builder().router(router()).max_body_size(16)).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/echo", server.base))
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert_eq!(res.text().await.unwrap(), "Payload too large");

    let res = reqwest::Client::new()
        .post(format!("{}/echo", server.base))
        .body("small")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    server.stop().await;
}
