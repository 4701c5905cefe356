//! End-to-end tests over TCP through the full server stack.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use common::{accounts_registry, Accounts};
use controller_router::config::parse_config;
use controller_router::routing::AssemblerOptions;
use controller_router::{
    ControllerManifest, HandlerError, HandlerTable, Controller, HttpServer, MetadataRegistry, Reply,
    RouterAssembler, Shutdown,
};

#[tokio::test]
async fn test_serves_until_shutdown() {
    let config = parse_config(
        r#"
[listener]
bind_address = "127.0.0.1:0"

[dispatch]
malformed_argument_status = 400
"#,
    )
    .unwrap();

    let router = RouterAssembler::new(Arc::new(accounts_registry()))
        .with_options(AssemblerOptions::from(&config.dispatch))
        .assemble(Arc::new(Accounts::default()))
        .unwrap();
    let app = axum::Router::new().merge(router.into_axum().unwrap());

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, app);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let response = client
        .get(format!("http://{}/prefix/users/5", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let request_id = response.headers().get("x-request-id").cloned();
    assert!(request_id.is_some());
    assert_eq!(response.json::<Value>().await.unwrap(), json!({ "id": 5.0 }));

    let response = client
        .get(format!("http://{}/prefix/users/five", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(format!("http://{}/prefix/login-required", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/login");
    assert_eq!(response.status(), 404);

    assert_eq!(shutdown.trigger(), 1);
    let result = tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap();
    assert!(result.unwrap().is_ok());
}

struct Reports;

impl Controller for Reports {
    fn handlers(table: &mut HandlerTable<Self>) {
        table.handler("summary", |_this, args| async move {
            let year: i64 = args.get(0)?;
            let scope: Value = args.get(1)?;
            Ok::<_, HandlerError>(Reply::Plain(json!({ "year": year, "scope": scope })))
        });
    }
}

#[tokio::test]
async fn test_manifest_declared_routes() {
    let manifest = ControllerManifest::from_toml_str(
        r#"
base_path = "/reports"

[[route]]
handler = "summary"
method = "get"
path = "/:year"

[[route.param]]
source = "path"
name = "year"
required = true
schema = { type = "integer" }

[[route.param]]
source = "query"
name = "scope"
required = true
schema = { type = "object", required = ["team"], properties = { team = { type = "string" } } }
"#,
    )
    .unwrap();

    let mut registry = MetadataRegistry::new();
    manifest.declare::<Reports>(&mut registry).unwrap();
    let app = RouterAssembler::new(Arc::new(registry))
        .assemble(Arc::new(Reports))
        .unwrap()
        .into_axum()
        .unwrap();

    let ok = common::send(&app, common::get("/reports/2024?scope=%7B%22team%22%3A%22core%22%7D")).await;
    assert_eq!(ok.status, 200);
    assert_eq!(ok.json(), json!({ "year": 2024, "scope": { "team": "core" } }));

    let rejected = common::send(&app, common::get("/reports/2024?scope=%7B%7D")).await;
    assert_eq!(rejected.status, 400);
}
