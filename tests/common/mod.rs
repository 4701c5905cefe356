//! Shared controller fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use controller_router::metadata::SchemaType;
use controller_router::routing::AssemblerOptions;
use controller_router::{
    Controller, HandlerError, HandlerTable, HttpError, MetadataRegistry, ParamMetadata, Reply, RouteMetadata,
    RouterAssembler, StatusResult,
};

/// Controller counting how many times any handler ran.
#[derive(Default)]
pub struct Accounts {
    pub calls: AtomicUsize,
}

impl Accounts {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Controller for Accounts {
    fn handlers(table: &mut HandlerTable<Self>) {
        table
            .handler("get_user", |this, args| async move {
                this.hit();
                let id: f64 = args.get(0)?;
                Reply::json(&json!({ "id": id }))
            })
            .handler("lookup", |this, args| async move {
                this.hit();
                let id: f64 = args.get(0)?;
                Reply::json(&json!({ "id": id }))
            })
            .handler("search", |this, args| async move {
                this.hit();
                let filter: Value = args.get(0)?;
                Ok::<_, HandlerError>(Reply::Plain(filter))
            })
            .handler("create", |this, args| async move {
                this.hit();
                let name: String = args.get(0)?;
                Ok::<_, HandlerError>(Reply::from(StatusResult::new(
                    StatusCode::CREATED,
                    json!({ "name": name }),
                )))
            })
            .handler("login", |this, _args| async move {
                this.hit();
                Ok::<_, HandlerError>(Reply::from(StatusResult::redirect(StatusCode::FOUND, "/login")))
            })
            .handler("forbidden", |this, _args| async move {
                this.hit();
                Err::<Reply, _>(HandlerError::from(HttpError::forbidden("forbidden")))
            })
            .handler("crash", |this, _args| async move {
                this.hit();
                Err::<Reply, _>(HandlerError::other(std::io::Error::other("disk on fire")))
            })
            .handler("whoami", |this, args| async move {
                this.hit();
                let user: Option<String> = args.optional(0)?;
                let ctx = args.context(1)?;
                let body = json!({
                    "user": user,
                    "path": ctx.request().path(),
                    "request_id": ctx.request().request_id(),
                });
                Ok::<_, HandlerError>(Reply::Plain(body))
            })
            .handler("remove_user", |this, args| async move {
                this.hit();
                let id: f64 = args.get(0)?;
                Reply::json(&json!({ "removed": id }))
            })
            .handler("export", |this, args| async move {
                this.hit();
                let ctx = args.context(0)?;
                ctx.set_status(StatusCode::ACCEPTED);
                ctx.set_header(
                    header::CONTENT_DISPOSITION,
                    HeaderValue::from_static("attachment; filename=\"accounts.json\""),
                );
                Ok::<_, HandlerError>(Reply::Plain(json!([])))
            })
            .handler("moved", |this, args| async move {
                this.hit();
                args.context(0)?.redirect("/prefix/whoami");
                Ok::<_, HandlerError>(Reply::empty())
            })
            .handler("unrouted", |this, _args| async move {
                this.hit();
                Ok::<_, HandlerError>(Reply::empty())
            });
    }
}

fn filter_validator(value: Value) -> Result<Value, String> {
    match value.get("a") {
        Some(a) => Ok(json!({ "a": a, "checked": true })),
        None => Err("filter.a is required".to_string()),
    }
}

/// Metadata for [`Accounts`] mounted under `/prefix`.
pub fn accounts_registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    registry
        .controller::<Accounts>("/prefix")
        .route("get_user", RouteMetadata::get("/users/:id"))
        .param("get_user", ParamMetadata::path("id").required().schema(SchemaType::Number))
        .route("lookup", RouteMetadata::get("/lookup"))
        .param("lookup", ParamMetadata::query("id").required().schema(SchemaType::Number))
        .route("search", RouteMetadata::get("/search"))
        .param("search", ParamMetadata::query("filter").validated(filter_validator))
        .route("create", RouteMetadata::post("/users"))
        .param("create", ParamMetadata::body("name").required())
        .route("login", RouteMetadata::get("/login-required"))
        .route("forbidden", RouteMetadata::get("/forbidden"))
        .route("crash", RouteMetadata::get("/crash"))
        .route("whoami", RouteMetadata::get("/whoami"))
        .param("whoami", ParamMetadata::header("x-user"))
        .param("whoami", ParamMetadata::context().required())
        .route("remove_user", RouteMetadata::delete("/users/:userId"))
        .param("remove_user", ParamMetadata::path("userId").required().schema(SchemaType::Number))
        .route("export", RouteMetadata::get("/export"))
        .param("export", ParamMetadata::context())
        .route("moved", RouteMetadata::get("/moved"))
        .param("moved", ParamMetadata::context());
    registry
}

/// Assemble [`Accounts`] and mount it as an axum router.
pub fn accounts_app(controller: Arc<Accounts>, options: AssemblerOptions) -> Router {
    RouterAssembler::new(Arc::new(accounts_registry()))
        .with_options(options)
        .assemble(controller)
        .unwrap()
        .into_axum()
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}
