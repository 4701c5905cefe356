//! controller-router demo service.
//!
//! Hosts an in-memory `users` controller behind the full server stack:
//!
//! ```text
//! GET    /users            ?limit=N
//! GET    /users/:id
//! POST   /users            { "user": { "name": "...", "email": "..." } }
//! GET    /users/legacy/:id → 301 /users/:id
//! DELETE /users/:id        requires `authorization`
//! ```
//!
//! Routes come from the built-in declaration, or from `--manifest` when given.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use controller_router::dispatch::ClientError;
use controller_router::lifecycle::startup;
use controller_router::metadata::{SchemaType, TypedValidator};
use controller_router::routing::AssemblerOptions;
use controller_router::{
    from_fn, Arguments, Controller, ControllerManifest, DispatchError, Exchange, Flow, HandlerError, HandlerTable,
    HttpError, HttpServer, MetadataRegistry, ParamMetadata, Reply, RouteMetadata, RouterAssembler, Shutdown,
    StatusResult,
};

#[derive(Parser, Debug)]
#[command(name = "controller-router")]
#[command(about = "Demo service for controller-based routing", long_about = None)]
struct Cli {
    /// Router configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Route manifest for the users controller (TOML).
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewUser {
    name: String,
    email: String,
}

#[derive(Default)]
struct Users {
    next_id: AtomicU64,
    store: RwLock<BTreeMap<u64, User>>,
}

impl Users {
    async fn insert(&self, new: NewUser) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let user = User {
            id,
            name: new.name,
            email: new.email,
        };
        self.store.write().await.insert(id, user.clone());
        user
    }
}

impl Controller for Users {
    fn handlers(table: &mut HandlerTable<Self>) {
        table
            .handler("list", |this, args| async move {
                let limit: Option<usize> = args.optional(0)?;
                let store = this.store.read().await;
                let users: Vec<&User> = store.values().take(limit.unwrap_or(usize::MAX)).collect();
                Reply::json(&users)
            })
            .handler("get", |this, args| async move {
                let id: u64 = args.get(0)?;
                let store = this.store.read().await;
                match store.get(&id) {
                    Some(user) => Reply::json(user),
                    None => Err(HttpError::not_found(format!("user {} not found", id)).into()),
                }
            })
            .handler("create", |this, args| async move {
                let new: NewUser = args.get(0)?;
                let user = this.insert(new).await;
                let body = serde_json::to_value(&user).map_err(HandlerError::other)?;
                Ok::<_, HandlerError>(Reply::from(StatusResult::new(StatusCode::CREATED, body)))
            })
            .handler("legacy", |_this, args: Arguments| async move {
                let id: u64 = args.get(0)?;
                let target = format!("/users/{}", id);
                Ok::<_, HandlerError>(Reply::from(StatusResult::redirect(StatusCode::MOVED_PERMANENTLY, target)))
            })
            .handler("remove", |this, args| async move {
                let id: u64 = args.get(0)?;
                let ctx = args.context(1)?;
                tracing::info!(user_id = id, request_id = ctx.request().request_id().unwrap_or("-"), "Removing user");
                let removed = this.store.write().await.remove(&id);
                match removed {
                    Some(_) => Ok::<_, HandlerError>(Reply::from(StatusResult::new(StatusCode::NO_CONTENT, json!(null)))),
                    None => Err(HttpError::not_found(format!("user {} not found", id)).into()),
                }
            });
    }
}

/// Built-in declaration of the users routes.
fn declare_users(registry: &mut MetadataRegistry) {
    registry
        .controller::<Users>("/users")
        .route("list", RouteMetadata::get(""))
        .param("list", ParamMetadata::query("limit").schema(SchemaType::Number))
        .route("get", RouteMetadata::get("/:id"))
        .param("get", ParamMetadata::path("id").required().schema(SchemaType::Number))
        .route("create", RouteMetadata::post(""))
        .param("create", ParamMetadata::body("user").required().validated(TypedValidator::<NewUser>::new()))
        .route("legacy", RouteMetadata::get("/legacy/:id"))
        .param("legacy", ParamMetadata::path("id").required().schema(SchemaType::Number))
        .route("remove", RouteMetadata::delete("/:id"))
        .param("remove", ParamMetadata::path("id").required().schema(SchemaType::Number))
        .param("remove", ParamMetadata::context())
        .route_before(
            "remove",
            from_fn(|exchange: &mut Exchange| match exchange.request.header("authorization") {
                Some(_) => Ok(Flow::Next),
                None => Err(DispatchError::from(ClientError::new(
                    StatusCode::UNAUTHORIZED,
                    "authorization required",
                ))),
            }),
        )
        .after(from_fn(|exchange: &mut Exchange| {
            exchange
                .response
                .headers_mut()
                .insert("x-controller", HeaderValue::from_static("users"));
            Ok(Flow::Next)
        }));
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::load(cli.config.as_deref())?;
    startup::init_observability(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        malformed_argument_status = config.dispatch.malformed_argument_status,
        "Configuration loaded"
    );

    let mut registry = MetadataRegistry::new();
    match &cli.manifest {
        Some(path) => ControllerManifest::load(path)?.declare::<Users>(&mut registry)?,
        None => declare_users(&mut registry),
    }

    let assembler = RouterAssembler::new(Arc::new(registry)).with_options(AssemblerOptions::from(&config.dispatch));
    let users = assembler.assemble(Arc::new(Users::default()))?;
    let app = axum::Router::new().merge(users.into_axum()?);

    let listener = startup::bind_listener(&config.listener).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, app);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
