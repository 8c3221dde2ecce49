//! Letterpress server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use letterpress_common::Config;
use letterpress_db::repositories::{
    ActorKeypairRepository, ActorRepository, FollowingRepository, InstanceRepository,
    NotificationRepository, PostRepository,
};
use letterpress_federation::{
    ActorDocState, ActorStore, ApClient, CollectionState, InboxState, InstanceService,
    NodeInfoState, UrlConfig, WebfingerState, actor_handler, followers_handler,
    following_handler, inbox_handler, nodeinfo_2_1, outbox_handler, user_inbox_handler,
    webfinger_handler, well_known_nodeinfo,
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "letterpress=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting letterpress server...");

    let config = Config::load()?;

    let db = letterpress_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    letterpress_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let db = Arc::new(db);
    let actor_repo = ActorRepository::new(Arc::clone(&db));
    let keypair_repo = ActorKeypairRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let following_repo = FollowingRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let instance_repo = InstanceRepository::new(Arc::clone(&db));

    // Federation services
    let base_url = Url::parse(&config.server.url)?;
    let domain = base_url.host_str().unwrap_or("localhost").to_string();
    let urls = UrlConfig::new(base_url.clone());

    let ap_client = ApClient::new(base_url.as_str())?;
    let instance_service = InstanceService::new(instance_repo, ap_client.clone());
    let actor_store = ActorStore::new(
        actor_repo.clone(),
        keypair_repo.clone(),
        instance_service,
        ap_client.clone(),
        urls,
    );

    // Handler states
    let webfinger_state = WebfingerState::new(domain, actor_repo.clone(), base_url.clone());
    let nodeinfo_state = NodeInfoState::new(
        base_url.clone(),
        config.federation.instance_name.clone(),
        config
            .federation
            .instance_description
            .clone()
            .unwrap_or_default(),
        env!("CARGO_PKG_VERSION").to_string(),
        actor_repo.clone(),
        post_repo.clone(),
    );
    let actor_doc_state =
        ActorDocState::new(actor_repo.clone(), keypair_repo.clone(), base_url.clone());
    let collection_state = CollectionState::new(
        actor_repo.clone(),
        post_repo.clone(),
        following_repo.clone(),
        base_url.clone(),
    );
    let inbox_state = InboxState::new(
        actor_repo,
        keypair_repo,
        following_repo,
        notification_repo,
        post_repo,
        actor_store,
        ap_client,
        base_url,
    );

    let app = Router::new()
        .route(
            "/.well-known/webfinger",
            get(webfinger_handler).with_state(webfinger_state),
        )
        .route(
            "/.well-known/nodeinfo",
            get(well_known_nodeinfo).with_state(nodeinfo_state.clone()),
        )
        .route("/nodeinfo/2.1", get(nodeinfo_2_1).with_state(nodeinfo_state))
        .route("/users/{slug}", get(actor_handler).with_state(actor_doc_state))
        .route(
            "/users/{slug}/outbox",
            get(outbox_handler).with_state(collection_state.clone()),
        )
        .route(
            "/users/{slug}/followers",
            get(followers_handler).with_state(collection_state.clone()),
        )
        .route(
            "/users/{slug}/following",
            get(following_handler).with_state(collection_state),
        )
        .route("/inbox", post(inbox_handler).with_state(inbox_state.clone()))
        .route(
            "/users/{slug}/inbox",
            post(user_inbox_handler).with_state(inbox_state),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
