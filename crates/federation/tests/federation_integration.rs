//! Federation integration tests.
//!
//! Drive the federation endpoints through the router with a mock database.
//! The signature-rejection tests give the mock no statement results at all:
//! any attempted write would fail the test, proving a rejected request has
//! no side effects.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::{get, post},
};
use chrono::Utc;
use letterpress_db::entities::actor::{self, ActorType};
use letterpress_db::repositories::{
    ActorKeypairRepository, ActorRepository, FollowingRepository, InstanceRepository,
    NotificationRepository, PostRepository,
};
use letterpress_federation::{
    ActorDocState, ActorStore, ApClient, CollectionState, HttpSigner, InboxState,
    InstanceService, WebfingerState, actor_handler, followers_handler, following_handler,
    inbox_handler, user_inbox_handler, webfinger_handler,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

const BASE_URL: &str = "https://blog.example";

fn local_actor(id: &str, username: &str) -> actor::Model {
    actor::Model {
        id: id.to_string(),
        iri: format!("{BASE_URL}/users/{username}"),
        actor_type: ActorType::Person,
        username: username.to_string(),
        instance_host: "blog.example".to_string(),
        handle_host: "blog.example".to_string(),
        blog_id: Some(format!("blog-{id}")),
        name: Some("Test Blog".to_string()),
        bio_html: None,
        avatar_url: None,
        header_url: None,
        url: None,
        field_htmls: json!({}),
        emojis: json!({}),
        tags: json!({}),
        aliases: json!([]),
        inbox_url: format!("{BASE_URL}/users/{username}/inbox"),
        shared_inbox_url: Some(format!("{BASE_URL}/inbox")),
        followers_url: Some(format!("{BASE_URL}/users/{username}/followers")),
        featured_url: None,
        followees_count: 0,
        followers_count: 0,
        posts_count: 0,
        successor_id: None,
        published_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn inbox_router(db: Arc<DatabaseConnection>) -> Router {
    let base_url = Url::parse(BASE_URL).unwrap();
    let client = ApClient::new(BASE_URL).unwrap();
    let actor_repo = ActorRepository::new(Arc::clone(&db));
    let keypair_repo = ActorKeypairRepository::new(Arc::clone(&db));
    let store = ActorStore::new(
        actor_repo.clone(),
        keypair_repo.clone(),
        InstanceService::new(InstanceRepository::new(Arc::clone(&db)), client.clone()),
        client.clone(),
        letterpress_federation::UrlConfig::new(base_url.clone()),
    );

    let inbox_state = InboxState::new(
        actor_repo,
        keypair_repo,
        FollowingRepository::new(Arc::clone(&db)),
        NotificationRepository::new(Arc::clone(&db)),
        PostRepository::new(db),
        store,
        client,
        base_url,
    );

    Router::new()
        .route("/inbox", post(inbox_handler).with_state(inbox_state.clone()))
        .route(
            "/users/{slug}/inbox",
            post(user_inbox_handler).with_state(inbox_state),
        )
}

fn follow_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "type": "Follow",
        "id": "https://remote.example/f/1",
        "actor": "https://remote.example/users/bob",
        "object": format!("{BASE_URL}/users/alice")
    }))
    .unwrap()
}

#[tokio::test]
async fn test_inbox_rejects_missing_signature_with_no_writes() {
    // No mock results queued: any DB statement would error the handler into
    // a 500, so the 400 also proves zero mutations.
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = inbox_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/inbox")
                .header("Content-Type", "application/activity+json")
                .body(Body::from(follow_body()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbox_rejects_tampered_body_with_no_writes() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = inbox_router(db);

    // Sign one body, deliver another. The digest check fails before any key
    // fetch or processing.
    let keypair = letterpress_common::generate_rsa_keypair().unwrap();
    let signer = HttpSigner::new(
        &keypair.private_key_pem,
        "https://remote.example/users/bob#main-key".to_string(),
    )
    .unwrap();

    let inbox_url = Url::parse(&format!("{BASE_URL}/inbox")).unwrap();
    let signed_headers = signer
        .sign_request("POST", &inbox_url, Some(b"{\"type\":\"Follow\"}"))
        .unwrap();

    let mut request = Request::builder()
        .method("POST")
        .uri("/inbox")
        .header("Content-Type", "application/activity+json");
    for (name, value) in &signed_headers {
        request = request.header(name, value);
    }

    let response = app
        .oneshot(request.body(Body::from(follow_body())).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbox_rejects_malformed_json() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let app = inbox_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/inbox")
                .header("Content-Type", "application/activity+json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_inbox_unknown_actor_is_404() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<actor::Model>::new()])
            .into_connection(),
    );
    let app = inbox_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users/ghost/inbox")
                .header("Content-Type", "application/activity+json")
                .body(Body::from(follow_body()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webfinger_resolves_local_actor() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[local_actor("a1", "alice")]])
            .into_connection(),
    );

    let state = WebfingerState::new(
        "blog.example".to_string(),
        ActorRepository::new(db),
        Url::parse(BASE_URL).unwrap(),
    );
    let app = Router::new().route(
        "/.well-known/webfinger",
        get(webfinger_handler).with_state(state),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/.well-known/webfinger?resource=acct:alice@blog.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let jrd: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(jrd["subject"], "acct:alice@blog.example");
    let self_link = jrd["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["rel"] == "self")
        .unwrap();
    assert_eq!(self_link["href"], format!("{BASE_URL}/users/alice"));
}

#[tokio::test]
async fn test_following_collection_is_always_empty() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[local_actor("a1", "alice")]])
            .into_connection(),
    );

    let state = CollectionState::new(
        ActorRepository::new(Arc::clone(&db)),
        PostRepository::new(Arc::clone(&db)),
        FollowingRepository::new(db),
        Url::parse(BASE_URL).unwrap(),
    );
    let app = Router::new().route(
        "/users/{slug}/following",
        get(following_handler).with_state(state),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/alice/following")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let collection: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(collection["totalItems"], 0);
    assert_eq!(collection["orderedItems"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_followers_collection_lists_accepted_follower_iris() {
    let follower_edge = letterpress_db::entities::following::Model {
        iri: "https://remote.example/f/1".to_string(),
        follower_id: "a2".to_string(),
        followee_id: "a1".to_string(),
        accepted: Some(Utc::now().into()),
        created_at: Utc::now().into(),
    };

    let mut follower = local_actor("a2", "bob");
    follower.iri = "https://remote.example/users/bob".to_string();
    follower.blog_id = None;

    let mut alice = local_actor("a1", "alice");
    alice.followers_count = 1;

    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[follower_edge]])
            .append_query_results([[follower]])
            .into_connection(),
    );

    let state = CollectionState::new(
        ActorRepository::new(Arc::clone(&db)),
        PostRepository::new(Arc::clone(&db)),
        FollowingRepository::new(db),
        Url::parse(BASE_URL).unwrap(),
    );
    let app = Router::new().route(
        "/users/{slug}/followers",
        get(followers_handler).with_state(state),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/alice/followers")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let collection: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(collection["totalItems"], 1);
    assert_eq!(
        collection["orderedItems"][0],
        "https://remote.example/users/bob"
    );
}

#[tokio::test]
async fn test_actor_document_unknown_slug_is_404() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<actor::Model>::new()])
            .into_connection(),
    );

    let state = ActorDocState::new(
        ActorRepository::new(Arc::clone(&db)),
        ActorKeypairRepository::new(db),
        Url::parse(BASE_URL).unwrap(),
    );
    let app = Router::new().route("/users/{slug}", get(actor_handler).with_state(state));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/users/ghost")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
