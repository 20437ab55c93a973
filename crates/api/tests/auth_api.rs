//! HTTP-level integration tests for sign-in, token exchange and bearer-token
//! authentication (session, service and federated tokens).

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get, get_auth, post_form, post_json, post_json_auth, service_token,
    test_config, TEST_PASSWORD,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mediadesk_api::auth::jwt::{generate_access_token, generate_service_token};
use mediadesk_db::models::user::User;
use mediadesk_db::repositories::Crud;
use serde_json::json;
use sqlx::PgPool;

const PROJECTS: &str = "/api/v1/projects";

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn sign_in_returns_token_and_user(pool: PgPool) {
    let user = create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let body = json!({ "email": "dana@example.com", "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/sign-in", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["user"]["user_id"], user.id);
    assert_eq!(json["user"]["email"], "dana@example.com");
    assert_eq!(json["user"]["is_admin"], false);
    assert!(json["user"].get("password_hash").is_none());

    // The issued token opens protected endpoints.
    let token = json["access_token"].as_str().unwrap();
    let response = get_auth(app, PROJECTS, token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sign_in_with_wrong_password_is_401(pool: PgPool) {
    create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let body = json!({ "email": "dana@example.com", "password": "nope" });
    let response = post_json(app, "/api/v1/auth/sign-in", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("www-authenticate").unwrap(), "Bearer");
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sign_in_with_unknown_email_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = json!({ "email": "ghost@example.com", "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/sign-in", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn password_grant_form_returns_token(pool: PgPool) {
    create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let form = "grant_type=password&username=dana%40example.com&password=correct+horse+battery";
    let response = post_form(app, "/api/v1/auth/token", form).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    assert!(json["access_token"].is_string());
    assert!(json.get("user").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn password_grant_with_bad_password_is_401(pool: PgPool) {
    create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let form = "username=dana%40example.com&password=wrong";
    let response = post_form(app, "/api/v1/auth/token", form).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Bearer tokens
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app, PROJECTS).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHENTICATED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn garbage_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, PROJECTS, "not.a.jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_signed_with_other_secret_is_401(pool: PgPool) {
    let user = create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let mut config = test_config().jwt;
    config.secret = "some-other-secret-entirely".into();
    let token = generate_access_token(user.id, &config).unwrap();

    let response = get_auth(app, PROJECTS, &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_token_is_401(pool: PgPool) {
    let user = create_user(&pool, "dana@example.com").await;
    let app = common::build_test_app(pool);

    let mut config = test_config().jwt;
    config.access_token_expiry_hours = -1;
    let token = generate_access_token(user.id, &config).unwrap();

    let response = get_auth(app, PROJECTS, &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_EXPIRED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn token_of_deleted_user_is_401(pool: PgPool) {
    let user = create_user(&pool, "dana@example.com").await;
    let token = generate_access_token(user.id, &test_config().jwt).unwrap();
    assert!(Crud::delete::<User>(&pool, user.id).await.unwrap());
    let app = common::build_test_app(pool);

    let response = get_auth(app, PROJECTS, &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn service_token_with_configured_key_is_accepted(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app, PROJECTS, &service_token()).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn service_token_with_wrong_key_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = generate_service_token("guessed-key", &test_config().jwt).unwrap();

    let response = get_auth(app, PROJECTS, &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn federated_token_is_refused_when_federation_is_off(pool: PgPool) {
    let app = common::build_test_app(pool);

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("provider-key".into());
    let key = EncodingKey::from_rsa_pem(
        include_str!("../src/auth/testdata/rsa_private.pem").as_bytes(),
    )
    .unwrap();
    let now = chrono::Utc::now().timestamp();
    let token = encode(&header, &json!({ "oid": "abc", "exp": now + 600 }), &key).unwrap();

    let response = get_auth(app, PROJECTS, &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
}

// ---------------------------------------------------------------------------
// User provisioning (service only)
// ---------------------------------------------------------------------------

async fn create_project(app: axum::Router, token: &str, wilkins_id: &str) {
    let response = post_json_auth(app, PROJECTS, json!({ "wilkins_id": wilkins_id }), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn service_provisions_user_who_can_then_sign_in(pool: PgPool) {
    let app = common::build_test_app(pool);
    let service = service_token();
    create_project(app.clone(), &service, "PRJ-1").await;

    let body = json!({
        "name": "Fox Mulder",
        "email": "fox@example.com",
        "password": "trustno1trustno1",
    });
    let uri = "/api/v1/projects/PRJ-1/users";
    let response = post_json_auth(app.clone(), uri, body, &service).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["email"], "fox@example.com");
    assert_eq!(json["is_admin"], false);

    let body = json!({ "email": "fox@example.com", "password": "trustno1trustno1" });
    let response = post_json(app, "/api/v1/auth/sign-in", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn people_cannot_provision_users(pool: PgPool) {
    let token = common::user_token(&pool).await;
    let app = common::build_test_app(pool);
    create_project(app.clone(), &token, "PRJ-1").await;

    let body = json!({
        "name": "Fox Mulder",
        "email": "fox@example.com",
        "password": "trustno1trustno1",
    });
    let response = post_json_auth(app, "/api/v1/projects/PRJ-1/users", body, &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn provisioning_validates_body(pool: PgPool) {
    let app = common::build_test_app(pool);
    let service = service_token();
    create_project(app.clone(), &service, "PRJ-1").await;

    let body = json!({ "name": "Fox", "email": "not-an-email", "password": "trustno1trustno1" });
    let response = post_json_auth(app, "/api/v1/projects/PRJ-1/users", body, &service).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
