use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{handlers::auth as auth_handlers, state::AppState};

pub fn app_router(state: Arc<AppState>) -> Router {
    let auth = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
        .route("/refresh", post(auth_handlers::refresh))
        .route("/logout", post(auth_handlers::logout))
        .route("/me", get(auth_handlers::me))
        .route("/session", get(auth_handlers::session));

    // outermost layer last: the id is set before the trace span reads it
    Router::new()
        .nest("/auth", auth)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            let request_id = req
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;
    use axum::{
        body::Body,
        http::{header, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        app_router(Arc::new(test_state()))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn register(app: &Router, email: &str) -> Value {
        let (status, body) = call(
            app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": email, "name": "Alice", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    #[tokio::test]
    async fn login_refresh_logout_over_http() {
        let app = app();
        let registered = register(&app, "a@x.com").await;
        assert_eq!(registered["token_type"], "Bearer");
        assert_eq!(registered["expires_in"], 900);

        let (status, login) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = login["access_token"].as_str().unwrap().to_string();
        let refresh = login["refresh_token"].as_str().unwrap().to_string();

        let (status, me) = call(&app, "GET", "/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "a@x.com");
        assert_eq!(me["name"], "Alice");

        let (status, renewed) = call(
            &app,
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(renewed.get("refresh_token").is_none());
        let new_access = renewed["access_token"].as_str().unwrap();
        assert_ne!(new_access, access);

        let (status, session) = call(&app, "GET", "/auth/session", Some(new_access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["id"], me["id"]);

        let (status, out) = call(
            &app,
            "POST",
            "/auth/logout",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["status"], "ok");

        let (status, err) = call(
            &app,
            "POST",
            "/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "invalid_refresh");
    }

    #[tokio::test]
    async fn guard_rejections_are_401_with_a_code() {
        let app = app();
        let registered = register(&app, "a@x.com").await;
        let refresh = registered["refresh_token"].as_str().unwrap();

        let (status, body) = call(&app, "GET", "/auth/session", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "missing_credential");

        let (status, body) = call(&app, "GET", "/auth/session", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "malformed_credential");

        let (status, body) = call(&app, "GET", "/auth/session", Some(refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "credential_invalid");
    }

    #[tokio::test]
    async fn non_bearer_authorization_is_malformed() {
        let req = Request::builder()
            .uri("/auth/session")
            .header(header::AUTHORIZATION, "Basic YWxpY2U6c2VjcmV0")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "malformed_credential");
    }

    #[tokio::test]
    async fn boundary_failure_codes() {
        let app = app();
        register(&app, "a@x.com").await;

        let (status, _) = call(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({ "email": "a@x.com", "name": "Alice", "password": "hunter22" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, "POST", "/auth/register", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "POST", "/auth/refresh", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "nope-nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "unauthorized");
    }

    #[tokio::test]
    async fn logout_of_unknown_token_still_succeeds() {
        let (status, body) = call(
            &app(),
            "POST",
            "/auth/logout",
            None,
            Some(json!({ "refresh_token": "never.issued.here" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let req = Request::builder()
            .uri("/auth/session")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert!(resp.headers().contains_key("x-request-id"));

        let req = Request::builder()
            .uri("/auth/session")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.headers()["x-request-id"], "abc-123");
    }
}
