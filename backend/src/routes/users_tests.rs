//! Router tests for /api/users and /api/admin

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::repositories::{InMemoryUserRepository, NewUser, UserRepository};
    use crate::routes::create_router;
    use crate::state::AppState;
    use account_service_shared::Role;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response, StatusCode},
        Router,
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        router: Router,
        state: AppState,
        repo: Arc<InMemoryUserRepository>,
    }

    impl TestApp {
        fn new() -> Self {
            let repo = Arc::new(InMemoryUserRepository::new());
            let state = AppState::new(repo.clone(), AppConfig::default());
            Self {
                router: create_router(state.clone()),
                state,
                repo,
            }
        }

        /// Insert a user directly and return it with a session cookie
        async fn user_with_session(&self, email: &str, role: Role) -> (Uuid, String) {
            let user = self
                .repo
                .create(NewUser {
                    id: None,
                    email: email.to_string(),
                    password_hash: "$argon2id$unused".to_string(),
                    name: "Seeded User".to_string(),
                    role,
                })
                .await
                .unwrap();
            let pair = self.state.tokens().generate_token_pair(user.id, role).unwrap();
            (user.id, format!("access_token={}", pair.access_token))
        }

        async fn send(
            &self,
            method: &str,
            uri: &str,
            cookie: Option<&str>,
            body: Option<Value>,
        ) -> Response<Body> {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(cookie) = cookie {
                builder = builder.header(header::COOKIE, cookie);
            }
            let body = match body {
                Some(json) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
        }
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_current_user_requires_identity() {
        let app = TestApp::new();
        let response = app.send("GET", "/api/users", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_current_user_returns_profile() {
        let app = TestApp::new();
        let (id, cookie) = app.user_with_session("me@example.com", Role::User).await;

        let response = app.send("GET", "/api/users", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], id.to_string());
        assert_eq!(body["data"]["email"], "me@example.com");
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_expired_access_token_is_treated_as_anonymous() {
        let app = TestApp::new();
        let (id, _) = app.user_with_session("late@example.com", Role::User).await;
        let pair = app
            .state
            .tokens()
            .generate_token_pair_with_ttl(id, Role::User, Duration::seconds(-5))
            .unwrap();

        let cookie = format!("access_token={}", pair.access_token);
        let response = app.send("GET", "/api/users", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Public routes stay reachable with a stale cookie
        let response = app.send("GET", "/health", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_token_payload_is_rejected_everywhere() {
        let app = TestApp::new();
        let token = app
            .state
            .tokens()
            .sign(&json!({ "sub": "not-a-uuid", "role": "admin", "exp": Utc::now().timestamp() + 60 }))
            .unwrap();
        let cookie = format!("access_token={}", token);

        for uri in ["/api/users", "/health"] {
            let response = app.send("GET", uri, Some(&cookie), None).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_dashboard_guard() {
        let app = TestApp::new();
        let (_, guest) = app.user_with_session("guest@example.com", Role::Guest).await;
        let (_, user) = app.user_with_session("user@example.com", Role::User).await;
        let (admin_id, admin) = app.user_with_session("admin@example.com", Role::Admin).await;

        assert_eq!(
            app.send("GET", "/api/admin", None, None).await.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            app.send("GET", "/api/admin", Some(&guest), None).await.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            app.send("GET", "/api/admin", Some(&user), None).await.status(),
            StatusCode::FORBIDDEN
        );

        let response = app.send("GET", "/api/admin", Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Admin Dashboard");
        assert_eq!(body["data"]["admin_id"], admin_id.to_string());
        assert_eq!(body["data"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_patch_self_changes_only_supplied_fields() {
        let app = TestApp::new();
        let (id, cookie) = app.user_with_session("self@example.com", Role::User).await;

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", id),
                Some(&cookie),
                Some(json!({ "name": "Renamed User" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["name"], "Renamed User");
        assert_eq!(body["data"]["email"], "self@example.com");
        assert_eq!(body["data"]["role"], "user");
    }

    #[tokio::test]
    async fn test_patch_other_user_requires_admin() {
        let app = TestApp::new();
        let (_, cookie) = app.user_with_session("a@example.com", Role::User).await;
        let (other, _) = app.user_with_session("b@example.com", Role::User).await;

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", other),
                Some(&cookie),
                Some(json!({ "name": "Hijacked" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.repo.find_by_id(other).await.unwrap().name, "Seeded User");
    }

    #[tokio::test]
    async fn test_non_admin_cannot_change_own_role() {
        let app = TestApp::new();
        let (id, cookie) = app.user_with_session("climber@example.com", Role::Guest).await;

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", id),
                Some(&cookie),
                Some(json!({ "role": "admin" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.repo.find_by_id(id).await.unwrap().role, Role::Guest);
    }

    #[tokio::test]
    async fn test_admin_promotion_is_visible_after_refresh() {
        let app = TestApp::new();
        let (_, admin) = app.user_with_session("root@example.com", Role::Admin).await;
        let (target, _) = app.user_with_session("promote@example.com", Role::User).await;
        let stale = app.state.tokens().generate_token_pair(target, Role::User).unwrap();

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", target),
                Some(&admin),
                Some(json!({ "role": "admin" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["role"], "admin");

        // The old access token still says user
        let old_cookie = format!("access_token={}", stale.access_token);
        assert_eq!(
            app.send("GET", "/api/admin", Some(&old_cookie), None).await.status(),
            StatusCode::FORBIDDEN
        );

        let refreshed = app
            .send(
                "POST",
                "/auth/refresh",
                Some(&format!("refresh_token={}", stale.refresh_token)),
                None,
            )
            .await;
        assert_eq!(refreshed.status(), StatusCode::OK);

        let access = refreshed
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|c| c.starts_with("access_token="))
            .and_then(|c| c.split(';').next())
            .unwrap()
            .to_string();
        assert_eq!(
            app.send("GET", "/api/admin", Some(&access), None).await.status(),
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_patch_rejects_invalid_input() {
        let app = TestApp::new();
        let (id, cookie) = app.user_with_session("v@example.com", Role::User).await;

        let response = app
            .send("PATCH", "/api/users/not-a-uuid", Some(&cookie), Some(json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", id),
                Some(&cookie),
                Some(json!({ "email": "nope" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", id),
                Some(&cookie),
                Some(json!({ "role": "superuser" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_email_collision_returns_409() {
        let app = TestApp::new();
        app.user_with_session("taken@example.com", Role::User).await;
        let (id, cookie) = app.user_with_session("mine@example.com", Role::User).await;

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", id),
                Some(&cookie),
                Some(json!({ "email": "taken@example.com" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_admin_patch_missing_user_returns_404() {
        let app = TestApp::new();
        let (_, admin) = app.user_with_session("root@example.com", Role::Admin).await;

        let response = app
            .send(
                "PATCH",
                &format!("/api/users/{}", Uuid::new_v4()),
                Some(&admin),
                Some(json!({ "name": "Nobody Here" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_self_then_profile_is_gone() {
        let app = TestApp::new();
        let (id, cookie) = app.user_with_session("bye@example.com", Role::User).await;

        let response = app
            .send("DELETE", &format!("/api/users/{}", id), Some(&cookie), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "User deleted successfully");

        let response = app.send("GET", "/api/users", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let rows = app.repo.snapshot();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_other_user_requires_admin() {
        let app = TestApp::new();
        let (_, cookie) = app.user_with_session("a@example.com", Role::Guest).await;
        let (other, _) = app.user_with_session("b@example.com", Role::User).await;
        let (_, admin) = app.user_with_session("root@example.com", Role::Admin).await;

        let response = app
            .send("DELETE", &format!("/api/users/{}", other), Some(&cookie), None)
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .send("DELETE", &format!("/api/users/{}", other), Some(&admin), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .send("DELETE", &format!("/api/users/{}", other), Some(&admin), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_requires_identity() {
        let app = TestApp::new();
        let response = app
            .send("DELETE", &format!("/api/users/{}", Uuid::new_v4()), None, None)
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
