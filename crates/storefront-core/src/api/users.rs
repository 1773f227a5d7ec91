use serde_json::Value;
use tracing::info;

use super::envelope::decode_keyed;
use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{NewUser, User, UserUpdate};

/// Account administration (admin session required).
#[derive(Clone)]
pub struct UserApi {
    session: SessionClient,
}

impl UserApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> Result<Vec<User>, SessionError> {
        self.session.get_json("/users", "Failed to fetch users").await
    }

    pub async fn get(&self, id: &str) -> Result<User, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/users/{}", id), "Failed to fetch user")
            .await?;
        decode_keyed(data, "user")
    }

    /// Create an account with an explicit role. Unlike `register`, this does
    /// not touch the current session.
    pub async fn create(&self, user: &NewUser) -> Result<User, SessionError> {
        let data: Value = self
            .session
            .post_json("/users", user, "Failed to create user")
            .await?;
        let created: User = decode_keyed(data, "user")?;
        info!(id = ?created.id, role = ?created.role, "Created user");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<User, SessionError> {
        let data: Value = self
            .session
            .put_json(&format!("/users/{}", id), update, "Failed to update user")
            .await?;
        decode_keyed(data, "user")
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.session
            .delete_json(&format!("/users/{}", id), "Failed to delete user")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::SessionError;
    use crate::models::{NewUser, Role, UserUpdate};
    use crate::storage::MemoryStore;
    use crate::SessionClient;

    fn user_json(id: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": format!("{}@example.com", id),
            "role": role,
            "firstName": "Grace",
            "lastName": "Hopper",
            "phone": "0600000000"
        })
    }

    fn admin_session(server: &MockServer) -> SessionClient {
        let session = SessionClient::new(&server.uri(), Arc::new(MemoryStore::new())).unwrap();
        session.tokens().set_tokens("admin-token", None);
        session
    }

    #[tokio::test]
    async fn test_list_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .and(header("Authorization", "Bearer admin-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [user_json("u1", "USER"), user_json("u2", "ADMIN")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let users = admin_session(&server).users().list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(users[1].is_admin());
    }

    #[tokio::test]
    async fn test_get_accepts_wrapped_and_bare_payloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"user": user_json("u1", "USER")}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": user_json("u2", "DISABLED")
            })))
            .mount(&server)
            .await;

        let api = admin_session(&server).users();
        assert_eq!(api.get("u1").await.unwrap().full_name(), "Grace Hopper");
        assert_eq!(api.get("u2").await.unwrap().role, Role::Disabled);
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/u1"))
            .and(body_json(json!({"role": "ADMIN"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"user": user_json("u1", "ADMIN")}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let update = UserUpdate {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let user = admin_session(&server).users().update("u1", &update).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_create_does_not_change_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_partial_json(json!({"email": "u3@example.com", "role": "USER"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": user_json("u3", "USER")
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = admin_session(&server);
        let new_user = NewUser {
            email: "u3@example.com".into(),
            role: Role::User,
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            password: "secret".into(),
            phone: "0600000000".into(),
            company: None,
        };
        let created = session.users().create(&new_user).await.unwrap();
        assert_eq!(created.id.as_deref(), Some("u3"));
        assert_eq!(session.tokens().access_token().as_deref(), Some("admin-token"));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_delete_not_found_surfaces_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"success": false, "message": "User not found"})),
            )
            .mount(&server)
            .await;

        let err = admin_session(&server).users().delete("missing").await.unwrap_err();
        assert!(matches!(err, SessionError::Http { status: 404, .. }));
        assert_eq!(err.to_string(), "User not found");
    }
}
