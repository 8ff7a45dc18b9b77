use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{Instrument, info_span, instrument};

use super::RestBackend;
use crate::{
    error::StoreError,
    models::{Role, RoleAssignment},
    ports::RoleStore,
};

const TABLE: &str = "user_roles";

#[async_trait]
impl RoleStore for RestBackend {
    #[instrument(skip(self))]
    async fn role(&self, identity_id: &str) -> Result<Option<RoleAssignment>, StoreError> {
        let rows: Vec<RoleAssignment> = self
            .rows(
                TABLE,
                &[
                    ("user_id", format!("eq.{identity_id}")),
                    ("select", "user_id,role,updated_at".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn upsert_role(
        &self,
        identity_id: &str,
        role: Role,
    ) -> Result<RoleAssignment, StoreError> {
        let assignment = RoleAssignment {
            identity_id: identity_id.to_string(),
            role,
            updated_at: Utc::now(),
        };

        let url = self.table_url(TABLE, &[("on_conflict", "user_id".to_string())])?;
        let span = info_span!("backend.upsert_role", http.method = "POST", url = %url);
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&json!({
                "user_id": assignment.identity_id,
                "role": assignment.role,
                "updated_at": assignment.updated_at,
            }))
            .send()
            .instrument(span)
            .await?;

        let response = Self::check(response).await?;
        let body = response.bytes().await?;
        // `return=representation` echoes the stored row; an empty body means
        // the backend ignored the preference.
        if body.is_empty() {
            return Ok(assignment);
        }
        let rows: Vec<RoleAssignment> = serde_json::from_slice(&body)?;
        Ok(rows.into_iter().next().unwrap_or(assignment))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{
        backend::{BackendConfig, RestBackend},
        models::Role,
        ports::RoleStore,
    };
    use secrecy::SecretString;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn backend(uri: &str) -> RestBackend {
        RestBackend::new(
            BackendConfig::new(uri.to_string(), SecretString::from("anon-key".to_string()))
                .with_access_token(SecretString::from("user-token".to_string())),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn role_reads_assignment() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", "eq.user-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": "user-1", "role": "government", "updated_at": "2026-04-02T12:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let assignment = backend(&server.uri()).role("user-1").await?.unwrap();
        assert_eq!(assignment.role, Role::Government);
        assert_eq!(assignment.identity_id, "user-1");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_role_value_is_a_decode_error() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"user_id": "user-1", "role": "superuser", "updated_at": "2026-04-02T12:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let result = backend(&server.uri()).role("user-1").await;
        assert!(matches!(result, Err(crate::error::StoreError::Decode(_))));
        Ok(())
    }

    #[tokio::test]
    async fn upsert_posts_with_merge_preference() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("on_conflict", "user_id"))
            .and(header(
                "prefer",
                "resolution=merge-duplicates,return=representation",
            ))
            .and(body_partial_json(json!({"user_id": "user-1", "role": "ngo"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                {"user_id": "user-1", "role": "ngo", "updated_at": "2026-04-02T12:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let saved = backend(&server.uri()).upsert_role("user-1", Role::Ngo).await?;
        assert_eq!(saved.role, Role::Ngo);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_without_representation_returns_local_row() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_roles"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let saved = backend(&server.uri())
            .upsert_role("user-3", Role::Research)
            .await?;
        assert_eq!(saved.identity_id, "user-3");
        assert_eq!(saved.role, Role::Research);
        Ok(())
    }
}
