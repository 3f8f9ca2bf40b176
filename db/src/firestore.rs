use chrono::{DateTime, Duration, Utc};
use common::{
    error::{AppError, Res},
    jwt::{AssertionSpec, DATASTORE_SCOPE, sign_service_account_assertion},
};
use reqwest::Client;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    credentials::ServiceAccount,
    dtos::query::{AccessTokenResponse, Document, RunQueryRequest, RunQueryResponse, StructuredQuery},
};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Token accepted by the Firestore emulator.
const EMULATOR_TOKEN: &str = "owner";
/// Project id used against the emulator when no service account is configured.
pub const EMULATOR_PROJECT_ID: &str = "demo-project";
/// Refresh this long before the token actually expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
    }
}

enum TokenSource {
    ServiceAccount {
        account: ServiceAccount,
        cache: RwLock<Option<CachedToken>>,
    },
    Static(String),
}

/// Minimal Cloud Firestore REST client: authenticated structured queries.
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    tokens: TokenSource,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl FirestoreClient {
    /// Client authenticating as the given service account.
    pub fn new(account: ServiceAccount, base_url: &str) -> Self {
        FirestoreClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: account.project_id.clone(),
            tokens: TokenSource::ServiceAccount {
                account,
                cache: RwLock::new(None),
            },
        }
    }

    /// Client for a local emulator, `host` is `host:port`.
    pub fn emulator(host: &str, project_id: &str) -> Res<Self> {
        let url = url::Url::parse(&format!("http://{}", host)).map_err(|e| {
            AppError::Configuration(format!("FIRESTORE_EMULATOR_HOST is invalid: {}", e))
        })?;
        Ok(FirestoreClient {
            client: Client::new(),
            base_url: url.as_str().trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            tokens: TokenSource::Static(EMULATOR_TOKEN.to_string()),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Runs a structured query against the default database and returns the
    /// matched documents.
    pub async fn run_query(&self, query: StructuredQuery) -> Res<Vec<Document>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/projects/{}/databases/(default)/documents:runQuery",
            self.base_url, self.project_id
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&RunQueryRequest {
                structured_query: query,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("query failed")
                .to_string();
            return Err(AppError::Store(format!("{} ({})", message, status.as_u16())));
        }

        let results = response.json::<Vec<RunQueryResponse>>().await?;
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }

    async fn access_token(&self) -> Res<String> {
        let (account, cache) = match &self.tokens {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount { account, cache } => (account, cache),
        };

        if let Some(token) = cache.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let mut guard = cache.write().await;
        // another request may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.exchange_assertion(account).await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn exchange_assertion(&self, account: &ServiceAccount) -> Res<CachedToken> {
        let assertion = sign_service_account_assertion(AssertionSpec {
            client_email: &account.client_email,
            private_key: &account.private_key,
            private_key_id: account.private_key_id.as_deref(),
            token_uri: &account.token_uri,
            scope: DATASTORE_SCOPE,
        })?;

        let response = self
            .client
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            let message = body["error_description"]
                .as_str()
                .or(body["error"].as_str())
                .unwrap_or("token exchange failed")
                .to_string();
            return Err(AppError::Store(format!("{} ({})", message, status.as_u16())));
        }

        let token = response.json::<AccessTokenResponse>().await?;
        log::debug!("Obtained Firestore access token for {}", account.client_email);
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now()
                + Duration::seconds(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const TEST_KEY: &str = include_str!("../tests/fixtures/test_key.pem");

    fn account(token_uri: String) -> ServiceAccount {
        ServiceAccount {
            project_id: "traderlog".to_string(),
            client_email: "svc@traderlog.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY.to_string(),
            private_key_id: Some("kid_1".to_string()),
            token_uri,
        }
    }

    #[tokio::test]
    async fn emulator_uses_static_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1/projects/demo-project/databases/(default)/documents:runQuery",
            )
            .match_header("authorization", "Bearer owner")
            .with_status(200)
            .with_body(r#"[{"readTime":"2024-01-01T00:00:00Z"}]"#)
            .create_async()
            .await;

        let host = server.host_with_port();
        let client = FirestoreClient::emulator(&host, EMULATOR_PROJECT_ID).unwrap();
        let docs = client
            .run_query(StructuredQuery::string_equals("free_trial_users", "email", "a@x.com", 1))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn exchanges_assertion_once_and_caches_token() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(Matcher::UrlEncoded(
                "grant_type".to_string(),
                JWT_BEARER_GRANT.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.test","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;
        let query_mock = server
            .mock(
                "POST",
                "/v1/projects/traderlog/databases/(default)/documents:runQuery",
            )
            .match_header("authorization", "Bearer ya29.test")
            .with_status(200)
            .with_body(
                json!([{
                    "document": {
                        "name": "projects/traderlog/databases/(default)/documents/free_trial_users/uid_1",
                        "fields": { "email": { "stringValue": "a@x.com" } }
                    },
                    "readTime": "2024-01-01T00:00:00Z"
                }])
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let client = FirestoreClient::new(account(format!("{}/token", server.url())), &server.url());
        for _ in 0..2 {
            let docs = client
                .run_query(StructuredQuery::string_equals("free_trial_users", "email", "a@x.com", 1))
                .await
                .unwrap();
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].id(), "uid_1");
        }

        token_mock.assert_async().await;
        query_mock.assert_async().await;
    }

    #[tokio::test]
    async fn permission_denied_is_a_store_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                "/v1/projects/demo-project/databases/(default)/documents:runQuery",
            )
            .with_status(403)
            .with_body(r#"{"error":{"code":403,"message":"Missing or insufficient permissions.","status":"PERMISSION_DENIED"}}"#)
            .create_async()
            .await;

        let client = FirestoreClient::emulator(&server.host_with_port(), EMULATOR_PROJECT_ID).unwrap();
        let err = client
            .run_query(StructuredQuery::string_equals("free_trial_users", "email", "a@x.com", 1))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Document store error: Missing or insufficient permissions. (403)"
        );
    }

    #[tokio::test]
    async fn failed_token_exchange_is_a_store_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#)
            .create_async()
            .await;

        let client = FirestoreClient::new(account(format!("{}/token", server.url())), &server.url());
        let err = client
            .run_query(StructuredQuery::string_equals("free_trial_users", "email", "a@x.com", 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Store(msg) if msg.contains("Invalid JWT Signature.")));
    }
}
