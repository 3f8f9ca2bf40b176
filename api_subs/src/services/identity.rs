use async_trait::async_trait;
use db::firestore::FirestoreClient;

/// Resolves the Firebase uid of an already known user from their email.
///
/// Best effort: implementations swallow their own failures and answer
/// `None`, a lookup must never fail the subscription.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, email: &str) -> Option<String>;
}

/// Looks the email up in the `free_trial_users` collection.
pub struct FreeTrialUserLookup {
    client: FirestoreClient,
}

impl FreeTrialUserLookup {
    pub fn new(client: FirestoreClient) -> Self {
        FreeTrialUserLookup { client }
    }
}

#[async_trait]
impl IdentityResolver for FreeTrialUserLookup {
    async fn resolve(&self, email: &str) -> Option<String> {
        match db::user::find_user_id_by_email(&self.client, email).await {
            Ok(Some(uid)) => {
                log::debug!("Matched free trial user {}", uid);
                Some(uid)
            }
            Ok(None) => {
                log::debug!("No free trial user for this email");
                None
            }
            Err(e) => {
                log::warn!("Free trial user lookup failed, continuing without uid: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::firestore::EMULATOR_PROJECT_ID;

    const RUN_QUERY: &str = "/v1/projects/demo-project/databases/(default)/documents:runQuery";

    #[tokio::test]
    async fn store_failure_resolves_to_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", RUN_QUERY)
            .with_status(503)
            .with_body(r#"{"error":{"code":503,"message":"The service is currently unavailable."}}"#)
            .create_async()
            .await;

        let client =
            FirestoreClient::emulator(&server.host_with_port(), EMULATOR_PROJECT_ID).unwrap();
        let lookup = FreeTrialUserLookup::new(client);

        assert_eq!(lookup.resolve("a@x.com").await, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_store_resolves_to_none() {
        // nothing listens on port 9 of localhost
        let client = FirestoreClient::emulator("127.0.0.1:9", EMULATOR_PROJECT_ID).unwrap();
        let lookup = FreeTrialUserLookup::new(client);

        assert_eq!(lookup.resolve("a@x.com").await, None);
    }

    #[tokio::test]
    async fn match_resolves_to_document_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", RUN_QUERY)
            .with_status(200)
            .with_body(
                r#"[{"document":{"name":"projects/demo-project/databases/(default)/documents/free_trial_users/uid_5","fields":{}},"readTime":"2024-01-01T00:00:00Z"}]"#,
            )
            .create_async()
            .await;

        let client =
            FirestoreClient::emulator(&server.host_with_port(), EMULATOR_PROJECT_ID).unwrap();
        let lookup = FreeTrialUserLookup::new(client);

        assert_eq!(lookup.resolve("a@x.com").await.as_deref(), Some("uid_5"));
    }
}
