use base64::{Engine, engine::general_purpose::STANDARD};
use common::{
    error::{AppError, Res},
    jwt,
};
use serde::Deserialize;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The subset of a Google service-account key file needed to talk to Firestore.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parses the credential blob, accepted either as raw JSON or as base64
    /// encoded JSON. Errors never echo the blob.
    pub fn parse(blob: &str) -> Res<Self> {
        let blob = blob.trim();
        let json = if blob.starts_with('{') {
            blob.to_string()
        } else {
            let bytes = STANDARD.decode(blob).map_err(|_| {
                AppError::Configuration(
                    "FIREBASE_SERVICE_ACCOUNT is neither JSON nor base64 encoded JSON".to_string(),
                )
            })?;
            String::from_utf8(bytes).map_err(|_| {
                AppError::Configuration("FIREBASE_SERVICE_ACCOUNT is not valid UTF-8".to_string())
            })?
        };

        let account: ServiceAccount = serde_json::from_str(&json).map_err(|e| {
            AppError::Configuration(format!(
                "FIREBASE_SERVICE_ACCOUNT is malformed (line {}, column {})",
                e.line(),
                e.column()
            ))
        })?;

        for (name, value) in [
            ("project_id", &account.project_id),
            ("client_email", &account.client_email),
            ("private_key", &account.private_key),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Configuration(format!(
                    "FIREBASE_SERVICE_ACCOUNT has an empty {}",
                    name
                )));
            }
        }

        jwt::encoding_key(&account.private_key).map_err(|_| {
            AppError::Configuration("FIREBASE_SERVICE_ACCOUNT has an invalid private_key".to_string())
        })?;

        Ok(account)
    }
}
