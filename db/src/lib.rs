use common::error::Res;

use crate::{credentials::ServiceAccount, firestore::FirestoreClient};

pub mod credentials;
pub mod firestore;
pub mod user;

pub mod models {
    pub mod user;
}

pub mod dtos {
    pub mod query;
}

/// Builds the Firestore client from the service-account blob, or an
/// emulator client when `emulator_host` is set.
pub fn setup(
    service_account: Option<&str>,
    base_url: &str,
    emulator_host: Option<&str>,
) -> Res<FirestoreClient> {
    let account = service_account.map(ServiceAccount::parse).transpose()?;

    match (emulator_host, account) {
        (Some(host), account) => {
            let project_id = account
                .as_ref()
                .map(|a| a.project_id.as_str())
                .unwrap_or(firestore::EMULATOR_PROJECT_ID);
            log::info!("Using Firestore emulator at {}", host);
            FirestoreClient::emulator(host, project_id)
        }
        (None, Some(account)) => Ok(FirestoreClient::new(account, base_url)),
        (None, None) => Err(common::error::AppError::Configuration(
            "FIREBASE_SERVICE_ACCOUNT is not set".to_string(),
        )),
    }
}
