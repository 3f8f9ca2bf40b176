use serde::{Deserialize, Serialize};

use crate::dtos::query::Document;

/// A document of the `free_trial_users` collection. Owned by the sign-up
/// flow; this service only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Document id, the user's Firebase uid.
    pub firebase_uid: String,
    pub email: Option<String>,
}

impl From<Document> for UserRecord {
    fn from(doc: Document) -> Self {
        UserRecord {
            firebase_uid: doc.id().to_string(),
            email: doc.string_field("email").map(str::to_string),
        }
    }
}
