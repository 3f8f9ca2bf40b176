use common::error::Res;

use crate::{dtos::query::StructuredQuery, firestore::FirestoreClient, models::user::UserRecord};

pub const FREE_TRIAL_USERS: &str = "free_trial_users";

/// Finds the free-trial user whose `email` field equals `email` exactly.
pub async fn get_user_by_email(client: &FirestoreClient, email: &str) -> Res<Option<UserRecord>> {
    let query = StructuredQuery::string_equals(FREE_TRIAL_USERS, "email", email, 1);
    let user = client
        .run_query(query)
        .await?
        .into_iter()
        .next()
        .map(UserRecord::from);
    Ok(user)
}

/// Firebase uid of the free-trial user registered with `email`, if any.
pub async fn find_user_id_by_email(client: &FirestoreClient, email: &str) -> Res<Option<String>> {
    get_user_by_email(client, email)
        .await
        .map(|user| user.map(|u| u.firebase_uid))
}
