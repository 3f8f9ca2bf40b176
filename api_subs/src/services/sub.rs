use common::error::AppError;

use crate::{
    dtos::sub::{
        CUSTOMER_NOTIFY, RawSubscriptionRequest, SubscriptionCreatedResponse, SubscriptionNotes,
        SubscriptionPayload, SubscriptionRequest, TOTAL_BILLING_CYCLES, UNKNOWN_FIREBASE_UID,
        affiliate_in, parse_body, resolve_affiliate,
    },
    state::{PipelineSettings, Services},
};

/// A failed subscription attempt together with the affiliate it belonged to.
#[derive(Debug)]
pub struct SubscriptionFailure {
    pub error: AppError,
    pub affiliate_id: String,
}

/// Builds the provider payload. A missing uid becomes `N/A`, a missing
/// affiliate becomes `direct`.
pub fn build_payload(
    req: &SubscriptionRequest,
    firebase_uid: Option<String>,
    settings: &PipelineSettings,
) -> SubscriptionPayload {
    SubscriptionPayload {
        plan_id: req.plan_id.clone(),
        customer_notify: CUSTOMER_NOTIFY,
        total_count: TOTAL_BILLING_CYCLES,
        notes: SubscriptionNotes {
            firebase_uid: firebase_uid.unwrap_or_else(|| UNKNOWN_FIREBASE_UID.to_string()),
            user_email: req.email.clone(),
            user_name: req.name.clone(),
            user_phone: req.phone.clone(),
            plan_description: req.description.clone(),
            affiliate_id: resolve_affiliate(req.affiliate_id.as_deref()),
            created_via: settings.subscription_source.clone(),
        },
    }
}

/// Parses the body, resolves the user, and opens the subscription.
pub async fn create_subscription(
    services: &Services,
    body: &[u8],
) -> Result<SubscriptionCreatedResponse, SubscriptionFailure> {
    let body = parse_body(body).map_err(|error| SubscriptionFailure {
        error,
        affiliate_id: resolve_affiliate(None),
    })?;
    let affiliate_id = affiliate_in(&body);
    let fail = |error: AppError| SubscriptionFailure {
        error,
        affiliate_id: affiliate_id.clone(),
    };

    let req = RawSubscriptionRequest::from_value(body)
        .and_then(|raw| raw.validate(&services.settings.default_plan_id))
        .map_err(fail)?;

    let firebase_uid = match &services.identity {
        Some(identity) => identity.resolve(&req.email).await,
        None => None,
    };

    let payload = build_payload(&req, firebase_uid, &services.settings);
    log::info!(
        "Creating subscription on plan {} for affiliate {}",
        payload.plan_id,
        affiliate_id
    );

    let subscription = services
        .provider
        .create_subscription(payload)
        .await
        .map_err(|e| {
            log::error!("Subscription creation failed: {}", e);
            fail(AppError::from(e))
        })?;

    log::info!(
        "Subscription {} created with status {}",
        subscription.id,
        subscription.status
    );
    Ok(SubscriptionCreatedResponse {
        subscription,
        affiliate_id,
    })
}
