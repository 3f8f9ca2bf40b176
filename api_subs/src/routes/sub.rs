use actix_web::{HttpResponse, web};
use common::http::{self, Success};

use crate::{services, state::ServiceState};

/// Creates a Razorpay subscription for a sign-up.
///
/// # Input
/// JSON body with `name`, `email`, `phone` and optional `plan_id`,
/// `description`, `affiliate_id`.
///
/// # Output
/// - Success: 200 with the Razorpay subscription object plus `affiliate_id`
/// - Services not configured: 500 `{ "error" }`
/// - Bad body or provider failure: 500 `{ "error", "details", "affiliate_id" }`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/create-subscription', {
///   method: 'POST',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     name: "Asha",
///     email: "asha@example.com",
///     phone: "9999999999",
///     affiliate_id: new URLSearchParams(location.search).get('ref')
///   })
/// });
/// const { id, status, affiliate_id } = await response.json();
/// ```
pub async fn post_create_subscription(
    body: web::Bytes,
    state: web::Data<ServiceState>,
) -> HttpResponse {
    let ready = match state.ready() {
        Ok(ready) => ready,
        Err(e) => return e.to_http_response(),
    };

    match services::sub::create_subscription(ready, &body).await {
        Ok(created) => Success::ok(created),
        Err(failure) => failure.error.to_failure_response(&failure.affiliate_id),
    }
}

pub async fn method_not_allowed() -> HttpResponse {
    http::method_not_allowed()
}
