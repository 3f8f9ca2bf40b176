use std::collections::BTreeMap;

use common::{
    error::{AppError, Res},
    razorpay::{CreateSubscription, Subscription},
};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

/// Attribution used when a sign-up carries no affiliate.
pub const DIRECT_AFFILIATE: &str = "direct";
/// `firebase_uid` note when no free-trial user matched the email.
pub const UNKNOWN_FIREBASE_UID: &str = "N/A";
pub const CUSTOMER_NOTIFY: u8 = 1;
pub const TOTAL_BILLING_CYCLES: u32 = 12;

/// Request body as sent by the sign-up page, before validation. Free-text
/// fields also accept numbers and booleans, e.g. a phone sent as a number.
#[derive(Debug, Deserialize)]
pub struct RawSubscriptionRequest {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub affiliate_id: Option<String>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(&value)
            .map(Some)
            .ok_or_else(|| {
                <D::Error as de::Error>::custom(format!("expected a string, found {}", value))
            }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRequest {
    pub name: String,
    /// Lower-cased.
    pub email: String,
    pub phone: String,
    pub plan_id: String,
    pub description: Option<String>,
    pub affiliate_id: Option<String>,
}

/// Parses the body as JSON without imposing the request shape, so the
/// affiliate can be recovered even when another field is unusable.
pub fn parse_body(body: &[u8]) -> Res<Value> {
    serde_json::from_slice(body).map_err(|e| AppError::Parse(format!("Invalid request body: {}", e)))
}

/// Affiliate named by a parsed body, `direct` when absent or blank.
pub fn affiliate_in(body: &Value) -> String {
    resolve_affiliate(body.get("affiliate_id").and_then(scalar_to_string).as_deref())
}

impl RawSubscriptionRequest {
    pub fn from_slice(body: &[u8]) -> Res<Self> {
        Self::from_value(parse_body(body)?)
    }

    pub fn from_value(body: Value) -> Res<Self> {
        serde_json::from_value(body)
            .map_err(|e| AppError::Parse(format!("Invalid request body: {}", e)))
    }

    pub fn validate(self, default_plan_id: &str) -> Res<SubscriptionRequest> {
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Parse("email is required".to_string()))?;

        Ok(SubscriptionRequest {
            name: self.name.unwrap_or_default(),
            email,
            phone: self.phone.unwrap_or_default(),
            plan_id: self
                .plan_id
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| default_plan_id.to_string()),
            description: self.description,
            affiliate_id: self.affiliate_id.filter(|a| !a.is_empty()),
        })
    }
}

pub fn resolve_affiliate(affiliate_id: Option<&str>) -> String {
    affiliate_id
        .filter(|a| !a.is_empty())
        .unwrap_or(DIRECT_AFFILIATE)
        .to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionNotes {
    pub firebase_uid: String,
    pub user_email: String,
    pub user_name: String,
    pub user_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_description: Option<String>,
    pub affiliate_id: String,
    pub created_via: String,
}

impl SubscriptionNotes {
    fn into_map(self) -> BTreeMap<String, String> {
        let mut notes = BTreeMap::from([
            ("firebase_uid".to_string(), self.firebase_uid),
            ("user_email".to_string(), self.user_email),
            ("user_name".to_string(), self.user_name),
            ("user_phone".to_string(), self.user_phone),
            ("affiliate_id".to_string(), self.affiliate_id),
            ("created_via".to_string(), self.created_via),
        ]);
        if let Some(description) = self.plan_description {
            notes.insert("plan_description".to_string(), description);
        }
        notes
    }
}

/// What gets sent to the payment provider.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionPayload {
    pub plan_id: String,
    pub customer_notify: u8,
    pub total_count: u32,
    pub notes: SubscriptionNotes,
}

impl From<SubscriptionPayload> for CreateSubscription {
    fn from(payload: SubscriptionPayload) -> Self {
        CreateSubscription {
            plan_id: payload.plan_id,
            customer_notify: payload.customer_notify,
            total_count: payload.total_count,
            notes: payload.notes.into_map(),
        }
    }
}

/// Success body: the provider's subscription plus the echoed affiliate.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionCreatedResponse {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub affiliate_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_lowercases_email_and_defaults_plan() {
        let raw = RawSubscriptionRequest::from_slice(
            br#"{"name":"A","email":" A@X.com ","phone":"1"}"#,
        )
        .unwrap();
        let req = raw.validate("plan_default").unwrap();
        assert_eq!(req.email, "a@x.com");
        assert_eq!(req.plan_id, "plan_default");
        assert_eq!(req.affiliate_id, None);
    }

    #[test]
    fn missing_email_is_a_parse_error() {
        let body = parse_body(br#"{"name":"A","affiliate_id":"aff_1"}"#).unwrap();
        assert_eq!(affiliate_in(&body), "aff_1");
        let raw = RawSubscriptionRequest::from_value(body).unwrap();
        let err = raw.validate("plan_default").unwrap_err();
        assert!(matches!(err, AppError::Parse(msg) if msg == "email is required"));
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let err = RawSubscriptionRequest::from_slice(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::Parse(msg) if msg.starts_with("Invalid request body")));
    }

    #[test]
    fn blank_plan_falls_back_to_default() {
        let raw = RawSubscriptionRequest::from_slice(br#"{"email":"a@x.com","plan_id":"  "}"#)
            .unwrap();
        assert_eq!(raw.validate("plan_default").unwrap().plan_id, "plan_default");
    }

    #[test]
    fn numeric_fields_become_strings() {
        let raw = RawSubscriptionRequest::from_slice(
            br#"{"name":"A","email":"a@x.com","phone":9999999999,"affiliate_id":42,"description":null}"#,
        )
        .unwrap();
        let req = raw.validate("plan_default").unwrap();
        assert_eq!(req.phone, "9999999999");
        assert_eq!(req.affiliate_id.as_deref(), Some("42"));
        assert_eq!(req.description, None);
    }

    #[test]
    fn affiliate_survives_an_unusable_field() {
        let body = parse_body(br#"{"email":"a@x.com","phone":{"cc":"91"},"affiliate_id":"aff_1"}"#)
            .unwrap();
        assert_eq!(affiliate_in(&body), "aff_1");
        let err = RawSubscriptionRequest::from_value(body).unwrap_err();
        assert!(matches!(err, AppError::Parse(msg) if msg.contains("expected a string")));

        assert_eq!(affiliate_in(&parse_body(b"[1, 2]").unwrap()), DIRECT_AFFILIATE);
    }

    #[test]
    fn blank_affiliate_falls_back_to_direct() {
        assert_eq!(resolve_affiliate(None), DIRECT_AFFILIATE);
        assert_eq!(resolve_affiliate(Some("")), DIRECT_AFFILIATE);
        assert_eq!(resolve_affiliate(Some("aff_9")), "aff_9");
    }

    #[test]
    fn notes_omit_missing_description() {
        let payload = SubscriptionPayload {
            plan_id: "p1".to_string(),
            customer_notify: CUSTOMER_NOTIFY,
            total_count: TOTAL_BILLING_CYCLES,
            notes: SubscriptionNotes {
                firebase_uid: UNKNOWN_FIREBASE_UID.to_string(),
                user_email: "a@x.com".to_string(),
                user_name: "A".to_string(),
                user_phone: "1".to_string(),
                plan_description: None,
                affiliate_id: DIRECT_AFFILIATE.to_string(),
                created_via: "TraderLog Web".to_string(),
            },
        };
        let params = CreateSubscription::from(payload);
        assert_eq!(params.notes.len(), 6);
        assert!(!params.notes.contains_key("plan_description"));
        assert_eq!(params.notes["firebase_uid"], "N/A");
        assert_eq!(params.total_count, 12);
    }
}
