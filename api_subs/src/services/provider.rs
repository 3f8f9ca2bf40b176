use async_trait::async_trait;
use common::razorpay::{CreateSubscription, ProviderError, RazorpayClient, Subscription};

use crate::dtos::sub::SubscriptionPayload;

/// Payment provider able to open a recurring subscription.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn create_subscription(
        &self,
        payload: SubscriptionPayload,
    ) -> Result<Subscription, ProviderError>;
}

#[async_trait]
impl SubscriptionProvider for RazorpayClient {
    async fn create_subscription(
        &self,
        payload: SubscriptionPayload,
    ) -> Result<Subscription, ProviderError> {
        let params = CreateSubscription::from(payload);
        RazorpayClient::create_subscription(self, &params).await
    }
}
