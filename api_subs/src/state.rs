use std::sync::Arc;

use common::{
    env_config::Config,
    error::{AppError, Res},
    razorpay,
};

use crate::services::{
    identity::{FreeTrialUserLookup, IdentityResolver},
    provider::SubscriptionProvider,
};

/// Per-deployment knobs of the subscription pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub default_plan_id: String,
    pub subscription_source: String,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        PipelineSettings {
            default_plan_id: config.default_plan_id.clone(),
            subscription_source: config.subscription_source.clone(),
        }
    }
}

/// External service handles, built once per process and shared read-only
/// by every request.
pub struct Services {
    pub provider: Arc<dyn SubscriptionProvider>,
    /// `None` skips the user lookup stage.
    pub identity: Option<Arc<dyn IdentityResolver>>,
    pub settings: PipelineSettings,
}

impl Services {
    pub fn new(
        provider: Arc<dyn SubscriptionProvider>,
        identity: Option<Arc<dyn IdentityResolver>>,
        settings: PipelineSettings,
    ) -> Self {
        Services {
            provider,
            identity,
            settings,
        }
    }

    /// Builds the Razorpay client and, when the lookup is enabled, the
    /// Firestore client. Fails on the first missing or malformed credential.
    pub fn init(config: &Config) -> Res<Self> {
        let key_id = config
            .razorpay_key_id
            .as_deref()
            .ok_or_else(|| AppError::Configuration("RAZORPAY_KEY_ID is not set".to_string()))?;
        let key_secret = config
            .razorpay_key_secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration("RAZORPAY_SECRET is not set".to_string()))?;
        let provider = razorpay::create_client(key_id, key_secret, &config.razorpay_api_url);

        let identity: Option<Arc<dyn IdentityResolver>> = if config.user_lookup_enabled {
            let firestore = db::setup(
                config.firebase_service_account.as_deref(),
                &config.firestore_api_url,
                config.firestore_emulator_host.as_deref(),
            )?;
            log::info!("Firestore client ready for project {}", firestore.project_id());
            Some(Arc::new(FreeTrialUserLookup::new(firestore)))
        } else {
            log::info!("User lookup disabled, subscriptions carry no firebase uid");
            None
        };

        log::info!("Razorpay client ready for key {}", provider.key_id());
        Ok(Services::new(
            Arc::new(provider),
            identity,
            PipelineSettings::from(config),
        ))
    }
}

/// Outcome of service initialization, checked by every request.
pub enum ServiceState {
    Ready(Services),
    Unavailable(String),
}

impl ServiceState {
    /// Initializes the services, recording a failure instead of aborting.
    pub fn initialize(config: &Config) -> Self {
        match Services::init(config) {
            Ok(services) => ServiceState::Ready(services),
            Err(AppError::Configuration(reason)) => {
                log::error!("Service initialization failed: {}", reason);
                ServiceState::Unavailable(reason)
            }
            Err(e) => {
                log::error!("Service initialization failed: {}", e);
                ServiceState::Unavailable(e.to_string())
            }
        }
    }

    pub fn ready(&self) -> Res<&Services> {
        match self {
            ServiceState::Ready(services) => Ok(services),
            ServiceState::Unavailable(reason) => Err(AppError::Configuration(reason.clone())),
        }
    }
}
