use std::{env, sync::Arc};

/// Plan billed when a request does not name one.
pub const DEFAULT_PLAN_ID: &str = "plan_R0lfqw7y18smql";
/// Value written into the `created_via` subscription note.
pub const DEFAULT_SUBSCRIPTION_SOURCE: &str = "TraderLog Web";
pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_FIRESTORE_API_URL: &str = "https://firestore.googleapis.com";

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// Holds the server parameters plus the credentials of the two external
/// services the subscription endpoint talks to: the Razorpay key pair and
/// the Firebase service account used for the Firestore user lookup.
///
/// Credentials are kept as `Option`s. A missing credential is not fatal at
/// load time; it is reported when the services are initialized and every
/// request afterwards answers with a configuration error.
pub struct Config {
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Optional file the logger mirrors its output into.
    pub log_file: Option<String>,
    /// Razorpay API key id
    pub razorpay_key_id: Option<String>,
    /// Razorpay API key secret
    pub razorpay_key_secret: Option<String>,
    pub razorpay_api_url: String,
    /// Firebase service account, raw JSON or base64 encoded JSON
    pub firebase_service_account: Option<String>,
    pub firestore_api_url: String,
    // host:port of a local Firestore emulator, skips token exchange
    pub firestore_emulator_host: Option<String>,
    /// Whether the subscription pipeline resolves a firebase uid from the email.
    pub user_lookup_enabled: bool,
    pub default_plan_id: String,
    pub subscription_source: String,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Credentials (checked during service initialization):
    /// - `RAZORPAY_KEY_ID`, `RAZORPAY_SECRET`: Razorpay key pair
    /// - `FIREBASE_SERVICE_ACCOUNT`: service account JSON (needed while the user lookup is enabled)
    ///
    /// Optional (with defaults):
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8080)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "*")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: File to mirror log output into (default: none)
    /// - `RAZORPAY_API_URL`, `FIRESTORE_API_URL`: API base URLs
    /// - `FIRESTORE_EMULATOR_HOST`: Firestore emulator address (default: none)
    /// - `USER_LOOKUP_ENABLED`: Resolve firebase uid by email (default: true)
    /// - `DEFAULT_PLAN_ID`: Plan used when the request omits one
    /// - `SUBSCRIPTION_SOURCE`: Value of the `created_via` note
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "*".to_string()),
            console_logging_enabled: flag("ENABLE_CONSOLE_LOGGING", true),
            log_file: non_empty("LOG_FILE"),
            razorpay_key_id: non_empty("RAZORPAY_KEY_ID"),
            razorpay_key_secret: non_empty("RAZORPAY_SECRET"),
            razorpay_api_url: env::var("RAZORPAY_API_URL")
                .unwrap_or_else(|_| DEFAULT_RAZORPAY_API_URL.to_string()),
            firebase_service_account: non_empty("FIREBASE_SERVICE_ACCOUNT"),
            firestore_api_url: env::var("FIRESTORE_API_URL")
                .unwrap_or_else(|_| DEFAULT_FIRESTORE_API_URL.to_string()),
            firestore_emulator_host: non_empty("FIRESTORE_EMULATOR_HOST"),
            user_lookup_enabled: flag("USER_LOOKUP_ENABLED", true),
            default_plan_id: env::var("DEFAULT_PLAN_ID")
                .unwrap_or_else(|_| DEFAULT_PLAN_ID.to_string()),
            subscription_source: env::var("SUBSCRIPTION_SOURCE")
                .unwrap_or_else(|_| DEFAULT_SUBSCRIPTION_SOURCE.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            num_workers: 4,
            cors_allowed_origin: "*".to_string(),
            console_logging_enabled: true,
            log_file: None,
            razorpay_key_id: None,
            razorpay_key_secret: None,
            razorpay_api_url: DEFAULT_RAZORPAY_API_URL.to_string(),
            firebase_service_account: None,
            firestore_api_url: DEFAULT_FIRESTORE_API_URL.to_string(),
            firestore_emulator_host: None,
            user_lookup_enabled: true,
            default_plan_id: DEFAULT_PLAN_ID.to_string(),
            subscription_source: DEFAULT_SUBSCRIPTION_SOURCE.to_string(),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => v.trim().to_lowercase() == "true",
        Err(_) => default,
    }
}
