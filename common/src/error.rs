use actix_web::HttpResponse;
use serde_json::{Value, json};
use thiserror::Error;

use crate::razorpay::ProviderError;

pub type Res<T> = std::result::Result<T, AppError>;

/// Shown in `details` when the failure carries no provider error object.
pub const DEFAULT_ERROR_DETAILS: &str = "Please check your input";

#[derive(Error, Debug)]
pub enum AppError {
    // === CONVERSION ERRORS ===
    #[error("JWT error: {0}")]
    JWT(#[from] jsonwebtoken::errors::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === APPLICATION ERRORS ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Parse(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Message safe to hand back to the caller.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Provider(error) => error.message(),
            AppError::JWT(_) | AppError::Reqwest(_) | AppError::Json(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Best available detail: the provider's error object when there is one.
    pub fn details(&self) -> Value {
        match self {
            AppError::Provider(ProviderError {
                details: Some(details),
                ..
            }) => details.clone(),
            _ => Value::String(DEFAULT_ERROR_DETAILS.to_string()),
        }
    }

    pub fn to_http_response(&self) -> HttpResponse {
        match self {
            // === CONVERSION ERRORS ===
            AppError::JWT(error) => {
                log::error!("JWT error: {}", error);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Internal server error" }))
            }
            AppError::Reqwest(error) => {
                log::error!("Reqwest error: {}", error);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Internal server error" }))
            }
            AppError::Json(error) => {
                log::error!("JSON error: {}", error);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Internal server error" }))
            }

            // === APPLICATION ERRORS ===
            AppError::Configuration(error) => {
                log::error!("Configuration error: {}", error);
                HttpResponse::InternalServerError().json(json!({ "error": self.to_string() }))
            }
            AppError::Parse(_) | AppError::Store(_) | AppError::Provider(_) => {
                HttpResponse::InternalServerError().json(json!({ "error": self.user_message() }))
            }
            AppError::Internal(error) => {
                log::error!("Internal error: {}", error);
                HttpResponse::InternalServerError()
                    .json(json!({ "error": "Internal server error" }))
            }
        }
    }

    /// Failure body of the subscription endpoint. Always carries the
    /// affiliate so failed sign-ups can be reconciled.
    pub fn to_failure_response(&self, affiliate_id: &str) -> HttpResponse {
        HttpResponse::InternalServerError().json(json!({
            "error": self.user_message(),
            "details": self.details(),
            "affiliate_id": affiliate_id,
        }))
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.to_http_response()
    }
}
