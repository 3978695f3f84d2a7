use std::time::Duration;

use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::db::ConnectError;
use crate::errors::ErrorCode;
use crate::trace_ctx;

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {detail}")]
    BadRequest { detail: String },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Database unavailable: {detail}")]
    DbUnavailable { detail: String, retry_after: Duration },
    #[error("Database connection in progress")]
    DbConnecting { retry_after: Duration },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::BadRequest { .. } => ErrorCode::BadRequest,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::DbUnavailable { .. } => ErrorCode::DbUnavailable,
            AppError::DbConnecting { .. } => ErrorCode::DbConnecting,
            AppError::Internal { .. } => ErrorCode::Internal,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::BadRequest { detail } => detail.clone(),
            AppError::NotFound { detail } => detail.clone(),
            AppError::DbUnavailable { detail, .. } => detail.clone(),
            AppError::DbConnecting { .. } => {
                "Database connection is being established; retry shortly".to_string()
            }
            AppError::Internal { detail } => detail.clone(),
            AppError::Config { detail } => detail.clone(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DbUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DbConnecting { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Seconds a client should wait before retrying, for retryable errors.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AppError::DbUnavailable { retry_after, .. }
            | AppError::DbConnecting { retry_after } => Some(whole_seconds(*retry_after)),
            _ => None,
        }
    }

    pub fn bad_request(detail: String) -> Self {
        Self::BadRequest { detail }
    }

    pub fn not_found(detail: String) -> Self {
        Self::NotFound { detail }
    }

    pub fn db_unavailable(detail: String, retry_after: Duration) -> Self {
        Self::DbUnavailable {
            detail,
            retry_after,
        }
    }

    pub fn db_connecting(retry_after: Duration) -> Self {
        Self::DbConnecting { retry_after }
    }

    pub fn internal(detail: String) -> Self {
        Self::Internal { detail }
    }

    pub fn config(detail: String) -> Self {
        Self::Config { detail }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Rounds up to whole seconds, never below one.
fn whole_seconds(d: Duration) -> u64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    secs.max(1)
}

impl From<ConnectError> for AppError {
    fn from(e: ConnectError) -> Self {
        match e {
            ConnectError::Unavailable {
                detail,
                retry_after,
            } => AppError::db_unavailable(detail, retry_after),
            other => AppError::db_unavailable(other.to_string(), Duration::from_secs(1)),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code().as_str();
        let trace_id = trace_ctx::trace_id();

        let problem_details = ProblemDetails {
            type_: format!("https://astrotalk.app/errors/{code}"),
            title: Self::humanize_code(code),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
            trace_id: trace_id.clone(),
        };

        let mut builder = HttpResponse::build(status);
        builder
            .content_type("application/problem+json")
            .insert_header(("x-trace-id", trace_id));
        if let Some(secs) = self.retry_after_secs() {
            builder.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        builder.json(problem_details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_code() {
        assert_eq!(AppError::humanize_code("DB_UNAVAILABLE"), "Db Unavailable");
        assert_eq!(AppError::humanize_code("BAD_REQUEST"), "Bad Request");
    }

    #[test]
    fn test_db_errors_are_service_unavailable() {
        let unavailable = AppError::db_unavailable("down".to_string(), Duration::from_secs(3));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.retry_after_secs(), Some(3));

        let connecting = AppError::db_connecting(Duration::from_millis(200));
        assert_eq!(connecting.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(connecting.retry_after_secs(), Some(1));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_secs(4)), 4);
        assert_eq!(whole_seconds(Duration::ZERO), 1);
    }

    #[test]
    fn test_connect_error_maps_to_db_unavailable() {
        let err: AppError = ConnectError::Unavailable {
            detail: "handshake failed: auth".to_string(),
            retry_after: Duration::from_secs(5),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::DbUnavailable);
        assert_eq!(err.retry_after_secs(), Some(5));

        let err: AppError = ConnectError::Timeout(Duration::from_secs(10)).into();
        assert_eq!(err.code(), ErrorCode::DbUnavailable);
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_error_response_sets_retry_after_header() {
        let resp = AppError::db_connecting(Duration::from_secs(1)).error_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_error_response_without_retry_after() {
        let resp = AppError::bad_request("nope".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::RETRY_AFTER).is_none());
    }
}
