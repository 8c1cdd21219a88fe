//! services/api/src/error.rs
//!
//! Startup failures of the `api` binary. Request handlers never see these;
//! they answer with `(StatusCode, String)` instead.

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pool creation or migrations.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Binding or serving the listener.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid CORS origin '{origin}': {reason}")]
    CorsOrigin { origin: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_failures_keep_the_variable_name() {
        let err: ApiError = ConfigError::MissingVar("DATABASE_URL".into()).into();
        assert!(matches!(err, ApiError::Config(_)));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn cors_origin_error_names_the_origin() {
        let err = ApiError::CorsOrigin {
            origin: "not a header\n".into(),
            reason: "invalid header value".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid CORS origin 'not a header\n': invalid header value"
        );
    }
}
