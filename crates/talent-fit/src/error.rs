use crate::config::ConfigError;
use crate::staffing::matching::MatchError;
use crate::staffing::repository::RepositoryError;
use crate::staffing::services::StaffingServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Database(sqlx::Error),
    Match(MatchError),
    Staffing(StaffingServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Server(err) => write!(f, "server error: {err}"),
            AppError::Database(err) => write!(f, "database error: {err}"),
            AppError::Match(err) => write!(f, "match error: {err}"),
            AppError::Staffing(err) => write!(f, "staffing error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::Match(err) => Some(err),
            AppError::Staffing(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Match(err) => err.status_code(),
            AppError::Staffing(StaffingServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Staffing(StaffingServiceError::Repository(RepositoryError::Conflict)) => {
                StatusCode::CONFLICT
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Database(_)
            | AppError::Staffing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value)
    }
}

impl From<MatchError> for AppError {
    fn from(value: MatchError) -> Self {
        Self::Match(value)
    }
}

impl From<StaffingServiceError> for AppError {
    fn from(value: StaffingServiceError) -> Self {
        Self::Staffing(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_errors_keep_their_status() {
        let response = AppError::Match(MatchError::InvalidProjectId("abc".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn config_errors_are_internal() {
        let response = AppError::Config(ConfigError::InvalidPort).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn staffing_errors_map_missing_records_to_not_found() {
        let missing = AppError::from(StaffingServiceError::Repository(RepositoryError::NotFound));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let duplicate = AppError::from(StaffingServiceError::Repository(RepositoryError::Conflict));
        assert_eq!(duplicate.into_response().status(), StatusCode::CONFLICT);

        let down = AppError::from(StaffingServiceError::Repository(RepositoryError::Unavailable(
            "pool closed".to_string(),
        )));
        assert_eq!(down.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
