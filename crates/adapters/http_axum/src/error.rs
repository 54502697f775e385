//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use shems_domain::error::{ShemsError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
}

/// Maps [`ShemsError`] to an HTTP response with appropriate status code.
pub struct ApiError(ShemsError);

impl From<ShemsError> for ApiError {
    fn from(err: ShemsError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ShemsError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ShemsError::Config(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ShemsError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ShemsError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            other => {
                tracing::error!(error = ?other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shems_domain::error::{ConfigError, ConflictError, NotFoundError};

    #[test]
    fn should_map_domain_errors_to_status_codes() {
        let cases = [
            (ShemsError::from(ValidationError::EmptyName), StatusCode::BAD_REQUEST),
            (
                ShemsError::from(ConfigError::UnknownApplianceClass(9)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ShemsError::from(NotFoundError {
                    entity: "Home",
                    id: "1".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ShemsError::from(ConflictError {
                    entity: "Appliance",
                    id: "1/3".to_string(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ShemsError::StoreUnavailable("connection refused".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }
}
