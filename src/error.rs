use poem::{error::ResponseError, http::StatusCode, Body, Response};
use sea_orm::DbErr;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Domain error taxonomy. Every variant maps to an HTTP status and a JSON
/// body of the form `{"error": "..."}`; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("registration is disabled")]
    RegistrationDisabled,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Internal(&'static str),
    #[error("database error")]
    Database(#[from] DbErr),
}

impl ResponseError for Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthenticated(_) | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) | Error::RegistrationDisabled => StatusCode::FORBIDDEN,
            Error::Internal(_) | Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        if let Error::Database(err) = self {
            // Storage detail goes to the log, not the client.
            tracing::error!(error = %err, "storage failure");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        Response::builder()
            .status(self.status())
            .content_type("application/json; charset=utf-8")
            .body(Body::from_json(&body).unwrap_or_else(|_| Body::from_string(self.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(Error::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(Error::NotFound("post").status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::RegistrationDisabled.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn credential_failures_are_indistinguishable() {
        // Unknown email and wrong digest must produce the same response.
        assert_eq!(
            Error::InvalidCredentials.to_string(),
            Error::InvalidCredentials.to_string()
        );
        assert_eq!(Error::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }
}
