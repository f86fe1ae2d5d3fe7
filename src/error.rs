use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Invalid value {value:?} for field {field}")]
    InvalidValue { field: &'static str, value: String },
    #[error("Booking could not be emitted: {0}")]
    Emission(String),
    #[error("Time format problem: {0}")]
    TimeError(#[from] time::error::Format),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::UnknownField(_) | Error::InvalidValue { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, format!("Error: {}", self)).into_response()
    }
}
