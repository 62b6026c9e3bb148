use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::usecases::{bookings::BookingError, catalog::CatalogError, payments::PaymentError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    let body = Json(ErrorResponse {
        code: status.as_u16(),
        message,
    });

    (status, body).into_response()
}

// Don't leak internal error detail to client
fn public_message(status: StatusCode, message: String) -> String {
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        message
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error_response(status, public_message(status, self.to_string()))
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error_response(status, public_message(status, self.to_string()))
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            PaymentError::Gateway(_) => "Payment provider unavailable, try again later".to_string(),
            _ => self.to_string(),
        };
        error_response(status, public_message(status, message))
    }
}
