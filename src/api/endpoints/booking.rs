//! Booking endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment;
use crate::models::{Appointment, BookingRequest, DoctorAvailability, QueueState};

#[derive(Serialize)]
pub struct BookingResponse {
    pub status: &'static str,
    pub appointment_id: i64,
    pub token: u32,
    /// `true` when an existing scheduled booking was returned unchanged.
    pub idempotent: bool,
    pub appointment: Appointment,
    pub queue: QueueState,
    pub availability: Vec<DoctorAvailability>,
}

/// `POST /api/book` — book an appointment, or return the live one for the
/// same patient, department and date.
pub async fn book(
    State(ctx): State<ApiContext>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let Json(req) = body?;
    let receipt = ctx.run(move |clinic| appointment::create(clinic, &req)).await?;

    let idempotent = receipt.outcome.is_idempotent();
    let status = if idempotent {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let appointment = receipt.outcome.into_appointment();

    Ok((
        status,
        Json(BookingResponse {
            status: "success",
            appointment_id: appointment.id,
            token: appointment.queue_token,
            idempotent,
            appointment,
            queue: receipt.queue,
            availability: receipt.availability,
        }),
    ))
}
