//! Appointment lookup and cancellation endpoints.
//!
//! - `GET /api/appointments?mobile=` — patient history, newest first
//! - `GET /api/appointments/:id`
//! - `POST /api/appointments/:id/cancel`
//! - `GET /api/doctor/appointments` — every appointment (doctor desk)
//! - `GET /api/doctor/patient_history/:mobile` — history with report summaries

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, MobileQuery};
use crate::appointment::{self, TransitionOutcome};
use crate::models::{Appointment, AppointmentId, PatientHistoryEntry};

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

pub async fn by_mobile(
    State(ctx): State<ApiContext>,
    query: Result<Query<MobileQuery>, QueryRejection>,
) -> Result<Json<AppointmentsResponse>, ApiError> {
    let Query(MobileQuery { mobile }) = query?;
    if !appointment::is_valid_mobile(mobile.trim()) {
        return Err(ApiError::BadRequest("mobile must be exactly 10 digits".into()));
    }
    let appointments = ctx
        .run(move |clinic| appointment::get_by_mobile(clinic, &mobile))
        .await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    let apt = ctx.run(move |clinic| appointment::get(clinic, id)).await?;
    Ok(Json(apt))
}

pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(id): Path<AppointmentId>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let outcome = ctx.run(move |clinic| appointment::cancel(clinic, id)).await?;
    Ok(Json(outcome))
}

pub async fn list_all(State(ctx): State<ApiContext>) -> Result<Json<AppointmentsResponse>, ApiError> {
    let appointments = ctx.run(appointment::list_all).await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub mobile: String,
    pub history: Vec<PatientHistoryEntry>,
}

pub async fn patient_history(
    State(ctx): State<ApiContext>,
    Path(mobile): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let lookup = mobile.clone();
    let history = ctx
        .run(move |clinic| appointment::patient_history(clinic, &lookup))
        .await?;
    Ok(Json(HistoryResponse { mobile, history }))
}
