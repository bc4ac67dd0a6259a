//! Doctor roster and operator override.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DateQuery};
use crate::availability;
use crate::models::{Doctor, DoctorStatus, DoctorView};

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorView>,
}

/// `GET /api/doctors?date=` — roster with derived status and queue counters.
pub async fn list(
    State(ctx): State<ApiContext>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let date = query?.resolve()?;
    let doctors = ctx
        .run(move |clinic| availability::doctor_views(clinic, date))
        .await?;
    Ok(Json(DoctorsResponse { doctors }))
}

/// Body of `PUT /api/doctors/:id/status`.
///
/// Only `Off` is an override; `Available` or `Busy` clears it and lets the
/// queue decide.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: DoctorStatus,
}

pub async fn set_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Doctor>, ApiError> {
    let Json(update) = body?;
    let off_duty = update.status == DoctorStatus::Off;
    let doctor = ctx
        .run(move |clinic| availability::set_off_duty(clinic, id, off_duty))
        .await?;
    Ok(Json(doctor))
}
