//! Report endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{AppointmentId, Report, ReportFields};
use crate::report::{self, AttachedReport};

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub appointment_id: AppointmentId,
    #[serde(flatten)]
    pub fields: ReportFields,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub attached: AttachedReport,
}

/// `POST /api/doctor/report` — attach a report and complete the appointment.
pub async fn submit(
    State(ctx): State<ApiContext>,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Json(req) = body?;
    let attached = ctx
        .run(move |clinic| report::attach(clinic, req.appointment_id, &req.fields))
        .await?;
    Ok(Json(ReportResponse {
        status: "success",
        attached,
    }))
}

/// `GET /api/report/:id` — the report of an appointment.
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(appointment_id): Path<AppointmentId>,
) -> Result<Json<Report>, ApiError> {
    let report = ctx
        .run(move |clinic| report::get_report(clinic, appointment_id))
        .await?;
    Ok(Json(report))
}
