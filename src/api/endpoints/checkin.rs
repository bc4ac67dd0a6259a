//! Check-in endpoints.
//!
//! `POST /api/checkin` takes the scanned text as the raw request body, so a
//! scanning station forwards exactly what the camera decoded.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, MobileQuery};
use crate::checkin::{self, PatientContext};

pub async fn resolve(
    State(ctx): State<ApiContext>,
    body: String,
) -> Result<Json<PatientContext>, ApiError> {
    let context = ctx
        .run(move |clinic| checkin::resolve_raw(clinic, &body))
        .await?;
    Ok(Json(context))
}

/// `GET /api/checkin/qr?mobile=` — the patient's entry pass as SVG.
pub async fn qr(
    State(ctx): State<ApiContext>,
    query: Result<Query<MobileQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(MobileQuery { mobile }) = query?;
    let pass = ctx
        .run(move |clinic| checkin::patient_pass(clinic, &mobile))
        .await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], pass.svg))
}
