//! Queue endpoints. Clients poll these; nothing is pushed.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DateQuery};
use crate::appointment::parse_department;
use crate::models::{ClinicQueueSummary, QueueState};
use crate::queue::{self, AdvanceOutcome};

/// `GET /api/queue?date=` — whole-clinic counters.
pub async fn summary(
    State(ctx): State<ApiContext>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<ClinicQueueSummary>, ApiError> {
    let date = query?.resolve()?;
    let summary = ctx.run(move |clinic| queue::clinic_summary(clinic, date)).await?;
    Ok(Json(summary))
}

/// `GET /api/queue/:department?date=`
pub async fn snapshot(
    State(ctx): State<ApiContext>,
    Path(department): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<QueueState>, ApiError> {
    let department = parse_department(&department)?;
    let date = query?.resolve()?;
    let state = ctx
        .run(move |clinic| queue::snapshot(clinic, department, date))
        .await?;
    Ok(Json(state))
}

/// `POST /api/queue/:department/advance?date=` — serve the next token.
pub async fn advance(
    State(ctx): State<ApiContext>,
    Path(department): Path<String>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<AdvanceOutcome>, ApiError> {
    let department = parse_department(&department)?;
    let date = query?.resolve()?;
    let outcome = ctx
        .run(move |clinic| queue::advance(clinic, department, date))
        .await?;
    Ok(Json(outcome))
}
