//! Runtime settings.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Debug, Serialize, Deserialize)]
pub struct WaitTime {
    /// Minutes per consultation used by wait estimates.
    pub minutes: u32,
}

/// `GET /api/settings/wait_time`
pub async fn wait_time(State(ctx): State<ApiContext>) -> Result<Json<WaitTime>, ApiError> {
    let minutes = ctx
        .run(|clinic| clinic.read(|conn| clinic.consult_minutes(conn)))
        .await?;
    Ok(Json(WaitTime { minutes }))
}

/// `PUT /api/settings/wait_time`
pub async fn set_wait_time(
    State(ctx): State<ApiContext>,
    body: Result<Json<WaitTime>, JsonRejection>,
) -> Result<Json<WaitTime>, ApiError> {
    let Json(update) = body?;
    let minutes = update.minutes;
    ctx.run(move |clinic| clinic.set_consult_minutes(minutes)).await?;
    Ok(Json(WaitTime { minutes }))
}
