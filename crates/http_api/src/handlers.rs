use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use meter_core::Level;
use meter_db::{Db, RecordQuery};

use crate::{errors::HttpError, state::HttpState};

const MAX_LIMIT: u32 = 1000;

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Report of the most recent tick, `null` until the first one finishes.
pub async fn status(State(state): State<HttpState>) -> Result<impl IntoResponse, HttpError> {
    let last = state
        .last_tick
        .read()
        .map_err(|_| HttpError::internal("state lock poisoned"))?
        .clone();
    Ok(Json(last))
}

#[derive(Debug, Deserialize)]
pub struct RecordsParams {
    level: Option<String>,
    namespace: Option<String>,
    start: Option<String>,
    end: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

pub async fn records(
    State(state): State<HttpState>,
    Query(params): Query<RecordsParams>,
) -> Result<impl IntoResponse, HttpError> {
    let level = match params.level.as_deref() {
        None => Level::Raw,
        Some(raw) => Level::parse(raw)
            .ok_or_else(|| HttpError::invalid_input(format!("unknown level: {raw}")))?,
    };
    let query = RecordQuery {
        namespace: params.namespace.as_deref(),
        start: params.start.as_deref(),
        end: params.end.as_deref(),
        limit: params.limit.unwrap_or(100).min(MAX_LIMIT),
        offset: params.offset.unwrap_or(0),
    };

    let db = Db::open(&state.db_path)?;
    let records = db.list_records(level, &query)?;
    Ok(Json(records))
}
