//! Appointment and status endpoints.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::backend::{AppointmentDraft, AppointmentPatch, AppointmentRecord};
use crate::http::request::{NodeQuery, PageQuery, WriteBody};
use crate::http::response::{ApiError, READS_UNAVAILABLE, WRITES_UNAVAILABLE};
use crate::http::server::AppState;
use crate::load_balancer::node::NodeId;

#[derive(Serialize)]
pub struct SizeResponse {
    pub size: u64,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub apptid: String,
}

/// Availability of every node, keyed by display name.
pub async fn get_status(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    let table = state.health.snapshot();
    Json(
        table
            .entries()
            .map(|(id, status)| (id.to_string(), status.is_available()))
            .collect(),
    )
}

pub async fn list_appointments(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<AppointmentRecord>>, ApiError> {
    ensure_available(&state, READS_UNAVAILABLE)?;
    let query = from_query(query)?;

    let page_size = query
        .items_per_page
        .unwrap_or(state.reads.default_page_size)
        .min(state.reads.max_page_size);
    if page_size == 0 {
        return Err(ApiError::BadRequest("itemsPerPage must be positive".to_string()));
    }
    let page = query.page.unwrap_or(0);

    let records = state
        .router
        .list_page(page_size, page, query.node.map(NodeId))
        .await?;
    Ok(Json(records))
}

pub async fn appointment_count(
    State(state): State<AppState>,
    query: Result<Query<NodeQuery>, QueryRejection>,
) -> Result<Json<SizeResponse>, ApiError> {
    ensure_available(&state, READS_UNAVAILABLE)?;
    let query = from_query(query)?;

    let size = state.router.size(query.preference()).await?;
    Ok(Json(SizeResponse { size }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(apptid): Path<String>,
    query: Result<Query<NodeQuery>, QueryRejection>,
) -> Result<Json<AppointmentRecord>, ApiError> {
    ensure_available(&state, READS_UNAVAILABLE)?;
    let query = from_query(query)?;

    let record = state.router.get(&apptid, query.preference()).await?;
    Ok(Json(record))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    body: Result<Json<WriteBody<AppointmentDraft>>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    ensure_available(&state, WRITES_UNAVAILABLE)?;
    let body = from_json(body)?;

    let preference = body.preference();
    let apptid = state.router.create(body.data, preference).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { apptid })))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    Path(apptid): Path<String>,
    body: Result<Json<WriteBody<AppointmentPatch>>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    ensure_available(&state, WRITES_UNAVAILABLE)?;
    let body = from_json(body)?;

    let preference = body.preference();
    state.router.update(&apptid, body.data, preference).await?;
    Ok("Appointment updated")
}

/// The node preference may come from the query string or a JSON body.
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(apptid): Path<String>,
    query: Result<Query<NodeQuery>, QueryRejection>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    ensure_available(&state, WRITES_UNAVAILABLE)?;
    let mut preference = from_query(query)?.preference();
    if preference.is_none() && !body.is_empty() {
        let from_body: NodeQuery = serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))?;
        preference = from_body.preference();
    }

    state.router.delete(&apptid, preference).await?;
    Ok("Appointment deleted")
}

fn ensure_available(state: &AppState, message: &'static str) -> Result<(), ApiError> {
    if state.health.snapshot().any_available() {
        Ok(())
    } else {
        Err(ApiError::Unavailable(message))
    }
}

fn from_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn from_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(b)| b)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}
