//! Appointment handlers

use crate::{
    appointments::{Appointment, CreateAppointmentRequest, UpdateStatusRequest},
    auth::{RequireCreateAppointments, RequireUpdateAppointmentStatus, RequireViewAppointments},
    error::ApiError,
    extractors::{extract_json, extract_path},
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};
use tracing::info;
use uuid::Uuid;

/// List appointments in arrival order
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    tag = "Appointments",
    responses(
        (status = 200, description = "Appointments in arrival order", body = Vec<Appointment>),
        (status = 401, description = "No valid bearer token", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing permission", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    _user: RequireViewAppointments,
) -> Json<Vec<Appointment>> {
    Json(state.appointments.list().await)
}

/// Register an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment registered", body = Appointment),
        (status = 400, description = "Invalid data", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid bearer token", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing permission", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    RequireCreateAppointments(user): RequireCreateAppointments,
    body: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let data = extract_json(body)?
        .validate()
        .map_err(ApiError::Validation)?;
    let appointment = state.appointments.create(data).await;

    info!("User '{}' registered appointment {}", user.login, appointment.id);
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Change an appointment's status
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/status",
    tag = "Appointments",
    params(("id" = Uuid, Path, description = "Appointment id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Appointment),
        (status = 400, description = "Malformed id or body", body = crate::error::ErrorResponse),
        (status = 401, description = "No valid bearer token", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown appointment", body = crate::error::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    RequireUpdateAppointmentStatus(user): RequireUpdateAppointmentStatus,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Appointment>, ApiError> {
    let id = extract_path(id, "id")?;
    let request = extract_json(body)?;

    let appointment = state
        .appointments
        .update_status(id, request.status)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Appointment {}", id)))?;

    info!(
        "User '{}' set appointment {} to {:?}",
        user.login, id, appointment.status
    );
    Ok(Json(appointment))
}
