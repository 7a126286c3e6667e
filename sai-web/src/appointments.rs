//! Appointment queue: model, validation and in-memory store

use crate::error::FieldError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 100;

/// Position of an appointment in the service flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Waiting,
    InService,
    Completed,
    Cancelled,
}

/// A registered appointment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    #[schema(example = "Maria da Silva")]
    pub requester_name: String,
    /// Eleven digits, no punctuation
    #[schema(example = "52998224725")]
    pub cpf: String,
    pub rg: Option<String>,
    #[schema(example = "Segunda via de documento")]
    pub service_type: String,
    pub arrived_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

/// Appointment creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    #[schema(example = "Maria da Silva")]
    pub requester_name: String,
    #[schema(example = "529.982.247-25")]
    pub cpf: String,
    pub rg: Option<String>,
    #[schema(example = "Segunda via de documento")]
    pub service_type: String,
}

/// Status update request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Validated, normalized appointment data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub requester_name: String,
    pub cpf: String,
    pub rg: Option<String>,
    pub service_type: String,
}

impl CreateAppointmentRequest {
    /// Validate and normalize; all failing fields are reported together
    pub fn validate(self) -> Result<NewAppointment, Vec<FieldError>> {
        let mut errors = Vec::new();

        let requester_name = self.requester_name.trim().to_string();
        let name_len = requester_name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_len) {
            errors.push(FieldError::new(
                "requester_name",
                "requester name must have between 3 and 100 characters",
            ));
        }

        let cpf = normalize_cpf(&self.cpf);
        if !is_valid_cpf(&cpf) {
            errors.push(FieldError::new("cpf", "invalid CPF"));
        }

        let service_type = self.service_type.trim().to_string();
        if service_type.is_empty() {
            errors.push(FieldError::new("service_type", "service type is required"));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let rg = self
            .rg
            .map(|rg| rg.trim().to_string())
            .filter(|rg| !rg.is_empty());

        Ok(NewAppointment {
            requester_name,
            cpf,
            rg,
            service_type,
        })
    }
}

/// Strip the usual `.` and `-` punctuation from a CPF
pub fn normalize_cpf(cpf: &str) -> String {
    cpf.trim().chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Check an already-normalized CPF: 11 digits, not all equal, both check
/// digits correct
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = match cpf.chars().map(|c| c.to_digit(10)).collect() {
        Some(digits) => digits,
        None => return false,
    };

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}

/// In-memory appointment store; insertion order is arrival order
#[derive(Debug, Clone, Default)]
pub struct AppointmentStore {
    appointments: Arc<RwLock<Vec<Appointment>>>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new appointment in `WAITING` state
    pub async fn create(&self, data: NewAppointment) -> Appointment {
        let mut appointments = self.appointments.write().await;

        // Stamped under the write lock so arrival times follow list order.
        let appointment = Appointment {
            id: Uuid::new_v4(),
            requester_name: data.requester_name,
            cpf: data.cpf,
            rg: data.rg,
            service_type: data.service_type,
            arrived_at: Utc::now(),
            status: AppointmentStatus::Waiting,
        };
        appointments.push(appointment.clone());

        info!("Appointment {} registered", appointment.id);
        appointment
    }

    /// All appointments in arrival order
    pub async fn list(&self) -> Vec<Appointment> {
        self.appointments.read().await.clone()
    }

    /// Set the status; `None` when the id is unknown
    pub async fn update_status(&self, id: Uuid, status: AppointmentStatus) -> Option<Appointment> {
        let mut appointments = self.appointments.write().await;
        let appointment = appointments.iter_mut().find(|a| a.id == id)?;
        appointment.status = status;
        info!("Appointment {} moved to {:?}", id, status);
        Some(appointment.clone())
    }
}
