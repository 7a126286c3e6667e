//! OpenAPI specification for the SAI web server

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    appointments::{Appointment, AppointmentStatus, CreateAppointmentRequest, UpdateStatusRequest},
    auth::{
        handlers::CurrentUserResponse,
        users::{LoginRequest, LoginResponse, RegisterRequest, Role, UserInfo},
        Capability,
    },
    error::{ErrorResponse, FieldError},
    handlers::HealthResponse,
};

/// Main OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SAI Web API",
        version = "0.1.0",
        description = "Appointment scheduling service with bearer-token authentication",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Health endpoints
        crate::handlers::health_check,

        // Authentication
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::me,

        // Appointments
        crate::handlers::list_appointments,
        crate::handlers::create_appointment,
        crate::handlers::update_appointment_status,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponse,
            RegisterRequest,
            UserInfo,
            Role,
            Capability,
            CurrentUserResponse,
            Appointment,
            AppointmentStatus,
            CreateAppointmentRequest,
            UpdateStatusRequest,
            ErrorResponse,
            FieldError,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Authentication", description = "Login, registration and current identity"),
        (name = "Appointments", description = "Appointment queue operations"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security configuration for the API
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

/// Get the OpenAPI specification as YAML
pub fn get_openapi_yaml() -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&ApiDoc::openapi())
}
