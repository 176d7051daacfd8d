use serde::Deserialize;

// =============================================================================
// MAKE APPOINTMENT
// =============================================================================

/// Booking request accepted from patients. Booking itself is not handled
/// by this service yet; only the wire shape is defined here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeAppointmentRequest {
    pub appointment_date: String,
    pub recommended_doctor: String,
    #[serde(default)]
    pub tests: Vec<AppointmentTestRequest>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentTestRequest {
    pub test_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}
