use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_role;
use super::validation::{JsonOrForm, lenient_f64, lenient_i32};
use super::{ApiError, AppState, PatientFormDto, StatusMessage};
use crate::db::{NewPatientForm, Role};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Typed intake record. Every clinical field is required; values may
/// arrive as numbers or numeric strings depending on the body encoding.
#[derive(Debug, Deserialize)]
pub struct PatientFormRequest {
    #[serde(rename = "Age", deserialize_with = "lenient_f64")]
    pub age: f64,
    #[serde(rename = "Sex", deserialize_with = "lenient_i32")]
    pub sex: i32,
    #[serde(rename = "Weight_kg", deserialize_with = "lenient_f64")]
    pub weight_kg: f64,
    #[serde(rename = "Height_cm", deserialize_with = "lenient_f64")]
    pub height_cm: f64,
    #[serde(rename = "BMI", deserialize_with = "lenient_f64")]
    pub bmi: f64,
    #[serde(rename = "Cohort", deserialize_with = "lenient_i32")]
    pub cohort: i32,
    #[serde(rename = "ALT", deserialize_with = "lenient_f64")]
    pub alt: f64,
    #[serde(rename = "Creatinine", deserialize_with = "lenient_f64")]
    pub creatinine: f64,
    #[serde(rename = "SBP", deserialize_with = "lenient_i32")]
    pub sbp: i32,
    #[serde(rename = "DBP", deserialize_with = "lenient_i32")]
    pub dbp: i32,
    #[serde(rename = "HR", deserialize_with = "lenient_i32")]
    pub hr: i32,
    #[serde(rename = "Temp_C", deserialize_with = "lenient_f64")]
    pub temp_c: f64,
    #[serde(rename = "AdverseEvent", deserialize_with = "lenient_i32")]
    pub adverse_event: i32,
}

impl From<PatientFormRequest> for NewPatientForm {
    fn from(req: PatientFormRequest) -> Self {
        Self {
            age: req.age,
            sex: req.sex,
            weight_kg: req.weight_kg,
            height_cm: req.height_cm,
            bmi: req.bmi,
            cohort: req.cohort,
            alt: req.alt,
            creatinine: req.creatinine,
            sbp: req.sbp,
            dbp: req.dbp,
            hr: req.hr,
            temp_c: req.temp_c,
            adverse_event: req.adverse_event,
        }
    }
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub patients: Vec<PatientFormDto>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /patient_form
/// Persist one intake submission owned by the session user, eligibility
/// left unset. Patient role required.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    JsonOrForm(payload): JsonOrForm<PatientFormRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    let user = require_role(
        &session,
        Role::Patient,
        "Unauthorized - Patient access required",
    )
    .await?;

    let form = NewPatientForm::from(payload);

    let saved = state
        .store()
        .insert_patient_form(user.id, &form)
        .await
        .map_err(|e| ApiError::internal(format!("Submission failed: {e}")))?;

    tracing::info!("Patient form {} submitted by '{}'", saved.id, user.username);

    Ok(Json(StatusMessage::ok("Form submitted successfully!")))
}

/// GET /admin_dashboard
/// All stored intake forms, newest first. Admin role required.
pub async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<DashboardResponse>, ApiError> {
    require_role(&session, Role::Admin, "Unauthorized - Admin access required").await?;

    let patients = state
        .store()
        .list_patient_forms()
        .await
        .map_err(|e| ApiError::DatabaseError(format!("Failed to fetch patients: {e}")))?
        .into_iter()
        .map(PatientFormDto::from)
        .collect();

    Ok(Json(DashboardResponse {
        success: true,
        patients,
    }))
}
