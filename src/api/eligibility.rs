use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::require_role;
use super::{ApiError, AppState, PatientFormDto};
use crate::db::Role;
use crate::entities::patient_forms;
use crate::model::FEATURE_COUNT;

#[derive(Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub patient: PatientFormDto,
    pub result: String,
}

/// GET /check/{patient_id}
/// Run the classifier over a stored record and persist the resulting
/// label. Admin role required. Re-running overwrites the prior label.
pub async fn check_eligibility(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(patient_id): Path<i32>,
) -> Result<Json<CheckResponse>, ApiError> {
    require_role(&session, Role::Admin, "Unauthorized - Admin access required").await?;

    let form = state
        .store()
        .get_patient_form(patient_id)
        .await
        .map_err(|e| ApiError::DatabaseError(format!("Eligibility check failed: {e}")))?
        .ok_or_else(ApiError::patient_not_found)?;

    let features = feature_vector(&form);
    let prediction = state.model().predict(&features);
    let result = if prediction == 1 { "Accepted" } else { "Rejected" };

    let updated = state
        .store()
        .set_patient_eligibility(patient_id, result)
        .await
        .map_err(|e| ApiError::internal(format!("Eligibility check failed: {e}")))?;

    tracing::info!("Patient {} evaluated: {}", patient_id, result);

    Ok(Json(CheckResponse {
        success: true,
        patient: updated.into(),
        result: result.to_string(),
    }))
}

/// Build the classifier input in the order the model was trained on:
/// [Age, Sex, Weight_kg, Height_cm, BMI, Cohort, ALT, Creatinine, SBP,
/// DBP, HR, Temp_C, AdverseEvent].
fn feature_vector(form: &patient_forms::Model) -> [f64; FEATURE_COUNT] {
    [
        form.age,
        f64::from(form.sex),
        form.weight_kg,
        form.height_cm,
        form.bmi,
        f64::from(form.cohort),
        form.alt,
        form.creatinine,
        f64::from(form.sbp),
        f64::from(form.dbp),
        f64::from(form.hr),
        form.temp_c,
        f64::from(form.adverse_event),
    ]
}
