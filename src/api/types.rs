use serde::Serialize;

use crate::db::{Role, User};
use crate::entities::patient_forms;

/// Body shape shared by acknowledgments and every error response.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub success: bool,
    pub message: String,
}

impl StatusMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Public identity of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Wire representation of a stored intake form. Clinical fields keep the
/// capitalization the classifier was trained against.
#[derive(Debug, Serialize)]
pub struct PatientFormDto {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Sex")]
    pub sex: i32,
    #[serde(rename = "Weight_kg")]
    pub weight_kg: f64,
    #[serde(rename = "Height_cm")]
    pub height_cm: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "Cohort")]
    pub cohort: i32,
    #[serde(rename = "ALT")]
    pub alt: f64,
    #[serde(rename = "Creatinine")]
    pub creatinine: f64,
    #[serde(rename = "SBP")]
    pub sbp: i32,
    #[serde(rename = "DBP")]
    pub dbp: i32,
    #[serde(rename = "HR")]
    pub hr: i32,
    #[serde(rename = "Temp_C")]
    pub temp_c: f64,
    #[serde(rename = "AdverseEvent")]
    pub adverse_event: i32,
    pub eligibility: Option<String>,
    pub created_at: String,
}

impl From<patient_forms::Model> for PatientFormDto {
    fn from(model: patient_forms::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            age: model.age,
            sex: model.sex,
            weight_kg: model.weight_kg,
            height_cm: model.height_cm,
            bmi: model.bmi,
            cohort: model.cohort,
            alt: model.alt,
            creatinine: model.creatinine,
            sbp: model.sbp,
            dbp: model.dbp,
            hr: model.hr,
            temp_c: model.temp_c,
            adverse_event: model.adverse_event,
            eligibility: model.eligibility,
            created_at: model.created_at,
        }
    }
}
