use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

use crate::entities::patient_forms;

/// Field values for a new intake submission, already coerced to their
/// declared types by the API layer.
#[derive(Debug, Clone)]
pub struct NewPatientForm {
    pub age: f64,
    pub sex: i32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub cohort: i32,
    pub alt: f64,
    pub creatinine: f64,
    pub sbp: i32,
    pub dbp: i32,
    pub hr: i32,
    pub temp_c: f64,
    pub adverse_event: i32,
}

pub struct PatientFormRepository {
    conn: DatabaseConnection,
}

impl PatientFormRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert one submission owned by `user_id`, eligibility unset.
    pub async fn insert(&self, user_id: i32, form: &NewPatientForm) -> Result<patient_forms::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = patient_forms::ActiveModel {
            user_id: Set(user_id),
            age: Set(form.age),
            sex: Set(form.sex),
            weight_kg: Set(form.weight_kg),
            height_cm: Set(form.height_cm),
            bmi: Set(form.bmi),
            cohort: Set(form.cohort),
            alt: Set(form.alt),
            creatinine: Set(form.creatinine),
            sbp: Set(form.sbp),
            dbp: Set(form.dbp),
            hr: Set(form.hr),
            temp_c: Set(form.temp_c),
            adverse_event: Set(form.adverse_event),
            eligibility: Set(None),
            created_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert patient form")
    }

    /// Get one submission by id
    pub async fn get(&self, id: i32) -> Result<Option<patient_forms::Model>> {
        patient_forms::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query patient form")
    }

    /// All submissions, most recently created first.
    pub async fn list_all(&self) -> Result<Vec<patient_forms::Model>> {
        patient_forms::Entity::find()
            .order_by_desc(patient_forms::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list patient forms")
    }

    /// Persist an eligibility label, overwriting any prior value, and
    /// return the updated row.
    pub async fn set_eligibility(&self, id: i32, label: &str) -> Result<patient_forms::Model> {
        let form = patient_forms::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query patient form for eligibility update")?
            .ok_or_else(|| anyhow::anyhow!("Patient form not found: {id}"))?;

        let mut active: patient_forms::ActiveModel = form.into();
        active.eligibility = Set(Some(label.to_string()));

        active
            .update(&self.conn)
            .await
            .context("Failed to update eligibility")
    }
}
