use sea_orm::entity::prelude::*;

/// One intake submission. Clinical column names keep their wire
/// capitalization at the API layer; here they are plain snake_case.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "patient_forms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

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

    /// "Accepted" or "Rejected" once evaluated, NULL before.
    pub eligibility: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
