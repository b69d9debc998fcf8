use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Either "patient" or "admin"
    pub role: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::patient_forms::Entity")]
    PatientForms,
}

impl Related<super::patient_forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PatientForms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
