use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::patient_forms;

pub mod migrator;
pub mod repositories;

pub use repositories::patient_form::NewPatientForm;
pub use repositories::user::{Role, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn patient_form_repo(&self) -> repositories::patient_form::PatientFormRepository {
        repositories::patient_form::PatientFormRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        self.user_repo().create(username, password, role).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    /// Seed the admin account from validated configuration if it does not
    /// exist yet. Idempotent across restarts.
    pub async fn ensure_admin_user(&self, username: &str, password: &str) -> Result<()> {
        if self.get_user_by_username(username).await?.is_some() {
            return Ok(());
        }

        self.create_user(username, password, Role::Admin).await?;
        info!("Seeded admin account '{}'", username);
        Ok(())
    }

    // ========== Patient Form Repository Methods ==========

    pub async fn insert_patient_form(
        &self,
        user_id: i32,
        form: &NewPatientForm,
    ) -> Result<patient_forms::Model> {
        self.patient_form_repo().insert(user_id, form).await
    }

    pub async fn get_patient_form(&self, id: i32) -> Result<Option<patient_forms::Model>> {
        self.patient_form_repo().get(id).await
    }

    pub async fn list_patient_forms(&self) -> Result<Vec<patient_forms::Model>> {
        self.patient_form_repo().list_all().await
    }

    pub async fn set_patient_eligibility(
        &self,
        id: i32,
        label: &str,
    ) -> Result<patient_forms::Model> {
        self.patient_form_repo().set_eligibility(id, label).await
    }
}
