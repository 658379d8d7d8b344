//! Saved-plan persistence. Writes are create-only; every read is scoped to
//! the owning user.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::CompliancePlanRow;
use crate::questionnaire::answers::AnswerSet;

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn create(
        &self,
        owner: Uuid,
        plan_content: &str,
        source_data: &AnswerSet,
    ) -> Result<Uuid, AppError>;

    /// The owner's plans, newest first.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CompliancePlanRow>, AppError>;

    async fn get_for_owner(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<CompliancePlanRow>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn create(
        &self,
        owner: Uuid,
        plan_content: &str,
        source_data: &AnswerSet,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        let source = serde_json::to_value(source_data).map_err(anyhow::Error::from)?;

        sqlx::query(
            r#"
            INSERT INTO compliance_plans (id, user_id, plan_content, source_data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(plan_content)
        .bind(source)
        .execute(&self.pool)
        .await?;

        info!("Saved compliance plan {id} for user {owner}");
        Ok(id)
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CompliancePlanRow>, AppError> {
        Ok(sqlx::query_as::<_, CompliancePlanRow>(
            "SELECT * FROM compliance_plans WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_for_owner(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<CompliancePlanRow>, AppError> {
        Ok(sqlx::query_as::<_, CompliancePlanRow>(
            "SELECT * FROM compliance_plans WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
