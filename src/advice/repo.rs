use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::dto::{AdviceRecord, AdviceResult, MealAnalysis};
use crate::error::DiaryResult;

#[async_trait]
pub trait AdviceRepo: Send + Sync {
    async fn save(&self, record: AdviceRecord) -> DiaryResult<()>;
    /// Most recently generated advice.
    async fn last(&self) -> DiaryResult<Option<AdviceRecord>>;
}

#[derive(Debug, FromRow)]
struct AdviceRow {
    id: Uuid,
    date: Date,
    generated_at: OffsetDateTime,
    advice: String,
    meal_analysis: Option<Json<MealAnalysis>>,
}

impl From<AdviceRow> for AdviceRecord {
    fn from(r: AdviceRow) -> Self {
        Self {
            id: r.id,
            date: r.date,
            generated_at: r.generated_at,
            result: AdviceResult {
                advice: r.advice,
                meal_analysis: r.meal_analysis.map(|j| j.0),
            },
        }
    }
}

#[derive(Clone)]
pub struct PgAdviceRepo {
    db: PgPool,
}

impl PgAdviceRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdviceRepo for PgAdviceRepo {
    async fn save(&self, record: AdviceRecord) -> DiaryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO advice_history (id, date, generated_at, advice, meal_analysis)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.date)
        .bind(record.generated_at)
        .bind(&record.result.advice)
        .bind(record.result.meal_analysis.map(Json))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn last(&self) -> DiaryResult<Option<AdviceRecord>> {
        let row = sqlx::query_as::<_, AdviceRow>(
            r#"
            SELECT id, date, generated_at, advice, meal_analysis
              FROM advice_history
             ORDER BY generated_at DESC
             LIMIT 1
            "#,
        )
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(AdviceRecord::from))
    }
}

#[derive(Default)]
pub struct InMemoryAdviceRepo {
    last: RwLock<Option<AdviceRecord>>,
}

#[async_trait]
impl AdviceRepo for InMemoryAdviceRepo {
    async fn save(&self, record: AdviceRecord) -> DiaryResult<()> {
        *self.last.write().await = Some(record);
        Ok(())
    }

    async fn last(&self) -> DiaryResult<Option<AdviceRecord>> {
        Ok(self.last.read().await.clone())
    }
}
