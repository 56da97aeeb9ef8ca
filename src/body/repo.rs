use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;

use super::repo_types::BodyRecord;
use crate::error::DiaryResult;
use crate::memory::Table;

#[async_trait]
pub trait BodyRepo: Send + Sync {
    async fn append(&self, record: BodyRecord) -> DiaryResult<BodyRecord>;
    /// Most recent entry for `date`, if any.
    async fn latest_for_date(&self, date: Date) -> DiaryResult<Option<BodyRecord>>;
    /// Every entry for `date`, newest first.
    async fn history_for_date(&self, date: Date) -> DiaryResult<Vec<BodyRecord>>;
}

#[derive(Clone)]
pub struct PgBodyRepo {
    db: PgPool,
}

impl PgBodyRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BodyRepo for PgBodyRepo {
    async fn append(&self, r: BodyRecord) -> DiaryResult<BodyRecord> {
        let row = sqlx::query_as::<_, BodyRecord>(
            r#"
            INSERT INTO body_records (id, date, recorded_at, weight_kg, body_fat_percentage)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, date, recorded_at, weight_kg, body_fat_percentage
            "#,
        )
        .bind(r.id)
        .bind(r.date)
        .bind(r.recorded_at)
        .bind(r.weight_kg)
        .bind(r.body_fat_percentage)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn latest_for_date(&self, date: Date) -> DiaryResult<Option<BodyRecord>> {
        let row = sqlx::query_as::<_, BodyRecord>(
            r#"
            SELECT id, date, recorded_at, weight_kg, body_fat_percentage
              FROM body_records
             WHERE date = $1
             ORDER BY recorded_at DESC
             LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn history_for_date(&self, date: Date) -> DiaryResult<Vec<BodyRecord>> {
        let rows = sqlx::query_as::<_, BodyRecord>(
            r#"
            SELECT id, date, recorded_at, weight_kg, body_fat_percentage
              FROM body_records
             WHERE date = $1
             ORDER BY recorded_at DESC
            "#,
        )
        .bind(date)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryBodyRepo {
    table: Table<BodyRecord>,
}

#[async_trait]
impl BodyRepo for InMemoryBodyRepo {
    async fn append(&self, record: BodyRecord) -> DiaryResult<BodyRecord> {
        Ok(self.table.insert(record).await)
    }

    async fn latest_for_date(&self, date: Date) -> DiaryResult<Option<BodyRecord>> {
        Ok(self.history_for_date(date).await?.into_iter().next())
    }

    async fn history_for_date(&self, date: Date) -> DiaryResult<Vec<BodyRecord>> {
        let mut rows = self.table.filter(|b| b.date == date).await;
        rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod body_repo_tests {
    use super::*;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    fn entry(weight: f64, at: time::OffsetDateTime) -> BodyRecord {
        BodyRecord {
            id: Uuid::new_v4(),
            date: date!(2024 - 04 - 26),
            recorded_at: at,
            weight_kg: weight,
            body_fat_percentage: Some(20.0),
        }
    }

    #[tokio::test]
    async fn latest_entry_wins_regardless_of_insert_order() {
        let repo = InMemoryBodyRepo::default();
        repo.append(entry(62.0, datetime!(2024-04-26 21:00 UTC))).await.unwrap();
        repo.append(entry(62.8, datetime!(2024-04-26 07:00 UTC))).await.unwrap();

        let latest = repo.latest_for_date(date!(2024 - 04 - 26)).await.unwrap().unwrap();
        assert_eq!(latest.weight_kg, 62.0);
        assert_eq!(repo.history_for_date(date!(2024 - 04 - 26)).await.unwrap().len(), 2);
        assert!(repo.latest_for_date(date!(2024 - 04 - 27)).await.unwrap().is_none());
    }
}
