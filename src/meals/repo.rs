use async_trait::async_trait;
use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::repo_types::{MealRecord, MealRow, NewMeal};
use crate::error::{DiaryError, DiaryResult};
use crate::memory::Table;

#[async_trait]
pub trait MealRepo: Send + Sync {
    async fn insert(&self, meal: NewMeal) -> DiaryResult<MealRecord>;
    async fn get(&self, id: Uuid) -> DiaryResult<MealRecord>;
    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<MealRecord>>;
    /// Meals with `from <= date <= to`.
    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<MealRecord>>;
    async fn update(&self, id: Uuid, meal: NewMeal) -> DiaryResult<MealRecord>;
    async fn delete(&self, id: Uuid) -> DiaryResult<()>;
}

const MEAL_COLUMNS: &str =
    "id, date, recorded_at, meal_type, calories, protein_g, fat_g, carb_g, description, memo";

#[derive(Clone)]
pub struct PgMealRepo {
    db: PgPool,
}

impl PgMealRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_records(rows: Vec<MealRow>) -> DiaryResult<Vec<MealRecord>> {
    rows.into_iter().map(MealRecord::try_from).collect()
}

#[async_trait]
impl MealRepo for PgMealRepo {
    async fn insert(&self, meal: NewMeal) -> DiaryResult<MealRecord> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            INSERT INTO meals (id, date, recorded_at, meal_type, calories,
                               protein_g, fat_g, carb_g, description, memo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(meal.date)
        .bind(meal.recorded_at)
        .bind(meal.meal_type.as_str())
        .bind(meal.calories)
        .bind(meal.protein_g)
        .bind(meal.fat_g)
        .bind(meal.carb_g)
        .bind(&meal.description)
        .bind(&meal.memo)
        .fetch_one(&self.db)
        .await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> DiaryResult<MealRecord> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DiaryError::not_found(format!("meal {id}")))?;
        row.try_into()
    }

    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<MealRecord>> {
        self.list_between(date, date).await
    }

    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
              FROM meals
             WHERE date BETWEEN $1 AND $2
             ORDER BY recorded_at ASC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        into_records(rows)
    }

    async fn update(&self, id: Uuid, meal: NewMeal) -> DiaryResult<MealRecord> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            UPDATE meals
               SET date = $2, recorded_at = $3, meal_type = $4, calories = $5,
                   protein_g = $6, fat_g = $7, carb_g = $8, description = $9, memo = $10
             WHERE id = $1
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(meal.date)
        .bind(meal.recorded_at)
        .bind(meal.meal_type.as_str())
        .bind(meal.calories)
        .bind(meal.protein_g)
        .bind(meal.fat_g)
        .bind(meal.carb_g)
        .bind(&meal.description)
        .bind(&meal.memo)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| DiaryError::not_found(format!("meal {id}")))?;
        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> DiaryResult<()> {
        let res = sqlx::query("DELETE FROM meals WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(DiaryError::not_found(format!("meal {id}")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMealRepo {
    table: Table<MealRecord>,
}

#[async_trait]
impl MealRepo for InMemoryMealRepo {
    async fn insert(&self, meal: NewMeal) -> DiaryResult<MealRecord> {
        Ok(self.table.insert(meal.into_record(Uuid::new_v4())).await)
    }

    async fn get(&self, id: Uuid) -> DiaryResult<MealRecord> {
        self.table
            .get(id)
            .await
            .ok_or_else(|| DiaryError::not_found(format!("meal {id}")))
    }

    async fn list_by_date(&self, date: Date) -> DiaryResult<Vec<MealRecord>> {
        self.list_between(date, date).await
    }

    async fn list_between(&self, from: Date, to: Date) -> DiaryResult<Vec<MealRecord>> {
        let mut rows = self.table.filter(|m| m.date >= from && m.date <= to).await;
        rows.sort_by_key(|m| m.recorded_at);
        Ok(rows)
    }

    async fn update(&self, id: Uuid, meal: NewMeal) -> DiaryResult<MealRecord> {
        let record = meal.into_record(id);
        if !self.table.replace(record.clone()).await {
            return Err(DiaryError::not_found(format!("meal {id}")));
        }
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> DiaryResult<()> {
        if !self.table.remove(id).await {
            return Err(DiaryError::not_found(format!("meal {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod meal_repo_tests {
    use super::*;
    use crate::meals::repo_types::MealType;
    use time::macros::{date, datetime};

    fn meal(date: Date, calories: f64) -> NewMeal {
        NewMeal {
            date,
            recorded_at: date.midnight().assume_utc(),
            meal_type: MealType::Lunch,
            calories,
            protein_g: None,
            fat_g: None,
            carb_g: None,
            description: "rice bowl".into(),
            memo: None,
        }
    }

    #[tokio::test]
    async fn lists_only_requested_date() {
        let repo = InMemoryMealRepo::default();
        repo.insert(meal(date!(2024 - 04 - 26), 500.0)).await.unwrap();
        repo.insert(meal(date!(2024 - 04 - 27), 650.0)).await.unwrap();

        let day = repo.list_by_date(date!(2024 - 04 - 26)).await.unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].calories, 500.0);

        let span = repo
            .list_between(date!(2024 - 04 - 01), date!(2024 - 04 - 30))
            .await
            .unwrap();
        assert_eq!(span.len(), 2);
    }

    #[tokio::test]
    async fn update_edits_only_target() {
        let repo = InMemoryMealRepo::default();
        let a = repo.insert(meal(date!(2024 - 04 - 26), 500.0)).await.unwrap();
        let b = repo.insert(meal(date!(2024 - 04 - 26), 650.0)).await.unwrap();

        let mut edit = meal(date!(2024 - 04 - 26), 700.0);
        edit.recorded_at = datetime!(2024-04-26 12:30 UTC);
        let updated = repo.update(a.id, edit).await.unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(repo.get(a.id).await.unwrap().calories, 700.0);
        assert_eq!(repo.get(b.id).await.unwrap(), b);
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found_and_keeps_store() {
        let repo = InMemoryMealRepo::default();
        repo.insert(meal(date!(2024 - 04 - 26), 500.0)).await.unwrap();

        let err = repo.delete(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DiaryError::NotFound(_)));
        assert_eq!(repo.list_by_date(date!(2024 - 04 - 26)).await.unwrap().len(), 1);
    }
}
