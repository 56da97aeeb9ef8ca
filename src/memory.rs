//! In-memory tables backing the fake repositories used by `AppState::fake`
//! and the unit tests.

use tokio::sync::RwLock;
use uuid::Uuid;

pub trait Keyed {
    fn key(&self) -> Uuid;
}

pub struct Table<T> {
    rows: RwLock<Vec<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Clone + Keyed> Table<T> {
    pub async fn insert(&self, row: T) -> T {
        self.rows.write().await.push(row.clone());
        row
    }

    pub async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.iter().find(|r| r.key() == id).cloned()
    }

    pub async fn filter<F>(&self, pred: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .iter()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    /// Replaces the row with the same key. Returns false when absent.
    pub async fn replace(&self, row: T) -> bool {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| r.key() == row.key()) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    /// Removes the row with `id`. Returns false when absent.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.key() != id);
        rows.len() != before
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}
