use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

/// In-process table keyed by an identity column, the way the relational
/// store hands out `bigint generated always as identity` ids.
pub struct MemoryTable<T> {
    rows: RwLock<BTreeMap<i64, T>>,
    sequence: AtomicI64,
}

impl<T: Clone> Default for MemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryTable<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(0),
        }
    }

    /// Allocates the next id and stores the row built from it.
    pub async fn insert_with<F>(&self, build: F) -> T
    where
        F: FnOnce(i64) -> T,
    {
        let id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let row = build(id);
        self.rows.write().await.insert(id, row.clone());
        row
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn find<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect()
    }

    pub async fn any<P>(&self, predicate: P) -> bool
    where
        P: Fn(&T) -> bool,
    {
        self.rows.read().await.values().any(predicate)
    }

    pub async fn replace(&self, id: i64, row: T) -> Option<T> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&id) {
            Some(existing) => {
                *existing = row.clone();
                Some(row)
            }
            None => None,
        }
    }

    pub async fn remove(&self, id: i64) -> Option<T> {
        self.rows.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_sequential_and_never_reused() {
        let table: MemoryTable<(i64, &str)> = MemoryTable::new();
        let first = table.insert_with(|id| (id, "first")).await;
        let second = table.insert_with(|id| (id, "second")).await;
        assert_eq!((first.0, second.0), (1, 2));

        table.remove(2).await;
        let third = table.insert_with(|id| (id, "third")).await;
        assert_eq!(third.0, 3);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn replace_only_touches_existing_rows() {
        let table: MemoryTable<(i64, &str)> = MemoryTable::new();
        table.insert_with(|id| (id, "before")).await;

        assert_eq!(table.replace(1, (1, "after")).await, Some((1, "after")));
        assert_eq!(table.replace(9, (9, "ghost")).await, None);
        assert_eq!(table.find(|row| row.1 == "after").await.len(), 1);
    }
}
