use std::collections::{BTreeSet, HashMap};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use shared_config::AppConfig;

/// JSON documents grouped in collections, plus string-set indexes for
/// secondary lookups. Nothing here enforces references between documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<()>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    async fn index_add(&self, index: &str, id: &str) -> Result<()>;

    async fn index_remove(&self, index: &str, id: &str) -> Result<()>;

    async fn index_members(&self, index: &str) -> Result<Vec<String>>;
}

fn document_key(collection: &str, id: &str) -> String {
    format!("{}:{}", collection, id)
}

pub struct RedisDocumentStore {
    pool: Pool,
}

impl RedisDocumentStore {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let cfg = Config::from_url(config.redis_url_or_default());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| anyhow!("Failed to create Redis pool: {}", e))?;

        let store = Self { pool };
        let mut conn = store.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis document store initialized successfully");

        Ok(store)
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow!("Failed to connect to Redis: {}", e))
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        let mut conn = self.connection().await?;
        let key = document_key(collection, id);
        let _: () = conn.set(&key, document.to_string()).await?;
        debug!("Stored document {}", key);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(document_key(collection, id)).await?;
        match raw {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(document_key(collection, id)).await?;
        Ok(removed > 0)
    }

    async fn index_add(&self, index: &str, id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.sadd(index, id).await?;
        Ok(())
    }

    async fn index_remove(&self, index: &str, id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.srem(index, id).await?;
        Ok(())
    }

    async fn index_members(&self, index: &str) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let mut members: Vec<String> = conn.smembers(index).await?;
        members.sort();
        Ok(members)
    }
}

/// Same contract as [`RedisDocumentStore`], held in process memory.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
    indexes: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(document_key(collection, id), document.clone());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&document_key(collection, id))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self
            .documents
            .write()
            .await
            .remove(&document_key(collection, id))
            .is_some())
    }

    async fn index_add(&self, index: &str, id: &str) -> Result<()> {
        self.indexes
            .write()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string());
        Ok(())
    }

    async fn index_remove(&self, index: &str, id: &str) -> Result<()> {
        if let Some(members) = self.indexes.write().await.get_mut(index) {
            members.remove(id);
        }
        Ok(())
    }

    async fn index_members(&self, index: &str) -> Result<Vec<String>> {
        Ok(self
            .indexes
            .read()
            .await
            .get(index)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}
