use std::collections::HashMap;

use ::redis::{AsyncCommands, Client, aio::ConnectionManager};
use async_trait::async_trait;

use super::backend::{HashBackend, HashFields};
use super::error::CacheError;

/// Redis-backed hashes over a shared, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisHashBackend {
    connection: ConnectionManager,
}

impl RedisHashBackend {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::backend)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(CacheError::backend)?;
        Ok(Self { connection })
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: String = ::redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }
}

#[async_trait]
impl HashBackend for RedisHashBackend {
    async fn replace(&self, key: &str, fields: &HashFields) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let mut pipe = ::redis::pipe();
        pipe.atomic().del(key).ignore();
        if !fields.is_empty() {
            pipe.hset_multiple(key, fields).ignore();
        }
        let _: () = pipe
            .query_async(&mut connection)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }

    async fn merge(&self, key: &str, fields: &HashFields) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        let _: () = connection
            .hset_multiple(key, fields)
            .await
            .map_err(CacheError::backend)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await.map_err(CacheError::backend)?;
        Ok(())
    }

    async fn field(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        connection
            .hget(key, field)
            .await
            .map_err(CacheError::backend)
    }

    async fn fields(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        let mut connection = self.connection.clone();
        connection.hgetall(key).await.map_err(CacheError::backend)
    }
}
