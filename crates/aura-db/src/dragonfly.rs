//! `Dragonfly` (Redis-compatible) record store.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `{prefix}:particles` | Hash | Birth records keyed by id |
//! | `{prefix}:chat-messages` | Hash | Chat messages keyed by id |
//! | `{prefix}:audit-log` | Hash | Audit entries keyed by id |

use std::collections::HashMap;

use aura_types::RecordKind;
use fred::prelude::*;

use crate::error::DbError;

/// Connection handle to a `Dragonfly` instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
    prefix: String,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!(prefix, "Connected to Dragonfly");
        Ok(Self {
            client,
            prefix: prefix.to_owned(),
        })
    }

    /// Hash key holding every record of `kind`.
    pub fn key(&self, kind: RecordKind) -> String {
        format!("{}:{}", self.prefix, kind.as_str())
    }

    /// Insert or overwrite `id` under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn append(
        &self,
        kind: RecordKind,
        id: &str,
        body: &serde_json::Value,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(body)?;
        let _: u64 = self
            .client
            .hset(self.key(kind), (id, json.as_str()))
            .await?;
        Ok(())
    }

    /// Every record of `kind`. Order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if a stored body is not JSON.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn load_all(&self, kind: RecordKind) -> Result<Vec<serde_json::Value>, DbError> {
        let entries: HashMap<String, String> = self.client.hgetall(self.key(kind)).await?;
        let mut bodies = Vec::with_capacity(entries.len());
        for raw in entries.values() {
            bodies.push(serde_json::from_str(raw)?);
        }
        Ok(bodies)
    }

    /// Delete every collection under this prefix.
    ///
    /// **WARNING:** This deletes all records. Only use for testing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn clear(&self) -> Result<(), DbError> {
        for kind in RecordKind::ALL {
            let _: u32 = self.client.del(self.key(kind)).await?;
        }
        Ok(())
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the server rejects `QUIT`.
    pub async fn close(&self) -> Result<(), DbError> {
        self.client.quit().await?;
        tracing::info!("Dragonfly connection closed");
        Ok(())
    }
}
