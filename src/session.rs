//! Session persistence for conversation threads
//!
//! What survives across turns is the thread's message log, checkpointed
//! under a stable UUID key. The backend is chosen at startup: in-memory
//! by default, Postgres when a database URL is configured, with graceful
//! fallback to in-memory when the connection cannot be set up.

use crate::error::AssistantError;
use crate::pipeline::state::ChatMessage;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
enum SessionBackend {
    InMemory {
        threads: Arc<RwLock<HashMap<Uuid, Vec<ChatMessage>>>>,
    },
    Postgres {
        pool: PgPool,
        schema_ready: Arc<OnceCell<()>>,
    },
}

/// Store for per-thread conversation checkpoints
#[derive(Clone)]
pub struct SessionStore {
    backend: SessionBackend,
}

impl SessionStore {
    /// In-memory store, the default backend
    pub fn in_memory() -> Self {
        Self {
            backend: SessionBackend::InMemory {
                threads: Arc::new(RwLock::new(HashMap::new())),
            },
        }
    }

    /// Pick a backend for an optional Postgres URL. Connection problems
    /// fall back to in-memory so the assistant keeps working.
    pub fn from_database_url(url: Option<&str>) -> Self {
        if let Some(url) = url {
            match sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect_lazy(url)
            {
                Ok(pool) => {
                    info!("Session store backend: postgres");
                    return Self {
                        backend: SessionBackend::Postgres {
                            pool,
                            schema_ready: Arc::new(OnceCell::new()),
                        },
                    };
                }
                Err(error) => {
                    warn!(
                        "Failed to initialize postgres session backend, falling back to in-memory: {}",
                        error
                    );
                }
            }
        }

        info!("Session store backend: in-memory");
        Self::in_memory()
    }

    async fn ensure_schema_if_needed(&self) -> crate::Result<()> {
        let SessionBackend::Postgres { pool, schema_ready } = &self.backend else {
            return Ok(());
        };

        schema_ready
            .get_or_try_init(|| async {
                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS conversation_threads (
                      thread_id UUID PRIMARY KEY,
                      messages TEXT NOT NULL,
                      updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                    );
                    "#,
                )
                .execute(pool)
                .await?;

                Ok::<(), sqlx::Error>(())
            })
            .await
            .map_err(|e| {
                AssistantError::DatabaseError(format!("Failed to initialize session schema: {}", e))
            })?;

        Ok(())
    }

    /// Restore a thread's message log; unknown threads start empty.
    pub async fn load(&self, thread_id: Uuid) -> crate::Result<Vec<ChatMessage>> {
        match &self.backend {
            SessionBackend::InMemory { threads } => {
                let locked = threads.read().await;
                Ok(locked.get(&thread_id).cloned().unwrap_or_default())
            }
            SessionBackend::Postgres { pool, .. } => {
                self.ensure_schema_if_needed().await?;

                let row =
                    sqlx::query("SELECT messages FROM conversation_threads WHERE thread_id = $1")
                        .bind(thread_id)
                        .fetch_optional(pool)
                        .await
                        .map_err(|e| {
                            AssistantError::DatabaseError(format!("Failed to load session: {}", e))
                        })?;

                let Some(row) = row else {
                    return Ok(Vec::new());
                };

                let raw: String = row.try_get("messages").unwrap_or_default();
                Ok(serde_json::from_str(&raw).unwrap_or_default())
            }
        }
    }

    /// Persist a thread's message log, replacing the previous checkpoint.
    pub async fn save(&self, thread_id: Uuid, messages: &[ChatMessage]) -> crate::Result<()> {
        match &self.backend {
            SessionBackend::InMemory { threads } => {
                let mut locked = threads.write().await;
                locked.insert(thread_id, messages.to_vec());
                Ok(())
            }
            SessionBackend::Postgres { pool, .. } => {
                self.ensure_schema_if_needed().await?;

                let payload = serde_json::to_string(messages)?;

                let mut tx = pool.begin().await.map_err(|e| {
                    AssistantError::DatabaseError(format!(
                        "Failed to begin session transaction: {}",
                        e
                    ))
                })?;

                sqlx::query("DELETE FROM conversation_threads WHERE thread_id = $1")
                    .bind(thread_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AssistantError::DatabaseError(format!(
                            "Failed to clear session checkpoint: {}",
                            e
                        ))
                    })?;

                sqlx::query(
                    "INSERT INTO conversation_threads (thread_id, messages, updated_at) VALUES ($1, $2, NOW())",
                )
                .bind(thread_id)
                .bind(&payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AssistantError::DatabaseError(format!(
                        "Failed to save session checkpoint: {}",
                        e
                    ))
                })?;

                tx.commit().await.map_err(|e| {
                    AssistantError::DatabaseError(format!(
                        "Failed to commit session checkpoint: {}",
                        e
                    ))
                })?;

                Ok(())
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Map an arbitrary thread token to a stable UUID
pub fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

pub fn parse_or_stable_uuid(value: Option<&str>, fallback_seed: &str) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string(fallback_seed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_thread_starts_empty() {
        let store = SessionStore::in_memory();
        let messages = store.load(Uuid::new_v4()).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = SessionStore::in_memory();
        let thread = Uuid::new_v4();
        let messages = vec![ChatMessage::user("What is my balance?")];

        store.save(thread, &messages).await.unwrap();
        let restored = store.load(thread).await.unwrap();

        assert_eq!(restored, messages);
    }

    #[tokio::test]
    async fn test_save_replaces_checkpoint() {
        let store = SessionStore::in_memory();
        let thread = Uuid::new_v4();

        store
            .save(thread, &[ChatMessage::user("first")])
            .await
            .unwrap();
        store
            .save(
                thread,
                &[ChatMessage::user("first"), ChatMessage::user("second")],
            )
            .await
            .unwrap();

        let restored = store.load(thread).await.unwrap();
        assert_eq!(restored.len(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = SessionStore::in_memory();
        let clone = store.clone();
        let thread = Uuid::new_v4();

        store
            .save(thread, &[ChatMessage::user("hello")])
            .await
            .unwrap();

        let restored = clone.load(thread).await.unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_stable_uuid_is_deterministic() {
        let a = stable_uuid_from_string("session_neha");
        let b = stable_uuid_from_string("session_neha");
        let c = stable_uuid_from_string("session_niyati");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_parse_or_stable_uuid() {
        let real = Uuid::new_v4();
        assert_eq!(
            parse_or_stable_uuid(Some(&real.to_string()), "fallback"),
            real
        );

        let mapped = parse_or_stable_uuid(Some("thread-42"), "fallback");
        assert_eq!(mapped, stable_uuid_from_string("thread-42"));

        let fell_back = parse_or_stable_uuid(None, "fallback");
        assert_eq!(fell_back, stable_uuid_from_string("fallback"));
    }
}
