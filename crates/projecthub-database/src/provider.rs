//! Store backend selection and wiring.

use std::sync::Arc;

use tracing::info;

use projecthub_core::config::DatabaseConfig;
use projecthub_core::error::AppError;
use projecthub_core::result::AppResult;

use crate::connection;
use crate::memory::MemoryStore;
use crate::migration;
use crate::repositories::audit::AuditRepository;
use crate::repositories::chat::ChatRepository;
use crate::repositories::notice::NoticeRepository;
use crate::repositories::project::ProjectRepository;
use crate::store::{AuditStore, ChatStore, NoticeStore, ProjectStore, RosterProvider};

/// Backend-agnostic bundle of store handles.
///
/// Dispatches to the PostgreSQL repositories or the in-memory store based
/// on configuration; everything above this layer only sees the traits.
#[derive(Clone)]
pub struct StoreManager {
    /// Audit record store.
    pub audit: Arc<dyn AuditStore>,
    /// Event notice store.
    pub notices: Arc<dyn NoticeStore>,
    /// Chat message and mention store.
    pub chat: Arc<dyn ChatStore>,
    /// Roster lookup.
    pub roster: Arc<dyn RosterProvider>,
    /// Project creation.
    pub projects: Arc<dyn ProjectStore>,
}

impl StoreManager {
    /// Connect the backend named by configuration.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                let pool = connection::create_pool(config).await?;
                migration::run_migrations(&pool).await?;
                info!("Store backend: postgres");
                Ok(Self {
                    audit: Arc::new(AuditRepository::new(pool.clone())),
                    notices: Arc::new(NoticeRepository::new(pool.clone())),
                    chat: Arc::new(ChatRepository::new(pool.clone())),
                    roster: Arc::new(ProjectRepository::new(pool.clone())),
                    projects: Arc::new(ProjectRepository::new(pool)),
                })
            }
            "memory" => {
                info!("Store backend: memory");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown store provider '{other}' (expected 'postgres' or 'memory')"
            ))),
        }
    }

    /// Build a manager over a fresh in-memory store.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::from_memory(store)
    }

    /// Build a manager over an existing in-memory store.
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            audit: store.clone(),
            notices: store.clone(),
            chat: store.clone(),
            roster: store.clone(),
            projects: store,
        }
    }
}
