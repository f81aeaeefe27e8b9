//! Ingestion checkpoint port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::IngestionProgress;

/// Durable storage for `IngestionProgress`.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Current checkpoint; a missing checkpoint reads as offset 0.
    async fn load(&self) -> DomainResult<IngestionProgress>;

    /// Persist the checkpoint. Must be durable when this returns `Ok`.
    async fn save(&self, progress: &IngestionProgress) -> DomainResult<()>;
}
