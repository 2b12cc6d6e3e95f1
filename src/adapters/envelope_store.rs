//! In-memory envelope store.
//!
//! Default `EnvelopeStore` adapter: append-only vectors per task behind a
//! `tokio::sync::RwLock`. Suitable for embedding and tests; durable storage
//! is a different adapter behind the same port.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::{Envelope, ExecutionReport};
use crate::domain::ports::EnvelopeStore;

#[derive(Debug, Default)]
pub struct InMemoryEnvelopeStore {
    streams: RwLock<HashMap<Uuid, Vec<Envelope>>>,
    reports: RwLock<HashMap<Uuid, ExecutionReport>>,
}

impl InMemoryEnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnvelopeStore for InMemoryEnvelopeStore {
    async fn append(&self, envelope: &Envelope) -> anyhow::Result<()> {
        self.streams
            .write()
            .await
            .entry(envelope.task_id)
            .or_default()
            .push(envelope.clone());
        Ok(())
    }

    async fn stream(&self, task_id: Uuid) -> anyhow::Result<Vec<Envelope>> {
        Ok(self
            .streams
            .read()
            .await
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn persist_report(&self, report: &ExecutionReport) -> anyhow::Result<()> {
        self.reports
            .write()
            .await
            .insert(report.task_id, report.clone());
        Ok(())
    }

    async fn report(&self, task_id: Uuid) -> anyhow::Result<Option<ExecutionReport>> {
        Ok(self.reports.read().await.get(&task_id).cloned())
    }
}
