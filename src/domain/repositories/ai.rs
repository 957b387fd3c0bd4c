use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::ai::{AiJobRequest, AiJobSnapshot};

#[async_trait]
#[automock]
pub trait AiGateway {
    /// Submits a job and returns the provider's job id. Completion arrives on
    /// the webhook configured at client construction time.
    async fn submit_job(&self, request: AiJobRequest) -> Result<String>;

    async fn fetch_job(&self, job_id: &str) -> Result<AiJobSnapshot>;
}
