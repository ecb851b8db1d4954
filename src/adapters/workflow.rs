//! reqwest implementation of [`WorkflowGateway`] against the workflow engine's REST API.

use crate::config::toml_config::WorkflowConfig;
use crate::domain::ports::WorkflowGateway;
use crate::utils::error::{ConnectorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

/// Number of completed job keys remembered before the oldest are forgotten.
pub const DEFAULT_COMPLETED_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct CompletedJobs {
    keys: HashSet<i64>,
    order: VecDeque<i64>,
    capacity: usize,
}

impl CompletedJobs {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: HashSet::new(),
            order: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Claims `job_key`; false when it is already completed or in flight.
    fn reserve(&mut self, job_key: i64) -> bool {
        if !self.keys.insert(job_key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.keys.remove(&oldest);
            }
        }
        self.order.push_back(job_key);
        true
    }

    fn release(&mut self, job_key: i64) {
        if self.keys.remove(&job_key) {
            self.order.retain(|k| *k != job_key);
        }
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Completes jobs with `POST /v2/jobs/{jobKey}/completion`.
///
/// A job key is completed at most once: the key is claimed before the request is sent, so a
/// concurrent or later attempt fails with [`ConnectorError::JobAlreadyCompleted`]. A failed
/// attempt releases its claim and may be retried. Only the most recent `capacity` keys are
/// remembered.
pub struct HttpWorkflowGateway {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
    completed: Mutex<CompletedJobs>,
}

impl HttpWorkflowGateway {
    pub fn new(config: &WorkflowConfig) -> Result<Self> {
        Self::with_capacity(config, DEFAULT_COMPLETED_CAPACITY)
    }

    pub fn with_capacity(config: &WorkflowConfig, capacity: usize) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
            completed: Mutex::new(CompletedJobs::with_capacity(capacity)),
        })
    }

    /// Number of job keys currently remembered as completed or in flight.
    pub async fn remembered_jobs(&self) -> usize {
        self.completed.lock().await.len()
    }

    async fn send_completion(
        &self,
        job_key: i64,
        variables: &HashMap<String, String>,
    ) -> Result<()> {
        let url = format!("{}/v2/jobs/{}/completion", self.base_url, job_key);
        tracing::debug!("Completing job {} at {}", job_key, url);

        let mut request = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "variables": variables }));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Completing job {} failed with {}: {}", job_key, status, body);
            return Err(ConnectorError::WorkflowError {
                message: format!("job {} completion returned {}: {}", job_key, status, body),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowGateway for HttpWorkflowGateway {
    async fn complete(&self, job_key: i64, variables: HashMap<String, String>) -> Result<()> {
        if !self.completed.lock().await.reserve(job_key) {
            return Err(ConnectorError::JobAlreadyCompleted { job_key });
        }

        if let Err(e) = self.send_completion(job_key, &variables).await {
            self.completed.lock().await.release(job_key);
            return Err(e);
        }

        tracing::info!("Completed job {}", job_key);
        Ok(())
    }
}
