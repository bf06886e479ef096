use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout, Instant};

use crate::error::{AppError, AppResult};
use crate::services::providers::LlmClient;

/// Minimum spacing between consecutive requests to the provider
const MIN_SPACING: Duration = Duration::from_millis(500);

/// Cooldown entered after the provider signals a rate limit
const COOLDOWN: Duration = Duration::from_secs(30);

/// Per-request timeout against the provider
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Attempts per job, with exponential backoff between them
const MAX_ATTEMPTS: u32 = 2;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

struct LlmJob {
    system: String,
    user: String,
    reply: oneshot::Sender<AppResult<serde_json::Value>>,
}

/// Shared rate-limiting queue in front of the language-model service.
///
/// All model calls from all in-flight requests funnel through one actor task
/// that owns the pacing state: requests are serialized with a minimum
/// spacing, transient failures are retried with backoff, and a provider
/// rate-limit signal puts the whole queue into a cooldown window. Callers
/// submit work and await the reply; none of them touch timers directly.
#[derive(Clone)]
pub struct LlmGateway {
    tx: mpsc::Sender<LlmJob>,
}

impl LlmGateway {
    /// Spawns the gateway task and returns a cloneable handle
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(gateway_task(client, rx));
        Self { tx }
    }

    /// Submits one model call through the shared queue
    pub async fn complete_json(&self, system: &str, user: &str) -> AppResult<serde_json::Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = LlmJob {
            system: system.to_string(),
            user: user.to_string(),
            reply: reply_tx,
        };

        self.tx
            .send(job)
            .await
            .map_err(|_| AppError::Internal("Language-model gateway has stopped".to_string()))?;

        reply_rx
            .await
            .map_err(|_| AppError::Internal("Language-model gateway dropped a reply".to_string()))?
    }
}

async fn gateway_task(client: Arc<dyn LlmClient>, mut rx: mpsc::Receiver<LlmJob>) {
    tracing::info!(provider = client.name(), "Language-model gateway started");

    let mut last_dispatch: Option<Instant> = None;
    let mut cooldown_until: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if let Some(until) = cooldown_until.take() {
            let now = Instant::now();
            if now < until {
                tracing::warn!(
                    remaining_ms = (until - now).as_millis() as u64,
                    "Gateway in cooldown, delaying dispatch"
                );
                tokio::time::sleep_until(until).await;
            }
        }

        if let Some(last) = last_dispatch {
            let since = last.elapsed();
            if since < MIN_SPACING {
                sleep(MIN_SPACING - since).await;
            }
        }

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            last_dispatch = Some(Instant::now());

            match timeout(REQUEST_TIMEOUT, client.complete_json(&job.system, &job.user)).await {
                Ok(Ok(value)) => break Ok(value),
                Ok(Err(AppError::RateLimited(msg))) => {
                    tracing::warn!(error = %msg, "Provider rate limit, entering cooldown");
                    cooldown_until = Some(Instant::now() + COOLDOWN);
                    break Err(AppError::RateLimited(msg));
                }
                Ok(Err(e)) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(error = %e, attempt, "Model call failed, retrying");
                    sleep(BACKOFF_BASE * 2u32.pow(attempt)).await;
                }
                Ok(Err(e)) => break Err(e),
                Err(_) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, "Model call timed out, retrying");
                }
                Err(_) => {
                    break Err(AppError::Llm(format!(
                        "Model call timed out after {} attempts",
                        attempt
                    )))
                }
            }
        };

        // a caller that gave up waiting is not an error here
        let _ = job.reply.send(result);
    }

    tracing::info!("Language-model gateway stopped");
}
