use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{EmailError, EmailSender};

const QUEUE_CAPACITY: usize = 256;

/// Retry policy for queued deliveries
#[derive(Debug, Clone)]
pub struct EmailRetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
    pub jitter_factor: f64,
}

impl Default for EmailRetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            max_attempts: 5,
            jitter_factor: 0.1,
        }
    }
}

impl EmailRetryPolicy {
    /// delay = min(base × 2^attempt × (1 ± jitter), max)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2_f64.powi(attempt as i32);
        let jitter = 1.0 + (rand::rng().random::<f64>() * 2.0 - 1.0) * self.jitter_factor;
        let capped = (exponential * jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

#[derive(Debug)]
struct OutboundEmail {
    address: String,
    subject: String,
    body: String,
}

/// Accepts messages immediately and delivers them from a background task.
/// Dropping every clone closes the queue; the worker drains what is left.
#[derive(Clone)]
pub struct QueuedEmailSender {
    tx: mpsc::Sender<OutboundEmail>,
}

impl QueuedEmailSender {
    /// Must be called inside a tokio runtime.
    pub fn spawn(inner: Arc<dyn EmailSender>, policy: EmailRetryPolicy) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_worker(inner, policy, rx));
        Self { tx }
    }
}

#[async_trait]
impl EmailSender for QueuedEmailSender {
    async fn send_email(&self, address: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        self.tx
            .send(OutboundEmail {
                address: address.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            })
            .await
            .map_err(|_| EmailError::QueueClosed)
    }
}

async fn run_worker(
    inner: Arc<dyn EmailSender>,
    policy: EmailRetryPolicy,
    mut rx: mpsc::Receiver<OutboundEmail>,
) {
    while let Some(email) = rx.recv().await {
        deliver(inner.as_ref(), &policy, &email).await;
    }
    tracing::debug!("Email queue closed");
}

async fn deliver(inner: &dyn EmailSender, policy: &EmailRetryPolicy, email: &OutboundEmail) {
    for attempt in 0..policy.max_attempts {
        match inner.send_email(&email.address, &email.subject, &email.body).await {
            Ok(()) => {
                tracing::info!(to = %email.address, attempt = attempt + 1, "Email delivered");
                return;
            }
            Err(e) if attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(to = %email.address, attempt = attempt + 1, ?delay, "Email delivery failed: {}", e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(to = %email.address, attempts = policy.max_attempts, "Giving up on email: {}", e);
            }
        }
    }
}
