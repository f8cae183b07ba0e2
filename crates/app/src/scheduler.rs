use std::{sync::Arc, time::Duration};

use campaign_controller_ads::IntegrationState;
use metrics::counter;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Outcome of a single scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Integration not configured; dependent work was skipped.
    Skipped,
    Ready,
}

impl TickOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Ready => "ready",
        }
    }
}

/// Periodic trigger for integration-dependent jobs.
#[derive(Clone)]
pub struct IntegrationTicker {
    integration: Arc<IntegrationState>,
    interval: Duration,
}

impl IntegrationTicker {
    pub fn new(integration: Arc<IntegrationState>) -> Self {
        Self {
            integration,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Runs the ticker loop in the background.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop().await;
        })
    }

    async fn run_loop(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.run_once();
        }
    }

    /// Executes one tick against the campaign service client.
    pub fn run_once(&self) -> TickOutcome {
        let ready = self
            .integration
            .root()
            .and_then(|root| Ok((root, self.integration.campaign_service()?)));
        let outcome = match ready {
            Ok((root, client)) => {
                let customer_id = root.login_customer_id();
                match client.mutate_url(customer_id) {
                    Ok(url) => info!(stage = "scheduler", %url, "campaign sync tick"),
                    Err(err) => warn!(
                        stage = "scheduler",
                        error = %err,
                        customer_id,
                        "campaign sync target unavailable"
                    ),
                }
                TickOutcome::Ready
            }
            Err(err) => {
                debug!(stage = "scheduler", reason = %err, "skipping campaign sync tick");
                TickOutcome::Skipped
            }
        };
        counter!("scheduled_ticks_total", "outcome" => outcome.as_str()).increment(1);
        outcome
    }
}
