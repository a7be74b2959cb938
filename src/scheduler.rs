use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::{PipelineRunner, RunReport};

/// Runs the pipeline immediately and then once per interval until shut down.
pub struct Scheduler {
    runner: Arc<dyn PipelineRunner>,
    every: Duration,
    retries: u32,
    shutdown_token: CancellationToken,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn PipelineRunner>, every: Duration, retries: u32) -> Self {
        Self {
            runner,
            every,
            retries,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops the scheduler once the in-flight run completes.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub async fn run(self) {
        info!(
            interval_secs = self.every.as_secs(),
            retries = self.retries,
            "starting scheduler"
        );

        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("received shutdown signal, stopping after the current run");
            shutdown_token.cancel();
        });

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_with_retries().await;
                }
            }
        }

        info!("scheduler stopped");
    }

    /// One scheduled run, repeated while stages abort and retries remain.
    pub async fn run_with_retries(&self) -> RunReport {
        let mut attempt = 0;
        loop {
            let report = self.runner.run_once().await;
            if report.succeeded() || attempt >= self.retries {
                if !report.succeeded() {
                    error!(
                        run_id = %report.run_id,
                        stage = ?report.failed_stage,
                        "pipeline run failed, waiting for the next interval"
                    );
                }
                return report;
            }

            attempt += 1;
            warn!(
                run_id = %report.run_id,
                stage = ?report.failed_stage,
                attempt,
                retries = self.retries,
                "pipeline run failed, retrying"
            );
        }
    }
}
