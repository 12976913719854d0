//! Monitor - runs the checks and decides whether to send a text message
//!
//! ## Cycle
//!
//! ```text
//! run_checks → count failures → failed >= threshold?
//!                                   │ yes
//!                                   ▼
//!                          limiter.can_send()? ── no ──→ log, skip
//!                                   │ yes
//!                                   ▼
//!                 build message → chunk (160) → send each → limiter.update(chunks)
//! ```
//!
//! A single-shot monitor returns after one cycle. A daemonized monitor sleeps for
//! the configured interval between cycles and only stops when the shutdown future
//! resolves. Any error while checking or notifying ends the loop.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::{
    CheckResult, Service,
    checks::{ServiceCheck, run_checks},
    config::Settings,
    limiter::MessageLimiter,
    notify::{MAX_MESSAGE_LEN, SmsResult, SmsSender, build_message, chunk_message},
};

/// What the monitor needs to know to run its cycles.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub services: Vec<Service>,
    pub threshold: usize,
    pub force_all: bool,
    pub dry_run: bool,
    pub destination: String,
    pub daemonize: bool,
    pub interval: Duration,
}

impl From<&Settings> for MonitorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            services: settings.services.clone(),
            threshold: settings.threshold,
            force_all: settings.force_all,
            dry_run: settings.dry_run,
            destination: settings.mobile.clone(),
            daemonize: settings.daemonize,
            interval: settings.interval,
        }
    }
}

/// Decision taken at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Fewer failures than the threshold
    NotNeeded,

    /// Threshold reached, but the hourly message limit is used up
    Suppressed,

    /// Message was sent in `chunks` parts (or only logged in a dry run)
    Sent { chunks: usize, dry_run: bool },
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub results: Vec<CheckResult>,
    pub failed: usize,
    pub notification: Notification,
}

pub struct Monitor<C, S> {
    config: MonitorConfig,
    checker: C,
    sender: S,
    limiter: MessageLimiter,
}

impl<C, S> Monitor<C, S>
where
    C: ServiceCheck,
    S: SmsSender,
{
    pub fn new(config: MonitorConfig, checker: C, sender: S, limiter: MessageLimiter) -> Self {
        Self {
            config,
            checker,
            sender,
            limiter,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn limiter(&self) -> &MessageLimiter {
        &self.limiter
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Run cycles until done.
    ///
    /// Returns the number of failed services of the last cycle, or `0` when a
    /// daemonized monitor was stopped through `shutdown`.
    pub async fn run<F>(mut self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let report = self
                .run_cycle()
                .await
                .context("running checks or notifying")?;

            if !self.config.daemonize {
                return Ok(report.failed);
            }

            debug!("next cycle in {:?}", self.config.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = &mut shutdown => {
                    info!("** STOPPING **");
                    return Ok(0);
                }
            }
        }
    }

    /// Run all checks once and notify if the threshold is reached.
    #[instrument(skip(self))]
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let results = run_checks(&self.checker, &self.config.services, self.config.force_all).await;
        let failed = results.iter().filter(|r| r.failed()).count();
        debug!(
            "{} of {} checks run, {failed} failed",
            results.len(),
            self.config.services.len()
        );

        let notification = if failed < self.config.threshold {
            Notification::NotNeeded
        } else if !self.limiter.can_send() {
            info!("Service(s) failed, but didn't send message because limit reached.");
            Notification::Suppressed
        } else {
            let chunks = self
                .notify(&results)
                .await
                .context("failed to send notification")?;
            self.limiter.update(chunks);
            Notification::Sent {
                chunks,
                dry_run: self.config.dry_run,
            }
        };

        Ok(CycleReport {
            results,
            failed,
            notification,
        })
    }

    /// Send the failure summary, returns the number of messages it took.
    async fn notify(&self, results: &[CheckResult]) -> SmsResult<usize> {
        let message = build_message(results, self.config.services.len());
        info!("{message}");

        let destination = &self.config.destination;
        let chunks = chunk_message(&message, MAX_MESSAGE_LEN);
        for chunk in &chunks {
            if self.config.dry_run {
                info!("Test run - not sending SMS >>{chunk}<< to >>{destination}<<");
            } else {
                self.sender.send(destination, chunk).await?;
            }
        }

        Ok(chunks.len())
    }
}
