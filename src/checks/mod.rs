//! Service checks
//!
//! A check answers a single question for a [`Service`]: is it reachable right now?
//! Checks never fail with an error, every problem is folded into a `false` result.
//!
//! The batch runner walks the configured services strictly in order and stops at
//! the first failure unless it is told to check everything:
//!
//! ```text
//! a:80 ✓ → b:80 ✗ → (c:80 not checked)          force_all = false
//! a:80 ✓ → b:80 ✗ → c:80 ✓                       force_all = true
//! ```

pub mod tcp;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{CheckResult, Service};

pub use tcp::TcpConnect;

/// Capability to check whether a service is reachable.
#[async_trait]
pub trait ServiceCheck: Send + Sync {
    /// Run the check once. Errors are reported as `false`.
    async fn run(&self, service: &Service) -> bool;
}

/// Check `services` one after another.
///
/// Without `force_all` the batch stops after the first failed check, so the
/// returned list can be shorter than `services`. Order is preserved.
#[instrument(skip_all, fields(services = services.len(), force_all = force_all))]
pub async fn run_checks<C>(checker: &C, services: &[Service], force_all: bool) -> Vec<CheckResult>
where
    C: ServiceCheck + ?Sized,
{
    let mut results = Vec::with_capacity(services.len());

    for service in services {
        let success = checker.run(service).await;
        debug!("Host: {} Port: {} Success: {success}", service.host, service.port);

        results.push(CheckResult {
            service: service.clone(),
            success,
        });

        if !success && !force_all {
            debug!("stopping checks after first failure");
            break;
        }
    }

    results
}
