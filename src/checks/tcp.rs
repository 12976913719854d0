use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::Service;

use super::ServiceCheck;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tries to open a TCP connection to the service and closes it right away.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnect {
    timeout: Duration,
}

impl Default for TcpConnect {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl TcpConnect {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ServiceCheck for TcpConnect {
    #[instrument(skip_all, fields(service = %service))]
    async fn run(&self, service: &Service) -> bool {
        debug!("Connecting to '{}', port {}, TCP...", service.host, service.port);

        // the timeout covers name resolution as well as the handshake
        let connect = TcpStream::connect((service.host.as_str(), service.port));
        let success = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                debug!("Could not connect: {e}");
                false
            }
            Err(_) => {
                debug!("Could not connect: timed out after {:?}", self.timeout);
                false
            }
        };

        debug!("... connected: {success}");
        success
    }
}
