pub mod checks;
pub mod config;
pub mod daemon;
pub mod limiter;
pub mod monitor;
pub mod notify;
pub mod util;
pub mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// A network service that gets probed on every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Service {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

impl Service {
    pub fn tcp(host: impl ToString, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            protocol: Protocol::Tcp,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.host, self.port, self.protocol)
    }
}

/// Outcome of probing a single [`Service`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub service: Service,
    pub success: bool,
}

impl CheckResult {
    pub fn failed(&self) -> bool {
        !self.success
    }
}
