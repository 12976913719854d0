//! Test helpers shared by the integration tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sms_notify::{
    Service,
    checks::ServiceCheck,
    monitor::MonitorConfig,
    notify::{SmsResult, SmsSender},
};

pub const DESTINATION: &str = "4917712345678";

/// Pretends that every host in `down` is unreachable and records probe order.
#[derive(Debug, Default, Clone)]
pub struct SimulatedCheck {
    down: HashSet<String>,
    pub probed: Arc<Mutex<Vec<String>>>,
}

impl SimulatedCheck {
    pub fn all_up() -> Self {
        Self::default()
    }

    pub fn down(hosts: &[&str]) -> Self {
        Self {
            down: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceCheck for SimulatedCheck {
    async fn run(&self, service: &Service) -> bool {
        self.probed.lock().unwrap().push(service.host.clone());
        !self.down.contains(&service.host)
    }
}

/// Records every message instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct RecordingSender {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSender {
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl SmsSender for RecordingSender {
    async fn send(&self, destination: &str, message: &str) -> SmsResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

/// Single-shot monitor config for the given hosts, all on port 80.
pub fn create_test_config(hosts: &[&str], threshold: usize, force_all: bool) -> MonitorConfig {
    MonitorConfig {
        services: hosts.iter().map(|h| Service::tcp(h, 80)).collect(),
        threshold,
        force_all,
        dry_run: false,
        destination: DESTINATION.to_string(),
        daemonize: false,
        interval: Duration::from_secs(60),
    }
}

/// XML-RPC success response as sent by sipgate.
pub fn xmlrpc_success() -> String {
    r#"<?xml version="1.0"?>
<methodResponse><params><param><value><struct>
<member><name>StatusCode</name><value><i4>200</i4></value></member>
<member><name>StatusString</name><value><string>Method success</string></value></member>
</struct></value></param></params></methodResponse>"#
        .to_string()
}

/// XML-RPC fault response.
pub fn xmlrpc_fault(code: i64, message: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<methodResponse><fault><value><struct>
<member><name>faultCode</name><value><int>{code}</int></value></member>
<member><name>faultString</name><value><string>{message}</string></value></member>
</struct></value></fault></methodResponse>"#
    )
}
