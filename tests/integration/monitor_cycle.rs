//! Decision logic of a single monitor cycle

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use sms_notify::{
    Service,
    limiter::MessageLimiter,
    monitor::{Monitor, Notification},
    notify::{MAX_MESSAGE_LEN, build_message},
};

use crate::helpers::*;

#[tokio::test]
async fn test_reachable_service_sends_nothing() {
    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&["a"], 1, false),
        SimulatedCheck::all_up(),
        sender.clone(),
        MessageLimiter::new(1),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.failed, 0);
    assert_eq!(report.notification, Notification::NotNeeded);
    assert!(sender.messages().is_empty());
    assert_eq!(monitor.limiter().sent_count(), 0);
}

#[tokio::test]
async fn test_short_circuit_after_first_failure_still_notifies() {
    let check = SimulatedCheck::down(&["a", "b"]);
    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&["a", "b"], 1, false),
        check.clone(),
        sender.clone(),
        MessageLimiter::new(1),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.failed, 1);
    assert_eq!(check.probed(), vec!["a"]);
    assert_eq!(
        report.notification,
        Notification::Sent {
            chunks: 1,
            dry_run: false
        }
    );
    assert_eq!(
        sender.messages(),
        vec!["Service(s) failed: a:80(TCP) (1 checks not run)"]
    );

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent[0].0, DESTINATION);
}

#[tokio::test]
async fn test_threshold_not_reached() {
    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&["a", "b", "c"], 2, true),
        SimulatedCheck::down(&["b"]),
        sender.clone(),
        MessageLimiter::new(10),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.notification, Notification::NotNeeded);
    assert!(sender.messages().is_empty());
}

#[tokio::test]
async fn test_threshold_reached_with_force_all() {
    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&["a", "b", "c"], 2, true),
        SimulatedCheck::down(&["a", "c"]),
        sender.clone(),
        MessageLimiter::new(10),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.failed, 2);
    assert_eq!(
        sender.messages(),
        vec!["Service(s) failed: a:80(TCP) c:80(TCP)"]
    );
}

#[tokio::test]
async fn test_limit_suppresses_notification() {
    let sender = RecordingSender::default();
    let mut limiter = MessageLimiter::new(1);
    limiter.update(1);

    let mut monitor = Monitor::new(
        create_test_config(&["a"], 1, false),
        SimulatedCheck::down(&["a"]),
        sender.clone(),
        limiter,
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.notification, Notification::Suppressed);
    assert!(sender.messages().is_empty());
}

#[tokio::test]
async fn test_zero_limit_never_notifies() {
    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&["a"], 1, false),
        SimulatedCheck::down(&["a"]),
        sender.clone(),
        MessageLimiter::new(0),
    );

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.notification, Notification::Suppressed);
    assert!(sender.messages().is_empty());
}

#[tokio::test]
async fn test_dry_run_long_message_is_chunked_but_not_sent() {
    let hosts: Vec<String> = (1..=8).map(|i| format!("service-{i}.example.org")).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();

    let mut config = create_test_config(&host_refs, 1, true);
    config.services = hosts.iter().map(|h| Service::tcp(h, 8080)).collect();
    config.dry_run = true;

    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        config,
        SimulatedCheck::down(&host_refs),
        sender.clone(),
        MessageLimiter::new(5),
    );

    let report = monitor.run_cycle().await.unwrap();

    let message = build_message(&report.results, hosts.len());
    let length = message.chars().count();
    assert!(length > MAX_MESSAGE_LEN && length <= 2 * MAX_MESSAGE_LEN);

    assert_eq!(
        report.notification,
        Notification::Sent {
            chunks: 2,
            dry_run: true
        }
    );
    assert!(sender.messages().is_empty());
    assert_eq!(monitor.limiter().sent_count(), 2);
}

#[tokio::test]
async fn test_long_message_is_sent_in_chunks() {
    let hosts: Vec<String> = (1..=8).map(|i| format!("service-{i}.example.org")).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();

    let sender = RecordingSender::default();
    let mut monitor = Monitor::new(
        create_test_config(&host_refs, 1, true),
        SimulatedCheck::down(&host_refs),
        sender.clone(),
        MessageLimiter::new(5),
    );

    let report = monitor.run_cycle().await.unwrap();

    let messages = sender.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.chars().count() <= MAX_MESSAGE_LEN));
    assert_eq!(messages.concat(), build_message(&report.results, hosts.len()));
    assert_eq!(monitor.limiter().sent_count(), 2);
}

#[test]
fn test_limiter_budget_returns_after_an_hour() {
    let now = Utc::now();
    let mut limiter = MessageLimiter::new(1);

    assert!(limiter.can_send_at(now));
    limiter.update_at(now, 1);
    assert!(!limiter.can_send_at(now + Duration::minutes(5)));
    assert!(limiter.can_send_at(now + Duration::minutes(61)));
}
