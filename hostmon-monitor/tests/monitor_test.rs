// Poll-loop behavior against the in-memory provider and a recording sink.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use common::RecordingReporter;
use hostmon_common::{NodeState, NODE_ID_METADATA_KEY};
use hostmon_monitor::monitor::StatusMonitor;
use hostmon_providers::mock::MockProvider;

fn correlated(node_id: &str) -> HashMap<String, String> {
    HashMap::from([(NODE_ID_METADATA_KEY.to_string(), node_id.to_string())])
}

fn monitor_over(
    provider: &Arc<MockProvider>,
    reporter: &Arc<RecordingReporter>,
    interval: Duration,
) -> StatusMonitor {
    StatusMonitor::new(provider.clone(), reporter.clone(), interval)
}

#[tokio::test]
async fn a_pass_reports_only_servers_with_a_node_id() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));
    provider.push_server("i2", "SHUTOFF", HashMap::new());

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_over(&provider, &reporter, Duration::from_secs(5));

    let reported = monitor.report_all_servers().await;

    assert_eq!(reported, 1);
    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].instance_id, "i1");
    assert_eq!(reports[0].node_id, "n1");
    assert_eq!(reports[0].state, NodeState::Running);
}

#[tokio::test]
async fn a_stopped_server_is_reported_as_not_running() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "SHUTOFF", correlated("n1"));

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_over(&provider, &reporter, Duration::from_secs(5));

    monitor.report_all_servers().await;

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].state, NodeState::NotRunning);
}

#[tokio::test]
async fn unchanged_state_is_reported_again_every_pass() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_over(&provider, &reporter, Duration::from_secs(5));

    for _ in 0..3 {
        monitor.report_all_servers().await;
    }

    // No dedup: three ticks of unchanged state mean three identical reports.
    let reports = reporter.reports();
    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert_eq!(report.instance_id, "i1");
        assert_eq!(report.node_id, "n1");
        assert_eq!(report.state, NodeState::Running);
    }
}

#[tokio::test]
async fn a_list_failure_yields_an_empty_tick_and_the_next_tick_recovers() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));
    provider.fail_next_list("connection timed out");

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_over(&provider, &reporter, Duration::from_secs(5));

    assert_eq!(monitor.report_all_servers().await, 0);
    assert!(reporter.reports().is_empty());

    assert_eq!(monitor.report_all_servers().await, 1);
    assert_eq!(reporter.reports().len(), 1);
}

#[tokio::test]
async fn a_failing_sink_does_not_abort_the_pass() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));
    provider.push_server("i2", "ACTIVE", correlated("n2"));

    let reporter = Arc::new(RecordingReporter::new());
    reporter.fail_all();
    let monitor = monitor_over(&provider, &reporter, Duration::from_secs(5));

    // Both servers are still offered to the sink even though every call fails.
    assert_eq!(monitor.report_all_servers().await, 2);
    assert_eq!(reporter.reports().len(), 2);
}

#[tokio::test]
async fn cancellation_stops_the_loop_after_the_current_tick() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = Arc::new(monitor_over(&provider, &reporter, Duration::from_millis(10)));

    let shutdown = CancellationToken::new();
    let task = {
        let monitor = monitor.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { monitor.run(shutdown).await })
    };

    // Let a few ticks happen, then stop.
    tokio::time::sleep(Duration::from_millis(35)).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("monitor did not stop after cancellation")
        .unwrap();

    let count_at_exit = reporter.reports().len();
    assert!(count_at_exit >= 1, "expected at least one tick before shutdown");

    // No further ticks begin once the loop has exited.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(reporter.reports().len(), count_at_exit);
}

#[tokio::test]
async fn cancelling_before_start_prevents_any_tick() {
    let provider = Arc::new(MockProvider::new());
    provider.push_server("i1", "ACTIVE", correlated("n1"));

    let reporter = Arc::new(RecordingReporter::new());
    let monitor = monitor_over(&provider, &reporter, Duration::from_millis(10));

    let shutdown = CancellationToken::new();
    shutdown.cancel();
    monitor.run(shutdown).await;

    assert!(reporter.reports().is_empty());
}
