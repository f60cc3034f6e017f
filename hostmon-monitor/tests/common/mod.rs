use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use hostmon_common::bus::StateReportEnvelope;
use hostmon_monitor::reporter::StateReporter;

/// Sink double that records every report it receives. When failing is
/// enabled it still records the attempt before returning an error, so tests
/// can assert that the monitor kept calling it.
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<StateReportEnvelope>>,
    failing: AtomicBool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn reports(&self) -> Vec<StateReportEnvelope> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateReporter for RecordingReporter {
    async fn report(&self, report: &StateReportEnvelope) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("sink unavailable"));
        }
        Ok(())
    }
}
