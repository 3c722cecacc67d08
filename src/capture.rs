//! Screen-check pipeline
//!
//! Bridges the global hotkey to the gateway's screen-check analysis,
//! independent of any learning session. A trigger captures the full screen,
//! submits it, and relays a notification to the presentation layer only
//! when the backend flags an issue. Failures are logged and dropped: this
//! is a best-effort side channel, not a reliable delivery path.

use crate::error::CaptureError;
use crate::gateway::Gateway;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Notification relayed to the presentation layer when a screen check
/// detects an issue. Carries the full backend payload.
#[derive(Clone, Debug)]
pub struct CaptureNotification {
    pub payload: serde_json::Map<String, serde_json::Value>,
}

type CaptureFn = Arc<dyn Fn() -> Result<String, CaptureError> + Send + Sync>;

/// Hotkey-to-gateway relay for screen checks.
///
/// Shares no state with the session controller; its only output is the
/// notification channel.
pub struct CapturePipeline {
    gateway: Arc<dyn Gateway>,
    notify_tx: mpsc::Sender<CaptureNotification>,
    capture: CaptureFn,
    in_flight: Arc<AtomicBool>,
    runtime: tokio::runtime::Handle,
}

impl CapturePipeline {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notify_tx: mpsc::Sender<CaptureNotification>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            gateway,
            notify_tx,
            capture: Arc::new(crate::screenshot::capture_screen_base64),
            in_flight: Arc::new(AtomicBool::new(false)),
            runtime,
        }
    }

    /// Handle one hotkey trigger.
    ///
    /// Returns immediately; capture and analysis run on a spawned task.
    /// Triggers arriving while a check is still outstanding are ignored.
    pub fn trigger(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Screen check already in flight, ignoring trigger");
            return;
        }

        let gateway = self.gateway.clone();
        let capture = self.capture.clone();
        let notify_tx = self.notify_tx.clone();
        let in_flight = self.in_flight.clone();
        self.runtime.spawn(async move {
            run_screen_check(gateway, capture, notify_tx).await;
            in_flight.store(false, Ordering::SeqCst);
        });
    }
}

/// Capture, submit, and relay. Every failure is absorbed here.
async fn run_screen_check(
    gateway: Arc<dyn Gateway>,
    capture: CaptureFn,
    notify_tx: mpsc::Sender<CaptureNotification>,
) {
    let encoded = match (capture)() {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!("Screen check capture failed: {}", e);
            return;
        }
    };

    match gateway.capture_analyze(&encoded).await {
        Ok(outcome) if outcome.issue_detected => {
            info!("Screen check detected an issue");
            let notification = CaptureNotification {
                payload: outcome.payload,
            };
            if notify_tx.send(notification).await.is_err() {
                warn!("Notification channel closed, dropping screen-check result");
            }
        }
        Ok(_) => {
            info!("Screen check clean, nothing to report");
        }
        Err(e) => {
            warn!("Screen check analysis failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::{Analysis, CaptureOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned gateway that only answers screen-check submissions, in queue
    /// order, and panics on anything else.
    #[derive(Default)]
    struct MockGateway {
        outcomes: Mutex<Vec<Result<CaptureOutcome, GatewayError>>>,
    }

    impl MockGateway {
        fn queued(outcomes: Vec<Result<CaptureOutcome, GatewayError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
            })
        }

        fn remaining(&self) -> usize {
            self.outcomes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        async fn analyze(&self, _url: &str) -> Result<Analysis, GatewayError> {
            panic!("Capture pipeline never analyzes content")
        }

        async fn chat(
            &self,
            _session_id: &str,
            _message: &str,
            _screenshot: &str,
        ) -> Result<String, GatewayError> {
            panic!("Capture pipeline never chats")
        }

        async fn suggestions(&self, _session_id: &str) -> Result<Vec<String>, GatewayError> {
            panic!("Capture pipeline never fetches suggestions")
        }

        async fn capture_analyze(
            &self,
            _screenshot: &str,
        ) -> Result<CaptureOutcome, GatewayError> {
            let mut outcomes = self.outcomes.lock().unwrap();
            assert!(!outcomes.is_empty(), "Unexpected capture_analyze call");
            outcomes.remove(0)
        }
    }

    fn issue_outcome(summary: &str) -> CaptureOutcome {
        let mut payload = serde_json::Map::new();
        payload.insert("summary".into(), serde_json::Value::String(summary.into()));
        CaptureOutcome {
            issue_detected: true,
            payload,
        }
    }

    fn clean_outcome() -> CaptureOutcome {
        CaptureOutcome {
            issue_detected: false,
            payload: serde_json::Map::new(),
        }
    }

    fn stub_capture() -> CaptureFn {
        Arc::new(|| Ok("aW1hZ2U=".to_string()))
    }

    fn pipeline_with(
        gateway: Arc<MockGateway>,
        capture: CaptureFn,
    ) -> (CapturePipeline, mpsc::Receiver<CaptureNotification>) {
        let (notify_tx, notify_rx) = mpsc::channel(8);
        let pipeline = CapturePipeline {
            gateway,
            notify_tx,
            capture,
            in_flight: Arc::new(AtomicBool::new(false)),
            runtime: tokio::runtime::Handle::current(),
        };
        (pipeline, notify_rx)
    }

    #[tokio::test]
    async fn test_issue_detected_emits_one_notification() {
        let gateway = MockGateway::queued(vec![Ok(issue_outcome("Compiler error on screen"))]);
        let (notify_tx, mut notify_rx) = mpsc::channel(8);

        run_screen_check(gateway, stub_capture(), notify_tx).await;

        let notification = notify_rx.try_recv().expect("Expected a notification");
        assert_eq!(
            notification.payload.get("summary").and_then(|v| v.as_str()),
            Some("Compiler error on screen")
        );
        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_clean_screen_emits_nothing() {
        let gateway = MockGateway::queued(vec![Ok(clean_outcome())]);
        let (notify_tx, mut notify_rx) = mpsc::channel(8);

        run_screen_check(gateway, stub_capture(), notify_tx).await;

        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_capture_failure_is_silently_dropped() {
        let gateway = MockGateway::queued(vec![]);
        let (notify_tx, mut notify_rx) = mpsc::channel(8);

        run_screen_check(
            gateway.clone(),
            Arc::new(|| Err(CaptureError::Capture("no display".into()))),
            notify_tx,
        )
        .await;

        assert!(notify_rx.try_recv().is_err());
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_silently_dropped() {
        let gateway = MockGateway::queued(vec![Err(GatewayError::Rejected {
            detail: "model overloaded".into(),
        })]);
        let (notify_tx, mut notify_rx) = mpsc::channel(8);

        run_screen_check(gateway, stub_capture(), notify_tx).await;

        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_ignored() {
        let gateway = MockGateway::queued(vec![
            Ok(issue_outcome("first")),
            Ok(issue_outcome("second")),
        ]);
        let (pipeline, mut notify_rx) = pipeline_with(gateway.clone(), stub_capture());

        pipeline.trigger();
        pipeline.trigger();

        let notification = tokio::time::timeout(Duration::from_secs(1), notify_rx.recv())
            .await
            .expect("Timed out waiting for notification")
            .expect("Channel closed");
        assert_eq!(
            notification.payload.get("summary").and_then(|v| v.as_str()),
            Some("first")
        );
        // The second trigger was dropped, so its outcome is still queued
        assert_eq!(gateway.remaining(), 1);

        // Once the first check completes, a new trigger goes through
        tokio::time::sleep(Duration::from_millis(20)).await;
        pipeline.trigger();
        let notification = tokio::time::timeout(Duration::from_secs(1), notify_rx.recv())
            .await
            .expect("Timed out waiting for notification")
            .expect("Channel closed");
        assert_eq!(
            notification.payload.get("summary").and_then(|v| v.as_str()),
            Some("second")
        );
    }
}
