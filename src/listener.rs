use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::correlation::{Correlator, DelayToken, FinishOutcome};
use crate::metrics::Metrics;
use crate::store::StoreNotice;

/// Extracts the delay token from a "finished processing" message: everything
/// after the first space.
pub fn parse_finished_message(message: &str) -> Option<DelayToken> {
    let (_, token) = message.split_once(' ')?;
    if token.is_empty() {
        return None;
    }
    Some(DelayToken::new(token))
}

/// Handles the store's out-of-band notices that a delayed write has finished.
#[derive(Clone)]
pub struct NotificationListener {
    correlator: Arc<Correlator>,
}

impl NotificationListener {
    pub fn new(correlator: Arc<Correlator>) -> Self {
        Self { correlator }
    }

    /// Returns `None` when the message carries no token.
    pub fn handle(&self, message: &str) -> Option<FinishOutcome> {
        let Some(token) = parse_finished_message(message) else {
            Metrics::notification_malformed();
            warn!("ignoring finished notice without a delay token: {:?}", message);
            return None;
        };

        info!(token = %token, "delayed write finished executing");
        Some(self.correlator.finish(token))
    }

    /// Drains the store's notice channel until it closes. Notices queued
    /// before the listener starts are delivered in order.
    pub async fn run(self, mut notices: mpsc::UnboundedReceiver<StoreNotice>) {
        while let Some(notice) = notices.recv().await {
            debug!(received_at = %notice.received_at, "store notice received");
            self.handle(&notice.message);
        }
        info!("store notice channel closed, notification listener stopping");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_case::test_case;

    use super::*;

    fn listener() -> (NotificationListener, Arc<Correlator>) {
        let correlator = Arc::new(Correlator::new(None, Duration::from_secs(60), 16));
        (NotificationListener::new(correlator.clone()), correlator)
    }

    #[test_case("finishedProcessing 1571158123", Some("1571158123") ; "timestamp token")]
    #[test_case("done 2019-10-15 16:42:03.123", Some("2019-10-15 16:42:03.123") ; "token keeps later spaces")]
    #[test_case("finishedProcessing", None ; "no space")]
    #[test_case("finishedProcessing ", None ; "empty token")]
    fn parse_finished_message_takes_text_after_first_space(message: &str, expected: Option<&str>) {
        assert_eq!(
            parse_finished_message(message),
            expected.map(DelayToken::from)
        );
    }

    #[test]
    fn handle_records_early_finish_without_waiter() {
        let (listener, correlator) = listener();

        let outcome = listener.handle("finishedProcessing T2");

        assert_eq!(outcome, Some(FinishOutcome::RecordedEarly { evicted: None }));
        assert!(correlator.is_early_finished(&"T2".into()));
    }

    #[test]
    fn handle_ignores_malformed_message() {
        let (listener, correlator) = listener();
        assert_eq!(listener.handle("finishedProcessing"), None);
        assert_eq!(correlator.snapshot().early_finishes, 0);
    }

    #[tokio::test]
    async fn run_drains_channel_until_closed() {
        let (listener, correlator) = listener();
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(StoreNotice::new("finishedProcessing A")).expect("send");
        tx.send(StoreNotice::new("finishedProcessing B")).expect("send");
        drop(tx);

        listener.run(rx).await;

        assert!(correlator.is_early_finished(&"A".into()));
        assert!(correlator.is_early_finished(&"B".into()));
    }
}
