//! Cancellable debounced write scheduling.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Delays a pending value until a quiescence window elapses with no newer
/// input. Each `schedule` cancels the previously armed flush, so a burst of
/// inputs collapses into a single fire carrying the last value.
pub struct Debouncer {
    quiescence: Duration,
    pending: Option<CancellationToken>,
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl Debouncer {
    pub fn new(quiescence: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            quiescence,
            pending: None,
            tx,
            rx,
        }
    }

    /// Arm (or re-arm) the flush timer with a new pending value.
    pub fn schedule(&mut self, value: String) {
        self.cancel();

        let token = CancellationToken::new();
        let guard = token.clone();
        let tx = self.tx.clone();
        let quiescence = self.quiescence;

        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(quiescence) => {
                    let _ = tx.send(value).await;
                }
            }
        });

        self.pending = Some(token);
    }

    /// Cancel the armed flush, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Wait for the next value to survive the quiescence window.
    /// Cancel-safe; pends forever while nothing is scheduled.
    pub async fn fired(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const WINDOW: Duration = Duration::from_millis(30);

    #[tokio::test]
    async fn test_fires_after_quiescence() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("a".to_string());

        let value = timeout(Duration::from_millis(500), debouncer.fired())
            .await
            .unwrap();
        assert_eq!(value, Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_burst_collapses_to_last_value() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("a".to_string());
        debouncer.schedule("ab".to_string());
        debouncer.schedule("abc".to_string());

        let value = timeout(Duration::from_millis(500), debouncer.fired())
            .await
            .unwrap();
        assert_eq!(value, Some("abc".to_string()));

        // Nothing further survives the window.
        assert!(timeout(WINDOW * 3, debouncer.fired()).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_suppresses_fire() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("a".to_string());
        debouncer.cancel();

        assert!(timeout(WINDOW * 3, debouncer.fired()).await.is_err());
    }

    #[tokio::test]
    async fn test_reschedule_after_fire() {
        let mut debouncer = Debouncer::new(WINDOW);
        debouncer.schedule("a".to_string());
        assert_eq!(debouncer.fired().await, Some("a".to_string()));

        debouncer.schedule("b".to_string());
        assert_eq!(debouncer.fired().await, Some("b".to_string()));
    }
}
