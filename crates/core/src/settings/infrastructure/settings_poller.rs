use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::settings::domain::detection_settings::DetectionSettings;
use crate::settings::domain::settings_source::SettingsSource;

/// Polls a [`SettingsSource`] on its own thread.
///
/// Fetches once at start, then every `interval`. Successful fetches are
/// delivered through [`SettingsPoller::receiver`], which holds at most one
/// pending value: a newer fetch replaces one the frame loop has not taken
/// yet. Failed fetches are logged and dropped, so the consumer keeps its
/// last-known-good settings.
pub struct SettingsPoller {
    receiver: Receiver<DetectionSettings>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SettingsPoller {
    pub fn spawn(source: Box<dyn SettingsSource>, interval: Duration) -> Self {
        let (settings_tx, receiver) = crossbeam_channel::bounded(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = spawn_poller(source, interval, settings_tx, receiver.clone(), stop_rx);
        Self {
            receiver,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn receiver(&self) -> Receiver<DetectionSettings> {
        self.receiver.clone()
    }

    /// Stops the poller thread and waits for it to exit.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the stop channel.
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Settings poller thread panicked");
            }
        }
    }
}

impl Drop for SettingsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_poller(
    source: Box<dyn SettingsSource>,
    interval: Duration,
    settings_tx: Sender<DetectionSettings>,
    stale_rx: Receiver<DetectionSettings>,
    stop_rx: Receiver<()>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let ticker = crossbeam_channel::tick(interval);
        let mut failing = false;
        loop {
            match source.fetch() {
                Ok(settings) => {
                    if failing {
                        log::info!("Settings endpoint reachable again");
                        failing = false;
                    }
                    if !publish_latest(&settings_tx, &stale_rx, settings) {
                        break;
                    }
                }
                Err(e) if !failing => {
                    log::warn!("Settings fetch failed, keeping last settings: {e}");
                    failing = true;
                }
                Err(e) => log::debug!("Settings fetch failed: {e}"),
            }

            crossbeam_channel::select! {
                recv(ticker) -> _ => {}
                recv(stop_rx) -> _ => break,
            }
        }
    })
}

/// Sends `settings`, discarding a pending value the consumer has not taken.
/// Returns `false` once the consumer is gone.
fn publish_latest(
    tx: &Sender<DetectionSettings>,
    stale_rx: &Receiver<DetectionSettings>,
    settings: DetectionSettings,
) -> bool {
    match tx.try_send(settings) {
        Ok(()) => true,
        Err(TrySendError::Full(settings)) => {
            let _ = stale_rx.try_recv();
            tx.try_send(settings).is_ok()
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SettingsSource for CountingSource {
        fn fetch(&self) -> Result<DetectionSettings, Box<dyn std::error::Error>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("unreachable".into());
            }
            Ok(DetectionSettings {
                reset_token: n as i64,
                ..DetectionSettings::default()
            })
        }
    }

    #[test]
    fn test_fetches_immediately_on_spawn() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = SettingsPoller::spawn(
            Box::new(CountingSource {
                calls: calls.clone(),
                fail: false,
            }),
            Duration::from_secs(60),
        );
        let first = poller
            .receiver()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(first.reset_token, 0);
        poller.stop();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_polls_repeatedly() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poller = SettingsPoller::spawn(
            Box::new(CountingSource {
                calls: calls.clone(),
                fail: false,
            }),
            Duration::from_millis(10),
        );
        let rx = poller.receiver();
        let a = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let b = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(b.reset_token > a.reset_token);
    }

    #[test]
    fn test_failures_deliver_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = SettingsPoller::spawn(
            Box::new(CountingSource {
                calls: calls.clone(),
                fail: true,
            }),
            Duration::from_millis(5),
        );
        std::thread::sleep(Duration::from_millis(50));
        poller.stop();
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert!(poller.receiver().try_recv().is_err());
    }

    #[test]
    fn test_slow_consumer_sees_only_latest_settings() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = SettingsPoller::spawn(
            Box::new(CountingSource {
                calls: calls.clone(),
                fail: false,
            }),
            Duration::from_millis(5),
        );
        std::thread::sleep(Duration::from_millis(60));
        poller.stop();

        let pending: Vec<_> = poller.receiver().try_iter().collect();
        assert_eq!(pending.len(), 1);
        let last_fetch = calls.load(Ordering::SeqCst) - 1;
        assert_eq!(pending[0].reset_token, last_fetch as i64);
    }
}
