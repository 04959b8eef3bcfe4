//! Change notification for sidebar consumers.
//!
//! Anything that changes what the sidebar should show (a new snapshot, an
//! account going active or inactive, the read filter toggling) is published
//! as a [`SidebarEvent`]. Subscribers re-run reconciliation on receipt.

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    /// The snapshot backing the sidebar was replaced.
    SnapshotChanged,
    /// The default account was activated or deactivated.
    AccountActivityChanged { active: bool },
    /// The read filter or its exceptions changed.
    FilterChanged,
}

/// Fan-out of sidebar events to any number of subscribers.
///
/// Cloning the hub shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<SidebarEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SidebarEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: SidebarEvent) -> usize {
        match self.tx.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "No subscribers for sidebar event");
                0
            }
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(16)
    }
}

/// Hex SHA-256 of a snapshot file's bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Polls a snapshot file and publishes [`SidebarEvent::SnapshotChanged`]
/// whenever its contents change.
///
/// A file that disappears counts as a change; so does one that reappears.
#[derive(Debug)]
pub struct SnapshotWatcher {
    path: PathBuf,
    interval: Duration,
    hub: EventHub,
    last: Option<String>,
}

impl SnapshotWatcher {
    pub fn new(path: impl Into<PathBuf>, interval: Duration, hub: EventHub) -> Self {
        Self {
            path: path.into(),
            interval: interval.max(Duration::from_millis(10)),
            hub,
            last: None,
        }
    }

    /// Record the file's current contents without publishing anything.
    pub async fn prime(&mut self) -> std::io::Result<()> {
        self.last = self.read_fingerprint().await?;
        Ok(())
    }

    /// Compare the file against the last observation. Publishes and returns
    /// true when it changed.
    pub async fn poll_once(&mut self) -> std::io::Result<bool> {
        let current = self.read_fingerprint().await?;
        Ok(self.observe(current))
    }

    /// Poll every `interval` until the task is dropped.
    ///
    /// Read errors other than a missing file are logged and retried on the
    /// next tick.
    pub async fn run(mut self) {
        if let Err(e) = self.prime().await {
            tracing::warn!(path = %self.path.display(), error = %e, "Initial snapshot read failed");
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once().await {
                tracing::warn!(path = %self.path.display(), error = %e, "Snapshot poll failed");
            }
        }
    }

    fn observe(&mut self, current: Option<String>) -> bool {
        if current == self.last {
            return false;
        }
        tracing::debug!(
            path = %self.path.display(),
            present = current.is_some(),
            "Snapshot changed"
        );
        self.last = current;
        self.hub.publish(SidebarEvent::SnapshotChanged);
        true
    }

    async fn read_fingerprint(&self) -> std::io::Result<Option<String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(fingerprint(&bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("feedtree_test_events");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = EventHub::new(4);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        assert_eq!(hub.publish(SidebarEvent::FilterChanged), 2);
        assert_eq!(a.recv().await.unwrap(), SidebarEvent::FilterChanged);
        assert_eq!(b.recv().await.unwrap(), SidebarEvent::FilterChanged);
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let hub = EventHub::default();
        assert_eq!(
            hub.publish(SidebarEvent::AccountActivityChanged { active: false }),
            0
        );
    }

    #[test]
    fn test_observe_publishes_only_on_change() {
        let hub = EventHub::new(8);
        let mut rx = hub.subscribe();
        let mut watcher = SnapshotWatcher::new("unused.toml", Duration::from_secs(1), hub);

        assert!(watcher.observe(Some("one".to_string())));
        assert!(!watcher.observe(Some("one".to_string())));
        assert!(watcher.observe(None));
        assert!(watcher.observe(Some("two".to_string())));

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[tokio::test]
    async fn test_poll_detects_file_edits() {
        let path = temp_path("poll.toml");
        std::fs::write(&path, "[[smart_feeds]]\nid = \"today\"\nname = \"Today\"\n").unwrap();

        let mut watcher = SnapshotWatcher::new(&path, Duration::from_secs(1), EventHub::new(4));
        watcher.prime().await.unwrap();
        assert!(!watcher.poll_once().await.unwrap());

        std::fs::write(&path, "").unwrap();
        assert!(watcher.poll_once().await.unwrap());
        assert!(!watcher.poll_once().await.unwrap());

        std::fs::remove_file(&path).unwrap();
        assert!(watcher.poll_once().await.unwrap());
    }

    #[tokio::test]
    async fn test_run_publishes_snapshot_changed() {
        let path = temp_path("run.toml");
        std::fs::write(&path, "accounts = []\n").unwrap();

        let hub = EventHub::new(4);
        let mut rx = hub.subscribe();
        let watcher = SnapshotWatcher::new(&path, Duration::from_millis(20), hub);
        let task = tokio::spawn(watcher.run());

        // Give the watcher time to prime before editing
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "smart_feeds = []\naccounts = []\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, SidebarEvent::SnapshotChanged);

        task.abort();
        let _ = std::fs::remove_file(&path);
    }
}
