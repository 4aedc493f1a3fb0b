use crate::error::{WatchdogError, WatchdogResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Transport to a single power monitor
#[async_trait]
pub trait DeviceLink: Send + Sync + 'static {
    async fn connect(&self) -> WatchdogResult<()>;

    async fn disconnect(&self) -> WatchdogResult<()>;

    fn is_connected(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFailure {
    Connect(String),
    Disconnect(String),
}

/// In-memory link with no radio behind it.
///
/// Used by the CLI and tests; failures can be injected per direction.
pub struct LoopbackLink {
    address: String,
    connected: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    failure: Mutex<Option<LinkFailure>>,
}

impl LoopbackLink {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connected: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, failure: Option<LinkFailure>) {
        *self.failure.lock() = failure;
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceLink for LoopbackLink {
    async fn connect(&self) -> WatchdogResult<()> {
        let failure = self.failure.lock().clone();
        if let Some(LinkFailure::Connect(reason)) = failure {
            return Err(WatchdogError::ConnectionFailed {
                address: self.address.clone(),
                reason,
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Loopback link to {} connected", self.address);
        Ok(())
    }

    async fn disconnect(&self) -> WatchdogResult<()> {
        let failure = self.failure.lock().clone();
        if let Some(LinkFailure::Disconnect(reason)) = failure {
            return Err(WatchdogError::DisconnectFailed {
                address: self.address.clone(),
                reason,
            });
        }
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        tracing::debug!("Loopback link to {} disconnected", self.address);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_disconnect_counts() {
        let link = LoopbackLink::new("AA:BB:CC:DD:EE:FF");
        link.connect().await.unwrap();
        assert!(link.is_connected());
        link.disconnect().await.unwrap();
        assert!(!link.is_connected());
        assert_eq!(link.connect_count(), 1);
        assert_eq!(link.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let link = LoopbackLink::new("AA:BB:CC:DD:EE:FF");
        link.fail_with(Some(LinkFailure::Connect("out of range".to_string())));

        let err = link.connect().await.unwrap_err();
        assert!(matches!(err, WatchdogError::ConnectionFailed { ref reason, .. } if reason == "out of range"));
        assert!(!link.is_connected());

        // Disconnect still works while only connect is failing
        link.disconnect().await.unwrap();

        link.fail_with(Some(LinkFailure::Disconnect("busy".to_string())));
        assert!(matches!(
            link.disconnect().await,
            Err(WatchdogError::DisconnectFailed { .. })
        ));
        link.fail_with(None);
        link.connect().await.unwrap();
        assert_eq!(link.connect_count(), 1);
    }
}
