use super::{DeviceLink, MonitoringCoordinator};
use crate::config::ConfigEntry;
use crate::consts::{CONNECTION_CHECK_INTERVAL, DOMAIN, MANUFACTURER, MODEL};
use crate::entity::DeviceInfo;
use crate::error::WatchdogResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// State shared with the background watchdog task
struct CoordinatorInner<L> {
    entry: ConfigEntry,
    link: Arc<L>,
    monitoring_enabled: AtomicBool,
    update_interval: Mutex<Option<Duration>>,
    /// Held across check-and-connect so overlapping refreshes open one link
    refresh_lock: tokio::sync::Mutex<()>,
}

impl<L: DeviceLink> CoordinatorInner<L> {
    fn address(&self) -> &str {
        self.entry.address()
    }

    fn is_enabled(&self) -> bool {
        self.monitoring_enabled.load(Ordering::SeqCst)
    }

    fn interval(&self) -> Option<Duration> {
        *self.update_interval.lock()
    }

    /// Connection check: reconnect when monitoring is on and the link dropped
    async fn refresh(&self) -> WatchdogResult<()> {
        if !self.is_enabled() {
            tracing::trace!("Monitoring disabled for {}, skipping refresh", self.address());
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;
        if self.link.is_connected() {
            tracing::trace!("Connection to {} is alive", self.address());
            return Ok(());
        }

        tracing::info!("Connecting to {}", self.address());
        self.link.connect().await?;
        tracing::info!("Connected to {}", self.address());
        Ok(())
    }
}

async fn run_watchdog<L: DeviceLink>(inner: Arc<CoordinatorInner<L>>) {
    tracing::debug!("Connection watchdog started for {}", inner.address());

    loop {
        let Some(interval) = inner.interval() else {
            break;
        };
        tokio::time::sleep(interval).await;

        if !inner.is_enabled() || inner.interval().is_none() {
            break;
        }

        if let Err(e) = inner.refresh().await {
            tracing::warn!("Connection check failed for {}: {}", inner.address(), e);
        }
    }

    tracing::debug!("Connection watchdog stopped for {}", inner.address());
}

/// Owns the connection to one Power Watchdog and its polling cadence
pub struct PowerWatchdogCoordinator<L: DeviceLink> {
    inner: Arc<CoordinatorInner<L>>,
    watchdog: Mutex<Option<JoinHandle<()>>>,
    device_info: DeviceInfo,
}

impl<L: DeviceLink> PowerWatchdogCoordinator<L> {
    pub fn new(entry: ConfigEntry, link: Arc<L>) -> Self {
        let address = entry.address().to_string();
        let device_info = DeviceInfo {
            identifiers: BTreeSet::from([(DOMAIN.to_string(), address.clone())]),
            connections: BTreeSet::from([("bluetooth".to_string(), address)]),
            name: entry.device_name().to_string(),
            manufacturer: MANUFACTURER.to_string(),
            model: MODEL.to_string(),
        };

        Self {
            inner: Arc::new(CoordinatorInner {
                entry,
                link,
                monitoring_enabled: AtomicBool::new(true),
                update_interval: Mutex::new(Some(CONNECTION_CHECK_INTERVAL)),
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
            watchdog: Mutex::new(None),
            device_info,
        }
    }

    pub fn config_entry(&self) -> &ConfigEntry {
        &self.inner.entry
    }

    pub fn link(&self) -> &Arc<L> {
        &self.inner.link
    }

    pub fn is_connected(&self) -> bool {
        self.inner.link.is_connected()
    }

    pub fn is_watchdog_running(&self) -> bool {
        self.watchdog
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn stop_watchdog(&self) {
        if let Some(handle) = self.watchdog.lock().take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl<L: DeviceLink> MonitoringCoordinator for PowerWatchdogCoordinator<L> {
    fn monitoring_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn update_interval(&self) -> Option<Duration> {
        self.inner.interval()
    }

    fn set_update_interval(&self, interval: Option<Duration>) {
        *self.inner.update_interval.lock() = interval;
    }

    fn start_monitoring(&self) {
        self.inner.monitoring_enabled.store(true, Ordering::SeqCst);
        self.stop_watchdog();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!(
                    "Cannot start connection watchdog for {}: {}",
                    self.inner.address(),
                    e
                );
                return;
            }
        };

        let handle = runtime.spawn(run_watchdog(Arc::clone(&self.inner)));
        *self.watchdog.lock() = Some(handle);
    }

    async fn async_disconnect(&self) -> WatchdogResult<()> {
        self.inner.monitoring_enabled.store(false, Ordering::SeqCst);
        self.stop_watchdog();

        if self.inner.link.is_connected() {
            self.inner.link.disconnect().await?;
            tracing::info!("Disconnected from {}", self.inner.address());
        }
        Ok(())
    }

    async fn async_refresh(&self) -> WatchdogResult<()> {
        self.inner.refresh().await
    }

    fn device_info(&self) -> DeviceInfo {
        self.device_info.clone()
    }

    fn address(&self) -> &str {
        self.inner.address()
    }

    fn entry_id(&self) -> &str {
        &self.inner.entry.entry_id
    }
}

impl<L: DeviceLink> Drop for PowerWatchdogCoordinator<L> {
    fn drop(&mut self) {
        self.stop_watchdog();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{LinkFailure, LoopbackLink};
    use crate::error::WatchdogError;

    const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    fn coordinator() -> PowerWatchdogCoordinator<LoopbackLink> {
        let entry = ConfigEntry::new("entry-1", ADDRESS).with_name("Pedestal");
        PowerWatchdogCoordinator::new(entry, Arc::new(LoopbackLink::new(ADDRESS)))
    }

    #[test]
    fn test_initial_state() {
        let coordinator = coordinator();
        assert!(coordinator.monitoring_enabled());
        assert_eq!(coordinator.update_interval(), Some(CONNECTION_CHECK_INTERVAL));
        assert!(!coordinator.is_connected());
        assert!(!coordinator.is_watchdog_running());
        assert_eq!(coordinator.entry_id(), "entry-1");

        let info = coordinator.device_info();
        assert_eq!(info.name, "Pedestal");
        assert_eq!(info.manufacturer, "Hughes");
        assert!(info
            .identifiers
            .contains(&(DOMAIN.to_string(), ADDRESS.to_string())));
    }

    #[test]
    fn test_start_monitoring_without_runtime() {
        let coordinator = coordinator();
        coordinator.start_monitoring();
        assert!(coordinator.monitoring_enabled());
        assert!(!coordinator.is_watchdog_running());
    }

    #[tokio::test]
    async fn test_refresh_connects_only_when_enabled() {
        let coordinator = coordinator();
        coordinator.async_refresh().await.unwrap();
        assert!(coordinator.is_connected());

        // Already connected: no second connect
        coordinator.async_refresh().await.unwrap();
        assert_eq!(coordinator.link().connect_count(), 1);

        coordinator.async_disconnect().await.unwrap();
        assert!(!coordinator.monitoring_enabled());
        assert!(!coordinator.is_connected());

        coordinator.async_refresh().await.unwrap();
        assert!(!coordinator.is_connected());
        assert_eq!(coordinator.link().connect_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_propagates_link_failure() {
        let coordinator = coordinator();
        coordinator
            .link()
            .fail_with(Some(LinkFailure::Connect("no advertisement".to_string())));

        let err = coordinator.async_refresh().await.unwrap_err();
        assert!(matches!(err, WatchdogError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_failure_keeps_monitoring_off() {
        let coordinator = coordinator();
        coordinator.async_refresh().await.unwrap();
        coordinator
            .link()
            .fail_with(Some(LinkFailure::Disconnect("busy".to_string())));

        let err = coordinator.async_disconnect().await.unwrap_err();
        assert!(matches!(err, WatchdogError::DisconnectFailed { .. }));
        assert!(!coordinator.monitoring_enabled());
    }

    /// Link whose connect takes a while, so refreshes can overlap
    struct SlowLink {
        connected: AtomicBool,
        connects: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl DeviceLink for SlowLink {
        async fn connect(&self) -> WatchdogResult<()> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&self) -> WatchdogResult<()> {
            self.connected.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_connect_once() {
        let link = Arc::new(SlowLink {
            connected: AtomicBool::new(false),
            connects: std::sync::atomic::AtomicUsize::new(0),
        });
        let coordinator =
            PowerWatchdogCoordinator::new(ConfigEntry::new("entry-1", ADDRESS), Arc::clone(&link));

        let (first, second) = tokio::join!(coordinator.async_refresh(), coordinator.async_refresh());
        first.unwrap();
        second.unwrap();

        assert!(coordinator.is_connected());
        assert_eq!(link.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_reconnects_dropped_link() {
        let coordinator = coordinator();
        coordinator.start_monitoring();
        assert!(coordinator.is_watchdog_running());
        assert!(!coordinator.is_connected());

        tokio::time::sleep(CONNECTION_CHECK_INTERVAL + Duration::from_millis(10)).await;
        assert!(coordinator.is_connected());

        // Device walks out of range
        coordinator.link().disconnect().await.unwrap();
        tokio::time::sleep(CONNECTION_CHECK_INTERVAL).await;
        assert!(coordinator.is_connected());
        assert_eq!(coordinator.link().connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_survives_failed_check() {
        let coordinator = coordinator();
        coordinator
            .link()
            .fail_with(Some(LinkFailure::Connect("timeout".to_string())));
        coordinator.start_monitoring();

        tokio::time::sleep(CONNECTION_CHECK_INTERVAL + Duration::from_millis(10)).await;
        assert!(!coordinator.is_connected());
        assert!(coordinator.is_watchdog_running());

        coordinator.link().fail_with(None);
        tokio::time::sleep(CONNECTION_CHECK_INTERVAL).await;
        assert!(coordinator.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_stops_when_interval_cleared() {
        let coordinator = coordinator();
        coordinator.start_monitoring();
        coordinator.set_update_interval(None);

        tokio::time::sleep(CONNECTION_CHECK_INTERVAL + Duration::from_millis(10)).await;
        assert!(!coordinator.is_watchdog_running());
        assert!(!coordinator.is_connected());
    }
}
