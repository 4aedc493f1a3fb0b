// Coordinator modules
pub mod link;
pub mod watchdog;

pub use link::{DeviceLink, LinkFailure, LoopbackLink};
pub use watchdog::PowerWatchdogCoordinator;

use crate::entity::DeviceInfo;
use crate::error::WatchdogResult;
use async_trait::async_trait;
use std::time::Duration;

/// What entities need from the component that owns a device connection.
///
/// Implementations serialize their own internal operations; callers hold a
/// shared handle and never lock around these calls.
#[async_trait]
pub trait MonitoringCoordinator: Send + Sync {
    fn monitoring_enabled(&self) -> bool;

    fn update_interval(&self) -> Option<Duration>;

    /// `None` disables periodic refresh
    fn set_update_interval(&self, interval: Option<Duration>);

    /// (Re)start background monitoring and the connection process
    fn start_monitoring(&self);

    /// Stop monitoring, disconnect and release resources
    async fn async_disconnect(&self) -> WatchdogResult<()>;

    /// Run one refresh immediately and wait for it
    async fn async_refresh(&self) -> WatchdogResult<()>;

    fn device_info(&self) -> DeviceInfo;

    fn address(&self) -> &str;

    fn entry_id(&self) -> &str;
}
