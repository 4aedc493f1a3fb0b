//! Hughes Power Watchdog integration: the monitoring switch, the coordinator
//! contract it drives, and the host platform pieces it plugs into.

pub mod config;
pub mod consts;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod hub;
pub mod switch;
pub mod utils;

pub use config::ConfigEntry;
pub use coordinator::{DeviceLink, LoopbackLink, MonitoringCoordinator, PowerWatchdogCoordinator};
pub use entity::{Entity, SwitchEntity, SwitchState};
pub use error::{WatchdogError, WatchdogResult};
pub use hub::Hub;
pub use switch::MonitoringSwitch;
