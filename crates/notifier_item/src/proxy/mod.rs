//! Proxies for DBus services, so we can call them.
//!
//! The watcher proxy follows the `org.kde.StatusNotifierWatcher` interface description used by
//! [Waybar](https://github.com/Alexays/Waybar/tree/master/protocol). Only what an item needs is
//! declared here.
//!
//! For more information, see ["Writing a client proxy" in the zbus
//! tutorial](https://dbus2.github.io/zbus/).

mod dbus_status_notifier_watcher;
pub use dbus_status_notifier_watcher::*;
