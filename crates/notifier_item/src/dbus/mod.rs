//! # Served DBus interfaces
//!
//! The `org.kde.StatusNotifierItem` interface follows the description in
//! [Waybar](https://github.com/Alexays/Waybar/tree/master/protocol). Every item serves exactly one
//! instance of it, at `/StatusNotifierItem` on its own connection.

mod status_notifier_item;
pub use status_notifier_item::*;
