//! Application side of the [StatusNotifierItem] protocol.
//!
//! A [`StatusNotifierItem`] owns a dedicated DBus connection, serves
//! `org.kde.StatusNotifierItem` at `/StatusNotifierItem` on it and keeps itself registered with
//! the `org.kde.StatusNotifierWatcher`, including after the watcher restarts.
//!
//! [StatusNotifierItem]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/

pub mod dbus;
pub mod proxy;

mod adapter;

mod error;
pub use error::*;

mod events;
pub use events::*;

mod icon;
pub use icon::*;

mod item;
pub use item::*;

mod menu;
pub use menu::*;

mod registrar;
pub use registrar::*;

mod state;
pub use state::*;

#[cfg(test)]
mod test_util;

pub(crate) mod names {
    pub const WATCHER_BUS: &str = "org.kde.StatusNotifierWatcher";

    pub const ITEM_SERVICE_PREFIX: &str = "org.freedesktop.StatusNotifierItem";
    pub const ITEM_OBJECT: &str = "/StatusNotifierItem";

    pub const MENU_OBJECT: &str = "/MenuBar";
    pub const NO_MENU_OBJECT: &str = "/NO_DBUSMENU";
}
