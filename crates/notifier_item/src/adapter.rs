use crate::*;

use std::{
    future::Future,
    sync::{Mutex, MutexGuard},
};

/// Where change signals go. On the bus this is the item's [`zbus::SignalContext`].
pub(crate) trait FacetSink: Sync {
    fn facet_changed(&self, facet: Facet) -> impl Future<Output = zbus::Result<()>> + Send;
}

/// State, menu and listeners of one item, shared between the public handle and the served
/// interface.
#[derive(Debug)]
pub(crate) struct ItemCore {
    // never held across an await
    state: Mutex<ItemState>,
    menu: MenuBinding,
    listeners: Listeners,
}

impl ItemCore {
    pub fn new(state: ItemState) -> Self {
        Self { state: Mutex::new(state), menu: MenuBinding::new(), listeners: Listeners::default() }
    }

    pub fn state(&self) -> MutexGuard<'_, ItemState> {
        self.state.lock().unwrap() // unwrap: mutex poisoning is okay
    }

    pub fn menu(&self) -> &MenuBinding {
        &self.menu
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Mutate the state without telling anyone. Returns whether anything changed.
    pub fn apply(&self, change: impl FnOnce(&mut ItemState) -> bool) -> bool {
        change(&mut *self.state())
    }

    /// Emit `facet` if `changed`, passing `changed` through.
    pub async fn publish<S: FacetSink>(&self, sink: &S, changed: bool, facet: Facet) -> zbus::Result<bool> {
        if changed {
            sink.facet_changed(facet).await?;
        }
        Ok(changed)
    }

    pub async fn update<S, F>(&self, sink: &S, facet: Facet, change: F) -> zbus::Result<bool>
    where
        S: FacetSink,
        F: FnOnce(&mut ItemState) -> bool,
    {
        let changed = self.apply(change);
        self.publish(sink, changed, facet).await
    }

    pub async fn set_status<S: FacetSink>(&self, sink: &S, status: Status) -> zbus::Result<bool> {
        self.update(sink, Facet::Status(status), |state| state.set_status(status)).await
    }

    async fn acknowledge_attention<S: FacetSink>(&self, sink: &S) -> zbus::Result<()> {
        if self.apply(ItemState::acknowledge_attention) {
            log::debug!("attention acknowledged, status is back to {}", Status::Active);
            sink.facet_changed(Facet::Status(Status::Active)).await?;
        }
        Ok(())
    }

    pub async fn activate<S: FacetSink>(&self, sink: &S, position: Position) -> zbus::Result<()> {
        self.acknowledge_attention(sink).await?;
        self.listeners.activate_requested(position);
        Ok(())
    }

    pub async fn secondary_activate<S: FacetSink>(&self, sink: &S, position: Position) -> zbus::Result<()> {
        self.acknowledge_attention(sink).await?;
        self.listeners.secondary_activate_requested(position);
        Ok(())
    }

    pub fn scroll(&self, delta: i32, orientation: &str) {
        self.listeners.scroll_requested(delta, Orientation::from_dbus(orientation));
    }

    /// A visible menu is moved to `position`, a hidden one is hidden again.
    pub fn context_menu(&self, position: Position) {
        let Some(menu) = self.menu.menu() else {
            log::debug!("context menu requested, but no menu is bound");
            return;
        };
        if menu.is_visible() {
            menu.popup(position);
        } else {
            menu.hide();
        }
    }
}
