use crate::*;

use std::sync::{Arc, Mutex, Weak};

/// Identifies one destruction callback registered on a [`NativeMenu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// The application's context menu, as provided by its toolkit.
///
/// Implementations must not run destruction callbacks from inside `connect_destroyed` or
/// `disconnect_destroyed`.
pub trait NativeMenu: Send + Sync {
    fn is_visible(&self) -> bool;
    fn popup(&self, position: Position);
    fn hide(&self);

    /// Run `callback` once, when the menu is destroyed by its owner.
    fn connect_destroyed(&self, callback: Box<dyn FnOnce() + Send>) -> WatchId;
    fn disconnect_destroyed(&self, watch: WatchId);
}

pub type MenuHandle = Arc<dyn NativeMenu>;

/// Publishes a [`NativeMenu`] as its own DBus object (usually `com.canonical.dbusmenu`).
pub trait MenuExporter: Send + Sync {
    fn export(&self, path: &str, menu: &MenuHandle, con: &zbus::Connection) -> Result<Box<dyn MenuExport>>;
}

/// A live export created by a [`MenuExporter`].
pub trait MenuExport: Send {
    /// Remove the exported object, freeing its path.
    fn unexport(self: Box<Self>);
}

fn same_menu(a: &MenuHandle, b: &MenuHandle) -> bool {
    // compare the data pointers only, vtables may be duplicated across codegen units
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[derive(Default)]
struct Bound {
    menu: Option<MenuHandle>,
    watch: Option<WatchId>,
    // bumped on every bind, so a late destruction callback can tell whether its menu is still bound
    generation: u64,
    export: Option<Box<dyn MenuExport>>,
}

impl Bound {
    fn path(&self) -> &'static str {
        if self.menu.is_some() {
            names::MENU_OBJECT
        } else {
            names::NO_MENU_OBJECT
        }
    }

    fn drop_export(&mut self) {
        if let Some(export) = self.export.take() {
            export.unexport();
        }
    }
}

/// Keeps at most one context menu exported at the item's menu path.
#[derive(Clone, Default)]
pub struct MenuBinding {
    inner: Arc<Mutex<Bound>>,
}

impl std::fmt::Debug for MenuBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuBinding").field("path", &self.path()).finish()
    }
}

impl MenuBinding {
    pub fn new() -> Self {
        Default::default()
    }

    /// The object path published in the item's `Menu` property.
    pub fn path(&self) -> &'static str {
        self.inner.lock().unwrap().path() // unwrap: mutex poisoning is okay
    }

    pub fn menu(&self) -> Option<MenuHandle> {
        self.inner.lock().unwrap().menu.clone() // unwrap: mutex poisoning is okay
    }

    /// Bind `menu` (or nothing) and export it through `export`.
    ///
    /// Returns `false` if `menu` is already bound. The previous export is always gone before the
    /// next one is created, since both live at the same path.
    pub fn bind<F>(&self, menu: Option<MenuHandle>, export: F) -> Result<bool>
    where
        F: FnOnce(&str, &MenuHandle) -> Result<Box<dyn MenuExport>>,
    {
        let mut guard = self.inner.lock().unwrap(); // unwrap: mutex poisoning is okay
        let bound = &mut *guard;

        let unchanged = match (&bound.menu, &menu) {
            (Some(old), Some(new)) => same_menu(old, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(false);
        }

        if let (Some(old), Some(watch)) = (&bound.menu, bound.watch.take()) {
            old.disconnect_destroyed(watch);
        }
        bound.menu = menu.clone();
        bound.generation += 1;
        bound.drop_export();

        let Some(menu) = menu else {
            log::info!("context menu removed, menu path is now {}", bound.path());
            return Ok(true);
        };

        bound.watch = Some(menu.connect_destroyed(Box::new(self.destroy_callback(bound.generation))));
        log::info!("exporting context menu at {}", bound.path());
        match export(bound.path(), &menu) {
            Ok(export) => {
                bound.export = Some(export);
                Ok(true)
            }
            Err(e) => {
                // nothing is served at the menu path, so don't advertise it
                log::warn!("failed to export context menu: {}", e);
                if let Some(watch) = bound.watch.take() {
                    menu.disconnect_destroyed(watch);
                }
                bound.menu = None;
                bound.generation += 1;
                Err(e)
            }
        }
    }

    /// Drop the bound menu, if any. Returns whether one was bound.
    pub fn unbind(&self) -> bool {
        // nothing is exported when binding no menu
        self.bind(None, |_, _| Err(Error::NoMenuExporter)).unwrap_or(false)
    }

    fn destroy_callback(&self, generation: u64) -> impl FnOnce() + Send + 'static {
        let inner: Weak<Mutex<Bound>> = Arc::downgrade(&self.inner);
        move || {
            if let Some(inner) = inner.upgrade() {
                MenuBinding { inner }.menu_destroyed(generation);
            }
        }
    }

    /// Same teardown as binding nothing, minus disconnecting from the menu that is already gone.
    fn menu_destroyed(&self, generation: u64) {
        let mut bound = self.inner.lock().unwrap(); // unwrap: mutex poisoning is okay
        if bound.generation != generation || bound.menu.is_none() {
            log::debug!("ignoring destruction of a menu that is no longer bound");
            return;
        }
        log::info!("context menu was destroyed by its owner");
        bound.menu = None;
        bound.watch = None;
        bound.drop_export();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rebinding_tears_down_before_exporting() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::new("a", &log);
        let b = FakeMenu::new("b", &log);

        assert_eq!(binding.path(), "/NO_DBUSMENU");
        assert!(binding.bind(Some(a.clone()), log.exporter("a")).unwrap());
        assert_eq!(binding.path(), "/MenuBar");
        assert!(binding.bind(Some(b.clone()), log.exporter("b")).unwrap());

        assert_eq!(log.take(), vec!["export a at /MenuBar", "unexport a", "export b at /MenuBar"]);
        assert_eq!(a.watch_count(), 0);
        assert_eq!(b.watch_count(), 1);
        assert!(same_menu(&binding.menu().unwrap(), &(b as MenuHandle)));
    }

    #[test]
    fn test_binding_the_same_menu_is_a_noop() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::new("a", &log);

        assert!(!binding.bind(None, log.exporter("none")).unwrap());
        assert!(binding.bind(Some(a.clone()), log.exporter("a")).unwrap());
        assert!(!binding.bind(Some(a.clone()), log.exporter("a")).unwrap());
        assert_eq!(log.take(), vec!["export a at /MenuBar"]);
        assert_eq!(a.watch_count(), 1);
    }

    #[test]
    fn test_unbinding_resets_the_path() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::new("a", &log);

        binding.bind(Some(a.clone()), log.exporter("a")).unwrap();
        assert!(binding.unbind());
        assert!(!binding.unbind());

        assert_eq!(binding.path(), "/NO_DBUSMENU");
        assert!(binding.menu().is_none());
        assert_eq!(a.watch_count(), 0);
        assert_eq!(log.take(), vec!["export a at /MenuBar", "unexport a"]);
    }

    #[test]
    fn test_destroyed_menu_is_unbound() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::new("a", &log);

        binding.bind(Some(a.clone()), log.exporter("a")).unwrap();
        a.destroy();

        assert_eq!(binding.path(), "/NO_DBUSMENU");
        assert!(binding.menu().is_none());
        assert_eq!(log.take(), vec!["export a at /MenuBar", "unexport a"]);

        // binding it again works as if it was fresh
        assert!(binding.bind(Some(FakeMenu::new("c", &log)), log.exporter("c")).unwrap());
    }

    #[test]
    fn test_stale_destruction_is_ignored() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::leaky("a", &log);
        let b = FakeMenu::new("b", &log);

        binding.bind(Some(a.clone()), log.exporter("a")).unwrap();
        binding.bind(Some(b.clone()), log.exporter("b")).unwrap();
        a.destroy();

        assert_eq!(binding.path(), "/MenuBar");
        assert!(same_menu(&binding.menu().unwrap(), &(b as MenuHandle)));
        assert_eq!(log.take(), vec!["export a at /MenuBar", "unexport a", "export b at /MenuBar"]);
    }

    #[test]
    fn test_failed_export_can_be_retried() {
        let log = EventLog::default();
        let binding = MenuBinding::new();
        let a = FakeMenu::new("a", &log);

        let result = binding.bind(Some(a.clone()), |path, _| {
            Err(Error::MenuExport { path: path.to_owned(), reason: "no bus".to_owned() })
        });
        assert!(matches!(result, Err(Error::MenuExport { .. })));
        assert_eq!(binding.path(), "/NO_DBUSMENU");
        assert!(binding.menu().is_none());
        assert_eq!(a.watch_count(), 0);

        assert!(binding.bind(Some(a.clone()), log.exporter("a")).unwrap());
        assert_eq!(binding.path(), "/MenuBar");
        assert_eq!(a.watch_count(), 1);
        assert_eq!(log.take(), vec!["export a at /MenuBar"]);
    }
}
