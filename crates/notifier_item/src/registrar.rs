use crate::*;

use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// Whether the item believes the current watcher knows about it.
///
/// Announcements are never confirmed, so `Registered` is optimistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Registration {
    #[default]
    Unregistered,
    Registered,
}

#[derive(Debug, Default)]
pub(crate) struct RegistrationTracker {
    state: Registration,
}

impl RegistrationTracker {
    pub fn state(&self) -> Registration {
        self.state
    }

    pub fn announced(&mut self) {
        self.state = Registration::Registered;
    }

    /// Handle an ownership change of the watcher's well-known name. Returns whether the item has to
    /// announce itself to the new owner.
    pub fn watcher_owner_changed(&mut self, new_owner: Option<&str>) -> bool {
        match new_owner {
            Some(owner) if !owner.is_empty() => true,
            // the watcher went away and took our registration with it
            _ => {
                self.state = Registration::Unregistered;
                false
            }
        }
    }
}

/// Keeps an item registered with the `StatusNotifierWatcher`.
///
/// The item announces itself once on start, and again every time the watcher's well-known name gets
/// a new owner, which is what happens when the host restarts.
#[derive(Debug)]
pub struct HostRegistrar {
    con: zbus::Connection,
    service: String,
    tracker: Arc<Mutex<RegistrationTracker>>,
    monitor: tokio::task::JoinHandle<()>,
}

impl HostRegistrar {
    /// Announce `service` to the watcher and start following the watcher's name.
    ///
    /// Only subscribing to `NameOwnerChanged` can fail; a missing watcher is not an error.
    pub async fn start(con: &zbus::Connection, service: &str) -> zbus::Result<Self> {
        let dbus = zbus::fdo::DBusProxy::new(con).await?;
        let mut owner_changes = dbus.receive_name_owner_changed_with_args(&[(0, names::WATCHER_BUS)]).await?;

        let tracker = Arc::new(Mutex::new(RegistrationTracker::default()));
        announce(con, service, &tracker);

        let monitor = tokio::spawn({
            let con = con.to_owned();
            let service = service.to_owned();
            let tracker = tracker.clone();
            async move {
                while let Some(sig) = owner_changes.next().await {
                    let args = match sig.args() {
                        Ok(args) => args,
                        Err(e) => {
                            log::warn!("malformed NameOwnerChanged for {}: {}", names::WATCHER_BUS, e);
                            continue;
                        }
                    };
                    let new_owner = Option::as_ref(args.new_owner()).map(|owner| owner.as_str());
                    log::debug!("{} is now owned by {:?}", names::WATCHER_BUS, new_owner);

                    follow_owner_change(&tracker, new_owner, || announce(&con, &service, &tracker));
                }
                log::debug!("stopped following {}", names::WATCHER_BUS);
            }
        });

        Ok(Self { con: con.to_owned(), service: service.to_owned(), tracker, monitor })
    }

    /// Send `RegisterStatusNotifierItem` without waiting for the answer.
    pub fn announce_to_host(&self) {
        announce(&self.con, &self.service, &self.tracker);
    }

    pub fn registration(&self) -> Registration {
        self.tracker.lock().unwrap().state() // unwrap: mutex poisoning is okay
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Stop following the watcher. Registrations already sent are not revoked.
    pub fn stop(&self) {
        self.monitor.abort();
    }
}

impl Drop for HostRegistrar {
    fn drop(&mut self) {
        self.monitor.abort();
    }
}

/// Feed a new owner of the watcher name into `tracker`, calling `announce` if the new owner has to
/// hear about the item. Returns whether it was called.
fn follow_owner_change(tracker: &Mutex<RegistrationTracker>, new_owner: Option<&str>, announce: impl FnOnce()) -> bool {
    let reannounce = tracker.lock().unwrap().watcher_owner_changed(new_owner); // unwrap: mutex poisoning is okay
    if reannounce {
        announce();
    }
    reannounce
}

fn announce(con: &zbus::Connection, service: &str, tracker: &Mutex<RegistrationTracker>) {
    tracker.lock().unwrap().announced(); // unwrap: mutex poisoning is okay

    let con = con.to_owned();
    let service = service.to_owned();
    tokio::spawn(async move {
        // no host yet is fine, we'll hear about it when it shows up
        match register_item(&con, &service).await {
            Ok(true) => log::info!("registered {} with {}", service, names::WATCHER_BUS),
            Ok(false) => log::info!("registered {} with {}, but no host is showing items yet", service, names::WATCHER_BUS),
            Err(e) => log::debug!("could not register {} with {}: {}", service, names::WATCHER_BUS, e),
        }
    });
}

/// Returns whether the watcher has a host to show the item.
async fn register_item(con: &zbus::Connection, service: &str) -> zbus::Result<bool> {
    let snw = proxy::StatusNotifierWatcherProxy::builder(con).cache_properties(zbus::proxy::CacheProperties::No).build().await?;
    snw.register_status_notifier_item(service).await?;
    snw.is_status_notifier_host_registered().await
}
