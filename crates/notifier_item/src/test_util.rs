use crate::*;

use futures::StreamExt;

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

/// Ordered record of everything the fakes below were asked to do.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn exporter(&self, name: &'static str) -> impl FnOnce(&str, &MenuHandle) -> Result<Box<dyn MenuExport>> {
        let log = self.clone();
        move |path, _| {
            log.push(format!("export {name} at {path}"));
            Ok(Box::new(FakeExport { name, log }) as Box<dyn MenuExport>)
        }
    }
}

pub struct FakeExport {
    name: &'static str,
    log: EventLog,
}

impl MenuExport for FakeExport {
    fn unexport(self: Box<Self>) {
        self.log.push(format!("unexport {}", self.name));
    }
}

pub struct FakeMenu {
    name: &'static str,
    log: EventLog,
    visible: AtomicBool,
    // a leaky menu keeps its destruction callbacks even after being told to drop them
    leaky: bool,
    next_watch: AtomicU64,
    watches: Mutex<HashMap<u64, Box<dyn FnOnce() + Send>>>,
}

impl FakeMenu {
    pub fn new(name: &'static str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
            visible: AtomicBool::new(false),
            leaky: false,
            next_watch: AtomicU64::new(0),
            watches: Mutex::new(HashMap::new()),
        })
    }

    pub fn leaky(name: &'static str, log: &EventLog) -> Arc<Self> {
        let mut menu = Self::new(name, log);
        Arc::get_mut(&mut menu).unwrap().leaky = true;
        menu
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn watch_count(&self) -> usize {
        self.watches.lock().unwrap().len()
    }

    /// Destroy the menu the way its owner would, running every registered callback.
    pub fn destroy(&self) {
        let callbacks: Vec<_> = self.watches.lock().unwrap().drain().map(|(_, f)| f).collect();
        for f in callbacks {
            f();
        }
    }
}

impl NativeMenu for FakeMenu {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    fn popup(&self, position: Position) {
        self.log.push(format!("popup {} at {},{}", self.name, position.x, position.y));
        self.set_visible(true);
    }

    fn hide(&self) {
        self.log.push(format!("hide {}", self.name));
        self.set_visible(false);
    }

    fn connect_destroyed(&self, callback: Box<dyn FnOnce() + Send>) -> WatchId {
        let id = self.next_watch.fetch_add(1, Ordering::Relaxed);
        self.watches.lock().unwrap().insert(id, callback);
        WatchId(id)
    }

    fn disconnect_destroyed(&self, watch: WatchId) {
        if !self.leaky {
            self.watches.lock().unwrap().remove(&watch.0);
        }
    }
}

/// What a host sees of an item, minus the caching.
#[zbus::proxy(
    interface = "org.kde.StatusNotifierItem",
    default_service = "org.freedesktop.StatusNotifierItem-test",
    default_path = "/StatusNotifierItem"
)]
pub trait Item {
    fn activate(&self, x: i32, y: i32) -> zbus::Result<()>;
    fn context_menu(&self, x: i32, y: i32) -> zbus::Result<()>;
    fn scroll(&self, delta: i32, orientation: &str) -> zbus::Result<()>;

    #[zbus(property)]
    fn category(&self) -> zbus::Result<String>;
    #[zbus(property)]
    fn icon_name(&self) -> zbus::Result<String>;
    #[zbus(property)]
    fn icon_pixmap(&self) -> zbus::Result<Vec<(i32, i32, Vec<u8>)>>;
    #[zbus(property)]
    fn id(&self) -> zbus::Result<String>;
    #[zbus(property)]
    fn item_is_menu(&self) -> zbus::Result<bool>;
    #[zbus(property)]
    fn menu(&self) -> zbus::Result<zbus::zvariant::OwnedObjectPath>;
    #[zbus(property)]
    fn status(&self) -> zbus::Result<String>;
    #[zbus(property)]
    fn title(&self) -> zbus::Result<String>;
    #[zbus(property)]
    fn tool_tip(&self) -> zbus::Result<(String, Vec<(i32, i32, Vec<u8>)>, String, String)>;
    #[zbus(property)]
    fn window_id(&self) -> zbus::Result<i32>;
}

/// Serve `core` on one end of a socket pair, returning the serving and the host connection.
pub async fn serve_p2p(core: Arc<crate::adapter::ItemCore>) -> (zbus::Connection, zbus::Connection) {
    let (item_socket, host_socket) = tokio::net::UnixStream::pair().unwrap();
    let item = zbus::connection::Builder::unix_stream(item_socket)
        .server(zbus::Guid::generate())
        .unwrap()
        .p2p()
        .serve_at(names::ITEM_OBJECT, crate::dbus::StatusNotifierItemInterface::new(core))
        .unwrap()
        .build();
    let host = zbus::connection::Builder::unix_stream(host_socket).p2p().build();
    tokio::try_join!(item, host).unwrap()
}

pub async fn host_proxy(host: &zbus::Connection) -> ItemProxy<'static> {
    ItemProxy::builder(host).cache_properties(zbus::proxy::CacheProperties::No).build().await.unwrap()
}

/// The next signal arriving on `messages`, failing the test if none shows up.
pub async fn next_signal(messages: &mut zbus::MessageStream) -> zbus::Message {
    let wait = async {
        while let Some(msg) = messages.next().await {
            let msg = msg.unwrap();
            if msg.message_type() == zbus::message::Type::Signal {
                return msg;
            }
        }
        panic!("connection closed while waiting for a signal");
    };
    tokio::time::timeout(std::time::Duration::from_secs(5), wait).await.expect("no signal within 5 seconds")
}

pub fn member(msg: &zbus::Message) -> String {
    msg.header().member().map(|member| member.to_string()).unwrap_or_default()
}
