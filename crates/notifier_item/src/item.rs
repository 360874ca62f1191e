use crate::{adapter::ItemCore, dbus::StatusNotifierItemInterface, *};

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

static ITEM_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Pick the well-known name of a new item, `org.freedesktop.StatusNotifierItem-{pid}-{n}`.
///
/// `n` counts the items created by this process, starting at 1.
fn next_service_name() -> String {
    let n = ITEM_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{}-{}-{}", names::ITEM_SERVICE_PREFIX, std::process::id(), n)
}

async fn connect(address: Option<&str>) -> zbus::Result<zbus::Connection> {
    match address {
        Some(address) => zbus::connection::Builder::address(address)?.build().await,
        None => zbus::Connection::session().await,
    }
}

async fn unserve(con: &zbus::Connection) -> zbus::Result<bool> {
    con.object_server().remove::<StatusNotifierItemInterface, _>(names::ITEM_OBJECT).await
}

/// Remove the served object on a task of the current runtime. Without a runtime the object stays
/// until the connection closes.
fn spawn_unserve(con: &zbus::Connection) -> Option<tokio::task::JoinHandle<()>> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let con = con.clone();
    Some(runtime.spawn(async move {
        if let Err(e) = unserve(&con).await {
            log::warn!("failed to remove {}: {}", names::ITEM_OBJECT, e);
        }
    }))
}

/// Configuration of a [`StatusNotifierItem`].
pub struct ItemBuilder {
    id: String,
    title: Option<String>,
    category: Category,
    status: Status,
    icon_name: Option<String>,
    address: Option<String>,
    menu_exporter: Option<Arc<dyn MenuExporter>>,
}

impl ItemBuilder {
    /// `id` should be unique to the application, and stay the same across runs.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            category: Category::default(),
            status: Status::default(),
            icon_name: None,
            address: None,
            menu_exporter: None,
        }
    }

    /// Defaults to the id.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn icon_name(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = Some(icon_name.into());
        self
    }

    /// Connect to the bus at `address` instead of the session bus.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Needed for [`StatusNotifierItem::set_context_menu`].
    pub fn menu_exporter(mut self, exporter: Arc<dyn MenuExporter>) -> Self {
        self.menu_exporter = Some(exporter);
        self
    }

    fn initial_state(&self) -> ItemState {
        let mut state = ItemState::new(self.id.as_str());
        if let Some(title) = &self.title {
            state.set_title(title);
        }
        if let Some(icon_name) = &self.icon_name {
            state.set_icon_by_name(icon_name);
        }
        state.set_category(self.category);
        state.set_status(self.status);
        state
    }

    /// Publish the item on its own connection and announce it to the watcher.
    ///
    /// Fails if the bus can't be reached. A missing watcher is fine: the item registers itself as
    /// soon as one shows up.
    pub async fn build(self) -> Result<StatusNotifierItem> {
        let service = next_service_name();
        let con = connect(self.address.as_deref()).await.map_err(Error::Connect)?;

        let core = Arc::new(ItemCore::new(self.initial_state()));
        con.object_server().at(names::ITEM_OBJECT, StatusNotifierItemInterface::new(core.clone())).await?;
        con.request_name(service.as_str()).await?;
        log::info!("serving item {} as {}", self.id, service);

        let registrar = HostRegistrar::start(&con, &service).await?;

        Ok(StatusNotifierItem { con, core, registrar, menu_exporter: self.menu_exporter, served: true })
    }
}

/// An indicator published on the bus, as long as this handle lives.
///
/// Setters return whether anything changed, and emit the matching `New*` signal if it did.
pub struct StatusNotifierItem {
    con: zbus::Connection,
    core: Arc<ItemCore>,
    registrar: HostRegistrar,
    menu_exporter: Option<Arc<dyn MenuExporter>>,
    served: bool,
}

impl std::fmt::Debug for StatusNotifierItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusNotifierItem")
            .field("service", &self.service_name())
            .field("state", &*self.core.state())
            .field("menu", self.core.menu())
            .finish()
    }
}

impl StatusNotifierItem {
    pub fn service_name(&self) -> &str {
        self.registrar.service()
    }

    pub fn registration(&self) -> Registration {
        self.registrar.registration()
    }

    pub fn connection(&self) -> &zbus::Connection {
        &self.con
    }

    /// Snapshot of everything the item publishes, except its menu.
    pub fn state(&self) -> ItemState {
        self.core.state().clone()
    }

    pub fn id(&self) -> String {
        self.core.state().id().to_owned()
    }

    pub fn title(&self) -> String {
        self.core.state().title().to_owned()
    }

    pub fn status(&self) -> Status {
        self.core.state().status()
    }

    pub fn category(&self) -> Category {
        self.core.state().category()
    }

    pub fn tool_tip(&self) -> ToolTip {
        self.core.state().tool_tip()
    }

    pub fn menu_path(&self) -> &'static str {
        self.core.menu().path()
    }

    pub fn context_menu(&self) -> Option<MenuHandle> {
        self.core.menu().menu()
    }

    fn signal_context(&self) -> Result<zbus::SignalContext<'static>> {
        Ok(zbus::SignalContext::new(&self.con, names::ITEM_OBJECT)?)
    }

    async fn update<F>(&self, facet: Facet, change: F) -> Result<bool>
    where
        F: FnOnce(&mut ItemState) -> bool + Send,
    {
        let ctxt = self.signal_context()?;
        Ok(self.core.update(&ctxt, facet, change).await?)
    }

    async fn publish(&self, changed: bool, facet: Facet) -> Result<bool> {
        let ctxt = self.signal_context()?;
        Ok(self.core.publish(&ctxt, changed, facet).await?)
    }

    pub async fn set_title(&self, title: &str) -> Result<bool> {
        self.update(Facet::Title, |state| state.set_title(title)).await
    }

    pub async fn set_status(&self, status: Status) -> Result<bool> {
        let ctxt = self.signal_context()?;
        Ok(self.core.set_status(&ctxt, status).await?)
    }

    /// Hosts read the category when they first see the item, so changing it later emits nothing.
    pub fn set_category(&self, category: Category) -> bool {
        self.core.apply(|state| state.set_category(category))
    }

    pub async fn set_icon_by_name(&self, name: &str) -> Result<bool> {
        self.update(Facet::Icon, |state| state.set_icon_by_name(name)).await
    }

    /// The icon is encoded right away, the returned future only emits the signal.
    pub fn set_icon_by_pixmap(&self, icon: &dyn IconSource) -> impl Future<Output = Result<bool>> + Send + '_ {
        let changed = self.core.apply(|state| state.set_icon_by_pixmap(icon));
        self.publish(changed, Facet::Icon)
    }

    pub async fn set_overlay_icon_by_name(&self, name: &str) -> Result<bool> {
        self.update(Facet::OverlayIcon, |state| state.set_overlay_icon_by_name(name)).await
    }

    pub fn set_overlay_icon_by_pixmap(&self, icon: &dyn IconSource) -> impl Future<Output = Result<bool>> + Send + '_ {
        let changed = self.core.apply(|state| state.set_overlay_icon_by_pixmap(icon));
        self.publish(changed, Facet::OverlayIcon)
    }

    pub async fn set_attention_icon_by_name(&self, name: &str) -> Result<bool> {
        self.update(Facet::AttentionIcon, |state| state.set_attention_icon_by_name(name)).await
    }

    pub fn set_attention_icon_by_pixmap(&self, icon: &dyn IconSource) -> impl Future<Output = Result<bool>> + Send + '_ {
        let changed = self.core.apply(|state| state.set_attention_icon_by_pixmap(icon));
        self.publish(changed, Facet::AttentionIcon)
    }

    pub async fn set_tool_tip_title(&self, title: &str) -> Result<bool> {
        self.update(Facet::ToolTip, |state| state.set_tool_tip_title(title)).await
    }

    pub async fn set_tool_tip_subtitle(&self, subtitle: &str) -> Result<bool> {
        self.update(Facet::ToolTip, |state| state.set_tool_tip_subtitle(subtitle)).await
    }

    pub async fn set_tool_tip_icon_by_name(&self, name: &str) -> Result<bool> {
        self.update(Facet::ToolTip, |state| state.set_tool_tip_icon_by_name(name)).await
    }

    pub fn set_tool_tip_icon_by_pixmap(&self, icon: &dyn IconSource) -> impl Future<Output = Result<bool>> + Send + '_ {
        let changed = self.core.apply(|state| state.set_tool_tip_icon_by_pixmap(icon));
        self.publish(changed, Facet::ToolTip)
    }

    /// Replace the whole tooltip, emitting at most one `NewToolTip`.
    pub async fn set_tool_tip_by_name(&self, icon_name: &str, title: &str, subtitle: &str) -> Result<bool> {
        self.update(Facet::ToolTip, |state| state.set_tool_tip_by_name(icon_name, title, subtitle)).await
    }

    pub fn set_tool_tip_by_pixmap(
        &self,
        icon: &dyn IconSource,
        title: &str,
        subtitle: &str,
    ) -> impl Future<Output = Result<bool>> + Send + '_ {
        let changed = self.core.apply(|state| state.set_tool_tip_by_pixmap(icon, title, subtitle));
        self.publish(changed, Facet::ToolTip)
    }

    /// Bind `menu` as the context menu, or unbind the current one with `None`.
    ///
    /// The menu is exported through the configured [`MenuExporter`].
    pub fn set_context_menu(&self, menu: Option<MenuHandle>) -> Result<bool> {
        let Some(exporter) = &self.menu_exporter else {
            if menu.is_some() {
                return Err(Error::NoMenuExporter);
            }
            return Ok(self.core.menu().unbind());
        };
        self.core.menu().bind(menu, |path, menu| exporter.export(path, menu, &self.con))
    }

    /// Called with the position on primary activation, usually a left click.
    pub fn on_activate_requested(&self, f: impl Fn(Position) + Send + Sync + 'static) {
        self.core.listeners().on_activate_requested(f);
    }

    /// Called with the position on secondary activation, usually a middle click.
    pub fn on_secondary_activate_requested(&self, f: impl Fn(Position) + Send + Sync + 'static) {
        self.core.listeners().on_secondary_activate_requested(f);
    }

    pub fn on_scroll_requested(&self, f: impl Fn(i32, Orientation) + Send + Sync + 'static) {
        self.core.listeners().on_scroll_requested(f);
    }

    /// Take the item off the bus: drop the menu export, remove the object, stop following the
    /// watcher and close the connection, in that order.
    pub async fn shutdown(mut self) -> Result<()> {
        self.core.menu().unbind();
        unserve(&self.con).await?;
        self.served = false;
        self.registrar.stop();
        log::info!("removed item {}", self.service_name());
        Ok(())
    }
}

impl Drop for StatusNotifierItem {
    fn drop(&mut self) {
        // the export may hold a clone of our connection, which would keep it open
        self.core.menu().unbind();
        if self.served {
            spawn_unserve(&self.con);
        }
        self.registrar.stop();
    }
}
