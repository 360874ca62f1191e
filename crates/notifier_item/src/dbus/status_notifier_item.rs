use crate::{
    adapter::{FacetSink, ItemCore},
    *,
};

use std::sync::Arc;
use zbus::{
    interface,
    zvariant::{ObjectPath, OwnedObjectPath},
    SignalContext,
};

type DbusPixmaps = Vec<(i32, i32, Vec<u8>)>;

/// The object an item serves at `/StatusNotifierItem`.
///
/// Only hosts talk to this; applications use [`StatusNotifierItem`][`crate::StatusNotifierItem`].
pub struct StatusNotifierItemInterface {
    core: Arc<ItemCore>,
}

impl StatusNotifierItemInterface {
    pub(crate) fn new(core: Arc<ItemCore>) -> Self {
        Self { core }
    }
}

/// Properties are read-only and mirror the item state. Hosts learn about changes through the
/// `New*` signals and read the properties again.
#[interface(name = "org.kde.StatusNotifierItem")]
impl StatusNotifierItemInterface {
    /// Activate method
    async fn activate(&self, x: i32, y: i32, #[zbus(signal_context)] ctxt: SignalContext<'_>) -> zbus::fdo::Result<()> {
        log::debug!("Activate at {},{}", x, y);
        self.core.activate(&ctxt, Position::new(x, y)).await?;
        Ok(())
    }

    /// SecondaryActivate method
    async fn secondary_activate(
        &self,
        x: i32,
        y: i32,
        #[zbus(signal_context)] ctxt: SignalContext<'_>,
    ) -> zbus::fdo::Result<()> {
        log::debug!("SecondaryActivate at {},{}", x, y);
        self.core.secondary_activate(&ctxt, Position::new(x, y)).await?;
        Ok(())
    }

    /// ContextMenu method
    fn context_menu(&self, x: i32, y: i32) {
        self.core.context_menu(Position::new(x, y));
    }

    /// Scroll method
    fn scroll(&self, delta: i32, orientation: &str) {
        self.core.scroll(delta, orientation);
    }

    /// NewAttentionIcon signal
    #[zbus(signal)]
    async fn new_attention_icon(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewIcon signal
    #[zbus(signal)]
    async fn new_icon(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewOverlayIcon signal
    #[zbus(signal)]
    async fn new_overlay_icon(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewStatus signal
    #[zbus(signal)]
    async fn new_status(ctxt: &SignalContext<'_>, status: &str) -> zbus::Result<()>;

    /// NewTitle signal
    #[zbus(signal)]
    async fn new_title(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewToolTip signal
    #[zbus(signal)]
    async fn new_tool_tip(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// AttentionIconName property
    #[zbus(property)]
    fn attention_icon_name(&self) -> String {
        self.core.state().attention_icon().name().to_owned()
    }

    /// AttentionIconPixmap property
    #[zbus(property)]
    fn attention_icon_pixmap(&self) -> DbusPixmaps {
        crate::icon::to_dbus_pixmaps(self.core.state().attention_icon().pixmaps())
    }

    /// Category property
    #[zbus(property)]
    fn category(&self) -> String {
        self.core.state().category().as_str().to_owned()
    }

    /// IconName property
    #[zbus(property)]
    fn icon_name(&self) -> String {
        self.core.state().icon().name().to_owned()
    }

    /// IconPixmap property
    #[zbus(property)]
    fn icon_pixmap(&self) -> DbusPixmaps {
        crate::icon::to_dbus_pixmaps(self.core.state().icon().pixmaps())
    }

    /// Id property
    #[zbus(property)]
    fn id(&self) -> String {
        self.core.state().id().to_owned()
    }

    /// ItemIsMenu property
    #[zbus(property)]
    fn item_is_menu(&self) -> bool {
        false
    }

    /// Menu property
    #[zbus(property)]
    fn menu(&self) -> OwnedObjectPath {
        ObjectPath::from_static_str_unchecked(self.core.menu().path()).into()
    }

    /// OverlayIconName property
    #[zbus(property)]
    fn overlay_icon_name(&self) -> String {
        self.core.state().overlay_icon().name().to_owned()
    }

    /// OverlayIconPixmap property
    #[zbus(property)]
    fn overlay_icon_pixmap(&self) -> DbusPixmaps {
        crate::icon::to_dbus_pixmaps(self.core.state().overlay_icon().pixmaps())
    }

    /// Status property
    #[zbus(property)]
    fn status(&self) -> String {
        self.core.state().status().as_str().to_owned()
    }

    /// Title property
    #[zbus(property)]
    fn title(&self) -> String {
        self.core.state().title().to_owned()
    }

    /// ToolTip property
    #[zbus(property)]
    fn tool_tip(&self) -> (String, DbusPixmaps, String, String) {
        self.core.state().tool_tip().to_dbus()
    }

    /// WindowId property
    #[zbus(property)]
    fn window_id(&self) -> i32 {
        0
    }
}

impl FacetSink for SignalContext<'_> {
    async fn facet_changed(&self, facet: Facet) -> zbus::Result<()> {
        match facet {
            Facet::Title => StatusNotifierItemInterface::new_title(self).await,
            Facet::Icon => StatusNotifierItemInterface::new_icon(self).await,
            Facet::OverlayIcon => StatusNotifierItemInterface::new_overlay_icon(self).await,
            Facet::AttentionIcon => StatusNotifierItemInterface::new_attention_icon(self).await,
            Facet::ToolTip => StatusNotifierItemInterface::new_tool_tip(self).await,
            Facet::Status(status) => StatusNotifierItemInterface::new_status(self, status.as_str()).await,
        }
    }
}
