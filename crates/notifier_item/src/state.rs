use crate::*;

/// Recognised values of [`org.freedesktop.StatusNotifierItem.Status`].
///
/// [`org.freedesktop.StatusNotifierItem.Status`]: https://www.freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierItem/#org.freedesktop.statusnotifieritem.status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// The item doesn't convey important information to the user, it can be considered an "idle"
    /// status and is likely that visualizations will chose to hide it.
    Passive,
    /// The item is active, is more important that the item will be shown in some way to the user.
    #[default]
    Active,
    /// The item carries really important information for the user, such as battery charge running
    /// out and is wants to incentive the direct user intervention. Visualizations should emphasize
    /// in some way the items with NeedsAttention status.
    NeedsAttention,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Passive => "Passive",
            Status::Active => "Active",
            Status::NeedsAttention => "NeedsAttention",
        }
    }
}

/// Recognised values of `org.freedesktop.StatusNotifierItem.Category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    /// The item describes the status of a generic application, for instance the current state of
    /// a media player. When the category can not be known, this is a sensible fallback.
    #[default]
    ApplicationStatus,
    /// The item describes the status of communication oriented applications, like an instant
    /// messenger or an email client.
    Communications,
    /// The item describes services of the system not seen as a stand alone application by the
    /// user, such as an indicator for the activity of a disk indexing service.
    SystemServices,
    /// The item describes the state and control of a particular hardware, such as an indicator of
    /// the battery charge or sound card volume control.
    Hardware,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::ApplicationStatus => "ApplicationStatus",
            Category::Communications => "Communications",
            Category::SystemServices => "SystemServices",
            Category::Hardware => "Hardware",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseStatusError;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseCategoryError;

impl std::str::FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, ParseStatusError> {
        match s {
            "Passive" => Ok(Status::Passive),
            "Active" => Ok(Status::Active),
            "NeedsAttention" => Ok(Status::NeedsAttention),
            _ => Err(ParseStatusError),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> std::result::Result<Self, ParseCategoryError> {
        match s {
            "ApplicationStatus" => Ok(Category::ApplicationStatus),
            "Communications" => Ok(Category::Communications),
            "SystemServices" => Ok(Category::SystemServices),
            "Hardware" => Ok(Category::Hardware),
            _ => Err(ParseCategoryError),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attribute group with its own change signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Title,
    Icon,
    OverlayIcon,
    AttentionIcon,
    ToolTip,
    Status(Status),
}

/// An icon that is published either by name or as pixmaps, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconSlot {
    name: String,
    pixmaps: EncodedIconList,
    cache_key: Option<u64>,
}

impl IconSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixmaps(&self) -> &[EncodedIcon] {
        &self.pixmaps
    }

    fn set_name(&mut self, name: &str) -> bool {
        if self.name == name {
            return false;
        }
        self.name = name.to_owned();
        self.pixmaps = Vec::new();
        self.cache_key = None;
        true
    }

    fn set_pixmap(&mut self, icon: &dyn IconSource) -> bool {
        let key = icon.cache_key();
        if self.cache_key == Some(key) {
            return false;
        }
        self.cache_key = Some(key);
        self.pixmaps = encode(icon);
        self.name.clear();
        true
    }
}

/// Snapshot of the tooltip, as published in the `ToolTip` property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolTip {
    pub icon_name: String,
    pub icon_pixmap: EncodedIconList,
    pub title: String,
    pub description: String,
}

impl ToolTip {
    pub(crate) fn to_dbus(&self) -> (String, Vec<(i32, i32, Vec<u8>)>, String, String) {
        (self.icon_name.clone(), crate::icon::to_dbus_pixmaps(&self.icon_pixmap), self.title.clone(), self.description.clone())
    }
}

/// Everything an item publishes, except its menu.
///
/// Setters return whether anything changed; setting a value that is already current is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemState {
    id: String,
    title: String,
    status: Status,
    category: Category,
    icon: IconSlot,
    overlay_icon: IconSlot,
    attention_icon: IconSlot,
    tool_tip_icon: IconSlot,
    tool_tip_title: String,
    tool_tip_subtitle: String,
}

impl ItemState {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            status: Status::default(),
            category: Category::default(),
            icon: IconSlot::default(),
            overlay_icon: IconSlot::default(),
            attention_icon: IconSlot::default(),
            tool_tip_icon: IconSlot::default(),
            tool_tip_title: String::new(),
            tool_tip_subtitle: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn icon(&self) -> &IconSlot {
        &self.icon
    }

    pub fn overlay_icon(&self) -> &IconSlot {
        &self.overlay_icon
    }

    pub fn attention_icon(&self) -> &IconSlot {
        &self.attention_icon
    }

    pub fn tool_tip_icon(&self) -> &IconSlot {
        &self.tool_tip_icon
    }

    pub fn tool_tip_title(&self) -> &str {
        &self.tool_tip_title
    }

    pub fn tool_tip_subtitle(&self) -> &str {
        &self.tool_tip_subtitle
    }

    pub fn tool_tip(&self) -> ToolTip {
        ToolTip {
            icon_name: self.tool_tip_icon.name.clone(),
            icon_pixmap: self.tool_tip_icon.pixmaps.clone(),
            title: self.tool_tip_title.clone(),
            description: self.tool_tip_subtitle.clone(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        replace_if_changed(&mut self.title, title)
    }

    pub fn set_status(&mut self, status: Status) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        true
    }

    /// There is no signal for the category, hosts pick it up on their next read.
    pub fn set_category(&mut self, category: Category) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category;
        true
    }

    pub fn set_icon_by_name(&mut self, name: &str) -> bool {
        self.icon.set_name(name)
    }

    pub fn set_icon_by_pixmap(&mut self, icon: &dyn IconSource) -> bool {
        self.icon.set_pixmap(icon)
    }

    pub fn set_overlay_icon_by_name(&mut self, name: &str) -> bool {
        self.overlay_icon.set_name(name)
    }

    pub fn set_overlay_icon_by_pixmap(&mut self, icon: &dyn IconSource) -> bool {
        self.overlay_icon.set_pixmap(icon)
    }

    pub fn set_attention_icon_by_name(&mut self, name: &str) -> bool {
        self.attention_icon.set_name(name)
    }

    pub fn set_attention_icon_by_pixmap(&mut self, icon: &dyn IconSource) -> bool {
        self.attention_icon.set_pixmap(icon)
    }

    pub fn set_tool_tip_title(&mut self, title: &str) -> bool {
        replace_if_changed(&mut self.tool_tip_title, title)
    }

    pub fn set_tool_tip_subtitle(&mut self, subtitle: &str) -> bool {
        replace_if_changed(&mut self.tool_tip_subtitle, subtitle)
    }

    pub fn set_tool_tip_icon_by_name(&mut self, name: &str) -> bool {
        self.tool_tip_icon.set_name(name)
    }

    pub fn set_tool_tip_icon_by_pixmap(&mut self, icon: &dyn IconSource) -> bool {
        self.tool_tip_icon.set_pixmap(icon)
    }

    pub fn set_tool_tip_by_name(&mut self, icon_name: &str, title: &str, subtitle: &str) -> bool {
        // no short-circuiting, every field has to be applied
        let icon = self.set_tool_tip_icon_by_name(icon_name);
        let title = self.set_tool_tip_title(title);
        let subtitle = self.set_tool_tip_subtitle(subtitle);
        icon || title || subtitle
    }

    pub fn set_tool_tip_by_pixmap(&mut self, icon: &dyn IconSource, title: &str, subtitle: &str) -> bool {
        let icon = self.set_tool_tip_icon_by_pixmap(icon);
        let title = self.set_tool_tip_title(title);
        let subtitle = self.set_tool_tip_subtitle(subtitle);
        icon || title || subtitle
    }

    /// The user interacted with an item that asked for attention, so it got it.
    pub fn acknowledge_attention(&mut self) -> bool {
        match self.status {
            Status::NeedsAttention => self.set_status(Status::Active),
            Status::Passive | Status::Active => false,
        }
    }
}

fn replace_if_changed(field: &mut String, value: &str) -> bool {
    if field == value {
        return false;
    }
    *field = value.to_owned();
    true
}
