use std::sync::Mutex;

/// Screen position the host reported with an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Interpret the orientation argument of `Scroll`. Anything that isn't "horizontal" (in any
    /// case) is vertical.
    pub fn from_dbus(orientation: &str) -> Self {
        if orientation.to_lowercase() == "horizontal" {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

type PositionCallback = Box<dyn Fn(Position) + Send + Sync>;
type ScrollCallback = Box<dyn Fn(i32, Orientation) + Send + Sync>;

/// Callbacks through which an item tells its application about user interaction.
///
/// Callbacks run synchronously on whichever task handles the DBus call, in registration order.
/// They must not register further callbacks on the same item.
#[derive(Default)]
pub struct Listeners {
    // Intentionally std::sync::Mutex: it is never held across an await.
    activate: Mutex<Vec<PositionCallback>>,
    secondary_activate: Mutex<Vec<PositionCallback>>,
    scroll: Mutex<Vec<ScrollCallback>>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // unwrap: mutex poisoning is okay
        f.debug_struct("Listeners")
            .field("activate", &self.activate.lock().unwrap().len())
            .field("secondary_activate", &self.secondary_activate.lock().unwrap().len())
            .field("scroll", &self.scroll.lock().unwrap().len())
            .finish()
    }
}

impl Listeners {
    pub fn on_activate_requested(&self, f: impl Fn(Position) + Send + Sync + 'static) {
        self.activate.lock().unwrap().push(Box::new(f)); // unwrap: mutex poisoning is okay
    }

    pub fn on_secondary_activate_requested(&self, f: impl Fn(Position) + Send + Sync + 'static) {
        self.secondary_activate.lock().unwrap().push(Box::new(f)); // unwrap: mutex poisoning is okay
    }

    pub fn on_scroll_requested(&self, f: impl Fn(i32, Orientation) + Send + Sync + 'static) {
        self.scroll.lock().unwrap().push(Box::new(f)); // unwrap: mutex poisoning is okay
    }

    pub(crate) fn activate_requested(&self, position: Position) {
        for f in self.activate.lock().unwrap().iter() { // unwrap: mutex poisoning is okay
            f(position);
        }
    }

    pub(crate) fn secondary_activate_requested(&self, position: Position) {
        for f in self.secondary_activate.lock().unwrap().iter() { // unwrap: mutex poisoning is okay
            f(position);
        }
    }

    pub(crate) fn scroll_requested(&self, delta: i32, orientation: Orientation) {
        for f in self.scroll.lock().unwrap().iter() { // unwrap: mutex poisoning is okay
            f(delta, orientation);
        }
    }
}
