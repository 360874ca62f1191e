use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not connect to the bus")]
    Connect(#[source] zbus::Error),
    #[error("Dbus connection error")]
    DbusError(#[from] zbus::Error),
    #[error(transparent)]
    Icon(#[from] crate::IconError),
    #[error("a context menu was set, but the item has no menu exporter")]
    NoMenuExporter,
    #[error("failed to export menu at {path}: {reason}")]
    MenuExport { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
