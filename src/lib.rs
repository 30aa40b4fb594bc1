//! Control panel for v4l2 camera controls.
//!
//! ```no_run
//! use camctl::{CameraControl, CommandBackend};
//!
//! let backend = CommandBackend::new("/dev/video0");
//! let mut camera = CameraControl::new(backend).unwrap();
//!
//! camera.set_value("brightness", 10).unwrap();
//!
//! // Back to the driver defaults, menus and booleans first.
//! camera.update(true);
//! ```
//!
//! Device access goes through `v4l2-ctl` by default. `NativeBackend` talks to the device node
//! with ioctls instead, which avoids the dependence on *v4l-utils*.

mod v4l2;

pub mod backend;
pub mod camera;
pub mod control;
#[cfg(feature = "gui")]
pub mod gui;
pub mod parse;
pub mod settings;

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::result;

pub use backend::{Backend, CommandBackend, NativeBackend};
pub use camera::{Applied, CameraControl, UpdateReport};
pub use control::{display_label, Control, Controls, CtrlType, Flags, MenuItem, Widget};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error when talking to the camera or the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// `v4l2-ctl` ran but reported a failure.
    #[error("`{program}` failed ({status}): {stderr}")]
    Command {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("unknown control `{0}`")]
    UnknownControl(String),
    #[error("value {value} out of range for `{name}`")]
    OutOfRange { name: String, value: i64 },
    #[error("cannot parse control output: {0:?}")]
    Parse(String),
    #[error("bad settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no configuration directory available: {0}")]
    ConfigDir(#[from] app_dirs::AppDirsError),
    #[error("invalid profile name {0:?}")]
    ProfileName(String),
}
