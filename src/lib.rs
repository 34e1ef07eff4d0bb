//! # pip-shell
//!
//! Turns toolkit windows into compositor-positioned surfaces (panels, docks,
//! overlays, picture-in-picture) using the wlr layer-shell protocol, with a
//! plain xdg toplevel as fallback when the compositor has no layer shell.
//!
//! ## Architecture
//!
//! - `shell`: the public property API, one binding per window
//! - `surface`: binding lifecycle and the per-tier adapters
//! - `protocol`: protocol boundary traits, global discovery, wayland backend
//! - `window`: the narrow interface to the toolkit's window
//! - `config`: defaults for new surfaces, loaded from TOML
//! - `logging`: `env_logger` setup for hosts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pip_shell::{Edge, HostWindow, PipShell, ProtocolRegistry, ShellConfig, WaylandConnection};
//! # fn window() -> std::rc::Rc<dyn pip_shell::HostWindow> { unimplemented!() }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut connection = WaylandConnection::connect()?;
//!     let registry = ProtocolRegistry::new(connection.global_source());
//!     let mut shell = PipShell::new(registry, &ShellConfig::default());
//!
//!     let window = window();
//!     let id = window.id();
//!     shell.init_for_window(window)?;
//!     shell.set_anchor(id, Edge::Top, true)?;
//!     shell.window_mapped(id);
//!
//!     loop {
//!         let events = connection.blocking_dispatch()?;
//!         shell.dispatch(events);
//!         shell.frame(id);
//!         connection.flush()?;
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod shell;
pub mod surface;
pub mod window;

#[cfg(test)]
mod testing;

// Re-export main types for easy access
pub use config::{ShellConfig, SurfaceDefaults};
pub use error::ShellError;
pub use protocol::wayland::WaylandConnection;
pub use protocol::{Edge, KeyboardMode, Layer, ProtocolRegistry, RoutedEvent, ShellEvent};
pub use shell::{major_version, micro_version, minor_version, BindingKind, PipShell};
pub use surface::{Orientation, SurfaceBinding};
pub use window::{HostWindow, Monitor, PointerGrab, PopupPlacement, WindowId};
