//! Error types for the surface binding and property API
//!
//! Nothing in this crate is fatal to the hosting process. Every variant here
//! describes a call that was rejected and turned into a no-op; callers get the
//! error back and the same message is logged at the point of rejection.

use crate::window::WindowId;
use thiserror::Error;

/// Errors reported by [`crate::PipShell`] and the surface adapters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    /// The window was never handed to `init_for_window`
    #[error("window {0} is not bound, make sure init_for_window() was called")]
    NotBound(WindowId),

    /// `init_for_window` was called twice for the same window
    #[error("window {0} is already bound")]
    AlreadyBound(WindowId),

    /// A layer property was used on a window bound through the fallback tier
    #[error("window {0} is not a layer surface, the compositor may not support layer shell")]
    NotLayerSurface(WindowId),

    /// A fallback-only request was used on a layer surface
    #[error("window {0} is not a fallback toplevel surface")]
    NotToplevelSurface(WindowId),

    /// Edge ordinal outside of left/right/top/bottom
    #[error("invalid edge index {0}")]
    InvalidEdge(u32),

    /// Layer ordinal outside of background/bottom/top/overlay
    #[error("invalid layer {0}")]
    InvalidLayer(u32),

    /// Keyboard mode ordinal outside of none/exclusive/on-demand
    #[error("invalid keyboard mode {0}")]
    InvalidKeyboardMode(u32),

    /// A request needs the protocol object, which only exists while mapped
    #[error("{0} called while the protocol surface does not exist")]
    NotMapped(&'static str),

    /// The toolkit could not hand out a wl_surface for the window
    #[error("window has no wayland surface")]
    NoWlSurface,

    /// A protocol global needed for the request was never advertised
    #[error("protocol global {0} is unavailable")]
    GlobalUnavailable(&'static str),

    /// The binding was torn down with the window
    #[error("surface binding has been finalized")]
    Finalized,
}
