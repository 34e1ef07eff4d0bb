//! Surface binding: the lifecycle shared by every custom shell surface
//!
//! A [`SurfaceBinding`] pairs one toolkit window with one [`ShellSurface`]
//! adapter and follows the window through map and unmap:
//!
//! ```text
//! Unmapped ──map──► Mapped ──unmap──► Unmapped ──map──► Mapped ...
//!     │                │
//!     └───finalize─────┴──► Finalized (terminal)
//! ```
//!
//! Adapters own the protocol handle. Mapping creates it, unmapping destroys
//! it and leaves `None` behind so later requests see that the surface is gone.
//! Property changes that cannot be applied in place report [`Apply::Remap`]
//! and the binding tears the protocol object down and creates it again.

pub mod layer;
pub mod toplevel;

use std::rc::Rc;

use log::{debug, warn};

use crate::error::ShellError;
use crate::protocol::{HandleId, PopupHandle, ShellEvent};
use crate::window::{HostWindow, PopupPlacement, Rectangle};

pub use layer::{LayerSurface, Orientation};
pub use toplevel::ToplevelSurface;

/// What the binding must do after an adapter changed its state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Apply {
    /// Nothing was sent, or the change only touched desired state
    Nothing,
    /// Requests were sent and need the next surface commit
    Commit,
    /// The property can only change by recreating the protocol object
    Remap,
}

/// Which tier a window ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Layer,
    Toplevel,
}

/// Lifecycle state of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unmapped,
    Mapped,
    Finalized,
}

/// Behaviour of one protocol tier
pub trait ShellSurface {
    fn kind(&self) -> SurfaceKind;

    /// Create the protocol object for the now-mapped window and replay state
    ///
    /// Returns false when the object could not be created.
    fn map(&mut self) -> bool;

    /// Destroy the protocol object, if any
    fn unmap(&mut self);

    /// Release everything; the adapter is not used again
    fn finalize(&mut self) {
        self.unmap();
    }

    fn get_popup(
        &mut self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError>;

    fn logical_geometry(&self) -> Rectangle;

    /// The toolkit assigned a new content size
    fn size_allocated(&mut self, width: i32, height: i32);

    /// A compositor event addressed to this window's protocol object
    fn handle_event(&mut self, handle: HandleId, event: &ShellEvent);

    fn as_layer(&self) -> Option<&LayerSurface> {
        None
    }

    fn as_layer_mut(&mut self) -> Option<&mut LayerSurface> {
        None
    }

    fn as_toplevel(&self) -> Option<&ToplevelSurface> {
        None
    }

    fn as_toplevel_mut(&mut self) -> Option<&mut ToplevelSurface> {
        None
    }
}

/// One window bound to one shell adapter
pub struct SurfaceBinding {
    window: Rc<dyn HostWindow>,
    surface: Box<dyn ShellSurface>,
    state: BindingState,
    needs_commit: bool,
}

impl SurfaceBinding {
    pub fn new(window: Rc<dyn HostWindow>, surface: Box<dyn ShellSurface>) -> Self {
        debug!(
            "Window {} bound as {:?} surface",
            window.id(),
            surface.kind()
        );
        Self {
            window,
            surface,
            state: BindingState::Unmapped,
            needs_commit: false,
        }
    }

    pub fn window(&self) -> &Rc<dyn HostWindow> {
        &self.window
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn is_mapped(&self) -> bool {
        self.state == BindingState::Mapped
    }

    pub fn kind(&self) -> SurfaceKind {
        self.surface.kind()
    }

    pub fn surface(&self) -> &dyn ShellSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn ShellSurface {
        self.surface.as_mut()
    }

    /// The toolkit mapped the window's low-level surface
    pub fn map(&mut self) {
        match self.state {
            BindingState::Finalized => {
                warn!("Window {} mapped after its binding was finalized", self.window.id());
            }
            BindingState::Mapped => {
                debug!("Window {} is already mapped", self.window.id());
            }
            BindingState::Unmapped => {
                if !self.surface.map() {
                    // stays unmapped so the next toolkit map retries
                    return;
                }
                self.state = BindingState::Mapped;
                // the new role object only takes effect with the next commit
                self.mark_needs_commit();
            }
        }
    }

    /// The toolkit unmapped the window's low-level surface
    pub fn unmap(&mut self) {
        if self.state == BindingState::Mapped {
            self.surface.unmap();
            self.state = BindingState::Unmapped;
        }
    }

    /// Recreate the protocol object so properties fixed at creation take effect
    pub fn remap(&mut self) {
        if self.state == BindingState::Mapped {
            debug!("Remapping window {}", self.window.id());
            self.unmap();
            self.map();
        }
    }

    /// Tear the binding down with its window
    pub fn finalize(&mut self) {
        if self.state != BindingState::Finalized {
            self.unmap();
            self.surface.finalize();
            self.needs_commit = false;
            self.state = BindingState::Finalized;
        }
    }

    /// Act on the outcome of an adapter state change
    pub fn apply(&mut self, apply: Apply) {
        match apply {
            Apply::Nothing => {}
            Apply::Commit => self.mark_needs_commit(),
            Apply::Remap => self.remap(),
        }
    }

    pub fn mark_needs_commit(&mut self) {
        if !self.needs_commit {
            self.needs_commit = true;
            self.window.queue_redraw();
        }
    }

    pub fn needs_commit(&self) -> bool {
        self.needs_commit
    }

    /// Commit point driven by the toolkit's frame cycle
    ///
    /// Returns whether a commit was issued.
    pub fn flush_commit(&mut self) -> bool {
        if !self.needs_commit {
            return false;
        }
        self.needs_commit = false;
        if self.state == BindingState::Mapped {
            self.window.commit();
            true
        } else {
            false
        }
    }

    pub fn size_allocated(&mut self, width: i32, height: i32) {
        if self.state != BindingState::Finalized {
            self.surface.size_allocated(width, height);
        }
    }

    pub fn handle_event(&mut self, handle: HandleId, event: &ShellEvent) {
        if self.state == BindingState::Mapped {
            self.surface.handle_event(handle, event);
        } else {
            debug!(
                "Dropping {:?} for window {} in state {:?}",
                event,
                self.window.id(),
                self.state
            );
        }
    }

    pub fn get_popup(
        &mut self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        if self.state == BindingState::Finalized {
            return Err(ShellError::Finalized);
        }
        self.surface.get_popup(popup, placement)
    }

    pub fn logical_geometry(&self) -> Rectangle {
        self.surface.logical_geometry()
    }
}

impl Drop for SurfaceBinding {
    fn drop(&mut self) {
        self.finalize();
    }
}
