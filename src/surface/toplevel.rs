//! Fallback adapter: a plain xdg toplevel
//!
//! Used when the compositor has no layer shell. The window behaves like an
//! ordinary application window; layer-only properties are not available on
//! this tier.

use std::fmt;
use std::rc::Rc;

use log::{debug, error};

use super::{Apply, ShellSurface, SurfaceKind};
use crate::config::SurfaceDefaults;
use crate::error::ShellError;
use crate::protocol::{
    HandleId, PopupHandle, ShellEvent, ToplevelHandle, ToplevelShellGlobal, ToplevelStates,
};
use crate::window::{GeometryHints, HostWindow, PointerGrab, PopupPlacement, Rectangle, Size, WindowEdge};

/// A configure that waits for its `xdg_surface.configure`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingConfigure {
    size: Size,
    states: ToplevelStates,
}

pub struct ToplevelSurface {
    window: Rc<dyn HostWindow>,
    global: Rc<dyn ToplevelShellGlobal>,
    default_app_id: String,
    app_id: Option<String>,
    handle: Option<Box<dyn ToplevelHandle>>,
    pending: Option<PendingConfigure>,
    states: ToplevelStates,
    last_configured_size: Size,
    current_allocation: Size,
}

impl ToplevelSurface {
    pub fn new(
        window: Rc<dyn HostWindow>,
        global: Rc<dyn ToplevelShellGlobal>,
        defaults: &SurfaceDefaults,
    ) -> Self {
        Self {
            window,
            global,
            default_app_id: defaults.namespace.clone(),
            app_id: None,
            handle: None,
            pending: None,
            states: ToplevelStates::empty(),
            last_configured_size: Size::default(),
            current_allocation: Size::default(),
        }
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|handle| handle.id())
    }

    /// Application id announced to the compositor
    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(&self.default_app_id)
    }

    /// State flags from the last applied configure
    pub fn states(&self) -> ToplevelStates {
        self.states
    }

    pub fn last_configured_size(&self) -> Size {
        self.last_configured_size
    }

    pub fn set_app_id(&mut self, app_id: Option<&str>) -> Apply {
        if self.app_id.as_deref() == app_id {
            return Apply::Nothing;
        }
        self.app_id = app_id.map(str::to_owned);
        if self.handle.is_some() {
            Apply::Remap
        } else {
            Apply::Nothing
        }
    }

    /// Begin an interactive move driven by the compositor
    pub fn start_move(&self, grab: &PointerGrab) -> Result<(), ShellError> {
        let handle = self.live_handle("start_move")?;
        debug!("Window {} interactive move, serial {}", self.window.id(), grab.serial);
        handle.start_move(grab);
        Ok(())
    }

    /// Begin an interactive resize from `edge`
    pub fn start_resize(&self, grab: &PointerGrab, edge: WindowEdge) -> Result<(), ShellError> {
        let handle = self.live_handle("start_resize")?;
        debug!(
            "Window {} interactive resize from {:?}, serial {}",
            self.window.id(),
            edge,
            grab.serial
        );
        handle.start_resize(grab, edge);
        Ok(())
    }

    fn live_handle(&self, operation: &'static str) -> Result<&dyn ToplevelHandle, ShellError> {
        self.handle
            .as_deref()
            .ok_or(ShellError::NotMapped(operation))
    }

    /// Adopt a proposed size; 0×0 leaves the size to the window
    fn apply_configure(&mut self, pending: PendingConfigure) {
        self.last_configured_size = pending.size;
        self.states = pending.states;
        if pending.size.width > 0 && pending.size.height > 0 {
            self.window.resize(pending.size.width, pending.size.height);
        }
        self.window.set_geometry_hints(GeometryHints::unconstrained());
    }
}

impl ShellSurface for ToplevelSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Toplevel
    }

    fn map(&mut self) -> bool {
        if self.handle.is_some() {
            return true;
        }
        let handle = match self.global.get_toplevel(self.window.as_ref()) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create xdg toplevel for window {}: {}", self.window.id(), e);
                return false;
            }
        };
        handle.set_app_id(self.app_id());
        debug!(
            "Window {} mapped as xdg toplevel {:?} (xdg_wm_base v{})",
            self.window.id(),
            handle.id(),
            self.global.version()
        );
        self.handle = Some(handle);
        true
    }

    fn unmap(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Destroying xdg toplevel {:?}", handle.id());
            handle.destroy();
        }
        self.pending = None;
    }

    fn get_popup(
        &mut self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        match &self.handle {
            Some(handle) => handle.get_popup(popup, placement),
            None => {
                let e = ShellError::NotMapped("get_popup");
                error!("Window {}: {}", self.window.id(), e);
                Err(e)
            }
        }
    }

    fn logical_geometry(&self) -> Rectangle {
        Rectangle::new(
            0,
            0,
            self.current_allocation.width,
            self.current_allocation.height,
        )
    }

    fn size_allocated(&mut self, width: i32, height: i32) {
        self.current_allocation = Size::new(width, height);
    }

    fn handle_event(&mut self, handle: HandleId, event: &ShellEvent) {
        let Some(current) = &self.handle else {
            return;
        };
        if current.id() != handle {
            debug!("Dropping {:?} for stale xdg toplevel {:?}", event, handle);
            return;
        }

        match *event {
            ShellEvent::ToplevelConfigure {
                width,
                height,
                states,
            } => {
                self.pending = Some(PendingConfigure {
                    size: Size::new(width, height),
                    states,
                });
            }
            ShellEvent::SurfaceConfigure { serial } => {
                current.ack_configure(serial);
                if let Some(pending) = self.pending.take() {
                    self.apply_configure(pending);
                }
            }
            ShellEvent::Closed => {
                debug!("Compositor asked window {} to close", self.window.id());
                self.window.close();
            }
            ref other => debug!("xdg toplevel ignoring {:?}", other),
        }
    }

    fn as_toplevel(&self) -> Option<&ToplevelSurface> {
        Some(self)
    }

    fn as_toplevel_mut(&mut self) -> Option<&mut ToplevelSurface> {
        Some(self)
    }
}

impl fmt::Debug for ToplevelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToplevelSurface")
            .field("window", &self.window.id())
            .field("app_id", &self.app_id())
            .field("handle", &self.handle_id())
            .field("states", &self.states)
            .finish()
    }
}
