//! Public property API
//!
//! [`PipShell`] is the entry point a toolkit integration talks to. It owns one
//! [`SurfaceBinding`] per initialized window, keyed by [`WindowId`], forwards
//! the toolkit's lifecycle notifications and routed compositor events to it,
//! and exposes the layer-surface properties as getters and setters.
//!
//! Setters return `Err` and log at error level when the window is not bound
//! or not on the layer tier; the call then changes nothing. Getters never
//! fail: they log the same way and return a safe default.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, error, info, warn};

use crate::config::{ShellConfig, SurfaceDefaults};
use crate::error::ShellError;
use crate::protocol::{
    Edge, HandleId, KeyboardMode, Layer, PopupHandle, ProtocolRegistry, RoutedEvent,
};
use crate::surface::{
    Apply, LayerSurface, Orientation, SurfaceBinding, SurfaceKind, ToplevelSurface,
};
use crate::window::{HostWindow, Monitor, PointerGrab, PopupPlacement, Rectangle, WindowEdge, WindowId};

/// Outcome of [`PipShell::init_for_window`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Bound on the layer-shell tier
    Layer,
    /// Bound as a plain xdg toplevel
    Toplevel,
    /// Neither protocol is available; the window stays an ordinary window
    Plain,
}

pub fn major_version() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
}

pub fn minor_version() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
}

pub fn micro_version() -> u32 {
    env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0)
}

fn report(operation: &str, e: ShellError) -> ShellError {
    error!("{}: {}", operation, e);
    e
}

pub struct PipShell {
    registry: ProtocolRegistry,
    defaults: SurfaceDefaults,
    allow_fallback: bool,
    bindings: HashMap<WindowId, SurfaceBinding>,
}

impl PipShell {
    pub fn new(registry: ProtocolRegistry, config: &ShellConfig) -> Self {
        Self {
            registry,
            defaults: config.surface.clone(),
            allow_fallback: config.fallback.toplevel,
            bindings: HashMap::new(),
        }
    }

    /// Whether the compositor supports the layer shell
    pub fn is_supported(&self) -> bool {
        self.registry.is_supported()
    }

    /// Negotiated layer-shell version, 0 when unsupported
    pub fn protocol_version(&self) -> u32 {
        self.registry.protocol_version()
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    /// Take over a window before it is first mapped
    ///
    /// Picks the layer tier when available, then the xdg toplevel fallback
    /// (if allowed by config), and otherwise leaves the window alone.
    pub fn init_for_window(&mut self, window: Rc<dyn HostWindow>) -> Result<BindingKind, ShellError> {
        let id = window.id();
        if self.bindings.contains_key(&id) {
            return Err(report("init_for_window", ShellError::AlreadyBound(id)));
        }

        if let Some(global) = self.registry.layer_shell() {
            let surface = LayerSurface::new(window.clone(), global, &self.defaults);
            self.bindings
                .insert(id, SurfaceBinding::new(window, Box::new(surface)));
            return Ok(BindingKind::Layer);
        }

        warn!("Falling back to xdg shell for window {}; layer shell properties will not work", id);
        if self.allow_fallback {
            if let Some(global) = self.registry.toplevel_shell() {
                let surface = ToplevelSurface::new(window.clone(), global, &self.defaults);
                self.bindings
                    .insert(id, SurfaceBinding::new(window, Box::new(surface)));
                return Ok(BindingKind::Toplevel);
            }
        }

        warn!("No xdg shell either, window {} keeps default toolkit behavior", id);
        Ok(BindingKind::Plain)
    }

    /// Whether the window was taken over by [`init_for_window`](Self::init_for_window)
    pub fn is_bound(&self, window: WindowId) -> bool {
        self.bindings.contains_key(&window)
    }

    /// Whether the window is bound on the layer tier
    pub fn is_layer_window(&self, window: WindowId) -> bool {
        self.bindings
            .get(&window)
            .map_or(false, |binding| binding.kind() == SurfaceKind::Layer)
    }

    pub fn binding(&self, window: WindowId) -> Option<&SurfaceBinding> {
        self.bindings.get(&window)
    }

    /// Id of the live layer surface object, if any
    pub fn layer_handle(&self, window: WindowId) -> Option<HandleId> {
        self.layer(window, "layer_handle")
            .ok()
            .and_then(LayerSurface::handle_id)
    }

    fn layer(&self, window: WindowId, operation: &str) -> Result<&LayerSurface, ShellError> {
        let binding = self
            .bindings
            .get(&window)
            .ok_or_else(|| report(operation, ShellError::NotBound(window)))?;
        binding
            .surface()
            .as_layer()
            .ok_or_else(|| report(operation, ShellError::NotLayerSurface(window)))
    }

    fn toplevel(&self, window: WindowId, operation: &str) -> Result<&ToplevelSurface, ShellError> {
        let binding = self
            .bindings
            .get(&window)
            .ok_or_else(|| report(operation, ShellError::NotBound(window)))?;
        binding
            .surface()
            .as_toplevel()
            .ok_or_else(|| report(operation, ShellError::NotToplevelSurface(window)))
    }

    fn update_layer(
        &mut self,
        window: WindowId,
        operation: &str,
        update: impl FnOnce(&mut LayerSurface) -> Apply,
    ) -> Result<(), ShellError> {
        let binding = self
            .bindings
            .get_mut(&window)
            .ok_or_else(|| report(operation, ShellError::NotBound(window)))?;
        let layer = binding
            .surface_mut()
            .as_layer_mut()
            .ok_or_else(|| report(operation, ShellError::NotLayerSurface(window)))?;
        let apply = update(layer);
        binding.apply(apply);
        Ok(())
    }

    /// Set the namespace; on the fallback tier this is the app id
    pub fn set_namespace(&mut self, window: WindowId, namespace: Option<&str>) -> Result<(), ShellError> {
        let binding = self
            .bindings
            .get_mut(&window)
            .ok_or_else(|| report("set_namespace", ShellError::NotBound(window)))?;
        let surface = binding.surface_mut();
        let apply = if let Some(layer) = surface.as_layer_mut() {
            layer.set_namespace(namespace)
        } else if let Some(toplevel) = surface.as_toplevel_mut() {
            toplevel.set_app_id(namespace)
        } else {
            Apply::Nothing
        };
        binding.apply(apply);
        Ok(())
    }

    /// Effective namespace, never empty
    pub fn namespace(&self, window: WindowId) -> &str {
        match self.bindings.get(&window).map(SurfaceBinding::surface) {
            Some(surface) => {
                if let Some(layer) = surface.as_layer() {
                    layer.namespace()
                } else if let Some(toplevel) = surface.as_toplevel() {
                    toplevel.app_id()
                } else {
                    &self.defaults.namespace
                }
            }
            None => {
                report("namespace", ShellError::NotBound(window));
                &self.defaults.namespace
            }
        }
    }

    pub fn set_layer(&mut self, window: WindowId, layer: Layer) -> Result<(), ShellError> {
        self.update_layer(window, "set_layer", |surface| surface.set_layer(layer))
    }

    pub fn layer_of(&self, window: WindowId) -> Layer {
        self.layer(window, "layer")
            .map_or(Layer::Top, LayerSurface::layer)
    }

    /// Put the surface on `monitor`, or let the compositor choose with `None`
    pub fn set_monitor(&mut self, window: WindowId, monitor: Option<&Rc<Monitor>>) -> Result<(), ShellError> {
        self.update_layer(window, "set_monitor", |surface| surface.set_monitor(monitor))
    }

    pub fn monitor(&self, window: WindowId) -> Option<Rc<Monitor>> {
        self.layer(window, "monitor").ok().and_then(LayerSurface::monitor)
    }

    pub fn set_anchor(&mut self, window: WindowId, edge: Edge, anchor: bool) -> Result<(), ShellError> {
        self.update_layer(window, "set_anchor", |surface| surface.set_anchor(edge, anchor))
    }

    pub fn anchor(&self, window: WindowId, edge: Edge) -> bool {
        self.layer(window, "anchor")
            .map_or(false, |surface| surface.anchor(edge))
    }

    pub fn set_margin(&mut self, window: WindowId, edge: Edge, margin: i32) -> Result<(), ShellError> {
        self.update_layer(window, "set_margin", |surface| surface.set_margin(edge, margin))
    }

    pub fn margin(&self, window: WindowId, edge: Edge) -> i32 {
        self.layer(window, "margin")
            .map_or(0, |surface| surface.margin(edge))
    }

    /// Set a fixed exclusive zone, turning the automatic one off
    pub fn set_exclusive_zone(&mut self, window: WindowId, zone: i32) -> Result<(), ShellError> {
        self.update_layer(window, "set_exclusive_zone", |surface| {
            surface.set_exclusive_zone(zone)
        })
    }

    pub fn exclusive_zone(&self, window: WindowId) -> i32 {
        self.layer(window, "exclusive_zone")
            .map_or(0, LayerSurface::exclusive_zone)
    }

    pub fn set_auto_exclusive_zone(&mut self, window: WindowId, enabled: bool) -> Result<(), ShellError> {
        self.update_layer(window, "set_auto_exclusive_zone", |surface| {
            surface.set_auto_exclusive_zone(enabled)
        })
    }

    pub fn auto_exclusive_zone_enable(&mut self, window: WindowId) -> Result<(), ShellError> {
        self.set_auto_exclusive_zone(window, true)
    }

    pub fn auto_exclusive_zone_is_enabled(&self, window: WindowId) -> bool {
        self.layer(window, "auto_exclusive_zone_is_enabled")
            .map_or(false, LayerSurface::auto_exclusive_zone)
    }

    pub fn set_keyboard_mode(&mut self, window: WindowId, mode: KeyboardMode) -> Result<(), ShellError> {
        self.update_layer(window, "set_keyboard_mode", |surface| {
            surface.set_keyboard_mode(mode)
        })
    }

    pub fn keyboard_mode(&self, window: WindowId) -> KeyboardMode {
        self.layer(window, "keyboard_mode")
            .map_or(KeyboardMode::None, LayerSurface::keyboard_mode)
    }

    #[deprecated(note = "use set_keyboard_mode")]
    pub fn set_keyboard_interactivity(&mut self, window: WindowId, interactivity: bool) -> Result<(), ShellError> {
        let mode = if interactivity {
            KeyboardMode::Exclusive
        } else {
            KeyboardMode::None
        };
        self.set_keyboard_mode(window, mode)
    }

    #[deprecated(note = "use keyboard_mode")]
    pub fn keyboard_interactivity(&self, window: WindowId) -> bool {
        let mode = self.keyboard_mode(window);
        if mode == KeyboardMode::OnDemand {
            warn!(
                "keyboard_interactivity() used after keyboard mode was set to {:?}, consider keyboard_mode()",
                mode
            );
        }
        mode != KeyboardMode::None
    }

    pub fn orientation(&self, window: WindowId) -> Orientation {
        self.layer(window, "orientation")
            .map_or(Orientation::None, LayerSurface::orientation)
    }

    /// Call `listener` whenever the derived orientation of the window changes
    pub fn connect_orientation_changed(
        &mut self,
        window: WindowId,
        listener: impl FnMut(Orientation) + 'static,
    ) -> Result<(), ShellError> {
        self.update_layer(window, "connect_orientation_changed", |surface| {
            surface.connect_orientation_changed(listener);
            Apply::Nothing
        })
    }

    /// Begin an interactive move (fallback tier only)
    pub fn start_move(&self, window: WindowId, grab: &PointerGrab) -> Result<(), ShellError> {
        self.toplevel(window, "start_move")?
            .start_move(grab)
            .map_err(|e| report("start_move", e))
    }

    /// Begin an interactive resize (fallback tier only)
    pub fn start_resize(&self, window: WindowId, edge: WindowEdge, grab: &PointerGrab) -> Result<(), ShellError> {
        self.toplevel(window, "start_resize")?
            .start_resize(grab, edge)
            .map_err(|e| report("start_resize", e))
    }

    /// Create a popup for `popup`, positioned relative to `parent`
    pub fn get_popup(
        &mut self,
        parent: WindowId,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        let binding = self
            .bindings
            .get_mut(&parent)
            .ok_or_else(|| report("get_popup", ShellError::NotBound(parent)))?;
        binding.get_popup(popup, placement)
    }

    pub fn logical_geometry(&self, window: WindowId) -> Rectangle {
        match self.bindings.get(&window) {
            Some(binding) => binding.logical_geometry(),
            None => {
                report("logical_geometry", ShellError::NotBound(window));
                Rectangle::default()
            }
        }
    }

    /// The toolkit mapped the window
    pub fn window_mapped(&mut self, window: WindowId) {
        match self.bindings.get_mut(&window) {
            Some(binding) => binding.map(),
            None => debug!("Window {} mapped, not bound", window),
        }
    }

    /// The toolkit unmapped the window
    pub fn window_unmapped(&mut self, window: WindowId) {
        if let Some(binding) = self.bindings.get_mut(&window) {
            binding.unmap();
        }
    }

    pub fn size_allocated(&mut self, window: WindowId, width: i32, height: i32) {
        if let Some(binding) = self.bindings.get_mut(&window) {
            binding.size_allocated(width, height);
        }
    }

    /// Commit point for the window's frame; returns whether it committed
    pub fn frame(&mut self, window: WindowId) -> bool {
        self.bindings
            .get_mut(&window)
            .map_or(false, SurfaceBinding::flush_commit)
    }

    /// The toolkit destroyed the window; its binding is finalized and dropped
    pub fn window_destroyed(&mut self, window: WindowId) {
        if let Some(mut binding) = self.bindings.remove(&window) {
            binding.finalize();
            info!("Window {} released", window);
        }
    }

    /// Route compositor events to their windows
    pub fn dispatch(&mut self, events: impl IntoIterator<Item = RoutedEvent>) {
        for routed in events {
            match self.bindings.get_mut(&routed.window) {
                Some(binding) => binding.handle_event(routed.handle, &routed.event),
                None => debug!(
                    "Dropping {:?} for unbound window {}",
                    routed.event, routed.window
                ),
            }
        }
    }
}

impl Drop for PipShell {
    fn drop(&mut self) {
        for (_, mut binding) in self.bindings.drain() {
            binding.finalize();
        }
    }
}
