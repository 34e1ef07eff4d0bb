//! Layer surface adapter (primary tier)
//!
//! Holds the desired layer-shell state of one window (anchors, margins,
//! layer, namespace, exclusive zone, keyboard mode, output) and keeps the
//! `zwlr_layer_surface_v1` object in line with it.
//!
//! # Size negotiation
//!
//! Along an axis anchored on both sides the surface is stretched: the size
//! request for that axis is 0 so the compositor decides, and the window is
//! pinned to the configured size with min = max geometry hints. Along any
//! other axis the window's own allocation is requested and the window is left
//! unconstrained. `set_size` is only sent when the computed size differs from
//! the last size actually transmitted on the live object.

use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, error, warn};

use super::{Apply, ShellSurface, SurfaceKind};
use crate::config::SurfaceDefaults;
use crate::error::ShellError;
use crate::protocol::{
    Edge, HandleId, KeyboardMode, Layer, LayerShellGlobal, LayerSurfaceHandle, LayerSurfaceRequest,
    PerEdge, PopupHandle, ShellEvent, KEYBOARD_ON_DEMAND_SINCE_VERSION, SET_LAYER_SINCE_VERSION,
};
use crate::window::{GeometryHints, HostWindow, Monitor, PopupPlacement, Rectangle, Size};

/// Orientation derived from the anchored edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Derive the orientation of a surface from its anchors
    ///
    /// When both pairs are balanced (all four or zero edges anchored, or one
    /// full pair only) the result is Horizontal as long as any edge is
    /// anchored, and None when nothing is.
    pub fn from_anchors(anchors: &PerEdge<bool>) -> Self {
        let horiz = anchors[Edge::Left] == anchors[Edge::Right];
        let vert = anchors[Edge::Top] == anchors[Edge::Bottom];
        let any = anchors.0.iter().any(|anchored| *anchored);

        if horiz && (!vert || any) {
            Orientation::Horizontal
        } else if vert && !horiz {
            Orientation::Vertical
        } else {
            Orientation::None
        }
    }
}

fn stretched_horizontally(anchors: &PerEdge<bool>) -> bool {
    anchors[Edge::Left] && anchors[Edge::Right]
}

fn stretched_vertically(anchors: &PerEdge<bool>) -> bool {
    anchors[Edge::Top] && anchors[Edge::Bottom]
}

/// Size to request for a given allocation, 0 along stretched axes
pub fn requested_size(anchors: &PerEdge<bool>, allocation: Size) -> Size {
    let mut size = allocation;
    if stretched_horizontally(anchors) {
        size.width = 0;
    }
    if stretched_vertically(anchors) {
        size.height = 0;
    }
    size
}

/// Exclusive zone implied by the allocation and margins
///
/// Only defined when exactly one of the edge pairs is balanced; `None` leaves
/// the current zone alone, and so does a zone outside `0..=i32::MAX`.
pub fn auto_exclusive_zone(
    anchors: &PerEdge<bool>,
    margins: &PerEdge<i32>,
    allocation: Size,
) -> Option<i32> {
    let horiz = anchors[Edge::Left] == anchors[Edge::Right];
    let vert = anchors[Edge::Top] == anchors[Edge::Bottom];

    let unanchored_margin =
        |edge: Edge| i64::from(if anchors[edge] { 0 } else { margins[edge] });

    // three i32 terms cannot overflow an i64
    let zone = if horiz && !vert {
        i64::from(allocation.height) + unanchored_margin(Edge::Top) + unanchored_margin(Edge::Bottom)
    } else if vert && !horiz {
        i64::from(allocation.width) + unanchored_margin(Edge::Left) + unanchored_margin(Edge::Right)
    } else {
        return None;
    };

    i32::try_from(zone).ok().filter(|zone| *zone >= 0)
}

/// Desired layer-shell state, kept while unmapped and replayed on map
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    pub anchors: PerEdge<bool>,
    pub margins: PerEdge<i32>,
    pub layer: Layer,
    pub namespace: Option<String>,
    pub exclusive_zone: i32,
    pub auto_exclusive_zone: bool,
    pub keyboard_mode: KeyboardMode,
    pub monitor: Option<Weak<Monitor>>,
}

/// Sizes exchanged between the toolkit, this adapter and the compositor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometrySnapshot {
    /// Last size the toolkit allocated, (0, 0) before the first allocation
    pub current_allocation: Size,
    /// Last size proposed by a configure event
    pub last_configured_size: Size,
    /// Last size sent with `set_size` on the live object
    pub cached_requested_size: Option<Size>,
}

pub struct LayerSurface {
    window: Rc<dyn HostWindow>,
    global: Rc<dyn LayerShellGlobal>,
    default_namespace: String,
    state: SurfaceState,
    geometry: GeometrySnapshot,
    orientation: Orientation,
    orientation_listeners: Vec<Box<dyn FnMut(Orientation)>>,
    handle: Option<Box<dyn LayerSurfaceHandle>>,
}

impl LayerSurface {
    pub fn new(
        window: Rc<dyn HostWindow>,
        global: Rc<dyn LayerShellGlobal>,
        defaults: &SurfaceDefaults,
    ) -> Self {
        window.set_decorated(false);

        let mut surface = Self {
            window,
            global,
            default_namespace: defaults.namespace.clone(),
            state: SurfaceState {
                layer: defaults.layer,
                exclusive_zone: defaults.exclusive_zone.max(-1),
                auto_exclusive_zone: defaults.auto_exclusive_zone,
                ..SurfaceState::default()
            },
            geometry: GeometrySnapshot::default(),
            orientation: Orientation::None,
            orientation_listeners: Vec::new(),
            handle: None,
        };
        surface.state.keyboard_mode = surface.effective_keyboard_mode(defaults.keyboard_mode);
        surface
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn geometry(&self) -> &GeometrySnapshot {
        &self.geometry
    }

    /// Whether the protocol object currently exists
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|handle| handle.id())
    }

    pub fn anchor(&self, edge: Edge) -> bool {
        self.state.anchors[edge]
    }

    pub fn margin(&self, edge: Edge) -> i32 {
        self.state.margins[edge]
    }

    pub fn layer(&self) -> Layer {
        self.state.layer
    }

    /// Effective namespace, the default when none was set
    pub fn namespace(&self) -> &str {
        self.state
            .namespace
            .as_deref()
            .unwrap_or(&self.default_namespace)
    }

    pub fn monitor(&self) -> Option<Rc<Monitor>> {
        self.state.monitor.as_ref().and_then(Weak::upgrade)
    }

    pub fn exclusive_zone(&self) -> i32 {
        self.state.exclusive_zone
    }

    pub fn auto_exclusive_zone(&self) -> bool {
        self.state.auto_exclusive_zone
    }

    pub fn keyboard_mode(&self) -> KeyboardMode {
        self.state.keyboard_mode
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Size that the current anchors and allocation ask for
    pub fn requested_size(&self) -> Size {
        requested_size(&self.state.anchors, self.geometry.current_allocation)
    }

    pub fn connect_orientation_changed(&mut self, listener: impl FnMut(Orientation) + 'static) {
        self.orientation_listeners.push(Box::new(listener));
    }

    pub fn set_monitor(&mut self, monitor: Option<&Rc<Monitor>>) -> Apply {
        // a monitor the toolkit already dropped counts as none
        let unchanged = match (self.monitor(), monitor) {
            (None, None) => true,
            (Some(current), Some(new)) => Rc::ptr_eq(&current, new),
            _ => false,
        };
        if unchanged {
            if monitor.is_none() {
                self.state.monitor = None;
            }
            return Apply::Nothing;
        }
        self.state.monitor = monitor.map(Rc::downgrade);
        self.remap_if_mapped()
    }

    pub fn set_namespace(&mut self, namespace: Option<&str>) -> Apply {
        if self.state.namespace.as_deref() == namespace {
            return Apply::Nothing;
        }
        self.state.namespace = namespace.map(str::to_owned);
        self.remap_if_mapped()
    }

    pub fn set_layer(&mut self, layer: Layer) -> Apply {
        if self.state.layer == layer {
            return Apply::Nothing;
        }
        self.state.layer = layer;
        match &self.handle {
            Some(handle) if handle.version() >= SET_LAYER_SINCE_VERSION => {
                handle.set_layer(layer);
                Apply::Commit
            }
            Some(handle) => {
                debug!(
                    "Layer surface v{} cannot change layer in place, remapping",
                    handle.version()
                );
                Apply::Remap
            }
            None => Apply::Nothing,
        }
    }

    pub fn set_anchor(&mut self, edge: Edge, anchor: bool) -> Apply {
        if self.state.anchors[edge] == anchor {
            return Apply::Nothing;
        }
        self.state.anchors[edge] = anchor;
        self.update_orientation();

        if let Some(handle) = &self.handle {
            handle.set_anchor(&self.state.anchors);
            self.update_size();
        }
        self.update_auto_exclusive_zone();
        self.commit_if_mapped()
    }

    pub fn set_margin(&mut self, edge: Edge, margin: i32) -> Apply {
        if self.state.margins[edge] == margin {
            return Apply::Nothing;
        }
        self.state.margins[edge] = margin;
        if let Some(handle) = &self.handle {
            handle.set_margin(&self.state.margins);
        }
        self.update_auto_exclusive_zone();
        self.commit_if_mapped()
    }

    /// Set a fixed exclusive zone; turns automatic exclusive zone off
    pub fn set_exclusive_zone(&mut self, zone: i32) -> Apply {
        self.state.auto_exclusive_zone = false;
        let zone = zone.max(-1);
        if self.state.exclusive_zone == zone {
            return Apply::Nothing;
        }
        self.state.exclusive_zone = zone;
        match &self.handle {
            Some(handle) => {
                handle.set_exclusive_zone(zone);
                Apply::Commit
            }
            None => Apply::Nothing,
        }
    }

    pub fn set_auto_exclusive_zone(&mut self, enabled: bool) -> Apply {
        if self.state.auto_exclusive_zone == enabled {
            return Apply::Nothing;
        }
        self.state.auto_exclusive_zone = enabled;
        if !enabled {
            return Apply::Nothing;
        }
        let before = self.state.exclusive_zone;
        self.update_auto_exclusive_zone();
        if self.state.exclusive_zone != before {
            self.commit_if_mapped()
        } else {
            Apply::Nothing
        }
    }

    pub fn set_keyboard_mode(&mut self, mode: KeyboardMode) -> Apply {
        let mode = self.effective_keyboard_mode(mode);
        if self.state.keyboard_mode == mode {
            return Apply::Nothing;
        }
        self.state.keyboard_mode = mode;
        match &self.handle {
            Some(handle) => {
                handle.set_keyboard_interactivity(mode);
                Apply::Commit
            }
            None => Apply::Nothing,
        }
    }

    fn effective_keyboard_mode(&self, mode: KeyboardMode) -> KeyboardMode {
        let version = self.global.version();
        if mode == KeyboardMode::OnDemand && version < KEYBOARD_ON_DEMAND_SINCE_VERSION {
            warn!(
                "Compositor uses layer shell version {}, which does not support on-demand keyboard interactivity, using exclusive mode",
                version
            );
            KeyboardMode::Exclusive
        } else {
            mode
        }
    }

    fn remap_if_mapped(&self) -> Apply {
        if self.handle.is_some() {
            Apply::Remap
        } else {
            Apply::Nothing
        }
    }

    fn commit_if_mapped(&self) -> Apply {
        if self.handle.is_some() {
            Apply::Commit
        } else {
            Apply::Nothing
        }
    }

    fn update_orientation(&mut self) {
        let orientation = Orientation::from_anchors(&self.state.anchors);
        if orientation != self.orientation {
            debug!(
                "Window {} orientation {:?} -> {:?}",
                self.window.id(),
                self.orientation,
                orientation
            );
            self.orientation = orientation;
            for listener in &mut self.orientation_listeners {
                listener(orientation);
            }
        }
    }

    /// Send `set_size` if the requested size differs from the last one sent
    fn send_set_size(&mut self) {
        let request = self.requested_size();
        let Some(handle) = &self.handle else {
            return;
        };
        if self.geometry.cached_requested_size != Some(request) {
            self.geometry.cached_requested_size = Some(request);
            handle.set_size(request.width.max(0) as u32, request.height.max(0) as u32);
        }
    }

    /// Pin stretched axes to the configured size, then re-request
    fn update_size(&mut self) {
        let mut hints = GeometryHints::unconstrained();
        if stretched_horizontally(&self.state.anchors) {
            hints = hints.fix_width(self.geometry.last_configured_size.width);
        }
        if stretched_vertically(&self.state.anchors) {
            hints = hints.fix_height(self.geometry.last_configured_size.height);
        }
        self.window.set_geometry_hints(hints);

        // the hints normally lead to a new allocation, but not always (for
        // example when stretching after a size request), so request now too
        self.send_set_size();
    }

    fn update_auto_exclusive_zone(&mut self) {
        if !self.state.auto_exclusive_zone {
            return;
        }
        let Some(zone) = auto_exclusive_zone(
            &self.state.anchors,
            &self.state.margins,
            self.geometry.current_allocation,
        ) else {
            return;
        };
        if zone != self.state.exclusive_zone {
            self.state.exclusive_zone = zone;
            if let Some(handle) = &self.handle {
                handle.set_exclusive_zone(zone);
            }
        }
    }
}

impl ShellSurface for LayerSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Layer
    }

    fn map(&mut self) -> bool {
        if self.handle.is_some() {
            warn!("Window {} already has a layer surface", self.window.id());
            return true;
        }

        let output = self.monitor();
        let request = LayerSurfaceRequest {
            window: self.window.as_ref(),
            output: output.as_deref(),
            layer: self.state.layer,
            namespace: self.namespace(),
        };
        let handle = match self.global.get_layer_surface(request) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create layer surface for window {}: {}", self.window.id(), e);
                return false;
            }
        };
        debug!(
            "Window {} mapped as layer surface {:?} on {:?} layer",
            self.window.id(),
            handle.id(),
            self.state.layer
        );

        handle.set_keyboard_interactivity(self.state.keyboard_mode);
        handle.set_exclusive_zone(self.state.exclusive_zone);
        handle.set_anchor(&self.state.anchors);
        handle.set_margin(&self.state.margins);
        self.handle = Some(handle);
        self.geometry.cached_requested_size = None;
        self.send_set_size();
        true
    }

    fn unmap(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Destroying layer surface {:?}", handle.id());
            handle.destroy();
        }
        self.geometry.cached_requested_size = None;
    }

    fn finalize(&mut self) {
        self.unmap();
        self.orientation_listeners.clear();
        self.state.namespace = None;
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
        Rectangle::default()
    }

    fn size_allocated(&mut self, width: i32, height: i32) {
        let allocation = Size::new(width, height);
        if self.geometry.current_allocation != allocation {
            self.geometry.current_allocation = allocation;
            self.send_set_size();
            self.update_auto_exclusive_zone();
        }
    }

    fn handle_event(&mut self, handle: HandleId, event: &ShellEvent) {
        let Some(current) = &self.handle else {
            debug!("Dropping {:?}, layer surface is not mapped", event);
            return;
        };
        if current.id() != handle {
            debug!("Dropping {:?} for stale layer surface {:?}", event, handle);
            return;
        }

        match *event {
            ShellEvent::LayerConfigure {
                serial,
                width,
                height,
            } => {
                current.ack_configure(serial);
                self.geometry.last_configured_size = Size::new(
                    i32::try_from(width).unwrap_or(i32::MAX),
                    i32::try_from(height).unwrap_or(i32::MAX),
                );
                self.update_size();
            }
            ShellEvent::Closed => {
                debug!("Layer surface of window {} closed by compositor", self.window.id());
                self.window.close();
            }
            ref other => debug!("Layer surface ignoring {:?}", other),
        }
    }

    fn as_layer(&self) -> Option<&LayerSurface> {
        Some(self)
    }

    fn as_layer_mut(&mut self) -> Option<&mut LayerSurface> {
        Some(self)
    }
}

impl fmt::Debug for LayerSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerSurface")
            .field("window", &self.window.id())
            .field("state", &self.state)
            .field("geometry", &self.geometry)
            .field("orientation", &self.orientation)
            .field("handle", &self.handle_id())
            .finish()
    }
}
