//! Protocol boundary for the layer-shell and xdg-shell tiers
//!
//! The surface adapters never talk to wayland proxies directly. They issue
//! requests through the traits in this module and receive compositor events
//! as [`RoutedEvent`] messages, which keeps the state machine independent of
//! the connection and lets it run against recording fakes in tests.
//!
//! - [`LayerShellGlobal`] / [`LayerSurfaceHandle`]: the primary tier
//!   (`zwlr_layer_shell_v1` / `zwlr_layer_surface_v1`)
//! - [`ToplevelShellGlobal`] / [`ToplevelHandle`]: the fallback tier
//!   (`xdg_wm_base` / `xdg_toplevel`)
//! - [`registry`]: memoized discovery of both globals
//! - [`conversions`]: pure enum/bitmask mapping into protocol types
//! - [`wayland`]: the implementation over a real connection

pub mod conversions;
pub mod registry;
pub mod wayland;

use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ShellError;
use crate::window::{HostWindow, Monitor, PointerGrab, PopupPlacement, WindowEdge, WindowId};

pub use registry::{GlobalSource, Globals, ProtocolRegistry};

/// First layer-surface version that can change the layer in place
pub const SET_LAYER_SINCE_VERSION: u32 = 2;

/// First layer-shell version that knows on-demand keyboard interactivity
pub const KEYBOARD_ON_DEMAND_SINCE_VERSION: u32 = 4;

/// Highest layer-shell version this crate binds
pub const LAYER_SHELL_MAX_VERSION: u32 = 4;

/// Screen edge a layer surface can be anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum Edge {
    Left = 0,
    Right = 1,
    Top = 2,
    Bottom = 3,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u32> for Edge {
    type Error = ShellError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Edge::ALL
            .get(value as usize)
            .copied()
            .ok_or(ShellError::InvalidEdge(value))
    }
}

/// Compositor stacking tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum Layer {
    Background = 0,
    Bottom = 1,
    #[default]
    Top = 2,
    Overlay = 3,
}

impl TryFrom<u32> for Layer {
    type Error = ShellError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Layer::Background),
            1 => Ok(Layer::Bottom),
            2 => Ok(Layer::Top),
            3 => Ok(Layer::Overlay),
            other => Err(ShellError::InvalidLayer(other)),
        }
    }
}

/// Keyboard focus policy of a layer surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum KeyboardMode {
    /// Never receives keyboard focus
    #[default]
    None = 0,
    /// Takes exclusive focus while on the top or overlay layer
    Exclusive = 1,
    /// Focusable and unfocusable like a normal window (layer shell v4+)
    OnDemand = 2,
}

impl TryFrom<u32> for KeyboardMode {
    type Error = ShellError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(KeyboardMode::None),
            1 => Ok(KeyboardMode::Exclusive),
            2 => Ok(KeyboardMode::OnDemand),
            other => Err(ShellError::InvalidKeyboardMode(other)),
        }
    }
}

/// One value per [`Edge`], indexable by edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PerEdge<T>(pub [T; 4]);

impl<T: Copy> PerEdge<T> {
    pub const fn splat(value: T) -> Self {
        Self([value; 4])
    }
}

impl<T> Index<Edge> for PerEdge<T> {
    type Output = T;

    fn index(&self, edge: Edge) -> &T {
        &self.0[edge.index()]
    }
}

impl<T> IndexMut<Edge> for PerEdge<T> {
    fn index_mut(&mut self, edge: Edge) -> &mut T {
        &mut self.0[edge.index()]
    }
}

bitflags! {
    /// State flags carried by a fallback-tier configure
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ToplevelStates: u32 {
        const MAXIMIZED = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const RESIZING = 1 << 2;
        const ACTIVATED = 1 << 3;
        const TILED_LEFT = 1 << 4;
        const TILED_RIGHT = 1 << 5;
        const TILED_TOP = 1 << 6;
        const TILED_BOTTOM = 1 << 7;
        const SUSPENDED = 1 << 8;
    }
}

/// Identity of one protocol-side surface object
///
/// A remap destroys the old object and creates a new one with a fresh id, so
/// events still queued for the old object can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

impl HandleId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HandleId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Compositor-initiated events the adapters react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// `zwlr_layer_surface_v1.configure`
    LayerConfigure { serial: u32, width: u32, height: u32 },
    /// `xdg_toplevel.configure`, applied once the matching surface configure arrives
    ToplevelConfigure {
        width: i32,
        height: i32,
        states: ToplevelStates,
    },
    /// `xdg_surface.configure`
    SurfaceConfigure { serial: u32 },
    /// `zwlr_layer_surface_v1.closed` or `xdg_toplevel.close`
    Closed,
}

/// A [`ShellEvent`] tagged with the window and protocol object it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    pub window: WindowId,
    pub handle: HandleId,
    pub event: ShellEvent,
}

/// Arguments of `get_layer_surface`
pub struct LayerSurfaceRequest<'a> {
    pub window: &'a dyn HostWindow,
    pub output: Option<&'a Monitor>,
    pub layer: Layer,
    pub namespace: &'a str,
}

/// The primary tier global (`zwlr_layer_shell_v1`)
pub trait LayerShellGlobal {
    /// Negotiated version of the global
    fn version(&self) -> u32;

    fn get_layer_surface(
        &self,
        request: LayerSurfaceRequest<'_>,
    ) -> Result<Box<dyn LayerSurfaceHandle>, ShellError>;
}

/// A live `zwlr_layer_surface_v1`
pub trait LayerSurfaceHandle {
    fn id(&self) -> HandleId;

    fn version(&self) -> u32;

    fn set_size(&self, width: u32, height: u32);

    fn set_anchor(&self, anchors: &PerEdge<bool>);

    fn set_margin(&self, margins: &PerEdge<i32>);

    fn set_exclusive_zone(&self, zone: i32);

    fn set_keyboard_interactivity(&self, mode: KeyboardMode);

    /// Only valid from [`SET_LAYER_SINCE_VERSION`]
    fn set_layer(&self, layer: Layer);

    fn ack_configure(&self, serial: u32);

    fn get_popup(
        &self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError>;

    fn destroy(self: Box<Self>);
}

/// The fallback tier global (`xdg_wm_base`)
pub trait ToplevelShellGlobal {
    fn version(&self) -> u32;

    fn get_toplevel(&self, window: &dyn HostWindow) -> Result<Box<dyn ToplevelHandle>, ShellError>;
}

/// A live `xdg_surface` + `xdg_toplevel` pair
pub trait ToplevelHandle {
    fn id(&self) -> HandleId;

    fn set_app_id(&self, app_id: &str);

    fn start_move(&self, grab: &PointerGrab);

    fn start_resize(&self, grab: &PointerGrab, edge: WindowEdge);

    fn ack_configure(&self, serial: u32);

    fn get_popup(
        &self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError>;

    fn destroy(self: Box<Self>);
}

/// A popup created through one of the tiers
pub trait PopupHandle {
    fn id(&self) -> HandleId;

    fn destroy(self: Box<Self>);
}
