//! Toolkit window boundary
//!
//! The toolkit that owns the window (widget tree, rendering, input) is an
//! external collaborator. This module describes the narrow surface of it that
//! the binding needs: the window's low-level `wl_surface`, geometry hints, and
//! a way to schedule and flush commits.

use std::fmt;

use bitflags::bitflags;
use wayland_client::protocol::{wl_output::WlOutput, wl_seat::WlSeat, wl_surface::WlSurface};

/// Stable identifier of a toolkit window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Width/height pair in surface-local logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Rectangle for popup anchors and logical geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Min/max size constraints pushed onto the toolkit window
///
/// A value of -1 leaves that bound unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHints {
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl GeometryHints {
    pub const fn unconstrained() -> Self {
        Self {
            min_width: -1,
            max_width: -1,
            min_height: -1,
            max_height: -1,
        }
    }

    /// Pin the width to exactly `width`
    pub fn fix_width(mut self, width: i32) -> Self {
        self.min_width = width;
        self.max_width = width;
        self
    }

    /// Pin the height to exactly `height`
    pub fn fix_height(mut self, height: i32) -> Self {
        self.min_height = height;
        self.max_height = height;
        self
    }
}

impl Default for GeometryHints {
    fn default() -> Self {
        Self::unconstrained()
    }
}

/// An output a surface may be placed on
///
/// Layer surfaces only keep a weak reference; when the toolkit drops the
/// monitor the compositor chooses the output again on the next map.
#[derive(Debug, Clone)]
pub struct Monitor {
    name: String,
    wl_output: Option<WlOutput>,
}

impl Monitor {
    pub fn new(name: impl Into<String>, wl_output: WlOutput) -> Self {
        Self {
            name: name.into(),
            wl_output: Some(wl_output),
        }
    }

    /// A monitor with no protocol object behind it (headless toolkits, tests)
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wl_output: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wl_output(&self) -> Option<&WlOutput> {
        self.wl_output.as_ref()
    }
}

/// Seat and input serial of the user action that started a move or resize
#[derive(Debug, Clone, Default)]
pub struct PointerGrab {
    pub seat: Option<WlSeat>,
    pub serial: u32,
}

/// Toolkit-level window edges used for interactive resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEdge {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

/// Toolkit-level reference points used to place popups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gravity {
    NorthWest,
    North,
    NorthEast,
    West,
    Center,
    East,
    SouthWest,
    South,
    SouthEast,
    Static,
}

bitflags! {
    /// How a popup may be moved when it would end up off screen
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AnchorHints: u32 {
        const FLIP_X = 1 << 0;
        const FLIP_Y = 1 << 1;
        const SLIDE_X = 1 << 2;
        const SLIDE_Y = 1 << 3;
        const RESIZE_X = 1 << 4;
        const RESIZE_Y = 1 << 5;
        const FLIP = Self::FLIP_X.bits() | Self::FLIP_Y.bits();
        const SLIDE = Self::SLIDE_X.bits() | Self::SLIDE_Y.bits();
        const RESIZE = Self::RESIZE_X.bits() | Self::RESIZE_Y.bits();
    }
}

/// Placement of a popup relative to its parent, in toolkit terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupPlacement {
    /// Rectangle on the parent the popup is anchored to
    pub anchor_rect: Rectangle,
    /// Size of the popup
    pub size: Size,
    /// Point on `anchor_rect` the popup attaches to
    pub rect_anchor: Gravity,
    /// Point on the popup that is attached to `rect_anchor`
    pub popup_anchor: Gravity,
    pub hints: AnchorHints,
    pub offset: (i32, i32),
}

/// The toolkit window a binding drives
///
/// All methods take `&self`: toolkit windows are reference-counted objects
/// with their own interior state, and everything runs on the toolkit's thread.
pub trait HostWindow {
    fn id(&self) -> WindowId;

    /// The low-level surface, available once the toolkit has realized the window
    fn wl_surface(&self) -> Option<WlSurface>;

    fn set_decorated(&self, decorated: bool);

    fn set_geometry_hints(&self, hints: GeometryHints);

    /// Ask the toolkit to adopt a compositor-proposed size
    fn resize(&self, width: i32, height: i32);

    /// The compositor closed the surface
    fn close(&self);

    /// Schedule a frame so pending protocol state gets committed
    fn queue_redraw(&self);

    /// Commit the low-level surface
    fn commit(&self);
}
