//! Pure mappings from toolkit-level values to protocol enums and bitmasks

use wayland_protocols::xdg::shell::client::{xdg_positioner, xdg_toplevel};
use wayland_protocols_wlr::layer_shell::v1::client::{zwlr_layer_shell_v1, zwlr_layer_surface_v1};

use super::{Edge, KeyboardMode, Layer, PerEdge, ToplevelStates};
use crate::window::{AnchorHints, Gravity, WindowEdge};

/// Anchor bitmask for the set of anchored edges
pub fn anchor_bits(anchors: &PerEdge<bool>) -> zwlr_layer_surface_v1::Anchor {
    let mut bits = zwlr_layer_surface_v1::Anchor::empty();
    if anchors[Edge::Left] {
        bits |= zwlr_layer_surface_v1::Anchor::Left;
    }
    if anchors[Edge::Right] {
        bits |= zwlr_layer_surface_v1::Anchor::Right;
    }
    if anchors[Edge::Top] {
        bits |= zwlr_layer_surface_v1::Anchor::Top;
    }
    if anchors[Edge::Bottom] {
        bits |= zwlr_layer_surface_v1::Anchor::Bottom;
    }
    bits
}

pub fn layer(layer: Layer) -> zwlr_layer_shell_v1::Layer {
    match layer {
        Layer::Background => zwlr_layer_shell_v1::Layer::Background,
        Layer::Bottom => zwlr_layer_shell_v1::Layer::Bottom,
        Layer::Top => zwlr_layer_shell_v1::Layer::Top,
        Layer::Overlay => zwlr_layer_shell_v1::Layer::Overlay,
    }
}

pub fn keyboard_interactivity(mode: KeyboardMode) -> zwlr_layer_surface_v1::KeyboardInteractivity {
    match mode {
        KeyboardMode::None => zwlr_layer_surface_v1::KeyboardInteractivity::None,
        KeyboardMode::Exclusive => zwlr_layer_surface_v1::KeyboardInteractivity::Exclusive,
        KeyboardMode::OnDemand => zwlr_layer_surface_v1::KeyboardInteractivity::OnDemand,
    }
}

pub fn resize_edge(edge: WindowEdge) -> xdg_toplevel::ResizeEdge {
    match edge {
        WindowEdge::NorthWest => xdg_toplevel::ResizeEdge::TopLeft,
        WindowEdge::North => xdg_toplevel::ResizeEdge::Top,
        WindowEdge::NorthEast => xdg_toplevel::ResizeEdge::TopRight,
        WindowEdge::West => xdg_toplevel::ResizeEdge::Left,
        WindowEdge::East => xdg_toplevel::ResizeEdge::Right,
        WindowEdge::SouthWest => xdg_toplevel::ResizeEdge::BottomLeft,
        WindowEdge::South => xdg_toplevel::ResizeEdge::Bottom,
        WindowEdge::SouthEast => xdg_toplevel::ResizeEdge::BottomRight,
    }
}

/// Positioner gravity for the point of the popup that is attached
///
/// Toolkit gravity names the attached point; positioner gravity names the
/// direction the popup extends in, which is the opposite corner.
pub fn positioner_gravity(gravity: Gravity) -> xdg_positioner::Gravity {
    match gravity {
        Gravity::NorthWest => xdg_positioner::Gravity::BottomRight,
        Gravity::North => xdg_positioner::Gravity::Bottom,
        Gravity::NorthEast => xdg_positioner::Gravity::BottomLeft,
        Gravity::West => xdg_positioner::Gravity::Right,
        Gravity::Center => xdg_positioner::Gravity::None,
        Gravity::East => xdg_positioner::Gravity::Left,
        Gravity::SouthWest => xdg_positioner::Gravity::TopRight,
        Gravity::South => xdg_positioner::Gravity::Top,
        Gravity::SouthEast => xdg_positioner::Gravity::TopLeft,
        Gravity::Static => xdg_positioner::Gravity::None,
    }
}

pub fn positioner_anchor(anchor: Gravity) -> xdg_positioner::Anchor {
    match anchor {
        Gravity::NorthWest => xdg_positioner::Anchor::TopLeft,
        Gravity::North => xdg_positioner::Anchor::Top,
        Gravity::NorthEast => xdg_positioner::Anchor::TopRight,
        Gravity::West => xdg_positioner::Anchor::Left,
        Gravity::Center => xdg_positioner::Anchor::None,
        Gravity::East => xdg_positioner::Anchor::Right,
        Gravity::SouthWest => xdg_positioner::Anchor::BottomLeft,
        Gravity::South => xdg_positioner::Anchor::Bottom,
        Gravity::SouthEast => xdg_positioner::Anchor::BottomRight,
        Gravity::Static => xdg_positioner::Anchor::None,
    }
}

pub fn constraint_adjustment(hints: AnchorHints) -> xdg_positioner::ConstraintAdjustment {
    let mut adjustment = xdg_positioner::ConstraintAdjustment::empty();
    if hints.contains(AnchorHints::FLIP_X) {
        adjustment |= xdg_positioner::ConstraintAdjustment::FlipX;
    }
    if hints.contains(AnchorHints::FLIP_Y) {
        adjustment |= xdg_positioner::ConstraintAdjustment::FlipY;
    }
    if hints.contains(AnchorHints::SLIDE_X) {
        adjustment |= xdg_positioner::ConstraintAdjustment::SlideX;
    }
    if hints.contains(AnchorHints::SLIDE_Y) {
        adjustment |= xdg_positioner::ConstraintAdjustment::SlideY;
    }
    if hints.contains(AnchorHints::RESIZE_X) {
        adjustment |= xdg_positioner::ConstraintAdjustment::ResizeX;
    }
    if hints.contains(AnchorHints::RESIZE_Y) {
        adjustment |= xdg_positioner::ConstraintAdjustment::ResizeY;
    }
    adjustment
}

/// Decode the `states` array of `xdg_toplevel.configure`
///
/// The array holds native-endian u32 values; unknown values are skipped.
pub fn toplevel_states(raw: &[u8]) -> ToplevelStates {
    raw.chunks_exact(4)
        .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .fold(ToplevelStates::empty(), |states, value| {
            states
                | match value {
                    1 => ToplevelStates::MAXIMIZED,
                    2 => ToplevelStates::FULLSCREEN,
                    3 => ToplevelStates::RESIZING,
                    4 => ToplevelStates::ACTIVATED,
                    5 => ToplevelStates::TILED_LEFT,
                    6 => ToplevelStates::TILED_RIGHT,
                    7 => ToplevelStates::TILED_TOP,
                    8 => ToplevelStates::TILED_BOTTOM,
                    9 => ToplevelStates::SUSPENDED,
                    _ => ToplevelStates::empty(),
                }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_bits() {
        let mut anchors = PerEdge::splat(false);
        assert!(anchor_bits(&anchors).is_empty());

        anchors[Edge::Left] = true;
        anchors[Edge::Top] = true;
        let bits = anchor_bits(&anchors);
        assert_eq!(
            bits,
            zwlr_layer_surface_v1::Anchor::Left | zwlr_layer_surface_v1::Anchor::Top
        );
        // top = 1, left = 4 on the wire
        assert_eq!(bits.bits(), 5);
    }

    #[test]
    fn test_gravity_is_inverted_but_anchor_is_not() {
        assert_eq!(
            positioner_gravity(Gravity::NorthWest),
            xdg_positioner::Gravity::BottomRight
        );
        assert_eq!(
            positioner_anchor(Gravity::NorthWest),
            xdg_positioner::Anchor::TopLeft
        );
        assert_eq!(positioner_gravity(Gravity::Static), xdg_positioner::Gravity::None);
        assert_eq!(positioner_anchor(Gravity::Center), xdg_positioner::Anchor::None);
    }

    #[test]
    fn test_constraint_adjustment() {
        assert!(constraint_adjustment(AnchorHints::empty()).is_empty());
        assert_eq!(
            constraint_adjustment(AnchorHints::FLIP | AnchorHints::RESIZE_Y),
            xdg_positioner::ConstraintAdjustment::FlipX
                | xdg_positioner::ConstraintAdjustment::FlipY
                | xdg_positioner::ConstraintAdjustment::ResizeY
        );
    }

    #[test]
    fn test_resize_edge() {
        assert_eq!(resize_edge(WindowEdge::SouthEast), xdg_toplevel::ResizeEdge::BottomRight);
        assert_eq!(resize_edge(WindowEdge::West), xdg_toplevel::ResizeEdge::Left);
    }

    #[test]
    fn test_toplevel_states() {
        let raw: Vec<u8> = [4u32, 1, 42]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        assert_eq!(
            toplevel_states(&raw),
            ToplevelStates::ACTIVATED | ToplevelStates::MAXIMIZED
        );
        assert_eq!(toplevel_states(&[1, 0]), ToplevelStates::empty());
    }
}
