//! The protocol traits over a live wayland connection
//!
//! Requests go straight to the `zwlr_layer_*` and `xdg_*` proxies. Events are
//! not handled here: each surface object carries a [`SurfaceTag`] as user data,
//! and the dispatcher turns its events into [`RoutedEvent`]s that the host
//! drains with [`WaylandConnection::dispatch_pending`] and hands to the shell.
//!
//! Two things are answered inside the dispatcher: `xdg_wm_base.ping`, and the
//! configure of popup `xdg_surface`s (popups have no adapter of their own).

use std::rc::Rc;

use anyhow::{Context, Result};
use log::{debug, warn};
use wayland_client::globals::{registry_queue_init, GlobalList, GlobalListContents};
use wayland_client::protocol::wl_registry;
use wayland_client::{delegate_noop, Connection, Dispatch, EventQueue, Proxy, QueueHandle};
use wayland_protocols::xdg::shell::client::{
    xdg_popup::XdgPopup,
    xdg_positioner::XdgPositioner,
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::ZwlrLayerShellV1,
    zwlr_layer_surface_v1::{self, ZwlrLayerSurfaceV1},
};

use super::conversions;
use super::{
    Edge, GlobalSource, Globals, HandleId, KeyboardMode, Layer, LayerShellGlobal,
    LayerSurfaceHandle, LayerSurfaceRequest, PerEdge, PopupHandle, RoutedEvent, ShellEvent,
    ToplevelHandle, ToplevelShellGlobal, LAYER_SHELL_MAX_VERSION,
};
use crate::error::ShellError;
use crate::window::{HostWindow, PointerGrab, PopupPlacement, WindowEdge, WindowId};

/// Highest `xdg_wm_base` version this crate binds
pub const XDG_WM_BASE_MAX_VERSION: u32 = 5;

/// User data of every surface object an adapter owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceTag {
    pub window: WindowId,
    pub handle: HandleId,
}

/// User data of an `xdg_surface`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdgSurfaceRole {
    Toplevel(SurfaceTag),
    Popup,
}

/// Dispatch state of the event queue: the events waiting to be routed
#[derive(Debug, Default)]
pub struct DispatchState {
    events: Vec<RoutedEvent>,
}

impl DispatchState {
    fn push(&mut self, tag: SurfaceTag, event: ShellEvent) {
        self.events.push(RoutedEvent {
            window: tag.window,
            handle: tag.handle,
            event,
        });
    }

    pub fn take_events(&mut self) -> Vec<RoutedEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Connection, event queue and registry snapshot
pub struct WaylandConnection {
    conn: Connection,
    queue: EventQueue<DispatchState>,
    state: DispatchState,
    globals: Rc<GlobalList>,
}

impl WaylandConnection {
    /// Connect to `$WAYLAND_DISPLAY`
    pub fn connect() -> Result<Self> {
        let conn = Connection::connect_to_env().context("Failed to connect to the wayland display")?;
        Self::from_connection(conn)
    }

    /// Use an existing connection, for example the toolkit's
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let (globals, queue) = registry_queue_init::<DispatchState>(&conn)
            .context("Failed to read the wayland registry")?;
        debug!(
            "Wayland registry advertised {} globals",
            globals.contents().with_list(|list| list.len())
        );
        Ok(Self {
            conn,
            queue,
            state: DispatchState::default(),
            globals: Rc::new(globals),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn queue_handle(&self) -> QueueHandle<DispatchState> {
        self.queue.handle()
    }

    /// Source for a [`ProtocolRegistry`](super::ProtocolRegistry); binds on first use
    pub fn global_source(&self) -> WaylandGlobals {
        WaylandGlobals {
            globals: self.globals.clone(),
            qh: self.queue.handle(),
        }
    }

    /// Every advertised global as `(interface, version)`
    pub fn advertised(&self) -> Vec<(String, u32)> {
        self.globals
            .contents()
            .clone_list()
            .into_iter()
            .map(|global| (global.interface, global.version))
            .collect()
    }

    /// Dispatch already-read events and return those for the shell
    pub fn dispatch_pending(&mut self) -> Result<Vec<RoutedEvent>> {
        self.queue
            .dispatch_pending(&mut self.state)
            .context("Failed to dispatch wayland events")?;
        Ok(self.state.take_events())
    }

    /// Block until at least one event arrives, then dispatch
    pub fn blocking_dispatch(&mut self) -> Result<Vec<RoutedEvent>> {
        self.queue
            .blocking_dispatch(&mut self.state)
            .context("Failed to dispatch wayland events")?;
        Ok(self.state.take_events())
    }

    pub fn roundtrip(&mut self) -> Result<Vec<RoutedEvent>> {
        self.queue
            .roundtrip(&mut self.state)
            .context("Wayland roundtrip failed")?;
        Ok(self.state.take_events())
    }

    pub fn flush(&self) -> Result<()> {
        self.conn
            .flush()
            .context("Failed to flush wayland requests")
    }
}

/// Binds the shell globals out of a registry snapshot
pub struct WaylandGlobals {
    globals: Rc<GlobalList>,
    qh: QueueHandle<DispatchState>,
}

impl GlobalSource for WaylandGlobals {
    fn discover(&self) -> Globals {
        let wm_base = match self
            .globals
            .bind::<XdgWmBase, _, _>(&self.qh, 1..=XDG_WM_BASE_MAX_VERSION, ())
        {
            Ok(wm_base) => Some(wm_base),
            Err(e) => {
                debug!("xdg_wm_base not available: {}", e);
                None
            }
        };

        let layer_shell = match self.globals.bind::<ZwlrLayerShellV1, _, _>(
            &self.qh,
            1..=LAYER_SHELL_MAX_VERSION,
            (),
        ) {
            Ok(shell) => Some(Rc::new(WaylandLayerShell {
                shell,
                wm_base: wm_base.clone(),
                qh: self.qh.clone(),
            }) as Rc<dyn LayerShellGlobal>),
            Err(e) => {
                debug!("zwlr_layer_shell_v1 not available: {}", e);
                None
            }
        };

        let toplevel_shell = wm_base.map(|wm_base| {
            Rc::new(WaylandXdgShell {
                wm_base,
                qh: self.qh.clone(),
            }) as Rc<dyn ToplevelShellGlobal>
        });

        Globals {
            layer_shell,
            toplevel_shell,
        }
    }
}

fn create_positioner(
    wm_base: &XdgWmBase,
    placement: &PopupPlacement,
    qh: &QueueHandle<DispatchState>,
) -> XdgPositioner {
    let positioner = wm_base.create_positioner(qh, ());
    // both must be non-zero or the compositor raises a protocol error
    positioner.set_size(placement.size.width.max(1), placement.size.height.max(1));
    let rect = placement.anchor_rect;
    positioner.set_anchor_rect(rect.x, rect.y, rect.width.max(1), rect.height.max(1));
    positioner.set_anchor(conversions::positioner_anchor(placement.rect_anchor));
    positioner.set_gravity(conversions::positioner_gravity(placement.popup_anchor));
    positioner.set_constraint_adjustment(conversions::constraint_adjustment(placement.hints));
    positioner.set_offset(placement.offset.0, placement.offset.1);
    positioner
}

pub struct WaylandLayerShell {
    shell: ZwlrLayerShellV1,
    wm_base: Option<XdgWmBase>,
    qh: QueueHandle<DispatchState>,
}

impl LayerShellGlobal for WaylandLayerShell {
    fn version(&self) -> u32 {
        self.shell.version()
    }

    fn get_layer_surface(
        &self,
        request: LayerSurfaceRequest<'_>,
    ) -> Result<Box<dyn LayerSurfaceHandle>, ShellError> {
        let surface = request.window.wl_surface().ok_or(ShellError::NoWlSurface)?;
        let tag = SurfaceTag {
            window: request.window.id(),
            handle: HandleId::next(),
        };
        let proxy = self.shell.get_layer_surface(
            &surface,
            request.output.and_then(|monitor| monitor.wl_output()),
            conversions::layer(request.layer),
            request.namespace.to_owned(),
            &self.qh,
            tag,
        );
        Ok(Box::new(WaylandLayerSurface {
            id: tag.handle,
            proxy,
            wm_base: self.wm_base.clone(),
            qh: self.qh.clone(),
        }))
    }
}

pub struct WaylandLayerSurface {
    id: HandleId,
    proxy: ZwlrLayerSurfaceV1,
    wm_base: Option<XdgWmBase>,
    qh: QueueHandle<DispatchState>,
}

impl LayerSurfaceHandle for WaylandLayerSurface {
    fn id(&self) -> HandleId {
        self.id
    }

    fn version(&self) -> u32 {
        self.proxy.version()
    }

    fn set_size(&self, width: u32, height: u32) {
        debug!("{:?} set_size({}, {})", self.id, width, height);
        self.proxy.set_size(width, height);
    }

    fn set_anchor(&self, anchors: &PerEdge<bool>) {
        self.proxy.set_anchor(conversions::anchor_bits(anchors));
    }

    fn set_margin(&self, margins: &PerEdge<i32>) {
        self.proxy.set_margin(
            margins[Edge::Top],
            margins[Edge::Right],
            margins[Edge::Bottom],
            margins[Edge::Left],
        );
    }

    fn set_exclusive_zone(&self, zone: i32) {
        debug!("{:?} set_exclusive_zone({})", self.id, zone);
        self.proxy.set_exclusive_zone(zone);
    }

    fn set_keyboard_interactivity(&self, mode: KeyboardMode) {
        self.proxy
            .set_keyboard_interactivity(conversions::keyboard_interactivity(mode));
    }

    fn set_layer(&self, layer: Layer) {
        self.proxy.set_layer(conversions::layer(layer));
    }

    fn ack_configure(&self, serial: u32) {
        self.proxy.ack_configure(serial);
    }

    fn get_popup(
        &self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        let wm_base = self
            .wm_base
            .as_ref()
            .ok_or(ShellError::GlobalUnavailable("xdg_wm_base"))?;
        let surface = popup.wl_surface().ok_or(ShellError::NoWlSurface)?;

        let positioner = create_positioner(wm_base, placement, &self.qh);
        let xdg_surface = wm_base.get_xdg_surface(&surface, &self.qh, XdgSurfaceRole::Popup);
        // parentless xdg popup, attached to the layer surface below
        let xdg_popup = xdg_surface.get_popup(None, &positioner, &self.qh, ());
        self.proxy.get_popup(&xdg_popup);
        positioner.destroy();

        Ok(Box::new(WaylandPopup {
            id: HandleId::next(),
            popup: xdg_popup,
            xdg_surface,
        }))
    }

    fn destroy(self: Box<Self>) {
        self.proxy.destroy();
    }
}

pub struct WaylandXdgShell {
    wm_base: XdgWmBase,
    qh: QueueHandle<DispatchState>,
}

impl ToplevelShellGlobal for WaylandXdgShell {
    fn version(&self) -> u32 {
        self.wm_base.version()
    }

    fn get_toplevel(&self, window: &dyn HostWindow) -> Result<Box<dyn ToplevelHandle>, ShellError> {
        let surface = window.wl_surface().ok_or(ShellError::NoWlSurface)?;
        let tag = SurfaceTag {
            window: window.id(),
            handle: HandleId::next(),
        };
        let xdg_surface =
            self.wm_base
                .get_xdg_surface(&surface, &self.qh, XdgSurfaceRole::Toplevel(tag));
        let toplevel = xdg_surface.get_toplevel(&self.qh, tag);
        Ok(Box::new(WaylandToplevel {
            id: tag.handle,
            xdg_surface,
            toplevel,
            wm_base: self.wm_base.clone(),
            qh: self.qh.clone(),
        }))
    }
}

pub struct WaylandToplevel {
    id: HandleId,
    xdg_surface: XdgSurface,
    toplevel: XdgToplevel,
    wm_base: XdgWmBase,
    qh: QueueHandle<DispatchState>,
}

impl ToplevelHandle for WaylandToplevel {
    fn id(&self) -> HandleId {
        self.id
    }

    fn set_app_id(&self, app_id: &str) {
        self.toplevel.set_app_id(app_id.to_owned());
    }

    fn start_move(&self, grab: &PointerGrab) {
        match &grab.seat {
            Some(seat) => self.toplevel._move(seat, grab.serial),
            None => warn!("Interactive move on {:?} without a seat", self.id),
        }
    }

    fn start_resize(&self, grab: &PointerGrab, edge: WindowEdge) {
        match &grab.seat {
            Some(seat) => self
                .toplevel
                .resize(seat, grab.serial, conversions::resize_edge(edge)),
            None => warn!("Interactive resize on {:?} without a seat", self.id),
        }
    }

    fn ack_configure(&self, serial: u32) {
        self.xdg_surface.ack_configure(serial);
    }

    fn get_popup(
        &self,
        popup: &dyn HostWindow,
        placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        let surface = popup.wl_surface().ok_or(ShellError::NoWlSurface)?;
        let positioner = create_positioner(&self.wm_base, placement, &self.qh);
        let xdg_surface = self
            .wm_base
            .get_xdg_surface(&surface, &self.qh, XdgSurfaceRole::Popup);
        let xdg_popup = xdg_surface.get_popup(Some(&self.xdg_surface), &positioner, &self.qh, ());
        positioner.destroy();

        Ok(Box::new(WaylandPopup {
            id: HandleId::next(),
            popup: xdg_popup,
            xdg_surface,
        }))
    }

    fn destroy(self: Box<Self>) {
        self.toplevel.destroy();
        self.xdg_surface.destroy();
    }
}

pub struct WaylandPopup {
    id: HandleId,
    popup: XdgPopup,
    xdg_surface: XdgSurface,
}

impl PopupHandle for WaylandPopup {
    fn id(&self) -> HandleId {
        self.id
    }

    fn destroy(self: Box<Self>) {
        self.popup.destroy();
        self.xdg_surface.destroy();
    }
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for DispatchState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, SurfaceTag> for DispatchState {
    fn event(
        state: &mut Self,
        _proxy: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        tag: &SurfaceTag,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => state.push(
                *tag,
                ShellEvent::LayerConfigure {
                    serial,
                    width,
                    height,
                },
            ),
            zwlr_layer_surface_v1::Event::Closed => state.push(*tag, ShellEvent::Closed),
            _ => {}
        }
    }
}

impl Dispatch<XdgSurface, XdgSurfaceRole> for DispatchState {
    fn event(
        state: &mut Self,
        proxy: &XdgSurface,
        event: xdg_surface::Event,
        role: &XdgSurfaceRole,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            match role {
                XdgSurfaceRole::Toplevel(tag) => {
                    state.push(*tag, ShellEvent::SurfaceConfigure { serial })
                }
                XdgSurfaceRole::Popup => proxy.ack_configure(serial),
            }
        }
    }
}

impl Dispatch<XdgToplevel, SurfaceTag> for DispatchState {
    fn event(
        state: &mut Self,
        _proxy: &XdgToplevel,
        event: xdg_toplevel::Event,
        tag: &SurfaceTag,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure {
                width,
                height,
                states,
            } => state.push(
                *tag,
                ShellEvent::ToplevelConfigure {
                    width,
                    height,
                    states: conversions::toplevel_states(&states),
                },
            ),
            xdg_toplevel::Event::Close => state.push(*tag, ShellEvent::Closed),
            _ => {}
        }
    }
}

impl Dispatch<XdgWmBase, ()> for DispatchState {
    fn event(
        _state: &mut Self,
        proxy: &XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            proxy.pong(serial);
        }
    }
}

delegate_noop!(DispatchState: ZwlrLayerShellV1);
delegate_noop!(DispatchState: XdgPositioner);
delegate_noop!(DispatchState: ignore XdgPopup);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_tagged_with_window_and_handle() {
        let mut state = DispatchState::default();
        let tag = SurfaceTag {
            window: WindowId(3),
            handle: HandleId(77),
        };
        state.push(tag, ShellEvent::Closed);
        state.push(tag, ShellEvent::SurfaceConfigure { serial: 9 });

        let events = state.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            RoutedEvent {
                window: WindowId(3),
                handle: HandleId(77),
                event: ShellEvent::Closed,
            }
        );
        assert!(state.take_events().is_empty());
    }
}
