//! Shared fakes for the integration tests
//!
//! A scripted compositor: globals that hand out recording protocol objects,
//! and a toolkit window that records what the shell asked of it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pip_shell::protocol::{
    GlobalSource, Globals, HandleId, KeyboardMode, Layer, LayerShellGlobal, LayerSurfaceHandle,
    LayerSurfaceRequest, PerEdge, PopupHandle, ToplevelHandle, ToplevelShellGlobal,
};
use pip_shell::window::{GeometryHints, HostWindow, PointerGrab, PopupPlacement, WindowEdge, WindowId};
use pip_shell::{ProtocolRegistry, ShellConfig, ShellError};
use wayland_client::protocol::wl_surface::WlSurface;

/// Wire-level view of what the shell sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    LayerSurface { namespace: String, layer: Layer, output: Option<String> },
    Size(u32, u32),
    Anchor(PerEdge<bool>),
    Margin(PerEdge<i32>),
    ExclusiveZone(i32),
    Keyboard(KeyboardMode),
    Layer(Layer),
    Ack(u32),
    Popup,
    Destroy,
    Toplevel,
    AppId(String),
    Move(u32),
    Resize(u32, WindowEdge),
}

#[derive(Clone, Default)]
pub struct Wire(Rc<RefCell<Vec<(HandleId, Sent)>>>);

impl Wire {
    fn send(&self, handle: HandleId, sent: Sent) {
        self.0.borrow_mut().push((handle, sent));
    }

    pub fn all(&self) -> Vec<Sent> {
        self.0.borrow().iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn on(&self, handle: HandleId) -> Vec<Sent> {
        self.0
            .borrow()
            .iter()
            .filter(|(h, _)| *h == handle)
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Sent) -> bool) -> usize {
        self.0.borrow().iter().filter(|(_, s)| pred(s)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct ScriptedLayerShell {
    pub version: u32,
    pub wire: Wire,
}

impl LayerShellGlobal for ScriptedLayerShell {
    fn version(&self) -> u32 {
        self.version
    }

    fn get_layer_surface(
        &self,
        request: LayerSurfaceRequest<'_>,
    ) -> Result<Box<dyn LayerSurfaceHandle>, ShellError> {
        let id = HandleId::next();
        self.wire.send(
            id,
            Sent::LayerSurface {
                namespace: request.namespace.to_string(),
                layer: request.layer,
                output: request.output.map(|m| m.name().to_string()),
            },
        );
        Ok(Box::new(ScriptedLayerSurface {
            id,
            version: self.version,
            wire: self.wire.clone(),
        }))
    }
}

struct ScriptedLayerSurface {
    id: HandleId,
    version: u32,
    wire: Wire,
}

impl LayerSurfaceHandle for ScriptedLayerSurface {
    fn id(&self) -> HandleId {
        self.id
    }
    fn version(&self) -> u32 {
        self.version
    }
    fn set_size(&self, width: u32, height: u32) {
        self.wire.send(self.id, Sent::Size(width, height));
    }
    fn set_anchor(&self, anchors: &PerEdge<bool>) {
        self.wire.send(self.id, Sent::Anchor(*anchors));
    }
    fn set_margin(&self, margins: &PerEdge<i32>) {
        self.wire.send(self.id, Sent::Margin(*margins));
    }
    fn set_exclusive_zone(&self, zone: i32) {
        self.wire.send(self.id, Sent::ExclusiveZone(zone));
    }
    fn set_keyboard_interactivity(&self, mode: KeyboardMode) {
        self.wire.send(self.id, Sent::Keyboard(mode));
    }
    fn set_layer(&self, layer: Layer) {
        self.wire.send(self.id, Sent::Layer(layer));
    }
    fn ack_configure(&self, serial: u32) {
        self.wire.send(self.id, Sent::Ack(serial));
    }
    fn get_popup(
        &self,
        _popup: &dyn HostWindow,
        _placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        self.wire.send(self.id, Sent::Popup);
        Ok(Box::new(ScriptedPopup(HandleId::next())))
    }
    fn destroy(self: Box<Self>) {
        self.wire.send(self.id, Sent::Destroy);
    }
}

pub struct ScriptedXdgShell {
    pub wire: Wire,
}

impl ToplevelShellGlobal for ScriptedXdgShell {
    fn version(&self) -> u32 {
        6
    }

    fn get_toplevel(&self, _window: &dyn HostWindow) -> Result<Box<dyn ToplevelHandle>, ShellError> {
        let id = HandleId::next();
        self.wire.send(id, Sent::Toplevel);
        Ok(Box::new(ScriptedToplevel {
            id,
            wire: self.wire.clone(),
        }))
    }
}

struct ScriptedToplevel {
    id: HandleId,
    wire: Wire,
}

impl ToplevelHandle for ScriptedToplevel {
    fn id(&self) -> HandleId {
        self.id
    }
    fn set_app_id(&self, app_id: &str) {
        self.wire.send(self.id, Sent::AppId(app_id.to_string()));
    }
    fn start_move(&self, grab: &PointerGrab) {
        self.wire.send(self.id, Sent::Move(grab.serial));
    }
    fn start_resize(&self, grab: &PointerGrab, edge: WindowEdge) {
        self.wire.send(self.id, Sent::Resize(grab.serial, edge));
    }
    fn ack_configure(&self, serial: u32) {
        self.wire.send(self.id, Sent::Ack(serial));
    }
    fn get_popup(
        &self,
        _popup: &dyn HostWindow,
        _placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        self.wire.send(self.id, Sent::Popup);
        Ok(Box::new(ScriptedPopup(HandleId::next())))
    }
    fn destroy(self: Box<Self>) {
        self.wire.send(self.id, Sent::Destroy);
    }
}

struct ScriptedPopup(HandleId);

impl PopupHandle for ScriptedPopup {
    fn id(&self) -> HandleId {
        self.0
    }
    fn destroy(self: Box<Self>) {}
}

/// Which globals the scripted compositor advertises
pub struct Compositor {
    pub layer_shell_version: Option<u32>,
    pub xdg_shell: bool,
    pub wire: Wire,
}

impl GlobalSource for Compositor {
    fn discover(&self) -> Globals {
        Globals {
            layer_shell: self.layer_shell_version.map(|version| {
                Rc::new(ScriptedLayerShell {
                    version,
                    wire: self.wire.clone(),
                }) as Rc<dyn LayerShellGlobal>
            }),
            toplevel_shell: self.xdg_shell.then(|| {
                Rc::new(ScriptedXdgShell {
                    wire: self.wire.clone(),
                }) as Rc<dyn ToplevelShellGlobal>
            }),
        }
    }
}

/// Build a shell against a scripted compositor
pub fn shell_with(layer_shell_version: Option<u32>, xdg_shell: bool) -> (pip_shell::PipShell, Wire) {
    shell_with_config(layer_shell_version, xdg_shell, &ShellConfig::default())
}

pub fn shell_with_config(
    layer_shell_version: Option<u32>,
    xdg_shell: bool,
    config: &ShellConfig,
) -> (pip_shell::PipShell, Wire) {
    let wire = Wire::default();
    let registry = ProtocolRegistry::new(Compositor {
        layer_shell_version,
        xdg_shell,
        wire: wire.clone(),
    });
    (pip_shell::PipShell::new(registry, config), wire)
}

#[derive(Default)]
pub struct TestWindow {
    pub id: u64,
    pub decorated: Cell<Option<bool>>,
    pub hints: RefCell<Vec<GeometryHints>>,
    pub resizes: RefCell<Vec<(i32, i32)>>,
    pub closed: Cell<bool>,
    pub redraws: Cell<u32>,
    pub commits: Cell<u32>,
}

impl TestWindow {
    pub fn new(id: u64) -> Rc<Self> {
        Rc::new(Self {
            id,
            ..Default::default()
        })
    }

    pub fn window_id(&self) -> WindowId {
        WindowId(self.id)
    }
}

impl HostWindow for TestWindow {
    fn id(&self) -> WindowId {
        WindowId(self.id)
    }
    fn wl_surface(&self) -> Option<WlSurface> {
        None
    }
    fn set_decorated(&self, decorated: bool) {
        self.decorated.set(Some(decorated));
    }
    fn set_geometry_hints(&self, hints: GeometryHints) {
        self.hints.borrow_mut().push(hints);
    }
    fn resize(&self, width: i32, height: i32) {
        self.resizes.borrow_mut().push((width, height));
    }
    fn close(&self) {
        self.closed.set(true);
    }
    fn queue_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }
    fn commit(&self) {
        self.commits.set(self.commits.get() + 1);
    }
}
