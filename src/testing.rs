//! Recording fakes for the protocol and toolkit boundaries

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wayland_client::protocol::wl_surface::WlSurface;

use crate::error::ShellError;
use crate::protocol::{
    GlobalSource, Globals, HandleId, KeyboardMode, Layer, LayerShellGlobal, LayerSurfaceHandle,
    LayerSurfaceRequest, PerEdge, PopupHandle, ToplevelHandle, ToplevelShellGlobal,
};
use crate::window::{
    GeometryHints, HostWindow, PointerGrab, PopupPlacement, Size, WindowEdge, WindowId,
};

/// One protocol request as seen by a fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetLayerSurface {
        layer: Layer,
        namespace: String,
        output: Option<String>,
    },
    SetSize(u32, u32),
    SetAnchor(PerEdge<bool>),
    SetMargin(PerEdge<i32>),
    SetExclusiveZone(i32),
    SetKeyboardInteractivity(KeyboardMode),
    SetLayer(Layer),
    AckConfigure(u32),
    GetPopup,
    Destroy,
    GetToplevel,
    SetAppId(String),
    Move(u32),
    Resize(u32, WindowEdge),
    DestroyPopup,
}

/// Shared, ordered log of every request sent to any fake object
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Rc<RefCell<Vec<(HandleId, Request)>>>);

impl RequestLog {
    pub fn push(&self, handle: HandleId, request: Request) {
        self.0.borrow_mut().push((handle, request));
    }

    pub fn entries(&self) -> Vec<(HandleId, Request)> {
        self.0.borrow().clone()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.0.borrow().iter().map(|(_, r)| r.clone()).collect()
    }

    pub fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.0.borrow().iter().filter(|(_, r)| pred(r)).count()
    }

    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|(_, r)| match r {
                Request::SetSize(w, h) => Some((*w, *h)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct FakeLayerShell {
    version: u32,
    log: RequestLog,
    pub fail: Cell<bool>,
    pub created: RefCell<Vec<HandleId>>,
}

impl FakeLayerShell {
    pub fn new(version: u32, log: RequestLog) -> Self {
        Self {
            version,
            log,
            fail: Cell::new(false),
            created: RefCell::new(Vec::new()),
        }
    }

    pub fn last_handle(&self) -> Option<HandleId> {
        self.created.borrow().last().copied()
    }
}

impl LayerShellGlobal for FakeLayerShell {
    fn version(&self) -> u32 {
        self.version
    }

    fn get_layer_surface(
        &self,
        request: LayerSurfaceRequest<'_>,
    ) -> Result<Box<dyn LayerSurfaceHandle>, ShellError> {
        if self.fail.get() {
            return Err(ShellError::NoWlSurface);
        }
        let id = HandleId::next();
        self.log.push(
            id,
            Request::GetLayerSurface {
                layer: request.layer,
                namespace: request.namespace.to_owned(),
                output: request.output.map(|m| m.name().to_owned()),
            },
        );
        self.created.borrow_mut().push(id);
        Ok(Box::new(FakeLayerSurface {
            id,
            version: self.version,
            log: self.log.clone(),
        }))
    }
}

pub struct FakeLayerSurface {
    id: HandleId,
    version: u32,
    log: RequestLog,
}

impl LayerSurfaceHandle for FakeLayerSurface {
    fn id(&self) -> HandleId {
        self.id
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn set_size(&self, width: u32, height: u32) {
        self.log.push(self.id, Request::SetSize(width, height));
    }

    fn set_anchor(&self, anchors: &PerEdge<bool>) {
        self.log.push(self.id, Request::SetAnchor(*anchors));
    }

    fn set_margin(&self, margins: &PerEdge<i32>) {
        self.log.push(self.id, Request::SetMargin(*margins));
    }

    fn set_exclusive_zone(&self, zone: i32) {
        self.log.push(self.id, Request::SetExclusiveZone(zone));
    }

    fn set_keyboard_interactivity(&self, mode: KeyboardMode) {
        self.log.push(self.id, Request::SetKeyboardInteractivity(mode));
    }

    fn set_layer(&self, layer: Layer) {
        self.log.push(self.id, Request::SetLayer(layer));
    }

    fn ack_configure(&self, serial: u32) {
        self.log.push(self.id, Request::AckConfigure(serial));
    }

    fn get_popup(
        &self,
        _popup: &dyn HostWindow,
        _placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        self.log.push(self.id, Request::GetPopup);
        Ok(Box::new(FakePopup {
            id: HandleId::next(),
            log: self.log.clone(),
        }))
    }

    fn destroy(self: Box<Self>) {
        self.log.push(self.id, Request::Destroy);
    }
}

pub struct FakeToplevelShell {
    log: RequestLog,
    pub created: RefCell<Vec<HandleId>>,
}

impl FakeToplevelShell {
    pub fn new(log: RequestLog) -> Self {
        Self {
            log,
            created: RefCell::new(Vec::new()),
        }
    }

    pub fn last_handle(&self) -> Option<HandleId> {
        self.created.borrow().last().copied()
    }
}

impl ToplevelShellGlobal for FakeToplevelShell {
    fn version(&self) -> u32 {
        5
    }

    fn get_toplevel(&self, _window: &dyn HostWindow) -> Result<Box<dyn ToplevelHandle>, ShellError> {
        let id = HandleId::next();
        self.log.push(id, Request::GetToplevel);
        self.created.borrow_mut().push(id);
        Ok(Box::new(FakeToplevel {
            id,
            log: self.log.clone(),
        }))
    }
}

pub struct FakeToplevel {
    id: HandleId,
    log: RequestLog,
}

impl ToplevelHandle for FakeToplevel {
    fn id(&self) -> HandleId {
        self.id
    }

    fn set_app_id(&self, app_id: &str) {
        self.log.push(self.id, Request::SetAppId(app_id.to_owned()));
    }

    fn start_move(&self, grab: &PointerGrab) {
        self.log.push(self.id, Request::Move(grab.serial));
    }

    fn start_resize(&self, grab: &PointerGrab, edge: WindowEdge) {
        self.log.push(self.id, Request::Resize(grab.serial, edge));
    }

    fn ack_configure(&self, serial: u32) {
        self.log.push(self.id, Request::AckConfigure(serial));
    }

    fn get_popup(
        &self,
        _popup: &dyn HostWindow,
        _placement: &PopupPlacement,
    ) -> Result<Box<dyn PopupHandle>, ShellError> {
        self.log.push(self.id, Request::GetPopup);
        Ok(Box::new(FakePopup {
            id: HandleId::next(),
            log: self.log.clone(),
        }))
    }

    fn destroy(self: Box<Self>) {
        self.log.push(self.id, Request::Destroy);
    }
}

pub struct FakePopup {
    id: HandleId,
    log: RequestLog,
}

impl PopupHandle for FakePopup {
    fn id(&self) -> HandleId {
        self.id
    }

    fn destroy(self: Box<Self>) {
        self.log.push(self.id, Request::DestroyPopup);
    }
}

/// A global source backed by fakes
pub struct FakeSource {
    pub layer_shell: Option<Rc<FakeLayerShell>>,
    pub toplevel_shell: Option<Rc<FakeToplevelShell>>,
}

impl GlobalSource for FakeSource {
    fn discover(&self) -> Globals {
        Globals {
            layer_shell: self
                .layer_shell
                .clone()
                .map(|g| g as Rc<dyn LayerShellGlobal>),
            toplevel_shell: self
                .toplevel_shell
                .clone()
                .map(|g| g as Rc<dyn ToplevelShellGlobal>),
        }
    }
}

/// A toolkit window that records what the binding did to it
#[derive(Debug, Default)]
pub struct FakeWindow {
    id: u64,
    pub hints: RefCell<Vec<GeometryHints>>,
    pub decorated: Cell<Option<bool>>,
    pub closed: Cell<bool>,
    pub redraws: Cell<u32>,
    pub commits: Cell<u32>,
    pub resizes: RefCell<Vec<Size>>,
}

impl FakeWindow {
    pub fn new(id: u64) -> Rc<Self> {
        Rc::new(Self {
            id,
            ..Default::default()
        })
    }

    pub fn last_hints(&self) -> Option<GeometryHints> {
        self.hints.borrow().last().copied()
    }
}

impl HostWindow for FakeWindow {
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
        self.resizes.borrow_mut().push(Size::new(width, height));
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
