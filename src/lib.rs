pub mod engine;
pub mod error;
pub mod galaxy;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, Request, RequestInit, RequestMode,
    Response, WebGlRenderingContext, WheelEvent, Window,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use crate::engine::renderer::Renderer;
use crate::error::GalaxyError;
use crate::galaxy::config::GalaxyConfig;
use crate::galaxy::overlay::Overlay;
use crate::galaxy::view::GalaxyView;
use crate::galaxy::{Galaxy, PointerButton};

pub use crate::galaxy::Cursor;

const CONFIG_URL: &str = "assets/galaxy.json";

struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self, GalaxyError>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Listener { target: target.clone(), event, closure })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let callback = self.closure.as_ref().unchecked_ref();
        if let Err(err) = self.target.remove_event_listener_with_callback(self.event, callback) {
            log::warn!("failed to remove {} listener: {:?}", self.event, err);
        }
    }
}

/// Undo steps for a half-built mount, run newest first unless disarmed.
#[derive(Default)]
struct Rollback {
    steps: Vec<Box<dyn FnOnce()>>,
}

impl Rollback {
    fn push(&mut self, step: impl FnOnce() + 'static) {
        self.steps.push(Box::new(step));
    }

    fn disarm(mut self) {
        self.steps.clear();
    }
}

impl Drop for Rollback {
    fn drop(&mut self) {
        while let Some(step) = self.steps.pop() {
            step();
        }
    }
}

/// The self-rescheduling animation callback and the id of its pending request.
#[derive(Default)]
struct FrameLoop {
    running: Cell<bool>,
    request_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl FrameLoop {
    fn schedule(&self) {
        if !self.running.get() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(callback) = self.callback.borrow().as_ref() {
            match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => self.request_id.set(Some(id)),
                Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
            }
        }
    }

    fn cancel(&self) {
        self.running.set(false);
        if let (Some(id), Some(window)) = (self.request_id.take(), web_sys::window()) {
            if let Err(err) = window.cancel_animation_frame(id) {
                log::warn!("cancelAnimationFrame failed: {:?}", err);
            }
        }
        // drops the closure and with it the cycle through `self`
        self.callback.borrow_mut().take();
    }
}

struct Mounted {
    galaxy: Rc<RefCell<Galaxy>>,
    canvas: HtmlCanvasElement,
    overlay: Rc<RefCell<Option<Overlay>>>,
    // detached when dropped
    listeners: Vec<Listener>,
    frame_loop: Rc<FrameLoop>,
}

/// A mounted galaxy scene. Freeing the handle unmounts it.
#[wasm_bindgen]
pub struct GalaxyHandle {
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl GalaxyHandle {
    /// Stops the frame loop, removes listeners and overlay, detaches the canvas.
    pub fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            return;
        };
        mounted.frame_loop.cancel();
        drop(mounted.listeners);
        if let Some(mut overlay) = mounted.overlay.borrow_mut().take() {
            overlay.remove();
        }
        mounted.canvas.remove();
        if let Some(body) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.body()) {
            body.style().set_property("cursor", "default").ok();
        }
        log::info!("galaxy unmounted");
    }

    pub fn rotation_enabled(&self) -> bool {
        self.with_galaxy(|g| g.state().rotation_enabled()).unwrap_or(false)
    }

    pub fn rotation_speed(&self) -> f32 {
        self.with_galaxy(|g| g.state().rotation_speed()).unwrap_or(0.0)
    }

    pub fn set_rotation_enabled(&self, enabled: bool) {
        self.with_galaxy(|g| g.state_mut().set_rotation_enabled(enabled));
    }

    pub fn toggle_rotation(&self) {
        self.with_galaxy(|g| g.state_mut().toggle_rotation());
    }

    pub fn faster(&self) {
        self.with_galaxy(|g| g.state_mut().faster());
    }

    pub fn slower(&self) {
        self.with_galaxy(|g| g.state_mut().slower());
    }
}

impl Drop for GalaxyHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl GalaxyHandle {
    fn with_galaxy<T>(&self, f: impl FnOnce(&mut Galaxy) -> T) -> Option<T> {
        self.mounted.as_ref().map(|m| f(&mut m.galaxy.borrow_mut()))
    }
}

#[wasm_bindgen]
pub async fn mount(mount_id: String) -> Result<GalaxyHandle, JsValue> {
    init_logging();
    let handle = mount_into(&mount_id).await?;
    Ok(handle)
}

fn init_logging() {
    console_error_panic_hook::set_once();
    // a second mount finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Info);
}

async fn mount_into(mount_id: &str) -> Result<GalaxyHandle, GalaxyError> {
    let window = web_sys::window().ok_or(GalaxyError::NoWindow)?;
    let document = window.document().ok_or(GalaxyError::NoDocument)?;
    let mount = document
        .get_element_by_id(mount_id)
        .ok_or_else(|| GalaxyError::MountPointMissing(mount_id.to_string()))?;

    let config = match fetch_config(&window, CONFIG_URL).await {
        Ok(config) => config,
        Err(err) => {
            log::warn!("using default galaxy config: {}", err);
            GalaxyConfig::default()
        }
    };

    let (width, height) = viewport_size(&window);
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| GalaxyError::Resource("canvas element"))?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    mount.append_child(&canvas)?;
    let mut rollback = Rollback::default();
    let attached = canvas.clone();
    rollback.push(move || attached.remove());

    let gl = canvas
        .get_context("webgl")?
        .ok_or(GalaxyError::ContextUnavailable)?
        .dyn_into::<WebGlRenderingContext>()
        .map_err(|_| GalaxyError::ContextUnavailable)?;
    let renderer = Renderer::new(gl)?;

    let scheme = config.controls;
    let galaxy = Galaxy::new(config, width, height, &mut SmallRng::from_entropy());
    let view = GalaxyView::new(renderer, &galaxy)?;
    let galaxy = Rc::new(RefCell::new(galaxy));

    let overlay = if scheme.has_overlay() {
        Some(Overlay::new(&document, &mount, scheme, galaxy.clone())?)
    } else {
        None
    };
    let overlay = Rc::new(RefCell::new(overlay));

    let listeners = attach_listeners(&window, &document, &canvas, &galaxy)?;
    let frame_loop = start_frame_loop(galaxy.clone(), view, overlay.clone());
    rollback.disarm();

    log::info!("galaxy mounted into #{} ({}x{})", mount_id, width, height);

    Ok(GalaxyHandle {
        mounted: Some(Mounted { galaxy, canvas, overlay, listeners, frame_loop }),
    })
}

async fn fetch_config(window: &Window, url: &str) -> Result<GalaxyConfig, GalaxyError> {
    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)?;
    let resp: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()
        .map_err(|_| GalaxyError::Config("fetch did not return a Response".to_string()))?;
    if !resp.ok() {
        return Err(GalaxyError::Config(format!("{} returned {}", url, resp.status())));
    }

    let json = JsFuture::from(resp.json()?).await?;
    let config: GalaxyConfig =
        serde_wasm_bindgen::from_value(json).map_err(|e| GalaxyError::Config(e.to_string()))?;
    Ok(config.sanitized())
}

fn viewport_size(window: &Window) -> (f32, f32) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
    (width as f32, height as f32)
}

fn set_cursor(document: &Document, cursor: Cursor) {
    if let Some(body) = document.body() {
        body.style().set_property("cursor", cursor.as_css()).ok();
    }
}

fn attach_listeners(
    window: &Window,
    document: &Document,
    canvas: &HtmlCanvasElement,
    galaxy: &Rc<RefCell<Galaxy>>,
) -> Result<Vec<Listener>, GalaxyError> {
    let mut listeners = Vec::new();

    // Hover and click picking listen on the whole document
    let g = galaxy.clone();
    let doc = document.clone();
    listeners.push(Listener::attach(document, "mousemove", move |event| {
        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
            event.prevent_default();
            let (x, y) = (mouse.client_x() as f32, mouse.client_y() as f32);
            let cursor = g.borrow_mut().pointer_move(x, y);
            set_cursor(&doc, cursor);
        }
    })?);

    let g = galaxy.clone();
    listeners.push(Listener::attach(document, "mousedown", move |event| {
        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
            g.borrow_mut().pointer_down(mouse.client_x() as f32, mouse.client_y() as f32);
        }
    })?);

    let g = galaxy.clone();
    listeners.push(Listener::attach(document, "mouseup", move |_| {
        g.borrow_mut().end_drag();
    })?);

    // Camera controls only start from the canvas itself
    let g = galaxy.clone();
    listeners.push(Listener::attach(canvas, "mousedown", move |event| {
        if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
            let button = PointerButton::from_code(mouse.button());
            g.borrow_mut().begin_drag(button, mouse.client_x() as f32, mouse.client_y() as f32);
        }
    })?);

    let g = galaxy.clone();
    listeners.push(Listener::attach(canvas, "wheel", move |event| {
        if let Some(wheel) = event.dyn_ref::<WheelEvent>() {
            event.prevent_default();
            g.borrow_mut().wheel(wheel.delta_y() as f32);
        }
    })?);

    listeners.push(Listener::attach(canvas, "contextmenu", |event| event.prevent_default())?);

    let g = galaxy.clone();
    let win = window.clone();
    let surface = canvas.clone();
    listeners.push(Listener::attach(window, "resize", move |_| {
        let (width, height) = viewport_size(&win);
        surface.set_width(width as u32);
        surface.set_height(height as u32);
        g.borrow_mut().resize(width, height);
    })?);

    Ok(listeners)
}

fn start_frame_loop(
    galaxy: Rc<RefCell<Galaxy>>,
    view: GalaxyView,
    overlay: Rc<RefCell<Option<Overlay>>>,
) -> Rc<FrameLoop> {
    let frame_loop = Rc::new(FrameLoop::default());
    let handle = frame_loop.clone();

    *frame_loop.callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if !handle.running.get() {
            return;
        }
        {
            let mut galaxy = galaxy.borrow_mut();
            galaxy.frame();
            view.render(&galaxy);
            if let Some(overlay) = overlay.borrow().as_ref() {
                overlay.refresh(galaxy.state());
            }
        }
        handle.schedule();
    }) as Box<dyn FnMut()>));

    frame_loop.running.set(true);
    frame_loop.schedule();
    frame_loop
}
