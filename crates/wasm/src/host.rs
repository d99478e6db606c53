//! Browser implementation of [`Host`]: a 2D canvas, global pointer listeners,
//! a `ResizeObserver` on the canvas container, and `requestAnimationFrame`.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use driftfield_core::{
    Command, CommandSender, DrawTarget, FieldError, Host, Measurement, Srgb, SurfaceDimensions,
};
use glam::DVec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Element, HtmlCanvasElement, MouseEvent, Performance, PointerEvent,
    ResizeObserver, Window,
};

/// The animation-frame closure, shared between the host (which schedules it)
/// and the field handle (which installs it once the scheduler exists).
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn host_err(context: &str, e: JsValue) -> FieldError {
    FieldError::Host(format!("{context}: {e:?}"))
}

fn measure_container(window: &Window, container: &Element) -> Measurement {
    let rect = container.get_bounding_client_rect();
    Measurement {
        width: rect.width(),
        height: rect.height(),
        device_ratio: window.device_pixel_ratio(),
    }
}

/// 2D context plus the backing size it fills on fade.
struct CanvasTarget {
    ctx: CanvasRenderingContext2d,
    size: DVec2,
}

impl DrawTarget for CanvasTarget {
    fn fade(&mut self, color: Srgb, alpha: f64) {
        self.ctx.set_fill_style_str(&color.to_css_rgba(alpha));
        self.ctx.fill_rect(0.0, 0.0, self.size.x, self.size.y);
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Srgb, alpha: f64) {
        self.ctx.set_fill_style_str(&color.to_css_rgba(alpha));
        self.ctx.begin_path();
        if self.ctx.arc(center.x, center.y, radius, 0.0, TAU).is_ok() {
            self.ctx.fill();
        }
    }
}

struct Observer {
    observer: ResizeObserver,
    container: Element,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

/// Everything `attach_listeners` installs, kept so it can be removed again.
struct Listeners {
    on_move: Closure<dyn FnMut(PointerEvent)>,
    on_out: Closure<dyn FnMut(MouseEvent)>,
    observer: Option<Observer>,
}

pub struct WebHost {
    window: Window,
    performance: Performance,
    canvas: HtmlCanvasElement,
    target: Option<CanvasTarget>,
    frame_cb: FrameCallback,
    frame_id: Option<i32>,
    listeners: Option<Listeners>,
}

impl WebHost {
    pub fn new(canvas: HtmlCanvasElement, frame_cb: FrameCallback) -> Result<Self, FieldError> {
        let window = web_sys::window().ok_or_else(|| FieldError::Host("no window".into()))?;
        let performance = window
            .performance()
            .ok_or_else(|| FieldError::Host("no performance clock".into()))?;
        Ok(Self {
            window,
            performance,
            canvas,
            target: None,
            frame_cb,
            frame_id: None,
            listeners: None,
        })
    }

    fn acquire_context(&self) -> Option<CanvasTarget> {
        let ctx = self
            .canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(CanvasTarget {
            ctx,
            size: DVec2::new(self.canvas.width() as f64, self.canvas.height() as f64),
        })
    }

    fn build_listeners(&self, sender: CommandSender) -> Result<Listeners, FieldError> {
        let tx = sender.clone();
        let clock = self.performance.clone();
        let on_move = Closure::wrap(Box::new(move |ev: PointerEvent| {
            tx.send(Command::PointerMove {
                client: DVec2::new(ev.client_x() as f64, ev.client_y() as f64),
                at_ms: clock.now(),
            });
        }) as Box<dyn FnMut(PointerEvent)>);

        // mouseout with no related target means the pointer left the viewport
        let tx = sender.clone();
        let on_out = Closure::wrap(Box::new(move |ev: MouseEvent| {
            if ev.related_target().is_none() {
                tx.send(Command::PointerLeave);
            }
        }) as Box<dyn FnMut(MouseEvent)>);

        let Some(container) = self.canvas.parent_element() else {
            log::warn!("canvas has no container yet; resize notifications disabled");
            return Ok(Listeners {
                on_move,
                on_out,
                observer: None,
            });
        };
        let window = self.window.clone();
        let observed = container.clone();
        let on_resize = Closure::wrap(Box::new(move |_entries: js_sys::Array| {
            let m = measure_container(&window, &observed);
            sender.send(Command::Resize {
                width: m.width,
                height: m.height,
                device_ratio: m.device_ratio,
            });
        }) as Box<dyn FnMut(js_sys::Array)>);
        let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref())
            .map_err(|e| host_err("resize observer", e))?;
        Ok(Listeners {
            on_move,
            on_out,
            observer: Some(Observer {
                observer,
                container,
                _callback: on_resize,
            }),
        })
    }

    fn register_listeners(&self) -> Result<(), FieldError> {
        let Some(listeners) = self.listeners.as_ref() else {
            return Ok(());
        };
        self.window
            .add_event_listener_with_callback("pointermove", listeners.on_move.as_ref().unchecked_ref())
            .map_err(|e| host_err("pointermove listener", e))?;
        self.window
            .add_event_listener_with_callback("mouseout", listeners.on_out.as_ref().unchecked_ref())
            .map_err(|e| host_err("mouseout listener", e))?;
        if let Some(o) = listeners.observer.as_ref() {
            o.observer.observe(&o.container);
        }
        Ok(())
    }
}

impl Host for WebHost {
    fn measure(&self) -> Option<Measurement> {
        let container = self.canvas.parent_element()?;
        Some(measure_container(&self.window, &container))
    }

    fn apply_surface(&mut self, dims: &SurfaceDimensions) {
        self.canvas.set_width(dims.backing_width());
        self.canvas.set_height(dims.backing_height());
        let style = self.canvas.style();
        let css = [
            ("width", dims.logical_width()),
            ("height", dims.logical_height()),
        ];
        for (property, value) in css {
            if let Err(e) = style.set_property(property, &format!("{value}px")) {
                log::warn!("cannot set canvas {property}: {e:?}");
            }
        }
        if let Some(target) = self.target.as_mut() {
            target.size = dims.bounds();
        }
    }

    fn attach_listeners(&mut self, sender: CommandSender) -> Result<(), FieldError> {
        self.detach_listeners();
        self.listeners = Some(self.build_listeners(sender)?);
        if let Err(e) = self.register_listeners() {
            self.detach_listeners();
            return Err(e);
        }
        log::debug!("listeners attached");
        Ok(())
    }

    fn detach_listeners(&mut self) {
        let Some(listeners) = self.listeners.take() else {
            return;
        };
        let removals = [
            ("pointermove", listeners.on_move.as_ref()),
            ("mouseout", listeners.on_out.as_ref()),
        ];
        for (event, callback) in removals {
            if let Err(e) = self
                .window
                .remove_event_listener_with_callback(event, callback.unchecked_ref())
            {
                log::warn!("cannot remove {event} listener: {e:?}");
            }
        }
        if let Some(o) = listeners.observer {
            o.observer.disconnect();
        }
        log::debug!("listeners detached");
    }

    fn request_frame(&mut self) -> Result<(), FieldError> {
        let id = {
            let cb = self.frame_cb.borrow();
            let cb = cb
                .as_ref()
                .ok_or_else(|| FieldError::Host("frame callback not installed".into()))?;
            self.window
                .request_animation_frame(cb.as_ref().unchecked_ref())
                .map_err(|e| host_err("requestAnimationFrame", e))?
        };
        self.frame_id = Some(id);
        Ok(())
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame_id.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("cannot cancel frame {id}: {e:?}");
            }
        }
    }

    fn draw_target(&mut self) -> Option<&mut dyn DrawTarget> {
        if self.target.is_none() {
            self.target = self.acquire_context();
        }
        self.target.as_mut().map(|t| t as &mut dyn DrawTarget)
    }
}
