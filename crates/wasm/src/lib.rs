#![cfg(target_arch = "wasm32")]
#![deny(unsafe_code)]
//! Browser bindings: a `ParticleField` JS class that mounts the field on a
//! canvas and drives it from `requestAnimationFrame`.

mod host;

use std::cell::RefCell;
use std::rc::Rc;

use driftfield_core::{FieldConfig, FieldError, Scheduler, Xorshift64};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use host::{FrameCallback, WebHost};

type WebField = Scheduler<WebHost, Xorshift64>;

fn to_js(e: FieldError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// Defaults for every config key, as a JSON string.
#[wasm_bindgen(js_name = defaultConfig)]
pub fn default_config() -> String {
    FieldConfig::default().to_json().to_string()
}

/// Schema for every config key, as a JSON string.
#[wasm_bindgen(js_name = configSchema)]
pub fn config_schema() -> String {
    FieldConfig::param_schema().to_string()
}

/// A particle field mounted on a canvas. Sizes itself to the canvas's parent.
#[wasm_bindgen]
pub struct ParticleField {
    inner: Rc<RefCell<WebField>>,
    _frame_cb: FrameCallback,
}

#[wasm_bindgen]
impl ParticleField {
    /// Builds a stopped field. `config` is an optional JSON object of overrides.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: Option<String>) -> Result<ParticleField, JsValue> {
        let config = match config {
            Some(text) => {
                let value: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| JsValue::from_str(&format!("invalid config JSON: {e}")))?;
                FieldConfig::from_json(&value).map_err(to_js)?
            }
            None => FieldConfig::default(),
        };

        let frame_cb: FrameCallback = Rc::new(RefCell::new(None));
        let host = WebHost::new(canvas, frame_cb.clone()).map_err(to_js)?;
        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let field = Scheduler::new(config, host, Xorshift64::new(seed)).map_err(to_js)?;
        let inner = Rc::new(RefCell::new(field));

        let weak = Rc::downgrade(&inner);
        *frame_cb.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            let Some(field) = weak.upgrade() else {
                return;
            };
            let Ok(mut field) = field.try_borrow_mut() else {
                log::warn!("frame at {ts} arrived while the field was busy");
                return;
            };
            if let Err(e) = field.tick(ts) {
                log::error!("field stopped: {e}");
            }
        }) as Box<dyn FnMut(f64)>));

        Ok(ParticleField {
            inner,
            _frame_cb: frame_cb,
        })
    }

    /// Attaches listeners, sizes the canvas and starts the frame loop.
    pub fn start(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().start().map_err(to_js)
    }

    /// Cancels the frame loop and detaches every listener. Safe to call repeatedly.
    pub fn stop(&self) {
        self.inner.borrow_mut().stop();
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().is_mounted()
    }
}

impl Drop for ParticleField {
    fn drop(&mut self) {
        if let Ok(mut field) = self.inner.try_borrow_mut() {
            field.stop();
        }
    }
}
