//! Browser environment over `web_sys` (wasm32 + `dom-web`).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{window, EventTarget};

use super::{Environment, Listener, ListenerId, PageEvent, TimerCallback, TimerId};
use crate::error::NavigationError;

struct Registered {
    event: PageEvent,
    closure: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct Inner {
    next_id: Cell<u32>,
    listeners: RefCell<HashMap<u32, Registered>>,
    timers: RefCell<HashMap<u32, Timeout>>,
}

impl Inner {
    fn next_id(&self) -> u32 {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        id
    }
}

/// Drop a JS-facing closure after the current callback returns. Dropping it
/// synchronously would free the closure that may be executing right now.
fn retire<T: 'static>(item: T) {
    wasm_bindgen_futures::spawn_local(async move {
        drop(item);
    });
}

fn js_reason(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

fn event_target(event: PageEvent) -> Option<EventTarget> {
    let win = window()?;
    match event {
        PageEvent::VisibilityChange => win.document().map(EventTarget::from),
        PageEvent::BeforeUnload => Some(EventTarget::from(win)),
    }
}

/// The real page: `navigator`, `window`, `document`, `setTimeout`.
#[derive(Clone, Default)]
pub struct BrowserEnv {
    inner: Rc<Inner>,
}

impl BrowserEnv {
    pub fn new() -> Self {
        Self::default()
    }

    fn weak(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }
}

impl Environment for BrowserEnv {
    fn has_window(&self) -> bool {
        window().is_some()
    }

    fn user_agent(&self) -> Option<String> {
        window()?.navigator().user_agent().ok()
    }

    fn open_url(&self, url: &str, target: &str) -> Result<bool, NavigationError> {
        let win = window().ok_or(NavigationError::NoWindow)?;
        win.open_with_url_and_target(url, target)
            .map(|handle| handle.is_some())
            .map_err(|e| NavigationError::refused(url, js_reason(e)))
    }

    fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        let win = window().ok_or(NavigationError::NoWindow)?;
        win.location()
            .set_href(url)
            .map_err(|e| NavigationError::refused(url, js_reason(e)))
    }

    fn is_hidden(&self) -> bool {
        window()
            .and_then(|w| w.document())
            .map(|d| d.hidden())
            .unwrap_or(false)
    }

    fn add_listener(&self, event: PageEvent, listener: Listener) -> ListenerId {
        let id = self.inner.next_id();
        let closure = Closure::<dyn FnMut()>::wrap(listener);
        if let Some(target) = event_target(event) {
            if let Err(e) = target
                .add_event_listener_with_callback(event.dom_name(), closure.as_ref().unchecked_ref())
            {
                log::warn!("addEventListener({}) failed: {}", event.dom_name(), js_reason(e));
            }
        }
        self.inner
            .listeners
            .borrow_mut()
            .insert(id, Registered { event, closure });
        ListenerId(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some(reg) = self.inner.listeners.borrow_mut().remove(&id.0) else {
            return;
        };
        if let Some(target) = event_target(reg.event) {
            let _ = target.remove_event_listener_with_callback(
                reg.event.dom_name(),
                reg.closure.as_ref().unchecked_ref(),
            );
        }
        retire(reg.closure);
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = self.inner.next_id();
        // setTimeout treats anything above i32::MAX as zero.
        let millis = delay.as_millis().min(i32::MAX as u128) as u32;
        let weak = self.weak();
        let timeout = Timeout::new(millis, move || {
            if let Some(inner) = weak.upgrade() {
                if let Some(fired) = inner.timers.borrow_mut().remove(&id) {
                    retire(fired);
                }
            }
            callback();
        });
        self.inner.timers.borrow_mut().insert(id, timeout);
        TimerId(id)
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(timeout) = self.inner.timers.borrow_mut().remove(&id.0) {
            // cancel() clears the JS timer and hands back the callback unrun.
            drop(timeout.cancel());
        }
    }

    fn alert(&self, message: &str) {
        if let Some(win) = window() {
            let _ = win.alert_with_message(message);
        }
    }

    fn report_error(&self, message: &str) {
        web_sys::console::error_1(&JsValue::from_str(message));
    }
}
