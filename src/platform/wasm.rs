//! Clipboard for browser builds.
//!
//! Writes are fire-and-forget: the promise is driven on the local executor
//! and a rejected write is only logged.

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};

#[wasm_bindgen]
extern "C" {
    // Optional hook a hosting webview can install; missing means "use the
    // Clipboard API".
    #[wasm_bindgen(js_namespace = window, js_name = __walink_copy_text, catch)]
    fn host_copy_text(text: &str) -> Result<js_sys::Promise, JsValue>;
}

fn settle_in_background(promise: js_sys::Promise) {
    spawn_local(async move {
        if let Err(e) = JsFuture::from(promise).await {
            log::warn!("clipboard write rejected: {e:?}");
        }
    });
}

/// Copy `text`, preferring the host hook over `navigator.clipboard`.
/// Returns false when neither is available.
pub fn copy_to_clipboard(text: &str) -> bool {
    if let Ok(promise) = host_copy_text(text) {
        settle_in_background(promise);
        return true;
    }
    match web_sys::window().and_then(|win| win.navigator().clipboard()) {
        Some(clipboard) => {
            settle_in_background(clipboard.write_text(text));
            true
        }
        None => false,
    }
}
