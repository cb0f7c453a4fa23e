//! JS -> Rust surface for the site's chat button.
//!
//! ```javascript
//! import init, { walink_open, walink_copy_url, walink_platform_json } from "./walink.js";
//! await init();
//! button.onclick = () => walink_open("+1234567890", "Hello! I'm interested.");
//! copyButton.onclick = () => walink_copy_url("+1234567890", "", false);
//! ```

#![cfg(all(target_arch = "wasm32", feature = "dom-web"))]

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::launch::{self, LaunchOptions};
use crate::link;
use crate::platform::{self, browser::BrowserEnv};

thread_local! {
    static ENV: Rc<BrowserEnv> = Rc::new(BrowserEnv::new());
}

#[wasm_bindgen(start)]
pub fn walink_start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    crate::debug::init_once();
}

/// Click handler entry point. Never throws.
#[wasm_bindgen]
pub fn walink_open(phone: String, message: String) {
    ENV.with(|env| {
        let outcome = launch::open_whatsapp(env, &phone, &message, &LaunchOptions::default());
        log::debug!("walink_open: {outcome:?}");
    });
}

/// Same as [`walink_open`] with a custom fallback delay, clamped to the
/// range configuration accepts.
#[wasm_bindgen]
pub fn walink_open_with_delay(phone: String, message: String, fallback_delay_ms: u32) {
    let options = LaunchOptions::default().with_fallback_delay_ms(u64::from(fallback_delay_ms));
    ENV.with(|env| {
        launch::open_whatsapp(env, &phone, &message, &options);
    });
}

/// Throws the error message for invalid numbers.
#[wasm_bindgen]
pub fn walink_url(phone: String, message: String, is_mobile: bool) -> Result<String, JsValue> {
    link::generate_whatsapp_url(&phone, &message, is_mobile)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build a chat link and put it on the clipboard. Returns false when no
/// clipboard is reachable; throws for invalid numbers.
#[wasm_bindgen]
pub fn walink_copy_url(phone: String, message: String, is_mobile: bool) -> Result<bool, JsValue> {
    let url = walink_url(phone, message, is_mobile)?;
    Ok(platform::copy_to_clipboard(&url))
}

/// `PlatformInfo` of the current page as JSON.
#[wasm_bindgen]
pub fn walink_platform_json() -> String {
    let info = ENV.with(|env| platform::detect(&**env));
    serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
}
