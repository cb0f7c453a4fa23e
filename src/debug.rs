//! Filterable trace categories for launch debugging.
//!
//! Categories: PLATFORM, LINK, LAUNCH, CONFIG
//! Enable via: WALINK_DEBUG=launch,link (native), ?wldebug=all or
//! localStorage.setItem('walink.debug','launch') (web)

use std::sync::atomic::{AtomicU32, Ordering};

pub mod cat {
    pub const PLATFORM: u32 = 1 << 0;
    pub const LINK: u32 = 1 << 1;
    pub const LAUNCH: u32 = 1 << 2;
    pub const CONFIG: u32 = 1 << 3;
    pub const ALL: u32 = 0xffff_ffff;
}

static MASK: AtomicU32 = AtomicU32::new(0);

#[inline]
pub fn set(mask: u32) {
    MASK.store(mask, Ordering::Relaxed)
}

#[inline]
pub fn is(cat: u32) -> bool {
    (MASK.load(Ordering::Relaxed) & cat) != 0
}

#[inline]
pub fn cat_name(cat: u32) -> &'static str {
    match cat {
        c if c == cat::PLATFORM => "platform",
        c if c == cat::LINK => "link",
        c if c == cat::LAUNCH => "launch",
        c if c == cat::CONFIG => "config",
        _ => "misc",
    }
}

/// Parse a comma-separated category list. `all` sets every bit, `none` or
/// an empty token resets, unknown tokens are ignored.
pub fn parse_list(list: &str) -> u32 {
    let mut m: u32 = 0;
    for tok in list.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        match tok.as_str() {
            "" | "none" => m = 0,
            "all" => m = cat::ALL,
            "platform" => m |= cat::PLATFORM,
            "link" => m |= cat::LINK,
            "launch" => m |= cat::LAUNCH,
            "config" => m |= cat::CONFIG,
            _ => {}
        }
    }
    m
}

#[inline]
pub fn set_from_list(list: &str) {
    set(parse_list(list));
}

#[cfg(all(target_arch = "wasm32", feature = "dom-web"))]
pub fn init_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        use web_sys::window;
        if let Some(win) = window() {
            // URL query: ?wldebug=launch,link
            if let Ok(search) = win.location().search() {
                let qs = search.trim_start_matches('?');
                for part in qs.split('&') {
                    let mut it = part.splitn(2, '=');
                    let key = it.next().unwrap_or_default();
                    let val = it.next().unwrap_or_default();
                    if key.eq_ignore_ascii_case("wldebug") {
                        if let Ok(decoded) = urlencoding::decode(val) {
                            set_from_list(&decoded);
                        }
                    }
                }
            }
            if let Ok(Some(storage)) = win.local_storage() {
                if let Ok(Some(v)) = storage.get_item("walink.debug") {
                    set_from_list(&v);
                }
            }
        }
        log(cat::CONFIG, "debug init (wasm) complete");
    });
}

/// Seed the mask from `WALINK_DEBUG`. Later [`set_from_list`] calls win.
#[cfg(not(all(target_arch = "wasm32", feature = "dom-web")))]
pub fn init_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if let Ok(v) = std::env::var("WALINK_DEBUG") {
            set_from_list(&v);
        }
    });
}

#[cfg(target_arch = "wasm32")]
#[inline]
pub fn log(cat: u32, msg: impl AsRef<str>) {
    if !is(cat) {
        return;
    }
    let s = format!("[walink][{}] {}", cat_name(cat), msg.as_ref());
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(&s));
}

#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub fn log(cat: u32, msg: impl AsRef<str>) {
    if !is(cat) {
        return;
    }
    log::debug!(target: "walink", "[{}] {}", cat_name(cat), msg.as_ref());
}
