//! Platform abstraction: client detection and the environment provider.
//!
//! Everything that touches ambient browser state (user agent, `window`,
//! `document`, timers) goes through the [`Environment`] trait so the
//! detector and the launch coordinator run the same way in a browser
//! ([`browser::BrowserEnv`]), in tests and the CLI ([`memory::MemoryEnv`]),
//! or anywhere else a substitute is supplied.

use std::time::Duration;

use serde::Serialize;

use crate::debug::{self, cat};
use crate::error::NavigationError;

pub mod memory;

#[cfg(all(target_arch = "wasm32", feature = "dom-web"))]
pub mod browser;

#[cfg(target_arch = "wasm32")]
mod wasm;
#[cfg(target_arch = "wasm32")]
pub use wasm::copy_to_clipboard;

#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
mod native;
#[cfg(all(not(target_arch = "wasm32"), feature = "native"))]
pub use native::copy_to_clipboard;

/// User-agent substrings that identify Apple handhelds.
pub const IOS_SIGNATURES: &[&str] = &["iPhone", "iPad", "iPod"];

/// User-agent substring that identifies Android.
pub const ANDROID_SIGNATURE: &str = "Android";

/// Other handheld signatures. Fixed list; anything unknown classifies as desktop.
pub const OTHER_MOBILE_SIGNATURES: &[&str] = &[
    "BlackBerry",
    "IEMobile",
    "Opera Mini",
    "Windows Phone",
    "webOS",
    "Mobile",
];

/// Classification of the client that will follow a chat link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub is_mobile: bool,
    #[serde(rename = "isIOS")]
    pub is_ios: bool,
    pub is_android: bool,
    pub is_desktop: bool,
    #[serde(rename = "hasWhatsAppSupport")]
    pub has_whatsapp_support: bool,
    pub user_agent: String,
}

impl PlatformInfo {
    /// Result for a context with no window at all (server-side rendering, CLI
    /// without a browser). Never treated as capable of opening WhatsApp.
    pub fn server_default() -> Self {
        PlatformInfo {
            is_mobile: false,
            is_ios: false,
            is_android: false,
            is_desktop: true,
            has_whatsapp_support: false,
            user_agent: String::new(),
        }
    }

    /// Mobile, but neither iOS nor Android.
    pub fn is_other_mobile(&self) -> bool {
        self.is_mobile && !self.is_ios && !self.is_android
    }

    pub fn label(&self) -> &'static str {
        if !self.has_whatsapp_support {
            "unsupported"
        } else if self.is_ios {
            "ios"
        } else if self.is_android {
            "android"
        } else if self.is_mobile {
            "mobile"
        } else {
            "desktop"
        }
    }
}

/// Classify a user-agent string. First match wins: iOS, Android, other
/// mobile, desktop.
pub fn classify_user_agent(user_agent: &str) -> PlatformInfo {
    let is_ios = IOS_SIGNATURES.iter().any(|sig| user_agent.contains(sig));
    let is_android = !is_ios && user_agent.contains(ANDROID_SIGNATURE);
    let is_mobile = is_ios
        || is_android
        || OTHER_MOBILE_SIGNATURES
            .iter()
            .any(|sig| user_agent.contains(sig));

    PlatformInfo {
        is_mobile,
        is_ios,
        is_android,
        is_desktop: !is_mobile,
        has_whatsapp_support: true,
        user_agent: user_agent.to_string(),
    }
}

/// Detect the platform of the given environment. Never fails.
pub fn detect(env: &dyn Environment) -> PlatformInfo {
    if !env.has_window() {
        debug::log(cat::PLATFORM, "no window, using server defaults");
        return PlatformInfo::server_default();
    }
    let ua = env.user_agent().unwrap_or_default();
    let info = classify_user_agent(&ua);
    debug::log(cat::PLATFORM, format!("classified as {}", info.label()));
    info
}

/// Page lifecycle events the launch coordinator listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// `document.visibilitychange`
    VisibilityChange,
    /// `window.beforeunload`
    BeforeUnload,
}

impl PageEvent {
    pub fn dom_name(&self) -> &'static str {
        match self {
            PageEvent::VisibilityChange => "visibilitychange",
            PageEvent::BeforeUnload => "beforeunload",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u32);

pub type Listener = Box<dyn FnMut()>;
pub type TimerCallback = Box<dyn FnOnce()>;

/// Capabilities the detector and launch coordinator need from the host.
///
/// Implementations are single-threaded: callbacks run on the host's event
/// loop and may call back into the environment (e.g. remove their own
/// listener), so implementations must not hold internal borrows while
/// invoking them.
pub trait Environment {
    /// Whether a browser-like window exists.
    fn has_window(&self) -> bool;

    fn user_agent(&self) -> Option<String>;

    /// `window.open(url, target)`. `Ok(false)` means the handle came back
    /// empty, i.e. a popup blocker swallowed it.
    fn open_url(&self, url: &str, target: &str) -> Result<bool, NavigationError>;

    /// `location.href = url`
    fn navigate(&self, url: &str) -> Result<(), NavigationError>;

    /// `document.hidden`
    fn is_hidden(&self) -> bool;

    fn add_listener(&self, event: PageEvent, listener: Listener) -> ListenerId;

    /// Removing an unknown or already removed id is a no-op.
    fn remove_listener(&self, id: ListenerId);

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Clearing an unknown or already fired timer is a no-op.
    fn clear_timeout(&self, id: TimerId);

    /// Blocking user-facing message (`window.alert`).
    fn alert(&self, message: &str);

    /// Developer-facing error report (`console.error`).
    fn report_error(&self, message: &str) {
        log::error!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryEnv;
    use super::*;

    const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const MAC_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";
    const WINDOWS_PHONE_UA: &str = "Mozilla/5.0 (Windows Phone 10.0; Android 6.0.1; Microsoft; Lumia 950) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/52.0.2743.116 Mobile Safari/537.36 Edge/15.15063";
    const OPERA_MINI_UA: &str = "Opera/9.80 (J2ME/MIDP; Opera Mini/9.80 (S60; SymbOS; Opera Mobi/23.348; U; en) Presto/2.5.25 Version/10.54";

    #[test]
    fn test_classify_ipad() {
        let info = classify_user_agent(IPAD_UA);
        assert!(info.is_ios && info.is_mobile && !info.is_desktop && !info.is_android);
        assert_eq!(info.label(), "ios");
    }

    #[test]
    fn test_classify_android() {
        let info = classify_user_agent(ANDROID_UA);
        assert!(info.is_android && info.is_mobile && !info.is_ios);
        assert!(info.has_whatsapp_support);
    }

    #[test]
    fn test_android_before_other_mobile() {
        // Carries both "Windows Phone" and "Android"; Android wins.
        let info = classify_user_agent(WINDOWS_PHONE_UA);
        assert!(info.is_android);
        assert!(!info.is_other_mobile());
    }

    #[test]
    fn test_classify_other_mobile() {
        let info = classify_user_agent(OPERA_MINI_UA);
        assert!(info.is_mobile && info.is_other_mobile());
        assert!(!info.is_ios && !info.is_android && !info.is_desktop);
        assert_eq!(info.label(), "mobile");
    }

    #[test]
    fn test_classify_desktop() {
        let info = classify_user_agent(MAC_UA);
        assert!(info.is_desktop && !info.is_mobile);
        assert!(info.has_whatsapp_support);
        assert_eq!(info.user_agent, MAC_UA);
    }

    #[test]
    fn test_signatures_are_case_sensitive() {
        assert!(classify_user_agent("my iphone").is_desktop);
        assert!(classify_user_agent("").is_desktop);
    }

    #[test]
    fn test_detect_without_window() {
        let info = detect(&MemoryEnv::server());
        assert_eq!(info, PlatformInfo::server_default());
        assert!(info.is_desktop && !info.is_mobile && !info.has_whatsapp_support);
        assert_eq!(info.label(), "unsupported");
    }

    #[test]
    fn test_invariants_hold_for_every_class() {
        for ua in [IPAD_UA, ANDROID_UA, MAC_UA, WINDOWS_PHONE_UA, OPERA_MINI_UA, ""] {
            let info = classify_user_agent(ua);
            assert_eq!(info.is_desktop, !info.is_mobile, "{ua}");
            if info.is_mobile {
                let classes = [info.is_ios, info.is_android, info.is_other_mobile()];
                assert_eq!(classes.iter().filter(|c| **c).count(), 1, "{ua}");
            }
        }
    }

    #[test]
    fn test_serializes_with_js_field_names() {
        let json = serde_json::to_value(classify_user_agent(IPAD_UA)).unwrap();
        assert_eq!(json["isIOS"], true);
        assert_eq!(json["isMobile"], true);
        assert_eq!(json["hasWhatsAppSupport"], true);
        assert_eq!(json["isDesktop"], false);
        assert!(json["userAgent"].as_str().unwrap().contains("iPad"));
    }
}
