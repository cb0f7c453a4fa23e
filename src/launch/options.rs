//! Launch tuning knobs.
//!
//! All defaults reproduce the stock click-to-chat behaviour; each toggle can
//! be switched off on hosts where the corresponding browser event is
//! unreliable.

use std::time::Duration;

/// Time the native app gets to take over before the web fallback opens.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(1500);

/// Bounds accepted from configuration.
pub const MIN_FALLBACK_DELAY_MS: u64 = 250;
pub const MAX_FALLBACK_DELAY_MS: u64 = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchOptions {
    /// How long to wait for the page to be hidden after the native link is
    /// followed.
    ///
    /// Default: 1500 ms
    pub fallback_delay: Duration,

    /// Treat `beforeunload` like `visibilitychange`: the app took over.
    ///
    /// Some mobile browsers never fire `visibilitychange` when an app
    /// scheme handler takes focus but do start unloading the page.
    ///
    /// Default: `true`
    pub cancel_on_before_unload: bool,

    /// When a popup blocker swallows `window.open`, navigate the current
    /// tab to the web URL instead.
    ///
    /// Default: `true`
    pub same_tab_on_popup_block: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            cancel_on_before_unload: true,
            same_tab_on_popup_block: true,
        }
    }
}

impl LaunchOptions {
    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    /// Fallback delay from an untrusted caller, clamped to
    /// [`MIN_FALLBACK_DELAY_MS`]..=[`MAX_FALLBACK_DELAY_MS`].
    pub fn with_fallback_delay_ms(self, ms: u64) -> Self {
        let ms = ms.clamp(MIN_FALLBACK_DELAY_MS, MAX_FALLBACK_DELAY_MS);
        self.with_fallback_delay(Duration::from_millis(ms))
    }

    /// Only `visibilitychange` cancels the fallback, and a blocked popup
    /// stays blocked.
    pub fn strict() -> Self {
        LaunchOptions {
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            cancel_on_before_unload: false,
            same_tab_on_popup_block: false,
        }
    }
}
