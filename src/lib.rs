//! walink - WhatsApp click-to-chat links
//!
//! Builds `whatsapp://` deep links and `https://wa.me/` web links for a
//! business number and drives the "try the app, fall back to the web"
//! launch from a chat button.
//!
//! ## Architecture
//!
//! - [`platform`]: user-agent classification and the [`platform::Environment`]
//!   trait every browser interaction goes through
//! - [`link`]: phone validation, message encoding, URL building and parsing
//! - [`launch`]: the app-then-web fallback race
//! - [`config`]: business number, default message and timing from the
//!   environment
//!
//! ## Usage
//!
//! For native builds (library + `walink` CLI):
//! ```bash
//! cargo build --features native
//! ```
//!
//! For the browser:
//! ```bash
//! wasm-pack build --target web --no-default-features --features dom-web
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use walink::launch::{open_whatsapp, LaunchOptions, LaunchOutcome};
//! use walink::platform::memory::MemoryEnv;
//!
//! let env = Rc::new(MemoryEnv::with_user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"));
//! let outcome = open_whatsapp(&env, "+1 (234) 567-8900", "Hello World", &LaunchOptions::default());
//! assert!(matches!(outcome, LaunchOutcome::NewTab));
//! assert_eq!(
//!     env.opened()[0].0,
//!     "https://wa.me/12345678900?text=Hello%20World"
//! );
//! ```

pub mod config;
pub mod debug;
pub mod error;
pub mod launch;
pub mod link;

// Platform abstraction layer
pub mod platform;

// WASM-facing exports (JS -> Rust) are only built on wasm32 with dom-web.
#[cfg(all(target_arch = "wasm32", feature = "dom-web"))]
pub mod wasm_api;

// Re-export commonly used types
pub use config::WhatsAppConfig;
pub use error::{LaunchError, LinkError, NavigationError};
pub use launch::{open_whatsapp, LaunchOptions, LaunchOutcome, RaceState};
pub use link::{
    format_phone_number, generate_platform_specific_url, generate_whatsapp_url, get_fallback_url,
    validate_phone_number, ChatLink, ChatTarget,
};
pub use platform::{classify_user_agent, detect, Environment, PlatformInfo};
