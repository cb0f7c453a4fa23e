//! Launch option presets and their effect on a mobile launch.

use std::rc::Rc;
use std::time::Duration;

use walink::config::{load_from, ConfigArgs};
use walink::launch::{open_whatsapp, LaunchOptions, LaunchOutcome, RaceState, DEFAULT_FALLBACK_DELAY};
use walink::platform::memory::MemoryEnv;

const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";

#[test]
fn default_options_are_production_ready() {
    let opts = LaunchOptions::default();

    assert_eq!(opts.fallback_delay, Duration::from_millis(1500));
    assert_eq!(opts.fallback_delay, DEFAULT_FALLBACK_DELAY);
    assert!(
        opts.cancel_on_before_unload,
        "beforeunload should cancel the fallback by default"
    );
    assert!(
        opts.same_tab_on_popup_block,
        "blocked popups should fall back to same-tab navigation by default"
    );
}

#[test]
fn strict_disables_both_recoveries() {
    let opts = LaunchOptions::strict();

    assert!(!opts.cancel_on_before_unload);
    assert!(!opts.same_tab_on_popup_block);
    assert_eq!(opts.fallback_delay, DEFAULT_FALLBACK_DELAY);
}

#[test]
fn options_are_copyable() {
    let a = LaunchOptions::default();
    let b = a; // Copy
    assert_eq!(a, b);
}

#[test]
fn configured_delay_drives_the_race() {
    let cfg = load_from(ConfigArgs {
        phone_number: Some("+447946095800".to_string()),
        fallback_delay_ms: Some(800),
        ..ConfigArgs::default()
    })
    .unwrap();

    let env = Rc::new(MemoryEnv::with_user_agent(ANDROID_UA));
    let outcome = open_whatsapp(&env, &cfg.phone_number, &cfg.default_message, &cfg.launch_options());
    let race = match outcome {
        LaunchOutcome::NativeAttempted(race) => race,
        other => panic!("expected native attempt, got {other:?}"),
    };

    env.advance(Duration::from_millis(799));
    assert_eq!(race.state(), RaceState::Pending);
    env.advance(Duration::from_millis(1));
    assert_eq!(race.state(), RaceState::FellBack);
    assert_eq!(env.opened()[0].0, race.web_url());
    assert!(race.web_url().starts_with("https://wa.me/447946095800?text=Hello!%20I'm"));
}

#[test]
fn blocked_fallback_popup_navigates_same_tab() {
    let env = Rc::new(MemoryEnv::with_user_agent(ANDROID_UA).block_popups());
    open_whatsapp(&env, "+1234567890", "hi", &LaunchOptions::default());
    env.advance(DEFAULT_FALLBACK_DELAY);
    assert_eq!(
        env.location().as_deref(),
        Some("https://wa.me/1234567890?text=hi")
    );
}
