//! Configuration read from the process environment.
//!
//! Every test here mutates process-wide variables, so they share a lock.

use std::env;
use std::sync::Mutex;

use clap::Parser;
use walink::config::{
    self, ConfigArgs, WhatsAppConfig, ENV_BUSINESS_NAME, ENV_DEFAULT_MESSAGE,
    ENV_FALLBACK_DELAY_MS, ENV_PHONE_NUMBER,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[derive(Parser, Debug)]
#[command(name = "walink")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
}

fn with_vars(vars: &[(&str, &str)], f: impl FnOnce()) {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for key in [
        ENV_PHONE_NUMBER,
        ENV_DEFAULT_MESSAGE,
        ENV_BUSINESS_NAME,
        ENV_FALLBACK_DELAY_MS,
    ] {
        env::remove_var(key);
    }
    for (k, v) in vars {
        env::set_var(k, v);
    }
    f();
    for (k, _) in vars {
        env::remove_var(k);
    }
}

#[test]
fn malformed_delay_fails_strict_load_and_disables_safe_load() {
    with_vars(
        &[
            (ENV_PHONE_NUMBER, "+1234567890"),
            (ENV_FALLBACK_DELAY_MS, "abc"),
        ],
        || {
            let err = config::load().unwrap_err();
            assert!(err.to_string().contains(ENV_FALLBACK_DELAY_MS), "{err}");

            let cfg = config::load_safe();
            assert_eq!(cfg, WhatsAppConfig::disabled());
        },
    );
}

#[test]
fn well_formed_environment_loads() {
    with_vars(
        &[
            (ENV_PHONE_NUMBER, "+1234567890"),
            (ENV_FALLBACK_DELAY_MS, "2000"),
        ],
        || {
            let cfg = config::load().unwrap();
            assert!(cfg.enabled);
            assert_eq!(cfg.fallback_delay_ms, 2000);
            assert_eq!(config::load_safe(), cfg);
        },
    );
}

#[test]
fn missing_phone_disables_safe_load() {
    with_vars(&[], || {
        assert!(config::load().is_err());
        assert!(!config::load_safe().enabled);
    });
}

#[test]
fn command_line_overrides_environment() {
    with_vars(
        &[
            (ENV_PHONE_NUMBER, "+1234567890"),
            (ENV_FALLBACK_DELAY_MS, "2000"),
            (ENV_BUSINESS_NAME, "From Env"),
        ],
        || {
            let cli = Cli::try_parse_from([
                "walink",
                "--fallback-delay-ms",
                "900",
                "--business-name",
                "From Args",
            ])
            .unwrap();
            let cfg = config::load_from(cli.config).unwrap();
            assert_eq!(cfg.fallback_delay_ms, 900);
            assert_eq!(cfg.business_name, "From Args");
            // Not given on the command line, so the environment still applies.
            assert_eq!(cfg.phone_number, "+1234567890");
        },
    );
}

#[test]
fn command_line_rejects_malformed_environment_delay() {
    with_vars(
        &[
            (ENV_PHONE_NUMBER, "+1234567890"),
            (ENV_FALLBACK_DELAY_MS, "abc"),
        ],
        || {
            assert!(Cli::try_parse_from(["walink"]).is_err());
        },
    );
}
