use anyhow::{anyhow, Result};
use clap::Args;
use std::env;
use std::time::Duration;

use crate::debug::{self, cat};
use crate::launch::options::{LaunchOptions, MAX_FALLBACK_DELAY_MS, MIN_FALLBACK_DELAY_MS};
use crate::link;

pub const ENV_PHONE_NUMBER: &str = "WHATSAPP_PHONE_NUMBER";
pub const ENV_DEFAULT_MESSAGE: &str = "WHATSAPP_DEFAULT_MESSAGE";
pub const ENV_BUSINESS_NAME: &str = "WHATSAPP_BUSINESS_NAME";
pub const ENV_FALLBACK_DELAY_MS: &str = "WHATSAPP_FALLBACK_DELAY_MS";

pub const MAX_MESSAGE_CHARS: usize = 1000;
pub const MAX_BUSINESS_NAME_CHARS: usize = 100;

pub const DEFAULT_MESSAGE: &str = "Hello! I'm interested in your services.";
pub const DEFAULT_BUSINESS_NAME: &str = "Customer Support";

/// Business chat settings.
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Business WhatsApp number in international format (+1234567890)
    #[arg(long, env = ENV_PHONE_NUMBER)]
    pub phone_number: Option<String>,

    /// Message pre-filled in new chats (max 1000 characters)
    #[arg(long, env = ENV_DEFAULT_MESSAGE)]
    pub default_message: Option<String>,

    /// Name shown next to the chat button (max 100 characters)
    #[arg(long, env = ENV_BUSINESS_NAME)]
    pub business_name: Option<String>,

    /// Wait before falling back to the web client, in milliseconds (250-10000)
    #[arg(long, env = ENV_FALLBACK_DELAY_MS)]
    pub fallback_delay_ms: Option<u64>,
}

impl ConfigArgs {
    /// Read settings from environment variables only (no command line).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `get`, keyed by the `WHATSAPP_*` variable names.
    /// A value that is present but malformed is an error naming its variable.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let fallback_delay_ms = match get(ENV_FALLBACK_DELAY_MS) {
            Some(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                anyhow!("{ENV_FALLBACK_DELAY_MS} must be an integer, got {s:?}")
            })?),
            None => None,
        };
        Ok(ConfigArgs {
            phone_number: get(ENV_PHONE_NUMBER),
            default_message: get(ENV_DEFAULT_MESSAGE),
            business_name: get(ENV_BUSINESS_NAME),
            fallback_delay_ms,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhatsAppConfig {
    /// False when configuration was missing or invalid; the chat button
    /// should not render.
    pub enabled: bool,
    pub phone_number: String,
    pub default_message: String,
    pub business_name: String,
    pub fallback_delay_ms: u64,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

fn validate_max_chars(val: &str, max: usize, name: &str) -> Result<()> {
    let n = val.chars().count();
    if n > max {
        Err(anyhow!("{name} must be at most {max} characters, got {n}"))
    } else {
        Ok(())
    }
}

impl WhatsAppConfig {
    /// Inert configuration used when the real one cannot be loaded.
    pub fn disabled() -> Self {
        WhatsAppConfig {
            enabled: false,
            phone_number: String::new(),
            default_message: DEFAULT_MESSAGE.to_string(),
            business_name: DEFAULT_BUSINESS_NAME.to_string(),
            fallback_delay_ms: crate::launch::DEFAULT_FALLBACK_DELAY.as_millis() as u64,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.phone_number.trim().is_empty() {
            return Err(anyhow!("{ENV_PHONE_NUMBER} cannot be empty"));
        }
        if !link::validate_phone_number(&self.phone_number) {
            return Err(anyhow!(
                "{ENV_PHONE_NUMBER} must be in international format (+1234567890), got {:?}",
                self.phone_number
            ));
        }
        validate_max_chars(&self.default_message, MAX_MESSAGE_CHARS, ENV_DEFAULT_MESSAGE)?;
        if self.business_name.trim().is_empty() {
            return Err(anyhow!("{ENV_BUSINESS_NAME} cannot be empty"));
        }
        validate_max_chars(&self.business_name, MAX_BUSINESS_NAME_CHARS, ENV_BUSINESS_NAME)?;
        validate_in_range(
            self.fallback_delay_ms,
            MIN_FALLBACK_DELAY_MS,
            MAX_FALLBACK_DELAY_MS,
            ENV_FALLBACK_DELAY_MS,
        )?;
        Ok(())
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions::default().with_fallback_delay(Duration::from_millis(self.fallback_delay_ms))
    }

    /// Web link to the business chat with the default message.
    pub fn chat_url(&self) -> Result<String> {
        if !self.enabled {
            return Err(anyhow!("WhatsApp chat is disabled"));
        }
        Ok(link::generate_web_url(&self.phone_number, &self.default_message)?)
    }

    pub fn print_summary(&self) {
        eprintln!("WhatsApp Configuration:");
        if !self.enabled {
            eprintln!("  Status: disabled");
            return;
        }
        eprintln!("  Business: {}", self.business_name);
        eprintln!("  Phone: {}", self.phone_number);
        eprintln!(
            "  Default Message: {} chars",
            self.default_message.chars().count()
        );
        eprintln!("  Fallback Delay: {}ms", self.fallback_delay_ms);
    }
}

/// Build and validate configuration from parsed arguments.
pub fn load_from(args: ConfigArgs) -> Result<WhatsAppConfig> {
    let phone_number = args
        .phone_number
        .ok_or_else(|| anyhow!("{ENV_PHONE_NUMBER} is not set"))?
        .trim()
        .to_string();

    let cfg = WhatsAppConfig {
        enabled: true,
        phone_number,
        default_message: args
            .default_message
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
        business_name: args
            .business_name
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BUSINESS_NAME.to_string()),
        fallback_delay_ms: args
            .fallback_delay_ms
            .unwrap_or(crate::launch::DEFAULT_FALLBACK_DELAY.as_millis() as u64),
    };
    cfg.validate()?;
    debug::log(cat::CONFIG, format!("loaded config for {}", cfg.business_name));
    Ok(cfg)
}

fn or_disabled(loaded: Result<WhatsAppConfig>) -> WhatsAppConfig {
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("WhatsApp chat disabled: {e:#}");
            WhatsAppConfig::disabled()
        }
    }
}

/// Like [`load_from`] but never fails: any problem yields
/// [`WhatsAppConfig::disabled`] and a warning.
pub fn load_safe_from(args: ConfigArgs) -> WhatsAppConfig {
    or_disabled(load_from(args))
}

/// Load from variables supplied by `get`.
pub fn load_with(get: impl Fn(&str) -> Option<String>) -> Result<WhatsAppConfig> {
    load_from(ConfigArgs::from_lookup(get)?)
}

/// Load from environment variables.
pub fn load() -> Result<WhatsAppConfig> {
    load_from(ConfigArgs::from_env()?)
}

/// Load from environment variables, degrading to a disabled config when a
/// variable is missing, malformed or out of range.
pub fn load_safe() -> WhatsAppConfig {
    or_disabled(load())
}

/// [`load_with`] that degrades like [`load_safe`].
pub fn load_safe_with(get: impl Fn(&str) -> Option<String>) -> WhatsAppConfig {
    or_disabled(load_with(get))
}
