// Native CLI for walink - build, inspect and rehearse chat links

use std::rc::Rc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use walink::{
    config::{self, ConfigArgs},
    debug,
    launch::{open_whatsapp, LaunchOptions, LaunchOutcome},
    link,
    platform::{
        self,
        memory::{EnvEvent, MemoryEnv},
    },
};

/// walink - WhatsApp click-to-chat links
///
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "walink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "WhatsApp click-to-chat link tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Trace categories: platform, link, launch, config, all (overrides WALINK_DEBUG)
    #[arg(long)]
    debug: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a chat link (defaults to the configured business number)
    Url {
        /// Number in international format; overrides WHATSAPP_PHONE_NUMBER
        #[arg(long)]
        phone: Option<String>,
        /// Message text; overrides WHATSAPP_DEFAULT_MESSAGE
        #[arg(short, long)]
        message: Option<String>,
        /// Native whatsapp:// link instead of the web link
        #[arg(long)]
        mobile: bool,
        /// Also copy the link to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Classify a user agent (omit to model a context without a window)
    Detect {
        #[arg(short, long)]
        user_agent: Option<String>,
    },
    /// Replay a chat-button click against a headless page
    Simulate {
        /// Browser user agent (omit to model a context without a window)
        #[arg(short, long)]
        user_agent: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
        /// Hide the page this many ms after the click (the app took over)
        #[arg(long)]
        hide_after_ms: Option<u64>,
        /// window.open returns no handle
        #[arg(long)]
        popup_blocked: bool,
        /// window.open throws
        #[arg(long)]
        fail_open: bool,
        /// Ignore beforeunload and keep blocked popups blocked
        #[arg(long)]
        strict: bool,
    },
    /// Decode an existing chat link
    Parse { link: String },
    /// Show the effective business configuration
    Config,
}

/// Explicit phone/message, else the configured business defaults.
fn resolve_target(
    cfg_args: &ConfigArgs,
    phone: Option<String>,
    message: Option<String>,
) -> Result<(String, String)> {
    let cfg = config::load_safe_from(cfg_args.clone());
    let phone = match phone {
        Some(p) => p,
        None if cfg.enabled => cfg.phone_number.clone(),
        None => {
            return Err(anyhow!(
                "no --phone given and {} is not configured",
                config::ENV_PHONE_NUMBER
            ))
        }
    };
    let message = message.unwrap_or(cfg.default_message);
    Ok((phone, message))
}

fn launch_options(cfg_args: &ConfigArgs, strict: bool) -> LaunchOptions {
    let cfg = config::load_safe_from(cfg_args.clone());
    let base = if strict {
        LaunchOptions::strict()
    } else {
        LaunchOptions::default()
    };
    if cfg.enabled {
        base.with_fallback_delay(cfg.launch_options().fallback_delay)
    } else {
        base
    }
}

fn print_event(event: &EnvEvent) {
    match event {
        EnvEvent::Opened { url, target, at } => {
            println!("{:>6}ms  window.open {url} ({target})", at.as_millis())
        }
        EnvEvent::PopupBlocked { url, target, at } => {
            println!("{:>6}ms  window.open {url} ({target}) blocked", at.as_millis())
        }
        EnvEvent::Navigated { url, at } => {
            println!("{:>6}ms  location.href = {url}", at.as_millis())
        }
        EnvEvent::VisibilityChanged { hidden, at } => {
            println!("{:>6}ms  document.hidden = {hidden}", at.as_millis())
        }
        EnvEvent::BeforeUnload { at } => println!("{:>6}ms  beforeunload", at.as_millis()),
        EnvEvent::Alert(msg) => println!("          alert: {msg}"),
        EnvEvent::Error(msg) => println!("          console.error: {msg}"),
    }
}

fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    debug::init_once();

    let cli = Cli::parse();
    if let Some(list) = cli.debug.as_deref() {
        debug::set_from_list(list);
    }

    match cli.command {
        Command::Url {
            phone,
            message,
            mobile,
            copy,
        } => {
            let (phone, message) = resolve_target(&cli.config, phone, message)?;
            let url = link::generate_whatsapp_url(&phone, &message, mobile)
                .with_context(|| format!("cannot build a link for {phone:?}"))?;
            println!("{url}");
            if copy && !platform::copy_to_clipboard(&url) {
                eprintln!("warning: could not copy to clipboard");
            }
        }
        Command::Detect { user_agent } => {
            let env = match user_agent {
                Some(ua) => MemoryEnv::with_user_agent(ua),
                None => MemoryEnv::server(),
            };
            let info = platform::detect(&env);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Simulate {
            user_agent,
            phone,
            message,
            hide_after_ms,
            popup_blocked,
            fail_open,
            strict,
        } => {
            let (phone, message) = resolve_target(&cli.config, phone, message)?;
            let options = launch_options(&cli.config, strict);

            let mut env = match user_agent {
                Some(ua) => MemoryEnv::with_user_agent(ua),
                None => MemoryEnv::server(),
            };
            if popup_blocked {
                env = env.block_popups();
            }
            if fail_open {
                env = env.fail_open("simulated window.open failure");
            }
            let env = Rc::new(env);

            let outcome = open_whatsapp(&env, &phone, &message, &options);
            if let LaunchOutcome::NativeAttempted(race) = &outcome {
                if let Some(ms) = hide_after_ms {
                    env.advance(Duration::from_millis(ms));
                    env.set_hidden(true);
                }
                env.advance(options.fallback_delay);
                for event in env.events() {
                    print_event(&event);
                }
                println!("outcome: native attempted, race {:?}", race.state());
            } else {
                for event in env.events() {
                    print_event(&event);
                }
                println!("outcome: {outcome:?}");
            }
        }
        Command::Parse { link: raw } => {
            let parsed = link::parse(&raw).ok_or_else(|| anyhow!("not a WhatsApp chat link: {raw}"))?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::Config => {
            let cfg = config::load_safe_from(cli.config);
            cfg.print_summary();
            if let Ok(url) = cfg.chat_url() {
                println!("{url}");
            }
        }
    }

    Ok(())
}
