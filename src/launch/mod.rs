//! App-then-web launch coordination.
//!
//! On desktop the web client opens in a new tab (same tab if a popup
//! blocker interferes). On mobile the native `whatsapp://` link is followed
//! and a fallback timer races the page's `visibilitychange` and
//! `beforeunload` events: if the page goes away first the app took over,
//! otherwise the web client opens when the timer fires. Whichever side
//! wins clears the other, so each launch leaves no timers or listeners
//! behind.
//!
//! [`open_whatsapp`] never fails. Unsupported contexts are logged and
//! ignored; every other failure is reported to the developer console and
//! shown to the user with instructions to open WhatsApp by hand.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::debug::{self, cat};
use crate::error::LaunchError;
use crate::link::ChatTarget;
use crate::platform::{self, Environment, ListenerId, PageEvent, TimerId};

pub mod options;

pub use options::{LaunchOptions, DEFAULT_FALLBACK_DELAY};

pub const ERROR_PREFIX: &str = "Failed to open WhatsApp:";

/// Text shown to the user when nothing could be opened.
pub fn manual_open_message(phone: &str) -> String {
    format!(
        "Unable to open WhatsApp automatically. Please open WhatsApp and send a message to {} manually.",
        phone.trim()
    )
}

/// Where a mobile launch ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceState {
    /// Native link followed, fallback timer running.
    Pending,
    /// The page was hidden or unloaded before the timer fired.
    AppOpened,
    /// The timer fired and the web client was opened.
    FellBack,
    /// Stopped via [`FallbackRace::cancel`].
    Cancelled,
    /// Opening the fallback failed; the user was alerted.
    Failed,
}

/// What a call to [`open_whatsapp`] did synchronously.
#[derive(Debug)]
pub enum LaunchOutcome {
    /// No window; nothing was attempted.
    Unsupported,
    /// Desktop: web client opened in a new tab.
    NewTab,
    /// Desktop: popup blocked, current tab navigated instead.
    SameTab,
    /// Desktop: popup blocked and same-tab navigation disabled.
    PopupBlocked,
    /// Mobile: native link followed; the fallback race is in flight.
    NativeAttempted(FallbackRace),
    /// Error path taken; the user was alerted.
    Failed,
}

struct Race {
    // Strong: the race keeps its environment alive until it settles, the
    // same way browser callbacks keep `window` reachable.
    env: Rc<dyn Environment>,
    phone: String,
    web_url: String,
    same_tab_on_popup_block: bool,
    state: Cell<RaceState>,
    timer: Cell<Option<TimerId>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl Race {
    /// Move out of `Pending` and release every handle. Only the first
    /// caller wins.
    fn settle(&self, to: RaceState) -> bool {
        if self.state.get() != RaceState::Pending {
            return false;
        }
        self.state.set(to);
        if let Some(timer) = self.timer.take() {
            self.env.clear_timeout(timer);
        }
        let ids: Vec<ListenerId> = self.listeners.borrow_mut().drain(..).collect();
        for id in ids {
            self.env.remove_listener(id);
        }
        debug::log(cat::LAUNCH, format!("race settled: {to:?}"));
        true
    }

    fn on_visibility_change(&self) {
        if self.env.is_hidden() {
            self.settle(RaceState::AppOpened);
        }
    }

    fn on_before_unload(&self) {
        self.settle(RaceState::AppOpened);
    }

    fn on_timeout(&self) {
        // Fired timers need no clearing.
        self.timer.set(None);
        if !self.settle(RaceState::FellBack) {
            return;
        }
        let result = match self.env.open_url(&self.web_url, "_blank") {
            Ok(true) => Ok(()),
            Ok(false) if self.same_tab_on_popup_block => self.env.navigate(&self.web_url),
            Ok(false) => {
                log::info!("fallback popup blocked for {}", self.web_url);
                Ok(())
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.state.set(RaceState::Failed);
            report_failure(&*self.env, &self.phone, &e.into());
        }
    }
}

/// Handle on an in-flight mobile launch.
#[derive(Clone)]
pub struct FallbackRace {
    race: Rc<Race>,
}

impl FallbackRace {
    pub fn state(&self) -> RaceState {
        self.race.state.get()
    }

    pub fn is_settled(&self) -> bool {
        self.state() != RaceState::Pending
    }

    /// URL the fallback opens.
    pub fn web_url(&self) -> &str {
        &self.race.web_url
    }

    /// Stop waiting: clear the timer and listeners without opening anything.
    /// Returns false if the race had already settled.
    pub fn cancel(&self) -> bool {
        self.race.settle(RaceState::Cancelled)
    }
}

impl fmt::Debug for FallbackRace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackRace")
            .field("state", &self.state())
            .field("web_url", &self.race.web_url)
            .finish()
    }
}

fn report_failure(env: &dyn Environment, phone: &str, err: &LaunchError) {
    env.report_error(&format!("{ERROR_PREFIX} {err}"));
    env.alert(&manual_open_message(phone));
}

/// Open a WhatsApp chat with `phone`, pre-filled with `message`.
///
/// Never fails: see the module docs for how each failure is surfaced.
pub fn open_whatsapp<E: Environment + 'static>(
    env: &Rc<E>,
    phone: &str,
    message: &str,
    options: &LaunchOptions,
) -> LaunchOutcome {
    let env: Rc<dyn Environment> = env.clone();
    match try_open(&env, phone, message, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            report_failure(&*env, phone, &err);
            LaunchOutcome::Failed
        }
    }
}

fn try_open(
    env: &Rc<dyn Environment>,
    phone: &str,
    message: &str,
    options: &LaunchOptions,
) -> Result<LaunchOutcome, LaunchError> {
    let info = platform::detect(&**env);
    if !info.has_whatsapp_support {
        log::warn!("WhatsApp is not supported on this platform");
        return Ok(LaunchOutcome::Unsupported);
    }

    let target = ChatTarget::new(phone, message)?;

    if !info.is_mobile {
        debug::log(cat::LAUNCH, format!("desktop open {}", target.web_url));
        if env.open_url(&target.web_url, "_blank")? {
            return Ok(LaunchOutcome::NewTab);
        }
        if !options.same_tab_on_popup_block {
            log::info!("popup blocked for {}", target.web_url);
            return Ok(LaunchOutcome::PopupBlocked);
        }
        env.navigate(&target.web_url)?;
        return Ok(LaunchOutcome::SameTab);
    }

    let race = Rc::new(Race {
        env: env.clone(),
        phone: phone.to_string(),
        web_url: target.web_url.clone(),
        same_tab_on_popup_block: options.same_tab_on_popup_block,
        state: Cell::new(RaceState::Pending),
        timer: Cell::new(None),
        listeners: RefCell::new(Vec::new()),
    });

    // Arm the race before following the link so no event is missed.
    let r = race.clone();
    let id = env.add_listener(
        PageEvent::VisibilityChange,
        Box::new(move || r.on_visibility_change()),
    );
    race.listeners.borrow_mut().push(id);

    if options.cancel_on_before_unload {
        let r = race.clone();
        let id = env.add_listener(PageEvent::BeforeUnload, Box::new(move || r.on_before_unload()));
        race.listeners.borrow_mut().push(id);
    }

    let r = race.clone();
    let timer = env.set_timeout(options.fallback_delay, Box::new(move || r.on_timeout()));
    race.timer.set(Some(timer));

    debug::log(
        cat::LAUNCH,
        format!(
            "native attempt {} (fallback in {:?})",
            target.native_url, options.fallback_delay
        ),
    );
    if let Err(e) = env.navigate(&target.native_url) {
        race.settle(RaceState::Failed);
        return Err(e.into());
    }

    Ok(LaunchOutcome::NativeAttempted(FallbackRace { race }))
}
