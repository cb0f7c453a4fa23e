//! In-memory environment with a manual clock.
//!
//! Records every navigation side effect instead of performing it, so launch
//! behaviour can be replayed deterministically by tests and by the
//! `walink simulate` command.

use std::cell::RefCell;
use std::time::Duration;

use super::{Environment, Listener, ListenerId, PageEvent, TimerCallback, TimerId};
use crate::error::NavigationError;

/// Side effect observed by a [`MemoryEnv`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvEvent {
    Opened { url: String, target: String, at: Duration },
    PopupBlocked { url: String, target: String, at: Duration },
    Navigated { url: String, at: Duration },
    VisibilityChanged { hidden: bool, at: Duration },
    BeforeUnload { at: Duration },
    Alert(String),
    Error(String),
}

struct ListenerSlot {
    id: ListenerId,
    event: PageEvent,
    // Taken out while the listener runs.
    listener: Option<Listener>,
}

struct TimerSlot {
    id: TimerId,
    due: Duration,
    callback: TimerCallback,
}

#[derive(Default)]
struct State {
    now: Duration,
    hidden: bool,
    popup_blocked: bool,
    open_failure: Option<String>,
    navigate_failure: Option<String>,
    next_id: u32,
    location: Option<String>,
    listeners: Vec<ListenerSlot>,
    timers: Vec<TimerSlot>,
    events: Vec<EnvEvent>,
}

pub struct MemoryEnv {
    // None models a context without any window.
    user_agent: Option<String>,
    state: RefCell<State>,
}

impl MemoryEnv {
    /// A browser window reporting the given user agent.
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        MemoryEnv {
            user_agent: Some(user_agent.into()),
            state: RefCell::new(State::default()),
        }
    }

    /// No window at all (server-side rendering).
    pub fn server() -> Self {
        MemoryEnv {
            user_agent: None,
            state: RefCell::new(State::default()),
        }
    }

    /// `window.open` returns an empty handle.
    pub fn block_popups(self) -> Self {
        self.state.borrow_mut().popup_blocked = true;
        self
    }

    /// `window.open` throws.
    pub fn fail_open(self, reason: impl Into<String>) -> Self {
        self.state.borrow_mut().open_failure = Some(reason.into());
        self
    }

    /// Assigning `location.href` throws.
    pub fn fail_navigate(self, reason: impl Into<String>) -> Self {
        self.state.borrow_mut().navigate_failure = Some(reason.into());
        self
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn events(&self) -> Vec<EnvEvent> {
        self.state.borrow().events.clone()
    }

    /// Current `location.href`, if anything navigated.
    pub fn location(&self) -> Option<String> {
        self.state.borrow().location.clone()
    }

    /// `(url, target)` pairs passed to `window.open`, blocked ones included.
    pub fn opened(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                EnvEvent::Opened { url, target, .. } => Some((url.clone(), target.clone())),
                EnvEvent::PopupBlocked { url, target, .. } => Some((url.clone(), target.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.collect(|e| match e {
            EnvEvent::Alert(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            EnvEvent::Error(m) => Some(m.clone()),
            _ => None,
        })
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    fn collect<T>(&self, f: impl Fn(&EnvEvent) -> Option<T>) -> Vec<T> {
        self.state.borrow().events.iter().filter_map(f).collect()
    }

    fn record(&self, event: EnvEvent) {
        self.state.borrow_mut().events.push(event);
    }

    fn next_id(&self) -> u32 {
        let mut st = self.state.borrow_mut();
        st.next_id += 1;
        st.next_id
    }

    /// Move the clock forward, firing due timers in deadline order.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            let due = {
                let mut st = self.state.borrow_mut();
                let next = st
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                match next {
                    Some(i) => {
                        let slot = st.timers.remove(i);
                        st.now = slot.due;
                        Some(slot.callback)
                    }
                    None => None,
                }
            };
            match due {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.state.borrow_mut().now = target;
    }

    /// Flip `document.hidden` and dispatch `visibilitychange`.
    pub fn set_hidden(&self, hidden: bool) {
        let at = {
            let mut st = self.state.borrow_mut();
            st.hidden = hidden;
            st.now
        };
        self.record(EnvEvent::VisibilityChanged { hidden, at });
        self.dispatch(PageEvent::VisibilityChange);
    }

    /// Dispatch `beforeunload`.
    pub fn unload(&self) {
        let at = self.now();
        self.record(EnvEvent::BeforeUnload { at });
        self.dispatch(PageEvent::BeforeUnload);
    }

    fn dispatch(&self, event: PageEvent) {
        let ids: Vec<ListenerId> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .map(|l| l.id)
            .collect();

        for id in ids {
            let taken = {
                let mut st = self.state.borrow_mut();
                st.listeners
                    .iter_mut()
                    .find(|l| l.id == id)
                    .and_then(|l| l.listener.take())
            };
            let Some(mut listener) = taken else { continue };
            listener();
            // Put it back unless it removed itself while running.
            let mut st = self.state.borrow_mut();
            if let Some(slot) = st.listeners.iter_mut().find(|l| l.id == id) {
                slot.listener = Some(listener);
            }
        }
    }
}

impl Environment for MemoryEnv {
    fn has_window(&self) -> bool {
        self.user_agent.is_some()
    }

    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }

    fn open_url(&self, url: &str, target: &str) -> Result<bool, NavigationError> {
        if !self.has_window() {
            return Err(NavigationError::NoWindow);
        }
        let (failure, blocked, at) = {
            let st = self.state.borrow();
            (st.open_failure.clone(), st.popup_blocked, st.now)
        };
        if let Some(reason) = failure {
            return Err(NavigationError::refused(url, reason));
        }
        if blocked {
            self.record(EnvEvent::PopupBlocked {
                url: url.to_string(),
                target: target.to_string(),
                at,
            });
            return Ok(false);
        }
        self.record(EnvEvent::Opened {
            url: url.to_string(),
            target: target.to_string(),
            at,
        });
        Ok(true)
    }

    fn navigate(&self, url: &str) -> Result<(), NavigationError> {
        if !self.has_window() {
            return Err(NavigationError::NoWindow);
        }
        let mut st = self.state.borrow_mut();
        if let Some(reason) = st.navigate_failure.clone() {
            return Err(NavigationError::refused(url, reason));
        }
        st.location = Some(url.to_string());
        let at = st.now;
        st.events.push(EnvEvent::Navigated {
            url: url.to_string(),
            at,
        });
        Ok(())
    }

    fn is_hidden(&self) -> bool {
        self.state.borrow().hidden
    }

    fn add_listener(&self, event: PageEvent, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id());
        self.state.borrow_mut().listeners.push(ListenerSlot {
            id,
            event,
            listener: Some(listener),
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|l| l.id != id);
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id());
        let mut st = self.state.borrow_mut();
        let due = st.now + delay;
        st.timers.push(TimerSlot { id, due, callback });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.state.borrow_mut().timers.retain(|t| t.id != id);
    }

    fn alert(&self, message: &str) {
        self.record(EnvEvent::Alert(message.to_string()));
    }

    fn report_error(&self, message: &str) {
        log::error!("{message}");
        self.record(EnvEvent::Error(message.to_string()));
    }
}
