//! VR entry button state machine.
//!
//! ```text
//! NoSession --Click--> Requesting --Resolved--> InSession
//!                      Requesting --Rejected--> NoSession
//! InSession --Click | SessionEnded--> NoSession
//! ```
//!
//! Transitions are pure: they consume the state and return the next state
//! plus the side effects the host has to perform. `S` is the host's session
//! handle.

use crate::error::SessionError;

pub const LABEL_ENTER: &str = "ENTER VR";
pub const LABEL_EXIT: &str = "EXIT VR";
pub const LABEL_NOT_SUPPORTED: &str = "VR NOT SUPPORTED";
pub const LABEL_NOT_ALLOWED: &str = "VR NOT ALLOWED";
pub const LABEL_NOT_AVAILABLE: &str = "WEBXR NOT AVAILABLE";
pub const LABEL_NEEDS_HTTPS: &str = "WEBXR NEEDS HTTPS";

/// Hover opacity of the enabled button.
pub const OPACITY_IDLE: &str = "0.5";
pub const OPACITY_HOVER: &str = "1.0";

/// Result of probing the host for immersive-vr support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Supported,
    /// `isSessionSupported` resolved false.
    Unsupported,
    /// `isSessionSupported` threw (permissions policy, etc.).
    NotAllowed(String),
    /// No `navigator.xr` at all.
    Unavailable { secure_context: bool },
}

impl Capability {
    /// The failure behind a disabled button. `Unsupported` is not an error.
    pub fn error(&self) -> Option<SessionError> {
        match self {
            Capability::NotAllowed(reason) => Some(SessionError::NotAllowed(reason.clone())),
            Capability::Unavailable { secure_context } => Some(SessionError::CapabilityUnavailable {
                secure_context: *secure_context,
            }),
            Capability::Supported | Capability::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState<S> {
    NoSession,
    Requesting,
    InSession(S),
    /// Permanently disabled; never leaves this state.
    Disabled(Capability),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEvent<S> {
    Click,
    Resolved(S),
    Rejected(SessionError),
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand<S> {
    RequestSession,
    EndSession(S),
    BindRenderer(S),
    UnbindRenderer,
}

pub struct SessionButton<S> {
    state: SessionState<S>,
}

impl<S: Clone> SessionButton<S> {
    /// Build the button for a probed capability. If the host already granted a
    /// session (`sessiongranted`) and VR is supported, the first request is
    /// issued immediately.
    pub fn new(capability: Capability, session_granted: bool) -> (Self, Vec<SessionCommand<S>>) {
        match capability {
            Capability::Supported => {
                let button = Self {
                    state: SessionState::NoSession,
                };
                if session_granted {
                    button.handle(ButtonEvent::Click)
                } else {
                    (button, Vec::new())
                }
            }
            other => {
                match other.error() {
                    Some(err) => log::warn!("{err}"),
                    None => log::info!("immersive-vr sessions are not supported"),
                }
                (
                    Self {
                        state: SessionState::Disabled(other),
                    },
                    Vec::new(),
                )
            }
        }
    }

    pub fn state(&self) -> &SessionState<S> {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.state, SessionState::Disabled(_))
    }

    pub fn session(&self) -> Option<&S> {
        match &self.state {
            SessionState::InSession(s) => Some(s),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match &self.state {
            SessionState::NoSession | SessionState::Requesting => LABEL_ENTER,
            SessionState::InSession(_) => LABEL_EXIT,
            SessionState::Disabled(Capability::Supported) => LABEL_ENTER,
            SessionState::Disabled(Capability::Unsupported) => LABEL_NOT_SUPPORTED,
            SessionState::Disabled(Capability::NotAllowed(_)) => LABEL_NOT_ALLOWED,
            SessionState::Disabled(Capability::Unavailable { secure_context: true }) => LABEL_NOT_AVAILABLE,
            SessionState::Disabled(Capability::Unavailable { secure_context: false }) => LABEL_NEEDS_HTTPS,
        }
    }

    /// Apply one event and return the next button with the commands to run.
    pub fn handle(self, event: ButtonEvent<S>) -> (Self, Vec<SessionCommand<S>>) {
        let (state, commands) = match (self.state, event) {
            (SessionState::NoSession, ButtonEvent::Click) => {
                (SessionState::Requesting, vec![SessionCommand::RequestSession])
            }
            (SessionState::Requesting, ButtonEvent::Resolved(session)) => (
                SessionState::InSession(session.clone()),
                vec![SessionCommand::BindRenderer(session)],
            ),
            (SessionState::Requesting, ButtonEvent::Rejected(err)) => {
                log::warn!("{err}");
                (SessionState::NoSession, Vec::new())
            }
            (SessionState::InSession(session), ButtonEvent::Click) => (
                SessionState::NoSession,
                vec![SessionCommand::EndSession(session), SessionCommand::UnbindRenderer],
            ),
            (SessionState::InSession(_), ButtonEvent::SessionEnded) => {
                (SessionState::NoSession, vec![SessionCommand::UnbindRenderer])
            }
            // A session that arrives when nobody is waiting for it is closed.
            (state, ButtonEvent::Resolved(session)) => (state, vec![SessionCommand::EndSession(session)]),
            (state, event) => {
                log::debug!("ignoring {} in current session state", event_name(&event));
                (state, Vec::new())
            }
        };
        (Self { state }, commands)
    }

    /// In-place [`handle`](Self::handle) for owners that keep the button behind a reference.
    pub fn dispatch(&mut self, event: ButtonEvent<S>) -> Vec<SessionCommand<S>> {
        let current = std::mem::replace(
            self,
            Self {
                state: SessionState::NoSession,
            },
        );
        let (next, commands) = current.handle(event);
        *self = next;
        commands
    }
}

fn event_name<S>(event: &ButtonEvent<S>) -> &'static str {
    match event {
        ButtonEvent::Click => "click",
        ButtonEvent::Resolved(_) => "resolved session",
        ButtonEvent::Rejected(_) => "rejected request",
        ButtonEvent::SessionEnded => "session end",
    }
}
