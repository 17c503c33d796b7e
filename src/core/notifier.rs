use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Transport,
    SessionExpired,
    Business,
    Http,
}

/// A user-facing failure message, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Receives failure notices for display.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    fn notify(&self, notice: Notice);
}

/// Default notifier for headless use: every notice becomes a log event.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(kind = ?notice.kind, message = %notice.message, "API request failed");
    }
}

/// Whether the "please log in again" notice has been shown for the current
/// expiry episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoticeState {
    #[default]
    Armed,
    Notified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeEvent {
    /// Login, registration or a successful refresh.
    SessionEstablished,
    /// A request failed because the session is gone.
    SessionExpired,
}

impl NoticeState {
    /// Transition table. The flag is the only place that decides whether to notify.
    ///
    /// | state    | event              | next     | notify |
    /// |----------|--------------------|----------|--------|
    /// | Armed    | SessionEstablished | Armed    | no     |
    /// | Armed    | SessionExpired     | Notified | yes    |
    /// | Notified | SessionEstablished | Armed    | no     |
    /// | Notified | SessionExpired     | Notified | no     |
    #[must_use]
    pub const fn next(self, event: NoticeEvent) -> (Self, bool) {
        match (self, event) {
            (_, NoticeEvent::SessionEstablished) => (Self::Armed, false),
            (Self::Armed, NoticeEvent::SessionExpired) => (Self::Notified, true),
            (Self::Notified, NoticeEvent::SessionExpired) => (Self::Notified, false),
        }
    }
}

/// Shared holder for [`NoticeState`].
#[derive(Debug, Default)]
pub struct ExpiryNotice {
    state: Mutex<NoticeState>,
}

impl ExpiryNotice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> NoticeState {
        *self.state.lock()
    }

    /// Applies an event and reports whether a notice should be shown now.
    pub fn apply(&self, event: NoticeEvent) -> bool {
        let mut state = self.state.lock();
        let (next, notify) = state.next(event);
        *state = next;
        notify
    }

    pub fn session_established(&self) {
        self.apply(NoticeEvent::SessionEstablished);
    }
}
