use crate::domain::session::{Session, TokenPair, UserInfo, UserToken};
use parking_lot::RwLock;

/// How much of the session a logout wipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearOptions {
    /// Also forget the "remember me" choice.
    pub clear_remember: bool,
}

/// Holds the current tokens and identity.
///
/// Writes must be visible to the very next read from any task; the client
/// never caches tokens on its own side of this interface.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    fn access_token(&self) -> Option<String>;

    fn refresh_token(&self) -> Option<String>;

    /// Replaces both tokens at once.
    fn set_tokens(&self, tokens: TokenPair);

    /// Drops identity and tokens. The "remember me" choice survives.
    fn clear(&self) {
        self.clear_with(ClearOptions::default());
    }

    fn clear_with(&self, options: ClearOptions);

    fn snapshot(&self) -> Session;

    fn set_user_info(&self, user_info: UserInfo);

    fn set_remember_me(&self, remember_me: bool);
}

/// Process-local store. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Session>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self { session: RwLock::new(session) }
    }

    fn update(&self, f: impl FnOnce(&mut Session)) {
        f(&mut self.session.write());
    }
}

impl SessionStore for MemorySessionStore {
    fn access_token(&self) -> Option<String> {
        self.session.read().user_token.access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.session.read().user_token.refresh_token.clone()
    }

    fn set_tokens(&self, tokens: TokenPair) {
        self.update(|s| s.user_token = UserToken::from(tokens));
    }

    fn clear_with(&self, options: ClearOptions) {
        self.update(|s| {
            s.user_info = None;
            s.user_token = UserToken::default();
            if options.clear_remember {
                s.remember_me = false;
            }
        });
    }

    fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    fn set_user_info(&self, user_info: UserInfo) {
        self.update(|s| s.user_info = Some(user_info));
    }

    fn set_remember_me(&self, remember_me: bool) {
        self.update(|s| s.remember_me = remember_me);
    }
}
