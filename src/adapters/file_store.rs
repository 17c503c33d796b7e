use crate::core::session_store::{ClearOptions, MemorySessionStore, SessionStore};
use crate::domain::session::{Session, TokenPair, UserInfo};
use anyhow::Context;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_NAMESPACE: &str = "userStore";

/// Session store backed by a JSON file, so a remembered session survives restarts.
///
/// The file is a map from namespace to `{ userInfo, userToken, rememberMe }`;
/// other namespaces in the same file are left alone. Reads are served from
/// memory. Every mutation is written back, on the blocking pool when called
/// inside a tokio runtime; writes carry a generation so an older snapshot
/// never overwrites a newer one. A failed write is logged without affecting
/// the in-memory session.
#[derive(Debug)]
pub struct FileSessionStore {
    memory: MemorySessionStore,
    generation: Mutex<u64>,
    writer: Arc<SessionWriter>,
}

#[derive(Debug)]
struct SessionWriter {
    path: PathBuf,
    namespace: String,
    written: Mutex<u64>,
}

impl FileSessionStore {
    /// Loads the namespace from `path`. A missing file or namespace starts logged out;
    /// an unparseable entry is discarded.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>, namespace: impl Into<String>) -> anyhow::Result<Self> {
        let path = path.into();
        let namespace = namespace.into();
        let document = read_document(&path)?;

        let session = match document.get(&namespace) {
            None => Session::default(),
            Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, namespace = %namespace, "Discarding unreadable stored session");
                Session::default()
            }),
        };
        tracing::debug!(path = %path.display(), authenticated = session.is_authenticated(), "Session loaded");

        Ok(Self {
            memory: MemorySessionStore::with_session(session),
            generation: Mutex::new(0),
            writer: Arc::new(SessionWriter { path, namespace, written: Mutex::new(0) }),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.writer.path
    }

    /// Writes the current session synchronously unless it is already on disk.
    pub fn flush(&self) {
        let generation = self.generation.lock();
        self.writer.write(*generation, &self.memory.snapshot());
    }

    fn write_through(&self, mutate: impl FnOnce(&MemorySessionStore)) {
        let (generation, snapshot) = {
            let mut generation = self.generation.lock();
            mutate(&self.memory);
            *generation += 1;
            (*generation, self.memory.snapshot())
        };

        let writer = Arc::clone(&self.writer);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || writer.write(generation, &snapshot));
            }
            Err(_) => writer.write(generation, &snapshot),
        }
    }
}

impl Drop for FileSessionStore {
    fn drop(&mut self) {
        self.flush();
    }
}

impl SessionWriter {
    fn write(&self, generation: u64, session: &Session) {
        let mut written = self.written.lock();
        if generation <= *written {
            return;
        }
        match self.persist(session) {
            Ok(()) => *written = generation,
            Err(e) => tracing::warn!(error = %e, path = %self.path.display(), "Failed to persist session"),
        }
    }

    /// Rewrites this namespace. Skips the write if the current file cannot be
    /// read, since rewriting it would drop the other namespaces.
    fn persist(&self, session: &Session) -> anyhow::Result<()> {
        let mut document = read_document(&self.path)?;
        document.insert(self.namespace.clone(), serde_json::to_value(session.persisted())?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&Value::Object(document))?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// A missing file is an empty document; so is one that isn't a JSON object.
fn read_document(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    match serde_json::from_slice(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) | Err(_) => {
            tracing::warn!(path = %path.display(), "Session file is not a JSON object, starting fresh");
            Ok(Map::new())
        }
    }
}

impl SessionStore for FileSessionStore {
    fn access_token(&self) -> Option<String> {
        self.memory.access_token()
    }

    fn refresh_token(&self) -> Option<String> {
        self.memory.refresh_token()
    }

    fn set_tokens(&self, tokens: TokenPair) {
        self.write_through(|m| m.set_tokens(tokens));
    }

    fn clear_with(&self, options: ClearOptions) {
        self.write_through(|m| m.clear_with(options));
    }

    fn snapshot(&self) -> Session {
        self.memory.snapshot()
    }

    fn set_user_info(&self, user_info: UserInfo) {
        self.write_through(|m| m.set_user_info(user_info));
    }

    fn set_remember_me(&self, remember_me: bool) {
        self.write_through(|m| m.set_remember_me(remember_me));
    }
}
