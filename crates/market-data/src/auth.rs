use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tokio::sync::Mutex;

/// Broker login credentials.
#[derive(Clone)]
pub struct SamcoCredentials {
    pub user_id: String,
    pub password: String,
    pub year_of_birth: String,
}

impl SamcoCredentials {
    /// `None` unless all three variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Some(Self {
            user_id: read("SAMCO_USER_ID")?,
            password: read("SAMCO_PASSWORD")?,
            year_of_birth: read("SAMCO_YOB")?,
        })
    }
}

impl std::fmt::Debug for SamcoCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamcoCredentials")
            .field("user_id", &self.user_id)
            .field("password", &"***")
            .field("year_of_birth", &"***")
            .finish()
    }
}

/// Process-wide authentication state for the primary source.
///
/// Written at most once per cold start (or once per expired session);
/// read on every request. A failed login is sticky for the lifetime of
/// the value.
#[derive(Debug, Default)]
pub struct ProviderAuthState {
    session: RwLock<Option<String>>,
    failed: AtomicBool,
    login_attempts: AtomicU32,
    /// Serializes logins so concurrent cold-start requests log in once.
    pub(crate) login_lock: Mutex<()>,
}

impl ProviderAuthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_logged_in(&self) -> bool {
        self.session().is_some()
    }

    pub fn login_attempts(&self) -> u32 {
        self.login_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn session(&self) -> Option<String> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    pub(crate) fn record_attempt(&self) {
        self.login_attempts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn store_session(&self, token: String) {
        if let Ok(mut session) = self.session.write() {
            *session = Some(token);
        }
    }

    pub(crate) fn clear_session(&self) {
        if let Ok(mut session) = self.session.write() {
            *session = None;
        }
    }

    pub(crate) fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
        self.clear_session();
    }
}
