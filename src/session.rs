use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tokio::sync::watch;

/// Route the console is sent to when the backend rejects the token.
pub const LOGIN_PATH: &str = "/login";

/// Explicit session context handed to the HTTP adapter: the auth token and
/// the forced-navigation signal raised on a 401.
pub struct Session {
    token: RwLock<Option<String>>,
    token_file: Option<PathBuf>,
    navigation: watch::Sender<Option<String>>,
}

impl Session {
    /// In-memory session, nothing persisted.
    pub fn new(token: Option<String>) -> Self {
        let (navigation, _) = watch::channel(None);
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
            token_file: None,
            navigation,
        }
    }

    /// Session backed by a token file. A token found in the file wins over
    /// `fallback`; a missing or unreadable file is not an error.
    pub fn with_token_file(path: PathBuf, fallback: Option<String>) -> Self {
        let from_file = match fs::read_to_string(&path) {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!("No token read from {}: {}", path.display(), e);
                None
            }
        };
        let mut session = Self::new(from_file.or(fallback));
        session.token_file = Some(path);
        session
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
        if let Some(path) = &self.token_file {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove token file {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Hard navigation requested outside any page, e.g. by the 401 handler.
    pub fn force_navigation(&self, path: &str) {
        self.navigation.send_replace(Some(path.to_string()));
    }

    pub fn pending_navigation(&self) -> Option<String> {
        self.navigation.borrow().clone()
    }

    /// Consume the pending navigation, if any.
    pub fn take_navigation(&self) -> Option<String> {
        self.navigation.send_replace(None)
    }
}
