//! Bearer credentials and the providers that hand them out

use std::fmt;
use std::sync::RwLock;

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Supplies the current credential to anything that needs to authenticate
///
/// `is_loading` is true while the provider is still resolving the session
/// (e.g. refreshing a token); consumers should hold off their first request
/// until it turns false.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;

    fn is_loading(&self) -> bool {
        false
    }
}

/// Fixed credential, known up front
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<Credential>);

impl StaticCredentials {
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

#[derive(Debug, Default)]
struct Session {
    credential: Option<Credential>,
    loading: bool,
}

/// Mutable session state shared between a login flow and its readers
#[derive(Debug, Default)]
pub struct SharedCredentials {
    session: RwLock<Session>,
}

impl SharedCredentials {
    /// Start in the loading state, before the session is known
    pub fn loading() -> Self {
        Self {
            session: RwLock::new(Session {
                credential: None,
                loading: true,
            }),
        }
    }

    /// Finish loading with the given credential (or none for a signed-out user)
    pub fn set(&self, credential: Option<Credential>) {
        let mut session = self.session.write().unwrap_or_else(|e| e.into_inner());
        session.credential = credential;
        session.loading = false;
    }

    pub fn clear(&self) {
        self.set(None);
    }
}

impl CredentialProvider for SharedCredentials {
    fn credential(&self) -> Option<Credential> {
        let session = self.session.read().unwrap_or_else(|e| e.into_inner());
        session.credential.clone()
    }

    fn is_loading(&self) -> bool {
        let session = self.session.read().unwrap_or_else(|e| e.into_inner());
        session.loading
    }
}
