use crate::ports::{Credential, IdentityProvider};

/// Identity backed by a credential fixed at startup (e.g. from config).
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity {
    credential: Option<Credential>,
}

impl StaticIdentity {
    #[must_use]
    pub fn new(credential: Option<Credential>) -> Self {
        Self { credential }
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(Some(Credential::bearer(token)))
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self::new(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn credential(&self) -> Option<Credential> {
        self.credential.clone()
    }
}
