//! Principals and the credentials that resolve to them.

use std::fmt;

/// Id of the user a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrincipalId(pub i64);

impl PrincipalId {
    /// User ids start at 1; anything else means "no user".
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An API identity: the public key a client sends, the secret it signs
/// with, and the principal it authenticates as.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub public_key: String,
    pub private_key: String,
    pub principal_id: PrincipalId,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("public_key", &self.public_key)
            .field("principal_id", &self.principal_id)
            .finish_non_exhaustive()
    }
}
