use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::workflow::Certificate;

/// Key pair produced by the most recent successful generate step.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KeyMaterial {
    pub private_key: String,
    pub public_key: String,
    pub key_id: String,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key", &redacted(&self.private_key))
            .field("public_key", &self.public_key)
            .field("key_id", &self.key_id)
            .finish()
    }
}

/// Output of the most recent successful sign step. Keyless signatures
/// carry the certificate they were issued under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureArtifact {
    pub signature: String,
    pub certificate: Option<Certificate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub key: KeyMaterial,
    pub signature: SignatureArtifact,
}

/// Process-lifetime store for the artifacts of earlier workflow steps.
///
/// One mutex guards the whole state, so a reader never sees a key pair
/// assembled from two different generate steps. Access goes through
/// closures, which keeps the guard from living across an `.await`.
#[derive(Debug, Default)]
pub struct SessionCache {
    state: Mutex<SessionState>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    // Writers replace whole values, so a poisoned guard still holds a
    // consistent state.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}
