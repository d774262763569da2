pub mod backend;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod workflow;

pub use backend::{BackendClient, BackendResponse};
pub use config::{Args, RelayConfig};
pub use error::RelayError;
pub use server::{AppState, paths, router, run};
pub use session::{KeyMaterial, SessionCache, SessionState, SignatureArtifact};
