//! Session lifecycle: identity state, login, warm-up and persistence.

pub mod bootstrap;
pub mod login;
pub mod persist;
pub mod state;

pub use bootstrap::{BootstrapReport, Step, StepKind, BOOTSTRAP_STEPS};
pub use persist::SessionBlob;
pub use state::{Phase, SessionState};
