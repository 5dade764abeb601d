//! Signet persistence layer: dialect-neutral statement execution and
//! versioned schema migrations for the signing service.

pub mod assets;
mod runtime;

pub use runtime::Signet;

pub use signet_core::config::SignetConfig;
pub use signet_core::error::{Result, SignetError};
pub use signet_runtime::db::{Fw, TransactionalManager};
