//! Session-backed deployment pieces for the Kerberos identity stack.
//!
//! Provides the concrete [`InMemorySessionCache`], the deterministic
//! [`BucketNamer`] that maps an identity to its storage namespace, and the
//! per-request [`UserStorage`] facade binding a resolved identity to its
//! bucket through an [`ObjectStore`](kss_auth_core::ObjectStore).

mod cache;
mod naming;
mod storage;

pub use cache::InMemorySessionCache;
pub use naming::BucketNamer;
pub use storage::UserStorage;
