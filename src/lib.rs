//! Single-shot DNS lookups over UDP.
//!
//! A forward (A) or reverse (PTR) query goes to one nameserver, is retried on
//! timeout, and the reply is validated against the query before its records
//! are decoded.

pub mod config;
pub mod error;
pub mod protocol;
pub mod resolver;
pub mod transport;

pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use protocol::query::QueryKind;
pub use resolver::Resolver;
