//! Backend adapter implementations.
//!
//! This module contains implementations of the [`RelationalBackend`] and
//! [`SearchBackend`] traits. The in-memory pair is always available; the HTTP
//! adapters are gated behind feature flags.
//!
//! # Available Backends
//!
//! | Backend | Feature | Implements | Description |
//! |---------|---------|------------|-------------|
//! | Memory | - | both | In-process tables and collections, for tests and offline use |
//! | PostgREST | `postgrest` | [`RelationalBackend`] | Supabase / PostgREST over HTTP |
//! | Typesense | `typesense` | [`SearchBackend`] | Typesense search and admin API over HTTP |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(all(feature = "postgrest", feature = "typesense"))]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use atrium_data::backends::postgrest::{PostgrestBackend, PostgrestConfig};
//! use atrium_data::backends::typesense::{TypesenseBackend, TypesenseConfig};
//!
//! let relational = PostgrestBackend::new(PostgrestConfig::new(
//!     "https://project.supabase.co",
//!     "service-role-key",
//! ))?;
//! let search = TypesenseBackend::new(TypesenseConfig::new("http://localhost:8108", "xyz"))?;
//! # Ok(())
//! # }
//! ```
//!
//! [`RelationalBackend`]: crate::core::RelationalBackend
//! [`SearchBackend`]: crate::core::SearchBackend

pub mod memory;

#[cfg(feature = "postgrest")]
pub mod postgrest;

#[cfg(feature = "typesense")]
pub mod typesense;

#[cfg(any(feature = "postgrest", feature = "typesense"))]
mod http;
