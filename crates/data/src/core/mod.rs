//! Backend adapter traits.
//!
//! The provider composes two kinds of backends:
//!
//! - [`RelationalBackend`] - The primary store (CRUD + filter)
//! - [`SearchBackend`] - The optional search engine (document search/CRUD and
//!   its own administrative objects)
//!
//! Both are consumed through trait objects so the provider can be assembled
//! from whatever adapters the deployment offers; see
//! [`backends`](crate::backends) for the bundled ones.

use std::sync::Arc;

pub mod relational;
pub mod search;

pub use relational::RelationalBackend;
pub use search::{
    AdminTarget, ImportAction, ImportOutcome, SearchAdminKind, SearchBackend, SearchHit,
    SearchRequest, SearchResponse,
};

/// A dynamically typed relational backend.
pub type DynRelational = Arc<dyn RelationalBackend>;

/// A dynamically typed search backend.
pub type DynSearch = Arc<dyn SearchBackend>;
