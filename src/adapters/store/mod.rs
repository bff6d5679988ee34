//! Object store adapters
//!
//! - [`HttpStore`] - the store's JSON gateway over HTTP(S)
//! - [`InMemoryStore`] - process-local store for tests and dry runs

pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use traits::RoiStore;
