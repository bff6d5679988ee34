//! External system integrations.
//!
//! - [`store`] - Remote object store access (trait, HTTP gateway, in-memory)
//! - [`document`] - Document readers and writers (OME-XML)
//!
//! Both sides sit behind traits so the orchestrators can be driven by test
//! doubles and alternative formats.

pub mod document;
pub mod store;
