//! Flag domain module
//!
//! Code validation and the flat-file store the lookup handler reads from.

pub mod code;
pub mod store;

pub use code::{CodeError, CodeParam, FlagCode};
pub use store::{FlagStore, LookupError};
