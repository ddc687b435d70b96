//! Request handler module
//!
//! Responsible for request routing dispatch and the flag lookup itself.

pub mod flag_lookup;
pub mod router;

// Re-export main entry point
pub use flag_lookup::FlagLookupHandler;
pub use router::handle_request;
