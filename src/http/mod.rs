//! HTTP protocol layer module
//!
//! Provides HTTP response builders, decoupled from the flag lookup itself.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_405_response, build_flag_response, build_health_response, build_not_found_response,
    build_options_response, with_server_header,
};
