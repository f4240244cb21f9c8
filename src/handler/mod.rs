//! Request handler module
//!
//! Route dispatch plus the product, message-file and system handlers.

mod files;
mod products;
pub mod router;
mod system;

// Re-export main entry point
pub use router::handle_request;
