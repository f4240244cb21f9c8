//! HTTP layer module
//!
//! Body decoding, query parsing and response writing, independent of the
//! individual routes.

pub mod body;
pub mod query;
pub mod response;

pub use body::{check_content_length, decode_json, read_limited, BodyError};
pub use query::query_param;
pub use response::{Family, Reply, ResponseWriter};
