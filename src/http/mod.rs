//! Request and response values exchanged between connectors and the core.
//!
//! # Data Flow
//! ```text
//! connector (transport)
//!     → request.rs (RequestContext: raw URI → validity, context path)
//!     → server / dispatcher
//!     → response.rs (ResponseSink: status, headers, body)
//!     → connector writes the sink back to the client
//! ```

pub mod request;
pub mod response;

pub use request::{RequestContext, DEFAULT_FAVICON_PATH};
pub use response::ResponseSink;
