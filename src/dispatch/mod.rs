//! Dispatch core.
//!
//! # Data Flow
//! ```text
//! Server::serve (request scope entered)
//!     → dispatcher.rs (validate → favicon → resolve app → render)
//!     → render.rs (Renderer collaborator)
//!     → pages.rs (error pages, default favicon)
//!     → error.rs (HttpError / RenderError taxonomy)
//! ```
//!
//! # Design Decisions
//! - Bad requests and missing apps are ordinary control flow, not errors
//! - Only renderer failures and panics cross the collaborator boundary
//! - Cheap checks run before the app lookup

pub mod dispatcher;
pub mod error;
pub mod pages;
pub mod render;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{BoxError, HttpError, RenderError};
pub use pages::{DefaultPages, ErrorPages};
pub use render::{PlainRenderer, Renderer};
