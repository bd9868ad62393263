//! Front-door request dispatcher for a multi-tenant app server.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌───────────┐   RequestContext    ┌────────┐    ┌────────────┐    ┌──────────┐
//!   │ connector │ ──────────────────▶ │ server │ ─▶ │ dispatcher │ ─▶ │ renderer │
//!   │  (axum)   │ ◀────────────────── │ (scope)│    │            │    └──────────┘
//!   └─────▲─────┘    ResponseSink     └───┬────┘    └─────┬──────┘
//!         │                               │               │ 400 / 404 / 500
//!         │ register_context_path         │               ▼
//!   ┌─────┴───────────┐  AppEvent   ┌─────┴─────┐   ┌────────────┐
//!   │ connector set   │ ◀────────── │ notifier  │   │ error pages│
//!   └─────────────────┘             └─────▲─────┘   └────────────┘
//!                                         │
//!                                  ┌──────┴───────┐
//!                                  │ app registry │ ◀── config reload
//!                                  └──────────────┘
//! ```

pub mod apps;
pub mod config;
pub mod connector;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod server;

pub use apps::{App, AppRegistry, StaticAppRegistry};
pub use config::GatewayConfig;
pub use connector::{Connector, HttpConnector, ServerConnection};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use http::{RequestContext, ResponseSink};
pub use lifecycle::{Gateway, Shutdown};
pub use server::Server;
