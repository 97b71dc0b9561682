//! Trellis: a self-describing HTTP API server.
//!
//! The routing table is derived from one declarative tree of endpoint
//! definitions instead of manually wired routes.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                   TRELLIS                     │
//!                    │                                               │
//!   declaration      │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!   tree (app)  ─────┼─▶│ endpoint │──▶│ compiler │──▶│  route   │  │
//!                    │  │  nodes   │   │          │   │  table   │  │
//!                    │  └──────────┘   └──────────┘   └────┬─────┘  │
//!                    │                                      │        │
//!   HTTP request     │  ┌──────────┐   ┌────────────┐       ▼        │
//!   ─────────────────┼─▶│   http   │──▶│ dispatcher │──▶ envelope    │
//!                    │  │  server  │   │            │    or HTML     │
//!                    │  └──────────┘   └─────┬──────┘                │
//!                    │                       │                       │
//!                    │            ┌──────────┴──────────┐            │
//!                    │            │    collaborators    │            │
//!                    │            │ storage auth  mail  │            │
//!                    │            └─────────────────────┘            │
//!                    └──────────────────────────────────────────────┘
//! ```

// Framework core
pub mod api;
pub mod config;
pub mod http;

// Collaborators
pub mod auth;
pub mod mail;
pub mod storage;

// The account application
pub mod app;

pub use api::{Api, ApiError, ApiStatus, Dispatcher, EndpointNode, HttpMethod, RouteTable};
pub use config::AppConfig;
pub use http::HttpServer;
