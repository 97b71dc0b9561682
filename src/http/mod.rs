//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one catch-all route)
//!     → ApiRequest (method, path, query, headers, parsed body)
//!     → Dispatcher (resolve, validate, invoke, normalize)
//!     → envelope JSON or verbatim HTML back to the client
//! ```

pub mod server;

pub use server::HttpServer;
