//! The endpoint-tree API framework.
//!
//! # Data Flow
//! ```text
//! EndpointNode declaration tree
//!     → compiler.rs (flatten, dedupe, sort, install)
//!     → RouteTable (immutable, Arc-shared)
//!     → dispatch.rs (per request: resolve, validate, invoke, normalize)
//!     → ApiResponse (envelope JSON or verbatim HTML)
//! ```
//!
//! # Design Decisions
//! - Construction-time problems (bad method string, bad type tag, unbound
//!   listener) are `ApiError` and stop the process before it serves
//! - Per-request problems are `ApiStatus` values and always become a
//!   response envelope

pub mod compiler;
pub mod dispatch;
pub mod endpoint;
pub mod segment;
pub mod status;

pub use compiler::{Api, CompiledRoute, PathTree, Resolution, RouteInstaller, RouteTable};
pub use dispatch::{
    check_body, ApiRequest, ApiResponse, Dispatcher, Handler, HandlerResult, RequestContext,
    ResponseBody,
};
pub use endpoint::{EndpointNode, HttpMethod};
pub use segment::{ParamType, ParamValue, PathSegment};
pub use status::ApiStatus;

/// Construction-time errors. These fail fast; none of them can occur
/// while serving requests.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid route method '{0}'")]
    InvalidMethod(String),

    #[error("Converter type '{0}' is not a valid type")]
    InvalidParameterType(String),

    #[error("No route table bound; call Api::bind before install")]
    AppNotBound,

    #[error("Status code {0} is not in the status table")]
    UnknownStatusCode(u16),
}
