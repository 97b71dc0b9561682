//! Endpoint declaration tree.
//!
//! # Responsibilities
//! - Represent one node of the declarative API tree: path segments,
//!   allowed methods, optional handler, owned children
//! - Validate method strings against the closed method set at
//!   construction time
//!
//! # Design Decisions
//! - Nodes exclusively own their children; no listener handle is stored
//!   on nodes (the compiler threads a context through instead)
//! - The method set defaults to `{GET}` when left unspecified
//! - Generic over the shared state `S` handlers receive, mirroring how
//!   axum routers are generic over application state

use std::collections::BTreeSet;
use std::fmt;

use crate::api::dispatch::Handler;
use crate::api::segment::PathSegment;
use crate::api::ApiError;

/// The closed set of HTTP methods endpoints may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ApiError;

    /// Case-insensitive; anything outside the closed set is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(ApiError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node in the declaration tree.
///
/// A node without a handler produces no route of its own but still
/// contributes its path and parameters to descendants.
pub struct EndpointNode<S> {
    pub(crate) segments: Vec<PathSegment>,
    pub(crate) methods: BTreeSet<HttpMethod>,
    pub(crate) handler: Option<Handler<S>>,
    pub(crate) children: Vec<EndpointNode<S>>,
    pub(crate) expose: bool,
}

impl<S> EndpointNode<S> {
    /// A node with a single static segment and the default `{GET}` method set.
    pub fn new(segment: impl Into<String>) -> Self {
        Self::with_segments(vec![PathSegment::fixed(segment)])
    }

    /// The root marker node (`"/"`).
    pub fn root() -> Self {
        Self::new("/")
    }

    /// A node with an explicit segment sequence.
    pub fn with_segments(segments: Vec<PathSegment>) -> Self {
        Self {
            segments,
            methods: BTreeSet::from([HttpMethod::Get]),
            handler: None,
            children: Vec::new(),
            expose: false,
        }
    }

    /// Replace the method set. The set must stay non-empty.
    pub fn methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        let set: BTreeSet<HttpMethod> = methods.into_iter().collect();
        if !set.is_empty() {
            self.methods = set;
        }
        self
    }

    /// Replace the method set from strings, failing fast on anything
    /// outside the closed set.
    pub fn try_methods<I, T>(mut self, methods: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for m in methods {
            set.insert(m.as_ref().parse::<HttpMethod>()?);
        }
        if !set.is_empty() {
            self.methods = set;
        }
        Ok(self)
    }

    /// Attach the request handler for this node.
    pub fn handler<F>(mut self, f: F) -> Self
    where
        F: Fn(
                &crate::api::dispatch::RequestContext<S>,
            ) -> Result<crate::api::dispatch::HandlerResult, crate::api::ApiStatus>
            + Send
            + Sync
            + 'static,
    {
        self.handler = Some(std::sync::Arc::new(f));
        self
    }

    /// Register a route for this node even without a handler.
    ///
    /// Requests to an exposed, handlerless route answer 501 until a
    /// handler is attached. Nodes that are neither exposed nor handled
    /// exist purely for structural nesting.
    pub fn expose(mut self) -> Self {
        self.expose = true;
        self
    }

    /// Append a child node.
    pub fn child(mut self, node: EndpointNode<S>) -> Self {
        self.children.push(node);
        self
    }

    /// Append several child nodes.
    pub fn children(mut self, nodes: impl IntoIterator<Item = EndpointNode<S>>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn method_set(&self) -> &BTreeSet<HttpMethod> {
        &self.methods
    }

    pub fn path_segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl<S> fmt::Debug for EndpointNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointNode")
            .field("segments", &self.segments)
            .field("methods", &self.methods)
            .field("handler", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_is_case_insensitive() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn invalid_method_fails_at_construction() {
        let err = EndpointNode::<()>::new("user")
            .try_methods(["GET", "FETCH"])
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidMethod(m) if m == "FETCH"));
    }

    #[test]
    fn methods_default_to_get() {
        let node = EndpointNode::<()>::new("user");
        assert_eq!(
            node.method_set().iter().copied().collect::<Vec<_>>(),
            vec![HttpMethod::Get]
        );
    }

    #[test]
    fn empty_method_set_is_ignored() {
        let node = EndpointNode::<()>::new("user").methods([]);
        assert!(!node.method_set().is_empty());
    }
}
