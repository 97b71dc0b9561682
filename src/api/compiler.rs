//! Endpoint-tree compilation and the installed route table.
//!
//! # Data Flow
//! ```text
//! EndpointNode tree
//!     → pre-order walk (ancestor join + parameter inheritance)
//!     → flat CompiledRoute list (first-wins dedupe, in traversal order)
//!     → reverse-lexicographic sort (deep paths and static siblings first)
//!     → RouteTable (immutable after install, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Compilation is one-shot and deterministic; recompiling the same tree
//!   yields the same table
//! - Duplicate `full_path`: the first route in pre-order wins, the later
//!   one is skipped with a warning. Downstream behavior depends on this
//!   exact policy.
//! - The compiler threads an explicit context (prefix, ancestor segments,
//!   inherited parameters) through the walk; nodes hold no listener handle
//! - Explicit `Resolution::NotFound` rather than silent default

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::api::dispatch::Handler;
use crate::api::endpoint::{EndpointNode, HttpMethod};
use crate::api::segment::{ParamType, PathSegment};
use crate::api::ApiError;

/// A flattened, installable route derived from the tree.
pub struct CompiledRoute<S> {
    /// Full wire-form path, mount prefix included (`/api/user/{uuid:id}`).
    full_path: String,
    /// Segment sequence used for request matching, prefix included.
    segments: Vec<PathSegment>,
    methods: BTreeSet<HttpMethod>,
    handler: Option<Handler<S>>,
    /// Parameters contributed by ancestors, ancestor-to-descendant order.
    inherited_params: Vec<(ParamType, String)>,
}

impl<S> CompiledRoute<S> {
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn methods(&self) -> &BTreeSet<HttpMethod> {
        &self.methods
    }

    pub fn handler(&self) -> Option<&Handler<S>> {
        self.handler.as_ref()
    }

    pub fn inherited_params(&self) -> &[(ParamType, String)] {
        &self.inherited_params
    }

    /// All parameter segments of this route in match order: inherited
    /// first, then the route's own.
    pub fn param_segments(&self) -> impl Iterator<Item = (&str, ParamType)> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Parameter { name, ty } => Some((name.as_str(), *ty)),
            PathSegment::Static(_) => None,
        })
    }
}

impl<S> Clone for CompiledRoute<S> {
    fn clone(&self) -> Self {
        Self {
            full_path: self.full_path.clone(),
            segments: self.segments.clone(),
            methods: self.methods.clone(),
            handler: self.handler.clone(),
            inherited_params: self.inherited_params.clone(),
        }
    }
}

impl<S> std::fmt::Debug for CompiledRoute<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("full_path", &self.full_path)
            .field("methods", &self.methods)
            .field("handler", &self.handler.is_some())
            .field("inherited_params", &self.inherited_params)
            .finish()
    }
}

/// Serializable introspection view of the declaration tree.
///
/// Paths use `[type:name]` delimiters for readability.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PathTree {
    pub path: String,
    pub methods: Vec<String>,
    pub children: Vec<PathTree>,
}

/// Capability to accept compiled routes, with an idempotent guard on
/// literal paths.
pub trait RouteInstaller<S> {
    /// Install a route. Returns false (and changes nothing) when the
    /// literal path is already registered.
    fn register(&mut self, route: CompiledRoute<S>) -> bool;

    /// Whether the given literal path is already registered.
    fn is_registered(&self, path: &str) -> bool;
}

/// Outcome of resolving an incoming `(method, path)` pair.
pub enum Resolution<'a, S> {
    /// A route matched; raw parameter captures in match order
    /// (inherited first), not yet type-validated.
    Route {
        route: &'a CompiledRoute<S>,
        raw_params: Vec<(String, ParamType, String)>,
    },
    /// The path is known but the method is not in its set.
    MethodNotAllowed,
    NotFound,
}

/// The installed, immutable route table.
///
/// Built once at startup and shared across requests without locking.
#[derive(Default)]
pub struct RouteTable<S> {
    routes: Vec<CompiledRoute<S>>,
    installed: HashSet<String>,
}

impl<S> RouteTable<S> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            installed: HashSet::new(),
        }
    }

    pub fn routes(&self) -> &[CompiledRoute<S>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve a request against the table, in install order (deepest
    /// paths first).
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Resolution<'_, S> {
        let request_segments: Vec<&str> =
            path.split('/').filter(|s| !s.is_empty()).collect();

        let mut path_matched = false;
        for route in &self.routes {
            let Some(raw_params) = match_segments(&route.segments, &request_segments) else {
                continue;
            };
            if route.methods.contains(&method) {
                return Resolution::Route { route, raw_params };
            }
            path_matched = true;
        }

        if path_matched {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }
}

impl<S> RouteInstaller<S> for RouteTable<S> {
    fn register(&mut self, route: CompiledRoute<S>) -> bool {
        if self.installed.contains(&route.full_path) {
            tracing::debug!(path = %route.full_path, "Route already installed, skipping");
            return false;
        }
        self.installed.insert(route.full_path.clone());
        self.routes.push(route);
        true
    }

    fn is_registered(&self, path: &str) -> bool {
        self.installed.contains(path)
    }
}

/// Match request segments against a route's segment sequence.
///
/// Returns the raw captures `(name, type, value)` in pattern order, or
/// None if the shapes differ. `Path` parameters capture the remaining
/// segments including separators.
fn match_segments(
    pattern: &[PathSegment],
    request: &[&str],
) -> Option<Vec<(String, ParamType, String)>> {
    let mut captures = Vec::new();
    let mut pos = 0;

    for (i, seg) in pattern.iter().enumerate() {
        match seg {
            PathSegment::Static(text) => {
                if request.get(pos) != Some(&text.as_str()) {
                    return None;
                }
                pos += 1;
            }
            PathSegment::Parameter { name, ty: ParamType::Path } => {
                // Catch-all: must be the final pattern segment and must
                // capture at least one request segment.
                if i != pattern.len() - 1 || pos >= request.len() {
                    return None;
                }
                captures.push((name.clone(), ParamType::Path, request[pos..].join("/")));
                pos = request.len();
            }
            PathSegment::Parameter { name, ty } => {
                let value = request.get(pos)?;
                captures.push((name.clone(), *ty, value.to_string()));
                pos += 1;
            }
        }
    }

    (pos == request.len()).then_some(captures)
}

/// Walk state threaded through the pre-order compilation.
struct CompileContext {
    prefix: String,
    joined: Vec<String>,
    segments: Vec<PathSegment>,
    inherited: Vec<(ParamType, String)>,
}

/// A declaration tree with its mount prefix and an optionally bound
/// route table.
pub struct Api<S> {
    root: EndpointNode<S>,
    prefix: String,
    table: Option<RouteTable<S>>,
}

impl<S> Api<S> {
    /// Wrap a declaration tree, mounted under `/api`.
    pub fn new(root: EndpointNode<S>) -> Self {
        Self {
            root,
            prefix: "/api".to_string(),
            table: None,
        }
    }

    /// Change the mount prefix (leading slash, no trailing slash).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Bind the route table routes will be installed into.
    pub fn bind(mut self, table: RouteTable<S>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Flatten the tree into routes: pre-order traversal, first-wins
    /// dedupe on `full_path`, then reverse-lexicographic install order.
    pub fn compile(&self) -> Vec<CompiledRoute<S>> {
        let mut ctx = CompileContext {
            prefix: self.prefix.clone(),
            joined: Vec::new(),
            segments: self
                .prefix
                .split('/')
                .filter(|s| !s.is_empty())
                .map(PathSegment::fixed)
                .collect(),
            inherited: Vec::new(),
        };

        let mut routes = Vec::new();
        let mut seen = HashSet::new();
        collect_routes(&self.root, &mut ctx, &mut routes, &mut seen);

        // Deeper/longer paths must be installed ahead of their prefixes,
        // and static segments ahead of parameter siblings.
        routes.sort_by(|a: &CompiledRoute<S>, b: &CompiledRoute<S>| {
            install_key(&b.full_path).cmp(&install_key(&a.full_path))
        });
        routes
    }

    /// Serializable introspection tree.
    pub fn tree(&self) -> PathTree {
        build_tree(&self.root)
    }

    /// Compile the tree and install every route into the bound table.
    ///
    /// Binding the table first is a programmer obligation; an unbound
    /// `Api` fails fast with [`ApiError::AppNotBound`].
    pub fn install(mut self) -> Result<RouteTable<S>, ApiError> {
        let mut table = self.table.take().ok_or(ApiError::AppNotBound)?;
        let routes = self.compile();
        let total = routes.len();
        let mut installed = 0usize;
        for route in routes {
            if table.register(route) {
                installed += 1;
            }
        }
        tracing::info!(installed, total, prefix = %self.prefix, "API routes installed");
        Ok(table)
    }
}

/// Install-order sort key. The parameter delimiter `{` sorts above
/// ASCII letters; lowering it to NUL keeps a static segment ahead of a
/// parameter sibling at the same depth, so resolution (first match in
/// install order) prefers the more specific route.
fn install_key(path: &str) -> Vec<u8> {
    path.bytes().map(|b| if b == b'{' { 0 } else { b }).collect()
}

fn collect_routes<S>(
    node: &EndpointNode<S>,
    ctx: &mut CompileContext,
    routes: &mut Vec<CompiledRoute<S>>,
    seen: &mut HashSet<String>,
) {
    // The root marker contributes nothing to the joined path.
    let own: Vec<&PathSegment> = node.segments.iter().filter(|s| !s.is_root()).collect();

    let joined_before = ctx.joined.len();
    let segments_before = ctx.segments.len();
    let inherited_before = ctx.inherited.len();

    for seg in &own {
        ctx.joined.push(seg.format_wire());
        ctx.segments.push((*seg).clone());
    }

    if node.handler.is_some() || node.expose {
        let full_path = if ctx.joined.is_empty() {
            if ctx.prefix.is_empty() {
                "/".to_string()
            } else {
                ctx.prefix.clone()
            }
        } else {
            format!("{}/{}", ctx.prefix, ctx.joined.join("/"))
        };

        if seen.contains(&full_path) {
            tracing::warn!(path = %full_path, "Route path conflict, keeping first-registered route");
        } else {
            seen.insert(full_path.clone());
            routes.push(CompiledRoute {
                full_path,
                segments: ctx.segments.clone(),
                methods: node.methods.clone(),
                handler: node.handler.clone(),
                inherited_params: ctx.inherited.clone(),
            });
        }
    }

    // Own parameters become inherited for descendants only.
    for seg in &own {
        if let PathSegment::Parameter { name, ty } = seg {
            ctx.inherited.push((*ty, name.clone()));
        }
    }

    for child in &node.children {
        collect_routes(child, ctx, routes, seen);
    }

    ctx.joined.truncate(joined_before);
    ctx.segments.truncate(segments_before);
    ctx.inherited.truncate(inherited_before);
}

fn build_tree<S>(node: &EndpointNode<S>) -> PathTree {
    let joined: Vec<String> = node
        .segments
        .iter()
        .filter(|s| !s.is_root())
        .map(|s| s.format_display())
        .collect();

    PathTree {
        path: format!("/{}", joined.join("/")),
        methods: node.methods.iter().map(|m| m.to_string()).collect(),
        children: node.children.iter().map(build_tree).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dispatch::HandlerResult;
    use crate::api::status::ApiStatus;

    fn ok_node(name: &str) -> EndpointNode<()> {
        EndpointNode::new(name).handler(|_| Ok(HandlerResult::Status(ApiStatus::ok())))
    }

    fn paths(routes: &[CompiledRoute<()>]) -> Vec<&str> {
        routes.iter().map(|r| r.full_path()).collect()
    }

    #[test]
    fn compiles_the_account_tree() {
        let root = EndpointNode::root().handler(|_| Ok(HandlerResult::Status(ApiStatus::ok()))).child(
            ok_node("user")
                .methods([
                    HttpMethod::Get,
                    HttpMethod::Post,
                    HttpMethod::Put,
                    HttpMethod::Patch,
                    HttpMethod::Delete,
                ])
                .child(ok_node("verify"))
                .child(ok_node("reset").methods([HttpMethod::Get, HttpMethod::Post]))
                .child(ok_node("token").methods([HttpMethod::Get, HttpMethod::Post])),
        );
        let api = Api::new(root);
        let routes = api.compile();

        assert_eq!(
            paths(&routes),
            vec![
                "/api/user/verify",
                "/api/user/token",
                "/api/user/reset",
                "/api/user",
                "/api",
            ]
        );

        let user = routes.iter().find(|r| r.full_path() == "/api/user").unwrap();
        assert_eq!(user.methods().len(), 5);

        let tree = api.tree();
        assert_eq!(tree.path, "/");
        assert_eq!(tree.children.len(), 1);
        let user_tree = &tree.children[0];
        assert_eq!(user_tree.path, "/user");
        let child_paths: Vec<&str> =
            user_tree.children.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(child_paths, vec!["/verify", "/reset", "/token"]);
    }

    #[test]
    fn compilation_is_deterministic() {
        let make = || {
            Api::new(
                EndpointNode::root().child(
                    ok_node("a")
                        .child(ok_node("b"))
                        .child(ok_node("c")),
                ),
            )
        };
        assert_eq!(paths(&make().compile()), paths(&make().compile()));
    }

    #[test]
    fn first_registered_route_wins_on_conflict() {
        let first = EndpointNode::<()>::new("dup")
            .handler(|_| Ok(HandlerResult::Status(ApiStatus::ok())));
        let second = EndpointNode::<()>::new("dup")
            .methods([HttpMethod::Post])
            .handler(|_| Ok(HandlerResult::Status(ApiStatus::created())));

        let api = Api::new(EndpointNode::root().child(first).child(second));
        let routes = api.compile();

        assert_eq!(routes.len(), 1);
        // The survivor is the pre-order first node (GET, not POST).
        assert!(routes[0].methods().contains(&HttpMethod::Get));
        assert!(!routes[0].methods().contains(&HttpMethod::Post));
    }

    #[test]
    fn parameters_inherit_ancestor_to_descendant() {
        let leaf = ok_node("posts").child(
            EndpointNode::with_segments(vec![PathSegment::param("post_id", ParamType::Int)])
                .handler(|_| Ok(HandlerResult::Status(ApiStatus::ok()))),
        );
        let tree = EndpointNode::root().child(
            EndpointNode::with_segments(vec![
                PathSegment::fixed("user"),
                PathSegment::param("user_id", ParamType::Uuid),
            ])
            .child(leaf),
        );

        let api = Api::new(tree);
        let routes = api.compile();

        let deep = routes
            .iter()
            .find(|r| r.full_path() == "/api/user/{uuid:user_id}/posts/{int:post_id}")
            .expect("deep route compiled");
        assert_eq!(
            deep.inherited_params(),
            &[(ParamType::Uuid, "user_id".to_string())]
        );
        // Match order: inherited first, own last.
        let order: Vec<&str> = deep.param_segments().map(|(n, _)| n).collect();
        assert_eq!(order, vec!["user_id", "post_id"]);
    }

    #[test]
    fn static_sibling_installs_ahead_of_a_parameter_route() {
        let param = EndpointNode::with_segments(vec![PathSegment::param(
            "name",
            ParamType::String,
        )])
        .handler(|_| Ok(HandlerResult::Status(ApiStatus::ok())));
        let api = Api::new(
            EndpointNode::root()
                .child(param)
                .child(ok_node("verify")),
        );
        let routes = api.compile();
        assert_eq!(paths(&routes), vec!["/api/verify", "/api/{string:name}"]);

        // The static route must stay reachable.
        let table = api.bind(RouteTable::new()).install().unwrap();
        match table.resolve(HttpMethod::Get, "/api/verify") {
            Resolution::Route { raw_params, .. } => assert!(raw_params.is_empty()),
            _ => panic!("expected the static route"),
        }
        match table.resolve(HttpMethod::Get, "/api/ada") {
            Resolution::Route { raw_params, .. } => {
                assert_eq!(raw_params[0].0, "name");
            }
            _ => panic!("expected the parameter route"),
        }
    }

    #[test]
    fn structural_nodes_produce_no_route() {
        let api = Api::new(
            EndpointNode::root().child(EndpointNode::<()>::new("group").child(ok_node("leaf"))),
        );
        assert_eq!(paths(&api.compile()), vec!["/api/group/leaf"]);
    }

    #[test]
    fn exposed_node_without_handler_is_routed() {
        let api = Api::new(EndpointNode::root().child(EndpointNode::<()>::new("stub").expose()));
        let routes = api.compile();
        assert_eq!(paths(&routes), vec!["/api/stub"]);
        assert!(routes[0].handler().is_none());
    }

    #[test]
    fn install_requires_bound_table() {
        let api = Api::new(EndpointNode::root().child(ok_node("user")));
        assert!(matches!(api.install(), Err(ApiError::AppNotBound)));
    }

    #[test]
    fn reregistration_is_a_noop() {
        let api = Api::new(EndpointNode::root().child(ok_node("user"))).bind(RouteTable::new());
        let mut table = api.install().unwrap();
        assert!(table.is_registered("/api/user"));
        assert_eq!(table.len(), 1);

        let again = Api::new(EndpointNode::root().child(ok_node("user"))).compile();
        for route in again {
            assert!(!table.register(route));
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn resolve_matches_typed_params() {
        let node = EndpointNode::<()>::with_segments(vec![
            PathSegment::fixed("user"),
            PathSegment::param("id", ParamType::Int),
        ])
        .handler(|_| Ok(HandlerResult::Status(ApiStatus::ok())));
        let table = Api::new(EndpointNode::root().child(node))
            .bind(RouteTable::new())
            .install()
            .unwrap();

        match table.resolve(HttpMethod::Get, "/api/user/42") {
            Resolution::Route { raw_params, .. } => {
                assert_eq!(
                    raw_params,
                    vec![("id".to_string(), ParamType::Int, "42".to_string())]
                );
            }
            _ => panic!("expected a match"),
        }
        assert!(matches!(
            table.resolve(HttpMethod::Post, "/api/user/42"),
            Resolution::MethodNotAllowed
        ));
        assert!(matches!(
            table.resolve(HttpMethod::Get, "/api/other"),
            Resolution::NotFound
        ));
    }

    #[test]
    fn path_param_captures_rest() {
        let node = EndpointNode::<()>::with_segments(vec![
            PathSegment::fixed("files"),
            PathSegment::param("rest", ParamType::Path),
        ])
        .handler(|_| Ok(HandlerResult::Status(ApiStatus::ok())));
        let table = Api::new(EndpointNode::root().child(node))
            .bind(RouteTable::new())
            .install()
            .unwrap();

        match table.resolve(HttpMethod::Get, "/api/files/a/b/c.txt") {
            Resolution::Route { raw_params, .. } => {
                assert_eq!(raw_params[0].2, "a/b/c.txt");
            }
            _ => panic!("expected a match"),
        }
        assert!(matches!(
            table.resolve(HttpMethod::Get, "/api/files"),
            Resolution::NotFound
        ));
    }
}
