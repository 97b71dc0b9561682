//! Request dispatch and handler result normalization.
//!
//! # Responsibilities
//! - Resolve `(method, path)` against the installed route table
//! - Validate and type path parameters before the handler runs
//! - Assemble handler arguments: inherited parameters first, then the
//!   route's own, then framework context (path, services)
//! - Normalize every handler return shape into the response envelope
//!
//! # Design Decisions
//! - Handlers return a closed union (`HandlerResult`) instead of being
//!   inspected at runtime; `Err(ApiStatus)` is the early-exit channel for
//!   both error and success short-circuits
//! - Nothing escapes the dispatcher as an error: every failure below this
//!   boundary becomes an envelope
//! - The outer HTTP status mirrors the envelope code

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::compiler::{Resolution, RouteTable};
use crate::api::endpoint::HttpMethod;
use crate::api::segment::ParamValue;
use crate::api::status::ApiStatus;

/// The shared handler signature.
///
/// Handlers are synchronous and may block; the HTTP layer isolates them
/// from the async runtime.
pub type Handler<S> =
    Arc<dyn Fn(&RequestContext<S>) -> Result<HandlerResult, ApiStatus> + Send + Sync>;

/// The closed set of shapes a handler may produce.
#[derive(Debug, Clone)]
pub enum HandlerResult {
    /// A payload nested under `data` in a 200 envelope.
    Object(Map<String, Value>),
    /// A payload merged at the envelope's top level, with the given code.
    ObjectWithCode(Map<String, Value>, u16),
    /// A bare status envelope.
    Status(ApiStatus),
    /// A server-rendered page, passed through verbatim.
    Html(String),
}

/// An incoming request as the dispatcher sees it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Everything a handler receives, in the argument order handlers rely on:
/// inherited path parameters, own parameters, then framework context.
pub struct RequestContext<S> {
    pub method: HttpMethod,
    /// Literal request path.
    pub path: String,
    /// Compiled route pattern the request matched.
    pub route: String,
    params: Vec<(String, ParamValue)>,
    pub query: HashMap<String, String>,
    headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub services: Arc<S>,
}

impl<S> RequestContext<S> {
    /// Typed path parameters in match order (inherited first).
    pub fn params(&self) -> &[(String, ParamValue)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The token from the `Authentication` header.
    pub fn auth_token(&self) -> Result<&str, ApiStatus> {
        self.header("authentication")
            .ok_or_else(|| ApiStatus::unauthorized("'Authentication' header not present"))
    }

    /// The JSON object body, after checking the required keys are present
    /// and non-null.
    pub fn require_body(&self, keys: &[&str]) -> Result<&Map<String, Value>, ApiStatus> {
        let body = self
            .body
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| ApiStatus::bad_request("Invalid body type"))?;
        check_body(body, keys)?;
        Ok(body)
    }
}

/// Validate that the given keys are present and non-null.
pub fn check_body(body: &Map<String, Value>, keys: &[&str]) -> Result<(), ApiStatus> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| matches!(body.get(*key), None | Some(Value::Null)))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    let listed: Vec<String> = missing.iter().map(|k| format!("'{k}'")).collect();
    Err(ApiStatus::bad_request(format!(
        "Body is missing keys: [{}]",
        listed.join(", ")
    )))
}

/// What the dispatcher hands back to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub code: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Html(String),
}

impl ApiResponse {
    fn from_status(status: ApiStatus) -> Self {
        Self {
            code: status.code(),
            body: ResponseBody::Json(status.envelope()),
        }
    }
}

/// Resolves requests against the route table and runs handlers.
///
/// Holds no per-request state; a single dispatcher is shared across all
/// concurrently handled requests.
pub struct Dispatcher<S> {
    table: Arc<RouteTable<S>>,
    services: Arc<S>,
}

impl<S> Dispatcher<S> {
    pub fn new(table: Arc<RouteTable<S>>, services: Arc<S>) -> Self {
        Self { table, services }
    }

    pub fn table(&self) -> &RouteTable<S> {
        &self.table
    }

    /// Dispatch one request. Never panics outward; every outcome is an
    /// `ApiResponse`.
    pub fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        let (route, raw_params) = match self.table.resolve(request.method, &request.path) {
            Resolution::Route { route, raw_params } => (route, raw_params),
            Resolution::MethodNotAllowed => {
                return ApiResponse::from_status(ApiStatus::method_not_allowed());
            }
            Resolution::NotFound => {
                return ApiResponse::from_status(ApiStatus::not_found_default());
            }
        };

        let Some(handler) = route.handler().cloned() else {
            tracing::debug!(path = %request.path, "No handler bound for route");
            return ApiResponse::from_status(ApiStatus::not_implemented());
        };

        // Type-validate captures before the handler sees anything.
        let mut params = Vec::with_capacity(raw_params.len());
        for (name, ty, raw) in raw_params {
            match ty.parse(&raw) {
                Some(value) => params.push((name, value)),
                None => {
                    return ApiResponse::from_status(ApiStatus::bad_request(format!(
                        "Invalid value '{raw}' for parameter '{name}'"
                    )));
                }
            }
        }

        let ctx = RequestContext {
            method: request.method,
            path: request.path,
            route: route.full_path().to_string(),
            params,
            query: request.query,
            headers: request.headers,
            body: request.body,
            services: self.services.clone(),
        };

        match handler(&ctx) {
            Ok(HandlerResult::Object(map)) => {
                let status = ApiStatus::ok();
                ApiResponse {
                    code: status.code(),
                    body: ResponseBody::Json(status.envelope_with_data(Value::Object(map))),
                }
            }
            Ok(HandlerResult::ObjectWithCode(map, code)) => match ApiStatus::from_code(code) {
                Ok(status) => ApiResponse {
                    code,
                    body: ResponseBody::Json(status.envelope_merged(map)),
                },
                Err(e) => {
                    tracing::error!(code, "Handler returned a code outside the status table");
                    ApiResponse::from_status(ApiStatus::internal(e.to_string()))
                }
            },
            Ok(HandlerResult::Status(status)) | Err(status) => ApiResponse::from_status(status),
            Ok(HandlerResult::Html(page)) => ApiResponse {
                code: 200,
                body: ResponseBody::Html(page),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::compiler::Api;
    use crate::api::endpoint::EndpointNode;
    use crate::api::segment::{ParamType, PathSegment};
    use serde_json::json;

    fn dispatcher(root: EndpointNode<()>) -> Dispatcher<()> {
        let table = Api::new(root)
            .bind(RouteTable::new())
            .install()
            .unwrap();
        Dispatcher::new(Arc::new(table), Arc::new(()))
    }

    fn json_body(response: &ApiResponse) -> &Value {
        match &response.body {
            ResponseBody::Json(v) => v,
            ResponseBody::Html(_) => panic!("expected JSON"),
        }
    }

    #[test]
    fn object_shape_wraps_under_data() {
        let d = dispatcher(EndpointNode::root().child(EndpointNode::new("user").handler(|_| {
            let mut map = Map::new();
            map.insert("name".into(), json!("ada"));
            Ok(HandlerResult::Object(map))
        })));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/user"));
        assert_eq!(res.code, 200);
        let body = json_body(&res);
        assert_eq!(body["status"]["code"], 200);
        assert_eq!(body["data"]["name"], "ada");
    }

    #[test]
    fn pair_shape_merges_top_level() {
        let d = dispatcher(EndpointNode::root().child(EndpointNode::new("login").handler(|_| {
            let mut map = Map::new();
            map.insert("token".into(), json!("abc"));
            Ok(HandlerResult::ObjectWithCode(map, 201))
        })));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/login"));
        assert_eq!(res.code, 201);
        let body = json_body(&res);
        assert_eq!(body["status"]["code"], 201);
        assert_eq!(body["status"]["message"], "Created");
        assert_eq!(body["token"], "abc");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn empty_pair_is_a_bare_envelope() {
        let d = dispatcher(EndpointNode::root().child(
            EndpointNode::new("made").handler(|_| Ok(HandlerResult::ObjectWithCode(Map::new(), 201))),
        ));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/made"));
        let body = json_body(&res);
        assert_eq!(
            body,
            &json!({"status": {"code": 201, "message": "Created"}})
        );
    }

    #[test]
    fn status_short_circuit_has_no_data_key() {
        let d = dispatcher(EndpointNode::root().child(
            EndpointNode::new("gone").handler(|_| Err(ApiStatus::not_found("User not found"))),
        ));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/gone"));
        assert_eq!(res.code, 404);
        let body = json_body(&res);
        assert_eq!(body["status"]["message"], "User not found");
        assert!(body.get("data").is_none());
    }

    #[test]
    fn html_passes_through_verbatim() {
        let page = "<html><body>hi</body></html>";
        let d = dispatcher(EndpointNode::root().child(
            EndpointNode::new("page").handler(move |_| Ok(HandlerResult::Html(page.to_string()))),
        ));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/page"));
        assert_eq!(res.code, 200);
        assert_eq!(res.body, ResponseBody::Html(page.to_string()));
    }

    #[test]
    fn missing_handler_yields_501() {
        let d = dispatcher(EndpointNode::root().child(EndpointNode::new("stub").expose()));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/stub"));
        assert_eq!(res.code, 501);
        assert_eq!(json_body(&res)["status"]["code"], 501);
    }

    #[test]
    fn unknown_path_yields_404_and_wrong_method_405() {
        let d = dispatcher(EndpointNode::root().child(
            EndpointNode::new("user").handler(|_| Ok(HandlerResult::Status(ApiStatus::ok()))),
        ));
        assert_eq!(
            d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/missing")).code,
            404
        );
        assert_eq!(
            d.dispatch(ApiRequest::new(HttpMethod::Post, "/api/user")).code,
            405
        );
    }

    #[test]
    fn static_route_shadows_a_parameter_sibling() {
        let param = EndpointNode::with_segments(vec![PathSegment::param(
            "name",
            ParamType::String,
        )])
        .handler(|_| {
            let mut map = Map::new();
            map.insert("kind".into(), json!("parameter"));
            Ok(HandlerResult::Object(map))
        });
        let fixed = EndpointNode::new("verify").handler(|_| {
            let mut map = Map::new();
            map.insert("kind".into(), json!("static"));
            Ok(HandlerResult::Object(map))
        });
        let d = dispatcher(EndpointNode::root().child(param).child(fixed));

        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/verify"));
        assert_eq!(json_body(&res)["data"]["kind"], "static");
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/ada"));
        assert_eq!(json_body(&res)["data"]["kind"], "parameter");
    }

    #[test]
    fn bad_parameter_fails_before_the_handler() {
        let node = EndpointNode::with_segments(vec![
            PathSegment::fixed("item"),
            PathSegment::param("id", ParamType::Int),
        ])
        .handler(|_| panic!("handler must not run"));
        let d = dispatcher(EndpointNode::root().child(node));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/item/forty-two"));
        assert_eq!(res.code, 400);
    }

    #[test]
    fn typed_params_arrive_in_inheritance_order() {
        let leaf = EndpointNode::with_segments(vec![PathSegment::param("post", ParamType::Int)])
            .handler(|ctx| {
                let names: Vec<&str> =
                    ctx.params().iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["owner", "post"]);
                assert!(ctx.param("owner").unwrap().as_uuid().is_some());
                assert_eq!(ctx.param("post").unwrap().as_int(), Some(7));
                Ok(HandlerResult::Status(ApiStatus::ok()))
            });
        let tree = EndpointNode::root().child(
            EndpointNode::with_segments(vec![
                PathSegment::fixed("user"),
                PathSegment::param("owner", ParamType::Uuid),
            ])
            .child(EndpointNode::new("posts").child(leaf)),
        );
        let d = dispatcher(tree);
        let res = d.dispatch(ApiRequest::new(
            HttpMethod::Get,
            "/api/user/67e55044-10b1-426f-9247-bb680e5fe0c8/posts/7",
        ));
        assert_eq!(res.code, 200);
    }

    #[test]
    fn missing_body_keys_report_exactly() {
        let d = dispatcher(EndpointNode::root().child(
            EndpointNode::new("user")
                .methods([HttpMethod::Delete])
                .handler(|ctx| {
                    ctx.require_body(&["password"])?;
                    Ok(HandlerResult::Status(ApiStatus::ok()))
                }),
        ));
        let res = d.dispatch(
            ApiRequest::new(HttpMethod::Delete, "/api/user").body(json!({"name": "ada"})),
        );
        assert_eq!(res.code, 400);
        assert_eq!(
            json_body(&res)["status"]["message"],
            "Body is missing keys: ['password']"
        );
    }

    #[test]
    fn absent_body_is_a_bad_request() {
        let d = dispatcher(EndpointNode::root().child(EndpointNode::new("user").handler(
            |ctx| {
                ctx.require_body(&["password"])?;
                Ok(HandlerResult::Status(ApiStatus::ok()))
            },
        )));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/user"));
        assert_eq!(res.code, 400);
        assert_eq!(json_body(&res)["status"]["message"], "Invalid body type");
    }

    #[test]
    fn missing_auth_header_is_401() {
        let d = dispatcher(EndpointNode::root().child(EndpointNode::new("me").handler(
            |ctx| {
                ctx.auth_token()?;
                Ok(HandlerResult::Status(ApiStatus::ok()))
            },
        )));
        let res = d.dispatch(ApiRequest::new(HttpMethod::Get, "/api/me"));
        assert_eq!(res.code, 401);
        assert_eq!(
            json_body(&res)["status"]["message"],
            "'Authentication' header not present"
        );
    }
}
