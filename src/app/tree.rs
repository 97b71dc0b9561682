//! The account API declaration tree.
//!
//! One nested declaration is the single source of truth for routing;
//! the compiler derives the route table and the introspection document
//! from it.

use serde_json::{Map, Value};

use crate::api::{Api, EndpointNode, HandlerResult, HttpMethod};
use crate::app::{user, Services};

/// Build the declaration tree, mounted under the given prefix.
///
/// The root answers with the serialized path tree, so the API describes
/// itself at its own mount point.
pub fn build_api(prefix: &str) -> Api<Services> {
    // Probe pass: the introspection payload is the tree itself, so it is
    // computed from an identical declaration before the real one is built.
    let probe = Api::new(declaration(Value::Null)).with_prefix(prefix);
    let tree_json = serde_json::to_value(probe.tree()).expect("path tree serializes");

    Api::new(declaration(tree_json)).with_prefix(prefix)
}

fn declaration(tree_json: Value) -> EndpointNode<Services> {
    EndpointNode::root()
        .handler(move |_| {
            let map: Map<String, Value> = tree_json
                .as_object()
                .cloned()
                .unwrap_or_default();
            Ok(HandlerResult::Object(map))
        })
        .child(
            EndpointNode::new("user")
                .methods([
                    HttpMethod::Get,
                    HttpMethod::Post,
                    HttpMethod::Put,
                    HttpMethod::Patch,
                    HttpMethod::Delete,
                ])
                .handler(user::account)
                .child(EndpointNode::new("verify").handler(user::verify))
                .child(
                    EndpointNode::new("reset")
                        .methods([HttpMethod::Get, HttpMethod::Post])
                        .handler(user::reset),
                )
                .child(
                    EndpointNode::new("token")
                        .methods([HttpMethod::Get, HttpMethod::Post])
                        .handler(user::token),
                ),
        )
}
