//! D+ client implementation for HTTP/XML communication
//!
//! The D+ server exposes a hierarchical object store ("surroundings")
//! over a handful of PHP endpoints plus a SOAP-like command gateway.
//! This module holds the wire model shared by the client, the discovery
//! walker and the entity layer.

pub mod http_client;
pub mod parse;
pub mod session;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known id of the top-level surrounding node on D+ servers.
pub const TOP_SURROUNDING_ID: &str = "187";

/// `NAME` of the container below the top node that holds all environment
/// (room) nodes.
pub const ENVIRONMENTS_NODE_NAME: &str = "_DPAD_PRODUCT_K3_MENU_ENVIRONMENTS";

/// `OWNED_BY` tag marking controller-internal nodes excluded from
/// discovery.
pub const SYSTEM_OWNER: &str = "SYSTEM";

pub(crate) const LOGIN_PATH: &str = "www/modules/system/user_login.php";
pub(crate) const SURROUNDING_PATH: &str = "www/modules/system/surrounding.php";
pub(crate) const STATE_QUERY_PATH: &str = "www/modules/system/api.php";
pub(crate) const COMMAND_PATH: &str = "cgi-bin/dpadws";

/// One node of the controller's object store as returned by the
/// surrounding query.
///
/// The well-known attributes are typed; everything else the controller
/// sends is kept in `extra` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurroundingNode {
    /// Controller-assigned node id
    #[serde(rename = "ID")]
    pub id: String,

    /// Display name
    #[serde(rename = "NAME", default)]
    pub name: String,

    /// Owner tag; `SYSTEM` marks controller-internal nodes
    #[serde(rename = "OWNED_BY", default)]
    pub owned_by: String,

    /// Node type (e.g., `EIBOBJECT`, `CONTAINER`)
    #[serde(rename = "TYPE", default)]
    pub node_type: String,

    /// Current raw value
    #[serde(rename = "CURRENT_VALUE", default)]
    pub current_value: String,

    /// Pipe-delimited metadata string (carries the `category=` token)
    #[serde(rename = "OPTIONALP", default)]
    pub optionalp: String,

    /// Semantic role code of a sub-element (see rendering-id constants
    /// in the entity layer)
    #[serde(rename = "RENDERING_ID", default)]
    pub rendering_id: String,

    /// Remaining controller attributes, passed through opaquely
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl SurroundingNode {
    /// Extract the `category='…'` token from the pipe-delimited
    /// `OPTIONALP` metadata string, if present.
    pub fn category(&self) -> Option<String> {
        self.optionalp
            .split('|')
            .find_map(|token| token.strip_prefix("category="))
            .map(|value| value.trim_matches('\'').to_string())
    }
}

/// Body of a surrounding query response:
/// `{"getObjsFromId": {"data": {…}}}`.
///
/// `data` preserves the controller's `ORDER_NUM,ID` ordering, which the
/// discovery walker relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct SurroundingResponse {
    #[serde(rename = "getObjsFromId")]
    pub get_objs_from_id: SurroundingData,
}

/// `data` map of a surrounding query response
#[derive(Debug, Clone, Deserialize)]
pub struct SurroundingData {
    #[serde(default)]
    pub data: IndexMap<String, SurroundingNode>,
}

/// A discovered controllable device
///
/// Immutable snapshot produced once per discovery pass; the id is only
/// guaranteed stable until the controller restarts.
#[derive(Debug, Clone)]
pub struct Device {
    /// Controller-assigned device id
    pub id: String,

    /// Id of the owning room
    pub parent_id: String,

    /// Display name of the owning room
    pub parent_name: String,

    /// The device's own node attributes
    pub attributes: SurroundingNode,

    /// Child control points (dimmer channels, temperature probes, …) in
    /// controller order
    pub sub_elements: Vec<SurroundingNode>,
}

impl Device {
    /// Display name of the device
    pub fn name(&self) -> &str {
        &self.attributes.name
    }

    /// Find the sub-element with the given rendering id, if any
    pub fn sub_element_by_rendering(&self, rendering_id: &str) -> Option<&SurroundingNode> {
        self.sub_elements
            .iter()
            .find(|sub| sub.rendering_id == rendering_id)
    }
}

/// A single polled state update for a device or sub-element
///
/// `current_value` is the controller's raw string; callers parse it as
/// needed (numeric, boolean-as-`"0"`/`"1"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// Id of the device or sub-element this value belongs to
    pub id: String,

    /// Raw value string
    pub current_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_token_is_extracted_and_unquoted() {
        let node = SurroundingNode {
            optionalp: "icon=bulb|category='lighting'|visible=1".to_string(),
            ..Default::default()
        };
        assert_eq!(node.category().as_deref(), Some("lighting"));
    }

    #[test]
    fn missing_category_token_yields_none() {
        let node = SurroundingNode {
            optionalp: "icon=bulb|visible=1".to_string(),
            ..Default::default()
        };
        assert_eq!(node.category(), None);
    }

    #[test]
    fn surrounding_response_preserves_controller_order() {
        let body = r#"{
            "getObjsFromId": {
                "data": {
                    "obj3": {"ID": "3", "NAME": "Kitchen"},
                    "obj1": {"ID": "1", "NAME": "Living Room"},
                    "obj2": {"ID": "2", "NAME": "Bedroom"}
                }
            }
        }"#;

        let parsed: SurroundingResponse = serde_json::from_str(body).unwrap();
        let ids: Vec<&str> = parsed
            .get_objs_from_id
            .data
            .values()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, ["3", "1", "2"]);
    }
}
