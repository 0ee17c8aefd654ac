//! Shared fixtures: a mock D+ server and wire-format builders
#![allow(dead_code)]

use divus_dplus_rust::{DplusConfig, DplusCredentials, DplusHttpClient};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN_PATH: &str = "/www/modules/system/user_login.php";
pub const SURROUNDING_PATH: &str = "/www/modules/system/surrounding.php";
pub const STATE_QUERY_PATH: &str = "/www/modules/system/api.php";
pub const COMMAND_PATH: &str = "/cgi-bin/dpadws";

pub const SESSION_TOKEN: &str = "session-1";
pub const ENVIRONMENTS_NAME: &str = "_DPAD_PRODUCT_K3_MENU_ENVIRONMENTS";

/// Client wired to the mock server with default settings
pub fn test_client(server: &MockServer) -> DplusHttpClient {
    let config = DplusConfig {
        url: server.uri().parse().unwrap(),
        ..DplusConfig::default()
    };
    DplusHttpClient::new(config, DplusCredentials::new("installer", "secret")).unwrap()
}

/// XML login response carrying a session token
pub fn login_response(token: &str) -> String {
    format!("<?xml version=\"1.0\"?><login><sessionid>{token}</sessionid></login>")
}

/// XML state query response with a row payload
pub fn state_response(payload: &str) -> String {
    format!("<?xml version=\"1.0\"?><response><payload>{payload}</payload></response>")
}

/// XML state query response without a payload element
pub fn empty_state_response() -> String {
    "<?xml version=\"1.0\"?><response><status>ok</status></response>".to_string()
}

/// One node of a surrounding query response body
pub fn node_json(
    id: &str,
    name: &str,
    owned_by: &str,
    node_type: &str,
    current_value: &str,
    optionalp: &str,
    rendering_id: &str,
) -> String {
    format!(
        r#""obj{id}": {{"ID": "{id}", "NAME": "{name}", "OWNED_BY": "{owned_by}", "TYPE": "{node_type}", "CURRENT_VALUE": "{current_value}", "OPTIONALP": "{optionalp}", "RENDERING_ID": "{rendering_id}"}}"#
    )
}

/// Full surrounding query body; nodes keep the given order
pub fn surrounding_response(nodes: &[String]) -> String {
    format!(
        r#"{{"getObjsFromId": {{"data": {{{}}}}}}}"#,
        nodes.join(", ")
    )
}

/// Mount the login endpoint answering with [`SESSION_TOKEN`]
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_string_contains("op=login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response(SESSION_TOKEN)))
        .named("login")
        .mount(server)
        .await;
}

/// Mount a surrounding query answer for one node id
pub async fn mount_surrounding(server: &MockServer, surrounding_id: &str, nodes: &[String]) {
    Mock::given(method("POST"))
        .and(path(SURROUNDING_PATH))
        .and(body_string_contains(format!("ids={surrounding_id}&filter")))
        .respond_with(ResponseTemplate::new(200).set_body_string(surrounding_response(nodes)))
        .named(format!("surrounding {surrounding_id}"))
        .mount(server)
        .await;
}

/// Mount the state query endpoint answering with the given payload rows
pub async fn mount_states(server: &MockServer, payload: &str) {
    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .and(body_string_contains("src=DPADD_OBJECT"))
        .respond_with(ResponseTemplate::new(200).set_body_string(state_response(payload)))
        .named("state query")
        .mount(server)
        .await;
}
