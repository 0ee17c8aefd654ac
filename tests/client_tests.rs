//! Client tests against a mock D+ server: session handling, state
//! queries, and the command gateway.

mod common;

use common::*;
use divus_dplus_rust::{DeviceState, DplusError};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn session_token_is_acquired_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_string_contains("username=installer"))
        .and(body_string_contains("op=login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response(SESSION_TOKEN)))
        .expect(1)
        .named("login happens exactly once")
        .mount(&server)
        .await;
    mount_states(&server, "Row0: header").await;

    let client = test_client(&server);

    client.fetch_states(&["10790".to_string()]).await.unwrap();
    client.fetch_states(&["10790".to_string()]).await.unwrap();

    // MockServer verifies the expect(1) on drop.
}

#[tokio::test]
async fn login_without_token_is_an_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<?xml version=\"1.0\"?><login><error>denied</error></login>"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_states(&["10790".to_string()]).await;

    assert!(matches!(result, Err(DplusError::Authentication(_))));
}

#[tokio::test]
async fn state_rows_parse_through_the_wire() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .and(body_string_contains("type=SELECT"))
        .and(body_string_contains("sessionid=session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(state_response(
            "Row0: header\nRow1: '10790', '1'\nRow2: '10788', '0.5'",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let requested = vec!["10790".to_string(), "10788".to_string()];
    let states = client.fetch_states(&requested).await.unwrap();

    assert_eq!(
        states,
        vec![
            DeviceState {
                id: "10790".to_string(),
                current_value: "1".to_string(),
            },
            DeviceState {
                id: "10788".to_string(),
                current_value: "0.5".to_string(),
            },
        ]
    );

    // Only ids from the input set come back, one state per row.
    for state in &states {
        assert!(requested.contains(&state.id));
    }
}

#[tokio::test]
async fn absent_payload_yields_empty_list() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(empty_state_response()))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let states = client.fetch_states(&["10790".to_string()]).await.unwrap();

    assert!(states.is_empty());
}

#[tokio::test]
async fn empty_id_set_skips_the_round_trip() {
    let server = MockServer::start().await;
    // No mocks at all: any request would 404 and fail the call.

    let client = test_client(&server);
    let states = client.fetch_states(&[]).await.unwrap();

    assert!(states.is_empty());
}

#[tokio::test]
async fn rejected_session_triggers_exactly_one_relogin() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response(SESSION_TOKEN)))
        .expect(2)
        .named("login before and after rejection")
        .mount(&server)
        .await;

    // First state query is rejected; the retry must succeed.
    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(state_response(
            "Row0: header\nRow1: '10790', '1'",
        )))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let states = client.fetch_states(&["10790".to_string()]).await.unwrap();

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].id, "10790");
}

#[tokio::test]
async fn persistent_rejection_surfaces_as_authentication_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_states(&["10790".to_string()]).await;

    assert!(matches!(result, Err(DplusError::Authentication(_))));
}

#[tokio::test]
async fn set_value_posts_the_command_envelope() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(COMMAND_PATH))
        .and(body_string_contains("<idobject>10790</idobject>"))
        .and(body_string_contains("<payload>1</payload>"))
        .and(body_string_contains("<operation>SETVALUE</operation>"))
        .and(body_string_contains("<sessionid>session-1</sessionid>"))
        .respond_with(ResponseTemplate::new(200).set_body_string("service-runonelement:OK"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);

    // No state mocks are mounted: commands must not depend on a poll.
    let ack = client.set_value("10790", "1").await.unwrap();
    assert_eq!(ack, "service-runonelement:OK");
}

#[tokio::test]
async fn surrounding_query_carries_order_and_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(SURROUNDING_PATH))
        .and(body_string_contains("ids=187&filter"))
        .and(body_string_contains("order=ORDER_NUM%2CID"))
        .and(body_string_contains("sessionId=session-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(surrounding_response(&[
            node_json("200", ENVIRONMENTS_NAME, "admin", "CONTAINER", "", "", ""),
        ])))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let nodes = client.fetch_surrounding("187").await.unwrap();

    assert_eq!(nodes.len(), 1);
    let node = nodes.values().next().unwrap();
    assert_eq!(node.id, "200");
    assert_eq!(node.name, ENVIRONMENTS_NAME);
}

#[tokio::test]
async fn malformed_surrounding_body_is_an_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(SURROUNDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_surrounding("187").await;

    assert!(matches!(result, Err(DplusError::MalformedResponse(_))));
}

#[tokio::test]
async fn server_error_propagates_as_connection_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(STATE_QUERY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.fetch_states(&["10790".to_string()]).await;

    assert!(matches!(result, Err(DplusError::Connection(_))));
}
