//! Discovery tests: the surrounding tree walk with exclusion rules.

mod common;

use common::*;
use divus_dplus_rust::{discover_devices, DplusError};
use pretty_assertions::assert_eq;
use wiremock::MockServer;

/// Mount a small but complete controller tree:
///
/// top (187) ─ environments (200)
///   ├─ Living Room (300): switch light 1000, shutter 1001
///   ├─ Bedroom (310): climate 1100
///   └─ SYSTEM-owned node 390 (excluded)
async fn mount_tree(server: &MockServer) {
    mount_surrounding(
        server,
        "187",
        &[
            node_json("199", "SomeMenu", "admin", "CONTAINER", "", "", ""),
            node_json("200", ENVIRONMENTS_NAME, "admin", "CONTAINER", "", "", ""),
        ],
    )
    .await;

    mount_surrounding(
        server,
        "200",
        &[
            node_json("300", "Living Room", "admin", "CONTAINER", "", "", ""),
            node_json("310", "Bedroom", "admin", "CONTAINER", "", "", ""),
            node_json("390", "Maintenance", "SYSTEM", "CONTAINER", "", "", ""),
        ],
    )
    .await;

    // Room listings include the room itself and system-owned helpers.
    mount_surrounding(
        server,
        "300",
        &[
            node_json("300", "Living Room", "admin", "CONTAINER", "", "", ""),
            node_json(
                "1000",
                "Ceiling Light",
                "admin",
                "EIBOBJECT",
                "0",
                "category='lighting'",
                "",
            ),
            node_json(
                "1001",
                "Window Shutter",
                "admin",
                "CONTAINER",
                "",
                "category='shutters'",
                "",
            ),
            node_json("398", "RoomHelper", "SYSTEM", "EIBOBJECT", "", "", ""),
        ],
    )
    .await;

    mount_surrounding(
        server,
        "310",
        &[node_json(
            "1100",
            "Thermostat",
            "admin",
            "CONTAINER",
            "",
            "category='climate'",
            "",
        )],
    )
    .await;

    // Device listings include the device itself and system-owned helpers.
    mount_surrounding(
        server,
        "1000",
        &[
            node_json("1000", "Ceiling Light", "admin", "EIBOBJECT", "0", "", ""),
            node_json("399", "DeviceHelper", "SYSTEM", "EIBOBJECT", "", "", ""),
        ],
    )
    .await;

    mount_surrounding(
        server,
        "1001",
        &[
            node_json("1001", "Window Shutter", "admin", "CONTAINER", "", "", ""),
            node_json("10011", "Long", "admin", "EIBOBJECT", "0", "", "25"),
            node_json("10012", "Short", "admin", "EIBOBJECT", "0", "", "27"),
        ],
    )
    .await;

    mount_surrounding(
        server,
        "1100",
        &[
            node_json("11001", "Current", "admin", "EIBOBJECT", "21.5", "", "34"),
            node_json("11002", "Target", "admin", "EIBOBJECT", "22", "", "35"),
            node_json("397", "ClimateHelper", "SYSTEM", "EIBOBJECT", "", "", ""),
        ],
    )
    .await;
}

#[tokio::test]
async fn walks_the_tree_and_links_rooms() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_tree(&server).await;

    let client = test_client(&server);
    let devices = discover_devices(&client).await.unwrap();

    let ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["1000", "1001", "1100"]);

    assert_eq!(devices[0].parent_id, "300");
    assert_eq!(devices[0].parent_name, "Living Room");
    assert_eq!(devices[2].parent_id, "310");
    assert_eq!(devices[2].parent_name, "Bedroom");

    assert_eq!(devices[0].name(), "Ceiling Light");
    assert_eq!(devices[1].attributes.category().as_deref(), Some("shutters"));
}

#[tokio::test]
async fn excludes_system_owned_and_self_referencing_nodes() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_tree(&server).await;

    let client = test_client(&server);
    let devices = discover_devices(&client).await.unwrap();

    for device in &devices {
        assert_ne!(device.attributes.owned_by, "SYSTEM");
        for sub in &device.sub_elements {
            assert_ne!(sub.owned_by, "SYSTEM");
            assert_ne!(sub.id, device.id, "self-reference in {}", device.id);
        }
    }

    // The light's listing held only itself and a system helper.
    assert!(devices[0].sub_elements.is_empty());

    // The shutter keeps both control points, in controller order.
    let shutter_subs: Vec<&str> = devices[1]
        .sub_elements
        .iter()
        .map(|sub| sub.id.as_str())
        .collect();
    assert_eq!(shutter_subs, ["10011", "10012"]);

    // The climate device keeps both probes, not the system helper.
    assert_eq!(devices[2].sub_elements.len(), 2);
}

#[tokio::test]
async fn missing_environments_container_is_a_discovery_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    mount_surrounding(
        &server,
        "187",
        &[node_json("199", "SomeMenu", "admin", "CONTAINER", "", "", "")],
    )
    .await;

    let client = test_client(&server);
    let result = discover_devices(&client).await;

    assert!(matches!(result, Err(DplusError::Discovery(_))));
}
