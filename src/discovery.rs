//! Device discovery via the controller's surrounding tree
//!
//! A bounded-depth walk of the object hierarchy: top node → environments
//! container → rooms → devices → sub-elements. Controller-internal nodes
//! (owned by `SYSTEM`) and self-referencing children are excluded at
//! every level. The controller returns each level already sorted by
//! `ORDER_NUM,ID`; the walker preserves that order.
//!
//! Cost is O(rooms × devices) round trips with no batching of sibling
//! fetches; discovery must complete before entities can be classified.

use crate::client::{
    http_client::DplusHttpClient, Device, ENVIRONMENTS_NODE_NAME, SYSTEM_OWNER,
    TOP_SURROUNDING_ID,
};
use crate::error::{DplusError, Result};
use tracing::{debug, info};

/// Walk the surrounding tree and return all discovered devices with
/// their room linkage and sub-elements.
pub async fn discover_devices(client: &DplusHttpClient) -> Result<Vec<Device>> {
    let top = client.fetch_surrounding(TOP_SURROUNDING_ID).await?;
    debug!("retrieved top surrounding");

    let environments_id = top
        .values()
        .find(|node| node.name == ENVIRONMENTS_NODE_NAME)
        .map(|node| node.id.clone())
        .ok_or_else(|| {
            DplusError::discovery(format!(
                "environments container '{ENVIRONMENTS_NODE_NAME}' not found below top surrounding"
            ))
        })?;

    let rooms = client.fetch_surrounding(&environments_id).await?;

    let mut devices = Vec::new();

    for room in rooms.values().filter(|node| node.owned_by != SYSTEM_OWNER) {
        let children = client.fetch_surrounding(&room.id).await?;

        for node in children
            .values()
            .filter(|child| child.owned_by != SYSTEM_OWNER && child.id != room.id)
        {
            let grandchildren = client.fetch_surrounding(&node.id).await?;
            let sub_elements: Vec<_> = grandchildren
                .into_values()
                .filter(|sub| sub.owned_by != SYSTEM_OWNER && sub.id != node.id)
                .collect();

            devices.push(Device {
                id: node.id.clone(),
                parent_id: room.id.clone(),
                parent_name: room.name.clone(),
                attributes: node.clone(),
                sub_elements,
            });
        }
    }

    info!(count = devices.len(), "device discovery complete");
    Ok(devices)
}
