//! Switch entity
//!
//! Any `EIBOBJECT` without a more specific category: an on/off point
//! commanded and reported as `"1"`/`"0"`.

use crate::client::{http_client::DplusHttpClient, Device, DeviceState};
use crate::entities::{DplusEntity, IntegrationContext};
use crate::error::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Plain on/off switch
pub struct Switch {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    device_id: String,
    poll_ids: HashSet<String>,
    is_on: bool,
}

impl Switch {
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Self {
        debug!(name = device.name(), "adding switch");

        Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(&device.id),
            name: device.name().to_string(),
            device_id: device.id.clone(),
            poll_ids: HashSet::from([device.id.clone()]),
            is_on: device.attributes.current_value == "1",
        }
    }

    /// Whether the switch is currently on
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Switch on
    pub async fn turn_on(&self) -> Result<()> {
        self.client.set_value(&self.device_id, "1").await?;
        Ok(())
    }

    /// Switch off
    pub async fn turn_off(&self) -> Result<()> {
        self.client.set_value(&self.device_id, "0").await?;
        Ok(())
    }
}

impl DplusEntity for Switch {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn poll_ids(&self) -> &HashSet<String> {
        &self.poll_ids
    }

    fn apply_state(&mut self, state: &DeviceState) -> bool {
        if state.id != self.device_id {
            return false;
        }

        let is_on = state.current_value == "1";
        if is_on == self.is_on {
            return false;
        }

        self.is_on = is_on;
        true
    }
}
