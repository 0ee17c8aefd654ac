//! Climate entity
//!
//! A `CONTAINER` with `category='climate'` carries two temperature
//! sub-elements: the current-temperature probe and the target set point.
//! The controller accepts the set point as an integer string.

use crate::client::{http_client::DplusHttpClient, Device, DeviceState};
use crate::entities::{
    DplusEntity, IntegrationContext, RENDERING_CURRENT_TEMPERATURE,
    RENDERING_TARGET_TEMPERATURE,
};
use crate::error::{DplusError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Lowest accepted target temperature in °C
pub const MIN_TARGET_TEMPERATURE: f64 = 15.0;
/// Highest accepted target temperature in °C
pub const MAX_TARGET_TEMPERATURE: f64 = 30.0;
/// UI step for the target temperature in °C
pub const TARGET_TEMPERATURE_STEP: f64 = 0.1;

/// Room thermostat
pub struct Climate {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    current_id: Option<String>,
    target_id: Option<String>,
    poll_ids: HashSet<String>,
    current_temperature: Option<f64>,
    target_temperature: Option<f64>,
}

impl Climate {
    /// Returns `None` when the device carries neither temperature
    /// sub-element.
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Option<Self> {
        let current = device.sub_element_by_rendering(RENDERING_CURRENT_TEMPERATURE);
        let target = device.sub_element_by_rendering(RENDERING_TARGET_TEMPERATURE);

        let poll_ids: HashSet<String> = current
            .iter()
            .chain(target.iter())
            .map(|sub| sub.id.clone())
            .collect();
        if poll_ids.is_empty() {
            return None;
        }

        debug!(name = device.name(), "adding climate entity");

        Some(Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(&device.id),
            name: device.name().to_string(),
            current_temperature: current.and_then(|sub| sub.current_value.trim().parse().ok()),
            target_temperature: target.and_then(|sub| sub.current_value.trim().parse().ok()),
            current_id: current.map(|sub| sub.id.clone()),
            target_id: target.map(|sub| sub.id.clone()),
            poll_ids,
        })
    }

    /// Last reported room temperature in °C
    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    /// Last reported target temperature in °C
    pub fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    /// Write a new target temperature.
    ///
    /// The controller takes integer set points; the value is truncated
    /// before sending.
    pub async fn set_temperature(&self, temperature: f64) -> Result<()> {
        let target_id = self.target_id.as_deref().ok_or_else(|| {
            DplusError::device_control(format!(
                "climate '{}' has no target temperature point",
                self.name
            ))
        })?;

        let encoded = format!("{}", temperature.trunc() as i64);
        self.client.set_value(target_id, &encoded).await?;
        debug!(name = %self.name, temperature, "set target temperature");
        Ok(())
    }
}

impl DplusEntity for Climate {
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
        let Ok(value) = state.current_value.trim().parse::<f64>() else {
            return false;
        };

        if self.current_id.as_deref() == Some(state.id.as_str()) {
            if self.current_temperature != Some(value) {
                self.current_temperature = Some(value);
                return true;
            }
        } else if self.target_id.as_deref() == Some(state.id.as_str())
            && self.target_temperature != Some(value)
        {
            self.target_temperature = Some(value);
            return true;
        }

        false
    }
}
