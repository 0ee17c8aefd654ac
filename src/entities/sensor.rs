//! Temperature sensor entity
//!
//! Companion of the climate entity: exposes the current-temperature
//! probe of a climate device as a standalone read-only sensor. Both
//! entities listen to the same sub-element id.

use crate::client::{Device, DeviceState};
use crate::entities::{DplusEntity, IntegrationContext, RENDERING_CURRENT_TEMPERATURE};
use std::collections::HashSet;
use tracing::debug;

/// Read-only temperature sensor in °C
pub struct TemperatureSensor {
    unique_id: String,
    name: String,
    probe_id: String,
    poll_ids: HashSet<String>,
    temperature: Option<f64>,
}

impl TemperatureSensor {
    /// Returns `None` when the device has no current-temperature probe.
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Option<Self> {
        let probe = device.sub_element_by_rendering(RENDERING_CURRENT_TEMPERATURE)?;

        debug!(name = device.name(), "adding temperature sensor");

        Some(Self {
            // Keyed by the probe id so the sensor survives next to its
            // climate sibling, which is keyed by the device id.
            unique_id: ctx.unique_id(&probe.id),
            name: device.name().to_string(),
            probe_id: probe.id.clone(),
            poll_ids: HashSet::from([probe.id.clone()]),
            temperature: probe.current_value.trim().parse().ok(),
        })
    }

    /// Last reported temperature in °C
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }
}

impl DplusEntity for TemperatureSensor {
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
        if state.id != self.probe_id {
            return false;
        }

        let Ok(value) = state.current_value.trim().parse::<f64>() else {
            return false;
        };

        if self.temperature == Some(value) {
            return false;
        }

        self.temperature = Some(value);
        true
    }
}
