//! Light entities
//!
//! Two variants: a plain on/off light backed by a single `EIBOBJECT`,
//! and a dimmable light backed by a `CONTAINER` whose sub-elements carry
//! the switch channel and the brightness level (percent).

use crate::client::{http_client::DplusHttpClient, Device, DeviceState};
use crate::entities::{
    DplusEntity, IntegrationContext, RENDERING_DIM_LEVEL, RENDERING_SWITCH_CHANNEL,
};
use crate::error::{DplusError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// On/off light backed by a single controller object
pub struct SwitchLight {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    device_id: String,
    poll_ids: HashSet<String>,
    is_on: bool,
}

impl SwitchLight {
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Self {
        debug!(name = device.name(), "adding switch light");

        Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(&device.id),
            name: device.name().to_string(),
            device_id: device.id.clone(),
            poll_ids: HashSet::from([device.id.clone()]),
            is_on: device.attributes.current_value == "1",
        }
    }

    /// Whether the light is currently on
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Switch the light on
    pub async fn turn_on(&self) -> Result<()> {
        self.client.set_value(&self.device_id, "1").await?;
        Ok(())
    }

    /// Switch the light off
    pub async fn turn_off(&self) -> Result<()> {
        self.client.set_value(&self.device_id, "0").await?;
        Ok(())
    }
}

impl DplusEntity for SwitchLight {
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

/// Dimmable light backed by switch and brightness sub-elements
pub struct DimmerLight {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    switch_id: Option<String>,
    dim_id: Option<String>,
    poll_ids: HashSet<String>,
    is_on: bool,
    level: u8,
}

impl DimmerLight {
    /// Returns `None` when the device carries neither a switch channel
    /// nor a dim level; such an entity would have nothing to poll.
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Option<Self> {
        let switch = device.sub_element_by_rendering(RENDERING_SWITCH_CHANNEL);
        let dim = device.sub_element_by_rendering(RENDERING_DIM_LEVEL);

        let poll_ids: HashSet<String> = switch
            .iter()
            .chain(dim.iter())
            .map(|sub| sub.id.clone())
            .collect();
        if poll_ids.is_empty() {
            return None;
        }

        debug!(name = device.name(), "adding dimmable light");

        Some(Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(&device.id),
            name: device.name().to_string(),
            is_on: switch.map(|sub| sub.current_value != "0").unwrap_or(false),
            level: dim.map(|sub| parse_percent(&sub.current_value)).unwrap_or(0),
            switch_id: switch.map(|sub| sub.id.clone()),
            dim_id: dim.map(|sub| sub.id.clone()),
            poll_ids,
        })
    }

    /// Whether the light is currently on
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Current brightness in percent (0–100)
    pub fn brightness_percent(&self) -> u8 {
        self.level
    }

    /// Switch the light on, optionally at a brightness percent
    pub async fn turn_on(&self, brightness: Option<u8>) -> Result<()> {
        let switch_id = self.switch_id.as_deref().ok_or_else(|| {
            DplusError::device_control(format!("light '{}' has no switch channel", self.name))
        })?;
        self.client.set_value(switch_id, "1").await?;

        if let Some(percent) = brightness {
            let dim_id = self.dim_id.as_deref().ok_or_else(|| {
                DplusError::device_control(format!("light '{}' has no dim channel", self.name))
            })?;
            let percent = percent.min(100);
            self.client.set_value(dim_id, &percent.to_string()).await?;
        }

        Ok(())
    }

    /// Switch the light off
    pub async fn turn_off(&self) -> Result<()> {
        let switch_id = self.switch_id.as_deref().ok_or_else(|| {
            DplusError::device_control(format!("light '{}' has no switch channel", self.name))
        })?;
        self.client.set_value(switch_id, "0").await?;
        Ok(())
    }
}

impl DplusEntity for DimmerLight {
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
        if self.switch_id.as_deref() == Some(state.id.as_str()) {
            let is_on = state.current_value != "0";
            if is_on != self.is_on {
                self.is_on = is_on;
                return true;
            }
        } else if self.dim_id.as_deref() == Some(state.id.as_str()) {
            let level = parse_percent(&state.current_value);
            if level != self.level {
                self.level = level;
                return true;
            }
        }

        false
    }
}

/// Parse a controller value as a brightness percent, clamped to 0–100.
/// Unparseable values read as 0.
fn parse_percent(value: &str) -> u8 {
    value
        .trim()
        .parse::<f64>()
        .map(|v| v.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_parsing_is_lenient() {
        assert_eq!(parse_percent("42"), 42);
        assert_eq!(parse_percent("42.7"), 43);
        assert_eq!(parse_percent("150"), 100);
        assert_eq!(parse_percent("-5"), 0);
        assert_eq!(parse_percent("garbage"), 0);
        assert_eq!(parse_percent(""), 0);
    }
}
