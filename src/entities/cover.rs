//! Cover entities
//!
//! A shutter is driven through two pulse control points: the long-press
//! point (full travel) and the short-press point (stop / tilt step).
//! Writing `"0"` moves toward open, `"1"` toward closed; the short point
//! with `"1"` also stops a running movement.
//!
//! The control points report momentary pulse values, not position, so
//! polled states carry no usable derived state and `is_closed` stays
//! unknown.

use crate::client::{http_client::DplusHttpClient, Device, DeviceState};
use crate::entities::{
    DplusEntity, IntegrationContext, RENDERING_SHUTTER_LONG, RENDERING_SHUTTER_SHORT,
};
use crate::error::{DplusError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Shutter cover for a single device
pub struct Cover {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    long_id: Option<String>,
    short_id: Option<String>,
    poll_ids: HashSet<String>,
    is_closed: Option<bool>,
}

impl Cover {
    /// Returns `None` when the device carries neither control point.
    pub(crate) fn new(ctx: &IntegrationContext, device: &Device) -> Option<Self> {
        let long = device.sub_element_by_rendering(RENDERING_SHUTTER_LONG);
        let short = device.sub_element_by_rendering(RENDERING_SHUTTER_SHORT);

        let poll_ids: HashSet<String> = long
            .iter()
            .chain(short.iter())
            .map(|sub| sub.id.clone())
            .collect();
        if poll_ids.is_empty() {
            return None;
        }

        debug!(name = device.name(), "adding cover");

        Some(Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(&device.id),
            name: device.name().to_string(),
            long_id: long.map(|sub| sub.id.clone()),
            short_id: short.map(|sub| sub.id.clone()),
            poll_ids,
            is_closed: None,
        })
    }

    /// Whether the cover is closed; `None` while unknown
    pub fn is_closed(&self) -> Option<bool> {
        self.is_closed
    }

    pub(crate) fn long_id(&self) -> Option<&str> {
        self.long_id.as_deref()
    }

    pub(crate) fn short_id(&self) -> Option<&str> {
        self.short_id.as_deref()
    }

    fn long(&self) -> Result<&str> {
        self.long_id.as_deref().ok_or_else(|| {
            DplusError::device_control(format!(
                "cover '{}' has no long-press control point",
                self.name
            ))
        })
    }

    fn short(&self) -> Result<&str> {
        self.short_id.as_deref().ok_or_else(|| {
            DplusError::device_control(format!(
                "cover '{}' has no short-press control point",
                self.name
            ))
        })
    }

    /// Open the cover
    pub async fn open(&self) -> Result<()> {
        self.client.set_value(self.long()?, "0").await?;
        Ok(())
    }

    /// Close the cover
    pub async fn close(&self) -> Result<()> {
        self.client.set_value(self.long()?, "1").await?;
        Ok(())
    }

    /// Stop a running movement
    pub async fn stop(&self) -> Result<()> {
        self.client.set_value(self.short()?, "1").await?;
        Ok(())
    }

    /// Tilt the slats toward open
    pub async fn open_tilt(&self) -> Result<()> {
        self.client.set_value(self.short()?, "0").await?;
        Ok(())
    }

    /// Tilt the slats toward closed
    pub async fn close_tilt(&self) -> Result<()> {
        self.client.set_value(self.short()?, "1").await?;
        Ok(())
    }
}

impl DplusEntity for Cover {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn poll_ids(&self) -> &HashSet<String> {
        &self.poll_ids
    }

    fn apply_state(&mut self, _state: &DeviceState) -> bool {
        // Pulse control points carry no position information.
        false
    }
}

/// Whole-room cover synthesized when a room holds more than one cover
///
/// Fans every command out to all member control points sequentially and
/// tracks no independent state beyond what per-member updates report.
pub struct RoomCover {
    client: Arc<DplusHttpClient>,
    unique_id: String,
    name: String,
    long_ids: Vec<String>,
    short_ids: Vec<String>,
    poll_ids: HashSet<String>,
}

impl RoomCover {
    pub(crate) fn from_members(
        ctx: &IntegrationContext,
        room_id: &str,
        room_name: &str,
        members: &[&Cover],
    ) -> Self {
        let long_ids: Vec<String> = members
            .iter()
            .filter_map(|cover| cover.long_id().map(str::to_string))
            .collect();
        let short_ids: Vec<String> = members
            .iter()
            .filter_map(|cover| cover.short_id().map(str::to_string))
            .collect();

        let poll_ids: HashSet<String> =
            long_ids.iter().chain(short_ids.iter()).cloned().collect();

        let name = format!("{room_name} Alle");
        debug!(name = %name, members = members.len(), "adding room cover");

        Self {
            client: ctx.client.clone(),
            unique_id: ctx.unique_id(room_id),
            name,
            long_ids,
            short_ids,
            poll_ids,
        }
    }

    /// Long-press control points of all members
    pub fn long_ids(&self) -> &[String] {
        &self.long_ids
    }

    /// Short-press control points of all members
    pub fn short_ids(&self) -> &[String] {
        &self.short_ids
    }

    /// Open all member covers
    pub async fn open(&self) -> Result<()> {
        for id in &self.long_ids {
            self.client.set_value(id, "0").await?;
        }
        Ok(())
    }

    /// Close all member covers
    pub async fn close(&self) -> Result<()> {
        for id in &self.long_ids {
            self.client.set_value(id, "1").await?;
        }
        Ok(())
    }

    /// Stop all member covers
    pub async fn stop(&self) -> Result<()> {
        for id in &self.short_ids {
            self.client.set_value(id, "1").await?;
        }
        Ok(())
    }

    /// Tilt all member slats toward open
    pub async fn open_tilt(&self) -> Result<()> {
        for id in &self.short_ids {
            self.client.set_value(id, "0").await?;
        }
        Ok(())
    }

    /// Tilt all member slats toward closed
    pub async fn close_tilt(&self) -> Result<()> {
        for id in &self.short_ids {
            self.client.set_value(id, "1").await?;
        }
        Ok(())
    }
}

impl DplusEntity for RoomCover {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn poll_ids(&self) -> &HashSet<String> {
        &self.poll_ids
    }

    fn apply_state(&mut self, _state: &DeviceState) -> bool {
        false
    }
}
