//! Typed entity projections of discovered D+ devices
//!
//! Discovery yields raw [`Device`] snapshots; this module classifies
//! them into live entity variants and owns the trait the polling engine
//! dispatches through.

pub mod climate;
pub mod cover;
pub mod light;
pub mod sensor;
pub mod switch;

use crate::client::{http_client::DplusHttpClient, Device, DeviceState};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub use climate::Climate;
pub use cover::{Cover, RoomCover};
pub use light::{DimmerLight, SwitchLight};
pub use sensor::TemperatureSensor;
pub use switch::Switch;

/// Rendering id of a dimmer's on/off channel
pub const RENDERING_SWITCH_CHANNEL: &str = "10";
/// Rendering id of a dimmer's brightness level (percent)
pub const RENDERING_DIM_LEVEL: &str = "11";
/// Rendering id of a shutter's long-press control point
pub const RENDERING_SHUTTER_LONG: &str = "25";
/// Rendering id of a shutter's short-press control point
pub const RENDERING_SHUTTER_SHORT: &str = "27";
/// Rendering id of a current-temperature probe
pub const RENDERING_CURRENT_TEMPERATURE: &str = "34";
/// Rendering id of a target-temperature set point
pub const RENDERING_TARGET_TEMPERATURE: &str = "35";

/// Per-instance wiring handed to every entity constructor.
///
/// Carries the shared client handle and the namespace for entity unique
/// ids, so several D+ servers can be driven from one process without any
/// process-wide state.
#[derive(Clone)]
pub struct IntegrationContext {
    /// Namespace prefixed to every entity unique id
    pub instance_id: String,

    /// Shared client for the owning D+ server
    pub client: Arc<DplusHttpClient>,
}

impl IntegrationContext {
    /// Create a context with a random instance id
    pub fn new(client: Arc<DplusHttpClient>) -> Self {
        Self::with_instance_id(client, Uuid::new_v4().to_string())
    }

    /// Create a context with an explicit instance id (e.g., the host's
    /// config-entry id)
    pub fn with_instance_id(client: Arc<DplusHttpClient>, instance_id: String) -> Self {
        Self {
            instance_id,
            client,
        }
    }

    pub(crate) fn unique_id(&self, controller_id: &str) -> String {
        format!("{}_{}", self.instance_id, controller_id)
    }
}

/// Interface shared by all live entities
///
/// `poll_ids` is the set of controller ids the entity listens to (always
/// non-empty, always raw controller ids); `apply_state` routes one polled
/// value into the entity's derived state and reports whether anything
/// actually changed, which is what suppresses redundant notifications.
pub trait DplusEntity {
    /// Stable unique id, namespaced by the integration instance
    fn unique_id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// Controller ids this entity listens to
    fn poll_ids(&self) -> &HashSet<String>;

    /// Apply a polled state; returns whether derived state changed
    fn apply_state(&mut self, state: &DeviceState) -> bool;
}

/// Closed mapping of a device's (`TYPE`, category) pair to the entity
/// variant it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// `EIBOBJECT` + `lighting`: an on/off light
    SwitchLight,
    /// `CONTAINER` + `lighting`: a dimmable light
    DimmerLight,
    /// `EIBOBJECT` with any other (or no) category: a plain switch
    Switch,
    /// `CONTAINER` + `shutters`: a shutter cover
    Cover,
    /// `CONTAINER` + `climate`: a thermostat plus its temperature sensor
    Climate,
    /// Anything else produces no entity
    Unsupported,
}

/// Classify a discovered device by its `TYPE` attribute and the
/// `category=` token of its `OPTIONALP` metadata.
pub fn classify(device: &Device) -> DeviceClass {
    let category = device.attributes.category();

    match (device.attributes.node_type.as_str(), category.as_deref()) {
        ("EIBOBJECT", Some("lighting")) => DeviceClass::SwitchLight,
        ("CONTAINER", Some("lighting")) => DeviceClass::DimmerLight,
        ("EIBOBJECT", _) => DeviceClass::Switch,
        ("CONTAINER", Some("shutters")) => DeviceClass::Cover,
        ("CONTAINER", Some("climate")) => DeviceClass::Climate,
        _ => DeviceClass::Unsupported,
    }
}

/// A live entity of any variant
pub enum Entity {
    SwitchLight(SwitchLight),
    DimmerLight(DimmerLight),
    Switch(Switch),
    Cover(Cover),
    RoomCover(RoomCover),
    Climate(Climate),
    TemperatureSensor(TemperatureSensor),
}

impl Entity {
    /// Variant name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::SwitchLight(_) => "switch_light",
            Entity::DimmerLight(_) => "dimmer_light",
            Entity::Switch(_) => "switch",
            Entity::Cover(_) => "cover",
            Entity::RoomCover(_) => "room_cover",
            Entity::Climate(_) => "climate",
            Entity::TemperatureSensor(_) => "temperature_sensor",
        }
    }
}

impl DplusEntity for Entity {
    fn unique_id(&self) -> &str {
        match self {
            Entity::SwitchLight(e) => e.unique_id(),
            Entity::DimmerLight(e) => e.unique_id(),
            Entity::Switch(e) => e.unique_id(),
            Entity::Cover(e) => e.unique_id(),
            Entity::RoomCover(e) => e.unique_id(),
            Entity::Climate(e) => e.unique_id(),
            Entity::TemperatureSensor(e) => e.unique_id(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Entity::SwitchLight(e) => e.name(),
            Entity::DimmerLight(e) => e.name(),
            Entity::Switch(e) => e.name(),
            Entity::Cover(e) => e.name(),
            Entity::RoomCover(e) => e.name(),
            Entity::Climate(e) => e.name(),
            Entity::TemperatureSensor(e) => e.name(),
        }
    }

    fn poll_ids(&self) -> &HashSet<String> {
        match self {
            Entity::SwitchLight(e) => e.poll_ids(),
            Entity::DimmerLight(e) => e.poll_ids(),
            Entity::Switch(e) => e.poll_ids(),
            Entity::Cover(e) => e.poll_ids(),
            Entity::RoomCover(e) => e.poll_ids(),
            Entity::Climate(e) => e.poll_ids(),
            Entity::TemperatureSensor(e) => e.poll_ids(),
        }
    }

    fn apply_state(&mut self, state: &DeviceState) -> bool {
        match self {
            Entity::SwitchLight(e) => e.apply_state(state),
            Entity::DimmerLight(e) => e.apply_state(state),
            Entity::Switch(e) => e.apply_state(state),
            Entity::Cover(e) => e.apply_state(state),
            Entity::RoomCover(e) => e.apply_state(state),
            Entity::Climate(e) => e.apply_state(state),
            Entity::TemperatureSensor(e) => e.apply_state(state),
        }
    }
}

/// Build the live entities for one discovery pass, room by room.
///
/// Devices arrive grouped by room (discovery emits them in controller
/// order); a room that produced more than one cover additionally gets a
/// synthesized whole-room cover fanning commands out to all members.
pub fn build_entities(ctx: &IntegrationContext, devices: &[Device]) -> Vec<Entity> {
    let mut entities = Vec::new();

    for room in group_by_room(devices) {
        let mut room_entities = Vec::new();

        for device in room {
            match classify(device) {
                DeviceClass::SwitchLight => {
                    room_entities.push(Entity::SwitchLight(SwitchLight::new(ctx, device)));
                }
                DeviceClass::DimmerLight => match DimmerLight::new(ctx, device) {
                    Some(light) => room_entities.push(Entity::DimmerLight(light)),
                    None => warn!(
                        device = device.name(),
                        "dimmable light has no control points, skipping"
                    ),
                },
                DeviceClass::Switch => {
                    room_entities.push(Entity::Switch(Switch::new(ctx, device)));
                }
                DeviceClass::Cover => match Cover::new(ctx, device) {
                    Some(cover) => room_entities.push(Entity::Cover(cover)),
                    None => warn!(
                        device = device.name(),
                        "cover has no control points, skipping"
                    ),
                },
                DeviceClass::Climate => {
                    match Climate::new(ctx, device) {
                        Some(climate) => room_entities.push(Entity::Climate(climate)),
                        None => warn!(
                            device = device.name(),
                            "climate device has no control points, skipping"
                        ),
                    }
                    match TemperatureSensor::new(ctx, device) {
                        Some(sensor) => room_entities.push(Entity::TemperatureSensor(sensor)),
                        None => debug!(
                            device = device.name(),
                            "climate device has no temperature probe"
                        ),
                    }
                }
                DeviceClass::Unsupported => {
                    debug!(
                        device = device.name(),
                        node_type = %device.attributes.node_type,
                        "device produces no entity"
                    );
                }
            }
        }

        let aggregate = {
            let covers: Vec<&Cover> = room_entities
                .iter()
                .filter_map(|entity| match entity {
                    Entity::Cover(cover) => Some(cover),
                    _ => None,
                })
                .collect();

            if covers.len() > 1 {
                let room_device = &room[0];
                Some(RoomCover::from_members(
                    ctx,
                    &room_device.parent_id,
                    &room_device.parent_name,
                    &covers,
                ))
            } else {
                None
            }
        };

        if let Some(aggregate) = aggregate {
            room_entities.push(Entity::RoomCover(aggregate));
        }

        entities.extend(room_entities);
    }

    entities
}

/// Split the discovery output into consecutive runs sharing a room,
/// preserving order.
fn group_by_room(devices: &[Device]) -> Vec<&[Device]> {
    let mut groups = Vec::new();
    let mut start = 0;

    for end in 1..=devices.len() {
        if end == devices.len() || devices[end].parent_id != devices[start].parent_id {
            groups.push(&devices[start..end]);
            start = end;
        }
    }

    groups
}
