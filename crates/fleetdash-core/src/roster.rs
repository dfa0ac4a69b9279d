// ── Device roster snapshot ──
//
// Read-only view of the fleet supplied by the host application: the device
// list plus the latest position per device. The telemetry cache reads it to
// build report queries and to rank devices for sampling.

use std::collections::HashMap;

use fleetdash_api::{Device, DeviceId, Position};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRoster {
    devices: Vec<Device>,
    positions: HashMap<DeviceId, Position>,
}

impl DeviceRoster {
    pub fn new(devices: Vec<Device>, positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            devices,
            positions: positions.into_iter().map(|p| (p.device_id, p)).collect(),
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, device_id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    pub fn position(&self, device_id: DeviceId) -> Option<&Position> {
        self.positions.get(&device_id)
    }

    /// Current speed of a device, 0 when no position is known.
    pub fn speed_of(&self, device_id: DeviceId) -> f64 {
        self.position(device_id).map_or(0.0, |p| p.speed)
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.id).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
