// ── Device prioritization ──
//
// Daily reports cost one row per device per day on the server. Large fleets
// are capped to the devices an operator is most likely watching: online
// first, then the fastest movers.

use std::cmp::Ordering;

use fleetdash_api::{Device, DeviceId};
use tracing::debug;

use crate::roster::DeviceRoster;

/// Pick at most `max_devices` ids from the roster.
///
/// Rosters within the cap are returned whole, in roster order. Larger ones
/// are stably sorted online-first, then by current speed descending, and
/// truncated.
pub fn prioritize(roster: &DeviceRoster, max_devices: usize) -> Vec<DeviceId> {
    if roster.len() <= max_devices {
        return roster.device_ids();
    }

    debug!(
        max_devices,
        total = roster.len(),
        "limiting daily summary to most active devices"
    );

    let mut ranked: Vec<&Device> = roster.devices().iter().collect();
    ranked.sort_by(|a, b| compare_priority(roster, a, b));
    ranked.into_iter().take(max_devices).map(|d| d.id).collect()
}

/// `Less` means `a` is more relevant than `b`.
fn compare_priority(roster: &DeviceRoster, a: &Device, b: &Device) -> Ordering {
    b.is_online()
        .cmp(&a.is_online())
        .then_with(|| roster.speed_of(b.id).total_cmp(&roster.speed_of(a.id)))
}
