//! Devices known out of the box.

use super::profile::DeviceProfile;

/// The Catalyst 3560 PoE access switch.
fn catalyst_3560_poe() -> DeviceProfile {
    DeviceProfile::new("Cisco-3560-PoE-switch", "cisco-3560-poe")
        .with_platform("ios")
        .with_role("access-switch")
        .with_prompt(r"(?m)^Cat_3560-PoE[>#]\s*$")
        .expect("built-in prompt pattern is valid")
}

pub(super) fn profiles() -> Vec<DeviceProfile> {
    vec![catalyst_3560_poe()]
}
