//! Immutable lookup table of known devices.

use indexmap::IndexMap;

use super::builtin;
use super::profile::DeviceProfile;
use crate::error::RegistryError;

/// Registry of the devices a caller may address.
///
/// Built once and read-only afterwards; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: IndexMap<String, DeviceProfile>,
}

impl HostRegistry {
    /// Build a registry, rejecting empty or repeated identifiers.
    pub fn new(profiles: impl IntoIterator<Item = DeviceProfile>) -> Result<Self, RegistryError> {
        let mut hosts = IndexMap::new();
        for profile in profiles {
            if profile.display_id.is_empty() {
                return Err(RegistryError::EmptyHostId {
                    alias: profile.connection_alias,
                });
            }
            if hosts.contains_key(&profile.display_id) {
                return Err(RegistryError::DuplicateHost {
                    host: profile.display_id,
                });
            }
            hosts.insert(profile.display_id.clone(), profile);
        }
        Ok(Self { hosts })
    }

    /// The devices shipped with the crate.
    pub fn builtin() -> Self {
        let hosts = builtin::profiles()
            .into_iter()
            .map(|p| (p.display_id.clone(), p))
            .collect();
        Self { hosts }
    }

    /// Look up a device by its caller-facing identifier.
    pub fn resolve(&self, display_id: &str) -> Result<&DeviceProfile, RegistryError> {
        self.hosts
            .get(display_id)
            .ok_or_else(|| RegistryError::UnknownHost {
                host: display_id.to_string(),
                known: self.ids(),
            })
    }

    /// All identifiers, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.hosts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Check if a device is registered.
    pub fn contains(&self, display_id: &str) -> bool {
        self.hosts.contains_key(display_id)
    }

    /// Profiles in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.hosts.values()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}
