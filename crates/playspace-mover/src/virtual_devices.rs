use std::collections::HashSet;

use playspace_vr::{InputEmulator, TrackedDeviceIndex, MAX_TRACKED_DEVICE_COUNT};
use tracing::{debug, info, trace};

/// Caches which device slots belong to emulator-created virtual devices.
///
/// Probing every slot is expensive, so the set is only rebuilt when the emulator reports a
/// different virtual device count. Entries for virtual devices that have since disconnected
/// are harmless since lookups are pure membership tests.
#[derive(Debug, Clone, Default)]
pub struct VirtualDeviceClassifier {
    known_count: Option<u32>,
    indices: HashSet<TrackedDeviceIndex>,
}

impl VirtualDeviceClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the set was rebuilt.
    pub fn refresh<E: InputEmulator>(&mut self, emulator: &E) -> bool {
        let count = match emulator.virtual_device_count() {
            Ok(count) => count,
            Err(e) => {
                debug!("virtual device count unavailable: {e}");
                return false;
            }
        };
        if self.known_count == Some(count) {
            return false;
        }

        self.indices.clear();
        for virtual_device_id in 0..MAX_TRACKED_DEVICE_COUNT {
            match emulator.virtual_device_info(virtual_device_id) {
                Ok(info) => {
                    self.indices.insert(info.openvr_device_id);
                }
                Err(e) => trace!("probe {virtual_device_id}: {e}"),
            }
        }
        self.known_count = Some(count);

        info!(
            count,
            found = self.indices.len(),
            "virtual device set rebuilt"
        );
        true
    }

    pub fn is_virtual(&self, index: TrackedDeviceIndex) -> bool {
        if self.indices.is_empty() {
            return false;
        }
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use playspace_vr::sim::{SimHandle, SimulatedEmulator};

    #[test]
    fn test_empty_set_classifies_nothing() {
        let emulator = SimulatedEmulator::from(SimHandle::new());
        let mut classifier = VirtualDeviceClassifier::new();

        assert!(classifier.refresh(&emulator));
        assert!(classifier.is_empty());
        assert!(!classifier.is_virtual(0));
    }

    #[test]
    fn test_rebuild_collects_backing_indices() {
        let handle = SimHandle::new();
        handle.add_virtual_device(5, DVec3::ZERO);
        handle.add_virtual_device(11, DVec3::ZERO);
        let emulator = SimulatedEmulator::from(handle);

        let mut classifier = VirtualDeviceClassifier::new();
        assert!(classifier.refresh(&emulator));
        assert!(classifier.is_virtual(5));
        assert!(classifier.is_virtual(11));
        assert!(!classifier.is_virtual(0));
        assert_eq!(classifier.len(), 2);
    }

    #[test]
    fn test_unchanged_count_skips_probing() {
        let handle = SimHandle::new();
        handle.add_virtual_device(5, DVec3::ZERO);
        let emulator = SimulatedEmulator::from(handle.clone());

        let mut classifier = VirtualDeviceClassifier::new();
        classifier.refresh(&emulator);
        let probes = handle.lock().virtual_probes;
        assert_eq!(probes, MAX_TRACKED_DEVICE_COUNT);

        assert!(!classifier.refresh(&emulator));
        assert_eq!(handle.lock().virtual_probes, probes);

        handle.add_virtual_device(6, DVec3::ZERO);
        assert!(classifier.refresh(&emulator));
        assert!(classifier.is_virtual(6));
        assert_eq!(handle.lock().virtual_probes, probes * 2);
    }
}
