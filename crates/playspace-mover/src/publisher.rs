use glam::DVec3;
use playspace_vr::{
    InputEmulator, TrackedDeviceIndex, VrResult, VrRuntime, MAX_TRACKED_DEVICE_COUNT,
};
use tracing::warn;

use crate::offset::FrameOffsets;
use crate::virtual_devices::VirtualDeviceClassifier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub physical: usize,
    pub virtual_devices: usize,
    pub failed: usize,
}

impl PublishReport {
    pub fn published(&self) -> usize {
        self.physical + self.virtual_devices
    }
}

/// Pushes the frame's offsets to every connected device.
///
/// Every connected device gets a push every frame. Offset mode is re-enabled each time, which
/// the driver treats as a no-op when it is already on.
#[derive(Debug, Clone, Default)]
pub struct DeviceOffsetPublisher;

impl DeviceOffsetPublisher {
    pub fn new() -> Self {
        Self
    }

    pub fn publish<R: VrRuntime, E: InputEmulator>(
        &self,
        runtime: &R,
        emulator: &mut E,
        classifier: &VirtualDeviceClassifier,
        offsets: FrameOffsets,
    ) -> PublishReport {
        let mut report = PublishReport::default();

        for index in 0..MAX_TRACKED_DEVICE_COUNT {
            if !runtime.is_tracked_device_connected(index) {
                continue;
            }
            let is_virtual = classifier.is_virtual(index);
            let offset = if is_virtual {
                offsets.virtual_device
            } else {
                offsets.world
            };

            match push_offset(emulator, index, offset) {
                Ok(()) if is_virtual => report.virtual_devices += 1,
                Ok(()) => report.physical += 1,
                Err(e) => {
                    warn!(device = index, "failed to publish offset: {e}");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn push_offset<E: InputEmulator>(
    emulator: &mut E,
    index: TrackedDeviceIndex,
    offset: DVec3,
) -> VrResult<()> {
    emulator.enable_device_offsets(index, true, false)?;
    emulator.set_world_from_driver_translation_offset(index, offset, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use playspace_vr::sim::{SimHandle, SimulatedEmulator, SimulatedRuntime};

    fn offsets() -> FrameOffsets {
        FrameOffsets {
            world: DVec3::new(-0.4, 0.0, 0.2),
            virtual_device: DVec3::new(-0.2, 0.0, 0.1),
        }
    }

    #[test]
    fn test_virtual_devices_get_half_offset() {
        let handle = SimHandle::new();
        handle.connect_device(1, DVec3::ZERO);
        handle.add_virtual_device(7, DVec3::ZERO);
        let runtime = SimulatedRuntime::from(handle.clone());
        let mut emulator = SimulatedEmulator::from(handle.clone());

        let mut classifier = VirtualDeviceClassifier::new();
        classifier.refresh(&emulator);

        let report = DeviceOffsetPublisher::new().publish(
            &runtime,
            &mut emulator,
            &classifier,
            offsets(),
        );

        assert_eq!(report.physical, 2); // HMD and device 1
        assert_eq!(report.virtual_devices, 1);
        assert_eq!(handle.translation_offset(0), offsets().world);
        assert_eq!(handle.translation_offset(1), offsets().world);
        assert_eq!(handle.translation_offset(7), offsets().virtual_device);

        let state = handle.lock();
        assert!(state.devices[7].translation_offsets_enabled);
        assert!(!state.devices[7].rotation_offsets_enabled);
    }

    #[test]
    fn test_disconnected_devices_are_skipped() {
        let handle = SimHandle::new();
        handle.connect_device(4, DVec3::ZERO);
        handle.disconnect(4);
        let runtime = SimulatedRuntime::from(handle.clone());
        let mut emulator = SimulatedEmulator::from(handle.clone());

        let report = DeviceOffsetPublisher::new().publish(
            &runtime,
            &mut emulator,
            &VirtualDeviceClassifier::new(),
            offsets(),
        );

        assert_eq!(report.published(), 1);
        assert_eq!(handle.offset_pushes(4), 0);
    }

    #[test]
    fn test_push_failures_are_counted_not_fatal() {
        let handle = SimHandle::new();
        handle.connect_device(2, DVec3::ZERO);
        handle.lock().fail_offset_pushes = true;
        let runtime = SimulatedRuntime::from(handle.clone());
        let mut emulator = SimulatedEmulator::from(handle);

        let report = DeviceOffsetPublisher::new().publish(
            &runtime,
            &mut emulator,
            &VirtualDeviceClassifier::new(),
            offsets(),
        );

        assert_eq!(report.failed, 2);
        assert_eq!(report.published(), 0);
    }
}
