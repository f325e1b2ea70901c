use glam::DVec3;

use crate::{
    types::{
        CalibrationState, ControllerRole, ControllerState, DevicePose, FloatProperty,
        FrameTiming, Matrix34, TrackedDeviceIndex, TrackingUniverse, VirtualDeviceInfo,
    },
    VrResult,
};

/// An established connection to the VR runtime (system, compositor and chaperone setup).
pub trait VrRuntime {
    // System
    fn time_since_last_vsync(&self) -> Option<f32>;
    fn float_property(&self, index: TrackedDeviceIndex, prop: FloatProperty) -> VrResult<f32>;
    /// Predicted poses for every device slot, `MAX_TRACKED_DEVICE_COUNT` entries long.
    fn device_to_absolute_tracking_poses(
        &self,
        universe: TrackingUniverse,
        predicted_seconds_from_now: f32,
    ) -> Vec<DevicePose>;
    fn tracked_device_index_for_role(&self, role: ControllerRole) -> Option<TrackedDeviceIndex>;
    fn controller_state(&self, index: TrackedDeviceIndex) -> Option<ControllerState>;
    fn is_tracked_device_connected(&self, index: TrackedDeviceIndex) -> bool;

    // Compositor. `None` while the compositor is unavailable or has no timing yet.
    fn frame_timing(&self) -> Option<FrameTiming>;

    // Chaperone
    fn revert_chaperone_working_copy(&mut self);
    fn working_standing_zero_to_raw_tracking(&self) -> Option<Matrix34>;
    fn calibration_state(&self) -> CalibrationState;
}

/// Connection to the input emulator driver that owns virtual devices and device offsets.
pub trait InputEmulator {
    fn virtual_device_count(&self) -> VrResult<u32>;
    /// Fails with `VrError::NotVirtual` when no virtual device has this id.
    fn virtual_device_info(&self, virtual_device_id: u32) -> VrResult<VirtualDeviceInfo>;
    fn enable_device_offsets(
        &mut self,
        index: TrackedDeviceIndex,
        enable_translation: bool,
        enable_rotation: bool,
    ) -> VrResult<()>;
    fn set_world_from_driver_translation_offset(
        &mut self,
        index: TrackedDeviceIndex,
        offset: DVec3,
        apply_immediately: bool,
    ) -> VrResult<()>;
}

/// Something that can attempt to open a connection.
pub trait Connector {
    type Connection;

    fn name(&self) -> &str;
    fn connect(&mut self) -> VrResult<Self::Connection>;
}
