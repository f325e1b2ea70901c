//! In-process simulated runtime and input emulator.
//!
//! Both halves share one [`SimHandle`]. Offsets pushed through the emulator are added to the
//! poses the runtime reports, the same way the driver applies them to real hardware.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use glam::DVec3;
use tracing::debug;

use crate::{
    runtime::{Connector, InputEmulator, VrRuntime},
    types::{
        CalibrationState, ControllerRole, ControllerState, DevicePose, FloatProperty,
        FrameTiming, Matrix34, TrackedDeviceIndex, TrackingUniverse, VirtualDeviceInfo,
        VirtualDeviceType, HMD_DEVICE_INDEX, MAX_TRACKED_DEVICE_COUNT,
    },
    VrError, VrResult,
};

#[derive(Debug, Clone, Default)]
pub struct SimDevice {
    pub connected: bool,
    pub pose_valid: bool,
    /// Physical position, before any driver offset.
    pub position: DVec3,
    pub buttons: u64,
    pub translation_offsets_enabled: bool,
    pub rotation_offsets_enabled: bool,
    pub translation_offset: DVec3,
    pub offset_pushes: u64,
}

impl SimDevice {
    pub fn reported_position(&self) -> DVec3 {
        if self.translation_offsets_enabled {
            self.position + self.translation_offset
        } else {
            self.position
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimState {
    pub compositor_available: bool,
    pub frame_index: u32,
    pub seconds_since_vsync: f32,
    pub display_frequency: Option<f32>,
    pub vsync_to_photons: f32,
    pub last_prediction: Option<(TrackingUniverse, f32)>,
    pub devices: Vec<SimDevice>,
    pub left_hand: Option<TrackedDeviceIndex>,
    pub right_hand: Option<TrackedDeviceIndex>,
    pub chaperone: Option<Matrix34>,
    pub calibration: CalibrationState,
    /// Calibration flips to `Ok` after this many working copy reverts.
    pub calibrate_after_reverts: Option<u32>,
    pub chaperone_reverts: u32,
    pub virtual_devices: Vec<VirtualDeviceInfo>,
    pub virtual_probes: u32,
    pub fail_offset_pushes: bool,
}

impl Default for SimState {
    fn default() -> Self {
        let mut devices = vec![SimDevice::default(); MAX_TRACKED_DEVICE_COUNT as usize];
        devices[HMD_DEVICE_INDEX as usize] = SimDevice {
            connected: true,
            pose_valid: true,
            position: DVec3::new(0.0, 1.7, 0.0),
            ..SimDevice::default()
        };

        Self {
            compositor_available: true,
            frame_index: 0,
            seconds_since_vsync: 0.004,
            display_frequency: Some(90.0),
            vsync_to_photons: 0.011,
            last_prediction: None,
            devices,
            left_hand: None,
            right_hand: None,
            chaperone: Some(Matrix34::IDENTITY),
            calibration: CalibrationState::Ok,
            calibrate_after_reverts: None,
            chaperone_reverts: 0,
            virtual_devices: Vec::new(),
            virtual_probes: 0,
            fail_offset_pushes: false,
        }
    }
}

/// Shared, scriptable state behind the simulated runtime and emulator.
#[derive(Debug, Clone, Default)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, SimState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Plug in a controller at `index` and bind it to `role`.
    pub fn connect_controller(
        &self,
        role: ControllerRole,
        index: TrackedDeviceIndex,
        position: DVec3,
    ) {
        let mut state = self.lock();
        let device = &mut state.devices[index as usize];
        device.connected = true;
        device.pose_valid = true;
        device.position = position;
        match role {
            ControllerRole::LeftHand => state.left_hand = Some(index),
            ControllerRole::RightHand => state.right_hand = Some(index),
        }
    }

    pub fn connect_device(&self, index: TrackedDeviceIndex, position: DVec3) {
        let mut state = self.lock();
        let device = &mut state.devices[index as usize];
        device.connected = true;
        device.pose_valid = true;
        device.position = position;
    }

    pub fn disconnect(&self, index: TrackedDeviceIndex) {
        self.lock().devices[index as usize].connected = false;
    }

    pub fn set_pose_valid(&self, index: TrackedDeviceIndex, valid: bool) {
        self.lock().devices[index as usize].pose_valid = valid;
    }

    pub fn set_position(&self, index: TrackedDeviceIndex, position: DVec3) {
        self.lock().devices[index as usize].position = position;
    }

    pub fn move_by(&self, index: TrackedDeviceIndex, delta: DVec3) {
        self.lock().devices[index as usize].position += delta;
    }

    pub fn press(&self, index: TrackedDeviceIndex, mask: u64) {
        self.lock().devices[index as usize].buttons |= mask;
    }

    pub fn release(&self, index: TrackedDeviceIndex) {
        self.lock().devices[index as usize].buttons = 0;
    }

    pub fn advance_frame(&self) -> u32 {
        let mut state = self.lock();
        state.frame_index = state.frame_index.wrapping_add(1);
        state.frame_index
    }

    pub fn set_chaperone(&self, matrix: Matrix34) {
        self.lock().chaperone = Some(matrix);
    }

    pub fn set_calibration(&self, calibration: CalibrationState) {
        self.lock().calibration = calibration;
    }

    /// Register `index` as a virtual device and return its virtual id.
    pub fn add_virtual_device(&self, index: TrackedDeviceIndex, position: DVec3) -> u32 {
        self.connect_device(index, position);
        let mut state = self.lock();
        let virtual_device_id = state.virtual_devices.len() as u32;
        state.virtual_devices.push(VirtualDeviceInfo {
            virtual_device_id,
            openvr_device_id: index,
            device_type: VirtualDeviceType::GenericTracker,
        });
        virtual_device_id
    }

    pub fn translation_offset(&self, index: TrackedDeviceIndex) -> DVec3 {
        self.lock().devices[index as usize].translation_offset
    }

    pub fn offset_pushes(&self, index: TrackedDeviceIndex) -> u64 {
        self.lock().devices[index as usize].offset_pushes
    }

    pub fn reported_position(&self, index: TrackedDeviceIndex) -> DVec3 {
        self.lock().devices[index as usize].reported_position()
    }
}

pub struct SimulatedRuntime {
    handle: SimHandle,
}

impl SimulatedRuntime {
    pub fn handle(&self) -> &SimHandle {
        &self.handle
    }
}

impl From<SimHandle> for SimulatedRuntime {
    fn from(handle: SimHandle) -> Self {
        Self { handle }
    }
}

impl VrRuntime for SimulatedRuntime {
    fn time_since_last_vsync(&self) -> Option<f32> {
        Some(self.handle.lock().seconds_since_vsync)
    }

    fn float_property(&self, index: TrackedDeviceIndex, prop: FloatProperty) -> VrResult<f32> {
        let state = self.handle.lock();
        if index != HMD_DEVICE_INDEX {
            return Err(VrError::Property(prop, index));
        }
        match prop {
            FloatProperty::DisplayFrequency => state
                .display_frequency
                .ok_or(VrError::Property(prop, index)),
            FloatProperty::SecondsFromVsyncToPhotons => Ok(state.vsync_to_photons),
        }
    }

    fn device_to_absolute_tracking_poses(
        &self,
        universe: TrackingUniverse,
        predicted_seconds_from_now: f32,
    ) -> Vec<DevicePose> {
        let mut state = self.handle.lock();
        state.last_prediction = Some((universe, predicted_seconds_from_now));
        state
            .devices
            .iter()
            .map(|device| DevicePose {
                device_to_absolute_tracking: Matrix34::from_translation(
                    device.reported_position(),
                ),
                pose_is_valid: device.pose_valid,
                device_is_connected: device.connected,
            })
            .collect()
    }

    fn tracked_device_index_for_role(&self, role: ControllerRole) -> Option<TrackedDeviceIndex> {
        let state = self.handle.lock();
        match role {
            ControllerRole::LeftHand => state.left_hand,
            ControllerRole::RightHand => state.right_hand,
        }
    }

    fn controller_state(&self, index: TrackedDeviceIndex) -> Option<ControllerState> {
        let state = self.handle.lock();
        let device = state.devices.get(index as usize)?;
        device.connected.then(|| ControllerState {
            packet_num: state.frame_index,
            button_pressed: device.buttons,
            button_touched: device.buttons,
        })
    }

    fn is_tracked_device_connected(&self, index: TrackedDeviceIndex) -> bool {
        self.handle
            .lock()
            .devices
            .get(index as usize)
            .is_some_and(|device| device.connected)
    }

    fn frame_timing(&self) -> Option<FrameTiming> {
        let state = self.handle.lock();
        state.compositor_available.then(|| FrameTiming {
            frame_index: state.frame_index,
            num_frame_presents: 1,
            system_time_seconds: state.frame_index as f64
                / state.display_frequency.unwrap_or(90.0) as f64,
        })
    }

    fn revert_chaperone_working_copy(&mut self) {
        let mut state = self.handle.lock();
        state.chaperone_reverts += 1;
        if let Some(remaining) = state.calibrate_after_reverts {
            if remaining <= 1 {
                state.calibrate_after_reverts = None;
                state.calibration = CalibrationState::Ok;
            } else {
                state.calibrate_after_reverts = Some(remaining - 1);
            }
        }
    }

    fn working_standing_zero_to_raw_tracking(&self) -> Option<Matrix34> {
        self.handle.lock().chaperone
    }

    fn calibration_state(&self) -> CalibrationState {
        self.handle.lock().calibration
    }
}

pub struct SimulatedEmulator {
    handle: SimHandle,
}

impl From<SimHandle> for SimulatedEmulator {
    fn from(handle: SimHandle) -> Self {
        Self { handle }
    }
}

impl InputEmulator for SimulatedEmulator {
    fn virtual_device_count(&self) -> VrResult<u32> {
        Ok(self.handle.lock().virtual_devices.len() as u32)
    }

    fn virtual_device_info(&self, virtual_device_id: u32) -> VrResult<VirtualDeviceInfo> {
        let mut state = self.handle.lock();
        state.virtual_probes += 1;
        state
            .virtual_devices
            .get(virtual_device_id as usize)
            .copied()
            .ok_or(VrError::NotVirtual(virtual_device_id))
    }

    fn enable_device_offsets(
        &mut self,
        index: TrackedDeviceIndex,
        enable_translation: bool,
        enable_rotation: bool,
    ) -> VrResult<()> {
        let mut state = self.handle.lock();
        let device = state
            .devices
            .get_mut(index as usize)
            .ok_or_else(|| VrError::Emulator(format!("invalid device index {index}")))?;
        device.translation_offsets_enabled = enable_translation;
        device.rotation_offsets_enabled = enable_rotation;
        Ok(())
    }

    fn set_world_from_driver_translation_offset(
        &mut self,
        index: TrackedDeviceIndex,
        offset: DVec3,
        _apply_immediately: bool,
    ) -> VrResult<()> {
        let mut state = self.handle.lock();
        if state.fail_offset_pushes {
            return Err(VrError::Emulator("offset push rejected".to_string()));
        }
        let device = state
            .devices
            .get_mut(index as usize)
            .ok_or_else(|| VrError::Emulator(format!("invalid device index {index}")))?;
        device.translation_offset = offset;
        device.offset_pushes += 1;
        Ok(())
    }
}

/// Hands out simulated connections, failing a fixed number of attempts first.
pub struct SimConnector<C> {
    handle: SimHandle,
    label: &'static str,
    failures_left: u32,
    attempts: u32,
    _connection: PhantomData<fn() -> C>,
}

impl<C> SimConnector<C> {
    pub fn new(handle: SimHandle, label: &'static str) -> Self {
        Self {
            handle,
            label,
            failures_left: 0,
            attempts: 0,
            _connection: PhantomData,
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures_left = failures;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl<C: From<SimHandle>> Connector for SimConnector<C> {
    type Connection = C;

    fn name(&self) -> &str {
        self.label
    }

    fn connect(&mut self) -> VrResult<C> {
        self.attempts += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            debug!("{}: simulated connection failure", self.label);
            return Err(VrError::Unavailable(format!("{} not running", self.label)));
        }
        Ok(C::from(self.handle.clone()))
    }
}
