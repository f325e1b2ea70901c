//! Predicted pose sampling.

use playspace_vr::{
    DevicePose, FloatProperty, TrackedDeviceIndex, TrackingUniverse, VrRuntime,
    HMD_DEVICE_INDEX,
};
use tracing::{debug, trace};

/// Vsync and latency figures used to predict poses at photon time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionTiming {
    pub seconds_since_last_vsync: f32,
    pub frame_duration: f32,
    pub vsync_to_photons: f32,
}

impl PredictionTiming {
    pub fn query<R: VrRuntime>(runtime: &R) -> Self {
        let seconds_since_last_vsync = runtime.time_since_last_vsync().unwrap_or(0.0);

        let frame_duration = match runtime
            .float_property(HMD_DEVICE_INDEX, FloatProperty::DisplayFrequency)
        {
            Ok(hz) if hz > 0.0 => 1.0 / hz,
            Ok(hz) => {
                debug!("HMD reported display frequency {hz}, ignoring frame duration");
                0.0
            }
            Err(e) => {
                debug!("display frequency unavailable: {e}");
                0.0
            }
        };

        let vsync_to_photons = runtime
            .float_property(HMD_DEVICE_INDEX, FloatProperty::SecondsFromVsyncToPhotons)
            .unwrap_or(0.0);

        Self {
            seconds_since_last_vsync,
            frame_duration,
            vsync_to_photons,
        }
    }

    pub fn predicted_seconds_from_now(&self) -> f32 {
        self.frame_duration - self.seconds_since_last_vsync + self.vsync_to_photons
    }
}

/// Poses for every device slot, valid for one frame.
#[derive(Debug, Clone)]
pub struct PoseFrame {
    poses: Vec<DevicePose>,
    predicted_seconds_from_now: f32,
}

impl PoseFrame {
    pub fn new(poses: Vec<DevicePose>, predicted_seconds_from_now: f32) -> Self {
        Self {
            poses,
            predicted_seconds_from_now,
        }
    }

    pub fn get(&self, index: TrackedDeviceIndex) -> Option<&DevicePose> {
        self.poses.get(index as usize)
    }

    /// The pose at `index`, if it is valid and its device is connected.
    pub fn usable(&self, index: TrackedDeviceIndex) -> Option<&DevicePose> {
        self.get(index).filter(|pose| pose.is_usable())
    }

    pub fn predicted_seconds_from_now(&self) -> f32 {
        self.predicted_seconds_from_now
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PoseSampler {
    universe: TrackingUniverse,
}

impl Default for PoseSampler {
    fn default() -> Self {
        Self {
            universe: TrackingUniverse::Standing,
        }
    }
}

impl PoseSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample<R: VrRuntime>(&self, runtime: &R) -> PoseFrame {
        let predicted = PredictionTiming::query(runtime).predicted_seconds_from_now();
        let poses = runtime.device_to_absolute_tracking_poses(self.universe, predicted);
        trace!(predicted, devices = poses.len(), "sampled poses");
        PoseFrame::new(poses, predicted)
    }
}
