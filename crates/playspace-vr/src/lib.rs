#![forbid(unsafe_code)]

pub mod runtime;
pub mod sim;
pub mod types;

pub use runtime::{Connector, InputEmulator, VrRuntime};
pub use types::{
    ButtonId, CalibrationState, ControllerRole, ControllerState, DevicePose, FloatProperty,
    FrameTiming, Matrix34, TrackedDeviceIndex, TrackingUniverse, VirtualDeviceInfo,
    HMD_DEVICE_INDEX, MAX_TRACKED_DEVICE_COUNT,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VrError {
    #[error("runtime unavailable: {0}")]
    Unavailable(String),
    #[error("runtime call failed: {0}")]
    Runtime(String),
    #[error("property {0:?} unavailable on device {1}")]
    Property(FloatProperty, TrackedDeviceIndex),
    #[error("no virtual device with id {0}")]
    NotVirtual(u32),
    #[error("input emulator error: {0}")]
    Emulator(String),
}

pub type VrResult<T> = Result<T, VrError>;
