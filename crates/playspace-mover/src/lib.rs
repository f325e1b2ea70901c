//! Play-space mover: turns controller grabs into a per-device translation offset.
//!
//! Each compositor frame runs one pass of the pipeline:
//! 1. Refresh the chaperone (standing zero to raw tracking) matrix
//! 2. Refresh the set of virtual devices
//! 3. Sample predicted poses and compute per-hand grab deltas
//! 4. Clamp, rotate and integrate the combined delta into the world offset
//! 5. Publish the offset to every connected device

#![forbid(unsafe_code)]

pub mod chaperone;
pub mod context;
pub mod frame_loop;
pub mod grab;
pub mod offset;
pub mod pose;
pub mod publisher;
pub mod startup;
pub mod virtual_devices;

pub use chaperone::ChaperoneSpaceTracker;
pub use context::{FrameReport, MoverContext};
pub use frame_loop::{FrameLoop, FrameStats, LoopState, PollOutcome};
pub use grab::{GrabDetector, GrabMasks, HandDeltas};
pub use offset::{clamp_delta, FrameOffsets, OffsetAccumulator, MAX_FRAME_DELTA};
pub use pose::{PoseFrame, PoseSampler, PredictionTiming};
pub use publisher::{DeviceOffsetPublisher, PublishReport};
pub use startup::{connect_with_retry, start, wait_for_calibration};
pub use virtual_devices::VirtualDeviceClassifier;
