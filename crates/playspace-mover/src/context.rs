use glam::DVec3;
use playspace_vr::{InputEmulator, Matrix34, VrRuntime};

use crate::chaperone::ChaperoneSpaceTracker;
use crate::grab::{GrabDetector, GrabMasks, HandDeltas};
use crate::offset::{FrameOffsets, OffsetAccumulator};
use crate::pose::PoseSampler;
use crate::publisher::{DeviceOffsetPublisher, PublishReport};
use crate::virtual_devices::VirtualDeviceClassifier;

/// What one pass of the pipeline did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub deltas: HandDeltas,
    /// Combined delta after clamping, in tracking space.
    pub applied_delta: DVec3,
    pub offsets: FrameOffsets,
    pub published: PublishReport,
    pub virtual_set_rebuilt: bool,
}

/// All state the pipeline carries from one frame to the next.
#[derive(Debug, Clone)]
pub struct MoverContext {
    sampler: PoseSampler,
    chaperone: ChaperoneSpaceTracker,
    virtual_devices: VirtualDeviceClassifier,
    grab: GrabDetector,
    accumulator: OffsetAccumulator,
    publisher: DeviceOffsetPublisher,
}

impl MoverContext {
    pub fn new(initial_chaperone: Matrix34) -> Self {
        Self {
            sampler: PoseSampler::new(),
            chaperone: ChaperoneSpaceTracker::new(initial_chaperone),
            virtual_devices: VirtualDeviceClassifier::new(),
            grab: GrabDetector::new(),
            accumulator: OffsetAccumulator::new(),
            publisher: DeviceOffsetPublisher::new(),
        }
    }

    pub fn process_frame<R: VrRuntime, E: InputEmulator>(
        &mut self,
        runtime: &mut R,
        emulator: &mut E,
        masks: GrabMasks,
    ) -> FrameReport {
        self.chaperone.refresh(runtime);
        let virtual_set_rebuilt = self.virtual_devices.refresh(&*emulator);

        let poses = self.sampler.sample(&*runtime);
        let deltas = self.grab.sample(&*runtime, &poses, masks);

        let integration = self
            .accumulator
            .integrate(deltas, self.chaperone.rotation());
        self.grab.commit(integration.clamped);

        let published = self.publisher.publish(
            &*runtime,
            emulator,
            &self.virtual_devices,
            integration.offsets,
        );

        FrameReport {
            deltas,
            applied_delta: integration.clamped,
            offsets: integration.offsets,
            published,
            virtual_set_rebuilt,
        }
    }

    pub fn world_offset(&self) -> DVec3 {
        self.accumulator.world_offset()
    }

    pub fn offsets(&self) -> FrameOffsets {
        self.accumulator.offsets()
    }

    pub fn grab(&self) -> &GrabDetector {
        &self.grab
    }

    pub fn chaperone(&self) -> &ChaperoneSpaceTracker {
        &self.chaperone
    }

    pub fn virtual_devices(&self) -> &VirtualDeviceClassifier {
        &self.virtual_devices
    }
}
