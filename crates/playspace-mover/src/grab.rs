//! Per-controller grab detection.

use glam::DVec3;
use playspace_common::MoverConfig;
use playspace_vr::{ControllerRole, VrRuntime};
use tracing::debug;

use crate::pose::PoseFrame;

/// Button masks that start a grab, per hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabMasks {
    pub left: u64,
    pub right: u64,
}

impl From<&MoverConfig> for GrabMasks {
    fn from(config: &MoverConfig) -> Self {
        Self {
            left: config.left_button_mask,
            right: config.right_button_mask,
        }
    }
}

/// Raw tracking-space deltas for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandDeltas {
    pub left: DVec3,
    pub right: DVec3,
}

impl HandDeltas {
    pub fn combined(&self) -> DVec3 {
        self.left + self.right
    }
}

#[derive(Debug, Clone)]
pub struct HandGrab {
    role: ControllerRole,
    /// Position the next delta is measured from. Already corrected for applied offsets.
    anchor: Option<DVec3>,
    /// Position sampled this frame, if the hand had a usable pose.
    position: Option<DVec3>,
    last_delta: DVec3,
    grabbing: bool,
}

impl HandGrab {
    pub fn new(role: ControllerRole) -> Self {
        Self {
            role,
            anchor: None,
            position: None,
            last_delta: DVec3::ZERO,
            grabbing: false,
        }
    }

    fn sample<R: VrRuntime>(&mut self, runtime: &R, poses: &PoseFrame, mask: u64) -> DVec3 {
        self.position = None;
        self.last_delta = DVec3::ZERO;

        let Some(index) = runtime.tracked_device_index_for_role(self.role) else {
            return DVec3::ZERO;
        };
        let Some(pose) = poses.usable(index) else {
            return DVec3::ZERO;
        };

        let position = pose.position();
        self.position = Some(position);

        let pressed = runtime
            .controller_state(index)
            .map_or(0, |state| state.button_pressed);
        let grabbing = pressed & mask != 0;
        if grabbing != self.grabbing {
            debug!(
                hand = %self.role,
                "grab {}",
                if grabbing { "started" } else { "released" }
            );
            self.grabbing = grabbing;
        }

        // The very first usable sample only seeds the anchor.
        self.last_delta = match self.anchor {
            Some(anchor) if grabbing => position - anchor,
            _ => DVec3::ZERO,
        };
        self.last_delta
    }

    fn commit(&mut self, applied: DVec3) {
        if let Some(position) = self.position {
            self.anchor = Some(position - applied);
        }
    }

    pub fn role(&self) -> ControllerRole {
        self.role
    }

    pub fn anchor(&self) -> Option<DVec3> {
        self.anchor
    }

    pub fn last_delta(&self) -> DVec3 {
        self.last_delta
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbing
    }
}

/// Left and right grab state. Persists across frames.
#[derive(Debug, Clone)]
pub struct GrabDetector {
    left: HandGrab,
    right: HandGrab,
}

impl Default for GrabDetector {
    fn default() -> Self {
        Self {
            left: HandGrab::new(ControllerRole::LeftHand),
            right: HandGrab::new(ControllerRole::RightHand),
        }
    }
}

impl GrabDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample<R: VrRuntime>(
        &mut self,
        runtime: &R,
        poses: &PoseFrame,
        masks: GrabMasks,
    ) -> HandDeltas {
        HandDeltas {
            left: self.left.sample(runtime, poses, masks.left),
            right: self.right.sample(runtime, poses, masks.right),
        }
    }

    /// Re-anchor every hand sampled this frame at `position - applied`, so motion that has
    /// already been compensated is not measured again next frame.
    pub fn commit(&mut self, applied: DVec3) {
        self.left.commit(applied);
        self.right.commit(applied);
    }

    pub fn hand(&self, role: ControllerRole) -> &HandGrab {
        match role {
            ControllerRole::LeftHand => &self.left,
            ControllerRole::RightHand => &self.right,
        }
    }
}
