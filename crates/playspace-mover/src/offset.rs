//! World offset integration.

use glam::{DMat3, DVec3};
use tracing::trace;

use crate::grab::HandDeltas;

/// Per-axis bound on the delta applied in one frame, in meters. Larger jumps are tracking
/// glitches, not hand motion.
pub const MAX_FRAME_DELTA: f64 = 0.1;

pub fn clamp_delta(delta: DVec3) -> DVec3 {
    if !delta.is_finite() {
        return DVec3::ZERO;
    }
    delta.clamp(DVec3::splat(-MAX_FRAME_DELTA), DVec3::splat(MAX_FRAME_DELTA))
}

/// Offsets to publish for one frame. Copied out of the accumulator so every device sees the
/// same values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameOffsets {
    /// Applied to physical devices.
    pub world: DVec3,
    /// Applied to emulator-created devices, always `world / 2`.
    pub virtual_device: DVec3,
}

impl FrameOffsets {
    fn from_world(world: DVec3) -> Self {
        Self {
            world,
            virtual_device: world / 2.0,
        }
    }
}

/// Result of integrating one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Integration {
    /// Combined tracking-space delta after clamping. Hands re-anchor against this.
    pub clamped: DVec3,
    /// The clamped delta rotated into world space.
    pub world_delta: DVec3,
    pub offsets: FrameOffsets,
}

#[derive(Debug, Clone, Default)]
pub struct OffsetAccumulator {
    world_offset: DVec3,
}

impl OffsetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum, clamp and rotate this frame's hand deltas, then subtract the result from the world
    /// offset. Moving a hand forward drags the play-space backward.
    pub fn integrate(&mut self, deltas: HandDeltas, chaperone_rotation: DMat3) -> Integration {
        let clamped = clamp_delta(deltas.combined());
        let world_delta = chaperone_rotation * clamped;
        self.world_offset -= world_delta;

        if world_delta != DVec3::ZERO {
            trace!(
                dx = world_delta.x,
                dy = world_delta.y,
                dz = world_delta.z,
                "world offset updated"
            );
        }

        Integration {
            clamped,
            world_delta,
            offsets: self.offsets(),
        }
    }

    pub fn world_offset(&self) -> DVec3 {
        self.world_offset
    }

    pub fn offsets(&self) -> FrameOffsets {
        FrameOffsets::from_world(self.world_offset)
    }
}
