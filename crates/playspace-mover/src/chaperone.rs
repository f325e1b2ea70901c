use glam::DMat3;
use playspace_vr::{Matrix34, VrRuntime};
use tracing::{debug, info};

/// Tracks the standing zero pose to raw tracking transform.
///
/// The calibration can be changed by other applications between frames, so the working copy
/// is reverted and re-read every frame.
#[derive(Debug, Clone)]
pub struct ChaperoneSpaceTracker {
    matrix: Matrix34,
}

impl ChaperoneSpaceTracker {
    pub fn new(initial: Matrix34) -> Self {
        Self { matrix: initial }
    }

    pub fn refresh<R: VrRuntime>(&mut self, runtime: &mut R) {
        runtime.revert_chaperone_working_copy();
        match runtime.working_standing_zero_to_raw_tracking() {
            Some(matrix) => {
                if matrix != self.matrix {
                    info!("chaperone calibration changed");
                }
                self.matrix = matrix;
            }
            None => debug!("standing zero pose unavailable, keeping previous chaperone matrix"),
        }
    }

    pub fn matrix(&self) -> &Matrix34 {
        &self.matrix
    }

    pub fn rotation(&self) -> DMat3 {
        self.matrix.rotation()
    }
}
