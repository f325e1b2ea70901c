//! Blocking startup: connect to the runtime and emulator, then wait for a calibrated chaperone.

use std::thread;
use std::time::Duration;

use playspace_common::MoverConfig;
use playspace_vr::{Connector, InputEmulator, Matrix34, VrRuntime};
use tracing::{debug, info};

use crate::context::MoverContext;
use crate::frame_loop::FrameLoop;

/// Keep calling `connector` until it succeeds, sleeping `interval` between attempts.
pub fn connect_with_retry<C: Connector>(connector: &mut C, interval: Duration) -> C::Connection {
    info!("Looking for {}...", connector.name());
    let mut failures = 0u32;
    loop {
        match connector.connect() {
            Ok(connection) => {
                info!(
                    "Connected to {} after {} attempt(s)",
                    connector.name(),
                    failures + 1
                );
                return connection;
            }
            Err(e) => {
                failures += 1;
                if failures == 1 {
                    info!(
                        "{} not available yet ({e}), retrying every {:?}",
                        connector.name(),
                        interval
                    );
                } else {
                    debug!("{} attempt {} failed: {e}", connector.name(), failures);
                }
                thread::sleep(interval);
            }
        }
    }
}

/// Block until the chaperone is calibrated and return its standing zero to raw tracking matrix.
///
/// This can hang forever if the play area was never set up; room setup has to be rerun then.
pub fn wait_for_calibration<R: VrRuntime>(runtime: &mut R, interval: Duration) -> Matrix34 {
    info!("Grabbing chaperone data (room setup may need to be rerun if this hangs)...");
    let mut logged = false;
    loop {
        runtime.revert_chaperone_working_copy();
        let state = runtime.calibration_state();
        if state.is_ok() {
            if let Some(matrix) = runtime.working_standing_zero_to_raw_tracking() {
                info!("Chaperone calibrated");
                return matrix;
            }
        }
        if !logged {
            info!("chaperone not ready ({state:?}), waiting");
            logged = true;
        } else {
            debug!("chaperone still {state:?}");
        }
        thread::sleep(interval);
    }
}

/// Run the whole startup sequence and build a frame loop ready to run.
pub fn start<RC, EC>(
    runtime_connector: &mut RC,
    emulator_connector: &mut EC,
    config: MoverConfig,
) -> FrameLoop<RC::Connection, EC::Connection>
where
    RC: Connector,
    RC::Connection: VrRuntime,
    EC: Connector,
    EC::Connection: InputEmulator,
{
    let interval = config.connect_retry();
    let mut runtime = connect_with_retry(runtime_connector, interval);
    let emulator = connect_with_retry(emulator_connector, interval);
    let chaperone = wait_for_calibration(&mut runtime, interval);

    FrameLoop::new(runtime, emulator, MoverContext::new(chaperone), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use playspace_vr::sim::{SimConnector, SimHandle, SimulatedEmulator, SimulatedRuntime};
    use playspace_vr::CalibrationState;

    const FAST: Duration = Duration::from_millis(1);

    #[test]
    fn test_connect_retries_until_success() {
        let handle = SimHandle::new();
        let mut connector = SimConnector::<SimulatedRuntime>::new(handle, "runtime").failing(3);

        let _runtime = connect_with_retry(&mut connector, FAST);
        assert_eq!(connector.attempts(), 4);
    }

    #[test]
    fn test_calibration_gate_waits_for_ok() {
        let handle = SimHandle::new();
        let expected = Matrix34::from_translation(DVec3::new(0.0, 0.0, 2.0));
        handle.set_chaperone(expected);
        {
            let mut state = handle.lock();
            state.calibration = CalibrationState::CollisionBoundsInvalid;
            state.calibrate_after_reverts = Some(3);
        }
        let mut runtime = SimulatedRuntime::from(handle.clone());

        let matrix = wait_for_calibration(&mut runtime, FAST);
        assert_eq!(matrix, expected);
        assert_eq!(handle.lock().chaperone_reverts, 3);
    }

    #[test]
    fn test_start_builds_loop_with_initial_chaperone() {
        let handle = SimHandle::new();
        let expected = Matrix34::from_translation(DVec3::new(1.0, 0.0, 0.0));
        handle.set_chaperone(expected);

        let mut runtime_connector =
            SimConnector::<SimulatedRuntime>::new(handle.clone(), "runtime").failing(1);
        let mut emulator_connector =
            SimConnector::<SimulatedEmulator>::new(handle, "input emulator").failing(2);
        let config = MoverConfig {
            connect_retry_ms: 1,
            ..MoverConfig::default()
        };

        let frame_loop = start(&mut runtime_connector, &mut emulator_connector, config);
        assert_eq!(*frame_loop.context().chaperone().matrix(), expected);
        assert_eq!(runtime_connector.attempts(), 2);
        assert_eq!(emulator_connector.attempts(), 3);
    }
}
