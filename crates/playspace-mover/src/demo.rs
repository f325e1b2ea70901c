use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use glam::DVec3;
use playspace_vr::sim::SimHandle;
use playspace_vr::ControllerRole;

const LEFT_HAND: u32 = 1;
const RIGHT_HAND: u32 = 2;
const VIRTUAL_TRACKER: u32 = 3;
const FRAME_INTERVAL: Duration = Duration::from_micros(11_111);
const RIGHT_HAND_HOME: DVec3 = DVec3::new(0.2, 1.0, -0.3);

pub struct DemoMotion {
    pub radius: f64,
    pub grab_period: Duration,
    pub grab_mask: u64,
}

/// Two controllers and one emulator-backed tracker.
pub fn populate(handle: &SimHandle) {
    handle.connect_controller(ControllerRole::LeftHand, LEFT_HAND, DVec3::new(-0.2, 1.0, -0.3));
    handle.connect_controller(ControllerRole::RightHand, RIGHT_HAND, RIGHT_HAND_HOME);
    handle.add_virtual_device(VIRTUAL_TRACKER, DVec3::new(0.0, 0.9, 0.0));
}

/// Advance simulated frames at 90 Hz, circling the right controller and toggling its grab.
pub fn spawn_driver(
    handle: SimHandle,
    motion: DemoMotion,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let driver = thread::Builder::new()
        .name("demo-driver".to_string())
        .spawn(move || {
            let started = Instant::now();
            let period = motion.grab_period.as_secs_f64().max(f64::EPSILON);
            while !stop.load(Ordering::Relaxed) {
                let t = started.elapsed().as_secs_f64();
                let circle = DVec3::new(t.cos(), 0.0, t.sin()) * motion.radius;
                handle.set_position(RIGHT_HAND, RIGHT_HAND_HOME + circle);

                if (t / period) as u64 % 2 == 0 {
                    handle.press(RIGHT_HAND, motion.grab_mask);
                } else {
                    handle.release(RIGHT_HAND);
                }

                handle.advance_frame();
                thread::sleep(FRAME_INTERVAL);
            }
        })?;
    Ok(driver)
}
