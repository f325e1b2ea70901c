//! End-to-end pipeline tests against the simulated runtime.

use glam::{DMat3, DVec3};
use playspace_common::MoverConfig;
use playspace_mover::{FrameLoop, MoverContext, PollOutcome, MAX_FRAME_DELTA};
use playspace_vr::sim::{SimHandle, SimulatedEmulator, SimulatedRuntime};
use playspace_vr::{ButtonId, ControllerRole, Matrix34};

const HMD: u32 = 0;
const LEFT: u32 = 1;
const RIGHT: u32 = 2;
const TRACKER: u32 = 3;
const GRAB: u64 = ButtonId::ApplicationMenu.mask();
const EPS: f64 = 1e-6;

type SimLoop = FrameLoop<SimulatedRuntime, SimulatedEmulator>;

fn setup() -> (SimHandle, SimLoop) {
    let handle = SimHandle::new();
    handle.connect_controller(ControllerRole::LeftHand, LEFT, DVec3::new(-0.25, 1.0, -0.3));
    handle.connect_controller(ControllerRole::RightHand, RIGHT, DVec3::new(0.25, 1.0, -0.3));
    handle.add_virtual_device(TRACKER, DVec3::new(0.0, 0.9, 0.0));

    let mut frame_loop = FrameLoop::new(
        SimulatedRuntime::from(handle.clone()),
        SimulatedEmulator::from(handle.clone()),
        MoverContext::new(Matrix34::IDENTITY),
        MoverConfig::default(),
    );
    // Seed both hand anchors.
    assert!(matches!(frame_loop.poll(), PollOutcome::Processed(_)));
    (handle, frame_loop)
}

fn next_frame(handle: &SimHandle, frame_loop: &mut SimLoop) {
    handle.advance_frame();
    assert!(matches!(frame_loop.poll(), PollOutcome::Processed(_)));
}

#[test]
fn single_hand_grab_moves_offset_by_negative_delta() {
    let (handle, mut frame_loop) = setup();
    let d = DVec3::new(0.03, -0.01, 0.02);

    handle.press(RIGHT, GRAB);
    handle.move_by(RIGHT, d);
    next_frame(&handle, &mut frame_loop);

    assert!(frame_loop.context().world_offset().abs_diff_eq(-d, EPS));
    assert!(handle.translation_offset(HMD).abs_diff_eq(-d, EPS));
    assert!(handle.translation_offset(LEFT).abs_diff_eq(-d, EPS));
}

#[test]
fn no_grab_leaves_offset_unchanged() {
    let (handle, mut frame_loop) = setup();

    for i in 0..20 {
        handle.move_by(LEFT, DVec3::new(0.01, 0.0, 0.0));
        handle.move_by(RIGHT, DVec3::new(0.0, 0.0, -0.02 * (i % 3) as f64));
        next_frame(&handle, &mut frame_loop);
        assert_eq!(frame_loop.context().world_offset(), DVec3::ZERO);
    }
}

#[test]
fn held_button_without_motion_does_not_compound() {
    let (handle, mut frame_loop) = setup();
    let d = DVec3::new(0.0, 0.0, 0.05);

    handle.press(RIGHT, GRAB);
    handle.move_by(RIGHT, d);
    next_frame(&handle, &mut frame_loop);
    let after_grab = frame_loop.context().world_offset();

    for _ in 0..10 {
        next_frame(&handle, &mut frame_loop);
    }
    handle.release(RIGHT);
    for _ in 0..10 {
        next_frame(&handle, &mut frame_loop);
    }

    assert!(frame_loop.context().world_offset().abs_diff_eq(after_grab, EPS));
}

#[test]
fn sustained_grab_drags_play_space_with_the_hand() {
    let (handle, mut frame_loop) = setup();
    let start = handle.reported_position(RIGHT);

    handle.press(RIGHT, GRAB);
    for _ in 0..10 {
        handle.move_by(RIGHT, DVec3::new(0.0, 0.0, 0.01));
        next_frame(&handle, &mut frame_loop);
    }

    assert!(frame_loop
        .context()
        .world_offset()
        .abs_diff_eq(DVec3::new(0.0, 0.0, -0.1), 1e-5));
    // The hand stays put relative to the moved play-space.
    assert!(handle.reported_position(RIGHT).abs_diff_eq(start, 1e-5));
}

#[test]
fn large_jumps_are_clamped_per_axis() {
    let (handle, mut frame_loop) = setup();

    handle.press(LEFT, GRAB);
    handle.move_by(LEFT, DVec3::new(0.5, -0.3, 0.04));
    next_frame(&handle, &mut frame_loop);

    let offset = frame_loop.context().world_offset();
    assert_eq!(offset.x, -MAX_FRAME_DELTA);
    assert_eq!(offset.y, MAX_FRAME_DELTA);
    assert!((offset.z + 0.04).abs() < EPS);
}

#[test]
fn virtual_devices_receive_half_the_offset() {
    let (handle, mut frame_loop) = setup();

    handle.press(RIGHT, GRAB);
    for _ in 0..3 {
        handle.move_by(RIGHT, DVec3::new(0.02, 0.0, -0.04));
        next_frame(&handle, &mut frame_loop);
    }

    let physical = handle.translation_offset(HMD);
    let virtual_offset = handle.translation_offset(TRACKER);
    assert_ne!(physical, DVec3::ZERO);
    assert!(virtual_offset.abs_diff_eq(physical / 2.0, 1e-12));
    assert!((virtual_offset.length() * 2.0 - physical.length()).abs() < 1e-12);
}

#[test]
fn opposite_two_handed_grab_cancels() {
    let (handle, mut frame_loop) = setup();
    let d = DVec3::new(0.04, 0.0, 0.0);

    handle.press(LEFT, GRAB);
    handle.press(RIGHT, GRAB);
    handle.move_by(LEFT, d);
    handle.move_by(RIGHT, -d);
    next_frame(&handle, &mut frame_loop);

    assert!(frame_loop.context().world_offset().abs_diff_eq(DVec3::ZERO, EPS));
}

#[test]
fn same_direction_two_handed_grab_sums_then_clamps() {
    let (handle, mut frame_loop) = setup();
    let d = DVec3::new(0.0, 0.0, 0.07);

    handle.press(LEFT, GRAB);
    handle.press(RIGHT, GRAB);
    handle.move_by(LEFT, d);
    handle.move_by(RIGHT, d);
    next_frame(&handle, &mut frame_loop);

    assert_eq!(frame_loop.context().world_offset().z, -MAX_FRAME_DELTA);
}

#[test]
fn rotated_chaperone_swaps_axes() {
    let (handle, mut frame_loop) = setup();
    handle.set_chaperone(Matrix34::from_rotation_translation(
        DMat3::from_rotation_y(std::f64::consts::FRAC_PI_2),
        DVec3::ZERO,
    ));

    handle.press(RIGHT, GRAB);
    handle.move_by(RIGHT, DVec3::new(0.05, 0.0, 0.0));
    next_frame(&handle, &mut frame_loop);

    let offset = frame_loop.context().world_offset();
    assert!(offset.abs_diff_eq(DVec3::new(0.0, 0.0, 0.05), EPS));
}

#[test]
fn repeated_frame_index_is_not_integrated_twice() {
    let (handle, mut frame_loop) = setup();
    let d = DVec3::new(0.02, 0.0, 0.0);

    handle.press(RIGHT, GRAB);
    handle.move_by(RIGHT, d);
    next_frame(&handle, &mut frame_loop);
    let pushes = handle.offset_pushes(HMD);

    // New motion without a new compositor frame must not be picked up.
    handle.move_by(RIGHT, d);
    for _ in 0..5 {
        assert_eq!(frame_loop.poll(), PollOutcome::SameFrame);
    }

    assert!(frame_loop.context().world_offset().abs_diff_eq(-d, EPS));
    assert_eq!(handle.offset_pushes(HMD), pushes);
}

#[test]
fn new_virtual_device_is_picked_up_mid_session() {
    let (handle, mut frame_loop) = setup();

    handle.press(RIGHT, GRAB);
    handle.move_by(RIGHT, DVec3::new(0.06, 0.0, 0.0));
    next_frame(&handle, &mut frame_loop);
    handle.release(RIGHT);

    handle.add_virtual_device(9, DVec3::ZERO);
    next_frame(&handle, &mut frame_loop);

    assert!(frame_loop.context().virtual_devices().is_virtual(9));
    let physical = handle.translation_offset(HMD);
    assert!(handle.translation_offset(9).abs_diff_eq(physical / 2.0, 1e-12));
}

#[test]
fn disconnected_controller_does_not_contribute() {
    let (handle, mut frame_loop) = setup();

    handle.press(LEFT, GRAB);
    handle.disconnect(LEFT);
    handle.move_by(LEFT, DVec3::new(0.05, 0.05, 0.05));
    next_frame(&handle, &mut frame_loop);

    assert_eq!(frame_loop.context().world_offset(), DVec3::ZERO);
    assert_eq!(handle.offset_pushes(LEFT), 1);
}
