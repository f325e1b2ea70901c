//! Compositor-frame gated driver for the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use playspace_common::MoverConfig;
use playspace_vr::{FrameTiming, InputEmulator, VrRuntime};
use tracing::{info, trace};

use crate::context::{FrameReport, MoverContext};
use crate::grab::GrabMasks;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WaitingForFrame,
    Processing { frame_index: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The compositor had no frame timing to report.
    NoFrame,
    /// The compositor is still on the last processed frame.
    SameFrame,
    Processed(FrameReport),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub processed: u64,
    pub same_frame_polls: u64,
    pub no_frame_polls: u64,
}

/// Decide whether a compositor report starts a new processing cycle.
fn gate(last_frame_index: Option<u32>, timing: Option<FrameTiming>) -> Option<u32> {
    let timing = timing?;
    (last_frame_index != Some(timing.frame_index)).then_some(timing.frame_index)
}

pub struct FrameLoop<R, E> {
    runtime: R,
    emulator: E,
    context: MoverContext,
    config: MoverConfig,
    state: LoopState,
    last_frame_index: Option<u32>,
    stats: FrameStats,
    max_frames: Option<u64>,
}

impl<R: VrRuntime, E: InputEmulator> FrameLoop<R, E> {
    pub fn new(runtime: R, emulator: E, context: MoverContext, config: MoverConfig) -> Self {
        Self {
            runtime,
            emulator,
            context,
            config,
            state: LoopState::WaitingForFrame,
            last_frame_index: None,
            stats: FrameStats::default(),
            max_frames: None,
        }
    }

    /// Stop `run` after this many processed frames.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Check the compositor once and run the pipeline if it moved on to a new frame.
    pub fn poll(&mut self) -> PollOutcome {
        let timing = self.runtime.frame_timing();
        let Some(frame_index) = gate(self.last_frame_index, timing) else {
            if timing.is_some() {
                self.stats.same_frame_polls += 1;
                return PollOutcome::SameFrame;
            }
            self.stats.no_frame_polls += 1;
            return PollOutcome::NoFrame;
        };

        self.state = LoopState::Processing { frame_index };
        self.last_frame_index = Some(frame_index);

        let masks = GrabMasks::from(&self.config);
        let report = self
            .context
            .process_frame(&mut self.runtime, &mut self.emulator, masks);
        self.stats.processed += 1;
        trace!(frame_index, published = report.published.published(), "frame processed");

        self.state = LoopState::WaitingForFrame;
        PollOutcome::Processed(report)
    }

    /// Poll until `stop` is set or the frame limit is reached.
    pub fn run(&mut self, stop: &AtomicBool) -> FrameStats {
        let post_frame_sleep = self.config.post_frame_sleep();
        let idle_poll = self.config.idle_poll();

        info!("frame loop running");
        while !stop.load(Ordering::Relaxed) && !self.frame_limit_reached() {
            match self.poll() {
                PollOutcome::Processed(_) => thread::sleep(post_frame_sleep),
                PollOutcome::NoFrame | PollOutcome::SameFrame => {
                    if idle_poll.is_zero() {
                        std::hint::spin_loop();
                    } else {
                        thread::sleep(idle_poll);
                    }
                }
            }
        }

        let offset = self.context.world_offset();
        info!(
            processed = self.stats.processed,
            same_frame_polls = self.stats.same_frame_polls,
            no_frame_polls = self.stats.no_frame_polls,
            "frame loop stopped, world offset ({:.3}, {:.3}, {:.3})",
            offset.x,
            offset.y,
            offset.z
        );
        self.stats
    }

    fn frame_limit_reached(&self) -> bool {
        self.max_frames
            .is_some_and(|max| self.stats.processed >= max)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn context(&self) -> &MoverContext {
        &self.context
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn config_mut(&mut self) -> &mut MoverConfig {
        &mut self.config
    }
}
