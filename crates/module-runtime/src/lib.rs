// SPDX-License-Identifier: MIT
// Copyright (c) 2026 DAQ Authors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! Shared substrate for module child processes: the command dispatcher,
//! the slave/headless/GUI event loops, per-child state, and the
//! capture/timer/writer recording pipeline. A module binary (audio, GPS,
//! camera, ...) implements [`dispatcher::ModuleHandlers`] and, if it
//! captures continuous media, wires a [`pipeline::RecordingPipeline`] on
//! top of it; everything else here is shared verbatim.

pub mod dispatcher;
pub mod error;
pub mod mode;
pub mod pipeline;
pub mod queue;
pub mod supervisor;
pub mod system;
pub mod tasks;

pub use dispatcher::{DispatchOutcome, Dispatcher, ModuleHandlers};
pub use error::RuntimeError;
pub use mode::{run_gui, run_headless, run_slave, GuiPump};
pub use pipeline::{CapturedFrame, Frame, FrameSink, LatestFrameSlot, PipelineConfig, RecordingPipeline};
pub use queue::DropOldestQueue;
pub use supervisor::{Runtime, Supervisor};
pub use system::System;
pub use tasks::TaskGroup;
