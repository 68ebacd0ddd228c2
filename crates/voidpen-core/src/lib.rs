//! # voidpen Core Library
//!
//! This library provides the core logic for voidpen, a single-session
//! focus-writing tool: state a commitment, write until a word or time
//! threshold is reached, then stop and export the text.
//!
//! Rendering, clipboard access and fullscreen control belong to a
//! presentation adapter. The core only reports what the adapter should do
//! through [`Event`]s and exposes every value the adapter draws.
//!
//! ## Architecture
//!
//! - **Timer Service**: a virtual-time scheduler for one-shot and repeating
//!   timers; the caller advances time
//! - **Word Counter / Progress Tracker**: pure derivations plus a one-way
//!   threshold latch
//! - **Fade Engine**: activity counters and idle timers that drive opacity
//! - **Session State Machine**: `Setup -> Focus -> Complete`, owner of all
//!   mutable state
//! - **Storage**: TOML configuration for defaults and timings
//!
//! ## Key Components
//!
//! - [`Session`]: Core state machine
//! - [`FadeEngine`]: Attention-fade state for one session
//! - [`Scheduler`]: Timer table
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod fade;
pub mod progress;
pub mod session;
pub mod storage;
pub mod timer;
pub mod words;

pub use error::{ConfigError, CoreError, SessionError};
pub use events::Event;
pub use fade::{FadeEngine, FadeOutcome, FadeState, FadeTimings};
pub use progress::{Measure, ProgressUpdate, ThresholdState};
pub use session::{
    InterruptDecision, Session, SessionSettings, SessionSummary, Stage, Targets, Timings,
    TrackingMode,
};
pub use storage::Config;
pub use timer::{Fired, Scheduler, TimerId, TimerKind};
