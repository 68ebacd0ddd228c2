//! Scripted presentation adapter.
//!
//! Reads a JSON script of user actions, platform notifications and waits,
//! applies them to a session in order, and prints every emitted event as one
//! JSON object per line. Rejected commands are logged and the run continues.
//!
//! ```json
//! { "steps": [
//!     { "commitment": "Write the introduction" },
//!     { "target": 100 },
//!     "begin",
//!     { "type": "It was a bright cold day in April " },
//!     { "wait": 5000 },
//!     "finish",
//!     "copy"
//! ] }
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use voidpen_core::{Config, Event, Session, SessionError, SessionSettings, TrackingMode};

#[derive(Args)]
pub struct ReplayArgs {
    /// Script file (JSON)
    pub script: PathBuf,
    /// Print a state snapshot after every step
    #[arg(long)]
    pub snapshots: bool,
    /// Ignore the user's config file and use built-in defaults
    #[arg(long)]
    pub no_config: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Commitment(String),
    Mode(TrackingMode),
    Target(u32),
    Begin,
    /// Append text, as typing does.
    Type(String),
    /// Replace the whole content.
    Content(String),
    /// Advance virtual time by this many milliseconds.
    Wait(u64),
    Hover(bool),
    Interrupt,
    PresentationLost,
    PresentationRegained,
    RequestPresentation,
    Finish,
    Copy,
    NewSession,
    Snapshot,
}

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

pub fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&args.script)?;
    let script: Script = serde_json::from_str(&raw)?;

    let settings = if args.no_config {
        SessionSettings::default()
    } else {
        Config::load_or_default().session_settings()
    };
    let mut session = Session::new(settings);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_script(&mut session, &script, args.snapshots, &mut out)
}

/// Apply every step to `session`, writing events as JSON lines to `out`.
pub fn run_script<W: Write>(
    session: &mut Session,
    script: &Script,
    snapshots: bool,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    for (index, step) in script.steps.iter().enumerate() {
        match apply(session, step) {
            Ok(events) => {
                for event in &events {
                    writeln!(out, "{}", serde_json::to_string(event)?)?;
                }
            }
            Err(e) => {
                warn!(step = index, ?step, error = %e, "step rejected");
                let line = json!({ "type": "Rejected", "step": index, "error": e.to_string() });
                writeln!(out, "{line}")?;
            }
        }
        if snapshots || *step == Step::Snapshot {
            writeln!(out, "{}", serde_json::to_string(&session.snapshot())?)?;
        }
    }
    Ok(())
}

fn apply(session: &mut Session, step: &Step) -> Result<Vec<Event>, SessionError> {
    match step {
        Step::Commitment(text) => session.set_commitment(text.as_str()).map(|()| Vec::new()),
        Step::Mode(mode) => session.set_tracking_mode(*mode).map(|()| Vec::new()),
        Step::Target(n) => session.set_target(*n).map(|()| Vec::new()),
        Step::Begin => session.begin(),
        Step::Type(text) => session.append_content(text),
        Step::Content(text) => session.set_content(text.as_str()),
        Step::Wait(ms) => Ok(session.advance(*ms)),
        Step::Hover(on) => {
            session.set_hovering_done(*on);
            Ok(Vec::new())
        }
        Step::Interrupt => {
            // The decision only matters to a real platform; the event says it all.
            let (_decision, events) = session.notify_interrupt_attempt();
            Ok(events)
        }
        Step::PresentationLost => Ok(session.notify_presentation_lost()),
        Step::PresentationRegained => Ok(session.notify_presentation_regained()),
        Step::RequestPresentation => session.request_presentation(),
        Step::Finish => session.finish(),
        Step::Copy => session.copy_to_clipboard(),
        Step::NewSession => session.new_session(),
        Step::Snapshot => Ok(Vec::new()),
    }
}
