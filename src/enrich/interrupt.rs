//! Operator interruption (Ctrl-C) as a cancellation flag.
use anyhow::{Context, Result};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Exit status for a second termination signal (128 + SIGINT).
const FORCED_EXIT: i32 = 130;

/// Route termination signals into a flag the orchestrator polls.
///
/// The first signal only sets the flag; a second one while it is set
/// terminates the process.
pub fn install() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    for &signal in TERM_SIGNALS {
        flag::register_conditional_shutdown(signal, FORCED_EXIT, Arc::clone(&interrupted))
            .with_context(|| format!("register shutdown for signal {signal}"))?;
        flag::register(signal, Arc::clone(&interrupted))
            .with_context(|| format!("register interrupt flag for signal {signal}"))?;
    }
    Ok(interrupted)
}
