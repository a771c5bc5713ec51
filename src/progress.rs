//! Phase progress reporting for the CLI binaries.
//!
//! A run is a short sequence of labeled phases (read history, scan library,
//! match). Bars render on stderr unless quiet mode is on, in which case they
//! are created hidden so piped and JSON runs emit nothing but the report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);

pub fn set_quiet(value: bool) {
    QUIET.store(value, Ordering::Relaxed);
}

pub fn is_quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

fn styled(pb: ProgressBar, template: &str) -> ProgressBar {
    if is_quiet() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        pb.set_style(
            ProgressStyle::with_template(template)
                .unwrap()
                .progress_chars("#>-"),
        );
    }
    pb
}

/// Determinate bar for a phase with a known item count.
pub fn phase_bar(label: &str, len: u64) -> ProgressBar {
    let pb = styled(
        ProgressBar::new(len),
        "{msg:28} {bar:32} {pos}/{len} [{elapsed_precise}]",
    );
    pb.set_message(label.to_string());
    pb
}

/// Counter spinner for a phase whose length is unknown up front, e.g. a
/// library scan that discovers charts as it goes.
pub fn phase_spinner(label: &str) -> ProgressBar {
    let pb = styled(
        ProgressBar::new_spinner(),
        "{msg:28} {spinner} {pos} [{elapsed_precise}]",
    );
    if !is_quiet() {
        pb.enable_steady_tick(Duration::from_millis(120));
    }
    pb.set_message(label.to_string());
    pb
}
