//! Progress indicators for tsupdate
//!
//! Spinners are shown while waiting on metadata lookups and package-manager
//! queries. Download progress is reported through log lines instead (see
//! [`crate::update::download::ProgressMeter`]), so it stays readable when
//! stderr is captured.
//!
//! # Environment Variables
//!
//! - `TSUPDATE_NO_PROGRESS`: Set to any value to disable all spinners
//!
//! The `--no-progress` flag has the same effect through [`disable_progress`].
//!
//! # Examples
//!
//! ```rust
//! use tsupdate::utils::progress::spinner_with_message;
//!
//! let spinner = spinner_with_message("Checking for the latest version...");
//! // ... long running lookup ...
//! spinner.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Environment variable that disables spinners when set.
pub const NO_PROGRESS_ENV: &str = "TSUPDATE_NO_PROGRESS";

static PROGRESS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Turns off spinners for the rest of the process.
pub fn disable_progress() {
    PROGRESS_DISABLED.store(true, Ordering::Relaxed);
}

/// Spinners are disabled by [`disable_progress`], `TSUPDATE_NO_PROGRESS`, or
/// a non-terminal stderr.
fn is_progress_disabled() -> bool {
    PROGRESS_DISABLED.load(Ordering::Relaxed)
        || std::env::var_os(NO_PROGRESS_ENV).is_some()
        || !std::io::stderr().is_terminal()
}

/// A spinner with consistent styling that hides itself when progress is disabled.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a spinner for indeterminate work.
    ///
    /// The spinner ticks every 100ms until finished.
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self {
            inner: bar,
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// Creates a spinner already showing `msg`.
pub fn spinner_with_message(msg: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(msg);
    spinner
}
