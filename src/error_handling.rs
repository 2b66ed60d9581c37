// SPDX-License-Identifier: GPL-3.0-only

//! Error reporting for batchshot
//!
//! Every report goes through the `log` facade. In GUI mode the caller decides,
//! via [`should_show_dialog`], whether a report is also worth a prompt window.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag to track if we're running in GUI mode
static GUI_MODE: AtomicBool = AtomicBool::new(false);

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The requested operation did not happen
    Error,
    /// Something was skipped or discarded, the session carries on
    Warning,
    /// Informational messages about state changes
    Info,
}

impl ErrorSeverity {
    #[must_use]
    pub fn level(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

/// Set whether the application is running in GUI mode
pub fn set_gui_mode(enabled: bool) {
    GUI_MODE.store(enabled, Ordering::Relaxed);
}

/// Check if the application is running in GUI mode
pub fn is_gui_mode() -> bool {
    GUI_MODE.load(Ordering::Relaxed)
}

/// Log a report at the level matching its severity.
///
/// Outside GUI mode errors are also echoed to stderr, since nobody will see
/// a dialog.
pub fn report_error(severity: ErrorSeverity, title: &str, message: &str) {
    log::log!(severity.level(), "{title}: {message}");
    if !is_gui_mode() && severity == ErrorSeverity::Error {
        eprintln!("ERROR: {title}: {message}");
    }
}

#[macro_export]
macro_rules! report_error {
    ($title:expr, $msg:expr) => {
        $crate::error_handling::report_error(
            $crate::error_handling::ErrorSeverity::Error,
            $title,
            $msg,
        )
    };
}

#[macro_export]
macro_rules! report_warning {
    ($title:expr, $msg:expr) => {
        $crate::error_handling::report_error(
            $crate::error_handling::ErrorSeverity::Warning,
            $title,
            $msg,
        )
    };
}

#[macro_export]
macro_rules! report_info {
    ($title:expr, $msg:expr) => {
        $crate::error_handling::report_error(
            $crate::error_handling::ErrorSeverity::Info,
            $title,
            $msg,
        )
    };
}

/// Check if a report should open a prompt window in GUI mode
///
/// Warnings are log-only: a failed capture is discarded quietly.
#[must_use]
pub fn should_show_dialog(severity: ErrorSeverity) -> bool {
    match severity {
        ErrorSeverity::Error | ErrorSeverity::Info => true,
        ErrorSeverity::Warning => false,
    }
}

/// Report a successful operation
pub fn report_success(title: &str, message: &str) {
    log::info!("{title}: {message}");
    if !is_gui_mode() {
        println!("SUCCESS: {title}: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_stay_out_of_dialogs() {
        assert!(should_show_dialog(ErrorSeverity::Error));
        assert!(should_show_dialog(ErrorSeverity::Info));
        assert!(!should_show_dialog(ErrorSeverity::Warning));
    }

    #[test]
    fn severity_maps_to_log_level() {
        assert_eq!(ErrorSeverity::Error.level(), log::Level::Error);
        assert_eq!(ErrorSeverity::Warning.level(), log::Level::Warn);
        assert_eq!(ErrorSeverity::Info.level(), log::Level::Info);
    }
}
