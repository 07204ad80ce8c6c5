//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable holding the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "ETC_TUNE_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the software tree.
///
/// This is the value of `ETC_TUNE_SW_ROOT` if it is set, otherwise the current
/// working directory. If neither is available `.` is used.
pub fn get_sw_root() -> PathBuf {
    match env::var_os(SW_ROOT_ENV_VAR) {
        Some(root) => PathBuf::from(root),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}
