//! ## Logging Configuration
//!
//! This module sets up logging automatically at program startup using the `ctor` crate.
//! Logging behavior is controlled by the `DEBUG_REGRESSION_PIPELINE` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no subscriber is installed and the library stays silent.
//! - **Enabled**: Any other value installs a `tracing` fmt subscriber with a maximum level of `DEBUG`,
//!   which shows per-step fitting events and timings.
//!
//! ### Usage Example
//!
//! ```sh
//! export DEBUG_REGRESSION_PIPELINE=true
//! ```

use ctor::ctor;
use tracing::Level;

pub(crate) const DEBUG_ENV_VAR: &str = "DEBUG_REGRESSION_PIPELINE";

/// Returns true when the given value of the debug variable turns logging on.
pub(crate) fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !(v == "0" || v == "false" || v.is_empty()))
}

#[ctor]
fn set_debug_level() {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    if is_enabled(value.as_deref()) {
        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}
