//! Maps `Box<dyn Error>` from trait boundaries to typed `ControlError`.
//!
//! The traits in `tipctl_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `tipctl_hardware::HwError`.

use crate::error::ControlError;

/// Map a heater driver error to a typed `ControlError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControlError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<tipctl_hardware::error::HwError>() {
            return match hw {
                tipctl_hardware::error::HwError::Io(io) => ControlError::Heater(io.to_string()),
                other => ControlError::HeaterFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("fault") {
        ControlError::HeaterFault(s)
    } else {
        ControlError::Heater(s)
    }
}
