//! Confirmation policy normalization, ported from
//! `validate_and_normalize_confirmation_config`.
//!
//! Rules:
//! - `skip` overrides `behavior` to `autoProceed` with a 0ms delay; the
//!   caller's behavior/delay choices are ignored outright.
//! - `modal` / `drawer` with `requireClick` drops any `auto_proceed_delay_ms`
//!   (it has no meaning without auto-proceeding).
//! - `modal` / `drawer` with `autoProceed` fills in the default delay when
//!   the caller left it unset.

use crate::config::DEFAULT_AUTO_PROCEED_DELAY_MS;
use crate::types::{ConfirmationBehavior, ConfirmationConfig, ConfirmationUIMode};

pub fn validate_and_normalize_confirmation_config(config: &ConfirmationConfig) -> ConfirmationConfig {
    let mut normalized = config.clone();

    match config.ui_mode {
        ConfirmationUIMode::Skip => {
            normalized.behavior = ConfirmationBehavior::AutoProceed;
            normalized.auto_proceed_delay_ms = Some(0);
        }
        ConfirmationUIMode::Modal | ConfirmationUIMode::Drawer => match config.behavior {
            ConfirmationBehavior::RequireClick => {
                normalized.auto_proceed_delay_ms = None;
            }
            ConfirmationBehavior::AutoProceed => {
                if config.auto_proceed_delay_ms.is_none() {
                    normalized.auto_proceed_delay_ms = Some(DEFAULT_AUTO_PROCEED_DELAY_MS);
                }
            }
        },
    }

    normalized
}

#[cfg(not(target_arch = "wasm32"))]
pub fn generate_request_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", millis, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_forces_auto_proceed_zero_delay() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Skip,
            behavior: ConfirmationBehavior::RequireClick,
            auto_proceed_delay_ms: Some(5000),
            theme: None,
        };
        let normalized = validate_and_normalize_confirmation_config(&config);
        assert_eq!(normalized.behavior, ConfirmationBehavior::AutoProceed);
        assert_eq!(normalized.auto_proceed_delay_ms, Some(0));
    }

    #[test]
    fn require_click_drops_auto_proceed_delay() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Modal,
            behavior: ConfirmationBehavior::RequireClick,
            auto_proceed_delay_ms: Some(5000),
            theme: None,
        };
        let normalized = validate_and_normalize_confirmation_config(&config);
        assert_eq!(normalized.auto_proceed_delay_ms, None);
    }

    #[test]
    fn auto_proceed_without_delay_gets_default() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Drawer,
            behavior: ConfirmationBehavior::AutoProceed,
            auto_proceed_delay_ms: None,
            theme: None,
        };
        let normalized = validate_and_normalize_confirmation_config(&config);
        assert_eq!(normalized.auto_proceed_delay_ms, Some(DEFAULT_AUTO_PROCEED_DELAY_MS));
    }

    #[test]
    fn auto_proceed_with_explicit_delay_is_preserved() {
        let config = ConfirmationConfig {
            ui_mode: ConfirmationUIMode::Modal,
            behavior: ConfirmationBehavior::AutoProceed,
            auto_proceed_delay_ms: Some(9000),
            theme: None,
        };
        let normalized = validate_and_normalize_confirmation_config(&config);
        assert_eq!(normalized.auto_proceed_delay_ms, Some(9000));
    }

    #[test]
    fn request_ids_are_unique_across_calls() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert_ne!(a, b);
    }
}
