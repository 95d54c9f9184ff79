//! Confirmation policy and displayed-intent types.
//!
//! Ported from `types::handlers::{ConfirmationUIMode,
//! ConfirmationBehavior, ConfirmationConfig}`, with the `wasm_bindgen`
//! getter plumbing dropped (no UI framework or DOM binding here — spec.md
//! §1 Non-goals).

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationUIMode {
    #[serde(rename = "skip")]
    Skip,
    #[serde(rename = "modal")]
    Modal,
    #[serde(rename = "drawer")]
    Drawer,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationBehavior {
    #[serde(rename = "requireClick")]
    RequireClick,
    #[serde(rename = "autoProceed")]
    AutoProceed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationConfig {
    pub ui_mode: ConfirmationUIMode,
    pub behavior: ConfirmationBehavior,
    pub auto_proceed_delay_ms: Option<u32>,
    pub theme: Option<String>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            ui_mode: ConfirmationUIMode::Modal,
            behavior: ConfirmationBehavior::RequireClick,
            auto_proceed_delay_ms: Some(2000),
            theme: Some("dark".to_string()),
        }
    }
}

/// The list of `(receiver, actions)` tuples the Orchestrator hands the UI
/// Agent to display (spec.md §4.4 step 2).
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DisplayedTransaction {
    pub receiver_id: String,
    pub actions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummaryAction {
    pub to: String,
    pub total_amount: String,
}
