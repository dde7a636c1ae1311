//! Pre-save validation and payload assembly.
//!
//! One entry point, `prepare_save`, runs the checks in a fixed order:
//! visually edited problems must have a valid correct answer, and raw-text
//! edits must not silently diverge from the sidebar settings. Warnings
//! block the save until the user dismisses them; nothing is ever
//! auto-corrected behind the user's back.

use serde_json::{Map, Value};

use crate::error::{BuildError, ValidationWarning};
use crate::olx_builder::OlxBuilder;
use crate::settings_parser::{olx_settings_metadata, parse_settings, settings_to_metadata};
use crate::types::{ProblemState, ProblemType, Settings};

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// The user edited the raw OLX text directly this session, so the
    /// text, not the visual state, is the source of truth for the body.
    pub raw_olx_edited: bool,
    /// The user saw the warnings and chose to save anyway.
    pub acknowledge_warnings: bool,
}

/// What gets persisted: the OLX document plus the settings metadata map.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePayload {
    pub olx: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Ready(SavePayload),
    Blocked(ValidationWarning),
}

pub fn prepare_save(
    state: &ProblemState,
    default_settings: &Map<String, Value>,
    options: &SaveOptions,
) -> Result<SaveOutcome, BuildError> {
    let raw_text_mode = state.problem_type == ProblemType::Advanced || options.raw_olx_edited;

    if !raw_text_mode && !has_valid_answer(state) && !options.acknowledge_warnings {
        return Ok(SaveOutcome::Blocked(ValidationWarning::NoCorrectAnswer));
    }
    if raw_text_mode {
        let fields = settings_discrepancies(&state.raw_olx, &state.settings, default_settings);
        if !fields.is_empty() && !options.acknowledge_warnings {
            return Ok(SaveOutcome::Blocked(
                ValidationWarning::SettingsDiscrepancy { fields },
            ));
        }
    }

    let olx = if raw_text_mode {
        state.raw_olx.clone()
    } else {
        OlxBuilder::new(state).build()?
    };
    Ok(SaveOutcome::Ready(SavePayload {
        olx,
        metadata: settings_to_metadata(&state.settings),
    }))
}

/// Whether the answer list can grade anything. Numeric answers are correct
/// by construction, so only the title matters there; the other families
/// need at least one title-bearing answer marked correct.
pub fn has_valid_answer(state: &ProblemState) -> bool {
    match state.problem_type {
        ProblemType::Numeric => state
            .answers
            .iter()
            .any(|a| !a.title.trim().is_empty()),
        _ => state
            .answers
            .iter()
            .any(|a| a.correct && !a.title.trim().is_empty()),
    }
}

/// Names of the settings fields where hand-edited OLX attributes disagree
/// with the sidebar-configured settings. Empty when the text does not
/// parse; a malformed document is the raw editor's problem, not ours.
pub fn settings_discrepancies(
    olx: &str,
    configured: &Settings,
    default_settings: &Map<String, Value>,
) -> Vec<String> {
    let Some(olx_metadata) = olx_settings_metadata(olx) else {
        return Vec::new();
    };
    let derived = parse_settings(&olx_metadata, default_settings);

    let mut fields = Vec::new();
    for key in olx_metadata.keys() {
        let differs = match key.as_str() {
            "weight" => derived.scoring.weight != configured.scoring.weight,
            "max_attempts" => derived.scoring.attempts != configured.scoring.attempts,
            "showanswer" => derived.show_answer.on != configured.show_answer.on,
            "attempts_before_showanswer_button" => {
                derived.show_answer.after_attempts != configured.show_answer.after_attempts
            }
            "show_reset_button" => derived.show_reset_button != configured.show_reset_button,
            "submission_wait_seconds" => derived.time_between != configured.time_between,
            _ => false,
        };
        if differs {
            fields.push(key.clone());
        }
    }
    fields
}
