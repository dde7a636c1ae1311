//! Conversion core for an OLX problem-authoring editor.
//!
//! OLX text is parsed into a normalized [`ProblemState`]
//! ([`parse_olx`]), mutated in place by the editing surface, and turned
//! back into OLX plus a settings metadata map at save time
//! ([`prepare_save`]). Structure the visual editor cannot rebuild
//! losslessly falls back to raw-text (advanced) editing with the source
//! kept verbatim.

pub mod types;
pub mod error;
pub mod olx_tree;
pub mod olx_parser;
pub mod olx_builder;
pub mod settings_parser;
pub mod save_gate;
pub mod logger;

pub use olx_parser::parse_olx;
pub use olx_builder::OlxBuilder;
pub use save_gate::{prepare_save, SaveOptions, SaveOutcome, SavePayload};
pub use types::ProblemState;

/// Answer ids are single letters, so a problem can hold at most 26 answers.
pub static MAX_ANSWER_COUNT: usize = 26;
