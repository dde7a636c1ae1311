use thiserror::Error;

/// Raised when OLX contains structure the visual editor cannot represent
/// losslessly. The caller's contract is to fall back to advanced (raw text)
/// editing with the original OLX preserved verbatim, never to keep a
/// partially applied parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralParseError {
    #[error("malformed OLX: {0}")]
    Malformed(String),

    #[error("document root is <{0}>, expected <problem>")]
    NotAProblem(String),

    #[error("script tag found, reverting to advanced editor")]
    ScriptTag,

    #[error("unexpected <{0}> tag, reverting to advanced editor")]
    DisallowedChildTag(String),

    #[error("unexpected \"{0}\" attribute on answer widget, reverting to advanced editor")]
    DisallowedWidgetAttribute(String),

    #[error("unrecognized attribute \"{0}\" associated with problem, opening in advanced editor")]
    UnrecognizedProblemAttribute(String),

    #[error("partial credit not supported by the visual editor, reverting to advanced editor")]
    PartialCredit,

    #[error("OLX was found after the {0} tag, opening in advanced editor")]
    ContentAfterResponse(String),

    #[error("attribute value \"{0}\" is not a boolean literal")]
    InvalidBooleanAttribute(String),

    #[error("answer choice is missing its correct attribute")]
    MissingCorrectAttribute,
}

/// Pre-save findings the user may dismiss. A warning blocks the save
/// until explicitly acknowledged; it is never silently auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("no answer is marked correct")]
    NoCorrectAnswer,

    #[error("settings in the OLX text differ from the configured settings: {}", .fields.join(", "))]
    SettingsDiscrepancy { fields: Vec<String> },
}

/// Raised when a `ProblemState` cannot be rebuilt into OLX.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("cannot build OLX for a problem with no type selected")]
    UnsetProblemType,

    #[error("markup fragment is not well formed: {0}")]
    MalformedFragment(String),
}
