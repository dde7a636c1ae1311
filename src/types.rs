//! Core data structures for the OLX problem editor.
//!
//! `ProblemState` is the normalized in-memory model: produced once by the
//! OLX parser at load time, mutated in place by the editing surface, and
//! consumed by the builder and save gate at save intent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::MAX_ANSWER_COUNT;

/// Response tags the visual editor can reconstruct losslessly. Anything
/// else falls back to advanced (raw text) editing.
pub const RESPONSE_TAGS: [&str; 5] = [
    "multiplechoiceresponse",
    "choiceresponse",
    "optionresponse",
    "numericalresponse",
    "stringresponse",
];

/// The wider family of OLX response tags. Children of these are inspected
/// for question content even when the tag itself is not editable.
pub const RESPONSE_FAMILY_TAGS: [&str; 14] = [
    "multiplechoiceresponse",
    "choiceresponse",
    "optionresponse",
    "numericalresponse",
    "stringresponse",
    "truefalseresponse",
    "customresponse",
    "symbolicresponse",
    "coderesponse",
    "externalresponse",
    "formularesponse",
    "schematicresponse",
    "imageresponse",
    "annotationresponse",
];

/// Structural tags that are never part of the question text.
pub const NON_QUESTION_TAGS: [&str; 16] = [
    "additional_answer",
    "checkboxgroup",
    "choicegroup",
    "choiceresponse",
    "correcthint",
    "demandhint",
    "formulaequationinput",
    "multiplechoiceresponse",
    "numericalresponse",
    "optioninput",
    "optionresponse",
    "responseparam",
    "solution",
    "stringequalhint",
    "stringresponse",
    "textline",
];

/// `<problem>` attributes that carry settings rather than content.
pub const SETTINGS_OLX_ATTRIBUTES: [&str; 7] = [
    "display_name",
    "weight",
    "max_attempts",
    "showanswer",
    "show_reset_button",
    "submission_wait_seconds",
    "attempts_before_showanswer_button",
];

/// `<problem>` attributes the parser tolerates without interpreting.
pub const IGNORED_OLX_ATTRIBUTES: [&str; 2] = ["url_name", "x-is-pointer-node"];

/// Letter id for the answer at `index`. Callers keep `index` below
/// [`MAX_ANSWER_COUNT`].
pub fn letter_at(index: usize) -> String {
    debug_assert!(index < MAX_ANSWER_COUNT);
    ((b'A' + index as u8) as char).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemType {
    #[serde(rename = "multiplechoiceresponse")]
    SingleSelect,
    #[serde(rename = "choiceresponse")]
    MultiSelect,
    #[serde(rename = "optionresponse")]
    Dropdown,
    #[serde(rename = "numericalresponse")]
    Numeric,
    #[serde(rename = "stringresponse")]
    TextInput,
    #[serde(rename = "advanced")]
    Advanced,
    /// A blank problem (`<problem></problem>`). A signal to the editor to
    /// prompt for type selection, never parsed further.
    #[serde(rename = "unset")]
    Unset,
}

impl ProblemType {
    /// The OLX response tag for this family, if it has one.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            ProblemType::SingleSelect => Some("multiplechoiceresponse"),
            ProblemType::MultiSelect => Some("choiceresponse"),
            ProblemType::Dropdown => Some("optionresponse"),
            ProblemType::Numeric => Some("numericalresponse"),
            ProblemType::TextInput => Some("stringresponse"),
            ProblemType::Advanced | ProblemType::Unset => None,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "multiplechoiceresponse" => Some(ProblemType::SingleSelect),
            "choiceresponse" => Some(ProblemType::MultiSelect),
            "optionresponse" => Some(ProblemType::Dropdown),
            "numericalresponse" => Some(ProblemType::Numeric),
            "stringresponse" => Some(ProblemType::TextInput),
            _ => None,
        }
    }

    /// Single-select and multi-select answer titles carry markup; dropdown
    /// titles are plain text.
    pub fn is_rich_text(&self) -> bool {
        matches!(self, ProblemType::SingleSelect | ProblemType::MultiSelect)
    }

    /// Widget, answer and per-answer hint tag names for the choice families.
    pub fn choice_tags(&self) -> Option<(&'static str, &'static str, &'static str)> {
        match self {
            ProblemType::SingleSelect => Some(("choicegroup", "choice", "choicehint")),
            ProblemType::MultiSelect => Some(("checkboxgroup", "choice", "choicehint")),
            ProblemType::Dropdown => Some(("optioninput", "option", "optionhint")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Letter id, `A` through `Z`, contiguous in document order.
    pub id: String,
    /// Markup fragment for rich-text families, plain text otherwise.
    pub title: String,
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unselected_feedback: Option<String>,
    /// Numeric only: the title encodes an interval rather than one value.
    #[serde(default)]
    pub is_answer_range: bool,
    /// Numeric only: raw tolerance attached to the response element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_param: Option<String>,
}

impl Answer {
    pub fn new(id: String, title: String, correct: bool) -> Self {
        Answer {
            id,
            title,
            correct,
            selected_feedback: None,
            unselected_feedback: None,
            is_answer_range: false,
            tolerance_param: None,
        }
    }

    /// A blank answer as created by the editing surface.
    pub fn blank(id: String, correct: bool) -> Self {
        Answer::new(id, String::new(), correct)
    }
}

/// Feedback tied to a specific combination of selected answers
/// (multi-select only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFeedback {
    pub id: usize,
    /// Letter ids of the answers the feedback applies to, in source order.
    pub answers: Vec<String>,
    pub feedback: String,
}

/// A learner-triggered, ordered hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub id: usize,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShowAnswerType {
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "answered")]
    Answered,
    #[serde(rename = "attempted")]
    Attempted,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "correct_or_past_due")]
    CorrectOrPastDue,
    #[serde(rename = "past_due")]
    PastDue,
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "after_attempts")]
    AfterAttempts,
    #[serde(rename = "after_all_attempts")]
    AfterAllAttempts,
    #[serde(rename = "after_all_attempts_or_correct")]
    AfterAllAttemptsOrCorrect,
    #[serde(rename = "attempted_no_past_due")]
    AttemptedNoPastDue,
}

impl ShowAnswerType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "always" => Some(Self::Always),
            "answered" => Some(Self::Answered),
            "attempted" => Some(Self::Attempted),
            "closed" => Some(Self::Closed),
            "finished" => Some(Self::Finished),
            "correct_or_past_due" => Some(Self::CorrectOrPastDue),
            "past_due" => Some(Self::PastDue),
            "never" => Some(Self::Never),
            "after_attempts" => Some(Self::AfterAttempts),
            "after_all_attempts" => Some(Self::AfterAllAttempts),
            "after_all_attempts_or_correct" => Some(Self::AfterAllAttemptsOrCorrect),
            "attempted_no_past_due" => Some(Self::AttemptedNoPastDue),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Answered => "answered",
            Self::Attempted => "attempted",
            Self::Closed => "closed",
            Self::Finished => "finished",
            Self::CorrectOrPastDue => "correct_or_past_due",
            Self::PastDue => "past_due",
            Self::Never => "never",
            Self::AfterAttempts => "after_attempts",
            Self::AfterAllAttempts => "after_all_attempts",
            Self::AfterAllAttemptsOrCorrect => "after_all_attempts_or_correct",
            Self::AttemptedNoPastDue => "attempted_no_past_due",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RandomizationType {
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "always")]
    Always,
    #[serde(rename = "onreset")]
    OnReset,
    #[serde(rename = "per_student")]
    PerStudent,
}

impl RandomizationType {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "never" => Some(Self::Never),
            "always" => Some(Self::Always),
            "onreset" => Some(Self::OnReset),
            "per_student" => Some(Self::PerStudent),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Always => "always",
            Self::OnReset => "onreset",
            Self::PerStudent => "per_student",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToleranceType {
    Percent,
    Number,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    #[serde(rename = "type")]
    pub tolerance_type: ToleranceType,
    pub value: Option<f64>,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            tolerance_type: ToleranceType::None,
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempts {
    /// `None` means "use the platform default".
    pub number: Option<i64>,
    /// `true` only when neither the block nor the platform sets a limit.
    pub unlimited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    pub weight: f64,
    pub attempts: Attempts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowAnswer {
    pub on: Option<ShowAnswerType>,
    pub after_attempts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub scoring: Scoring,
    pub show_answer: ShowAnswer,
    pub randomization: Option<RandomizationType>,
    pub show_reset_button: Option<bool>,
    /// Seconds a learner must wait between submissions.
    pub time_between: i64,
    pub tolerance: Tolerance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution_explanation: Option<String>,
    pub hints: Vec<Hint>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scoring: Scoring {
                weight: 1.0,
                attempts: Attempts {
                    number: None,
                    unlimited: true,
                },
            },
            show_answer: ShowAnswer {
                on: None,
                after_attempts: 0,
            },
            randomization: None,
            show_reset_button: None,
            time_between: 0,
            tolerance: Tolerance::default(),
            solution_explanation: None,
            hints: Vec::new(),
        }
    }
}

/// The normalized in-memory problem model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemState {
    pub problem_type: ProblemType,
    /// Markup fragment shown above the answer widget.
    pub question: String,
    pub answers: Vec<Answer>,
    pub group_feedback_list: Vec<GroupFeedback>,
    /// Shared feedback hoisted from identical incorrect-answer feedback
    /// (single-select and dropdown only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_feedback: Option<String>,
    /// Response attributes the widget preserves without editing,
    /// e.g. `type` and `textline.size` of a string response.
    pub additional_attributes: Map<String, Value>,
    pub settings: Settings,
    /// The source OLX, retained verbatim. The only populated field for
    /// advanced problems.
    pub raw_olx: String,
}

impl ProblemState {
    pub fn unset(raw_olx: &str) -> Self {
        ProblemState {
            problem_type: ProblemType::Unset,
            question: String::new(),
            answers: Vec::new(),
            group_feedback_list: Vec::new(),
            general_feedback: None,
            additional_attributes: Map::new(),
            settings: Settings::default(),
            raw_olx: raw_olx.to_string(),
        }
    }

    pub fn advanced(raw_olx: &str) -> Self {
        ProblemState {
            problem_type: ProblemType::Advanced,
            ..ProblemState::unset(raw_olx)
        }
    }

    /// Append a blank answer with the next letter id. No-op once the
    /// letter ids are exhausted. Numeric answers are correct by definition.
    pub fn add_answer(&mut self) {
        if self.answers.len() >= MAX_ANSWER_COUNT {
            return;
        }
        let correct = self.problem_type == ProblemType::Numeric;
        let id = letter_at(self.answers.len());
        self.answers.push(Answer::blank(id, correct));
    }

    /// Replace the whole answer list with a single range answer. A numeric
    /// problem holds at most one answer range at a time.
    pub fn add_answer_range(&mut self) {
        let mut answer = Answer::blank("A".to_string(), self.problem_type == ProblemType::Numeric);
        answer.is_answer_range = true;
        self.answers = vec![answer];
    }

    /// Remove the answer with the given letter id, re-deriving ids so they
    /// stay contiguous from `A`, and remapping group feedback letter sets.
    /// Removing the last remaining answer resets to one blank answer.
    pub fn delete_answer(&mut self, id: &str) {
        if self.answers.len() <= 1 {
            let correct = self.problem_type == ProblemType::Numeric;
            self.answers = vec![Answer::blank("A".to_string(), correct)];
            return;
        }
        let Some(removed) = id.chars().next() else {
            return;
        };
        self.answers.retain(|a| a.id != id);
        for (index, answer) in self.answers.iter_mut().enumerate() {
            answer.id = letter_at(index);
        }
        for feedback in self.group_feedback_list.iter_mut() {
            feedback.answers.retain(|letter| letter != id);
            for letter in feedback.answers.iter_mut() {
                if let Some(c) = letter.chars().next() {
                    if c > removed {
                        *letter = ((c as u8 - 1) as char).to_string();
                    }
                }
            }
        }
    }
}
