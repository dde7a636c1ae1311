//! OLX to `ProblemState` parsing.
//!
//! The classifier decides which of the six problem families a `<problem>`
//! document belongs to; the per-family extraction rules then build the
//! normalized state. Any structure the visual editor could not rebuild
//! losslessly raises a `StructuralParseError`, and the caller falls back
//! to advanced (raw text) editing with the source kept verbatim.

use serde_json::{Map, Value};

use crate::error::StructuralParseError;
use crate::olx_tree::{self, XmlElement, XmlNode};
use crate::types::{
    Answer, GroupFeedback, Hint, ProblemState, ProblemType, Tolerance, ToleranceType,
    IGNORED_OLX_ATTRIBUTES, NON_QUESTION_TAGS, RESPONSE_FAMILY_TAGS, SETTINGS_OLX_ATTRIBUTES,
    letter_at,
};

lazy_static::lazy_static! {
    /// An interval answer: a bracket/parenthesis pair around a comma,
    /// e.g. `[10,20]` or `(-1.3,3/2]`.
    static ref ANSWER_RANGE_RE: regex::Regex =
        regex::Regex::new(r"[\[(]\s*-?[0-9./]*\s*,\s*-?[0-9./]*\s*[\])]").unwrap();
}

/// Parse OLX into a `ProblemState`, falling back to advanced editing when
/// the structure cannot be represented by the visual builder. The raw OLX
/// is always retained verbatim on the returned state.
pub fn parse_olx(olx: &str) -> ProblemState {
    match OlxParser::new(olx).and_then(|parser| parser.parse()) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("OLX not editable visually, falling back to raw text: {}", e);
            ProblemState::advanced(olx)
        }
    }
}

pub struct OlxParser {
    root: XmlElement,
    raw: String,
}

impl OlxParser {
    pub fn new(olx: &str) -> Result<Self, StructuralParseError> {
        let root = olx_tree::parse_document(olx)?;
        if root.name != "problem" {
            return Err(StructuralParseError::NotAProblem(root.name));
        }
        Ok(OlxParser {
            root,
            raw: olx.to_string(),
        })
    }

    /// Classify the document into one of the six problem families.
    ///
    /// Exactly one known response element as a direct child gives its
    /// family. Zero known elements in an otherwise empty problem is the
    /// blank (`Unset`) state. Everything else - repeated siblings, several
    /// distinct response elements, or unknown content - is `Advanced`,
    /// because only a single well-known response shape can be rebuilt
    /// without data loss.
    pub fn problem_type(&self) -> ProblemType {
        let matches: Vec<ProblemType> = self
            .root
            .child_elements()
            .filter_map(|el| ProblemType::from_tag(&el.name))
            .collect();
        match matches.len() {
            0 => {
                if self.root.children.iter().all(XmlNode::is_whitespace_text) {
                    ProblemType::Unset
                } else {
                    ProblemType::Advanced
                }
            }
            1 => matches[0],
            _ => ProblemType::Advanced,
        }
    }

    pub fn parse(&self) -> Result<ProblemState, StructuralParseError> {
        self.screen_problem_attributes()?;

        let problem_type = self.problem_type();
        match problem_type {
            ProblemType::Unset => return Ok(ProblemState::unset(&self.raw)),
            ProblemType::Advanced => return Ok(ProblemState::advanced(&self.raw)),
            _ => {}
        }

        // A deliberate safety bail-out: scripts can change grading in ways
        // the visual editor cannot see.
        if self.root.contains_tag("script") {
            return Err(StructuralParseError::ScriptTag);
        }
        self.check_content_after_response(problem_type)?;

        let mut state = ProblemState::unset(&self.raw);
        state.problem_type = problem_type;
        state.question = self.parse_question();

        match problem_type {
            ProblemType::SingleSelect | ProblemType::MultiSelect | ProblemType::Dropdown => {
                let (answers, group_feedback) = self.parse_choice_answers(problem_type)?;
                state.answers = answers;
                state.group_feedback_list = group_feedback;
            }
            ProblemType::TextInput => {
                let (answers, additional) = self.parse_string_response()?;
                state.answers = answers;
                state.additional_attributes = additional;
            }
            ProblemType::Numeric => {
                state.answers = self.parse_numeric_response()?;
            }
            ProblemType::Advanced | ProblemType::Unset => unreachable!(),
        }

        state.settings.hints = self.parse_hints();
        state.settings.solution_explanation = self.parse_solution_explanation(problem_type);
        if problem_type == ProblemType::Numeric {
            state.settings.tolerance = tolerance_from_answers(&state.answers);
        }
        state.general_feedback = general_feedback(&state.answers, problem_type);
        Ok(state)
    }

    fn screen_problem_attributes(&self) -> Result<(), StructuralParseError> {
        for (key, _) in &self.root.attributes {
            if !SETTINGS_OLX_ATTRIBUTES.contains(&key.as_str())
                && !IGNORED_OLX_ATTRIBUTES.contains(&key.as_str())
            {
                return Err(StructuralParseError::UnrecognizedProblemAttribute(
                    key.clone(),
                ));
            }
        }
        Ok(())
    }

    /// The visual families never place content after the response element
    /// (other than structural tags like `<demandhint>`).
    fn check_content_after_response(
        &self,
        problem_type: ProblemType,
    ) -> Result<(), StructuralParseError> {
        let tag = problem_type.tag().expect("visual family has a tag");
        let response_index = self
            .root
            .children
            .iter()
            .position(|n| n.as_element().is_some_and(|el| el.name == tag));
        let Some(response_index) = response_index else {
            return Ok(());
        };
        for node in &self.root.children[response_index + 1..] {
            match node {
                XmlNode::Text(t) if t.trim().is_empty() => {}
                XmlNode::Text(_) => {
                    return Err(StructuralParseError::ContentAfterResponse(tag.to_string()));
                }
                XmlNode::Element(el) => {
                    if !NON_QUESTION_TAGS.contains(&el.name.as_str()) {
                        return Err(StructuralParseError::ContentAfterResponse(tag.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    fn response_element(&self, problem_type: ProblemType) -> Option<&XmlElement> {
        problem_type
            .tag()
            .and_then(|tag| self.root.first_child_named(tag))
    }

    /// Question extraction walks the order-preserving tree: determining
    /// what belongs to the question depends on sibling order. Anything not
    /// in the structural denylist is question content, and response
    /// elements contribute their own non-structural children (label,
    /// description, tables and so on, which are valid OLX in both
    /// positions). Descriptions render as emphasis in the editor.
    fn parse_question(&self) -> String {
        let mut nodes: Vec<XmlNode> = Vec::new();
        for node in &self.root.children {
            match node {
                XmlNode::Text(t) => {
                    if !t.trim().is_empty() {
                        nodes.push(node.clone());
                    }
                }
                XmlNode::Element(el) => {
                    if !NON_QUESTION_TAGS.contains(&el.name.as_str()) {
                        nodes.push(XmlNode::Element(rewrite_descriptions(el)));
                    } else if RESPONSE_FAMILY_TAGS.contains(&el.name.as_str()) {
                        for sub in &el.children {
                            match sub {
                                XmlNode::Text(t) => {
                                    if !t.trim().is_empty() {
                                        nodes.push(sub.clone());
                                    }
                                }
                                XmlNode::Element(sub_el) => {
                                    if !NON_QUESTION_TAGS.contains(&sub_el.name.as_str()) {
                                        nodes.push(XmlNode::Element(rewrite_descriptions(sub_el)));
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        olx_tree::serialize_nodes(&nodes)
    }

    /// Choice and option extraction for the three choice-based families.
    fn parse_choice_answers(
        &self,
        problem_type: ProblemType,
    ) -> Result<(Vec<Answer>, Vec<GroupFeedback>), StructuralParseError> {
        let (widget_tag, option_tag, hint_tag) = problem_type
            .choice_tags()
            .expect("choice family has widget tags");
        let response = match self.response_element(problem_type) {
            Some(el) => el,
            None => return Ok((vec![Answer::blank("A".to_string(), true)], Vec::new())),
        };
        if response.attr("partial_credit").is_some() {
            return Err(StructuralParseError::PartialCredit);
        }
        let widget = match response.first_child_named(widget_tag) {
            Some(el) => el,
            None => return Ok((vec![Answer::blank("A".to_string(), true)], Vec::new())),
        };

        // Unknown structure must never be silently discarded.
        for (key, _) in &widget.attributes {
            if key != "type" {
                return Err(StructuralParseError::DisallowedWidgetAttribute(key.clone()));
            }
        }
        for el in widget.child_elements() {
            if el.name != option_tag && el.name != "compoundhint" {
                return Err(StructuralParseError::DisallowedChildTag(el.name.clone()));
            }
        }

        let mut answers = Vec::new();
        for choice in widget.children_named(option_tag) {
            let raw_correct = choice
                .attr_unescaped("correct")
                .ok_or(StructuralParseError::MissingCorrectAttribute)?;
            let mut answer = Answer::new(
                letter_at(answers.len()),
                choice_title(choice, hint_tag, problem_type),
                parse_bool_attr(&raw_correct)?,
            );
            for hint in choice.children_named(hint_tag) {
                let feedback = olx_tree::serialize_children(hint);
                // Absence of the selected attribute means selected feedback.
                let selected = match hint.attr_unescaped("selected") {
                    None => true,
                    Some(v) => parse_bool_attr(&v)?,
                };
                if selected {
                    answer.selected_feedback = Some(feedback);
                } else {
                    answer.unselected_feedback = Some(feedback);
                }
            }
            answers.push(answer);
        }
        if answers.is_empty() {
            answers.push(Answer::blank("A".to_string(), true));
        }

        let mut group_feedback = Vec::new();
        for compound in widget.children_named("compoundhint") {
            let letters = compound
                .attr_unescaped("value")
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            group_feedback.push(GroupFeedback {
                id: group_feedback.len(),
                answers: letters,
                feedback: olx_tree::serialize_children(compound).trim().to_string(),
            });
        }
        Ok((answers, group_feedback))
    }

    /// String response extraction. The first accepted answer lives on the
    /// response element's own answer attribute; further accepted answers
    /// come from `<additional_answer>` children, and known-wrong answers
    /// with feedback from `<stringequalhint>`.
    fn parse_string_response(
        &self,
    ) -> Result<(Vec<Answer>, Map<String, Value>), StructuralParseError> {
        let response = self
            .response_element(ProblemType::TextInput)
            .expect("classified as string response");
        let mut answers = Vec::new();

        let mut first = Answer::new(
            letter_at(0),
            response.attr_unescaped("answer").unwrap_or_default(),
            true,
        );
        first.selected_feedback = response
            .first_child_named("correcthint")
            .map(olx_tree::serialize_children);
        answers.push(first);

        for additional in response.children_named("additional_answer") {
            let mut answer = Answer::new(
                letter_at(answers.len()),
                additional.attr_unescaped("answer").unwrap_or_default(),
                true,
            );
            answer.selected_feedback = additional
                .first_child_named("correcthint")
                .map(olx_tree::serialize_children);
            answers.push(answer);
        }

        for wrong in response.children_named("stringequalhint") {
            let mut answer = Answer::new(
                letter_at(answers.len()),
                wrong.attr_unescaped("answer").unwrap_or_default(),
                false,
            );
            answer.selected_feedback = Some(olx_tree::serialize_children(wrong));
            answers.push(answer);
        }

        let mut additional_attributes = Map::new();
        if let Some(kind) = response.attr_unescaped("type") {
            additional_attributes.insert("type".to_string(), Value::String(kind));
        }
        if let Some(size) = response
            .first_child_named("textline")
            .and_then(|el| el.attr_unescaped("size"))
        {
            let mut textline = Map::new();
            textline.insert("size".to_string(), Value::String(size));
            additional_attributes.insert("textline".to_string(), Value::Object(textline));
        }
        Ok((answers, additional_attributes))
    }

    /// Numeric response extraction: tolerance from `<responseparam>`,
    /// range detection on the primary answer, additional accepted answers
    /// from `<additional_answer>` children.
    fn parse_numeric_response(&self) -> Result<Vec<Answer>, StructuralParseError> {
        let response = self
            .response_element(ProblemType::Numeric)
            .expect("classified as numeric response");
        if response.attr("partial_credit").is_some() {
            return Err(StructuralParseError::PartialCredit);
        }
        let mut answers = Vec::new();

        let title = response.attr_unescaped("answer").unwrap_or_default();
        let mut first = Answer::new(letter_at(0), title.clone(), true);
        first.is_answer_range = ANSWER_RANGE_RE.is_match(&title);
        first.selected_feedback = response
            .first_child_named("correcthint")
            .map(olx_tree::serialize_children);
        first.tolerance_param = response
            .children_named("responseparam")
            .find(|el| el.attr_unescaped("type").as_deref() == Some("tolerance"))
            .and_then(|el| el.attr_unescaped("default"));
        answers.push(first);

        for additional in response.children_named("additional_answer") {
            let mut answer = Answer::new(
                letter_at(answers.len()),
                additional.attr_unescaped("answer").unwrap_or_default(),
                true,
            );
            answer.selected_feedback = additional
                .first_child_named("correcthint")
                .map(olx_tree::serialize_children);
            answers.push(answer);
        }
        Ok(answers)
    }

    /// Demand hints may be absent, one node or repeated; all shapes
    /// normalize to one ordered list.
    fn parse_hints(&self) -> Vec<Hint> {
        let mut hints = Vec::new();
        for demandhint in self.root.children_named("demandhint") {
            for hint in demandhint.children_named("hint") {
                hints.push(Hint {
                    id: hints.len(),
                    value: olx_tree::serialize_children(hint),
                });
            }
        }
        hints
    }

    /// Solution content, minus the conventional "Explanation" title the
    /// builder re-inserts. The stripping only fires when the solution
    /// wraps its content in a div whose first element reads exactly
    /// "Explanation"; any other shape passes through unchanged.
    fn parse_solution_explanation(&self, problem_type: ProblemType) -> Option<String> {
        let solution = self
            .response_element(problem_type)
            .and_then(|el| el.first_child_named("solution"))
            .or_else(|| self.root.first_child_named("solution"))?;

        let content: Vec<XmlNode> = match solution.child_elements().find(|el| el.name == "div") {
            Some(div) => {
                let explanation_index = div
                    .children
                    .iter()
                    .position(|n| n.as_element().is_some())
                    .filter(|&i| {
                        div.children[i]
                            .as_element()
                            .is_some_and(|el| el.deep_text().trim() == "Explanation")
                    });
                div.children
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != explanation_index)
                    .map(|(_, n)| n.clone())
                    .collect()
            }
            None => solution.children.clone(),
        };
        let text = olx_tree::serialize_nodes(&content);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Strict boolean attribute lookup. The source dialect writes `true` and
/// `false` in assorted casing; anything else is unclassifiable structure.
fn parse_bool_attr(raw: &str) -> Result<bool, StructuralParseError> {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(StructuralParseError::InvalidBooleanAttribute(
            raw.to_string(),
        )),
    }
}

/// Answer title for a choice node: rich families keep all child markup
/// except per-answer hints, dropdown titles are plain text.
fn choice_title(choice: &XmlElement, hint_tag: &str, problem_type: ProblemType) -> String {
    if problem_type.is_rich_text() {
        let kept: Vec<XmlNode> = choice
            .children
            .iter()
            .filter(|n| !n.as_element().is_some_and(|el| el.name == hint_tag))
            .cloned()
            .collect();
        olx_tree::serialize_nodes(&kept).trim().to_string()
    } else {
        choice.text_content().trim().to_string()
    }
}

/// Rename `<description>` to an emphasis tag the editor styles, at any
/// depth. The builder applies the inverse rewrite.
fn rewrite_descriptions(el: &XmlElement) -> XmlElement {
    let mut out = el.clone();
    if out.name == "description" {
        out.name = "em".to_string();
        out.attributes = vec![("class".to_string(), "olx_description".to_string())];
    }
    out.children = out
        .children
        .iter()
        .map(|n| match n {
            XmlNode::Element(child) => XmlNode::Element(rewrite_descriptions(child)),
            XmlNode::Text(t) => XmlNode::Text(t.clone()),
        })
        .collect();
    out
}

fn tolerance_from_answers(answers: &[Answer]) -> Tolerance {
    let Some(param) = answers.first().and_then(|a| a.tolerance_param.as_deref()) else {
        return Tolerance::default();
    };
    let trimmed = param.trim();
    if trimmed.is_empty() {
        return Tolerance::default();
    }
    let (digits, tolerance_type) = match trimmed.strip_suffix('%') {
        Some(rest) => (rest, ToleranceType::Percent),
        None => (trimmed, ToleranceType::Number),
    };
    match digits.trim().parse::<f64>() {
        Ok(value) => Tolerance {
            tolerance_type,
            value: Some(value),
        },
        Err(_) => {
            tracing::debug!("unparsable tolerance value dropped: {:?}", param);
            Tolerance::default()
        }
    }
}

/// Feedback generalizes when the problem is single-select or dropdown and
/// every incorrect answer carries the same selected feedback. This is
/// deduplication, not loss: per-answer feedback stays on the answers.
fn general_feedback(answers: &[Answer], problem_type: ProblemType) -> Option<String> {
    if !matches!(
        problem_type,
        ProblemType::SingleSelect | ProblemType::Dropdown
    ) {
        return None;
    }
    let first_incorrect = answers.iter().find(|a| !a.correct)?;
    let feedback = first_incorrect.selected_feedback.clone()?;
    let all_same = answers
        .iter()
        .filter(|a| !a.correct)
        .all(|a| a.selected_feedback.as_deref() == Some(feedback.as_str()));
    if all_same { Some(feedback) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_attr_is_strict() {
        assert!(parse_bool_attr("true").unwrap());
        assert!(parse_bool_attr("True").unwrap());
        assert!(!parse_bool_attr("FALSE").unwrap());
        assert!(parse_bool_attr("1").is_err());
        assert!(parse_bool_attr("yes").is_err());
    }

    #[test]
    fn test_answer_range_pattern() {
        assert!(ANSWER_RANGE_RE.is_match("[10,20]"));
        assert!(ANSWER_RANGE_RE.is_match("(1.5, 2]"));
        assert!(ANSWER_RANGE_RE.is_match("[3/2,-1.3)"));
        assert!(!ANSWER_RANGE_RE.is_match("100"));
        assert!(!ANSWER_RANGE_RE.is_match("10,20"));
    }
}
