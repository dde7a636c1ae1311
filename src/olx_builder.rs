//! `ProblemState` to OLX rebuilding.
//!
//! The builder is the inverse of the parser for every state the parser can
//! produce. Question, feedback and hint fields hold markup fragments, so
//! they are re-parsed and spliced into the output tree rather than escaped.

use crate::error::BuildError;
use crate::olx_tree::{self, XmlElement, XmlNode, escape_attr};
use crate::types::{Answer, ProblemState, ProblemType};

pub struct OlxBuilder<'a> {
    state: &'a ProblemState,
}

impl<'a> OlxBuilder<'a> {
    pub fn new(state: &'a ProblemState) -> Self {
        OlxBuilder { state }
    }

    /// Rebuild the problem OLX. Advanced problems pass their raw OLX
    /// through untouched; a problem with no type selected cannot be built.
    pub fn build(&self) -> Result<String, BuildError> {
        match self.state.problem_type {
            ProblemType::Advanced => return Ok(self.state.raw_olx.clone()),
            ProblemType::Unset => return Err(BuildError::UnsetProblemType),
            _ => {}
        }

        let mut response = match self.state.problem_type {
            ProblemType::SingleSelect | ProblemType::MultiSelect | ProblemType::Dropdown => {
                self.build_choice_response()?
            }
            ProblemType::TextInput => self.build_string_response()?,
            ProblemType::Numeric => self.build_numerical_response()?,
            ProblemType::Advanced | ProblemType::Unset => unreachable!(),
        };

        // The question goes right after the opening response tag, before
        // the answer widget. Parsing hoists it back out.
        let mut question_nodes = parse_markup(&self.state.question)?;
        restore_descriptions(&mut question_nodes);
        response.children.splice(0..0, question_nodes);

        if let Some(explanation) = &self.state.settings.solution_explanation {
            response.push_element(self.build_solution(explanation)?);
        }

        let mut problem = XmlElement::new("problem");
        problem.push_element(response);
        if !self.state.settings.hints.is_empty() {
            problem.push_element(self.build_demand_hints()?);
        }
        Ok(olx_tree::serialize_element(&problem))
    }

    fn build_choice_response(&self) -> Result<XmlElement, BuildError> {
        let problem_type = self.state.problem_type;
        let (widget_tag, option_tag, hint_tag) = problem_type
            .choice_tags()
            .expect("choice family has widget tags");

        let mut widget = XmlElement::new(widget_tag);
        for answer in &self.state.answers {
            if answer.title.trim().is_empty() {
                continue;
            }
            let mut choice = XmlElement::new(option_tag);
            choice.set_attr("correct", bool_attr(answer.correct));
            if problem_type.is_rich_text() {
                choice.children = parse_markup(&answer.title)?;
            } else {
                choice.push_text(&olx_tree::escape_text(&answer.title));
            }

            let selected = self.selected_feedback_for(answer);
            if problem_type == ProblemType::MultiSelect {
                if let Some(feedback) = selected {
                    let mut hint = XmlElement::new(hint_tag);
                    hint.set_attr("selected", "true");
                    hint.children = parse_markup(&feedback)?;
                    choice.push_element(hint);
                }
                if let Some(feedback) = &answer.unselected_feedback {
                    if !feedback.trim().is_empty() {
                        let mut hint = XmlElement::new(hint_tag);
                        hint.set_attr("selected", "false");
                        hint.children = parse_markup(feedback)?;
                        choice.push_element(hint);
                    }
                }
            } else if let Some(feedback) = selected {
                let mut hint = XmlElement::new(hint_tag);
                hint.children = parse_markup(&feedback)?;
                choice.push_element(hint);
            }
            widget.push_element(choice);
        }

        for group in &self.state.group_feedback_list {
            let mut compound = XmlElement::new("compoundhint");
            compound.set_attr("value", &escape_attr(&group.answers.join(" ")));
            compound.children = parse_markup(&group.feedback)?;
            widget.push_element(compound);
        }

        let tag = problem_type.tag().expect("choice family has a tag");
        let mut response = XmlElement::new(tag);
        response.push_element(widget);
        Ok(response)
    }

    /// Per-answer feedback, refilled from the hoisted general feedback for
    /// incorrect answers that carry none of their own.
    fn selected_feedback_for(&self, answer: &Answer) -> Option<String> {
        let own = answer
            .selected_feedback
            .clone()
            .filter(|f| !f.trim().is_empty());
        if own.is_some() || answer.correct {
            return own;
        }
        match self.state.problem_type {
            ProblemType::SingleSelect | ProblemType::Dropdown => self
                .state
                .general_feedback
                .clone()
                .filter(|f| !f.trim().is_empty()),
            _ => None,
        }
    }

    fn build_string_response(&self) -> Result<XmlElement, BuildError> {
        let mut response = XmlElement::new("stringresponse");
        let answer_type = self
            .state
            .additional_attributes
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("ci");

        let mut correct = self
            .state
            .answers
            .iter()
            .filter(|a| a.correct && !a.title.trim().is_empty());
        let first = correct.next();
        response.set_attr(
            "answer",
            &escape_attr(first.map(|a| a.title.as_str()).unwrap_or_default()),
        );
        response.set_attr("type", &escape_attr(answer_type));

        if let Some(feedback) = first.and_then(|a| a.selected_feedback.as_deref()) {
            if !feedback.trim().is_empty() {
                let mut hint = XmlElement::new("correcthint");
                hint.children = parse_markup(feedback)?;
                response.push_element(hint);
            }
        }
        for answer in correct {
            let mut additional = XmlElement::new("additional_answer");
            additional.set_attr("answer", &escape_attr(&answer.title));
            if let Some(feedback) = &answer.selected_feedback {
                if !feedback.trim().is_empty() {
                    let mut hint = XmlElement::new("correcthint");
                    hint.children = parse_markup(feedback)?;
                    additional.push_element(hint);
                }
            }
            response.push_element(additional);
        }
        for answer in self
            .state
            .answers
            .iter()
            .filter(|a| !a.correct && !a.title.trim().is_empty())
        {
            let mut wrong = XmlElement::new("stringequalhint");
            wrong.set_attr("answer", &escape_attr(&answer.title));
            if let Some(feedback) = &answer.selected_feedback {
                wrong.children = parse_markup(feedback)?;
            }
            response.push_element(wrong);
        }

        let mut textline = XmlElement::new("textline");
        let size = self
            .state
            .additional_attributes
            .get("textline")
            .and_then(|v| v.get("size"))
            .and_then(|v| v.as_str())
            .unwrap_or("20");
        textline.set_attr("size", &escape_attr(size));
        response.push_element(textline);
        Ok(response)
    }

    fn build_numerical_response(&self) -> Result<XmlElement, BuildError> {
        let mut response = XmlElement::new("numericalresponse");
        let mut titled = self
            .state
            .answers
            .iter()
            .filter(|a| !a.title.trim().is_empty());
        let first = titled.next();

        let answer_value = match first {
            Some(a) if a.is_answer_range => sanitize_range(&a.title),
            Some(a) => a.title.clone(),
            None => String::new(),
        };
        response.set_attr("answer", &escape_attr(&answer_value));

        let tolerance = &self.state.settings.tolerance;
        if let Some(value) = tolerance.value.filter(|v| *v != 0.0) {
            let formatted = match tolerance.tolerance_type {
                crate::types::ToleranceType::Percent => Some(format!("{}%", value)),
                crate::types::ToleranceType::Number => Some(value.to_string()),
                crate::types::ToleranceType::None => None,
            };
            if let Some(default) = formatted {
                let mut param = XmlElement::new("responseparam");
                param.set_attr("type", "tolerance");
                param.set_attr("default", &escape_attr(&default));
                response.push_element(param);
            }
        }

        if let Some(feedback) = first.and_then(|a| a.selected_feedback.as_deref()) {
            if !feedback.trim().is_empty() {
                let mut hint = XmlElement::new("correcthint");
                hint.children = parse_markup(feedback)?;
                response.push_element(hint);
            }
        }
        for answer in titled.filter(|a| a.correct) {
            let mut additional = XmlElement::new("additional_answer");
            additional.set_attr("answer", &escape_attr(&answer.title));
            if let Some(feedback) = &answer.selected_feedback {
                if !feedback.trim().is_empty() {
                    let mut hint = XmlElement::new("correcthint");
                    hint.children = parse_markup(feedback)?;
                    additional.push_element(hint);
                }
            }
            response.push_element(additional);
        }

        response.push_element(XmlElement::new("formulaequationinput"));
        Ok(response)
    }

    /// Solution content is wrapped in the conventional div and gets its
    /// "Explanation" title paragraph back.
    fn build_solution(&self, explanation: &str) -> Result<XmlElement, BuildError> {
        let mut title = XmlElement::new("p");
        title.push_text("Explanation");

        let mut div = XmlElement::new("div");
        div.set_attr("class", "detailed-solution");
        div.push_element(title);
        div.children.extend(parse_markup(explanation)?);

        let mut solution = XmlElement::new("solution");
        solution.push_element(div);
        Ok(solution)
    }

    fn build_demand_hints(&self) -> Result<XmlElement, BuildError> {
        let mut demandhint = XmlElement::new("demandhint");
        for hint in &self.state.settings.hints {
            if hint.value.trim().is_empty() {
                continue;
            }
            let mut el = XmlElement::new("hint");
            el.children = parse_markup(&hint.value)?;
            demandhint.push_element(el);
        }
        Ok(demandhint)
    }
}

fn bool_attr(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn parse_markup(fragment: &str) -> Result<Vec<XmlNode>, BuildError> {
    olx_tree::parse_fragment(fragment)
}

/// Undo the editor-facing rename of `<description>` elements.
fn restore_descriptions(nodes: &mut [XmlNode]) {
    for node in nodes {
        if let XmlNode::Element(el) = node {
            if el.name == "em" && el.attr("class") == Some("olx_description") {
                el.name = "description".to_string();
                el.attributes.clear();
            }
            restore_descriptions(&mut el.children);
        }
    }
}

/// Normalize an interval answer so the lower bound comes first. The swap
/// keeps each bound's inclusive/exclusive marker with its value, so
/// `[3/2,-1.3)` becomes `(-1.3,3/2]`. Unparsable input passes through.
fn sanitize_range(title: &str) -> String {
    let Some((raw_lower, raw_upper)) = title.split_once(',') else {
        return title.to_string();
    };
    let lower_number = strip_to_number(raw_lower);
    let upper_number = strip_to_number(raw_upper);
    let (Some(lower_value), Some(upper_value)) =
        (parse_boundary(&lower_number), parse_boundary(&upper_number))
    else {
        return title.to_string();
    };

    let lower_bracket = raw_lower
        .chars()
        .find(|c| matches!(c, '[' | '('))
        .unwrap_or('[');
    let upper_bracket = raw_upper
        .chars()
        .rev()
        .find(|c| matches!(c, ']' | ')'))
        .unwrap_or(']');

    if lower_value > upper_value {
        format!(
            "{}{},{}{}",
            flip_bracket(upper_bracket),
            upper_number,
            lower_number,
            flip_bracket(lower_bracket),
        )
    } else {
        format!(
            "{}{},{}{}",
            lower_bracket, lower_number, upper_number, upper_bracket
        )
    }
}

fn strip_to_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '.' | '/'))
        .collect()
}

/// A boundary is a decimal or a simple fraction like `3/2`.
fn parse_boundary(number: &str) -> Option<f64> {
    match number.split_once('/') {
        Some((numerator, denominator)) => {
            let n: f64 = numerator.parse().ok()?;
            let d: f64 = denominator.parse().ok()?;
            if d == 0.0 { None } else { Some(n / d) }
        }
        None => number.parse().ok(),
    }
}

fn flip_bracket(bracket: char) -> char {
    match bracket {
        '[' => ']',
        ']' => '[',
        '(' => ')',
        ')' => '(',
        other => other,
    }
}
