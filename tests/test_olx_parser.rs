/// OLX parsing and classification tests.

use pretty_assertions::assert_eq;

use olx_problem_editor::olx_parser::{parse_olx, OlxParser};
use olx_problem_editor::types::{ProblemType, ToleranceType};

mod helpers;
use helpers as h;

fn classify(olx: &str) -> ProblemType {
    OlxParser::new(olx).expect("document should parse").problem_type()
}

#[test]
fn test_classifier_recognizes_each_family() {
    h::setup();

    assert_eq!(classify(h::CHECKBOX_OLX), ProblemType::MultiSelect);
    assert_eq!(classify(h::SINGLE_SELECT_OLX), ProblemType::SingleSelect);
    assert_eq!(classify(h::DROPDOWN_OLX), ProblemType::Dropdown);
    assert_eq!(classify(h::NUMERIC_OLX), ProblemType::Numeric);
    assert_eq!(classify(h::TEXT_INPUT_OLX), ProblemType::TextInput);
}

#[test]
fn test_blank_problem_is_unset() {
    h::setup();

    assert_eq!(classify(h::BLANK_OLX), ProblemType::Unset);
    assert_eq!(classify("<problem>\n  \n</problem>"), ProblemType::Unset);

    let state = parse_olx(h::BLANK_OLX);
    assert_eq!(state.problem_type, ProblemType::Unset);
    assert!(state.answers.is_empty());
}

#[test]
fn test_unknown_response_is_advanced() {
    h::setup();

    assert_eq!(classify(h::ADVANCED_OLX), ProblemType::Advanced);

    let state = parse_olx(h::ADVANCED_OLX);
    assert_eq!(state.problem_type, ProblemType::Advanced);
    assert_eq!(state.raw_olx, h::ADVANCED_OLX);
    assert!(state.answers.is_empty());
    assert!(state.question.is_empty());
}

#[test]
fn test_repeated_response_elements_are_advanced() {
    h::setup();

    assert_eq!(classify(h::MULTIPLE_RESPONSES_OLX), ProblemType::Advanced);
}

#[test]
fn test_script_tag_falls_back_to_advanced() {
    h::setup();

    let state = parse_olx(h::SCRIPT_OLX);
    assert_eq!(state.problem_type, ProblemType::Advanced);
    assert_eq!(state.raw_olx, h::SCRIPT_OLX);
}

#[test]
fn test_unrecognized_problem_attribute_falls_back_to_advanced() {
    h::setup();

    let olx = r#"<problem custom_grader="yes"><stringresponse answer="x"><textline size="20"/></stringresponse></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(state.problem_type, ProblemType::Advanced);
    assert_eq!(state.raw_olx, olx);
}

#[test]
fn test_settings_attributes_on_problem_are_tolerated() {
    h::setup();

    let olx = r#"<problem display_name="Quiz" max_attempts="3" url_name="abc"><stringresponse answer="x"><textline size="20"/></stringresponse></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(state.problem_type, ProblemType::TextInput);
}

#[test]
fn test_content_after_response_falls_back_to_advanced() {
    h::setup();

    let olx = r#"<problem><multiplechoiceresponse><choicegroup><choice correct="true">a</choice></choicegroup></multiplechoiceresponse><p>trailing content</p></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(state.problem_type, ProblemType::Advanced);
}

#[test]
fn test_partial_credit_falls_back_to_advanced() {
    h::setup();

    let olx = r#"<problem><choiceresponse partial_credit="EDC"><checkboxgroup><choice correct="true">a</choice></checkboxgroup></choiceresponse></problem>"#;
    assert_eq!(parse_olx(olx).problem_type, ProblemType::Advanced);
}

#[test]
fn test_unknown_widget_child_falls_back_to_advanced() {
    h::setup();

    let olx = r#"<problem><multiplechoiceresponse><choicegroup><choice correct="true">a</choice><customtag/></choicegroup></multiplechoiceresponse></problem>"#;
    assert_eq!(parse_olx(olx).problem_type, ProblemType::Advanced);
}

#[test]
fn test_malformed_document_falls_back_to_advanced() {
    h::setup();

    let olx = "<problem><p>unclosed";
    let state = parse_olx(olx);
    assert_eq!(state.problem_type, ProblemType::Advanced);
    assert_eq!(state.raw_olx, olx);
}

#[test]
fn test_checkbox_answers_and_group_feedback() {
    h::setup();

    let state = parse_olx(h::CHECKBOX_OLX);
    assert_eq!(state.problem_type, ProblemType::MultiSelect);
    assert_eq!(state.answers.len(), 4);

    let ids: Vec<&str> = state.answers.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);
    let titles: Vec<&str> = state.answers.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["7", "9", "11", "15"]);
    let correct: Vec<bool> = state.answers.iter().map(|a| a.correct).collect();
    assert_eq!(correct, vec![true, false, true, false]);

    assert_eq!(
        state.answers[0].selected_feedback.as_deref(),
        Some("Yes, 7 is prime.")
    );
    assert_eq!(
        state.answers[0].unselected_feedback.as_deref(),
        Some("Look at 7 again.")
    );
    assert_eq!(state.answers[1].selected_feedback, None);

    assert_eq!(state.group_feedback_list.len(), 2);
    assert_eq!(state.group_feedback_list[0].answers, vec!["A", "C"]);
    assert_eq!(state.group_feedback_list[0].feedback, "You found both primes.");
    assert_eq!(state.group_feedback_list[1].answers, vec!["B", "D"]);
}

#[test]
fn test_question_hoists_label_and_description() {
    h::setup();

    let state = parse_olx(h::CHECKBOX_OLX);
    assert_eq!(
        state.question,
        "<label>Which of these numbers are prime?</label><em class=\"olx_description\">Select all that apply.</em>"
    );
}

#[test]
fn test_question_keeps_content_before_the_response() {
    h::setup();

    let state = parse_olx(h::DROPDOWN_OLX);
    assert_eq!(
        state.question,
        "<p>France has one capital city.</p><label>Which city is it?</label>"
    );
}

#[test]
fn test_solution_explanation_title_is_stripped() {
    h::setup();

    let state = parse_olx(h::CHECKBOX_OLX);
    let explanation = state.settings.solution_explanation.expect("solution present");
    assert_eq!(
        explanation.trim(),
        "<p>7 and 11 have no divisors besides 1 and themselves.</p>"
    );
}

#[test]
fn test_solution_without_explanation_title_passes_through() {
    h::setup();

    let olx = r#"<problem><numericalresponse answer="4"><solution><p>Two plus two.</p></solution><formulaequationinput/></numericalresponse></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(
        state.settings.solution_explanation.as_deref(),
        Some("<p>Two plus two.</p>")
    );
}

#[test]
fn test_demand_hints_keep_order() {
    h::setup();

    let state = parse_olx(h::CHECKBOX_OLX);
    let values: Vec<&str> = state
        .settings
        .hints
        .iter()
        .map(|hint| hint.value.as_str())
        .collect();
    assert_eq!(
        values,
        vec![
            "Check divisibility by 3 first.",
            "A prime has exactly two divisors."
        ]
    );
    assert_eq!(state.settings.hints[0].id, 0);
    assert_eq!(state.settings.hints[1].id, 1);
}

#[test]
fn test_dropdown_hoists_general_feedback() {
    h::setup();

    let state = parse_olx(h::DROPDOWN_OLX);
    assert_eq!(state.general_feedback.as_deref(), Some("Not the capital."));
    // Hoisting loses nothing: the per-answer feedback survives.
    assert_eq!(
        state.answers[0].selected_feedback.as_deref(),
        Some("Not the capital.")
    );
    assert_eq!(state.answers[1].selected_feedback.as_deref(), Some("Correct."));
}

#[test]
fn test_single_select_without_shared_feedback_has_no_general_feedback() {
    h::setup();

    let state = parse_olx(h::SINGLE_SELECT_OLX);
    assert_eq!(state.general_feedback, None);
}

#[test]
fn test_numeric_answers_and_tolerance() {
    h::setup();

    let state = parse_olx(h::NUMERIC_OLX);
    assert_eq!(state.problem_type, ProblemType::Numeric);
    assert_eq!(state.answers.len(), 2);
    assert_eq!(state.answers[0].title, "100");
    assert!(state.answers[0].correct);
    assert!(!state.answers[0].is_answer_range);
    assert_eq!(state.answers[0].selected_feedback.as_deref(), Some("Exactly right."));
    assert_eq!(state.answers[1].title, "200");

    assert_eq!(state.settings.tolerance.tolerance_type, ToleranceType::Number);
    assert_eq!(state.settings.tolerance.value, Some(5.0));
}

#[test]
fn test_percent_tolerance() {
    h::setup();

    let state = parse_olx(h::NUMERIC_PERCENT_TOLERANCE_OLX);
    assert_eq!(state.settings.tolerance.tolerance_type, ToleranceType::Percent);
    assert_eq!(state.settings.tolerance.value, Some(5.0));
}

#[test]
fn test_missing_tolerance_defaults_to_none() {
    h::setup();

    let state = parse_olx(h::NUMERIC_RANGE_OLX);
    assert_eq!(state.settings.tolerance.tolerance_type, ToleranceType::None);
    assert_eq!(state.settings.tolerance.value, None);
}

#[test]
fn test_numeric_range_answer_is_flagged() {
    h::setup();

    let state = parse_olx(h::NUMERIC_RANGE_OLX);
    assert_eq!(state.answers[0].title, "[10,20]");
    assert!(state.answers[0].is_answer_range);
}

#[test]
fn test_string_response_answers() {
    h::setup();

    let state = parse_olx(h::TEXT_INPUT_OLX);
    assert_eq!(state.problem_type, ProblemType::TextInput);
    assert_eq!(state.answers.len(), 3);

    assert_eq!(state.answers[0].title, "Paris");
    assert!(state.answers[0].correct);
    assert_eq!(state.answers[0].selected_feedback.as_deref(), Some("Bien."));

    assert_eq!(state.answers[1].title, "paris");
    assert!(state.answers[1].correct);

    assert_eq!(state.answers[2].title, "Lyon");
    assert!(!state.answers[2].correct);
    assert_eq!(
        state.answers[2].selected_feedback.as_deref(),
        Some("Lyon is not the capital.")
    );

    assert_eq!(
        state.additional_attributes.get("type").and_then(|v| v.as_str()),
        Some("ci")
    );
    assert_eq!(
        state
            .additional_attributes
            .get("textline")
            .and_then(|v| v.get("size"))
            .and_then(|v| v.as_str()),
        Some("40")
    );
}

#[test]
fn test_empty_widget_yields_one_blank_correct_answer() {
    h::setup();

    let olx = "<problem><multiplechoiceresponse><choicegroup></choicegroup></multiplechoiceresponse></problem>";
    let state = parse_olx(olx);
    assert_eq!(state.problem_type, ProblemType::SingleSelect);
    assert_eq!(state.answers.len(), 1);
    assert_eq!(state.answers[0].id, "A");
    assert!(state.answers[0].correct);
    assert!(state.answers[0].title.is_empty());
}

#[test]
fn test_missing_correct_attribute_falls_back_to_advanced() {
    h::setup();

    let olx = "<problem><multiplechoiceresponse><choicegroup><choice>a</choice></choicegroup></multiplechoiceresponse></problem>";
    assert_eq!(parse_olx(olx).problem_type, ProblemType::Advanced);
}

#[test]
fn test_non_literal_correct_attribute_falls_back_to_advanced() {
    h::setup();

    let olx = r#"<problem><multiplechoiceresponse><choicegroup><choice correct="1">a</choice></choicegroup></multiplechoiceresponse></problem>"#;
    assert_eq!(parse_olx(olx).problem_type, ProblemType::Advanced);
}

#[test]
fn test_entities_in_titles_are_decoded_for_editing() {
    h::setup();

    let olx = r#"<problem><stringresponse answer="salt &amp; pepper" type="ci"><textline size="20"/></stringresponse></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(state.answers[0].title, "salt & pepper");
}

#[test]
fn test_rich_choice_titles_keep_markup() {
    h::setup();

    let olx = r#"<problem><multiplechoiceresponse><choicegroup><choice correct="true">an <b>emphasized</b> option</choice></choicegroup></multiplechoiceresponse></problem>"#;
    let state = parse_olx(olx);
    assert_eq!(state.answers[0].title, "an <b>emphasized</b> option");
}
