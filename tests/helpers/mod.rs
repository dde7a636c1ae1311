use olx_problem_editor::types::ProblemState;

pub fn setup() {
    olx_problem_editor::logger::init_tracing();
}

/// Strip the retained source text so two states parsed from different but
/// equivalent documents can be compared field by field.
#[allow(dead_code)]
pub fn normalized(mut state: ProblemState) -> ProblemState {
    state.raw_olx = String::new();
    state
}

#[allow(dead_code)]
pub const CHECKBOX_OLX: &str = r#"<problem>
<choiceresponse>
<label>Which of these numbers are prime?</label>
<description>Select all that apply.</description>
<checkboxgroup>
<choice correct="true">7<choicehint selected="true">Yes, 7 is prime.</choicehint><choicehint selected="false">Look at 7 again.</choicehint></choice>
<choice correct="false">9</choice>
<choice correct="true">11</choice>
<choice correct="false">15</choice>
<compoundhint value="A C">You found both primes.</compoundhint>
<compoundhint value="B D">Both of these are composite.</compoundhint>
</checkboxgroup>
<solution>
<div class="detailed-solution">
<p>Explanation</p>
<p>7 and 11 have no divisors besides 1 and themselves.</p>
</div>
</solution>
</choiceresponse>
<demandhint>
<hint>Check divisibility by 3 first.</hint>
<hint>A prime has exactly two divisors.</hint>
</demandhint>
</problem>"#;

#[allow(dead_code)]
pub const SINGLE_SELECT_OLX: &str = r#"<problem>
<multiplechoiceresponse>
<label>What color is a clear daytime sky?</label>
<choicegroup>
<choice correct="true">Blue<choicehint>Right.</choicehint></choice>
<choice correct="false">Green</choice>
</choicegroup>
</multiplechoiceresponse>
</problem>"#;

#[allow(dead_code)]
pub const DROPDOWN_OLX: &str = r#"<problem>
<p>France has one capital city.</p>
<optionresponse>
<label>Which city is it?</label>
<optioninput>
<option correct="false">Lyon<optionhint>Not the capital.</optionhint></option>
<option correct="true">Paris<optionhint>Correct.</optionhint></option>
<option correct="false">Marseille<optionhint>Not the capital.</optionhint></option>
</optioninput>
</optionresponse>
</problem>"#;

#[allow(dead_code)]
pub const NUMERIC_OLX: &str = r#"<problem>
<numericalresponse answer="100">
<label>How many centimetres are in a metre?</label>
<responseparam type="tolerance" default="5"/>
<correcthint>Exactly right.</correcthint>
<additional_answer answer="200"/>
<formulaequationinput/>
</numericalresponse>
</problem>"#;

#[allow(dead_code)]
pub const NUMERIC_PERCENT_TOLERANCE_OLX: &str = r#"<problem>
<numericalresponse answer="100">
<responseparam type="tolerance" default="5%"/>
<formulaequationinput/>
</numericalresponse>
</problem>"#;

#[allow(dead_code)]
pub const NUMERIC_RANGE_OLX: &str = r#"<problem>
<numericalresponse answer="[10,20]">
<formulaequationinput/>
</numericalresponse>
</problem>"#;

#[allow(dead_code)]
pub const TEXT_INPUT_OLX: &str = r#"<problem>
<stringresponse answer="Paris" type="ci">
<label>What is the capital of France?</label>
<correcthint>Bien.</correcthint>
<additional_answer answer="paris"/>
<stringequalhint answer="Lyon">Lyon is not the capital.</stringequalhint>
<textline size="40"/>
</stringresponse>
</problem>"#;

#[allow(dead_code)]
pub const ADVANCED_OLX: &str = r#"<problem>
<formularesponse type="ci" samples="x@1:5#10" answer="x^2">
<formulaequationinput/>
</formularesponse>
</problem>"#;

#[allow(dead_code)]
pub const SCRIPT_OLX: &str = r#"<problem>
<multiplechoiceresponse>
<choicegroup>
<choice correct="true">computed</choice>
</choicegroup>
</multiplechoiceresponse>
<script type="loncapa/python">r = 4</script>
</problem>"#;

#[allow(dead_code)]
pub const MULTIPLE_RESPONSES_OLX: &str = r#"<problem>
<stringresponse answer="one"><textline size="20"/></stringresponse>
<stringresponse answer="two"><textline size="20"/></stringresponse>
</problem>"#;

#[allow(dead_code)]
pub const BLANK_OLX: &str = "<problem></problem>";
