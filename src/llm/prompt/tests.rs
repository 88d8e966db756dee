use super::*;

#[test]
fn anime_prompt_declares_context_and_question() {
    let prompt = anime_prompt();
    assert_eq!(prompt.input_variables(), ["context", "question"]);
}

#[test]
fn anime_prompt_fills_both_placeholders() {
    let rendered = anime_prompt()
        .format_context_question("combined_info: Title: Monster", "psychological thrillers")
        .expect("should format");

    assert!(rendered.contains("Context:\ncombined_info: Title: Monster\n"));
    assert!(rendered.contains("User's question:\npsychological thrillers\n"));
    assert!(rendered.contains("exactly three anime titles"));
    assert!(rendered.ends_with("Your well-structured response:\n"));
    assert!(!rendered.contains("{{"));
}

#[test]
fn missing_variable_is_an_error() {
    let prompt = PromptTemplate::new("Context: {{ context }}\nQ: {{ question }}", &["context", "question"]);
    let values = HashMap::from([("context", "docs")]);

    let err = prompt.format(&values).expect_err("question is missing");
    assert!(matches!(err, RecommenderError::Llm(_)));
    assert!(err.to_string().contains("question"));
}

#[test]
fn undeclared_variable_is_an_error() {
    let prompt = PromptTemplate::new("Q: {{ question }} for {{ audience }}", &["question"]);
    let values = HashMap::from([("question", "mecha")]);

    let err = prompt.format(&values).expect_err("audience is undefined");
    assert!(err.to_string().contains("Failed to render prompt"));
}

#[test]
fn repeated_variable_is_filled_everywhere() {
    let prompt = PromptTemplate::new("{{ name }} and {{ name }} again", &["name"]);
    let values = HashMap::from([("name", "Lain")]);
    assert_eq!(prompt.format(&values).expect("should format"), "Lain and Lain again");
}

#[test]
fn single_braces_are_literal() {
    let prompt = PromptTemplate::new("{\"title\": \"{{ title }}\"} }", &["title"]);
    let values = HashMap::from([("title", "Akira")]);
    assert_eq!(
        prompt.format(&values).expect("should format"),
        "{\"title\": \"Akira\"} }"
    );
}

#[test]
fn values_are_not_reinterpreted() {
    let prompt = PromptTemplate::new("Q: {{ question }}", &["question"]);
    let values = HashMap::from([("question", "what about {{ context }}?")]);
    assert_eq!(
        prompt.format(&values).expect("should format"),
        "Q: what about {{ context }}?"
    );
}
