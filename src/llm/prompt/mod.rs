#[cfg(test)]
mod tests;

use minijinja::{Environment, UndefinedBehavior};
use std::collections::HashMap;

use crate::{RecommenderError, Result};

const ANIME_TEMPLATE: &str = "\
You are an expert anime recommender. Your job is to help users find the perfect anime based on their preferences.

Using the following context, provide a detailed and engaging response to the user's question.

For each question, suggest exactly three anime titles. For each recommendation, include:
1. The anime title.
2. A concise plot summary (2-3 sentences).
3. A clear explanation of why this anime matches the user's preferences.

Present your recommendations in a numbered list format for easy reading.

If you don't know the answer, respond honestly by saying you don't know. Do not fabricate any information.

Context:
{{ context }}

User's question:
{{ question }}

Your well-structured response:
";

/// A Jinja text skeleton with a declared set of input variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

/// The recommender's prompt, expecting `context` and `question`
#[inline]
pub fn anime_prompt() -> PromptTemplate {
    PromptTemplate::new(ANIME_TEMPLATE, &["context", "question"])
}

impl PromptTemplate {
    #[inline]
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self {
            template: template.into(),
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[inline]
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Render the template. Fails if a declared variable has no value or the
    /// template references anything undeclared.
    #[inline]
    pub fn format(&self, values: &HashMap<&str, &str>) -> Result<String> {
        let missing: Vec<&str> = self
            .input_variables
            .iter()
            .map(String::as_str)
            .filter(|name| !values.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(RecommenderError::Llm(format!(
                "Prompt is missing values for: {}",
                missing.join(", ")
            )));
        }

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);

        env.render_str(&self.template, values)
            .map_err(|e| RecommenderError::Llm(format!("Failed to render prompt: {}", e)))
    }

    /// Convenience for the `context` / `question` pair
    #[inline]
    pub fn format_context_question(&self, context: &str, question: &str) -> Result<String> {
        let values = HashMap::from([("context", context), ("question", question)]);
        self.format(&values)
    }
}
