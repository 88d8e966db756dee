
use serde_json::{Map, Value};

const TITLE_KEYS: [&str; 3] = ["title", "name", "anime"];
const PLOT_KEYS: [&str; 3] = ["plot", "summary", "synopsis"];
const WHY_KEYS: [&str; 4] = ["why", "why_it_matches", "why_it_fits", "reason"];

/// How a pipeline response should be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedResponse {
    /// A JSON object, or an array made only of objects
    Cards(Vec<RecommendationCard>),
    /// A JSON array holding at least one non-object, as `{i}. {item}` lines
    Items(Vec<String>),
    /// Anything else, verbatim
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationCard {
    pub index: usize,
    pub title: String,
    pub plot: Option<String>,
    pub why: Option<String>,
}

impl RecommendationCard {
    fn from_object(index: usize, object: &Map<String, Value>) -> Self {
        Self {
            index,
            title: first_present(object, &TITLE_KEYS)
                .unwrap_or_else(|| format!("Recommendation {}", index)),
            plot: first_present(object, &PLOT_KEYS),
            why: first_present(object, &WHY_KEYS),
        }
    }

    /// Plain-text card: a numbered title line, then the plot and reason lines when present
    #[inline]
    pub fn to_block(&self) -> String {
        let mut lines = vec![format!("{}. {}", self.index, self.title)];
        if let Some(plot) = &self.plot {
            lines.push(format!("Plot: {}", plot));
        }
        if let Some(why) = &self.why {
            lines.push(format!("Why it matches your preferences: {}", why));
        }
        lines.join("\n")
    }
}

impl RenderedResponse {
    /// Blocks separated by a blank line
    #[inline]
    pub fn to_text(&self) -> String {
        match self {
            Self::Cards(cards) => cards
                .iter()
                .map(RecommendationCard::to_block)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Items(items) => items.join("\n"),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Decide how to show `response`. JSON may be bare or inside a fenced ```json block.
#[inline]
pub fn render_response(response: &str) -> RenderedResponse {
    let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(response)) else {
        return RenderedResponse::Text(response.to_string());
    };

    match value {
        Value::Array(items) => {
            if items.iter().all(Value::is_object) {
                let cards = items
                    .iter()
                    .filter_map(Value::as_object)
                    .enumerate()
                    .map(|(i, object)| RecommendationCard::from_object(i + 1, object))
                    .collect();
                RenderedResponse::Cards(cards)
            } else {
                let lines = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {}", i + 1, display_value(item)))
                    .collect();
                RenderedResponse::Items(lines)
            }
        }
        Value::Object(object) => {
            RenderedResponse::Cards(vec![RecommendationCard::from_object(1, &object)])
        }
        _ => RenderedResponse::Text(response.to_string()),
    }
}

fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the language tag line, if any
    match body.split_once('\n') {
        Some((tag, inner)) if !tag.trim_start().starts_with(['[', '{']) => inner.trim(),
        _ => body.trim(),
    }
}

/// First key whose value is present and non-empty
fn first_present(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_present(value))
        .map(display_value)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
