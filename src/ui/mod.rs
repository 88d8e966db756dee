// Terminal front-end
// A menu loop over the recommendation pipeline

pub mod render;


use std::time::Duration;

use anyhow::Result;
use console::style;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::pipeline::PipelineCache;

pub use render::{RecommendationCard, RenderedResponse, render_response};

/// Quick themes offered next to the free-text prompt
pub const THEMES: [&str; 5] = ["Dark Thriller", "Action", "Romance", "Drama", "Slice of Life"];

const HEADER: &str = "🎌 Anime Recommender System";
const DESCRIPTION: &str = "Enter a short description of the kind of anime you enjoy, or select a theme to get tailored recommendations.";
const EXAMPLES: &str = "Examples: dark thriller with psychological twists; action with strong female lead; wholesome slice of life...";
const SPINNER_MESSAGE: &str = "Fetching recommendations for you...";

/// A menu selection
#[derive(Debug, Clone, PartialEq, Eq)]
enum MenuChoice {
    Describe,
    Theme(&'static str),
    Quit,
}

fn menu_items() -> Vec<String> {
    let mut items = vec!["Describe your preferences".to_string()];
    items.extend(THEMES.iter().map(|theme| format!("Theme: {}", theme)));
    items.push("Quit".to_string());
    items
}

fn menu_choice(index: usize) -> MenuChoice {
    match index {
        0 => MenuChoice::Describe,
        i if i <= THEMES.len() => MenuChoice::Theme(THEMES[i - 1]),
        _ => MenuChoice::Quit,
    }
}

/// Run the interactive page until the user quits
#[inline]
pub async fn run(cache: &PipelineCache) -> Result<()> {
    eprintln!("{}", style(HEADER).bold().cyan());
    eprintln!("{}", DESCRIPTION);
    eprintln!();

    let items = menu_items();
    let mut last_query = String::new();

    loop {
        let selection = Select::new()
            .with_prompt("What would you like to do?")
            .items(&items)
            .default(0)
            .interact()?;

        let query = match menu_choice(selection) {
            MenuChoice::Describe => {
                eprintln!("{}", style(EXAMPLES).dim());
                Input::<String>::new()
                    .with_prompt("Describe your preferences")
                    .with_initial_text(last_query.clone())
                    .allow_empty(true)
                    .interact_text()?
            }
            MenuChoice::Theme(theme) => theme.to_string(),
            MenuChoice::Quit => break,
        };

        let query = query.trim().to_string();
        if query.is_empty() {
            continue;
        }

        debug!("Running query from UI: {}", query);
        show_recommendations(cache, &query).await;
        last_query = query;
    }

    Ok(())
}

async fn show_recommendations(cache: &PipelineCache, query: &str) {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(SPINNER_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = async { cache.get().await?.recommend(query).await }.await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => print_recommendations(&render_response(&response)),
        Err(e) => eprintln!("{} {}", style("✗").red(), style(e).red()),
    }
}

fn print_recommendations(rendered: &RenderedResponse) {
    println!();
    println!("{}", style("Recommendations").bold().underlined());
    println!();

    match rendered {
        RenderedResponse::Cards(cards) => {
            for card in cards {
                println!("{}", style(format!("{}. {}", card.index, card.title)).bold());
                if let Some(plot) = &card.plot {
                    println!("{} {}", style("Plot:").bold(), plot);
                }
                if let Some(why) = &card.why {
                    println!("{} {}", style("Why it matches your preferences:").bold(), why);
                }
                println!();
            }
        }
        RenderedResponse::Items(_) | RenderedResponse::Text(_) => {
            println!("{}", rendered.to_text());
            println!();
        }
    }
}
