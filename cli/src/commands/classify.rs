//! # WeatherGPT Prompt Classification Report
//!
//! File: cli/src/commands/classify.rs
//!
//! ## Overview
//!
//! `weathergpt classify <PROMPT...>` runs only the offline stages of the
//! assistant (normalization, intent classification and city extraction) and
//! prints what they decided. No configuration is needed and no network call
//! is made, which makes it handy for checking how a prompt will be routed.
//!
//! ```text
//! $ weathergpt classify "What's the weather in the Paris?"
//! intent: WeatherQuery
//! city: Paris
//! ```
//!
use crate::assistant::{analyze, Analysis};
use crate::core::error::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Show how a prompt is classified, without calling any API")]
pub struct ClassifyArgs {
    /// The prompt. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

pub fn handle_classify(args: ClassifyArgs) -> Result<()> {
    let analysis = analyze(&args.prompt.join(" "));
    print!("{}", render(&analysis));
    Ok(())
}

fn render(analysis: &Analysis) -> String {
    let mut out = format!("intent: {}\n", analysis.intent);
    match analysis.city.as_deref() {
        Some("") => out.push_str("city: (none found)\n"),
        Some(city) => out.push_str(&format!("city: {}\n", city)),
        None => {}
    }
    out
}
