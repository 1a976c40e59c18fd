//! # Intent Classification
//!
//! File: cli/src/assistant/intent.rs
//!
//! ## Overview
//!
//! Decides what a prompt is asking for. The classifier is a static,
//! priority-ordered table of cheap rules; the first rule that matches wins and
//! anything unmatched is `Freeform`. Classification is a pure function of the
//! normalized prompt.
//!
//! | # | Rule            | Intent           |
//! |---|-----------------|------------------|
//! | 1 | assistance echo | `AssistanceEcho` |
//! | 2 | greeting        | `Greeting`       |
//! | 3 | farewell        | `Farewell`       |
//! | 4 | bare city name  | `BareCityName`   |
//! | 5 | weather keyword | `WeatherQuery`   |
//! | 6 | identity        | `IdentityQuery`  |
//! | 7 | dataset         | `DatasetQuery`   |
//!
use super::normalize::NormalizedPrompt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// The assistant's own opening line. Echoing it back is answered verbatim.
pub const ASSISTANCE_PROMPT: &str = "How may I assist you?";

pub const WEATHER_KEYWORD: &str = "weather";

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

const FAREWELLS: &[&str] = &[
    "bye",
    "goodbye",
    "bye bye",
    "see you",
    "see you later",
    "farewell",
];

static IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(who\s+made\s+you|who\s+created\s+you|who\s+developed\s+you|who\s+are\s+you|who\s+is\s+behind\s+you)",
    )
    .expect("identity pattern is valid")
});

static DATASET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(which\s+dataset\s+do\s+you\s+use|data\s+source)")
        .expect("dataset pattern is valid")
});

/// The classified purpose of a prompt. Exactly one per prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    AssistanceEcho,
    Greeting,
    Farewell,
    IdentityQuery,
    DatasetQuery,
    BareCityName,
    /// `keyword_index` is the position of the "weather" token.
    WeatherQuery { keyword_index: usize },
    Freeform,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::AssistanceEcho => "AssistanceEcho",
            Intent::Greeting => "Greeting",
            Intent::Farewell => "Farewell",
            Intent::IdentityQuery => "IdentityQuery",
            Intent::DatasetQuery => "DatasetQuery",
            Intent::BareCityName => "BareCityName",
            Intent::WeatherQuery { .. } => "WeatherQuery",
            Intent::Freeform => "Freeform",
        };
        f.write_str(name)
    }
}

/// One entry of the rule table.
struct Rule {
    name: &'static str,
    check: fn(&NormalizedPrompt) -> Option<Intent>,
}

fn assistance_echo(p: &NormalizedPrompt) -> Option<Intent> {
    (p.text == ASSISTANCE_PROMPT.to_lowercase()).then_some(Intent::AssistanceEcho)
}

fn greeting(p: &NormalizedPrompt) -> Option<Intent> {
    GREETINGS.contains(&p.text.as_str()).then_some(Intent::Greeting)
}

fn farewell(p: &NormalizedPrompt) -> Option<Intent> {
    FAREWELLS.contains(&p.text.as_str()).then_some(Intent::Farewell)
}

/// A lone alphabetic token. The keyword itself is left to `weather_keyword`.
fn bare_city(p: &NormalizedPrompt) -> Option<Intent> {
    match p.tokens.as_slice() {
        [only] if only != WEATHER_KEYWORD && only.chars().all(char::is_alphabetic) => {
            Some(Intent::BareCityName)
        }
        _ => None,
    }
}

fn weather_keyword(p: &NormalizedPrompt) -> Option<Intent> {
    p.tokens
        .iter()
        .position(|t| t == WEATHER_KEYWORD)
        .map(|keyword_index| Intent::WeatherQuery { keyword_index })
}

fn identity(p: &NormalizedPrompt) -> Option<Intent> {
    IDENTITY_RE.is_match(&p.text).then_some(Intent::IdentityQuery)
}

fn dataset(p: &NormalizedPrompt) -> Option<Intent> {
    DATASET_RE.is_match(&p.text).then_some(Intent::DatasetQuery)
}

static RULES: &[Rule] = &[
    Rule { name: "assistance-echo", check: assistance_echo },
    Rule { name: "greeting", check: greeting },
    Rule { name: "farewell", check: farewell },
    Rule { name: "bare-city", check: bare_city },
    Rule { name: "weather-keyword", check: weather_keyword },
    Rule { name: "identity", check: identity },
    Rule { name: "dataset", check: dataset },
];

/// Classifies a normalized prompt. First matching rule wins.
pub fn classify(prompt: &NormalizedPrompt) -> Intent {
    for rule in RULES {
        if let Some(intent) = (rule.check)(prompt) {
            debug!("Prompt '{}' matched rule '{}' -> {}", prompt.text, rule.name, intent);
            return intent;
        }
    }
    debug!("Prompt '{}' matched no rule -> Freeform", prompt.text);
    Intent::Freeform
}
