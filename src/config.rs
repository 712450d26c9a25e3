// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use url::Url;

use crate::parser::ParseStrategy;

/// Every well-formed question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 5;

/// Upper bound on the free-text context a user may submit.
pub const MAX_CONTEXT_CHARS: u64 = 10_000;

/// Default cap on live sessions held in memory.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub session_secret: String,
    pub session_ttl: u64,
    pub max_sessions: usize,
    pub parse_strategy: ParseStrategy,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .expect("GEMINI_API_KEY must be set");

        let gemini_model = env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if let Err(e) = Url::parse(&gemini_base_url) {
            panic!("GEMINI_BASE_URL is not a valid URL: {}", e);
        }
        let gemini_base_url = gemini_base_url.trim_end_matches('/').to_string();

        let session_secret = env::var("SESSION_SECRET")
            .expect("SESSION_SECRET must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            temperature: parse_or("TEMPERATURE", 0.9),
            top_p: parse_or("TOP_P", 0.95),
            session_secret,
            session_ttl: parse_or("SESSION_TTL_SECONDS", 86_400),
            max_sessions: parse_or("MAX_SESSIONS", DEFAULT_MAX_SESSIONS),
            parse_strategy: parse_or("PARSE_STRATEGY", ParseStrategy::Positional),
            port: parse_or("PORT", 3000),
            rust_log,
        }
    }
}

/// Reads an optional variable, falling back to `default` when unset.
/// A value that is set but does not parse is a startup error.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} has an invalid value: {:?}", key, raw)),
        Err(_) => default,
    }
}
