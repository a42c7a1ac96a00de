pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Startup configuration. Built once and handed to [`crate::state::AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub sheet_csv_url: Option<String>,
    pub model: String,
    pub api_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            sheet_csv_url: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            api_key: non_empty("GEMINI_API_KEY"),
            sheet_csv_url: non_empty("MENTORSHIP_SHEET_CSV_URL"),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            api_base_url: non_empty("GEMINI_BASE_URL").unwrap_or(defaults.api_base_url),
        }
    }
}
