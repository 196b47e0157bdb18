//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Question generation constants
pub mod generation {
    /// Default number of questions requested per content unit
    pub const DEFAULT_QUESTION_COUNT: usize = 10;

    /// Answer options requested per question
    pub const ANSWERS_PER_QUESTION: usize = 4;

    /// Maximum generation attempts per content unit (initial call + retries)
    pub const MAX_ATTEMPTS: usize = 5;

    /// Fixed pause between retry attempts (milliseconds)
    pub const RETRY_PAUSE_MS: u64 = 500;

    /// Sampling temperature for question generation
    pub const GENERATION_TEMPERATURE: f32 = 0.7;

    /// Sampling temperature for tagging (deterministic)
    pub const TAGGING_TEMPERATURE: f32 = 0.0;
}

/// Content extraction constants
pub mod extract {
    /// Character budget for inline content; anything beyond is truncated
    pub const MAX_INLINE_CHARS: usize = 10_000;

    /// Extensions whose content is sent inline rather than uploaded
    pub const INLINE_EXTENSIONS: [&str; 9] = [
        "txt", "pdf", "doc", "docx", "rtf", "odt", "html", "htm", "xml",
    ];
}

/// Network constants
pub mod network {
    /// Default timeout for generation and file operations (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Timeout for the OAuth token exchange (seconds)
    pub const TOKEN_TIMEOUT_SECS: u64 = 30;

    /// Timeout for file uploads, which can carry large payloads (seconds)
    pub const UPLOAD_TIMEOUT_SECS: u64 = 120;
}

/// GigaChat provider defaults
pub mod gigachat {
    /// OAuth token endpoint
    pub const OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";

    /// API base URL
    pub const API_BASE: &str = "https://gigachat.devices.sberbank.ru/api/v1";

    /// OAuth scope for personal API access
    pub const OAUTH_SCOPE: &str = "GIGACHAT_API_PERS";

    /// Default model
    pub const DEFAULT_MODEL: &str = "GigaChat-Max";

    /// Default purpose for uploaded files
    pub const FILE_PURPOSE: &str = "general";
}

/// OpenAI provider defaults
pub mod openai {
    /// API base URL
    pub const API_BASE: &str = "https://api.openai.com/v1";

    /// Default model
    pub const DEFAULT_MODEL: &str = "gpt-4o";

    /// Default purpose for uploaded files
    pub const FILE_PURPOSE: &str = "assistants";
}
