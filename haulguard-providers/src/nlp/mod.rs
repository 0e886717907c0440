//! Chat-completion providers behind the driver assistant.
//!
//! | Provider | Tier | Key |
//! |----------|------|-----|
//! | OpenAI | Primary | required |
//! | Hugging Face Inference | Fallback | required |

mod huggingface;
mod openai;

pub use huggingface::{HuggingFaceProvider, huggingface_descriptor};
pub use openai::{OpenAiProvider, openai_descriptor};

/// System prompt shared by every NLP provider.
pub const SYSTEM_PROMPT: &str = "You are a co-pilot for commercial truck drivers in the United States. \
Answer briefly and practically. Follow FMCSA hours-of-service rules, hazmat \
regulations and safe-driving practice. If a question needs a mechanic, a \
dispatcher or law enforcement, say so plainly.";

/// Builds the system message, appending caller context when present.
pub(crate) fn system_message(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{SYSTEM_PROMPT}\n\nDriver context: {context}"),
        None => SYSTEM_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_message() {
        assert_eq!(system_message(None), SYSTEM_PROMPT);
        assert_eq!(system_message(Some("  ")), SYSTEM_PROMPT);
        assert!(system_message(Some("3h driving left")).ends_with("Driver context: 3h driving left"));
    }
}
