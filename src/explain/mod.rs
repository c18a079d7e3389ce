//! Error explanations from a remote text generator.
//!
//! `Explainer::explain` never fails: an unconfigured service yields a fixed
//! placeholder, and any transport or parsing problem yields a degraded
//! explanation that echoes the original error.

pub mod client;
pub mod gemini;

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

use crate::config::Config;
pub use client::TextGenerator;
pub use gemini::GeminiClient;

pub const UNAVAILABLE_EXPLANATION: &str =
    "AI explanation unavailable - please set GEMINI_API_KEY environment variable";
pub const FALLBACK_EXPLANATION: &str = "Unable to analyze the error.";
pub const NO_FIX_SENTINEL: &str = "No fix available";

const EXPLANATION_MARKER: &str = "EXPLANATION:";
const FIXED_CODE_MARKER: &str = "FIXED_CODE:";
const CHANGES_MARKER: &str = "CHANGES:";

/// What the caller sees next to a failed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub explanation: String,
    pub suggested_fix: Option<String>,
    pub fix_explanation: Option<String>,
}

impl Explanation {
    pub fn unavailable() -> Self {
        Self::text_only(UNAVAILABLE_EXPLANATION.to_string())
    }

    pub fn degraded(error_text: &str) -> Self {
        Self::text_only(format!(
            "AI analysis temporarily unavailable. Error details: {}",
            error_text
        ))
    }

    fn text_only(explanation: String) -> Self {
        Self {
            explanation,
            suggested_fix: None,
            fix_explanation: None,
        }
    }
}

/// Process-wide handle to the explanation service.
#[derive(Clone, Default)]
pub struct Explainer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Explainer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn disabled() -> Self {
        Self { generator: None }
    }

    /// Build the Gemini-backed explainer, or a disabled one when the
    /// credential is missing or the client cannot be constructed.
    pub fn from_config(cfg: &Config) -> Self {
        let Some(key) = cfg.gemini_api_key.as_deref() else {
            return Self::disabled();
        };

        match GeminiClient::new(key, cfg.gemini_model.clone(), cfg.ai_timeout) {
            Ok(client) => {
                info!(backend = %client.description(), "AI explanations configured and ready");
                Self::new(Arc::new(client))
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "failed to configure Gemini AI");
                Self::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_some()
    }

    /// Explain `error_text` raised by `code`.
    pub async fn explain(&self, code: &str, error_text: &str) -> Explanation {
        let Some(generator) = &self.generator else {
            warn!("AI explanation requested but no generator is configured");
            return Explanation::unavailable();
        };

        info!(backend = %generator.description(), "requesting AI analysis");

        match generator.generate(&build_prompt(code, error_text)).await {
            Ok(reply) => {
                info!("AI analysis completed");
                parse_reply(&reply)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "AI analysis failed");
                Explanation::degraded(error_text)
            }
        }
    }
}

/// Tutor prompt sent for every failure.
pub fn build_prompt(code: &str, error_text: &str) -> String {
    let error_text = if error_text.trim().is_empty() {
        "No error message"
    } else {
        error_text
    };

    format!(
        r#"
You are a patient Python tutor helping a student. Look at this Python code and the error it produced:

CODE:
```python
{code}
```

ERROR:
{error_text}

Please provide:
1. A short, beginner-friendly explanation of what went wrong
2. A corrected version of the code (if one is possible)
3. A description of what was changed and why

Keep the explanations clear and focused on helping the student learn.
Format your response exactly as:
EXPLANATION: [simple explanation]
FIXED_CODE: [corrected code or "{NO_FIX_SENTINEL}"]
CHANGES: [what was changed and why]
"#
    )
}

/// Split a free-text reply on the three section markers.
pub fn parse_reply(reply: &str) -> Explanation {
    let explanation = section(reply, EXPLANATION_MARKER, Some(FIXED_CODE_MARKER))
        .unwrap_or(FALLBACK_EXPLANATION)
        .to_string();

    let suggested_fix = section(reply, FIXED_CODE_MARKER, Some(CHANGES_MARKER))
        .filter(|fix| *fix != NO_FIX_SENTINEL)
        .map(strip_code_fence)
        .filter(|fix| !fix.trim().is_empty());

    let fix_explanation = section(reply, CHANGES_MARKER, None).map(str::to_string);

    Explanation {
        explanation,
        suggested_fix,
        fix_explanation,
    }
}

/// Text after the first `marker`, up to the first `next` marker after it.
fn section<'a>(text: &'a str, marker: &str, next: Option<&str>) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = next.and_then(|n| rest.find(n)).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn strip_code_fence(fix: &str) -> String {
    static OPEN: OnceLock<Regex> = OnceLock::new();
    static CLOSE: OnceLock<Regex> = OnceLock::new();

    let open = OPEN.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").expect("static regex"));
    let close = CLOSE.get_or_init(|| Regex::new(r"\s*```$").expect("static regex"));

    let fix = open.replace(fix, "");
    close.replace(&fix, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn description(&self) -> String {
            "canned".to_string()
        }
    }

    struct Failing(AtomicUsize);

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            bail!("quota exceeded")
        }

        fn description(&self) -> String {
            "failing".to_string()
        }
    }

    #[test]
    fn test_parse_full_reply() {
        let reply = "EXPLANATION: You divided by zero.\n\
                     FIXED_CODE:\n```python\nprint(1 / 1)\n```\n\
                     CHANGES: Changed the divisor to 1.";
        let e = parse_reply(reply);
        assert_eq!(e.explanation, "You divided by zero.");
        assert_eq!(e.suggested_fix.as_deref(), Some("print(1 / 1)"));
        assert_eq!(e.fix_explanation.as_deref(), Some("Changed the divisor to 1."));
    }

    #[test]
    fn test_parse_no_fix_sentinel() {
        let e = parse_reply("EXPLANATION: x\nFIXED_CODE: No fix available\nCHANGES: none");
        assert_eq!(e.suggested_fix, None);
        assert_eq!(e.fix_explanation.as_deref(), Some("none"));
    }

    #[test]
    fn test_sentinel_is_case_sensitive() {
        let e = parse_reply("EXPLANATION: x\nFIXED_CODE: no fix available\nCHANGES: none");
        assert_eq!(e.suggested_fix.as_deref(), Some("no fix available"));
    }

    #[test]
    fn test_parse_missing_markers() {
        let e = parse_reply("The model ignored the format entirely.");
        assert_eq!(e.explanation, FALLBACK_EXPLANATION);
        assert_eq!(e.suggested_fix, None);
        assert_eq!(e.fix_explanation, None);
    }

    #[test]
    fn test_parse_explanation_only() {
        let e = parse_reply("EXPLANATION:   Missing colon after def.  ");
        assert_eq!(e.explanation, "Missing colon after def.");
        assert_eq!(e.suggested_fix, None);
    }

    #[test]
    fn test_fix_runs_to_end_without_changes() {
        let e = parse_reply("EXPLANATION: a\nFIXED_CODE: x = 1");
        assert_eq!(e.suggested_fix.as_deref(), Some("x = 1"));
        assert_eq!(e.fix_explanation, None);
    }

    #[test]
    fn test_fence_without_code_is_no_fix() {
        let e = parse_reply("EXPLANATION: x\nFIXED_CODE:\n```python\n```\nCHANGES: none");
        assert_eq!(e.suggested_fix, None);
        let e = parse_reply("EXPLANATION: x\nFIXED_CODE:\nCHANGES: none");
        assert_eq!(e.suggested_fix, None);
    }

    #[test]
    fn test_strip_other_language_tag() {
        assert_eq!(strip_code_fence("```py\nx = 1\n```"), "x = 1");
        assert_eq!(strip_code_fence("```\nx = 1\n```"), "x = 1");
        assert_eq!(strip_code_fence("x = 1"), "x = 1");
    }

    #[test]
    fn test_prompt_embeds_code_and_error() {
        let p = build_prompt("print(x)", "NameError: name 'x' is not defined");
        assert!(p.contains("```python\nprint(x)\n```"));
        assert!(p.contains("NameError: name 'x' is not defined"));
        assert!(p.contains("FIXED_CODE:"));
    }

    #[tokio::test]
    async fn test_disabled_returns_placeholder() {
        let e = Explainer::disabled().explain("x", "boom").await;
        assert_eq!(e, Explanation::unavailable());
        assert_eq!(e.explanation, UNAVAILABLE_EXPLANATION);
    }

    #[tokio::test]
    async fn test_generator_failure_degrades() {
        let failing = Arc::new(Failing(AtomicUsize::new(0)));
        let explainer = Explainer::new(failing.clone());
        let e = explainer.explain("x", "NameError: x").await;
        assert_eq!(
            e.explanation,
            "AI analysis temporarily unavailable. Error details: NameError: x"
        );
        assert_eq!(e.suggested_fix, None);
        // No retries.
        assert_eq!(failing.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generator_reply_is_parsed() {
        let explainer = Explainer::new(Arc::new(Canned(
            "EXPLANATION: typo\nFIXED_CODE: print('hi')\nCHANGES: fixed the quote",
        )));
        assert!(explainer.is_available());
        let e = explainer.explain("print('hi)", "SyntaxError").await;
        assert_eq!(e.explanation, "typo");
        assert_eq!(e.suggested_fix.as_deref(), Some("print('hi')"));
    }

    #[test]
    fn test_from_config_without_key_is_disabled() {
        let cfg = Config::default();
        assert!(!Explainer::from_config(&cfg).is_available());
    }
}
