// src/engine/response.rs
use serde::Serialize;

use crate::explain::Explanation;

pub const SUCCESS_MESSAGE: &str = "Code executed successfully! 🎉";
pub const SERVER_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// JSON body of a processed `/debug` request (always HTTP 200).
///
/// Field order follows the wire format; each outcome has its own shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebugResponse {
    Success {
        success: bool,
        output: String,
        error: Option<String>,
        ai_explanation: String,
        suggested_fix: Option<String>,
        fix_explanation: Option<String>,
    },
    SyntaxFailure {
        success: bool,
        output: String,
        error: String,
        error_type: &'static str,
        line_number: Option<u32>,
        ai_explanation: String,
        suggested_fix: Option<String>,
        fix_explanation: Option<String>,
    },
    RuntimeFailure {
        success: bool,
        output: String,
        error: String,
        error_type: &'static str,
        ai_explanation: String,
        suggested_fix: Option<String>,
        fix_explanation: Option<String>,
    },
}

impl DebugResponse {
    pub fn success(output: String) -> Self {
        DebugResponse::Success {
            success: true,
            output,
            error: None,
            ai_explanation: SUCCESS_MESSAGE.to_string(),
            suggested_fix: None,
            fix_explanation: None,
        }
    }

    pub fn syntax_failure(error: String, line_number: Option<u32>, explanation: Explanation) -> Self {
        DebugResponse::SyntaxFailure {
            success: false,
            output: String::new(),
            error,
            error_type: "syntax",
            line_number,
            ai_explanation: explanation.explanation,
            suggested_fix: explanation.suggested_fix,
            fix_explanation: explanation.fix_explanation,
        }
    }

    pub fn runtime_failure(output: String, error: String, explanation: Explanation) -> Self {
        DebugResponse::RuntimeFailure {
            success: false,
            output,
            error,
            error_type: "runtime",
            ai_explanation: explanation.explanation,
            suggested_fix: explanation.suggested_fix,
            fix_explanation: explanation.fix_explanation,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DebugResponse::Success { .. })
    }
}

/// `{ "error": ... }` body for 4xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

/// 500 body. `debug_info` carries the cause only in debug mode.
#[derive(Debug, Serialize)]
pub struct ServerErrorBody {
    pub error: &'static str,
    pub debug_info: Option<String>,
}
