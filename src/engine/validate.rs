use serde_json::Value;

/// Why a request was turned away before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    NotJson,
    NoJsonData,
    NoCode,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::NotJson => "Request must be JSON",
            ValidationError::NoJsonData => "No JSON data provided",
            ValidationError::NoCode => "No code provided",
        }
    }
}

/// Validate a `/debug` request and return the trimmed source to run.
pub fn validate_request(content_type: Option<&str>, body: &[u8]) -> Result<String, ValidationError> {
    if !content_type.is_some_and(is_json_content_type) {
        return Err(ValidationError::NotJson);
    }

    let data: Value = serde_json::from_slice(body).map_err(|_| ValidationError::NotJson)?;

    let obj = match data.as_object() {
        Some(obj) if !obj.is_empty() => obj,
        _ => return Err(ValidationError::NoJsonData),
    };

    let code = obj
        .get("code")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");

    if code.is_empty() {
        return Err(ValidationError::NoCode);
    }

    Ok(code.to_string())
}

/// `application/json` or any `application/*+json` type, parameters ignored.
fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn test_valid_request_is_trimmed() {
        let code = validate_request(JSON, br#"{"code": "  print('hi')\n\n"}"#).unwrap();
        assert_eq!(code, "print('hi')");
    }

    #[test]
    fn test_content_type_variants() {
        assert!(validate_request(Some("application/json; charset=utf-8"), br#"{"code":"x"}"#).is_ok());
        assert!(validate_request(Some("application/vnd.api+json"), br#"{"code":"x"}"#).is_ok());
        assert_eq!(
            validate_request(Some("text/plain"), br#"{"code":"x"}"#),
            Err(ValidationError::NotJson)
        );
        assert_eq!(
            validate_request(None, br#"{"code":"x"}"#),
            Err(ValidationError::NotJson)
        );
    }

    #[test]
    fn test_malformed_body_is_not_json() {
        assert_eq!(
            validate_request(JSON, b"print('hi')"),
            Err(ValidationError::NotJson)
        );
        assert_eq!(validate_request(JSON, b""), Err(ValidationError::NotJson));
    }

    #[test]
    fn test_empty_documents() {
        for body in [&b"{}"[..], b"null", b"[]", b"false", b"0", b"\"\""] {
            assert_eq!(
                validate_request(JSON, body),
                Err(ValidationError::NoJsonData),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_missing_or_blank_code() {
        assert_eq!(
            validate_request(JSON, br#"{"lang": "python"}"#),
            Err(ValidationError::NoCode)
        );
        assert_eq!(
            validate_request(JSON, br#"{"code": "   \n\t"}"#),
            Err(ValidationError::NoCode)
        );
        assert_eq!(
            validate_request(JSON, br#"{"code": 42}"#),
            Err(ValidationError::NoCode)
        );
    }

    #[test]
    fn test_non_object_documents_carry_no_data() {
        for body in [&b"[1, 2]"[..], b"true", b"42", b"\"print(1)\"", br#"[{"code": "x"}]"#] {
            assert_eq!(
                validate_request(JSON, body),
                Err(ValidationError::NoJsonData),
                "body {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(ValidationError::NotJson.message(), "Request must be JSON");
        assert_eq!(ValidationError::NoJsonData.message(), "No JSON data provided");
        assert_eq!(ValidationError::NoCode.message(), "No code provided");
    }
}
