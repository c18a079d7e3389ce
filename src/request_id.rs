use chrono::Local;
use std::fmt;
use uuid::Uuid;

/// Correlation identifier for the log lines of one request.
///
/// Local timestamp down to the microsecond, plus a short random suffix so
/// two requests landing in the same microsecond still differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}_{}",
            Local::now().format("%Y%m%d_%H%M%S_%6f"),
            &suffix[..8]
        ))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_shape() {
        let id = RequestId::new().to_string();
        // YYYYMMDD_HHMMSS_ffffff_xxxxxxxx
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
    }
}
