// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_MAX_EXECUTION_SECS: u64 = 5;
pub const DEFAULT_MAX_OUTPUT_LENGTH: usize = 2000;
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "debugger.log";

/// Hosts that are considered sensible for a local development server.
const LOCAL_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "0.0.0.0"];

/// Process-wide configuration, read once from the environment at startup.
///
/// Every field has a default. Bad values never abort startup; they fall back
/// to the default and produce a warning that the entry point logs once the
/// log sinks are up.
///
/// Example `.env`:
///
/// HOST=127.0.0.1
/// PORT=5000
/// FLASK_DEBUG=false
/// GEMINI_API_KEY=...
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Debug mode exposes error details in 500 responses and lowers the
    /// default log level.
    pub debug: bool,

    /// Credential for the explanation service. `None` disables explanations.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    /// Interpreter used for both the syntax check and the sandbox run.
    pub python: String,

    pub max_execution_time: Duration,

    /// Maximum number of stdout characters returned to the caller.
    pub max_output_length: usize,

    /// Upper bound on a single explanation request.
    pub ai_timeout: Duration,

    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: true,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            python: DEFAULT_PYTHON.to_string(),
            max_execution_time: Duration::from_secs(DEFAULT_MAX_EXECUTION_SECS),
            max_output_length: DEFAULT_MAX_OUTPUT_LENGTH,
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> (Self, Vec<String>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Returns the config plus human-readable warnings for every value that
    /// was ignored or looks suspicious.
    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<String>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        let mut warnings = Vec::new();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            cfg.host = host.trim().to_string();
        }

        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<i64>() {
                Ok(p) if (0..=i64::from(u16::MAX)).contains(&p) => cfg.port = p as u16,
                Ok(p) => warnings.push(format!(
                    "Port {} is outside the valid range. Using default port {}.",
                    p, DEFAULT_PORT
                )),
                Err(_) => warnings.push(format!(
                    "Invalid PORT environment variable '{}'. Using default port {}.",
                    raw, DEFAULT_PORT
                )),
            }
        }

        if let Some(raw) = lookup("FLASK_DEBUG") {
            cfg.debug = raw.trim().eq_ignore_ascii_case("true");
        }

        cfg.gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if cfg.gemini_api_key.is_none() {
            warnings.push(
                "GEMINI_API_KEY not set. AI explanations will be unavailable.".to_string(),
            );
        }

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            cfg.gemini_model = model.trim().to_string();
        }

        if let Some(python) = lookup("PYTHON_BIN").filter(|p| !p.trim().is_empty()) {
            cfg.python = python.trim().to_string();
        }

        if let Some(secs) = positive_number(&lookup, "MAX_EXECUTION_SECS", &mut warnings) {
            cfg.max_execution_time = Duration::from_secs(secs);
        }

        if let Some(len) = positive_number(&lookup, "MAX_OUTPUT_LENGTH", &mut warnings) {
            cfg.max_output_length = len as usize;
        }

        if let Some(secs) = positive_number(&lookup, "AI_TIMEOUT_SECS", &mut warnings) {
            cfg.ai_timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("LOG_FILE").filter(|p| !p.trim().is_empty()) {
            cfg.log_file = PathBuf::from(path.trim());
        }

        (cfg, warnings)
    }

    /// Apply `serve` flag overrides on top of the environment.
    pub fn with_overrides(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(h) = host {
            self.host = h;
        }
        if let Some(p) = port {
            self.port = p;
        }
        self
    }

    /// Warnings about the final listen address, after any overrides.
    pub fn listen_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.port < 1024 {
            warnings.push(format!(
                "Port {} may require admin privileges. Consider using a port > 1024.",
                self.port
            ));
        }
        if !LOCAL_HOSTS.contains(&self.host.as_str()) {
            warnings.push(format!(
                "Host '{}' may not be suitable for local development. Consider '127.0.0.1' or 'localhost'.",
                self.host
            ));
        }
        warnings
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn ai_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn positive_number<F>(lookup: &F, key: &str, warnings: &mut Vec<String>) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warnings.push(format!(
                "Invalid {} value '{}'. Using the default.",
                key, raw
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> (Config, Vec<String>) {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let (cfg, warnings) = load(&[]);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 5000);
        assert!(cfg.debug);
        assert!(cfg.gemini_api_key.is_none());
        assert_eq!(cfg.max_execution_time, Duration::from_secs(5));
        assert_eq!(cfg.max_output_length, 2000);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:5000");
        // Only the missing credential is worth mentioning.
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let (cfg, warnings) = load(&[("PORT", "abc"), ("GEMINI_API_KEY", "k")]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Invalid PORT"));
    }

    #[test]
    fn test_privileged_port_is_kept_with_warning() {
        let (cfg, warnings) = load(&[("PORT", "80"), ("GEMINI_API_KEY", "k")]);
        assert_eq!(cfg.port, 80);
        assert!(warnings.is_empty());
        let listen = cfg.listen_warnings();
        assert_eq!(listen.len(), 1);
        assert!(listen[0].contains("admin privileges"));
    }

    #[test]
    fn test_out_of_range_port() {
        let (cfg, warnings) = load(&[("PORT", "70000"), ("GEMINI_API_KEY", "k")]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert!(warnings[0].contains("outside the valid range"));
    }

    #[test]
    fn test_non_local_host_warns() {
        let (cfg, _) = load(&[("HOST", "10.1.2.3"), ("GEMINI_API_KEY", "k")]);
        assert_eq!(cfg.host, "10.1.2.3");
        assert!(cfg.listen_warnings().iter().any(|w| w.contains("10.1.2.3")));
    }

    #[test]
    fn test_default_listen_address_is_quiet() {
        let (cfg, _) = load(&[]);
        assert!(cfg.listen_warnings().is_empty());
        assert!(cfg
            .with_overrides(Some("localhost".into()), None)
            .listen_warnings()
            .is_empty());
    }

    #[test]
    fn test_overridden_listen_address_warns() {
        let (cfg, _) = load(&[("GEMINI_API_KEY", "k")]);
        let cfg = cfg.with_overrides(Some("10.0.0.5".into()), Some(443));
        let listen = cfg.listen_warnings();
        assert_eq!(listen.len(), 2);
        assert!(listen.iter().any(|w| w.contains("admin privileges")));
        assert!(listen.iter().any(|w| w.contains("10.0.0.5")));
    }

    #[test]
    fn test_debug_flag_parsing() {
        let (cfg, _) = load(&[("FLASK_DEBUG", "False")]);
        assert!(!cfg.debug);
        let (cfg, _) = load(&[("FLASK_DEBUG", "TRUE")]);
        assert!(cfg.debug);
        let (cfg, _) = load(&[("FLASK_DEBUG", "1")]);
        assert!(!cfg.debug);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let (cfg, _) = load(&[("GEMINI_API_KEY", "   ")]);
        assert!(!cfg.ai_configured());
    }

    #[test]
    fn test_limits_override_and_reject_zero() {
        let (cfg, warnings) = load(&[
            ("MAX_EXECUTION_SECS", "2"),
            ("MAX_OUTPUT_LENGTH", "0"),
            ("GEMINI_API_KEY", "k"),
        ]);
        assert_eq!(cfg.max_execution_time, Duration::from_secs(2));
        assert_eq!(cfg.max_output_length, DEFAULT_MAX_OUTPUT_LENGTH);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_cli_overrides() {
        let (cfg, _) = load(&[("PORT", "6000")]);
        let cfg = cfg.with_overrides(Some("0.0.0.0".into()), Some(7000));
        assert_eq!(cfg.bind_addr(), "0.0.0.0:7000");
    }
}
