use anyhow::{ensure, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// JSON in production, pretty output everywhere else.
    pub fn for_env(env: &Environment) -> Self {
        if env.is_prod() {
            Self::Json
        } else {
            Self::Pretty
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub log_format: LogFormat,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Pagination
    pub pagination_per_page: u64,
    pub pagination_max_page_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: Environment::Dev,
            server_addr: "0.0.0.0:8080".to_string(),
            log_format: LogFormat::Pretty,
            cors_allow_origins: vec!["http://localhost:3000".to_string()],
            pagination_per_page: 100,
            pagination_max_page_size: 200,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let env = Environment::parse(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or(defaults.server_addr);
        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw)
                .with_context(|| format!("LOG_FORMAT must be pretty, compact or json, got `{raw}`"))?,
            Err(_) => LogFormat::for_env(&env),
        };

        // CORS
        let cors_allow_origins = match env::var("CORS_ALLOW_ORIGINS") {
            Ok(origins) => parse_origins(&origins).context("Invalid CORS_ALLOW_ORIGINS")?,
            Err(_) => defaults.cors_allow_origins,
        };

        // Pagination
        let pagination_per_page =
            parse_var("PAGINATION_PER_PAGE")?.unwrap_or(defaults.pagination_per_page);
        let pagination_max_page_size =
            parse_var("PAGINATION_MAX_PAGE_SIZE")?.unwrap_or(defaults.pagination_max_page_size);

        ensure!(pagination_per_page > 0, "PAGINATION_PER_PAGE must be positive");
        ensure!(
            pagination_per_page <= pagination_max_page_size,
            "PAGINATION_PER_PAGE ({pagination_per_page}) must not exceed \
             PAGINATION_MAX_PAGE_SIZE ({pagination_max_page_size})"
        );

        Ok(Settings {
            env,
            server_addr,
            log_format,
            cors_allow_origins,
            pagination_per_page,
            pagination_max_page_size,
        })
    }
}

/// Comma separated origins. `*` is rejected because the CORS layer allows
/// credentials, which cannot be combined with a wildcard origin.
fn parse_origins(raw: &str) -> Result<Vec<String>> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    ensure!(
        !origins.iter().any(|origin| origin == "*"),
        "wildcard origin `*` cannot be used with credentialed CORS; list the origins explicitly"
    );
    Ok(origins)
}

fn parse_var(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got `{raw}`")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Prod);
        assert_eq!(Environment::parse("PROD"), Environment::Prod);
        assert_eq!(Environment::parse("staging"), Environment::Staging);
        assert_eq!(Environment::parse("anything"), Environment::Dev);
    }

    #[test]
    fn test_log_format() {
        assert_eq!(LogFormat::for_env(&Environment::Prod), LogFormat::Json);
        assert_eq!(LogFormat::for_env(&Environment::Dev), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("COMPACT"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://a.test, ,https://b.test ").unwrap(),
            vec!["http://a.test".to_string(), "https://b.test".to_string()]
        );

        let err = parse_origins("http://a.test,*").unwrap_err();
        assert!(err.to_string().contains("wildcard origin"));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pagination_per_page, 100);
        assert_eq!(settings.pagination_max_page_size, 200);
        assert!(settings.env.is_dev());
    }
}
