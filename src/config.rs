use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Default session threshold. Without it, every search needs an explicit one.
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: None,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            config.db.url = url;
        }
    }

    Ok(config)
}

/// Parse and validate configuration text, without environment overrides.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.db.url.trim().is_empty() {
        anyhow::bail!("db.url must not be empty");
    }

    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be >= 1");
    }

    if let Some(threshold) = config.search.similarity_threshold {
        if !(threshold > 0.0 && threshold <= 1.0) {
            anyhow::bail!("search.similarity_threshold must be in (0.0, 1.0]");
        }
    }

    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[db]
url = "postgres://localhost/articles"
"#;

    #[test]
    fn test_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.db.max_connections, 5);
        assert_eq!(config.search.similarity_threshold, None);
        assert_eq!(config.search.limit, 20);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
[db]
url = "postgres://u:p@db:5432/x"
max_connections = 2

[search]
similarity_threshold = 0.3
limit = 5

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.db.url, "postgres://u:p@db:5432/x");
        assert_eq!(config.db.max_connections, 2);
        assert_eq!(config.search.similarity_threshold, Some(0.3));
        assert_eq!(config.search.limit, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_db_section() {
        assert!(parse_config("[search]\nlimit = 3\n").is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        for bad in ["0.0", "1.5", "-0.2"] {
            let content = format!("{MINIMAL}\n[search]\nsimilarity_threshold = {bad}\n");
            let err = parse_config(&content).unwrap_err();
            assert!(err.to_string().contains("similarity_threshold"), "{err}");
        }
    }

    #[test]
    fn test_zero_limit() {
        let content = format!("{MINIMAL}\n[search]\nlimit = 0\n");
        assert!(parse_config(&content).is_err());
    }

    #[test]
    fn test_empty_url() {
        assert!(parse_config("[db]\nurl = \"\"\n").is_err());
    }
}
