use anyhow::Result;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validation::{ConfigValidator, ValidationUtils};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub notifier: NotifierConfig,
    pub api: ApiConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlite 连接串，例如 sqlite:tasks.db
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub enabled: bool,
    /// 到期扫描周期，设计默认 30 秒
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:tasks.db".to_string(),
                max_connections: 5,
                min_connections: 1,
                connection_timeout_seconds: 30,
            },
            notifier: NotifierConfig {
                enabled: true,
                poll_interval_seconds: 30,
            },
            api: ApiConfig {
                enabled: true,
                bind_address: "127.0.0.1:8080".to_string(),
                cors_enabled: true,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 加载配置：指定路径 > 默认路径 > 内置默认值，
    /// TASKMAN_ 前缀的环境变量可以覆盖任意字段
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = [
                "config/taskman.toml",
                "taskman.toml",
                "/etc/taskman/config.toml",
            ];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        let defaults = AppConfig::default();
        builder = builder
            .set_default("database.url", defaults.database.url.clone())?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default("notifier.enabled", defaults.notifier.enabled)?
            .set_default(
                "notifier.poll_interval_seconds",
                defaults.notifier.poll_interval_seconds,
            )?
            .set_default("api.enabled", defaults.api.enabled)?
            .set_default("api.bind_address", defaults.api.bind_address.clone())?
            .set_default("api.cors_enabled", defaults.api.cors_enabled)?
            .set_default(
                "observability.log_level",
                defaults.observability.log_level.clone(),
            )?;

        builder = builder.add_source(Environment::with_prefix("TASKMAN").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(config)
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.database.validate()?;
        self.notifier.validate()?;
        self.api.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl ConfigValidator for DatabaseConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.url, "database.url")?;

        if !self.url.starts_with("sqlite:") {
            return Err(crate::ConfigError::Validation(
                "database.url must start with sqlite:".to_string(),
            ));
        }

        ValidationUtils::validate_count(self.max_connections as usize, "database.max_connections")?;
        ValidationUtils::validate_count(self.min_connections as usize, "database.min_connections")?;

        if self.min_connections > self.max_connections {
            return Err(crate::ConfigError::Validation(
                "database.min_connections must be less than or equal to max_connections"
                    .to_string(),
            ));
        }

        ValidationUtils::validate_interval_seconds(
            self.connection_timeout_seconds,
            "database.connection_timeout_seconds",
        )?;

        Ok(())
    }
}

impl ConfigValidator for NotifierConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_interval_seconds(
            self.poll_interval_seconds,
            "notifier.poll_interval_seconds",
        )
    }
}

impl ConfigValidator for ApiConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_bind_address(&self.bind_address, "api.bind_address")
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        match self.observability_level() {
            Some(_) => Ok(()),
            None => Err(crate::ConfigError::Validation(format!(
                "observability.log_level must be one of trace/debug/info/warn/error, got {}",
                self.log_level
            ))),
        }
    }
}

impl ObservabilityConfig {
    fn observability_level(&self) -> Option<&str> {
        match self.log_level.as_str() {
            l @ ("trace" | "debug" | "info" | "warn" | "error") => Some(l),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.notifier.poll_interval_seconds, 30);
    }

    #[test]
    fn test_database_config_validation() {
        let mut config = AppConfig::default().database;
        assert!(config.validate().is_ok());

        config.url = "postgresql://localhost/taskman".to_string();
        assert!(config.validate().is_err());

        config.url = "".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_notifier_interval_bounds() {
        let mut config = AppConfig::default().notifier;
        config.poll_interval_seconds = 0;
        assert!(config.validate().is_err());

        config.poll_interval_seconds = 7200;
        assert!(config.validate().is_err());

        config.poll_interval_seconds = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_bind_address_validation() {
        let mut config = AppConfig::default().api;
        assert!(config.validate().is_ok());

        config.bind_address = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"

[notifier]
poll_interval_seconds = 5

[api]
bind_address = "127.0.0.1:9090"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.notifier.poll_interval_seconds, 5);
        assert_eq!(config.api.bind_address, "127.0.0.1:9090");
        // 未出现的段落取默认值
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/taskman.toml")).is_err());
    }
}
