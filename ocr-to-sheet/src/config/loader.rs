//! Configuration loading from files and environment variables.

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};

use crate::error::{ConfigError, PipelineResult};

use super::AppConfig;

/// Load configuration from `ocr-to-sheet.*` in the working directory and
/// `OCR_TO_SHEET__*` environment variables
pub fn load_config() -> PipelineResult<AppConfig> {
    load_config_with(
        Config::builder()
            .add_source(File::with_name("ocr-to-sheet").required(false))
            .add_source(
                Environment::with_prefix("OCR_TO_SHEET")
                    .separator("__")
                    .try_parsing(true),
            ),
    )
}

/// Build and validate configuration from caller-provided sources
pub fn load_config_with(builder: ConfigBuilder<DefaultState>) -> PipelineResult<AppConfig> {
    let config: AppConfig = builder
        .build()
        .map_err(|e| ConfigError::Load {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ConfigError::Load {
            message: format!("Failed to deserialize config: {}", e),
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let required = [
        ("source.bucket", &config.source.bucket),
        ("source.key", &config.source.key),
        ("sheets.target_range", &config.sheets.target_range),
        ("sheets.document_base_url", &config.sheets.document_base_url),
    ];

    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("{} must not be empty", name),
            });
        }
    }

    Ok(())
}
