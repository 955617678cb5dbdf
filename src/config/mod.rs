//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{str::FromStr, sync::Arc};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;
use crate::domain::{ImageQuality, RenderConfiguration, Stylesheet};

pub use cli::{
    CliArgs, Command, LoggingOverrides, MentionsArgs, RenderArgs, RenderOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "forumdown";
const ENV_PREFIX: &str = "FORUMDOWN";

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Validated cache limits; every limit is non-zero.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub markdown_cost_limit: usize,
    pub markdown_count_limit: usize,
    pub document_cost_limit: usize,
    pub document_count_limit: usize,
    pub element_cost_limit: usize,
    pub element_count_limit: usize,
    pub pressure_escalation_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub enable_caching: bool,
    pub enable_images: bool,
    pub enable_code_highlighting: bool,
    pub image_quality: ImageQuality,
    pub crash_on_unsupported_tags: bool,
    pub stylesheet: Arc<Stylesheet>,
}

impl RenderSettings {
    /// Per-call configuration handed to the render coordinator.
    pub fn configuration(&self) -> RenderConfiguration {
        RenderConfiguration {
            stylesheet: Arc::clone(&self.stylesheet),
            enable_caching: self.enable_caching,
            enable_images: self.enable_images,
            enable_code_highlighting: self.enable_code_highlighting,
            image_quality: self.image_quality,
            crash_on_unsupported_tags: self.crash_on_unsupported_tags,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    if let Command::Render(args) = &cli.command {
        raw.apply_render_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

/// Parse the process arguments and load settings for them.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    render: RawRenderSettings,
    stylesheet: Option<Stylesheet>,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if overrides.strict {
            self.render.crash_on_unsupported_tags = Some(true);
        }
        if overrides.no_cache {
            self.render.enable_caching = Some(false);
        }
        if overrides.no_images {
            self.render.enable_images = Some(false);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    markdown_cost_limit: Option<usize>,
    markdown_count_limit: Option<usize>,
    document_cost_limit: Option<usize>,
    document_count_limit: Option<usize>,
    element_cost_limit: Option<usize>,
    element_count_limit: Option<usize>,
    pressure_escalation_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    enable_caching: Option<bool>,
    enable_images: Option<bool>,
    enable_code_highlighting: Option<bool>,
    image_quality: Option<ImageQuality>,
    crash_on_unsupported_tags: Option<bool>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let logging = build_logging_settings(raw.logging)?;
        let cache = build_cache_settings(raw.cache)?;
        let render = build_render_settings(raw.render, raw.stylesheet.unwrap_or_default())?;

        Ok(Self {
            logging,
            cache,
            render,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let defaults = CacheConfig::default();

    Ok(CacheSettings {
        markdown_cost_limit: positive(
            "cache.markdown_cost_limit",
            cache.markdown_cost_limit,
            defaults.markdown_cost_limit,
        )?,
        markdown_count_limit: positive(
            "cache.markdown_count_limit",
            cache.markdown_count_limit,
            defaults.markdown_count_limit,
        )?,
        document_cost_limit: positive(
            "cache.document_cost_limit",
            cache.document_cost_limit,
            defaults.document_cost_limit,
        )?,
        document_count_limit: positive(
            "cache.document_count_limit",
            cache.document_count_limit,
            defaults.document_count_limit,
        )?,
        element_cost_limit: positive(
            "cache.element_cost_limit",
            cache.element_cost_limit,
            defaults.element_cost_limit,
        )?,
        element_count_limit: positive(
            "cache.element_count_limit",
            cache.element_count_limit,
            defaults.element_count_limit,
        )?,
        pressure_escalation_ms: cache
            .pressure_escalation_ms
            .unwrap_or(defaults.pressure_escalation_ms),
    })
}

fn positive(key: &'static str, value: Option<usize>, default: usize) -> Result<usize, LoadError> {
    match value {
        Some(0) => Err(LoadError::invalid(key, "must be greater than zero")),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

fn build_render_settings(
    render: RawRenderSettings,
    stylesheet: Stylesheet,
) -> Result<RenderSettings, LoadError> {
    stylesheet
        .validate()
        .map_err(|err| LoadError::invalid("stylesheet", err.to_string()))?;

    let defaults = RenderConfiguration::default();
    Ok(RenderSettings {
        enable_caching: render.enable_caching.unwrap_or(defaults.enable_caching),
        enable_images: render.enable_images.unwrap_or(defaults.enable_images),
        enable_code_highlighting: render
            .enable_code_highlighting
            .unwrap_or(defaults.enable_code_highlighting),
        image_quality: render.image_quality.unwrap_or(defaults.image_quality),
        crash_on_unsupported_tags: render
            .crash_on_unsupported_tags
            .unwrap_or(defaults.crash_on_unsupported_tags),
        stylesheet: Arc::new(stylesheet),
    })
}

#[cfg(test)]
mod tests;
