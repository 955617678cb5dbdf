use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the forumdown binary.
#[derive(Debug, Parser)]
#[command(
    name = "forumdown",
    version,
    about = "Render forum HTML into styled documents"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FORUMDOWN_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render HTML files into content elements or styled documents.
    Render(RenderArgs),
    /// List the @mentions found in a piece of text.
    Mentions(MentionsArgs),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// HTML files to render; `-` reads standard input.
    #[arg(required = true, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Print results as JSON instead of plain text.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    /// Render one styled document per file instead of content elements.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub styled: bool,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Fail on HTML tags the converter cannot express.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub strict: bool,

    /// Bypass the content cache for this run.
    #[arg(long = "no-cache", action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,

    /// Drop standalone images from the output.
    #[arg(long = "no-images", action = clap::ArgAction::SetTrue)]
    pub no_images: bool,
}

#[derive(Debug, Args, Clone)]
pub struct MentionsArgs {
    /// Text to scan.
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Print mentions as JSON.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override logging level (e.g. info, debug).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging output.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}
