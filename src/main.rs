use std::{process, sync::Arc};

use forumdown::{
    application::{
        error::AppError,
        mentions::{self, Mention},
        render::{RenderCoordinator, RenderResult},
    },
    cache::{CacheConfig, ContentCache},
    config::{self, Command, MentionsArgs, RenderArgs, Settings},
    domain::{ContentElement, ElementKind, StyledDocument},
    infra::{
        input::{HtmlInput, read_inputs},
        telemetry,
    },
    util::format::{format_bytes, format_percent, preview},
};
use futures::future::join_all;
use serde::Serialize;
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

const PREVIEW_CHARS: usize = 60;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.chain(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.chain(), source = report.source, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Render(args) => run_render(settings, args).await,
        Command::Mentions(args) => run_mentions(args),
    }
}

#[derive(Serialize)]
struct ElementsOutput<'a> {
    input: &'a str,
    #[serde(flatten)]
    result: &'a RenderResult,
}

#[derive(Serialize)]
struct DocumentOutput<'a> {
    input: &'a str,
    document: &'a StyledDocument,
}

async fn run_render(settings: Settings, args: RenderArgs) -> Result<(), AppError> {
    let inputs = read_inputs(&args.files).await?;
    let cache = Arc::new(ContentCache::new(CacheConfig::from(&settings.cache)));
    let coordinator = RenderCoordinator::with_cache(cache);
    let configuration = settings.render.configuration();
    let show_names = inputs.len() > 1 && !args.json;

    info!(
        inputs = inputs.len(),
        styled = args.styled,
        caching = configuration.enable_caching,
        strict = configuration.crash_on_unsupported_tags,
        "Rendering inputs"
    );

    if args.styled {
        let outcomes = join_all(
            inputs
                .iter()
                .map(|input| coordinator.render_document(&input.html, &configuration)),
        )
        .await;
        for (input, outcome) in inputs.iter().zip(outcomes) {
            let document = outcome.map_err(|err| AppError::render(&input.name, err))?;
            if args.json {
                print_json(&DocumentOutput {
                    input: &input.name,
                    document: &document,
                })?;
            } else {
                print_header(input, show_names);
                println!("{}", document.plain_text());
            }
        }
    } else {
        let outcomes = join_all(
            inputs
                .iter()
                .map(|input| coordinator.render(&input.html, &configuration)),
        )
        .await;
        for (input, outcome) in inputs.iter().zip(outcomes) {
            let result = outcome.map_err(|err| AppError::render(&input.name, err))?;
            debug!(
                input = %input.name,
                elements = result.elements.len(),
                cache_hit = result.metadata.cache_hit,
                render_ms = result.metadata.render_time.as_secs_f64() * 1000.0,
                "Rendered input"
            );
            if args.json {
                print_json(&ElementsOutput {
                    input: &input.name,
                    result: &result,
                })?;
            } else {
                print_header(input, show_names);
                print_elements(&result.elements);
            }
        }
    }

    log_cache_statistics(&coordinator);
    Ok(())
}

fn run_mentions(args: MentionsArgs) -> Result<(), AppError> {
    let found = mentions::find_mentions(&args.text);
    if args.json {
        return print_json(&found);
    }

    for Mention {
        full_text,
        username,
        range,
    } in &found
    {
        let validity = if mentions::is_valid_username(username) {
            "valid"
        } else {
            "invalid"
        };
        println!("{full_text}\t{}..{}\t{validity}", range.start, range.end);
    }
    info!(count = found.len(), "Scanned mentions");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let line = serde_json::to_string(value)
        .map_err(|err| AppError::unexpected(format!("failed to serialize output: {err}")))?;
    println!("{line}");
    Ok(())
}

fn print_header(input: &HtmlInput, show: bool) {
    if show {
        println!("==> {} <==", input.name);
    }
}

fn print_elements(elements: &[ContentElement]) {
    for (index, element) in elements.iter().enumerate() {
        if index > 0 {
            println!();
        }
        match &element.kind {
            ElementKind::Heading { text, level } => {
                println!("{} {text}", "#".repeat(usize::from(*level)));
            }
            ElementKind::Text { document } => println!("{}", document.plain_text()),
            ElementKind::CodeBlock { code, language } => {
                println!("```{}", language.as_deref().unwrap_or_default());
                println!("{code}");
                println!("```");
            }
            ElementKind::Image { url, alt_text } => match url {
                Some(url) => println!("[image: {}] {url}", preview(alt_text, PREVIEW_CHARS)),
                None => println!("[image: {}] (invalid url)", preview(alt_text, PREVIEW_CHARS)),
            },
        }
    }
}

fn log_cache_statistics(coordinator: &RenderCoordinator) {
    let statistics = coordinator.cache_statistics();
    for tier in &statistics.tiers {
        info!(
            tier = tier.tier.as_str(),
            hits = tier.hits,
            misses = tier.misses,
            entries = tier.entries,
            cost = %format_bytes(tier.cost),
            cost_limit = %format_bytes(tier.cost_limit),
            hit_rate = %format_percent(tier.hit_rate()),
            "Cache tier statistics"
        );
    }
    info!(
        total_cost = %format_bytes(statistics.total_cost()),
        hit_rate = %format_percent(statistics.hit_rate()),
        "Cache statistics"
    );
}
