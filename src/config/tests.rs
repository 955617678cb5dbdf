use std::io::Write;

use serial_test::serial;

use super::*;

fn render_cli(extra: &[&str]) -> CliArgs {
    let mut args = vec!["forumdown", "render"];
    args.extend_from_slice(extra);
    args.push("post.html");
    CliArgs::parse_from(args)
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.render.enable_caching = Some(true);

    raw.apply_logging_overrides(&LoggingOverrides {
        log_level: Some("debug".to_string()),
        log_json: Some(true),
    });
    raw.apply_render_overrides(&RenderOverrides {
        strict: true,
        no_cache: true,
        no_images: false,
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert!(!settings.render.enable_caching);
    assert!(settings.render.crash_on_unsupported_tags);
    assert!(settings.render.enable_images);
}

#[test]
fn defaults_match_the_cache_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(CacheConfig::from(&settings.cache), CacheConfig::default());
    assert_eq!(settings.logging.level, LevelFilter::INFO);

    let configuration = settings.render.configuration();
    assert!(configuration.enable_caching);
    assert!(!configuration.crash_on_unsupported_tags);
    assert_eq!(configuration.image_quality, ImageQuality::High);
}

#[test]
fn zero_cache_limits_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.document_count_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero limit must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.document_count_limit",
            ..
        }
    ));
}

#[test]
fn unknown_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level must fail");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn invalid_stylesheet_is_rejected() {
    let mut stylesheet = Stylesheet::default();
    stylesheet.body.font_size = 0.0;
    let raw = RawSettings {
        stylesheet: Some(stylesheet),
        ..Default::default()
    };

    let err = Settings::from_raw(raw).expect_err("zero font size must fail");
    assert!(matches!(err, LoadError::Invalid { key: "stylesheet", .. }));
}

#[test]
fn render_flags_parse() {
    let args = render_cli(&["--json", "--strict", "--no-cache"]);
    let Command::Render(render) = args.command else {
        panic!("expected render command");
    };
    assert!(render.json);
    assert!(!render.styled);
    assert!(render.overrides.strict);
    assert!(render.overrides.no_cache);
    assert_eq!(render.files.len(), 1);
}

#[test]
fn log_json_accepts_boolish_values() {
    let args = CliArgs::parse_from(["forumdown", "mentions", "hi @bob", "--log-json", "yes"]);
    assert_eq!(args.logging.log_json, Some(true));
    assert!(matches!(args.command, Command::Mentions(ref mentions) if mentions.text == "hi @bob"));
}

#[test]
#[serial]
fn config_file_layers_under_cli_overrides() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[render]\nenable_images = false\nenable_caching = true\n\n[stylesheet.body]\nfont_size = 18.0\n\n[cache]\nelement_count_limit = 7"
    )
    .expect("write config");

    let mut args = render_cli(&["--no-cache"]);
    args.config_file = Some(file.path().to_path_buf());
    let settings = load(&args).expect("settings load");

    assert!(!settings.render.enable_images);
    assert!(!settings.render.enable_caching);
    assert_eq!(settings.render.stylesheet.body.font_size, 18.0);
    assert_eq!(settings.cache.element_count_limit, 7);
}

#[test]
#[serial]
fn environment_overrides_defaults() {
    // SAFETY: serialised with every other test that touches the environment.
    unsafe { std::env::set_var("FORUMDOWN_CACHE__MARKDOWN_COUNT_LIMIT", "42") };
    let loaded = load(&render_cli(&[]));
    unsafe { std::env::remove_var("FORUMDOWN_CACHE__MARKDOWN_COUNT_LIMIT") };

    let settings = loaded.expect("settings load");
    assert_eq!(settings.cache.markdown_count_limit, 42);
}
