// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use runtime::{SharedSource, SourceRuntime};
use sheetboard_app::BoardState;
use sheetboard_app::dates::local_now;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const DEMO_SEED: u64 = 42;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `sheetboard --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let (views, source) = if options.demo {
        let source: SharedSource = Arc::new(sheetboard_testkit::FixtureSource::demo(
            DEMO_SEED,
            local_now(),
        ));
        (sheetboard_testkit::demo_views(), source)
    } else {
        let client = sheetboard_gviz::Client::new(
            config.base_url(),
            &config.sheet_id()?,
            config.timeout()?,
        )
        .with_context(|| {
            format!(
                "invalid [source] config in {}; fix sheet_id/base_url/timeout values",
                options.config_path.display()
            )
        })?;
        let source: SharedSource = Arc::new(client);
        (config.view_configs()?, source)
    };
    let timing = config.timing()?;
    if options.check_only {
        return Ok(());
    }

    if options.dump {
        logging::init_to_stderr()?;
    } else {
        logging::init_to_file(&config.log_file()?)?;
    }
    info!(
        views = views.len(),
        demo = options.demo,
        config = %options.config_path.display(),
        "starting sheetboard"
    );

    let mut state = BoardState::new(
        config.title(),
        views,
        config.layout(),
        config.scroll_rows_per_second(),
    );
    let mut runtime = SourceRuntime::new(source);

    if options.dump {
        print!("{}", runtime::dump(&mut state, &mut runtime));
        if let Some(error) = &state.last_error {
            bail!("refresh failed: {error}");
        }
        return Ok(());
    }

    sheetboard_tui::run_app(&mut state, &mut runtime, timing)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    dump: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        demo: false,
        dump: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--dump" => {
                options.dump = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("sheetboard");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Show generated demo tables instead of a live sheet");
    println!("  --dump                   Refresh once, print every view as text, and exit");
    println!("  --check                  Validate config and source settings");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/sheetboard-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                demo: false,
                dump: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_demo_and_dump_flags() -> Result<()> {
        let options = parse_cli_args(vec!["--demo", "--dump"], default_options_path())?;
        assert!(options.demo);
        assert!(options.dump);
        assert!(!options.print_config_path);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
