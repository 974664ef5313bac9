use crate::app_error::{AppError, ExitCode};
use crate::config::{self, Config};
use crate::model::BuildRunResults;
use crate::output::{self, ConsoleSink, RenderOptions, Renderer, Verdict};
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, generate};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const DEFAULT_CONFIG_PATH: &str = "./step-report.yml";

#[derive(Debug, Parser)]
#[command(
    name = "step-report",
    version = version::VALUE,
    about = "Console reports for step-based build runs",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the banner shown before a workflow starts
    Workflow(WorkflowArgs),
    /// Print the boxed header shown before a step runs
    Step(StepArgs),
    /// Print the boxed result line of a finished step
    StepResult(StepResultArgs),
    /// Print the run summary and verdict of a results file
    Summary(ResultsArgs),
    /// List failed and skipped steps of a results file
    Status(ResultsArgs),
    /// Report a build that failed outside of its steps
    Fatal(FatalArgs),
    Validate(ValidateArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct WorkflowArgs {
    title: String,
}

#[derive(Debug, Args)]
struct StepArgs {
    index: usize,
    title: String,
}

#[derive(Debug, Args)]
struct StepResultArgs {
    title: String,

    /// Status name (success, failed, failed_skippable, skipped, skipped_with_run_if) or result code
    #[arg(long)]
    status: String,

    #[arg(long, default_value = "0s")]
    duration: String,

    #[arg(long = "exit-code", default_value_t = 0)]
    exit_code: i32,
}

#[derive(Debug, Args)]
struct ResultsArgs {
    results: PathBuf,
}

#[derive(Debug, Args)]
struct FatalArgs {
    message: String,

    /// RFC 3339 timestamp of the run start
    #[arg(long = "started-at")]
    started_at: String,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
        .context(AnsiColor::White.on_default())
        .context_value(AnsiColor::Cyan.on_default())
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    match cli.command {
        Commands::Workflow(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            renderer.render_workflow_header(&args.title)?;
            Ok(())
        }
        Commands::Step(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            renderer.render_step_header(&args.title, args.index)?;
            Ok(())
        }
        Commands::StepResult(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            run_step_result(&renderer, args)
        }
        Commands::Summary(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            let results = load_results(&args.results)?;
            finish(renderer.render_summary(&results)?)
        }
        Commands::Status(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            let results = load_results(&args.results)?;
            renderer.render_step_status(&results)?;
            Ok(())
        }
        Commands::Fatal(args) => {
            let renderer = console_renderer(&config_path, cli.config.is_some(), cli.no_color)?;
            let started_at = OffsetDateTime::parse(&args.started_at, &Rfc3339)
                .map_err(|e| AppError::usage(format!("--started-at: {e}")))?;
            finish(renderer.render_fatal_failure(started_at, &args.message)?)
        }
        Commands::Validate(args) => run_validate(&config_path, args),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn console_renderer(
    config_path: &Path,
    explicit_config: bool,
    no_color: bool,
) -> Result<Renderer<ConsoleSink>, AppError> {
    let color_default = output::colors_enabled();
    let mut options = match maybe_load_config(config_path, explicit_config)? {
        Some(cfg) => cfg.resolve_render_options(color_default),
        None => RenderOptions {
            color: color_default,
            ..RenderOptions::default()
        },
    };

    if no_color {
        options.color = false;
    }

    Ok(Renderer::new(ConsoleSink::stdout(), options))
}

fn maybe_load_config(path: &Path, explicit: bool) -> Result<Option<Config>, AppError> {
    if !path.exists() {
        if explicit {
            return Err(AppError::usage(format!(
                "config file {} not found",
                output::command(&path.display().to_string())
            )));
        }
        return Ok(None);
    }

    config::load(path).map(Some).map_err(|err| {
        if err.starts_with("read config:") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

fn load_results(path: &Path) -> Result<BuildRunResults, AppError> {
    BuildRunResults::load(path).map_err(|err| AppError::usage(err.to_string()))
}

fn run_step_result(
    renderer: &Renderer<ConsoleSink>,
    args: StepResultArgs,
) -> Result<(), AppError> {
    let duration = humantime::parse_duration(&args.duration)
        .map_err(|e| AppError::usage(format!("--duration: {e}")))?;

    renderer.render_step_summary_named(&args.title, &args.status, duration, args.exit_code)?;
    Ok(())
}

fn finish(verdict: Verdict) -> Result<(), AppError> {
    match verdict {
        Verdict::Continue => Ok(()),
        Verdict::Terminate => Err(AppError::reported(ExitCode::RuntimeFailure)),
    }
}

fn run_validate(config_path: &Path, args: ValidateArgs) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Issue<'a> {
        field: &'a str,
        message: &'a str,
    }

    #[derive(Serialize)]
    struct ValidateOutput<'a> {
        valid: bool,
        config: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        issues: Option<Vec<Issue<'a>>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
    }

    let config_path_text = config_path.display().to_string();

    let cfg = match config::parse(config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                print_json(&ValidateOutput {
                    valid: false,
                    config: &config_path_text,
                    issues: None,
                    error: Some(&err),
                })?;
            }
            return Err(AppError::usage(err));
        }
    };

    match config::validate(&cfg) {
        Ok(()) => {
            if args.json {
                print_json(&ValidateOutput {
                    valid: true,
                    config: &config_path_text,
                    issues: None,
                    error: None,
                })?;
            } else {
                println!(
                    "{} {}",
                    output::success("valid"),
                    output::command(&config_path_text)
                );
            }
            Ok(())
        }
        Err(err) => {
            if args.json {
                let issues: Vec<Issue<'_>> = err
                    .issues
                    .iter()
                    .map(|issue| Issue {
                        field: &issue.field,
                        message: &issue.message,
                    })
                    .collect();
                print_json(&ValidateOutput {
                    valid: false,
                    config: &config_path_text,
                    issues: Some(issues),
                    error: Some(&err.to_string()),
                })?;
            } else {
                for issue in err.issues.iter().skip(1) {
                    eprintln!(
                        "{} {}: {}",
                        output::warning("warn"),
                        output::accent(&issue.field),
                        issue.message
                    );
                }
            }
            Err(AppError::usage(err.to_string()))
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|e| AppError::internal(format!("encode validate json: {e}")))?;
    writeln!(stdout).map_err(|e| AppError::internal(format!("write output: {e}")))
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "step-report", writer);
    writer.flush()
}
