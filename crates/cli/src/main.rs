use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sfguard_core::bypass::BypassOutcome;
use sfguard_core::config::Config;
use sfguard_core::naming::NamingOutcome;
use sfguard_core::parser::{load_metadata_dir, ParseMode};
use sfguard_core::report::{Report, ReportInputs};
use sfguard_core::response::Response;
use sfguard_core::scoring::Rating;
use sfguard_core::types::{FieldRecord, Priority, TriggerRecord, ValidationRuleRecord};
use sfguard_core::{
    analyze_apex_triggers_with, analyze_naming_conventions_with, analyze_validation_rules_with,
    generate_report_with, rules::RuleRegistry,
};

const MAX_TOTAL_BYTES_SCANNED: u64 = 64 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(
    name = "sfguard",
    version,
    about = "Configuration health analysis for Salesforce/nCino metadata"
)]
struct Cli {
    /// Config file (defaults to ./sfguard.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check field API names against the naming rules.
    Naming {
        #[arg(long)]
        input: PathBuf,
    },
    /// Scan validation rule formulas for bypass patterns.
    Validation {
        #[arg(long)]
        input: PathBuf,
    },
    /// Scan Apex trigger sources for bypass patterns.
    Triggers {
        #[arg(long)]
        input: PathBuf,
    },
    /// Aggregate previously produced analysis responses into one report.
    Report {
        #[arg(long)]
        naming: Option<PathBuf>,

        #[arg(long)]
        validation: Option<PathBuf>,

        #[arg(long)]
        triggers: Option<PathBuf>,
    },
    /// Load a metadata directory, run every analysis and write the report.
    Analyze {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value = "sfguard-out")]
        out: PathBuf,

        #[arg(long)]
        strict: bool,

        #[arg(long)]
        min_score: Option<u8>,

        #[arg(long, default_value = "all")]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    All,
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    blue: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    blue: "\x1b[38;5;33m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    blue: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init();
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref());

    let res = match cli.cmd {
        Commands::Naming { input } => read_records::<FieldRecord>(&input).and_then(|fields| {
            let response = analyze_naming_conventions_with(RuleRegistry::builtin(), &cfg, &fields);
            print_response(&response)
        }),
        Commands::Validation { input } => {
            read_records::<ValidationRuleRecord>(&input).and_then(|rules| {
                let response =
                    analyze_validation_rules_with(RuleRegistry::builtin(), &cfg, &rules);
                print_response(&response)
            })
        }
        Commands::Triggers { input } => read_records::<TriggerRecord>(&input).and_then(|triggers| {
            let response = analyze_apex_triggers_with(RuleRegistry::builtin(), &cfg, &triggers);
            print_response(&response)
        }),
        Commands::Report {
            naming,
            validation,
            triggers,
        } => run_report(&cfg, naming.as_deref(), validation.as_deref(), triggers.as_deref()),
        Commands::Analyze {
            input,
            out,
            strict,
            min_score,
            output_format,
        } => {
            let strict = strict || cfg.strict.unwrap_or(false);
            let min_score = min_score.or(cfg.min_score);
            run_analyze(&cfg, &input, &out, strict, min_score, &output_format)
        }
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse json {}", path.display()))
}

fn read_outcome<T: DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let response: Response<T> = serde_json::from_str(&contents)
        .with_context(|| format!("parse response {}", path.display()))?;
    let outcome = response
        .into_result()
        .with_context(|| format!("{} holds a failed analysis", path.display()))?;
    Ok(Some(outcome))
}

/// Prints the response JSON on stdout. A failed response exits 1.
fn print_response<T: Serialize>(
    response: &Response<T>,
) -> anyhow::Result<std::process::ExitCode> {
    let json = serde_json::to_string_pretty(response).context("serialize response json")?;
    println!("{json}");
    Ok(if response.success {
        std::process::ExitCode::SUCCESS
    } else {
        std::process::ExitCode::from(1)
    })
}

fn run_report(
    cfg: &Config,
    naming: Option<&Path>,
    validation: Option<&Path>,
    triggers: Option<&Path>,
) -> anyhow::Result<std::process::ExitCode> {
    let inputs = ReportInputs {
        naming_results: read_outcome::<NamingOutcome>(naming)?,
        validation_results: read_outcome::<BypassOutcome>(validation)?,
        trigger_results: read_outcome::<BypassOutcome>(triggers)?,
    };
    print_response(&generate_report_with(cfg, &inputs))
}

fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}sf{reset}{blue}|{reset}{dim}guard{reset}  {dim}configuration health analysis{reset}\n",
        bold = s.bold,
        blue = s.blue,
        dim = s.dim,
        reset = s.reset,
    );
}

fn rating_color(rating: Rating) -> &'static str {
    let s = style();
    match rating {
        Rating::Excellent | Rating::Good => s.green,
        Rating::Fair => s.yellow,
        Rating::Poor | Rating::Critical => s.red,
    }
}

fn priority_color(priority: Priority) -> &'static str {
    let s = style();
    match priority {
        Priority::High => s.red,
        Priority::Medium => s.yellow,
        Priority::Low => s.dim,
    }
}

fn print_report(report: &Report, out: &Path, written: &[PathBuf]) {
    let s = style();
    let overall = &report.overall_score;

    match (overall.score, overall.rating) {
        (Some(score), Some(rating)) => eprintln!(
            "  {dim}overall_score        {reset}{rc}{bold}{} ({}){reset}",
            score,
            rating,
            dim = s.dim,
            rc = rating_color(rating),
            bold = s.bold,
            reset = s.reset
        ),
        _ => eprintln!(
            "  {dim}overall_score        {reset}{bold}n/a{reset}",
            dim = s.dim,
            bold = s.bold,
            reset = s.reset
        ),
    }
    for (component, score) in overall.component_scores.iter() {
        eprintln!(
            "  {dim}{:<21}{reset}{bold}{}{reset}",
            component.title(),
            score,
            dim = s.dim,
            bold = s.bold,
            reset = s.reset
        );
    }

    if !report.executive_summary.key_findings.is_empty() {
        eprintln!();
        for finding in &report.executive_summary.key_findings {
            eprintln!("  {}", finding);
        }
    }

    if !report.recommendations.is_empty() {
        eprintln!();
        for rec in &report.recommendations {
            eprintln!(
                "  {pc}{:?}{reset}  {}",
                rec.priority,
                rec.text,
                pc = priority_color(rec.priority),
                reset = s.reset
            );
        }
    }

    eprintln!();
    for path in written {
        eprintln!(
            "  {dim}\u{2192} {}{reset}",
            path.display(),
            dim = s.dim,
            reset = s.reset
        );
    }
    if written.is_empty() {
        eprintln!(
            "  {dim}\u{2192} {} (nothing written){reset}",
            out.display(),
            dim = s.dim,
            reset = s.reset
        );
    }
    eprintln!();
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| {
            eprintln!(
                "{}{}warning:{} failed to load config {}: {:#}",
                style().bold,
                style().yellow,
                style().reset,
                p.display(),
                e
            );
            Config::default()
        }),
        None => Config::discover().unwrap_or_default(),
    }
}

fn run_analyze(
    cfg: &Config,
    input: &Path,
    out: &Path,
    strict: bool,
    min_score: Option<u8>,
    output_format: &OutputFormat,
) -> anyhow::Result<std::process::ExitCode> {
    let s = style();

    print_banner();

    let mode = if strict {
        ParseMode::Strict
    } else {
        ParseMode::BestEffort
    };
    let bundle = load_metadata_dir(input, mode, MAX_TOTAL_BYTES_SCANNED)?;
    for warning in &bundle.warnings {
        eprintln!(
            "  {yellow}warning:{reset} {}",
            warning,
            yellow = s.yellow,
            reset = s.reset
        );
    }

    eprintln!(
        "  {dim}loaded {} metadata files from {}{reset}\n",
        bundle.sources.len(),
        input.display(),
        dim = s.dim,
        reset = s.reset
    );

    let registry = RuleRegistry::builtin();
    let inputs = ReportInputs {
        naming_results: component(&bundle.fields, strict, |fields| {
            analyze_naming_conventions_with(registry, cfg, fields)
        })?,
        validation_results: component(&bundle.validation_rules, strict, |rules| {
            analyze_validation_rules_with(registry, cfg, rules)
        })?,
        trigger_results: component(&bundle.triggers, strict, |triggers| {
            analyze_apex_triggers_with(registry, cfg, triggers)
        })?,
    };
    let report = generate_report_with(cfg, &inputs).into_result()?.report;

    std::fs::create_dir_all(out).with_context(|| format!("create out dir {}", out.display()))?;

    let mut written = Vec::new();
    if matches!(output_format, OutputFormat::Json | OutputFormat::All) {
        let json_path = out.join("report.json");
        let json = serde_json::to_vec_pretty(&report).context("serialize report json")?;
        std::fs::write(&json_path, json)
            .with_context(|| format!("write {}", json_path.display()))?;
        written.push(json_path);
    }
    if matches!(output_format, OutputFormat::Markdown | OutputFormat::All) {
        let md_path = out.join("report.md");
        std::fs::write(&md_path, report.to_markdown())
            .with_context(|| format!("write {}", md_path.display()))?;
        written.push(md_path);
    }

    // Machine-parseable line on stdout
    match (report.overall_score.score, report.overall_score.rating) {
        (Some(score), Some(rating)) => println!("overall_score={score} rating={rating}"),
        _ => println!("overall_score=none rating=none"),
    }

    // Human-readable output on stderr
    print_report(&report, out, &written);

    let below = match (min_score, report.overall_score.score) {
        (Some(min), Some(score)) => score < min,
        _ => false,
    };
    let exit = if below {
        eprintln!(
            "  {red}{bold}SCORE BELOW MINIMUM{reset}  {dim}({} < {}){reset}",
            report.overall_score.score.unwrap_or_default(),
            min_score.unwrap_or_default(),
            red = s.red,
            bold = s.bold,
            dim = s.dim,
            reset = s.reset,
        );
        std::process::ExitCode::from(2)
    } else {
        eprintln!(
            "  {green}{bold}PASS{reset}",
            green = s.green,
            bold = s.bold,
            reset = s.reset
        );
        std::process::ExitCode::from(0)
    };

    eprintln!();

    Ok(exit)
}

/// Runs `analyze` only when records were loaded. A failed analysis (every
/// record lacks an identifier) aborts a strict run and otherwise leaves the
/// component out of the report.
fn component<R, T>(
    records: &[R],
    strict: bool,
    analyze: impl FnOnce(&[R]) -> Response<T>,
) -> anyhow::Result<Option<T>> {
    if records.is_empty() {
        return Ok(None);
    }
    match analyze(records).into_result() {
        Ok(outcome) => Ok(Some(outcome)),
        Err(e) if strict => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "component left out of the report");
            Ok(None)
        }
    }
}
