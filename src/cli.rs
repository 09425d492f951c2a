//! Command-line interface for oascheck.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzer::Analyzer;
use crate::config::{self, Config, DEFAULT_CONFIG_NAMES};
use crate::discover;
use crate::document::Format;
use crate::error::AnalysisError;
use crate::fetch::{self, Fetcher};
use crate::report::{self, OutputFormat, Subject};
use crate::result::{AnalysisReport, FileReport, RepositoryReport};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Quality analysis for OpenAPI and Swagger documents.
///
/// oascheck loads an API description (local file, directory, or URL),
/// runs validation, security, performance, design, governance, compliance,
/// documentation, monitoring and testing checks, and scores the result.
#[derive(Parser)]
#[command(name = "oascheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a specification file, directory, or URL
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// File, directory, or http(s) URL to analyze
    #[arg(env = "INPUT_SPEC_URL")]
    pub source: String,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long, env = "OASCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the rendered report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum acceptable maintainability score (exit non-zero if below)
    #[arg(long)]
    pub min_maintainability: Option<f64>,

    /// Exit non-zero when any finding is reported
    #[arg(long)]
    pub fail_on_findings: bool,

    /// Bearer token sent when fetching a URL
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "oascheck.yaml")]
    pub output: PathBuf,
}

/// Where the analyzed document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Directory(PathBuf),
    File(PathBuf),
}

impl Source {
    /// Classify a source argument. Local paths must exist.
    pub fn classify(source: &str) -> anyhow::Result<Self> {
        if fetch::is_url(source) {
            return Ok(Source::Url(source.to_string()));
        }
        let path = PathBuf::from(source);
        let metadata = std::fs::metadata(&path)
            .map_err(|e| anyhow::anyhow!("cannot access {}: {}", path.display(), e))?;
        if metadata.is_dir() {
            Ok(Source::Directory(path))
        } else {
            Ok(Source::File(path))
        }
    }
}

/// Load the configuration: explicit path, then auto-discovery, then defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(dir),
    };
    let config = match &path {
        Some(p) => Config::parse_file(p)
            .map_err(|e| anyhow::anyhow!("error parsing config {}: {}", p.display(), e))?,
        None => Config::default(),
    };
    config::validate(&config).map_err(|e| anyhow::anyhow!("invalid config: {}", e))?;
    Ok((config, path))
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let (config, config_path) = load_config(args.config.as_deref(), Path::new("."))?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "using configuration");
    }

    let source = Source::classify(&args.source)?;
    let analyzer = Analyzer::new(&config);

    match source {
        Source::Directory(root) => {
            let files = discover::discover_files(&root, &config.discovery)?;
            if files.is_empty() {
                eprintln!("Warning: no specification files found in {}", root.display());
            }
            let openapi_files = files
                .into_iter()
                .map(|file| FileReport {
                    report: analyzer.analyze_bytes(&file.bytes, file.format),
                    file_info: file.info,
                })
                .collect();
            let repo = RepositoryReport {
                repository: discover::repository_info(&root),
                openapi_files,
            };

            let rendered = report::render(args.format, Subject::Repository(&repo))?;
            report::emit(&rendered, args.output.as_deref())?;

            if !repo.all_succeeded() {
                return Ok(EXIT_ERROR);
            }
            Ok(gate(args, repo.min_maintainability(), repo.total_findings()))
        }
        Source::File(path) => {
            let bytes = std::fs::read(&path)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
            let hint = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(Format::from_extension);
            let result = analyzer.analyze_bytes(&bytes, hint);
            finish(args, &args.source, &result)
        }
        Source::Url(url) => {
            let result = match Fetcher::new(args.token.clone()).and_then(|f| f.fetch_blocking(&url)) {
                Ok(fetched) => analyzer.analyze_bytes(&fetched.bytes, fetched.format),
                Err(e) => analyzer.report_error(&AnalysisError::from(e)),
            };
            finish(args, &url, &result)
        }
    }
}

fn finish(args: &AnalyzeArgs, source: &str, result: &AnalysisReport) -> anyhow::Result<i32> {
    let rendered = report::render(
        args.format,
        Subject::File {
            source,
            report: result,
        },
    )?;
    report::emit(&rendered, args.output.as_deref())?;

    if !result.is_success() {
        return Ok(EXIT_ERROR);
    }
    Ok(gate(
        args,
        Some(result.maintainability_score),
        result.total_findings,
    ))
}

/// Apply the quality gate flags.
fn gate(args: &AnalyzeArgs, maintainability: Option<f64>, findings: usize) -> i32 {
    if let (Some(min), Some(score)) = (args.min_maintainability, maintainability) {
        if score < min {
            return EXIT_FAILED;
        }
    }
    if args.fail_on_findings && findings > 0 {
        return EXIT_FAILED;
    }
    EXIT_SUCCESS
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let content = serde_yaml::to_string(&Config::default())?;
    if let Err(e) = std::fs::write(&args.output, content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to tune vocabularies, weights and rules", args.output.display());
    if DEFAULT_CONFIG_NAMES.iter().any(|n| args.output.ends_with(n)) {
        println!("  2. Run: oascheck analyze openapi.yaml");
    } else {
        println!(
            "  2. Run: oascheck analyze openapi.yaml --config {}",
            args.output.display()
        );
    }

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn analyze_args(source: &str) -> AnalyzeArgs {
        AnalyzeArgs {
            source: source.to_string(),
            config: None,
            format: OutputFormat::Outputs,
            output: None,
            min_maintainability: None,
            fail_on_findings: false,
            token: None,
        }
    }

    #[test]
    fn test_classify_source() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("openapi.yaml");
        std::fs::write(&file, "openapi: 3.0.0").unwrap();

        assert_eq!(
            Source::classify("https://example.com/openapi.json").unwrap(),
            Source::Url("https://example.com/openapi.json".to_string())
        );
        assert_eq!(
            Source::classify(temp.path().to_str().unwrap()).unwrap(),
            Source::Directory(temp.path().to_path_buf())
        );
        assert_eq!(
            Source::classify(file.to_str().unwrap()).unwrap(),
            Source::File(file.clone())
        );
        assert!(Source::classify(temp.path().join("missing.yaml").to_str().unwrap()).is_err());
    }

    #[test]
    fn test_gate() {
        let mut args = analyze_args("x");
        assert_eq!(gate(&args, Some(40.0), 3), EXIT_SUCCESS);

        args.min_maintainability = Some(50.0);
        assert_eq!(gate(&args, Some(40.0), 0), EXIT_FAILED);
        assert_eq!(gate(&args, Some(50.0), 0), EXIT_SUCCESS);
        // No successful file means nothing to compare against.
        assert_eq!(gate(&args, None, 0), EXIT_SUCCESS);

        args.fail_on_findings = true;
        assert_eq!(gate(&args, Some(90.0), 1), EXIT_FAILED);
    }

    #[test]
    fn test_load_config_discovers_and_validates() {
        let temp = TempDir::new().unwrap();
        let (config, path) = load_config(None, temp.path()).unwrap();
        assert!(path.is_none());
        assert!(config.parallel);

        std::fs::write(temp.path().join("oascheck.yaml"), "parallel: false\n").unwrap();
        let (config, path) = load_config(None, temp.path()).unwrap();
        assert!(path.is_some());
        assert!(!config.parallel);

        let bad = temp.path().join("bad.yaml");
        std::fs::write(&bad, "disabled_rules: [nope]\n").unwrap();
        let err = load_config(Some(&bad), temp.path()).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_init_writes_default_config() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("conf/oascheck.yaml");
        let args = InitArgs {
            output: output.clone(),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);

        let config = Config::parse_file(&output).unwrap();
        config::validate(&config).unwrap();
        assert_eq!(
            config.vocabulary.sensitive_properties,
            Config::default().vocabulary.sensitive_properties
        );

        // Refuses to overwrite
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_analyze_file_writes_outputs() {
        let temp = TempDir::new().unwrap();
        let spec = temp.path().join("openapi.json");
        std::fs::write(
            &spec,
            r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": {}}"#,
        )
        .unwrap();
        let output = temp.path().join("out.txt");

        let mut args = analyze_args(spec.to_str().unwrap());
        args.config = Some(temp.path().join("missing.yaml"));
        // An explicit config that does not exist is an error.
        assert!(run_analyze(&args).is_err());

        args.config = None;
        args.output = Some(output.clone());
        assert_eq!(run_analyze(&args).unwrap(), EXIT_SUCCESS);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("status=success"));
        assert!(written.contains("paths_count=0"));
    }

    #[test]
    fn test_analyze_malformed_file_is_error_exit() {
        let temp = TempDir::new().unwrap();
        let spec = temp.path().join("openapi.yaml");
        std::fs::write(&spec, "- just\n- a list\n").unwrap();
        let mut args = analyze_args(spec.to_str().unwrap());
        args.output = Some(temp.path().join("out.txt"));
        assert_eq!(run_analyze(&args).unwrap(), EXIT_ERROR);
    }
}
