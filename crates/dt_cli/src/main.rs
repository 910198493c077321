mod config;
mod convert;
mod report;
mod tracing_config;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dt_ast::DtSyntax;
use dt_transform::{transform, TransformOutput};

use crate::config::Config;
use crate::convert::ConvertArgs;

#[derive(Parser)]
#[command(name = "detype", about = "detype: strip TypeScript types and keep the JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every .ts/.tsx/.mts/.cts file under a directory in place.
    Convert {
        dir: PathBuf,
        /// Report what would change without writing anything.
        #[arg(long)]
        dry_run: bool,
        /// Write the .js/.jsx files next to the originals instead of replacing them.
        #[arg(long)]
        keep_originals: bool,
        /// Number of worker threads.
        #[arg(short, long)]
        jobs: Option<usize>,
        /// File or directory name to skip (repeatable).
        #[arg(long, value_name = "NAME")]
        exclude: Vec<String>,
        /// JSON config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Strip one file and print the result.
    Strip {
        input: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report what would be removed from a file without writing anything.
    Check {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Dump the token stream as JSON.
    Tokens { input: PathBuf },
}

fn main() -> Result<ExitCode> {
    tracing_config::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            dir,
            dry_run,
            keep_originals,
            jobs,
            exclude,
            config,
            json,
        } => {
            let config = match &config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            let args = ConvertArgs {
                root: dir,
                dry_run,
                keep_originals,
                jobs: jobs.or(config.jobs),
                exclude: config.exclude.into_iter().chain(exclude).collect(),
                options: config.transform,
            };
            let report = convert::run(&args)?;

            let mut stdout = std::io::stdout().lock();
            if json {
                report.write_json(&mut stdout)?;
            } else {
                report.write_text(&mut stdout)?;
            }
            if report.summary.files_failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Strip { input, output } => {
            let (filename, result) = run_transform(&input)?;
            print_warnings(&filename, &result);

            match &output {
                Some(path) => std::fs::write(path, &result.output_text)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", result.output_text),
            }
        }
        Commands::Check { input, json } => {
            let (filename, result) = run_transform(&input)?;
            if json {
                let json = serde_json::to_string_pretty(&result)?;
                println!("{json}");
            } else {
                print_warnings(&filename, &result);
                let mut stdout = std::io::stdout().lock();
                for (kind, count) in result.spans_removed.iter() {
                    writeln!(stdout, "{count:>5}  {kind}")?;
                }
                eprintln!("OK: {filename}");
            }
        }
        Commands::Tokens { input } => {
            let source = read_source(&input)?;
            let filename = input.display().to_string();
            let tokens = dt_lexer::tokenize(&source, DtSyntax::for_filename(&filename))
                .with_context(|| format!("failed to tokenize {filename}"))?;
            let json = serde_json::to_string_pretty(&tokens)?;
            println!("{json}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn run_transform(input: &Path) -> Result<(String, TransformOutput)> {
    let source = read_source(input)?;
    let filename = input.display().to_string();
    let result = transform(&source, &filename).with_context(|| format!("failed to convert {filename}"))?;
    Ok((filename, result))
}

fn print_warnings(filename: &str, result: &TransformOutput) {
    for warning in &result.warnings {
        eprintln!("warning: {filename}:{warning}");
    }
}
