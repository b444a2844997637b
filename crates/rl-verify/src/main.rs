//! rl-verify - re-check a PR-Schau bundle without trusting its producer.

use clap::{Args, Parser, Subcommand};
use rl_verify::logging::{init_logging, LogConfig, LogFormat};
use rl_verify::{verify, ExitCode, Level};
use std::path::PathBuf;

/// Verify PR-Schau review bundles
#[derive(Parser)]
#[command(name = "rl-verify")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl); overrides RL_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Prefix human log lines with timestamps
    #[arg(long, global = true)]
    log_timestamps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a bundle directory or its bundle.json
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Bundle directory or path to bundle.json
    target: PathBuf,

    /// Verification depth
    #[arg(long, value_enum, default_value_t = Level::Full)]
    level: Level,

    /// Print a JSON report instead of ✅/❌ lines
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()
        .with_verbosity(cli.global.verbose, cli.global.quiet)
        .with_timestamps(cli.global.log_timestamps);
    if let Some(format) = cli.global.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Verify(args) => run_verify(&args),
    };

    std::process::exit(exit_code.as_i32());
}

fn run_verify(args: &VerifyArgs) -> ExitCode {
    match verify(&args.target, args.level) {
        Ok(report) => {
            if args.json {
                print!("{}", report.to_json());
            } else {
                print!("{}", report.render_human());
            }
            report.exit_code()
        }
        Err(e) => {
            eprintln!("rl-verify: {}", e);
            e.exit_code()
        }
    }
}
