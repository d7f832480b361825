use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use clap_complete::Shell::{Bash, Elvish, Fish, PowerShell, Zsh};

use lockstep::parse;
use lockstep::sequence::{self, AnalysisResult, TransactionMode};
use lockstep::severity::Severity;
use lockstep::suggest::Step;

#[derive(Parser)]
#[command(name = "lockstep")]
#[command(about = "Static lock-safety analysis for PostgreSQL migration scripts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "lockstep reads a SQL migration script and classifies the lock
severity of every statement in it, without ever connecting to a database or
running a single statement.

For statements that are critically dangerous, lockstep suggests a safer,
multi-step rewrite.
"
)]
struct Lockstep {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct Analyze {
    /// Path to a SQL migration script, or '-' to read from stdin
    path: String,
    /// Output format, plain or json
    #[arg(short = 'f', long = "format", default_value = "plain", value_parser=clap::builder::PossibleValuesParser::new(["json", "plain"]))]
    format: String,
    /// Analyze as though a transaction block is already open around the script
    #[arg(short = 't', long = "in-transaction", default_value_t = false)]
    in_transaction: bool,
    /// Suppress remediation suggestions for Critical statements
    #[arg(short = 'n', long = "no-suggestions", default_value_t = false)]
    no_suggestions: bool,
    /// Exit successfully even if Critical or Error statements are found
    #[arg(short = 'a', long = "accept-failures", default_value_t = false)]
    accept_failures: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every statement in a migration script
    Analyze(Analyze),
    /// Generate shell completions for lockstep
    Completions {
        #[arg(short, long, default_value = "bash", value_parser=clap::builder::PossibleValuesParser::new(["bash", "zsh", "fish", "pwsh", "powershell"]))]
        shell: String,
    },
}

fn plain_text(results: &[AnalysisResult]) -> String {
    let mut out = String::new();
    for r in results {
        out.push_str(&format!("[{}] {}\n", r.severity, r.sql.trim()));
        if let Some(suggestion) = &r.suggestion {
            let partial = if suggestion.is_partial { " (partial)" } else { "" };
            out.push_str(&format!("  suggestion ({}{}):\n", suggestion.category, partial));
            for step in &suggestion.steps {
                let (marker, description, body) = match step {
                    Step::Sql { description, can_run_in_transaction, sql } => {
                        (*can_run_in_transaction, description, sql)
                    }
                    Step::External { description, can_run_in_transaction, command } => {
                        (*can_run_in_transaction, description, command)
                    }
                    Step::Procedural { description, can_run_in_transaction, notes } => {
                        (*can_run_in_transaction, description, notes)
                    }
                };
                let safety = if marker { "[tx-safe]" } else { "[run outside a transaction]" };
                out.push_str(&format!("    {safety} {description}\n      {body}\n"));
            }
        }
    }
    out
}

fn run_analyze(opts: &Analyze) -> Result<()> {
    let sql = parse::read_script(&opts.path)?;
    let statements = parse::split(&sql)?;
    let mode = if opts.in_transaction {
        TransactionMode::InTransaction
    } else {
        TransactionMode::NoTransaction
    };
    let results = sequence::drive(&statements, mode, !opts.no_suggestions);

    match opts.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => print!("{}", plain_text(&results)),
    }

    let failed = results
        .iter()
        .any(|r| matches!(r.severity, Severity::Critical | Severity::Error));
    if failed && !opts.accept_failures {
        Err(anyhow!("lockstep found statements with Critical or Error severity"))
    } else {
        Ok(())
    }
}

pub fn main() -> Result<()> {
    env_logger::init();
    let args = Lockstep::parse();
    match args.command {
        Commands::Analyze(opts) => run_analyze(&opts),
        Commands::Completions { shell } => {
            let sh = match shell.as_str() {
                "bash" => Ok(Bash),
                "zsh" => Ok(Zsh),
                "fish" => Ok(Fish),
                "pwsh" | "powershell" => Ok(PowerShell),
                "elvish" => Ok(Elvish),
                _ => Err(anyhow!("Unsupported shell: {shell}")),
            }?;
            let mut com = Lockstep::command();
            generate(sh, &mut com, "lockstep", &mut std::io::stdout());
            Ok(())
        }
    }
}
