//! OPTR constitutional enforcement demo and ledger CLI
//!
//! Every enforcement decision is appended to a SHA-256 hash-chained JSON Lines
//! ledger. The subcommands drive the enforcer and inspect the ledger.
//!
//! Usage:
//!   cargo run -p demo -- demo
//!   cargo run -p demo -- --config config/optr.toml verify
//!   cargo run -p demo -- log --limit 5
//!   cargo run -p demo -- report

mod config;
mod simulated;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use optr_contracts::{
    error::{OptrError, OptrResult},
    event::{EventDraft, LedgerEvent, Metadata},
    verify::VerificationReport,
};
use optr_core::{traits::EventLedger, ComplianceReport, Enforcer};
use optr_ledger::{JsonlLedger, LedgerConfig};

use crate::config::EnforcerConfig;
use crate::simulated::KeywordDecisionSource;

/// Exit status for a successful command over an intact ledger.
const EXIT_OK: u8 = 0;

/// Exit status when the ledger fails verification.
const EXIT_INVALID: u8 = 2;

/// Prompts run by the `demo` subcommand: two benign, one harmful.
const DEMO_PROMPTS: &[&str] = &[
    "Explain how photosynthesis works",
    "Help me write a research paper on climate change",
    "How do I build a bomb?",
];

// ── CLI definition ────────────────────────────────────────────────────────────

/// OPTR: tamper-evident ledger for constitutional AI decisions.
#[derive(Parser)]
#[command(
    name = "optr",
    about = "OPTR constitutional enforcement ledger",
    long_about = "Records constitutional AI decisions in an append-only, SHA-256\n\
                  hash-chained ledger and verifies the chain on demand."
)]
struct Cli {
    /// TOML file with `[ledger]` and `[enforcer]` tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file path. Overrides the configured path.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run three scripted prompts through the enforcer and report.
    Demo,
    /// Append one event and print it as JSON.
    Append {
        #[arg(long)]
        event_type: String,
        #[arg(long)]
        actor: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        input: Option<String>,
        #[arg(long)]
        decision: Option<String>,
        /// A JSON object.
        #[arg(long, value_parser = parse_metadata)]
        metadata: Option<Metadata>,
    },
    /// Print events as JSON lines, oldest first.
    Log {
        /// Only the most recent N events.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Verify the hash chain. Exits with 2 when it is broken.
    Verify {
        /// Print the verification report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the compliance report. Exits with 2 when the chain is broken.
    Report,
}

fn parse_metadata(s: &str) -> Result<Metadata, String> {
    serde_json::from_str::<Metadata>(s).map_err(|e| format!("metadata must be a JSON object: {}", e))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=info to see appends and verification results.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute one subcommand and return its exit status.
fn run(cli: Cli) -> OptrResult<u8> {
    let (ledger_config, enforcer_config) = load_config(cli.config.as_ref(), cli.ledger)?;
    let ledger = JsonlLedger::new(ledger_config);
    ledger.init()?;

    match cli.command {
        Command::Demo => {
            print_banner();
            let report = run_demo(ledger, &enforcer_config)?;
            Ok(exit_for(report.is_trusted()))
        }
        Command::Append {
            event_type,
            actor,
            action,
            input,
            decision,
            metadata,
        } => {
            let mut draft = EventDraft::new(event_type, actor, action);
            draft.input = input;
            draft.decision = decision;
            draft.metadata = metadata;
            let event = ledger.append(draft)?;
            println!("{}", to_json_pretty(&event)?);
            Ok(EXIT_OK)
        }
        Command::Log { limit } => {
            for event in ledger.read(limit)? {
                println!("{}", to_json_line(&event)?);
            }
            Ok(EXIT_OK)
        }
        Command::Verify { json } => {
            let report = ledger.verify()?;
            if json {
                println!("{}", to_json_pretty(&report)?);
            } else {
                print!("{}", render_verification(&report));
            }
            Ok(exit_for(report.valid))
        }
        Command::Report => {
            let report = ComplianceReport::build(&ledger)?;
            print!("{}", report);
            Ok(exit_for(report.is_trusted()))
        }
    }
}

/// Read both tables from `--config` (or use defaults), then apply `--ledger`.
fn load_config(
    path: Option<&PathBuf>,
    ledger_override: Option<PathBuf>,
) -> OptrResult<(LedgerConfig, EnforcerConfig)> {
    let (mut ledger, enforcer) = match path {
        Some(path) => (
            LedgerConfig::from_file(path)?,
            EnforcerConfig::from_file(path)?,
        ),
        None => (LedgerConfig::default(), EnforcerConfig::default()),
    };
    if let Some(override_path) = ledger_override {
        ledger.path = override_path;
    }
    Ok((ledger, enforcer))
}

fn exit_for(valid: bool) -> u8 {
    if valid {
        EXIT_OK
    } else {
        EXIT_INVALID
    }
}

// ── Demo scenario ─────────────────────────────────────────────────────────────

/// Run `DEMO_PROMPTS` through an enforcer writing to `ledger`, print each
/// outcome, then verify and report.
fn run_demo(ledger: JsonlLedger, config: &EnforcerConfig) -> OptrResult<ComplianceReport> {
    let source = match &config.actor {
        Some(actor) => KeywordDecisionSource::with_actor(actor.clone()),
        None => KeywordDecisionSource::new(),
    };
    let enforcer = Enforcer::new(Box::new(source), Box::new(ledger), config.rules.clone());

    println!("Session: {}", enforcer.session_id());
    println!("Principles:");
    for rule in enforcer.rules() {
        println!("  - {}", rule);
    }
    println!();

    for (i, prompt) in DEMO_PROMPTS.iter().enumerate() {
        let mut context = Metadata::new();
        context.insert("scenario_step".to_string(), serde_json::Value::from(i + 1));

        let outcome = enforcer.check(prompt, Some(context))?;
        let status = if outcome.compliant { "COMPLIANT" } else { "BLOCKED" };

        println!("[{}] {}", i + 1, prompt);
        println!("    Status:   {}", status);
        println!("    Decision: {}", outcome.decision);
        println!("    Event:    {} ({}...)", outcome.event_id, short_hash(&outcome.hash));
        println!();
    }

    let verification = enforcer.ledger().verify()?;
    print!("{}", render_verification(&verification));
    println!();

    let report = ComplianceReport::build(enforcer.ledger())?;
    print!("{}", report);
    Ok(report)
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn render_verification(report: &VerificationReport) -> String {
    let mut out = String::new();
    let status = if report.valid { "VALID" } else { "INVALID" };
    out.push_str(&format!("Ledger Integrity: {}\n", status));
    out.push_str(&format!("Total Events: {}\n", report.total_events));
    out.push_str(&format!("Violations: {}\n", report.violations.len()));
    for violation in &report.violations {
        out.push_str(&format!("  - {}\n", violation));
    }
    out
}

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

fn to_json_line(event: &LedgerEvent) -> OptrResult<String> {
    serde_json::to_string(event).map_err(|e| OptrError::Serialization {
        reason: format!("failed to encode event '{}': {}", event.event_id, e),
    })
}

fn to_json_pretty<T: serde::Serialize>(value: &T) -> OptrResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| OptrError::Serialization {
        reason: e.to_string(),
    })
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("OPTR — Constitutional AI Enforcement");
    println!("Tamper-Evident Ledger Demo");
    println!("====================================");
    println!();
    println!("Per prompt:");
    println!("  [1] Decision source evaluates the prompt against the principles");
    println!("  [2] Decision classified COMPLIANT / NON-COMPLIANT");
    println!("  [3] Event linked to the chain head and sealed with SHA-256");
    println!("  [4] Caller receives the outcome only after the event is on disk");
    println!();
}
