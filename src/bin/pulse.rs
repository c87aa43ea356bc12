//! Pulse CLI - Command-line interface for Mixtape Pulse
//!
//! Commands:
//! - report: Compute the full analytics report for a group snapshot
//! - archetypes: Compute both archetypes for a single member
//! - validate: Validate a snapshot file and report dropped records
//! - doctor: Diagnose engine health and configuration
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mixtape_pulse::store::{RawSnapshot, SanitizeReport, SNAPSHOT_SCHEMA};
use mixtape_pulse::{
    AnalysisWindow, AnalyticsError, InMemorySource, PulseEngine, PRODUCER_NAME, PULSE_VERSION,
};

/// Pulse - Listener reaction analytics for Mixtape groups
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Mixtape Labs")]
#[command(version = PULSE_VERSION)]
#[command(about = "Turn group reaction snapshots into analytics reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full analytics report for a group snapshot
    Report {
        /// Input snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Analysis window (24h, 7d, 30d, 90d, all)
        #[arg(short, long, default_value = "7d")]
        window: String,

        /// Group id; defaults to the snapshot's own group
        #[arg(long)]
        group: Option<String>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Compute both archetypes for a single member
    Archetypes {
        /// Input snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Member user id
        #[arg(short, long)]
        user: String,

        /// Analysis window (24h, 7d, 30d, 90d, all)
        #[arg(short, long, default_value = "7d")]
        window: String,
    },

    /// Validate a snapshot file and report dropped records
    Validate {
        /// Input snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Check a snapshot file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (pulse.group_snapshot.v1)
    Input,
    /// Output schema (pulse.group_report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Report {
            input,
            output,
            window,
            group,
            output_format,
        } => cmd_report(&input, &output, &window, group.as_deref(), output_format),

        Commands::Archetypes {
            input,
            user,
            window,
        } => cmd_archetypes(&input, &user, &window),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { snapshot, json } => cmd_doctor(snapshot.as_deref(), json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_source(input: &Path) -> Result<(InMemorySource, String, SanitizeReport), PulseCliError> {
    let data = read_input(input)?;
    let raw = RawSnapshot::parse(&data)?;
    let group_id = raw.group_id.clone();
    let mut source = InMemorySource::new();
    let report = source.load_raw(raw);
    Ok((source, group_id, report))
}

fn cmd_report(
    input: &Path,
    output: &Path,
    window: &str,
    group: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), PulseCliError> {
    let window: AnalysisWindow = window.parse()?;
    let (source, snapshot_group, _) = load_source(input)?;
    let group_id = group.unwrap_or(&snapshot_group);

    let engine = PulseEngine::new();
    let report = engine.group_pulse(&source, group_id, window)?;

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_archetypes(input: &Path, user: &str, window: &str) -> Result<(), PulseCliError> {
    let window: AnalysisWindow = window.parse()?;
    let (source, group_id, _) = load_source(input)?;

    let engine = PulseEngine::new();
    let (listening, influence) = engine.member_archetypes(&source, &group_id, user, window)?;

    let payload = serde_json::json!({
        "userId": user,
        "window": window,
        "listening": listening,
        "influence": influence,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), PulseCliError> {
    let data = read_input(input)?;
    let raw = RawSnapshot::parse(&data)?;
    let total_shares = raw.shares.len();
    let total_reactions = raw.reactions.len();
    let (_, report) = raw.sanitize();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Shares:    {} accepted / {} total", report.accepted_shares, total_shares);
        println!(
            "Reactions: {} accepted / {} total",
            report.accepted_reactions, total_reactions
        );

        if !report.dropped.is_empty() {
            println!("\nDropped records:");
            for dropped in &report.dropped {
                println!(
                    "  - {} {}: {:?}",
                    dropped.record, dropped.id, dropped.reason
                );
            }
        }
    }

    if report.dropped.is_empty() {
        Ok(())
    } else {
        Err(PulseCliError::ValidationFailed(report.dropped.len()))
    }
}

fn cmd_doctor(snapshot: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "pulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Pulse version {}", PULSE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SNAPSHOT_SCHEMA),
    });

    if let Some(snapshot_path) = snapshot {
        if snapshot_path.exists() {
            match fs::read_to_string(snapshot_path) {
                Ok(content) => match RawSnapshot::parse(&content) {
                    Ok(raw) => {
                        checks.push(DoctorCheck {
                            name: "snapshot".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "Snapshot valid ({} members, {} shares, {} reactions)",
                                raw.members.len(),
                                raw.shares.len(),
                                raw.reactions.len()
                            ),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "snapshot".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid snapshot JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "snapshot".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read snapshot file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "snapshot".to_string(),
                status: CheckStatus::Warning,
                message: "Snapshot file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (snapshot streaming ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), PulseCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SNAPSHOT_SCHEMA);
            println!();
            println!("A group snapshot carries four record sets:");
            println!();
            println!("1. members - group directory entries");
            println!("   - userId, displayName, avatarUrl");
            println!();
            println!("2. shares - tracks shared into the group feed");
            println!("   - id, sharerId, createdAt, likeCount, listenCount");
            println!("   - artists[], genres[]");
            println!();
            println!("3. reactions - listens and likes on shares");
            println!("   - userId, shareId, kind (listen|like), reactedAt");
            println!();
            println!("Records missing a timestamp are dropped during validation,");
            println!("as are reactions predating their share's creation.");
        }
        SchemaType::Output => {
            println!("Output Schema: pulse.group_report.v1");
            println!();
            println!("A group pulse report contains:");
            println!();
            println!("- producer: {{ name, version, instanceId }}");
            println!("- generatedAt, groupId, window");
            println!("- reflex: {{ groupMedianMs, instantCount, profiles[] }}");
            println!("- radar: per-member 0-100 axes with lowData flags");
            println!("- listeningArchetypes / influenceArchetypes");
            println!("- superlatives: best-in-category winners");
            println!("- timeline: hourly or daily activity buckets");
            println!("- engagement: per-member share/like/listen totals");
            println!("- gravity: taste affinity graph (nodes, links)");
        }
    }

    Ok(())
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Engine(AnalyticsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<AnalyticsError> for PulseCliError {
    fn from(e: AnalyticsError) -> Self {
        PulseCliError::Engine(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Engine(e) => CliError {
                code: match e {
                    AnalyticsError::GroupNotFound(_) | AnalyticsError::UserNotFound(_) => {
                        "NOT_FOUND".to_string()
                    }
                    AnalyticsError::InvalidWindow(_) => "INVALID_WINDOW".to_string(),
                    _ => "ENGINE_ERROR".to_string(),
                },
                message: e.to_string(),
                hint: Some("Run 'pulse schema input' for the snapshot format".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records were dropped during validation", count),
                hint: Some("Run 'pulse validate' without --json for details".to_string()),
            },
            PulseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
