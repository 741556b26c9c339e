//! Compose Flux CLI - Command-line interface for Compose Flux
//!
//! Commands:
//! - replay: Recompute session metrics from a recorded event log
//! - schema: Print the event log and metrics schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compose_flux::replay::{
    parse_event_log, parse_ndjson_events, replay_events, replay_events_with_config,
};
use compose_flux::types::SessionMetrics;
use compose_flux::{ComposeError, ComposerConfig, FLUX_VERSION, PRODUCER_NAME};

/// Compose Flux - On-device composition behavior metrics
#[derive(Parser)]
#[command(name = "compose-flux")]
#[command(author = "Synheart AI Inc")]
#[command(version = FLUX_VERSION)]
#[command(about = "Recompute answer composition metrics from event logs", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a composition event log into session metrics
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "log")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Clamp recorded contents to this many characters, as the input field would
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Print schema information
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Event log document: { session_id, events: [...] }
    Log,
    /// Newline-delimited events
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one metrics record per line)
    Ndjson,
    /// JSON array of metrics records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "compose_flux=debug" } else { "compose_flux=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), ComposeCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            max_chars,
        } => cmd_replay(&input, &output, input_format, output_format, max_chars),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    max_chars: Option<usize>,
) -> Result<(), ComposeCliError> {
    let input_data = if is_stdio(input) {
        if atty::is(atty::Stream::Stdin) {
            return Err(ComposeCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = match input_format {
        InputFormat::Log => parse_event_log(&input_data)?.events,
        InputFormat::Ndjson => parse_ndjson_events(&input_data)?,
    };

    if events.is_empty() {
        return Err(ComposeCliError::NoEvents);
    }

    let sessions = match max_chars {
        Some(max) => {
            let config = ComposerConfig::default().with_max_answer_chars(max);
            replay_events_with_config(&events, &config)?
        }
        None => replay_events(&events)?,
    };
    tracing::info!(events = events.len(), sessions = sessions.len(), "replay complete");

    let output_data = format_output(&sessions, &output_format)?;

    if is_stdio(output) {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), ComposeCliError> {
    if json {
        let schema = serde_json::json!({
            "producer": PRODUCER_NAME,
            "version": FLUX_VERSION,
            "event": {
                "timestamp": "RFC3339 string",
                "kind": ["start", "change", "finish", "reset"],
                "content": "string, required for change and finish",
                "previous": "string, optional for change"
            },
            "metrics": {
                "writing_duration_sec": "integer",
                "backspace_count": "integer",
                "max_char_count": "integer",
                "final_char_count": "integer"
            }
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        println!("Event log (input)");
        println!();
        println!("- session_id: Recording identifier");
        println!("- events: Array of events containing:");
        println!("  - timestamp: RFC3339 time the host observed the event");
        println!("  - kind: start | change | finish | reset");
        println!("  - content: text after the edit (change) or at submission (finish)");
        println!("  - previous: text before the edit; defaults to the last change");
        println!();
        println!("Session metrics (output)");
        println!();
        println!("- writing_duration_sec: seconds from start to finish, rounded");
        println!("- backspace_count: characters removed across all edits");
        println!("- max_char_count: longest text observed");
        println!("- final_char_count: text length at finish");
    }

    Ok(())
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn format_output(sessions: &[SessionMetrics], format: &OutputFormat) -> Result<String, ComposeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for metrics in sessions {
                lines.push(serde_json::to_string(metrics)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(sessions)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(sessions)?),
    }
}

#[derive(Debug)]
enum ComposeCliError {
    Io(io::Error),
    Compose(ComposeError),
    Json(serde_json::Error),
    NoInput,
    NoEvents,
}

impl From<io::Error> for ComposeCliError {
    fn from(e: io::Error) -> Self {
        ComposeCliError::Io(e)
    }
}

impl From<ComposeError> for ComposeCliError {
    fn from(e: ComposeError) -> Self {
        ComposeCliError::Compose(e)
    }
}

impl From<serde_json::Error> for ComposeCliError {
    fn from(e: serde_json::Error) -> Self {
        ComposeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ComposeCliError> for CliError {
    fn from(e: ComposeCliError) -> Self {
        match e {
            ComposeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ComposeCliError::Compose(e) => compose_error(e),
            ComposeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ComposeCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal".to_string(),
                hint: Some("Pipe an event log in or pass --input <file>".to_string()),
            },
            ComposeCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
        }
    }
}

fn compose_error(e: ComposeError) -> CliError {
    let (code, hint) = match &e {
        ComposeError::ParseError(_) | ComposeError::JsonError(_) => (
            "PARSE_ERROR",
            "Run 'compose-flux schema' for the expected input",
        ),
        ComposeError::MissingField(_) => (
            "MISSING_FIELD",
            "change and finish events need a content field",
        ),
        ComposeError::InvalidConfig(_) => ("INVALID_CONFIG", "Use a --max-chars value above zero"),
        ComposeError::EmptyAnswer => ("EMPTY_ANSWER", "Enter some text before submitting"),
        ComposeError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}
