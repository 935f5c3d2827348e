use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use interact_spec::Event;
use tracing_subscriber::EnvFilter;

use crate::compile::DefaultCompiler;
use crate::document::{FieldDocument, load_defaults};
use crate::engine::Interact;
use crate::error::InteractError;
use crate::options::{InteractOptions, RunOptions};
use crate::reader::ScriptedReader;
use crate::resolve::display_value;
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(
    name = "interact",
    about = "Ask the questions in a field document and print the answers",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a field document against the terminal or a script
    Run(RunArgs),
    /// Print the JSON Schema of the emitted events
    Schema,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Field document (.json or .toml)
    #[arg(value_name = "FIELDS")]
    pub fields: PathBuf,
    /// Configured defaults, a flat name -> value map (.json or .toml)
    #[arg(long, value_name = "FILE")]
    pub defaults: Option<PathBuf>,
    /// Resolve every field to its default without asking
    #[arg(long, default_value_t = false)]
    pub autosubmit: bool,
    /// Echo typed characters as '*'
    #[arg(long, default_value_t = false)]
    pub masked: bool,
    #[arg(long = "no-color", default_value_t = false)]
    pub no_color: bool,
    /// Answer from this file, one line per prompt, instead of the terminal
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// Print every event as a JSON line
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&interact_spec::event_schema())
                .context("failed to encode event schema")?;
            println!("{schema}");
            Ok(())
        }
    }
}

/// Maps a failed [`main`] onto a process status: 130 after an interrupt, 1
/// for everything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<InteractError>()
        .map_or(1, InteractError::exit_code)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let FieldDocument {
        header,
        fields,
        groups,
    } = FieldDocument::load(&args.fields)?;
    let defaults = match &args.defaults {
        Some(path) => load_defaults(path)?,
        None => Default::default(),
    };
    let theme = if args.no_color {
        Theme::plain()
    } else {
        Theme::detect()
    };
    let options = InteractOptions::new()
        .with_defaults(defaults)
        .with_loader(groups)
        .with_compiler(DefaultCompiler)
        .masked(args.masked)
        .with_theme(theme)
        // `exit_code` maps the interrupt to 130 once the events are printed.
        .exit_on_interrupt(false);
    let run_options = RunOptions {
        autosubmit: args.autosubmit,
    };
    let script = match &args.script {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))?,
        ),
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let masked = args.masked;
    let events = runtime.block_on(async move {
        let mut transcript = None;
        let session = match script {
            Some(raw) => {
                let reader = ScriptedReader::new(raw.lines()).masked(masked).with_theme(theme);
                transcript = Some(reader.transcript());
                Interact::with_reader(header, fields, options, reader)
            }
            None => Interact::new(header, fields, options)
                .context("failed to open the terminal")?,
        };

        // Printing waits for the run to finish: the terminal stays in raw
        // mode until then.
        let mut events = Vec::new();
        let outcome = session
            .run(run_options)
            .drain(|event| events.push(event.clone()))
            .await;
        if let Some(transcript) = transcript {
            eprint!("{}", transcript.output());
        }
        outcome?;
        Ok::<_, anyhow::Error>(events)
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        if args.json {
            let line = serde_json::to_string(event).context("failed to encode event")?;
            writeln!(out, "{line}")?;
        } else {
            write_summary(&mut out, event)?;
        }
    }
    Ok(())
}

fn write_summary(out: &mut impl Write, event: &Event) -> io::Result<()> {
    match event {
        Event::Input(data) | Event::Confirm(data) => {
            writeln!(out, "{} = {}", data.trail.join("."), display_value(&data.answer))
        }
        Event::Select(data) => writeln!(
            out,
            "{} = {} ({})",
            data.trail[..data.trail.len().saturating_sub(1)].join("."),
            data.name,
            display_value(&data.answer)
        ),
        Event::Autosubmit(result) => {
            for (name, value) in &result.fields {
                writeln!(out, "{name} = {}", display_value(value))?;
            }
            Ok(())
        }
        Event::Enter(_) | Event::Exit(_) | Event::Final(_) => Ok(()),
    }
}
