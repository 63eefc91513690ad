use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kiosk_core::{
    Catalog, ControllerSettings, Detached, FeedbackPresenter, InteractionController, KioskEvent,
    Ports, ResetTimer, DEFAULT_HINT_DURATION, DEFAULT_RESET_DELAY,
};
use shared::{
    domain::{ButtonVisual, Category, Reaction},
    protocol::parse_label_list,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kiosk-tools", about = "Operator utilities for the recycling kiosk")]
struct Cli {
    #[arg(long, default_value = "assets/items.json")]
    catalog: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the catalog and check it covers every detector label.
    Validate {
        #[arg(long)]
        labels: Option<PathBuf>,
    },
    /// Print every catalog entry.
    List,
    /// Replay events through the controller, e.g.
    /// `detect:soda_can guess:waste guess:recyclable reset`.
    Simulate {
        #[arg(long, default_value_t = DEFAULT_RESET_DELAY.as_millis() as u64)]
        reset_delay_ms: u64,
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = Catalog::load(&cli.catalog)
        .with_context(|| format!("cannot load catalog '{}'", cli.catalog.display()))?;

    match cli.command {
        Command::Validate { labels } => {
            println!("catalog ok: {} entries", catalog.len());
            if let Some(path) = labels {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read labels '{}'", path.display()))?;
                let labels = parse_label_list(&raw);
                let missing = catalog.missing_labels(labels.iter().map(String::as_str));
                if !missing.is_empty() {
                    bail!("missing catalog entries: {}", missing.join(", "));
                }
                println!("all {} detector labels are covered", labels.len());
            }
        }
        Command::List => {
            for entry in catalog.entries() {
                println!(
                    "{:<24} {:<12} {}",
                    entry.label,
                    entry.category.as_str(),
                    entry.display_name
                );
            }
        }
        Command::Simulate {
            reset_delay_ms,
            steps,
        } => {
            let events = steps
                .iter()
                .map(|step| parse_step(step))
                .collect::<Result<Vec<_>>>()?;
            let settings = ControllerSettings {
                reset_delay: Duration::from_millis(reset_delay_ms),
                hint_duration: DEFAULT_HINT_DURATION,
            };
            for line in simulate(catalog, settings, events) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

fn parse_step(raw: &str) -> Result<KioskEvent> {
    let raw = raw.trim();
    let event = match raw.split_once(':') {
        Some(("detect", label)) if !label.trim().is_empty() => {
            KioskEvent::Detected(label.trim().to_string())
        }
        Some(("guess", category)) => KioskEvent::Guess(category.parse::<Category>()?),
        None if raw == "reset" => KioskEvent::ResetTimerFired,
        None if raw == "close" => KioskEvent::Close,
        _ => bail!("unrecognized step '{raw}' (expected detect:<label>, guess:<category>, reset or close)"),
    };
    Ok(event)
}

/// Collects presenter calls as transcript lines.
#[derive(Default)]
struct TranscriptPresenter {
    lines: Vec<String>,
}

impl FeedbackPresenter for TranscriptPresenter {
    fn set_button(&mut self, category: Category, visual: ButtonVisual) {
        if visual != ButtonVisual::Default {
            self.lines.push(format!("button {category} -> {visual:?}"));
        }
    }

    fn set_reaction(&mut self, reaction: Reaction) {
        self.lines.push(format!("reaction {reaction:?}"));
    }

    fn show_title(&mut self, text: &str, expires_after: Option<Duration>) {
        match expires_after {
            Some(after) => self
                .lines
                .push(format!("title \"{text}\" for {} ms", after.as_millis())),
            None => self.lines.push(format!("title \"{text}\"")),
        }
    }

    fn show_body(&mut self, text: &str) {
        self.lines.push(format!("body \"{text}\""));
    }

    fn clear_text(&mut self) {}
}

#[derive(Default)]
struct TranscriptTimer {
    armed: Option<Duration>,
}

impl ResetTimer for TranscriptTimer {
    fn arm_reset(&mut self, delay: Duration) {
        self.armed = Some(delay);
    }
}

fn simulate(
    catalog: Catalog,
    settings: ControllerSettings,
    events: Vec<KioskEvent>,
) -> Vec<String> {
    let mut controller = InteractionController::new(Arc::new(catalog), settings);
    let mut detector = Detached;
    let mut camera = Detached;
    let mut presenter = TranscriptPresenter::default();
    let mut timer = TranscriptTimer::default();
    let mut transcript = Vec::new();

    for event in events {
        let label = format!("{event:?}");
        let outcome = {
            let mut ports = Ports {
                detector: &mut detector,
                camera: &mut camera,
                presenter: &mut presenter,
                timer: &mut timer,
            };
            controller.handle(event, &mut ports)
        };
        transcript.push(format!(
            "{label} => {outcome:?} [{}]",
            controller.session().kind().as_str()
        ));
        transcript.extend(presenter.lines.drain(..).map(|line| format!("  {line}")));
        if let Some(delay) = timer.armed.take() {
            transcript.push(format!("  reset armed for {} ms", delay.as_millis()));
        }
    }
    transcript
}
