//! Quill demo: replays a scripted editing session against a bound surface.
//!
//! Usage: `quill-demo <scenario.jsonl> [config.json]`
//!
//! Each scenario line is one step: a remote event, a user keystroke, a
//! selection change or a pause. Every outbound action the binding produces
//! is logged; run with `RUST_LOG=debug` to see lifecycle transitions too.

use std::path::{Path, PathBuf};

use log::info;
use quill_bind::{
    remote_events, Binding, BindingConfig, ChannelCollaborator, MemorySurface, Outbound,
    RemoteEvent, Selection, TextSurface,
};
use serde::Deserialize;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, Duration};

/// One scripted step.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    Remote { event: RemoteEvent },
    Type { text: String },
    Backspace,
    Select { start: usize, end: usize },
    Wait { ms: u64 },
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("usage: quill-demo <scenario.jsonl> [config.json]")]
    Usage,
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{line}: {source}", path.display())]
    Step {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] quill_bind::ConfigError),
    #[error(transparent)]
    Bind(#[from] quill_bind::BindingError),
    #[error("binding task failed: {0}")]
    Task(#[from] JoinError),
}

fn read(path: &Path) -> Result<String, DemoError> {
    std::fs::read_to_string(path).map_err(|source| DemoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_scenario(path: &Path) -> Result<Vec<Step>, DemoError> {
    let text = read(path)?;
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str(l).map_err(|source| DemoError::Step {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// Wait for a spawned task, turning a panic or cancellation into an error.
async fn join<T>(task: JoinHandle<T>) -> Result<T, DemoError> {
    Ok(task.await?)
}

fn describe(action: &Outbound) -> String {
    match action {
        Outbound::Transform(t) => format!(
            "send transform {}",
            t.to_json().unwrap_or_else(|e| e.to_string())
        ),
        Outbound::Cursor(offset) => format!("cursor at {offset}"),
        Outbound::Error(message) => format!("error: {message}"),
        Outbound::Presence(payload) => format!("presence: {payload}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1);
    let scenario_path = PathBuf::from(args.next().ok_or(DemoError::Usage)?);
    let config = match args.next() {
        Some(path) => BindingConfig::from_json(&read(Path::new(&path))?)?,
        None => BindingConfig::default(),
    };
    let steps = load_scenario(&scenario_path)?;

    info!("Starting Quill demo with {} steps", steps.len());

    let surface = MemorySurface::new();
    let user = surface.clone();
    let (collab, mut outbound) = ChannelCollaborator::new();
    let (events, events_rx) = remote_events(config.event_capacity);

    let mut binding = Binding::bind(surface, collab, events_rx, &config)?;
    info!("Bound surface as {}", binding.id());

    let printer = tokio::spawn(async move {
        while let Some(action) = outbound.recv().await {
            info!("-> {}", describe(&action));
        }
    });
    let driver = tokio::spawn(async move {
        binding.run().await;
        binding
    });

    for step in steps {
        match step {
            Step::Remote { event } => {
                info!("<- {}", event.kind());
                if events.send(event).await.is_err() {
                    info!("Binding stopped listening, ending scenario");
                    break;
                }
            }
            Step::Type { text } => {
                if !user.type_text(&text) {
                    info!("Surface is read-only, dropped keystrokes {text:?}");
                }
            }
            Step::Backspace => {
                user.backspace();
            }
            Step::Select { start, end } => user.set_user_selection(Selection::new(start, end)),
            Step::Wait { ms } => sleep(Duration::from_millis(ms)).await,
        }
        // Give the binding a turn before the next step.
        sleep(Duration::from_millis(10)).await;
    }

    drop(events);
    let binding = join(driver).await?;

    println!("state:   {:?}", binding.state());
    println!("surface: {:?}", binding.surface().content());
    println!("stats:   {:?}", binding.stats());

    // The collaborator inside the binding holds the last outbound sender.
    drop(binding);
    let _ = printer.await;
    Ok(())
}
