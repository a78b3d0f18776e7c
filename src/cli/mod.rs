//! Command-line interface for wintrack
//!
//! `watch` runs the tracker against the native backend, `scan` performs a
//! single cold-start classification, `demo` replays a scripted session against
//! the in-memory backend, and `config` manages the configuration file.

use crate::config::{ConfigPersistence, ConfigValidator, TrackerConfig, ValidationSeverity};
use crate::models::{LifecycleEvent, RawEventKind, RawWindowEvent, WindowHandle};
use crate::platform::{
    Backend, FakeWindow, InMemoryEventSource, InMemoryProcessInspector, InMemoryWindowSystem,
    ProcessDetails,
};
use crate::services::{TrackerService, WindowTracker};
use crate::{Result, WinTrackError};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "wintrack")]
#[command(about = "Track window float, maximize, minimize and close transitions")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct WinTrackCli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print events and results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track windows until interrupted, printing every transition
    Watch {
        /// Skip the initial classification of already-open windows
        #[arg(long)]
        no_scan: bool,
    },

    /// Classify the currently open windows once
    Scan,

    /// Replay a scripted session against simulated windows
    Demo,

    /// Configuration management commands
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ConfigCommands {
    #[command(subcommand)]
    pub action: ConfigActions,
}

#[derive(Subcommand, Debug)]
pub enum ConfigActions {
    /// Show the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate instead of the configured one
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Formats lifecycle events for the terminal
#[derive(Debug, Clone, Copy)]
pub struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// One output line, or `None` when the event could not be serialized
    pub fn render(&self, event: &LifecycleEvent) -> Option<String> {
        if !self.json {
            return Some(format!("{} {}", Utc::now().format("%H:%M:%S%.3f"), event));
        }
        json_line(event.handle(), serde_json::to_value(event))
    }

    pub fn print(&self, event: &LifecycleEvent) {
        if let Some(line) = self.render(event) {
            println!("{}", line);
        }
    }
}

fn json_line(
    handle: WindowHandle,
    value: serde_json::Result<serde_json::Value>,
) -> Option<String> {
    let mut value = match value {
        Ok(value) => value,
        Err(error) => {
            warn!(%handle, error = %error, "Skipping event that failed to serialize");
            return None;
        }
    };
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "timestamp".to_string(),
            serde_json::Value::String(Utc::now().to_rfc3339()),
        );
    }
    Some(value.to_string())
}

pub struct CliExecutor {
    persistence: ConfigPersistence,
    printer: EventPrinter,
    json_output: bool,
    shutdown: broadcast::Sender<()>,
}

impl CliExecutor {
    pub fn new(cli: &WinTrackCli, shutdown: broadcast::Sender<()>) -> Self {
        let persistence = cli
            .config
            .clone()
            .map(ConfigPersistence::new)
            .unwrap_or_default();
        Self {
            persistence,
            printer: EventPrinter::new(cli.json),
            json_output: cli.json,
            shutdown,
        }
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Watch { no_scan } => self.watch(no_scan).await,
            Commands::Scan => self.scan(),
            Commands::Demo => self.demo().await,
            Commands::Config(config_cmd) => self.execute_config_command(config_cmd),
        }
    }

    fn load_config(&self) -> Result<TrackerConfig> {
        self.persistence
            .load()
            .map_err(|e| WinTrackError::Configuration(e.to_string()).into())
    }

    async fn watch(&self, no_scan: bool) -> Result<()> {
        let mut config = self.load_config()?;
        if no_scan {
            config.tracker.scan_on_start = false;
        }

        let backend = Backend::native()?;
        let service = TrackerService::from_backend(&backend, &config);
        let printer = self.printer;
        service.tracker().subscribe_all(move |event| printer.print(event));

        let mut shutdown = self.shutdown.subscribe();
        let running = service.start()?;
        for kind in running.unavailable_kinds() {
            warn!(%kind, "Tracking without {} notifications", kind);
        }
        info!("Watching window transitions, press Ctrl+C to stop");

        let _ = shutdown.recv().await;
        running.shutdown().await
    }

    fn scan(&self) -> Result<()> {
        let config = self.load_config()?;
        let backend = Backend::native()?;
        let tracker = WindowTracker::from_backend(&backend, &config);
        let summary = tracker.sort_current_windows()?;

        if self.json_output {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            for event in &summary.events {
                println!("  {}", event);
            }
            println!(
                "{} maximized, {} floating, {} skipped",
                summary.maximized, summary.floating, summary.skipped
            );
        }
        Ok(())
    }

    async fn demo(&self) -> Result<()> {
        let config = self.load_config()?;
        let script = DemoScript::new();
        let backend = script.backend();
        let service = TrackerService::from_backend(&backend, &config);
        let printer = self.printer;
        service.tracker().subscribe_all(move |event| printer.print(event));

        let running = service.start()?;
        script.play(config.tracker.close_recheck_delay()).await;
        running.shutdown().await
    }

    fn execute_config_command(&self, cmd: ConfigCommands) -> Result<()> {
        match cmd.action {
            ConfigActions::Show => {
                let config = self.load_config()?;
                if self.json_output {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    println!("# {}", self.persistence.path().display());
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigActions::Init { force } => {
                let created = if force {
                    self.persistence.save(&TrackerConfig::default())?;
                    true
                } else {
                    self.persistence.initialize()?
                };
                if created {
                    println!("Wrote {}", self.persistence.path().display());
                } else {
                    println!(
                        "{} already exists, use --force to overwrite",
                        self.persistence.path().display()
                    );
                }
            }
            ConfigActions::Validate { file } => {
                let persistence = file
                    .map(ConfigPersistence::new)
                    .unwrap_or_else(|| self.persistence.clone());
                let config = persistence.read()?;
                let results = ConfigValidator::new().validate(&config);
                let failed = results.iter().any(|r| r.is_error());

                if self.json_output {
                    let report: Vec<_> = results
                        .iter()
                        .map(|r| {
                            serde_json::json!({
                                "field": r.field,
                                "severity": match r.severity {
                                    ValidationSeverity::Error => "error",
                                    ValidationSeverity::Warning => "warning",
                                },
                                "message": r.message,
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({ "valid": !failed, "results": report })
                    );
                } else if results.is_empty() {
                    println!("{} is valid", persistence.path().display());
                } else {
                    for r in &results {
                        println!("{:?} {}: {}", r.severity, r.field, r.message);
                    }
                }

                if failed {
                    return Err(WinTrackError::Validation(format!(
                        "{} has invalid settings",
                        persistence.path().display()
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Simulated desktop session used by `wintrack demo`
struct DemoScript {
    windows: Arc<InMemoryWindowSystem>,
    events: Arc<InMemoryEventSource>,
    processes: Arc<InMemoryProcessInspector>,
}

const DEMO_SHELL: WindowHandle = WindowHandle(0x10010);
const DEMO_EDITOR: WindowHandle = WindowHandle(0x20020);
const DEMO_BROWSER: WindowHandle = WindowHandle(0x30030);
const DEMO_CHAT: WindowHandle = WindowHandle(0x40040);

impl DemoScript {
    fn new() -> Self {
        let windows = Arc::new(InMemoryWindowSystem::new_with(vec![
            (DEMO_SHELL, FakeWindow::new("Program Manager")),
            (DEMO_EDITOR, FakeWindow::new("notes.txt - Editor").maximized()),
            (DEMO_BROWSER, FakeWindow::new("Browser")),
            (DEMO_CHAT, FakeWindow::new("Chat").minimized()),
        ]));
        windows.set_shell_window(DEMO_SHELL);

        let processes = Arc::new(InMemoryProcessInspector::default());
        processes.insert(
            DEMO_EDITOR,
            ProcessDetails {
                pid: 4120,
                main_window_title: Some("notes.txt - Editor".to_string()),
                executable: Some(PathBuf::from(r"C:\Tools\editor.exe")),
                file_description: Some("Text Editor".to_string()),
            },
        );
        processes.insert(
            DEMO_CHAT,
            ProcessDetails {
                pid: 5230,
                main_window_title: None,
                executable: Some(PathBuf::from(r"C:\Apps\chat.exe")),
                file_description: Some("Application Frame Host".to_string()),
            },
        );

        Self {
            windows,
            events: Arc::new(InMemoryEventSource::default()),
            processes,
        }
    }

    fn backend(&self) -> Backend {
        Backend::in_memory(
            self.windows.clone(),
            self.events.clone(),
            self.processes.clone(),
        )
    }

    fn raise(&self, handle: WindowHandle, kind: RawEventKind) {
        self.events.emit(RawWindowEvent::for_window(handle, kind));
    }

    async fn play(&self, close_delay: Duration) {
        let pause = || tokio::time::sleep(Duration::from_millis(50));

        // Editor restored, then maximized again
        self.windows.restore(DEMO_EDITOR);
        self.raise(DEMO_EDITOR, RawEventKind::LocationChanged);
        pause().await;
        self.windows.maximize(DEMO_EDITOR);
        self.raise(DEMO_EDITOR, RawEventKind::LocationChanged);
        pause().await;

        // Editor minimized; the accompanying move must not read as unmaximize
        self.windows.minimize(DEMO_EDITOR);
        self.raise(DEMO_EDITOR, RawEventKind::LocationChanged);
        self.raise(DEMO_EDITOR, RawEventKind::MinimizeStart);
        pause().await;

        // Browser focused
        self.raise(DEMO_BROWSER, RawEventKind::ForegroundChanged);
        pause().await;

        // Chat restored straight into maximized bounds, then closed
        self.windows.maximize(DEMO_CHAT);
        self.raise(DEMO_CHAT, RawEventKind::LocationChanged);
        pause().await;
        self.windows.destroy(DEMO_CHAT);
        self.raise(DEMO_CHAT, RawEventKind::Destroyed);

        tokio::time::sleep(close_delay + Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LifecycleKind;

    #[test]
    fn parses_watch_with_global_flags() {
        let cli = WinTrackCli::try_parse_from([
            "wintrack",
            "--verbose",
            "--json",
            "watch",
            "--no-scan",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Watch { no_scan: true }));
    }

    #[test]
    fn parses_config_validate_with_file() {
        let cli = WinTrackCli::try_parse_from([
            "wintrack",
            "config",
            "validate",
            "--file",
            "custom.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Config(ConfigCommands {
                action: ConfigActions::Validate { file },
            }) => assert_eq!(file, Some(PathBuf::from("custom.toml"))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(WinTrackCli::try_parse_from(["wintrack", "tile"]).is_err());
    }

    #[test]
    fn json_rendering_includes_timestamp_and_payload() {
        let event = LifecycleEvent::Maximize {
            handle: WindowHandle::new(0x20),
            description: Some("Text Editor".to_string()),
        };
        let rendered = EventPrinter::new(true).render(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["event"], "maximize");
        assert_eq!(value["handle"], 0x20);
        assert_eq!(value["description"], "Text Editor");
        assert!(value["timestamp"].as_str().is_some());
    }

    #[test]
    fn text_rendering_uses_event_display() {
        let event = LifecycleEvent::Close {
            handle: WindowHandle::new(0x10),
        };
        assert!(EventPrinter::new(false)
            .render(&event)
            .unwrap()
            .ends_with("close 0x00000010"));
    }

    #[test]
    fn unserializable_event_is_skipped() {
        let error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(json_line(WindowHandle::new(0x10), Err(error)), None);
    }

    #[tokio::test]
    async fn demo_script_produces_every_transition() {
        let script = DemoScript::new();
        let mut config = TrackerConfig::default();
        config.tracker.close_recheck_delay_ms = 20;
        let service = TrackerService::from_backend(&script.backend(), &config);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        service
            .tracker()
            .subscribe_all(move |event| sink.lock().unwrap().push(event.kind()));

        let running = service.start().unwrap();
        script.play(Duration::from_millis(20)).await;
        running.shutdown().await.unwrap();

        let seen = seen.lock().unwrap();
        for kind in LifecycleKind::ALL {
            assert!(seen.contains(&kind), "missing {}", kind);
        }
    }
}
