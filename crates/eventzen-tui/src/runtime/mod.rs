//! Shell runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them.
//!
//! Async handlers send their result events to `inbox_tx`; the runtime drains
//! `inbox_rx` each loop iteration and feeds the events to the reducer.
//!
//! Structure:
//! - `mod.rs`: core runtime (event loop, effect dispatch)
//! - `inbox.rs`: inbox channel types
//! - `handlers/`: effect handler implementations

mod handlers;
mod inbox;

use std::future::Future;
use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use eventzen_core::config::Config;
use eventzen_core::geocode::GeocodeClient;
use eventzen_core::geolocation::LocationSource;
use eventzen_core::identity::FirebaseGateway;
use inbox::{UiEventReceiver, UiEventSender};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::{TaskCompleted, TaskId, TaskKind, TaskStarted};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Tick interval while a task is pending (spinner animation).
pub const FRAME_DURATION: Duration = Duration::from_millis(80);

/// Poll duration when idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(250);

/// External collaborators the handlers talk to.
pub struct Services {
    pub geolocator: LocationSource,
    pub geocoder: GeocodeClient,
    pub gateway: FirebaseGateway,
}

impl Services {
    /// Builds every client from the config.
    ///
    /// # Errors
    /// Returns an error if a configured URL or coordinate is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            geolocator: LocationSource::from_config(config)?,
            geocoder: GeocodeClient::from_config(config)?,
            gateway: FirebaseGateway::from_config(config)?,
        })
    }
}

/// Full-screen shell runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct ShellRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    services: Arc<Services>,
    inbox_tx: UiEventSender,
    inbox_rx: UiEventReceiver,
    last_tick: Instant,
}

impl ShellRuntime {
    /// Enters the alternate screen and creates the runtime.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(services: Services) -> Result<Self> {
        // Panic hook must be installed before entering the alternate screen.
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state: AppState::new(),
            services: Arc::new(services),
            inbox_tx,
            inbox_rx,
            last_tick: Instant::now(),
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal events fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;
        let result = self.event_loop();
        let _ = terminal::disable_input_features();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.shell.should_quit {
            let events = self.collect_events()?;

            for event in events {
                dirty = true;
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the inbox and the terminal.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tick_interval = if self.state.shell.tasks.is_any_running() {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        // Block until the next tick only when there is nothing to process.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Spawns an async task with a uniform TaskStarted/TaskCompleted lifecycle.
    fn spawn_task<F, Fut>(&self, kind: TaskKind, id: TaskId, cancelable: bool, f: F)
    where
        F: FnOnce(Option<CancellationToken>) -> Fut + Send + 'static,
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        let cancel = cancelable.then(CancellationToken::new);
        let started = TaskStarted {
            id,
            cancel: cancel.clone(),
        };
        let _ = tx.send(UiEvent::TaskStarted { kind, started });
        tokio::spawn(async move {
            let inner = f(cancel).await;
            let completed = TaskCompleted {
                id,
                result: Box::new(inner),
            };
            let _ = tx.send(UiEvent::TaskCompleted { kind, completed });
        });
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.shell.should_quit = true;
            }
            UiEffect::CancelTask { kind, token } => {
                if let Some(cancel) = token {
                    debug!(?kind, "cancel requested");
                    cancel.cancel();
                }
            }
            UiEffect::DetectLocation { task } => {
                let Some(task) = task else {
                    return;
                };
                let services = Arc::clone(&self.services);
                self.spawn_task(TaskKind::DetectLocation, task, false, move |_| async move {
                    handlers::detect_location(&services.geolocator, &services.geocoder).await
                });
            }
            UiEffect::SignIn { task, method } => {
                let Some(task) = task else {
                    return;
                };
                let services = Arc::clone(&self.services);
                self.spawn_task(TaskKind::SignIn, task, true, move |cancel| async move {
                    handlers::sign_in(&services.gateway, method, cancel).await
                });
            }
            UiEffect::SignOut { task } => {
                let Some(task) = task else {
                    return;
                };
                let services = Arc::clone(&self.services);
                self.spawn_task(TaskKind::SignOut, task, false, move |_| async move {
                    handlers::sign_out(&services.gateway).await
                });
            }
        }
    }
}

impl Drop for ShellRuntime {
    fn drop(&mut self) {
        let _ = terminal::restore_terminal();
    }
}
