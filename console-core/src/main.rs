//! src/main.rs
//! Migration assessment console: terminal front-end for the discovery agent

use std::{
    io::{self, Stdout},
    panic::PanicHookInfo,
    sync::Arc,
    time::Instant,
};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend};
use tokio::{
    signal,
    sync::{Mutex, Notify, mpsc},
};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use console_core::{
    AppState, Logger,
    api::{CollectorApi, HttpCollectorClient},
    config::Config,
    controller::{
        action_dispatcher::ActionDispatcher,
        actions::Action,
        event_loop::{EventLoop, TaskResult},
    },
    view::{theme, ui::UIRenderer},
};

type AppTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    setup_panic_handler();

    let app = App::new()
        .await
        .context("Failed to initialize application")?;
    app.run().await.context("Application runtime error")?;

    info!("Application exited cleanly");
    Ok(())
}

struct App {
    terminal: AppTerminal,
    app_state: Arc<Mutex<AppState>>,
    event_loop: EventLoop,
    action_dispatcher: ActionDispatcher,
    ui_renderer: UIRenderer,
    shutdown: Arc<Notify>,
    started_at: Instant,
    // Dropped last so buffered log lines are flushed.
    _log_guard: WorkerGuard,
}

impl App {
    async fn new() -> Result<Self> {
        let config = Config::load().await.unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {e:#}");
            Config::default()
        });

        let log_guard = Logger::init_tracing(&config.logging).context("Failed to start logging")?;
        info!(
            marker = "APP_START",
            api = %config.api.base_url,
            poll_interval = ?config.collector.poll_interval,
            "Starting migration assessment console"
        );
        theme::init_theme();

        let api: Arc<dyn CollectorApi> = Arc::new(
            HttpCollectorClient::new(&config.api).context("Failed to build agent client")?,
        );

        let poll_interval = config.collector.poll_interval;
        let app_state = Arc::new(Mutex::new(AppState::new(Arc::new(config))));
        let (task_tx, task_rx) = mpsc::unbounded_channel::<TaskResult>();

        let mut action_dispatcher =
            ActionDispatcher::new(Arc::clone(&app_state), api, task_tx, poll_interval);
        action_dispatcher.attach().await;

        let terminal = setup_terminal().context("Failed to initialize terminal")?;
        let event_loop = EventLoop::new(Arc::clone(&app_state), task_rx);

        info!("Application initialized successfully");

        Ok(Self {
            terminal,
            app_state,
            event_loop,
            action_dispatcher,
            ui_renderer: UIRenderer::new(),
            shutdown: Arc::new(Notify::new()),
            started_at: Instant::now(),
            _log_guard: log_guard,
        })
    }

    async fn run(mut self) -> Result<()> {
        self.setup_shutdown_handler();
        info!("Starting event loop");

        loop {
            self.render().await?;

            tokio::select! {
                () = self.shutdown.notified() => {
                    info!("Shutdown signal received");
                    break;
                }

                action = self.event_loop.next_action() => {
                    let Some(action) = action else {
                        info!("Event sources closed");
                        break;
                    };
                    if !self.dispatch_action(action).await {
                        break;
                    }
                }
            }
        }

        self.action_dispatcher.shutdown();
        self.log_final_metrics();
        Ok(())
    }

    async fn dispatch_action(&mut self, action: Action) -> bool {
        if !matches!(action, Action::Tick) {
            debug!("Dispatching action: {:?}", action);
        }
        self.action_dispatcher.handle(action).await
    }

    async fn render(&mut self) -> Result<()> {
        let app = self.app_state.lock().await;
        if !app.ui.needs_redraw() {
            return Ok(());
        }

        let renderer = &mut self.ui_renderer;
        self.terminal
            .draw(|frame: &mut Frame<'_>| renderer.render(frame, &app))
            .context("Failed to draw terminal")?;
        Ok(())
    }

    fn log_final_metrics(&self) {
        let stats = self.ui_renderer.stats();
        info!(
            marker = "APP_STOP",
            uptime_s = self.started_at.elapsed().as_secs(),
            frames = stats.frames,
            slow_frames = stats.slow,
            fps = format!("{:.1}", stats.fps()),
            "Event loop terminated cleanly"
        );
    }

    fn setup_shutdown_handler(&self) {
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{SignalKind, signal};

                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("Failed to install SIGTERM handler: {}", e);
                        return;
                    }
                };

                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = signal::ctrl_c() => info!("Received Ctrl+C"),
                }
            }

            #[cfg(not(unix))]
            {
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received Ctrl+C");
            }

            shutdown.notify_one();
        });
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Err(e) = cleanup_terminal(&mut self.terminal) {
            warn!("Failed to cleanup terminal: {}", e);
        }
    }
}

fn setup_terminal() -> Result<AppTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    info!("Terminal setup complete");
    Ok(terminal)
}

fn cleanup_terminal(terminal: &mut AppTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    info!("Terminal cleanup complete");
    Ok(())
}

fn setup_panic_handler() {
    let original_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);

        error!("Application panicked: {}", panic_info);
        original_hook(panic_info);
    }));
}
