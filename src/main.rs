use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use sensorwatch::config::{Settings, Transport};
use sensorwatch::logging::{self, LogTarget};
use sensorwatch::ui::{self, Theme};
use sensorwatch::{events, App, MessageSource, MqttSource, Series, StreamSource, TopicRouter};

/// Smallest accepted UI tick.
const MIN_TICK_MS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "sensorwatch", version)]
#[command(about = "Live terminal chart for a single MQTT sensor topic")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect over websockets instead of plain TCP
    #[arg(long)]
    websocket: bool,

    /// Topic whose readings are charted
    #[arg(short, long)]
    topic: Option<String>,

    /// Payload field holding the measured value (e.g. "hmd", "tmp")
    #[arg(short, long)]
    field: Option<String>,

    /// Keep at most this many points (unbounded by default)
    #[arg(long)]
    max_points: Option<usize>,

    /// Read "<topic> <payload>" lines from stdin instead of connecting to a broker
    #[arg(long, conflicts_with_all = ["host", "port", "websocket"])]
    stdin: bool,

    /// Print readings to stdout instead of drawing the chart
    #[arg(long)]
    headless: bool,

    /// Log file used while the chart is shown
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Apply command-line overrides on top of the loaded settings.
fn apply_overrides(args: &Args, settings: &mut Settings) {
    if let Some(ref host) = args.host {
        settings.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        settings.broker.port = port;
    }
    if args.websocket {
        settings.broker.transport = Transport::Websocket;
    }
    if let Some(ref topic) = args.topic {
        settings.feed.topic = topic.clone();
    }
    if let Some(ref field) = args.field {
        settings.feed.field = field.clone();
    }
    if args.max_points.is_some() {
        settings.feed.max_points = args.max_points;
    }
    if let Some(ref path) = args.log_file {
        settings.log.file = path.clone();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    apply_overrides(&args, &mut settings);

    let target = if args.headless {
        LogTarget::Stderr
    } else {
        LogTarget::File(&settings.log.file)
    };
    logging::init(target, &settings.log.filter)?;

    info!("sensorwatch v{}", env!("CARGO_PKG_VERSION"));

    let rt = tokio::runtime::Runtime::new()?;

    // Composition root: the transport is chosen here and injected into the app
    let mut source: Box<dyn MessageSource> = if args.stdin {
        Box::new(StreamSource::stdin())
    } else {
        Box::new(MqttSource::new(settings.broker.clone()))
    };

    let subscription = rt
        .block_on(source.subscribe(&settings.feed.topic))
        .with_context(|| format!("Failed to subscribe via {}", source.description()))?;

    info!(
        "Charting '{}' from {} ({})",
        settings.feed.field,
        settings.feed.topic,
        source.description()
    );

    let router = TopicRouter::new(&settings.feed.topic, &settings.feed.field);
    let series = Series::with_capacity_limit(settings.feed.max_points);
    let tick = Duration::from_millis(settings.display.tick_ms.max(MIN_TICK_MS));

    let mut app = App::new(subscription, router, series).with_title(&settings.display.title);

    let result = if args.headless {
        rt.block_on(run_headless(&mut app, tick))
    } else {
        app.theme = Theme::auto_detect();
        run_tui(&mut app, tick)
    };

    // Release the subscription before the runtime goes away
    app.shutdown(rt);
    info!("Shut down");

    result
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, app, tick);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    while app.running {
        // Ingest whatever arrived, then redraw from the updated series
        app.pump();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(tick)? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}

/// Print each accepted reading as `label<TAB>value` until Ctrl-C, the source
/// ends, or stdout is closed
async fn run_headless(app: &mut App, tick: Duration) -> Result<()> {
    let mut interval = tokio::time::interval(tick);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = app.pump_into(&mut out) {
                    info!("Stopped writing readings: {}", e);
                    break;
                }

                if app.source_finished() {
                    if let Some(err) = app.source_error() {
                        warn!("Source ended: {}", err);
                    }
                    break;
                }
            }
        }
    }

    Ok(())
}
