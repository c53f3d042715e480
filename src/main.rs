//! Sinescope CLI - generator, controller and headless monitor

use clap::{Parser, Subcommand};
use sinescope::channel::{CommandReceiver, CommandSender, DEFAULT_FIFO_PATH};
use sinescope::command::CommandKind;
use sinescope::config::GeneratorConfig;
use sinescope::control::{self, COMMAND_WORDS};
use sinescope::monitor::{Monitor, DEFAULT_REPORT_INTERVAL};
use sinescope::oscillator::{SignalSource, SineOscillator};
use sinescope::scheduler::{CancellationToken, FrameScheduler};
use sinescope::shm::{SharedSegment, DEFAULT_SHM_NAME};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sinescope")]
#[command(about = "Sine generator streaming over shared memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the generator (owns the FIFO and the shared segment)
    Generate {
        /// TOML config file (default: ~/.config/sinescope/config.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Command FIFO path
        #[arg(long)]
        fifo: Option<PathBuf>,

        /// Shared-memory object name (must start with '/')
        #[arg(long)]
        shm: Option<String>,

        /// Milliseconds between frames
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Samples per frame
        #[arg(short, long)]
        samples: Option<usize>,

        /// Start producing without waiting for a start command
        #[arg(long)]
        auto_start: bool,
    },

    /// Send commands typed on stdin to a running generator
    Control {
        /// Command FIFO path
        #[arg(long, default_value = DEFAULT_FIFO_PATH)]
        fifo: PathBuf,
    },

    /// Attach to the shared ring and log what arrives
    Monitor {
        /// Shared-memory object name
        #[arg(long, default_value = DEFAULT_SHM_NAME)]
        shm: String,

        /// Milliseconds between polls
        #[arg(short, long, default_value = "2")]
        poll_ms: u64,
    },
}

/// Cancel `token` on Ctrl-C, from a small runtime on its own thread
fn cancel_on_ctrl_c(token: CancellationToken) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::spawn(move || {
        runtime.block_on(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    token.cancel();
                }
                Err(e) => warn!("Could not listen for Ctrl-C: {}", e),
            }
        });
    });

    Ok(())
}

fn generate(
    config: Option<PathBuf>,
    fifo: Option<PathBuf>,
    shm: Option<String>,
    interval_ms: Option<u64>,
    samples: Option<usize>,
    auto_start: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = GeneratorConfig::load(config.as_deref())?;
    if let Some(fifo) = fifo {
        cfg.fifo_path = fifo;
    }
    if let Some(shm) = shm {
        cfg.shm_name = shm;
    }
    if let Some(ms) = interval_ms {
        cfg.frame_interval_ms = ms;
    }
    if let Some(n) = samples {
        cfg.samples_per_frame = n;
    }
    cfg.auto_start |= auto_start;
    let cfg = cfg.clamped();

    info!("🎵 Generator starting (pid {})", std::process::id());

    let receiver = CommandReceiver::create(&cfg.fifo_path)?;
    let segment = SharedSegment::create(&cfg.shm_name)?;

    let mut oscillator = SineOscillator::new(cfg.initial_frequency, cfg.initial_amplitude);
    if cfg.auto_start {
        oscillator.start();
    }

    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone())?;

    info!("✅ Ready. Waiting for commands on {}", cfg.fifo_path.display());

    let scheduler = FrameScheduler::new(oscillator, receiver, segment, &cfg, token);
    let stats = scheduler.run();

    info!(
        "Generator shut down ({} commands, {} frames)",
        stats.commands_handled, stats.frames_published
    );
    Ok(())
}

fn control(fifo: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut sender = CommandSender::connect(&fifo)?;

    println!("\n=== CONTROLLER ===");
    for word in COMMAND_WORDS {
        println!("  {}", word);
    }
    println!("==================\n");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match control::parse_line(&line) {
            Ok(Some(cmd)) => {
                sender.send(&cmd)?;
                println!("{}", control::describe(&cmd));
                if cmd.kind == CommandKind::Quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

fn monitor(shm: String, poll_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let segment = SharedSegment::open(&shm)?;
    info!("👀 Monitoring {}", segment.name());

    let token = CancellationToken::new();
    cancel_on_ctrl_c(token.clone())?;

    let mut monitor = Monitor::new(segment);
    let report = monitor.run(
        &token,
        Duration::from_millis(poll_ms.max(1)).min(DEFAULT_REPORT_INTERVAL),
        DEFAULT_REPORT_INTERVAL,
    );
    info!("Drained {} samples in total", report.drained);

    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            config,
            fifo,
            shm,
            interval_ms,
            samples,
            auto_start,
        } => generate(config, fifo, shm, interval_ms, samples, auto_start),
        Commands::Control { fifo } => control(fifo),
        Commands::Monitor { shm, poll_ms } => monitor(shm, poll_ms),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        std::process::exit(1);
    }
}
