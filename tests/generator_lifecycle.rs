//! Generator lifecycle tests
//!
//! Drive a real scheduler over a real FIFO and shared-memory segment, with the
//! controller and the viewer on the test thread.

use sinescope::channel::{CommandReceiver, CommandSender};
use sinescope::command::Command;
use sinescope::config::GeneratorConfig;
use sinescope::monitor::Monitor;
use sinescope::oscillator::SineOscillator;
use sinescope::scheduler::{CancellationToken, FrameScheduler};
use sinescope::shm::SharedSegment;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn unique_shm_name() -> String {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    format!(
        "/sinescope_it_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

fn test_config(fifo: PathBuf, shm: String) -> GeneratorConfig {
    GeneratorConfig {
        fifo_path: fifo,
        shm_name: shm,
        frame_interval_ms: 5,
        samples_per_frame: 1000,
        ..GeneratorConfig::default()
    }
}

fn spawn_generator(
    cfg: GeneratorConfig,
    token: CancellationToken,
) -> thread::JoinHandle<sinescope::scheduler::SchedulerStats> {
    let receiver = CommandReceiver::create(&cfg.fifo_path).unwrap();
    let segment = SharedSegment::create(&cfg.shm_name).unwrap();

    thread::spawn(move || {
        let osc = SineOscillator::new(cfg.initial_frequency, cfg.initial_amplitude);
        FrameScheduler::new(osc, receiver, segment, &cfg, token).run()
    })
}

/// Poll `monitor` until it has drained at least `want` samples
fn wait_for_samples<R>(monitor: &mut Monitor<R>, want: u64) -> bool
where
    R: std::ops::Deref<Target = sinescope::ring::RingLayout>,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        monitor.poll();
        if monitor.report().drained >= want {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_controller_drives_generator_into_viewer() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path().join("cmd"), unique_shm_name());
    let handle = spawn_generator(cfg.clone(), CancellationToken::new());

    let viewer = SharedSegment::open(&cfg.shm_name).unwrap();
    let mut monitor = Monitor::new(viewer);

    let mut controller = CommandSender::connect(&cfg.fifo_path).unwrap();
    controller.send(&Command::set_frequency(440.0)).unwrap();
    controller.send(&Command::set_amplitude(0.8)).unwrap();
    controller.send(&Command::start()).unwrap();

    assert!(wait_for_samples(&mut monitor, 2000), "no frames arrived");

    let report = monitor.report();
    assert!(report.peak <= 0.8 + 1e-12, "peak {} exceeds amplitude", report.peak);
    assert!(report.peak > 0.5);
    assert!(report.total_produced >= 2000);

    controller.send(&Command::quit()).unwrap();
    let stats = handle.join().unwrap();
    assert!(stats.frames_published >= 2);
    assert_eq!(stats.commands_handled, 4);
}

#[test]
fn test_quit_releases_both_names() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path().join("cmd"), unique_shm_name());
    let handle = spawn_generator(cfg.clone(), CancellationToken::new());

    let mut controller = CommandSender::connect(&cfg.fifo_path).unwrap();
    controller.send(&Command::start()).unwrap();
    controller.send(&Command::quit()).unwrap();
    handle.join().unwrap();

    assert!(!cfg.fifo_path.exists());
    assert!(SharedSegment::open(&cfg.shm_name).is_err());

    // A second run can create both again
    let _receiver = CommandReceiver::create(&cfg.fifo_path).unwrap();
    let segment = SharedSegment::create(&cfg.shm_name).unwrap();
    assert_eq!(segment.write_position(), 0);
}

#[test]
fn test_cancellation_stops_generator() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path().join("cmd"), unique_shm_name());
    let token = CancellationToken::new();
    let handle = spawn_generator(cfg.clone(), token.clone());

    thread::sleep(Duration::from_millis(20));
    token.cancel();
    let stats = handle.join().unwrap();

    assert_eq!(stats.frames_published, 0);
    assert!(!cfg.fifo_path.exists());
}

#[test]
fn test_stop_pauses_production() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path().join("cmd"), unique_shm_name());
    let handle = spawn_generator(cfg.clone(), CancellationToken::new());

    let viewer = SharedSegment::open(&cfg.shm_name).unwrap();
    let mut monitor = Monitor::new(viewer);
    let mut controller = CommandSender::connect(&cfg.fifo_path).unwrap();

    controller.send(&Command::start()).unwrap();
    assert!(wait_for_samples(&mut monitor, 1000));

    controller.send(&Command::stop()).unwrap();
    thread::sleep(Duration::from_millis(50));
    monitor.poll();
    let paused_at = monitor.report().total_produced;

    thread::sleep(Duration::from_millis(50));
    assert_eq!(monitor.report().total_produced, paused_at);

    controller.send(&Command::quit()).unwrap();
    handle.join().unwrap();
}
