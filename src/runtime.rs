//! Task wiring for a live run.
//!
//! Three independent loops share state:
//! - the scheduler ticks the pipeline at a fixed period,
//! - the motion gate task drains the accelerometer channel,
//! - the render task polls the readings on its own cadence.
//!
//! The pipeline sits behind one mutex that a tick holds for its whole
//! duration, so ticks never overlap. The tick reads the motion gate only
//! through its atomic flag and never waits on the sensor side.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, sleep, Duration, Instant, MissedTickBehavior};

use crate::error::{Result, SpeedometerError};
use crate::live_status::{format_moving_time, LiveStatus};
use crate::motion_gate::{MotionGate, MotionHint};
use crate::pipeline::{LocationCalculator, Readings, TickCounters, TickOutcome};
use crate::settings::{read_unit_system, Settings, SourceKind, UnitPreference};
use crate::sources::{
    accel_loop, now_ms, termux_location_loop, FixSource, LastKnownFix, MockFixSource,
};
use crate::types::{AccelData, Fix, UnitSystem};

const ACCEL_CHANNEL_CAPACITY: usize = 500;

#[derive(Debug)]
struct Shared {
    calculator: Mutex<LocationCalculator>,
    accuracy_bits: AtomicU64,
}

/// Cloneable handle to the running pipeline.
#[derive(Clone, Debug)]
pub struct SpeedometerHandle(Arc<Shared>);

impl SpeedometerHandle {
    pub fn new(calculator: LocationCalculator) -> Self {
        Self(Arc::new(Shared {
            calculator: Mutex::new(calculator),
            accuracy_bits: AtomicU64::new(0f64.to_bits()),
        }))
    }

    pub fn tick(&self, fix: Fix, accuracy: f64, motion: Option<bool>) -> Result<TickOutcome> {
        let mut calculator = self.0.calculator.lock().map_err(|_| {
            SpeedometerError::Internal("Failed to acquire calculator lock".to_string())
        })?;
        self.0.accuracy_bits.store(accuracy.to_bits(), Ordering::Relaxed);
        Ok(calculator.tick(fix, motion))
    }

    pub fn readings(&self, unit_system: UnitSystem) -> Result<(Readings, TickCounters)> {
        let calculator = self.0.calculator.lock().map_err(|_| {
            SpeedometerError::Internal("Failed to acquire calculator lock".to_string())
        })?;
        Ok((calculator.readings(unit_system), calculator.counters()))
    }

    /// Accuracy reported alongside the latest fix (m)
    pub fn accuracy(&self) -> f64 {
        f64::from_bits(self.0.accuracy_bits.load(Ordering::Relaxed))
    }
}

/// Tick the pipeline every `period` until `shutdown` fires.
///
/// A tick that comes due while the previous one is still running is
/// skipped, not queued.
pub async fn scheduler_loop(
    handle: SpeedometerHandle,
    mut source: Box<dyn FixSource>,
    hint: MotionHint,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut no_fix_ticks = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let fix = source.get_fix();
        let accuracy = source.accuracy();
        match handle.tick(fix, accuracy, hint.current())? {
            TickOutcome::NoFix => {
                no_fix_ticks += 1;
                if no_fix_ticks == 1 || no_fix_ticks % 30 == 0 {
                    log::info!("waiting for a GPS fix ({no_fix_ticks} ticks)");
                }
            }
            outcome => {
                no_fix_ticks = 0;
                log::trace!("tick: {outcome:?}");
            }
        }
    }
    Ok(())
}

/// Feed accelerometer samples into the gate until the channel closes.
pub async fn motion_gate_loop(mut rx: mpsc::Receiver<AccelData>, gate: Arc<Mutex<MotionGate>>) {
    let mut samples = 0u64;
    while let Some(sample) = rx.recv().await {
        match gate.lock() {
            Ok(mut gate) => {
                gate.on_accel(&sample);
            }
            Err(_) => {
                log::error!("[accel] motion gate lock poisoned, stopping");
                break;
            }
        }
        samples += 1;
    }
    log::debug!("[accel] stream ended after {samples} samples");
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub period: Duration,
    pub units: UnitPreference,
    /// Re-read `unit_system` from here on every refresh
    pub settings_path: Option<PathBuf>,
    pub status_path: Option<PathBuf>,
    pub sensor_silence: Duration,
    /// Don't print the instrument line
    pub quiet: bool,
}

/// One text line of the instrument display
pub fn display_line(status: &LiveStatus) -> String {
    let mut line = format!(
        "{:.6} {:.6} {:.1}{} | {:6.1} {} | {:9.1} {} | {}",
        status.gps_lat,
        status.gps_lon,
        status.gps_alt,
        "m",
        status.speed,
        status.speed_unit,
        status.distance,
        status.distance_unit,
        format_moving_time(status.moving_time_seconds),
    );
    if status.motion_gate_enabled {
        line.push_str(&format!(
            " | x: {:.2} y: {:.2} z: {:.2} acc: {}",
            status.accel_axes[0], status.accel_axes[1], status.accel_axes[2], status.accelerating
        ));
        if status.stop_lock {
            line.push_str(" [stop-lock]");
        }
    }
    line
}

/// Poll the readings every `options.period` and show them.
pub async fn render_loop(
    handle: SpeedometerHandle,
    gate: Option<Arc<Mutex<MotionGate>>>,
    options: RenderOptions,
    mut shutdown: watch::Receiver<bool>,
) {
    let started = Instant::now();
    let mut ticker = interval(options.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut silence_reported = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        if let Some(path) = &options.settings_path {
            match read_unit_system(path) {
                Ok(unit) => {
                    if options.units.set(unit) {
                        log::info!("unit system changed to {unit}");
                    }
                }
                Err(e) => log::debug!("keeping unit system: {e}"),
            }
        }

        let (readings, counters) = match handle.readings(options.units.get()) {
            Ok(values) => values,
            Err(e) => {
                log::error!("render: {e}");
                break;
            }
        };
        let mut status = LiveStatus::new(&readings, counters);
        status.gps_accuracy = handle.accuracy();
        status.uptime_seconds = started.elapsed().as_secs();

        if let Some(gate) = &gate {
            if let Ok(gate) = gate.lock() {
                let silent = started.elapsed() >= options.sensor_silence
                    && gate.is_silent(now_ms(), options.sensor_silence.as_millis() as i64);
                if silent && !silence_reported {
                    log::warn!(
                        "no accelerometer samples for {}s, stop-lock can't be released",
                        options.sensor_silence.as_secs()
                    );
                } else if !silent && silence_reported {
                    log::info!("accelerometer samples are back");
                }
                silence_reported = silent;
                status = status.with_motion(gate.snapshot(), silent);
            }
        }

        if !options.quiet {
            println!("{}", display_line(&status));
        }
        if let Some(path) = &options.status_path {
            if let Err(e) = status.save(path) {
                log::warn!("failed to write {}: {e}", path.display());
            }
        }
    }
}

/// Run the speedometer until `settings.duration_secs` elapses (or forever
/// when 0) or Ctrl-C. Returns the final status.
pub async fn run(settings: Settings, settings_path: Option<PathBuf>, quiet: bool) -> Result<LiveStatus> {
    settings.validate()?;
    let period = settings.update_period();
    let handle = SpeedometerHandle::new(LocationCalculator::new(settings.pipeline_config())?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let source: Box<dyn FixSource> = match settings.source {
        SourceKind::Mock => Box::new(MockFixSource::new()),
        SourceKind::Termux => {
            let cell = LastKnownFix::new();
            tokio::spawn(termux_location_loop(cell.clone(), period));
            Box::new(cell)
        }
    };

    let mut accel_tasks = None;
    let (gate, hint) = if settings.motion_gate {
        let gate = MotionGate::new();
        let hint = gate.hint();
        let gate = Arc::new(Mutex::new(gate));

        let (tx, rx) = mpsc::channel::<AccelData>(ACCEL_CHANNEL_CAPACITY);
        let producer = tokio::spawn(accel_loop(
            tx,
            Duration::from_millis(settings.accel_interval_ms),
            settings.source == SourceKind::Termux,
        ));
        let consumer = tokio::spawn(motion_gate_loop(rx, gate.clone()));
        accel_tasks = Some((producer, consumer));
        (Some(gate), hint)
    } else {
        (None, MotionHint::None)
    };

    log::info!(
        "speedometer starting: period {} ms, solver {:?}, motion gate {}, source {:?}",
        settings.update_period_ms,
        settings.solver,
        settings.motion_gate,
        settings.source
    );

    let scheduler = tokio::spawn(scheduler_loop(
        handle.clone(),
        source,
        hint,
        period,
        shutdown_rx.clone(),
    ));
    let units = UnitPreference::new(settings.unit_system);
    let render = tokio::spawn(render_loop(
        handle.clone(),
        gate.clone(),
        RenderOptions {
            period,
            units: units.clone(),
            settings_path,
            status_path: settings.status_path.clone(),
            sensor_silence: Duration::from_secs(settings.sensor_silence_secs),
            quiet,
        },
        shutdown_rx,
    ));

    if settings.duration_secs > 0 {
        tokio::select! {
            _ = sleep(Duration::from_secs(settings.duration_secs)) => log::info!("duration reached, stopping"),
            _ = tokio::signal::ctrl_c() => log::info!("interrupted, stopping"),
        }
    } else {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("interrupted, stopping");
    }

    let _ = shutdown_tx.send(true);
    scheduler
        .await
        .map_err(|e| SpeedometerError::Internal(format!("scheduler task failed: {e}")))??;
    render
        .await
        .map_err(|e| SpeedometerError::Internal(format!("render task failed: {e}")))?;
    if let Some((producer, consumer)) = accel_tasks {
        producer.abort();
        let _ = consumer.await;
    }

    let (readings, counters) = handle.readings(units.get())?;
    let mut status = LiveStatus::new(&readings, counters);
    status.gps_accuracy = handle.accuracy();
    if let Some(gate) = &gate {
        if let Ok(gate) = gate.lock() {
            status = status.with_motion(gate.snapshot(), false);
        }
    }
    Ok(status)
}
