//! Metrics collection and registry.

use prometheus::{Encoder, Gauge, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

use crate::pipeline::Stabilization;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of a finished run for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frames processed.
    pub frames: u64,
    /// Frames passed to the registrar.
    pub sampled_frames: u64,
    /// Frames written by the resampler.
    pub resampled_frames: u64,
    /// Largest absolute smoothed rotation, radians.
    pub max_abs_angle: f64,
    /// Largest smoothed translation magnitude, pixels.
    pub max_translation: f64,
    /// Center of rotation.
    pub center: [f64; 2],
    /// Seconds spent per stage, as `(stage, seconds)`.
    pub stage_seconds: Vec<(&'static str, f64)>,
}

impl MetricsSnapshot {
    /// Creates a snapshot from a finished run.
    pub fn from_run(run: &Stabilization) -> Self {
        let estimate = &run.estimate;
        let timings = &run.timings;

        Self {
            frames: estimate.context.len() as u64,
            sampled_frames: estimate.sampled.len() as u64,
            resampled_frames: run.output.len() as u64,
            max_abs_angle: estimate.smoothed.max_abs_angle(),
            max_translation: estimate.smoothed.max_translation(),
            center: estimate.context.center().to_array(),
            stage_seconds: vec![
                ("registration", timings.registration.as_secs_f64()),
                ("interpolation", timings.interpolation.as_secs_f64()),
                ("smoothing", timings.smoothing.as_secs_f64()),
                ("resampling", timings.resampling.as_secs_f64()),
            ],
        }
    }
}

/// Prometheus metrics registry for stabilization runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Volume
    frames_total: IntCounter,
    sampled_frames_total: IntCounter,
    resampled_frames_total: IntCounter,

    // Motion
    max_abs_angle: Gauge,
    max_translation: Gauge,
    center_x: Gauge,
    center_y: Gauge,

    // Timing
    stage_seconds: GaugeVec,
    runs_total: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all run metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_total = IntCounter::new(
            "timelapse_stabilizer_frames_total",
            "Total number of frames processed",
        )?;
        let sampled_frames_total = IntCounter::new(
            "timelapse_stabilizer_sampled_frames_total",
            "Total number of frames registered against the reference",
        )?;
        let resampled_frames_total = IntCounter::new(
            "timelapse_stabilizer_resampled_frames_total",
            "Total number of frames warped into the reference geometry",
        )?;

        let max_abs_angle = Gauge::new(
            "timelapse_stabilizer_max_abs_angle_radians",
            "Largest absolute smoothed rotation in the last run",
        )?;
        let max_translation = Gauge::new(
            "timelapse_stabilizer_max_translation_pixels",
            "Largest smoothed translation magnitude in the last run",
        )?;
        let center_x = Gauge::new(
            "timelapse_stabilizer_center_x_pixels",
            "Center of rotation x coordinate in the last run",
        )?;
        let center_y = Gauge::new(
            "timelapse_stabilizer_center_y_pixels",
            "Center of rotation y coordinate in the last run",
        )?;

        let stage_seconds = GaugeVec::new(
            Opts::new(
                "timelapse_stabilizer_stage_seconds",
                "Wall-clock seconds spent per pipeline stage in the last run",
            ),
            &["stage"],
        )?;
        let runs_total = IntGauge::new(
            "timelapse_stabilizer_runs",
            "Number of runs recorded in this registry",
        )?;

        // Register all metrics
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(sampled_frames_total.clone()))?;
        registry.register(Box::new(resampled_frames_total.clone()))?;
        registry.register(Box::new(max_abs_angle.clone()))?;
        registry.register(Box::new(max_translation.clone()))?;
        registry.register(Box::new(center_x.clone()))?;
        registry.register(Box::new(center_y.clone()))?;
        registry.register(Box::new(stage_seconds.clone()))?;
        registry.register(Box::new(runs_total.clone()))?;

        Ok(Self {
            registry,
            frames_total,
            sampled_frames_total,
            resampled_frames_total,
            max_abs_angle,
            max_translation,
            center_x,
            center_y,
            stage_seconds,
            runs_total,
        })
    }

    /// Records one finished run.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.frames_total.inc_by(snapshot.frames);
        self.sampled_frames_total.inc_by(snapshot.sampled_frames);
        self.resampled_frames_total.inc_by(snapshot.resampled_frames);

        self.max_abs_angle.set(snapshot.max_abs_angle);
        self.max_translation.set(snapshot.max_translation);
        self.center_x.set(snapshot.center[0]);
        self.center_y.set(snapshot.center[1]);

        for (stage, seconds) in &snapshot.stage_seconds {
            self.stage_seconds.with_label_values(&[*stage]).set(*seconds);
        }
        self.runs_total.inc();
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
