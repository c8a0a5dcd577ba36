// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Optional callback for reporting generation progress in `[0.0, 1.0]`.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, fraction: f32);
}

/// Optional sink for low-overhead scalar telemetry.
pub trait TelemetrySink: Send + Sync {
    fn record_scalar(&self, key: &'static str, value: f64);
}

/// No-op progress sink for call sites that want an explicit sink object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_progress(&self, _fraction: f32) {}
}

/// No-op telemetry sink for call sites that want an explicit sink object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record_scalar(&self, _key: &'static str, _value: f64) {}
}

/// Borrowed observability hooks threaded through a generation run.
#[derive(Clone, Copy, Default)]
pub struct GenerationContext<'a> {
    progress: Option<&'a dyn ProgressSink>,
    telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> GenerationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress_sink(mut self, sink: &'a dyn ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_telemetry_sink(mut self, sink: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Forwards `fraction` clamped to `[0, 1]`; non-finite values are dropped.
    pub fn report_progress(&self, fraction: f32) {
        if let Some(sink) = self.progress
            && fraction.is_finite()
        {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}

impl std::fmt::Debug for GenerationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationContext")
            .field("progress", &self.progress.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}
