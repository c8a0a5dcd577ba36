// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ssa_core::{GenerationContext, ProgressSink, TelemetrySink, is_symmetric, log_det_spd, min_eigenvalue};
use ssa_eval::{canonical_correlations, moment_errors};
use ssa_synth::{SsaConfig, SsaGenerator, generate, nonstationary_block};
use std::io;
use std::sync::{Arc, Mutex};

fn generate_seeded(config: &SsaConfig) -> ssa_synth::SsaDataset {
    generate(config).expect("generation should succeed")
}

#[derive(Default)]
struct RecordingProgress {
    fractions: Mutex<Vec<f32>>,
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, fraction: f32) {
        self.fractions
            .lock()
            .expect("progress lock should not be poisoned")
            .push(fraction);
    }
}

#[derive(Default)]
struct RecordingTelemetry {
    scalars: Mutex<Vec<(&'static str, f64)>>,
}

impl TelemetrySink for RecordingTelemetry {
    fn record_scalar(&self, key: &'static str, value: f64) {
        self.scalars
            .lock()
            .expect("telemetry lock should not be poisoned")
            .push((key, value));
    }
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().expect("buffer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("buffer lock should not be poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn default_scenario_has_expected_shapes_and_zero_means() {
    let config = SsaConfig::new(10, 2, 2);
    let (samples, mixing, covariances, means) = generate_seeded(&config).into_parts();

    assert_eq!(samples.len(), 10);
    for epoch in &samples {
        assert_eq!(epoch.shape(), (4, 500));
    }
    assert_eq!(mixing.shape(), (4, 4));
    for column in mixing.column_iter() {
        assert!((column.norm() - 1.0).abs() < 1e-12);
    }
    assert_eq!(covariances.len(), 10);
    assert_eq!(means.len(), 10);
    for (cov, mean) in covariances.iter().zip(&means) {
        assert!(is_symmetric(cov, 0.0));
        assert!(min_eigenvalue(cov) >= -1e-10);
        assert_eq!(mean, &DVector::zeros(4));
    }
}

#[test]
fn same_seed_reproduces_bit_identical_output() {
    let config = SsaConfig {
        mean_nonstationarity: 0.7,
        seed: 1234,
        ..SsaConfig::new(4, 2, 3)
    };

    let first = generate_seeded(&config);
    let second = generate_seeded(&config);
    assert_eq!(first.samples, second.samples);
    assert_eq!(first.mixing(), second.mixing());
    assert_eq!(first.model.covariances(), second.model.covariances());
    assert_eq!(first.model.means(), second.model.means());
    assert_eq!(first.diagnostics(), second.diagnostics());
    assert_eq!(first.diagnostics().seed, Some(1234));

    let third = generate_seeded(&SsaConfig {
        seed: 1235,
        ..config
    });
    assert_ne!(first.mixing(), third.mixing());
}

#[test]
fn caller_supplied_rng_matches_seeded_generation() {
    let config = SsaConfig {
        seed: 99,
        ..SsaConfig::new(3, 1, 2)
    };
    let generator = SsaGenerator::new(&config).expect("config should validate");

    let seeded = generator
        .generate(&GenerationContext::default())
        .expect("seeded generation should succeed");
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let explicit = generator
        .generate_with_rng(&mut rng, &GenerationContext::default())
        .expect("explicit generation should succeed");

    assert_eq!(seeded.samples, explicit.samples);
    assert_eq!(explicit.diagnostics().seed, None);
}

#[test]
fn purely_nonstationary_sources_have_no_cross_structure() {
    let config = SsaConfig {
        mean_nonstationarity: 0.5,
        ..SsaConfig::new(3, 0, 2)
    };
    let dataset = generate_seeded(&config);

    assert_eq!(dataset.mixing().shape(), (2, 2));
    assert_eq!(dataset.model.stationary_mixing().shape(), (2, 0));
    for source in dataset.model.source_covariances() {
        assert!(
            canonical_correlations(source, 0)
                .expect("split 0 should be valid")
                .is_empty()
        );
    }
    for epoch in &dataset.samples {
        assert_eq!(epoch.shape(), (2, 500));
    }
}

#[test]
fn purely_stationary_sources_share_covariance_and_have_zero_means() {
    let config = SsaConfig {
        mean_nonstationarity: 2.0,
        ..SsaConfig::new(4, 3, 0)
    };
    let dataset = generate_seeded(&config);

    let covariances = dataset.model.covariances();
    let expected = dataset.mixing() * dataset.mixing().transpose();
    for cov in &covariances {
        assert!((cov - &expected).norm() < 1e-12);
    }
    for mean in dataset.model.means() {
        assert_eq!(mean, DVector::zeros(3));
    }
    assert_eq!(dataset.model.mean_budget().total, 0.0);
}

#[test]
fn orthogonal_mixing_is_a_rotation() {
    let config = SsaConfig {
        orthogonal_mixing: true,
        ..SsaConfig::new(2, 3, 2)
    };
    let dataset = generate_seeded(&config);
    let mixing = dataset.mixing();

    let gram = mixing * mixing.transpose();
    assert!((gram - DMatrix::<f64>::identity(5, 5)).amax() < 1e-9);
}

#[test]
fn source_means_exhaust_the_mean_budget() {
    let config = SsaConfig {
        mean_nonstationarity: 0.8,
        seed: 7,
        ..SsaConfig::new(6, 2, 3)
    };
    let dataset = generate_seeded(&config);
    let model = &dataset.model;

    let log_det_sum: f64 = model
        .source_covariances()
        .iter()
        .map(|cov| {
            log_det_spd(&nonstationary_block(cov, 2))
                .expect("non-stationary block should be positive definite")
                .abs()
        })
        .sum();
    let squared_norms: f64 = model.source_means().iter().map(|m| m.norm_squared()).sum();

    assert!((model.mean_budget().log_det_sum - log_det_sum).abs() < 1e-9);
    assert!((squared_norms - 0.8 * log_det_sum).abs() <= 1e-9 * (1.0 + log_det_sum));
    for mean in model.source_means() {
        assert!(mean.rows(0, 2).iter().all(|&value| value == 0.0));
    }
    for (observed, source) in model.means().iter().zip(model.source_means()) {
        assert!((observed - model.mixing() * source).norm() < 1e-12);
    }
}

#[test]
fn empirical_moments_converge_to_targets() {
    let config = SsaConfig {
        samples_per_epoch: vec![40_000],
        mean_nonstationarity: 0.5,
        seed: 2024,
        ..SsaConfig::new(1, 2, 2)
    };
    let dataset = generate_seeded(&config);

    let covariances = dataset.model.covariances();
    let means = dataset.model.means();
    let errors = moment_errors(&dataset.samples[0], &means[0], &covariances[0])
        .expect("moment errors should compute");
    assert!(errors.covariance_error < 0.05, "{errors:?}");
    assert!(errors.mean_error < 0.05, "{errors:?}");
}

#[test]
fn per_epoch_sample_counts_are_respected() {
    let config = SsaConfig {
        samples_per_epoch: vec![3, 10, 25],
        ..SsaConfig::new(3, 1, 1)
    };
    let dataset = generate_seeded(&config);

    let widths: Vec<usize> = dataset.samples.iter().map(|epoch| epoch.ncols()).collect();
    assert_eq!(widths, vec![3, 10, 25]);
    assert_eq!(dataset.diagnostics().total_samples, 38);
}

#[test]
fn invalid_configuration_names_the_offending_field() {
    let err = generate(&SsaConfig::new(0, 2, 2)).expect_err("zero epochs must fail");
    assert_eq!(err.field(), Some("epoch_count"));

    let err = generate(&SsaConfig::new(2, 0, 0)).expect_err("zero dimension must fail");
    assert_eq!(err.field(), Some("nonstationary_dim"));

    let config = SsaConfig {
        correlation_max: 1.0,
        ..SsaConfig::new(2, 1, 1)
    };
    let err = generate(&config).expect_err("unit correlation must fail");
    assert_eq!(err.field(), Some("correlation_max"));
}

#[test]
fn config_json_applies_defaults_and_rejects_unknown_keys() {
    let parsed: SsaConfig = serde_json::from_str(
        r#"{"epoch_count": 3, "stationary_dim": 1, "nonstationary_dim": 2}"#,
    )
    .expect("minimal config should parse");
    assert_eq!(parsed, SsaConfig::new(3, 1, 2));

    let round_trip: SsaConfig =
        serde_json::from_str(&serde_json::to_string(&parsed).expect("config should serialize"))
            .expect("serialized config should parse");
    assert_eq!(round_trip, parsed);

    let err = serde_json::from_str::<SsaConfig>(
        r#"{"epoch_count": 3, "stationary_dim": 1, "nonstationary_dim": 2, "nonstationary_dims": 4}"#,
    )
    .expect_err("unknown key must be rejected");
    assert!(err.to_string().contains("unknown field"));

    let err = serde_json::from_str::<SsaConfig>(r#"{"epoch_count": 3}"#)
        .expect_err("missing dimensions must be rejected");
    assert!(err.to_string().contains("missing field"));
}

#[test]
fn sinks_receive_progress_and_telemetry() {
    let progress = RecordingProgress::default();
    let telemetry = RecordingTelemetry::default();
    let ctx = GenerationContext::new()
        .with_progress_sink(&progress)
        .with_telemetry_sink(&telemetry);

    let config = SsaConfig {
        mean_nonstationarity: 0.3,
        ..SsaConfig::new(3, 2, 2)
    };
    let generator = SsaGenerator::new(&config).expect("config should validate");
    let dataset = generator.generate(&ctx).expect("generation should succeed");

    let fractions = progress
        .fractions
        .lock()
        .expect("progress lock should not be poisoned")
        .clone();
    assert_eq!(fractions.last().copied(), Some(1.0));
    assert!(fractions.windows(2).all(|pair| pair[0] <= pair[1]));

    let scalars = telemetry
        .scalars
        .lock()
        .expect("telemetry lock should not be poisoned")
        .clone();
    let mean_budget = scalars
        .iter()
        .find(|(key, _)| *key == "mean_budget")
        .map(|(_, value)| *value)
        .expect("mean_budget should be recorded");
    assert_eq!(mean_budget, dataset.model.mean_budget().total);
    assert!(scalars.iter().any(|(key, _)| *key == "log_det_sum"));
    assert!(scalars.iter().any(|(key, _)| *key == "max_jitter"));
}

#[test]
fn generation_emits_tracing_events() {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        generate(&SsaConfig::new(2, 1, 1)).expect("generation should succeed");
    });

    let logs = buffer.contents();
    assert!(logs.contains("sampled non-stationarity profile"), "{logs}");
    assert!(logs.contains("ssa dataset generated"), "{logs}");
}

#[test]
fn wide_variance_ratio_band_generates_for_every_seed() {
    for seed in 0..12 {
        let config = SsaConfig {
            samples_per_epoch: vec![20],
            variance_ratio_min: 2.0,
            variance_ratio_max: 1e10,
            mean_nonstationarity: 0.5,
            seed,
            ..SsaConfig::new(10, 2, 6)
        };
        let dataset = generate(&config)
            .unwrap_or_else(|err| panic!("seed {seed} should generate: {err}"));

        let budget = dataset.model.mean_budget();
        assert!(budget.log_det_sum.is_finite() && budget.log_det_sum > 0.0);
        let squared_norms: f64 = dataset
            .model
            .source_means()
            .iter()
            .map(|m| m.norm_squared())
            .sum();
        assert!((squared_norms - budget.total).abs() <= 1e-9 * (1.0 + budget.total));
        for epoch in &dataset.samples {
            assert_eq!(epoch.shape(), (8, 20));
            assert!(epoch.iter().all(|value| value.is_finite()));
        }
    }
}
