//! Integration tests through the umbrella crate

use connected_mixtures::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

/// Hourly-like signal: a slow daily cycle plus two operating levels
fn synthetic_load(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.5).unwrap();
    (0..len)
        .map(|i| {
            let level = if (i / 12) % 2 == 0 { 20.0 } else { 35.0 };
            let daily = 2.0 * (i as f64 * std::f64::consts::TAU / 24.0).sin();
            level + daily + noise.sample(&mut rng)
        })
        .collect()
}

#[test]
fn test_scaled_default_pipeline() {
    let raw = Series::from_column(&synthetic_load(24 * 30, 42)).unwrap();
    let mut scaler = MinMaxScaler::new();
    let scaled = scaler.fit_transform(&raw).unwrap();

    // Default configuration; slow EM convergence is tolerated with a warning
    let model = ConnectedMixtureComponents::default()
        .with_estimator(DiagonalGmm::new().with_require_convergence(false));
    let fit = model.fit_transform(&scaled).unwrap();

    // (720 - 168) / 24 = 23 windows
    assert_eq!(fit.n_windows(), 23);
    assert_eq!(fit.features().shape(), (22, 1));
    assert!(fit.summaries().iter().all(|s| s.n_components() == 4));

    let stats = fit.component_stats().unwrap();
    assert_eq!(stats.len(), 22);
    assert_eq!(stats.time_index, (1..=22).collect::<Vec<_>>());
    assert_eq!(stats.num_connections, fit.features().to_vec());
    assert!(stats.num_connections.iter().all(|&c| c <= 16));
}

#[test]
fn test_stats_serialize_for_plotting() {
    let raw = Series::from_column(&synthetic_load(24 * 12, 1)).unwrap();
    let scaled = MinMaxScaler::new().fit_transform(&raw).unwrap();

    let config = CmcConfig::builder()
        .n_components(2)
        .window_size(48)
        .step_size(24)
        .epsilon(0.2)
        .build()
        .unwrap();
    let fit = ConnectedMixtureComponents::new(config)
        .unwrap()
        .fit_transform(&scaled)
        .unwrap();
    let stats = fit.component_stats().unwrap();

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["time_index"].as_array().unwrap().len(), fit.n_transitions());
    assert_eq!(json["num_connections"].as_array().unwrap().len(), fit.n_transitions());
}

#[test]
fn test_error_surfaces_through_umbrella() {
    let series = Series::from_column(&[0.0; 168]).unwrap();
    let err = ConnectedMixtureComponents::default()
        .fit_transform(&series)
        .unwrap_err();
    assert!(matches!(err, Error::InsufficientData { expected: 2, actual: 0 }));
    assert_eq!(err.to_string(), "Insufficient data: expected at least 2, got 0");
}

#[test]
fn test_manual_stages_match_pipeline() {
    let raw = Series::from_column(&synthetic_load(24 * 10, 9)).unwrap();
    let scaled = MinMaxScaler::new().fit_transform(&raw).unwrap();
    let config = CmcConfig::builder()
        .n_components(2)
        .window_size(48)
        .step_size(24)
        .epsilon(0.3)
        .build()
        .unwrap();
    let fit = ConnectedMixtureComponents::new(config.clone())
        .unwrap()
        .fit_transform(&scaled)
        .unwrap();

    let slicer = WindowSlicer::new(config.window_size, config.step_size).unwrap();
    let gmm = DiagonalGmm::new();
    let summaries: Vec<MixtureSummary> = slicer
        .slice(&scaled)
        .map(|w| gmm.fit(&w, config.n_components, config.random_state).unwrap())
        .collect();
    let records = ComponentLinker::new(config.epsilon).unwrap().link(&summaries).unwrap();
    let features = FeatureAggregator::new().aggregate(&records);

    assert_eq!(summaries.as_slice(), fit.summaries());
    assert_eq!(&features, fit.features());
}
