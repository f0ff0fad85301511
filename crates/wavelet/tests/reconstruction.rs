use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use trous_wavelet::{
    Band, Diagnostic, Engine, FilterPair, Image, TransformConfig, WaveletError, WaveletFilter,
    decompose, reconstruct, reconstruct_to_configured,
};

fn noisy_image(shape: (usize, usize), seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let data = Array2::from_shape_fn(shape, |(i, j)| {
        10.0 * ((i as f64) / 5.0).sin() * ((j as f64) / 7.0).cos() + normal.sample(&mut rng)
    });
    Image::new(data).unwrap()
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).fold(0.0, |m, (x, y)| m.max((x - y).abs()))
}

#[test]
fn perfect_reconstruction_all_presets_both_engines() {
    let img = noisy_image((64, 48), 7);
    for filter in WaveletFilter::ALL {
        for engine in [Engine::Spatial, Engine::Frequency] {
            let config = TransformConfig::new().with_wavelet(filter).with_engine(engine);
            let pyramid = decompose(&img, &config).unwrap();
            assert!(pyramid.n_levels() >= 2, "{filter:?}");
            let back = reconstruct(&pyramid, None).unwrap();
            let err = max_abs_diff(&back, img.as_array());
            assert!(err < 1e-5, "{filter:?} {engine:?}: {err}");
        }
    }
}

#[test]
fn haar_reconstruction_is_exact() {
    let img = noisy_image((32, 32), 11);
    let pyramid = decompose(&img, &TransformConfig::new()).unwrap();
    let back = reconstruct(&pyramid, Some(0)).unwrap();
    assert!(max_abs_diff(&back, img.as_array()) < 1e-12);
}

#[test]
fn impulse_scenario_64x64_six_levels() {
    let img = Image::impulse((64, 64)).unwrap();
    let config = TransformConfig::new().with_levels(6);
    let pyramid = decompose(&img, &config).unwrap();
    assert_eq!(pyramid.n_levels(), 6);
    let back = reconstruct(&pyramid, None).unwrap();
    assert!((back[[0, 0]] - 1.0).abs() < 1e-10);
    for ((i, j), v) in back.indexed_iter() {
        if (i, j) != (0, 0) {
            assert!(v.abs() <= 1e-10, "({i}, {j}) = {v}");
        }
    }
}

#[test]
fn every_subband_has_image_shape() {
    let img = noisy_image((40, 24), 3);
    for filter in [WaveletFilter::Haar, WaveletFilter::Db2] {
        let pyramid = decompose(&img, &TransformConfig::new().with_wavelet(filter)).unwrap();
        for level in pyramid.levels() {
            for band in [Band::Approximation, Band::Horizontal, Band::Vertical, Band::Diagonal] {
                assert_eq!(level.band(band).dim(), (40, 24));
            }
        }
        assert_eq!(pyramid.coarse().dim(), (40, 24));
    }
}

#[test]
fn levels_are_auto_capped() {
    let img = noisy_image((16, 16), 5);
    let pyramid = decompose(&img, &TransformConfig::new().with_levels(10)).unwrap();
    assert_eq!(pyramid.n_levels(), 4);
    assert!(matches!(
        pyramid.diagnostics(),
        [Diagnostic::LevelsCapped {
            requested: 10,
            used: 4,
            ..
        }]
    ));
    let back = reconstruct(&pyramid, None).unwrap();
    assert!(max_abs_diff(&back, img.as_array()) < 1e-12);
}

#[test]
fn default_levels_use_maximum() {
    let img = noisy_image((16, 16), 5);
    let pyramid = decompose(&img, &TransformConfig::new()).unwrap();
    assert_eq!(pyramid.n_levels(), 4);
    assert!(pyramid.diagnostics().is_empty());
}

#[test]
fn partial_reconstruction_returns_intermediate_approximation() {
    let img = noisy_image((32, 32), 9);
    let config = TransformConfig::new().with_wavelet(WaveletFilter::Db2).with_levels(3);
    let pyramid = decompose(&img, &config).unwrap();
    for r in 1..=3 {
        let partial = reconstruct(&pyramid, Some(r)).unwrap();
        let expected = pyramid.level(r - 1).unwrap().approximation();
        assert!(max_abs_diff(&partial, expected) < 1e-9, "r={r}");
    }
    let configured =
        reconstruct_to_configured(&pyramid, &config.clone().with_reconstruction_level(2)).unwrap();
    assert!(max_abs_diff(&configured, pyramid.level(1).unwrap().approximation()) < 1e-9);
}

#[test]
fn reconstruction_level_beyond_depth_is_error() {
    let img = noisy_image((16, 16), 1);
    let pyramid = decompose(&img, &TransformConfig::new().with_levels(2)).unwrap();
    let err = reconstruct(&pyramid, Some(3)).unwrap_err();
    assert_eq!(
        err,
        WaveletError::ReconstructionLevel {
            requested: 3,
            levels: 2
        }
    );
}

#[test]
fn components_sum_to_image() {
    let img = noisy_image((32, 24), 21);
    let config = TransformConfig::new().with_wavelet(WaveletFilter::Coif1).with_levels(2);
    let pyramid = decompose(&img, &config).unwrap();
    let mut total = pyramid.coarse_component().unwrap();
    for k in 0..pyramid.n_levels() {
        total += &pyramid.component(k).unwrap();
    }
    assert!(max_abs_diff(&total, img.as_array()) < 1e-9);
    assert!(pyramid.component(2).is_err());
}

#[test]
fn explicit_taps_reconstruct() {
    let h = WaveletFilter::Db2.scaling_coeffs();
    let pair = FilterPair::orthogonal(h).unwrap();
    let img = noisy_image((32, 32), 4);
    let pyramid = decompose(&img, &TransformConfig::new().with_wavelet(pair)).unwrap();
    let back = reconstruct(&pyramid, None).unwrap();
    assert!(max_abs_diff(&back, img.as_array()) < 1e-9);
}

#[test]
fn image_too_small_for_any_level() {
    let img = Image::new(Array2::from_elem((1, 5), 2.0)).unwrap();
    let pyramid = decompose(&img, &TransformConfig::new()).unwrap();
    assert_eq!(pyramid.n_levels(), 0);
    assert_eq!(reconstruct(&pyramid, None).unwrap(), *img.as_array());
}

#[test]
fn detail_energy_reported_per_level() {
    let img = noisy_image((32, 32), 8);
    let pyramid = decompose(&img, &TransformConfig::new().with_levels(3)).unwrap();
    let energy = pyramid.detail_energy();
    assert_eq!(energy.len(), 3);
    assert!(energy.iter().all(|&e| e > 0.0));
}
