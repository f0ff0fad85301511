use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Poisson};
use trous_purelet::{DenoiseConfig, DenoiseError, LevelMode, denoise};
use trous_wavelet::{
    Engine, Image, TransformConfig, WaveletError, WaveletFilter, decompose, reconstruct,
};

fn clean(shape: (usize, usize)) -> Array2<f64> {
    Array2::from_shape_fn(shape, |(i, j)| {
        let block = if (10..40).contains(&i) && (8..28).contains(&j) { 5.0 } else { 0.0 };
        10.0 + 8.0 * ((j as f64) / 5.0).sin() * ((i as f64) / 7.0).cos() + block
    })
}

fn gaussian(truth: &Array2<f64>, sigma: f64, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).unwrap();
    truth.mapv(|v| v + normal.sample(&mut rng))
}

fn mse(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    let a: Vec<f64> = a.iter().copied().collect();
    let b: Vec<f64> = b.iter().copied().collect();
    trous_stats::mse(&a, &b)
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).fold(0.0, |m, (x, y)| m.max((x - y).abs()))
}

#[test]
fn zero_noise_equals_reconstruction() {
    let img = Image::new(gaussian(&clean((48, 48)), 1.0, 1)).unwrap();
    for filter in [WaveletFilter::Haar, WaveletFilter::Db2, WaveletFilter::Sym4] {
        for engine in [Engine::Spatial, Engine::Frequency] {
            let transform = TransformConfig::new()
                .with_wavelet(filter)
                .with_levels(3)
                .with_engine(engine);
            let expected = reconstruct(&decompose(&img, &transform).unwrap(), None).unwrap();
            let config = DenoiseConfig::new(transform).with_noise_variance(0.0);
            let result = denoise(&img, &config).unwrap();
            let err = max_abs_diff(result.image(), &expected);
            assert!(err < 1e-8, "{filter:?} {engine:?}: {err}");
            assert!(result.weights().iter().all(|w| w.mode == LevelMode::Identity));
        }
    }
}

#[test]
fn gaussian_noise_mse_drops() {
    let truth = clean((64, 64));
    let noisy = gaussian(&truth, 1.0, 5);
    let img = Image::new(noisy.clone()).unwrap();
    for filter in [WaveletFilter::Haar, WaveletFilter::Db2] {
        let config = DenoiseConfig::new(TransformConfig::new().with_wavelet(filter).with_levels(3))
            .with_noise_variance(1.0);
        let result = denoise(&img, &config).unwrap();
        let before = mse(&noisy, &truth);
        let after = mse(result.image(), &truth);
        assert!(after < 0.5 * before, "{filter:?}: {after} vs {before}");
        assert_eq!(result.noise_variance(), 1.0);
    }
}

#[test]
fn estimated_noise_variance_is_used() {
    let truth = clean((64, 64));
    let noisy = gaussian(&truth, 2.0, 9);
    let img = Image::new(noisy.clone()).unwrap();
    let config = DenoiseConfig::new(TransformConfig::new().with_levels(3));
    let result = denoise(&img, &config).unwrap();
    let var = result.noise_variance();
    assert!((var - 4.0).abs() < 1.2, "{var}");
    assert!(mse(result.image(), &truth) < mse(&noisy, &truth));
}

#[test]
fn poisson_gaussian_mse_drops() {
    let truth = clean((64, 64)).mapv(|v| 2.0 * v);
    let gain = 1.0;
    let mut rng = StdRng::seed_from_u64(17);
    let read_noise = Normal::new(0.0, 0.5).unwrap();
    let noisy = truth.mapv(|v| {
        let counts: f64 = Poisson::new(v / gain).unwrap().sample(&mut rng);
        gain * counts + read_noise.sample(&mut rng)
    });
    let img = Image::new(noisy.clone()).unwrap();
    let transform = TransformConfig::new().with_wavelet(WaveletFilter::Haar).with_levels(3);
    let config = DenoiseConfig::new(transform)
        .with_noise_variance(0.25)
        .with_poisson_gain(gain);
    let result = denoise(&img, &config).unwrap();
    let before = mse(&noisy, &truth);
    let after = mse(result.image(), &truth);
    assert!(after < 0.5 * before, "{after} vs {before}");
}

#[test]
fn cutoff_suppresses_fine_levels() {
    let img = Image::new(gaussian(&clean((32, 32)), 1.0, 2)).unwrap();
    let transform = TransformConfig::new().with_levels(3);
    let config = DenoiseConfig::new(transform.clone())
        .with_noise_variance(0.0)
        .with_threshold_cutoff(1);
    let result = denoise(&img, &config).unwrap();
    let modes: Vec<LevelMode> = result.weights().iter().map(|w| w.mode).collect();
    assert_eq!(modes, [LevelMode::Suppressed, LevelMode::Identity, LevelMode::Identity]);

    let pyramid = decompose(&img, &transform).unwrap();
    let expected = pyramid.reconstruct(Some(0)).unwrap() - pyramid.component(0).unwrap();
    assert!(max_abs_diff(result.image(), &expected) < 1e-10);
}

#[test]
fn identity_only_reproduces_input() {
    let noisy = gaussian(&clean((32, 32)), 1.0, 4);
    let img = Image::new(noisy.clone()).unwrap();
    let config = DenoiseConfig::new(TransformConfig::new().with_wavelet(WaveletFilter::Db2))
        .with_noise_variance(1.0)
        .with_identity_only(true);
    let result = denoise(&img, &config).unwrap();
    assert!(max_abs_diff(result.image(), &noisy) < 1e-5);
}

#[test]
fn capped_levels_are_reported() {
    let img = Image::new(gaussian(&clean((16, 16)), 1.0, 8)).unwrap();
    let config = DenoiseConfig::new(TransformConfig::new().with_levels(9)).with_noise_variance(1.0);
    let result = denoise(&img, &config).unwrap();
    assert_eq!(result.weights().len(), 4);
    assert!(
        result
            .diagnostics()
            .iter()
            .any(|d| d.to_string().contains("requested 9 levels, used 4"))
    );
}

#[test]
fn invalid_inputs_are_fatal() {
    let img = Image::new(clean((8, 8))).unwrap();
    let err = denoise(&img, &DenoiseConfig::default().with_noise_variance(f64::NAN)).unwrap_err();
    assert!(matches!(err, DenoiseError::InvalidNoiseVariance(_)));

    let config = DenoiseConfig::new(TransformConfig::new().with_levels(0));
    let err = denoise(&img, &config).unwrap_err();
    assert!(matches!(err, DenoiseError::Wavelet(WaveletError::InvalidConfig(_))));
}
