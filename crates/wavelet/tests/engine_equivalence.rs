use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use trous_wavelet::{
    Band, Decomposer, Engine, FilterBank, Image, TransformConfig, WaveletFilter, decompose,
    synthesize,
};

fn random_image(shape: (usize, usize), seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(5.0, 2.0).unwrap();
    Image::new(Array2::from_shape_fn(shape, |_| normal.sample(&mut rng))).unwrap()
}

#[test]
fn spatial_and_frequency_subbands_agree() {
    let img = random_image((48, 40), 17);
    for filter in WaveletFilter::ALL {
        let base = TransformConfig::new().with_wavelet(filter);
        let spatial = decompose(&img, &base.clone().with_engine(Engine::Spatial)).unwrap();
        let freq = decompose(&img, &base.with_engine(Engine::Frequency)).unwrap();
        assert_eq!(spatial.n_levels(), freq.n_levels());
        for (ls, lf) in spatial.levels().iter().zip(freq.levels()) {
            for band in [Band::Approximation, Band::Horizontal, Band::Vertical, Band::Diagonal] {
                for (a, b) in ls.band(band).iter().zip(lf.band(band).iter()) {
                    assert!((a - b).abs() <= 1e-5, "{filter:?} level {} {band:?}", ls.index());
                }
            }
        }
        assert!(freq.diagnostics().is_empty(), "{filter:?}: {:?}", freq.diagnostics());
    }
}

#[test]
fn non_square_and_odd_shapes_agree() {
    let img = random_image((21, 34), 2);
    let base = TransformConfig::new().with_wavelet(WaveletFilter::Db2);
    let spatial = decompose(&img, &base.clone()).unwrap();
    let freq = decompose(&img, &base.with_engine(Engine::Frequency)).unwrap();
    for (ls, lf) in spatial.levels().iter().zip(freq.levels()) {
        for (a, b) in ls.diagonal().iter().zip(lf.diagonal().iter()) {
            assert!((a - b).abs() <= 1e-8);
        }
    }
}

#[test]
fn cross_engine_synthesis() {
    // Decompose spatially, reconstruct in the Fourier domain.
    let img = random_image((32, 32), 5);
    let config = TransformConfig::new().with_wavelet(WaveletFilter::Sym4);
    let pyramid = decompose(&img, &config).unwrap();
    let details = pyramid.details();
    let bank = FilterBank::new(WaveletFilter::Sym4.into());
    let (back, diagnostics) = synthesize(
        Engine::Frequency,
        &bank,
        pyramid.shape(),
        Some(pyramid.coarse().view()),
        &details,
        0,
    )
    .unwrap();
    assert!(diagnostics.is_empty());
    for (a, b) in back.iter().zip(img.as_array().iter()) {
        assert!((a - b).abs() <= 1e-8);
    }
}

#[test]
fn stepwise_decomposition_matches_batch() {
    let img = random_image((32, 32), 12);
    let config = TransformConfig::new().with_wavelet(WaveletFilter::Db3).with_levels(2);
    let batch = decompose(&img, &config).unwrap();
    let mut run = Decomposer::new(&img, &config);
    let mut seen = Vec::new();
    while let Some(level) = run.step() {
        seen.push(level.index());
    }
    assert_eq!(seen, vec![0, 1]);
    let stepped = run.finish();
    assert_eq!(stepped.levels(), batch.levels());
}

#[test]
fn reconstruction_diagnostics_are_returned() {
    let img = random_image((24, 24), 21);
    let config = TransformConfig::new()
        .with_wavelet(WaveletFilter::Coif1)
        .with_levels(2)
        .with_engine(Engine::Frequency);
    let pyramid = decompose(&img, &config).unwrap();

    let (full, diagnostics) = pyramid.reconstruct_with_diagnostics(None).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(full, pyramid.reconstruct(None).unwrap());

    let (coarse, diagnostics) = pyramid.coarse_component_with_diagnostics().unwrap();
    assert!(diagnostics.is_empty());
    let mut sum = coarse;
    for level in 0..pyramid.n_levels() {
        let (component, diagnostics) = pyramid.component_with_diagnostics(level).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(component, pyramid.component(level).unwrap());
        sum += &component;
    }
    for (a, b) in sum.iter().zip(full.iter()) {
        assert!((a - b).abs() <= 1e-10);
    }

    assert!(pyramid.reconstruct_with_diagnostics(Some(3)).is_err());
    assert!(pyramid.component_with_diagnostics(2).is_err());
}
