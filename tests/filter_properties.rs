//! End-to-end properties of catalog filters run through `FilterRunner`.

use approx::assert_abs_diff_eq;
use classic_filters::ndimage;
use classic_filters::{
    BoundaryMode, CastPolicy, FilterError, FilterRunner, Image, Mask, RawParameters, RunnerConfig,
};
use ndarray::{array, Array2, Array3, Axis};

fn float_runner() -> FilterRunner {
    FilterRunner::default()
}

fn pattern() -> Array2<f64> {
    Array2::from_shape_fn((9, 11), |(y, x)| {
        let v = ((y * 7 + x * 3) % 13) as f64 / 13.0;
        if (y + x) % 5 == 0 { v * 0.5 } else { v }
    })
}

fn run(key: &str, src: &Array2<f64>, raw: RawParameters) -> Array2<f64> {
    let mut image = Image::from_plane(src.clone());
    float_runner()
        .invoke(key, &mut image, None, &raw)
        .into_result()
        .unwrap();
    image.plane(0).to_owned()
}

fn gaussian(src: &Array2<f64>, sigma: f64) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(src.raw_dim());
    ndimage::gaussian_filter(src.view(), sigma, BoundaryMode::Reflect, 4.0, out.view_mut()).unwrap();
    out
}

// ============================================================================
// Identity laws
// ============================================================================

#[test]
fn test_single_pass_filters_identity_at_zero() {
    let src = pattern();
    let cases = [
        ("uniform", "size"),
        ("gaussian", "sigma"),
        ("maximum", "size"),
        ("minimum", "size"),
    ];
    for (key, param) in cases {
        let out = run(key, &src, RawParameters::new().with(param, 0.0));
        assert_eq!(out, src, "{}", key);
    }
    for key in ["median", "percentile"] {
        let out = run(key, &src, RawParameters::new().with("size", 0));
        assert_eq!(out, src, "{}", key);
    }
}

#[test]
fn test_uniform_size_one_on_zero_image() {
    let mut image = Image::from_plane(Array2::<u8>::zeros((3, 3)));
    float_runner()
        .invoke("uniform", &mut image, None, &RawParameters::new().with("size", 1))
        .into_result()
        .unwrap();
    assert!(image.plane(0).iter().all(|&v| v == 0));
}

// ============================================================================
// Composite kernels
// ============================================================================

#[test]
fn test_dog_zero_sigma1_is_source_minus_gaussian() {
    let src = pattern();
    let out = run("dog", &src, RawParameters::new().with("sigma1", 0.0).with("sigma2", 1.7));
    // float storage clamps to the f64 range only
    assert_eq!(out, &src - &gaussian(&src, 1.7));
}

#[test]
fn test_usm_identity_and_unit_weight() {
    let src = pattern();
    let out = run("unsharp_mask", &src, RawParameters::new().with("weight", 0.0));
    assert_eq!(out, src);

    let out = run(
        "unsharp_mask",
        &src,
        RawParameters::new().with("weight", 1.0).with("sigma", 1.2),
    );
    let expected = &src * 2.0 - gaussian(&src, 1.2);
    for (a, b) in out.iter().zip(expected.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_laplace_family_uniform_adds_range_mean() {
    let src = pattern();
    for sigma in [0.0, 0.8, 2.5] {
        let plain = run(
            "gaussian_laplace",
            &src,
            RawParameters::new().with("sigma", sigma),
        );
        let centred = run(
            "gaussian_laplace",
            &src,
            RawParameters::new().with("sigma", sigma).with("uniform", true),
        );
        for (a, b) in plain.iter().zip(centred.iter()) {
            assert_abs_diff_eq!(a + 0.5, *b, epsilon = 1e-12);
        }
    }

    let plain = run("laplace", &src, RawParameters::new());
    let centred = run("laplace", &src, RawParameters::new().with("uniform", true));
    assert_eq!(centred, &plain + 0.5);

    let mut raw = Array2::<f64>::zeros(src.raw_dim());
    ndimage::laplace(src.view(), BoundaryMode::Reflect, raw.view_mut()).unwrap();
    assert_eq!(plain, -raw);
}

#[test]
fn test_laplace_impulse_centre() {
    let mut image = Image::from_plane(array![[0.0f64, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 0.0]]);
    float_runner()
        .invoke("laplace", &mut image, None, &RawParameters::new().with("uniform", false))
        .into_result()
        .unwrap();
    // the library Laplacian at the centre is -40
    assert_eq!(image.plane(0)[[1, 1]], 40.0);
}

#[test]
fn test_gradient_norms() {
    let src = pattern();
    for (key, norm) in [("sobel", 4.0), ("prewitt", 3.0)] {
        let derivative = |axis: usize| {
            let mut out = Array2::<f64>::zeros(src.raw_dim());
            let result = match key {
                "sobel" => ndimage::sobel(src.view(), Axis(axis), BoundaryMode::Reflect, out.view_mut()),
                _ => ndimage::prewitt(src.view(), Axis(axis), BoundaryMode::Reflect, out.view_mut()),
            };
            result.unwrap();
            out
        };
        let g0 = derivative(0);
        let g1 = derivative(1);

        let both = run(key, &src, RawParameters::new().with("axis", "both"));
        let expected = (g0.mapv(f64::abs) + g1.mapv(f64::abs)) / norm;
        for (a, b) in both.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }

        let horizontal = run(key, &src, RawParameters::new().with("axis", "horizontal"));
        assert_eq!(horizontal, g0.mapv(f64::abs));
        let vertical = run(key, &src, RawParameters::new().with("axis", "vertical"));
        assert_eq!(vertical, g1.mapv(f64::abs));
    }
}

// ============================================================================
// Masks, previews and rejection
// ============================================================================

#[test]
fn test_masked_invocation_matches_unmasked_inside() {
    let base: Array2<u8> = Array2::from_shape_fn((8, 8), |(y, x)| ((y * 31 + x * 17) % 256) as u8);
    let mask = Mask::rect(8, 8, 2..6, 1..5);
    let raw = RawParameters::new().with("sigma", 1.0).with("weight", 2.0);

    for key in ["unsharp_mask", "median", "sobel", "dog"] {
        let runner = FilterRunner::default();
        let mut full = Image::from_plane(base.clone());
        let mut masked = Image::from_plane(base.clone());
        runner.invoke(key, &mut full, None, &raw).into_result().unwrap();
        runner.invoke(key, &mut masked, Some(&mask), &raw).into_result().unwrap();

        for ((y, x), &v) in masked.plane(0).indexed_iter() {
            if mask.contains(y, x) {
                assert_eq!(v, full.plane(0)[[y, x]], "{} inside ({}, {})", key, y, x);
            } else {
                assert_eq!(v, base[[y, x]], "{} outside ({}, {})", key, y, x);
            }
        }
    }
}

#[test]
fn test_preview_discard_is_bit_identical() {
    let runner = FilterRunner::default();
    let stack = Array3::from_shape_fn((3, 6, 6), |(z, y, x)| ((z * 11 + y * 5 + x) % 7) as f32 / 7.0);
    let mut image = Image::from_stack(stack);
    let before = image.clone();
    {
        let mut session = runner.preview("laplace_sharp", &mut image, None).unwrap();
        for weight in [0.5, 3.0, 1.0] {
            session.update(&RawParameters::new().with("weight", weight)).unwrap();
        }
        assert_ne!(session.image(), &before);
        session.cancel();
    }
    assert_eq!(image, before);
}

#[test]
fn test_rejections_leave_buffer_untouched() {
    let base = array![[0u8, 50, 100], [150, 200, 250], [25, 75, 125]];
    let strict = FilterRunner::new(RunnerConfig {
        cast: CastPolicy::Reject,
        ..RunnerConfig::default()
    })
    .unwrap();

    let attempts: Vec<(&str, RawParameters, Option<Mask>)> = vec![
        ("prewitt", RawParameters::new().with("axis", "sideways"), None),
        ("gaussian", RawParameters::new(), Some(Mask::rect(2, 3, 0..1, 0..1))),
        ("laplace_sharp", RawParameters::new().with("weight", 5.0), None),
        ("median", RawParameters::new().with("size", "big"), None),
    ];
    for (key, raw, mask) in attempts {
        let mut image = Image::from_plane(base.clone());
        let outcome = strict.invoke(key, &mut image, mask.as_ref(), &raw);
        assert!(!outcome.is_committed(), "{}", key);
        assert_eq!(image.plane(0), base.view(), "{}", key);
    }
}

#[test]
fn test_clamped_parameters_are_reported() {
    let mut image = Image::from_plane(Array2::<u16>::from_elem((4, 4), 1000));
    let applied = FilterRunner::default()
        .invoke("gaussian", &mut image, None, &RawParameters::new().with("sigma", 500.0))
        .into_result()
        .unwrap();
    assert_eq!(applied.params.float("sigma").unwrap(), 30.0);
    assert!(image.plane(0).iter().all(|&v| v == 1000));
}

#[test]
fn test_float_image_range_drives_recentering() {
    let mut image = Image::from_plane(Array2::<f32>::zeros((4, 4))).with_range(-1.0, 3.0);
    FilterRunner::default()
        .invoke("laplace", &mut image, None, &RawParameters::new().with("uniform", true))
        .into_result()
        .unwrap();
    assert!(image.plane(0).iter().all(|&v| v == 1.0));
}

#[test]
fn test_unknown_filter_outcome() {
    let mut image = Image::from_plane(Array2::<u8>::zeros((2, 2)));
    let err = FilterRunner::default()
        .invoke("posterize", &mut image, None, &RawParameters::new())
        .into_result()
        .unwrap_err();
    assert_eq!(err, FilterError::UnknownFilter("posterize".to_string()));
}
