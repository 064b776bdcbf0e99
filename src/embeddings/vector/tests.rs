use super::*;

const TOLERANCE: f32 = 1e-5;
const NORM_TOLERANCE: f64 = 1e-5;

#[test]
fn normalized_vector_has_unit_length() {
    let inputs = [
        vec![3.0, 4.0],
        vec![1.0, 1.0, 1.0, 1.0],
        vec![-2.5, 0.0, 7.25, 0.001],
        vec![1e-3; 1280],
        vec![1e4, -3e3, 42.0],
    ];

    for input in inputs {
        let normalized = normalize(input.clone());
        assert!(!normalized.is_degenerate());
        assert_eq!(normalized.len(), input.len());
        assert!(
            (l2_norm(normalized.as_slice()) - 1.0).abs() < NORM_TOLERANCE,
            "norm of normalized {:?} should be 1",
            input
        );
    }
}

#[test]
fn normalize_preserves_direction() {
    let normalized = normalize(vec![3.0, 4.0]);
    assert!((normalized.as_slice()[0] - 0.6).abs() < TOLERANCE);
    assert!((normalized.as_slice()[1] - 0.8).abs() < TOLERANCE);
}

#[test]
fn zero_vector_passes_through_as_degenerate() {
    let normalized = normalize(vec![0.0; 8]);
    assert!(normalized.is_degenerate());
    assert_eq!(normalized.as_slice(), &[0.0; 8]);
    assert!(normalized.as_slice().iter().all(|v| v.is_finite()));
}

#[test]
fn empty_vector_is_degenerate() {
    let normalized = normalize(Vec::new());
    assert!(normalized.is_degenerate());
    assert!(normalized.is_empty());
}

#[test]
fn non_finite_input_is_degenerate() {
    let normalized = normalize(vec![f32::NAN, 1.0]);
    assert!(normalized.is_degenerate());

    let normalized = normalize(vec![f32::INFINITY, 1.0]);
    assert!(normalized.is_degenerate());
}

#[test]
fn dot_product() {
    assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < NORM_TOLERANCE);
    assert_eq!(dot(&[], &[]), 0.0);
}

#[test]
fn tiny_vectors_still_normalize() {
    let normalized = normalize(vec![1e-30, 1e-30]);

    assert!(!normalized.is_degenerate());
    assert!((l2_norm(normalized.as_slice()) - 1.0).abs() < NORM_TOLERANCE);
    assert!((normalized.as_slice()[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < TOLERANCE);
}

#[test]
fn huge_vectors_still_normalize() {
    let normalized = normalize(vec![1e20, -1e20, 0.0]);

    assert!(!normalized.is_degenerate());
    assert!((l2_norm(normalized.as_slice()) - 1.0).abs() < NORM_TOLERANCE);
    assert!((normalized.as_slice()[1] + std::f32::consts::FRAC_1_SQRT_2).abs() < TOLERANCE);
}

#[test]
fn norm_and_dot_do_not_underflow_or_overflow() {
    assert!(l2_norm(&[1e-30, 1e-30]) > 0.0);
    assert!(l2_norm(&[1e20, 1e20]).is_finite());
    assert!(dot(&[1e20, 1e20], &[1e20, 1e20]).is_finite());
    assert!(dot(&[1e-30], &[1e-30]) > 0.0);
}
