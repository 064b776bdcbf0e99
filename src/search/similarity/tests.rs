use super::*;
use crate::embeddings::vector::normalize;

const TOLERANCE: f32 = 1e-5;

#[test]
fn self_similarity_is_one() {
    let vector = normalize(vec![0.2, -1.5, 3.0, 0.0, 7.1]);
    let score = cosine_similarity(vector.as_slice(), vector.as_slice())
        .expect("equal-length vectors should score");
    assert!((score - 1.0).abs() < TOLERANCE);
}

#[test]
fn similarity_is_symmetric() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [4.0, -3.0, 2.0, 1.0];

    let ab = cosine_similarity(&a, &b).expect("should score");
    let ba = cosine_similarity(&b, &a).expect("should score");
    assert!((ab - ba).abs() < f32::EPSILON);
}

#[test]
fn raw_vectors_score_like_normalized_ones() {
    let a = vec![10.0, 0.0, 5.0];
    let b = vec![2.0, 1.0, 0.0];

    let raw = cosine_similarity(&a, &b).expect("should score");
    let unit = cosine_similarity(normalize(a).as_slice(), normalize(b).as_slice())
        .expect("should score");
    assert!((raw - unit).abs() < TOLERANCE);
}

#[test]
fn orthogonal_and_opposite_vectors() {
    let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("should score");
    assert!(orthogonal.abs() < TOLERANCE);

    let opposite = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).expect("should score");
    assert!((opposite + 1.0).abs() < TOLERANCE);
}

#[test]
fn mismatched_lengths_are_rejected() {
    let result = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
    assert_eq!(
        result,
        Err(SimilarityError::LengthMismatch { left: 3, right: 2 })
    );
}

#[test]
fn zero_vectors_are_not_matchable() {
    assert_eq!(
        cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]),
        Err(SimilarityError::DegenerateVector)
    );
    assert_eq!(
        cosine_similarity(&[], &[]),
        Err(SimilarityError::DegenerateVector)
    );
}

#[test]
fn local_cosine_provider_delegates() {
    let provider = LocalCosine;
    assert_eq!(provider.name(), "local-cosine");
    let score = provider
        .score(&[1.0, 1.0], &[1.0, 1.0])
        .expect("should score");
    assert!((score - 1.0).abs() < TOLERANCE);
}

#[test]
fn extreme_magnitudes_still_score() {
    let tiny = cosine_similarity(&[1e-30, 1e-30], &[1e-30, 1e-30]).expect("tiny vectors should score");
    assert!((tiny - 1.0).abs() < TOLERANCE);

    let huge = cosine_similarity(&[1e20, 1e20], &[1e20, 1e20]).expect("huge vectors should score");
    assert!((huge - 1.0).abs() < TOLERANCE);

    let mixed = cosine_similarity(&[1e20, 0.0], &[0.0, 1e-30]).expect("mixed vectors should score");
    assert!(mixed.abs() < TOLERANCE);
}
