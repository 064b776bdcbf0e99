#[cfg(test)]
mod tests;

/// A raw embedding as produced by the feature model.
pub type FeatureVector = Vec<f32>;

/// An embedding scaled to unit Euclidean length.
///
/// Only [`normalize`] constructs this type. A vector whose norm is zero (or
/// not finite) cannot be scaled; it is kept unchanged and flagged as
/// degenerate, and degenerate vectors never take part in ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedVector {
    values: Vec<f32>,
    degenerate: bool,
}

impl NormalizedVector {
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the source vector had no direction (zero, empty or non-finite norm)
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

impl AsRef<[f32]> for NormalizedVector {
    #[inline]
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

/// Euclidean (L2) norm of a vector.
///
/// Squares are accumulated in `f64`, which holds the square of any finite
/// `f32`, so tiny vectors do not collapse to zero and large ones do not
/// overflow.
#[inline]
pub fn l2_norm(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt()
}

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}

/// Scale `values` to unit length.
///
/// Zero-norm policy: the input is returned as-is and marked degenerate rather
/// than divided by zero.
#[inline]
pub fn normalize(mut values: FeatureVector) -> NormalizedVector {
    let norm = l2_norm(&values);

    if norm > 0.0 && norm.is_finite() {
        for value in &mut values {
            *value = (f64::from(*value) / norm) as f32;
        }
        NormalizedVector {
            values,
            degenerate: false,
        }
    } else {
        NormalizedVector {
            values,
            degenerate: true,
        }
    }
}
