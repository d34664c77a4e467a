//! Cosine similarity and embedding blob (de)serialisation.
//!
//! Blobs are the raw little-endian float32 byte sequence. The store and
//! reader must agree on endianness; this module fixes little-endian as
//! the portable choice.

/// Cosine similarity between two vectors.
///
/// Returns `0.0` when either vector is `None`, the lengths mismatch, or
/// either norm is zero. Never panics.
#[must_use]
pub fn cosine(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Serialise a vector to its little-endian float32 byte representation.
#[must_use]
pub fn serialize(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(v.len() * 4);
    for x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

/// Deserialise a little-endian float32 blob into a vector of the
/// configured dimension.
///
/// Returns `None` if `blob.len() != dimension * 4`: a mismatched blob is
/// treated as a missing embedding, never a partial or panicking read.
#[must_use]
pub fn deserialize(blob: &[u8], dimension: usize) -> Option<Vec<f32>> {
    if blob.len() != dimension * 4 {
        return None;
    }
    let mut out = Vec::with_capacity(dimension);
    for chunk in blob.chunks_exact(4) {
        let bytes: [u8; 4] = chunk.try_into().ok()?;
        out.push(f32::from_le_bytes(bytes));
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_none_is_zero() {
        assert_eq!(cosine(None, Some(&[1.0])), 0.0);
        assert_eq!(cosine(Some(&[1.0]), None), 0.0);
    }

    #[test]
    fn cosine_length_mismatch_is_zero() {
        assert_eq!(cosine(Some(&[1.0, 0.0]), Some(&[1.0])), 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(cosine(Some(&[0.0, 0.0]), Some(&[1.0, 1.0])), 0.0);
    }

    #[test]
    fn cosine_self_is_one() {
        let v = [0.3, 0.4, 0.5];
        let c = cosine(Some(&v), Some(&v));
        assert!((c - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = [1.0, 2.0, -1.0];
        let b = [0.5, -0.5, 2.0];
        assert!((cosine(Some(&a), Some(&b)) - cosine(Some(&b), Some(&a))).abs() < 1e-6);
    }

    #[test]
    fn serialize_deserialize_round_trips() {
        let v = vec![1.0f32, -2.5, 0.0, f32::MIN_POSITIVE, 3.14159];
        let blob = serialize(&v);
        let back = deserialize(&blob, v.len()).expect("dimension matches");
        assert_eq!(v, back);
    }

    #[test]
    fn deserialize_rejects_wrong_length() {
        let blob = serialize(&[1.0, 2.0, 3.0]);
        assert!(deserialize(&blob, 4).is_none());
        assert!(deserialize(&blob, 2).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_vec(len: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1000.0f32..1000.0f32, len)
    }

    proptest! {
        #[test]
        fn cosine_is_bounded_and_never_panics(a in finite_vec(8), b in finite_vec(8)) {
            let c = cosine(Some(&a), Some(&b));
            prop_assert!(c.is_finite());
            prop_assert!((-1.000_1..=1.000_1).contains(&c));
        }

        #[test]
        fn cosine_is_symmetric_for_any_pair(a in finite_vec(5), b in finite_vec(5)) {
            let ab = cosine(Some(&a), Some(&b));
            let ba = cosine(Some(&b), Some(&a));
            prop_assert!((ab - ba).abs() < 1e-4);
        }

        #[test]
        fn serialize_deserialize_round_trips_for_any_vector(v in finite_vec(16)) {
            let blob = serialize(&v);
            let back = deserialize(&blob, v.len());
            prop_assert_eq!(Some(v), back);
        }
    }
}
