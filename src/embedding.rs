/// Number of components in a field fingerprint.
pub const FINGERPRINT_DIMENSION: usize = 8;

/// Character-sum fingerprint used for the field index.
///
/// The code points of `text` are summed; component `i` is byte `(sum >> 4*i) & 0xFF`
/// scaled into `[0, 1]` in double precision, then narrowed. Vectors already stored
/// depend on this exact arithmetic.
pub fn embed_text(text: &str) -> Vec<f32> {
    if text.is_empty() {
        return vec![0.0; FINGERPRINT_DIMENSION];
    }
    let total: u64 = text.chars().map(|ch| u64::from(u32::from(ch))).sum();
    (0..FINGERPRINT_DIMENSION)
        .map(|i| (((total >> (i * 4)) & 0xFF) as f64 / 255.0) as f32)
        .collect()
}

/// Text fingerprinted for one field: operation id, field name, description.
pub fn field_text(operation_id: &str, field: &str, description: &str) -> String {
    format!("{operation_id} {field} {description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_all_zero() {
        assert_eq!(embed_text(""), vec![0.0; 8]);
    }

    #[test]
    fn fingerprint_is_deterministic_and_bounded() {
        let a = embed_text("get_items response_name item name");
        assert_eq!(a, embed_text("get_items response_name item name"));
        assert_eq!(a.len(), FINGERPRINT_DIMENSION);
        assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn fingerprint_matches_reference_arithmetic() {
        // "ab" sums to 97 + 98 = 195 = 0xC3.
        let v = embed_text("ab");
        assert_eq!(v[0], (195.0_f64 / 255.0) as f32);
        assert_eq!(v[1], (12.0_f64 / 255.0) as f32);
        assert!(v[2..].iter().all(|c| *c == 0.0));
    }

    #[test]
    fn field_text_is_space_joined_in_order() {
        assert_eq!(field_text("op", "f", ""), "op f ");
        assert_ne!(embed_text(&field_text("a", "b", "c")), embed_text(""));
    }
}
