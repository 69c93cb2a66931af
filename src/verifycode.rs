//! Verify codes: short, human-enterable, globally unique opaque strings
//! used for anonymous certificate lookup.

use rand::Rng;

/// 32-symbol alphabet with visually ambiguous characters removed
/// (no 0/O, no 1/I).
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const CODE_LEN: usize = 8;

/// Generate an 8-character code formatted as two 4-character groups,
/// e.g. `ABCD-EFGH`. The generator is not collision-free; the caller
/// must check the unique index at persistence time and retry.
pub fn generate_verify_code() -> String {
    let mut rng = rand::thread_rng();
    let raw: String = (0..CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", &raw[..4], &raw[4..])
}

/// Build the public verification URL embedded in QR payloads.
pub fn build_verify_url(public_base_url: &str, code: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    format!("{base}/verify?code={}", urlencode(code))
}

/// Mask a patient identifier for anonymous exposure: every character
/// except the last three becomes `*`, length preserved.
pub fn mask_patient_id(patient_id: &str) -> String {
    let chars: Vec<char> = patient_id.chars().collect();
    let visible_from = chars.len().saturating_sub(3);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible_from { '*' } else { *c })
        .collect()
}

// Codes only contain unreserved characters plus '-', but encode
// defensively so the URL stays well-formed for any input.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_grouped_format() {
        let code = generate_verify_code();
        assert_eq!(code.len(), 9);
        assert_eq!(code.as_bytes()[4], b'-');
        for (i, c) in code.bytes().enumerate() {
            if i != 4 {
                assert!(ALPHABET.contains(&c), "unexpected symbol {}", c as char);
            }
        }
    }

    #[test]
    fn code_avoids_ambiguous_symbols() {
        for _ in 0..200 {
            let code = generate_verify_code();
            for bad in ['0', 'O', '1', 'I'] {
                assert!(!code.contains(bad));
            }
        }
    }

    #[test]
    fn codes_are_not_trivially_repeating() {
        let a = generate_verify_code();
        let b = generate_verify_code();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_url_strips_trailing_slashes() {
        assert_eq!(
            build_verify_url("https://med.example.org//", "ABCD-EFGH"),
            "https://med.example.org/verify?code=ABCD-EFGH"
        );
    }

    #[test]
    fn verify_url_encodes_reserved_characters() {
        assert_eq!(
            build_verify_url("http://localhost:4000", "A B&C"),
            "http://localhost:4000/verify?code=A%20B%26C"
        );
    }

    #[test]
    fn masking_keeps_last_three_characters() {
        assert_eq!(mask_patient_id("P-25AB12CD"), "*******2CD");
        assert_eq!(mask_patient_id("ABC"), "ABC");
        assert_eq!(mask_patient_id("AB"), "AB");
        assert_eq!(mask_patient_id(""), "");
    }
}
