use encoding_rs::{Encoding, BIG5, EUC_KR, GB18030, GBK, SHIFT_JIS};

/// Legacy code pages tried, in the order spec §4.1 lists them: GBK (936),
/// GB18030 (54936), Shift-JIS (932), EUC-KR (949), Big5 (950).
const CANDIDATES: &[&Encoding] = &[GBK, GB18030, SHIFT_JIS, EUC_KR, BIG5];

/// Reverses an encoding misinterpretation: for each legacy code page, encode
/// `input` under that page, decode the resulting bytes as UTF-8, and ask
/// `validator` whether the result looks right. The first candidate the
/// validator accepts wins; if none does, `input` is returned unchanged.
pub fn repair_mojibake(input: &str, validator: impl Fn(&str) -> bool) -> String {
    for encoding in CANDIDATES {
        let (bytes, _, had_unmappable) = encoding.encode(input);
        if had_unmappable {
            continue;
        }
        let Ok(candidate) = std::str::from_utf8(&bytes) else {
            continue;
        };
        if validator(candidate) {
            return candidate.to_string();
        }
    }
    input.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_when_validator_rejects_everything() {
        let input = "Quote for PO-123";
        let repaired = repair_mojibake(input, |_| false);
        assert_eq!(repaired, input);
    }

    #[test]
    fn returns_input_unchanged_when_nothing_encodes_cleanly() {
        // Pure ASCII business text with no CJK reinterpretation will simply
        // fail every validator in practice; confirm we still get it back.
        let input = "Invoice INV-9";
        let repaired = repair_mojibake(input, |candidate| candidate.contains("never matches"));
        assert_eq!(repaired, input);
    }
}
