//! OOXML `ST_Xstring` escapes.
//!
//! XML 1.0 cannot carry most C0 control characters, even as character
//! references. Spreadsheet text stores them as `_xHHHH_` instead, and a literal
//! `_xHHHH_` in the text has its leading underscore written as `_x005F_`.

use std::borrow::Cow;

/// Characters XML 1.0 does not allow in element content.
pub(crate) fn is_forbidden(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

/// Code point of an `_xHHHH_` escape at the start of `s`.
fn escape_at(s: &str) -> Option<u32> {
    let rest = s.strip_prefix("_x")?;
    let digits = rest.get(..4)?;
    if rest.get(4..5)? != "_" || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// Escape `value` for a shared string `<t>` element.
pub(crate) fn encode(value: &str) -> Cow<'_, str> {
    if !value.chars().any(is_forbidden) && !value.contains("_x") {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for (i, c) in value.char_indices() {
        if c == '_' && value.get(i..).and_then(escape_at).is_some() {
            out.push_str("_x005F_");
        } else if is_forbidden(c) {
            out.push_str(&format!("_x{:04X}_", u32::from(c)));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Reverse [`encode`]. Malformed escapes are kept as written.
pub(crate) fn decode(value: &str) -> Cow<'_, str> {
    if !value.contains("_x") {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find("_x") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        match escape_at(tail).and_then(char::from_u32) {
            Some(c) => {
                out.push(c);
                rest = tail.get(7..).unwrap_or_default();
            }
            None => {
                out.push('_');
                rest = tail.get(1..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Coffee", "Coffee" ; "plain text")]
    #[test_case("UPI\u{1}REF\u{8}", "UPI_x0001_REF_x0008_" ; "control characters")]
    #[test_case("tab\tand\nnewline", "tab\tand\nnewline" ; "allowed whitespace")]
    #[test_case("ref_x0041_", "ref_x005F_x0041_" ; "literal escape")]
    #[test_case("snake_x_case", "snake_x_case" ; "underscore x without digits")]
    #[test_case("\u{FFFF}", "_xFFFF_" ; "noncharacter")]
    fn test_encode(input: &str, expected: &str) {
        assert_eq!(encode(input), expected);
    }

    #[test_case("UPI_x0001_REF_x0008_", "UPI\u{1}REF\u{8}" ; "control characters")]
    #[test_case("ref_x005F_x0041_", "ref_x0041_" ; "escaped literal")]
    #[test_case("_x00zz_", "_x00zz_" ; "bad digits kept")]
    #[test_case("_xD800_", "_xD800_" ; "surrogate kept")]
    #[test_case("end_x", "end_x" ; "truncated")]
    fn test_decode(input: &str, expected: &str) {
        assert_eq!(decode(input), expected);
    }

    #[test]
    fn test_encoded_text_has_no_forbidden_characters() {
        let raw = "\u{0}\u{1F}_x0001_caf\u{e9}\u{B}";
        let encoded = encode(raw);
        assert!(!encoded.chars().any(is_forbidden));
        assert_eq!(decode(&encoded), raw);
    }
}
