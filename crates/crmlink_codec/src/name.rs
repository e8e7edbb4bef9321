//! Markup-safe element names.
//!
//! Field names such as `"Full Name"` or `"2nd phone"` are not valid element
//! names. [`encode_name`] replaces every offending UTF-16 unit with a
//! fixed-width `_xHHHH_` escape; [`decode_name`] reverses it exactly.

/// Length of one `_xHHHH_` escape.
const ESCAPE_LEN: usize = 7;

/// Encode a field name so it can be used as a markup element name.
///
/// Letters, digits, `_`, `-` and `.` are kept, except that a leading digit,
/// `-` or `.` is escaped. An underscore followed by `x` is escaped itself,
/// so the output never contains an escape the input did not ask for.
pub fn encode_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for (index, (offset, ch)) in name.char_indices().enumerate() {
        let keep = if index == 0 {
            is_name_start(ch)
        } else {
            is_name_char(ch)
        };
        let keep = keep && !(ch == '_' && starts_escape(&name[offset + 1..]));
        if keep {
            encoded.push(ch);
        } else {
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                encoded.push_str(&format!("_x{unit:04X}_"));
            }
        }
    }
    encoded
}

/// Decode a name produced by [`encode_name`].
///
/// Text that does not form a valid escape is copied unchanged.
pub fn decode_name(encoded: &str) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(encoded.len());
    let mut rest = encoded;
    while !rest.is_empty() {
        if looks_like_escape(rest) {
            if let Ok(unit) = u16::from_str_radix(&rest[2..6], 16) {
                units.push(unit);
                rest = &rest[ESCAPE_LEN..];
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            let mut buffer = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buffer));
        }
        rest = chars.as_str();
    }
    String::from_utf16_lossy(&units)
}

fn is_name_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

fn starts_escape(after_underscore: &str) -> bool {
    after_underscore.starts_with(['x', 'X'])
}

fn looks_like_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= ESCAPE_LEN
        && bytes[0] == b'_'
        && (bytes[1] == b'x' || bytes[1] == b'X')
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_names_unchanged() {
        assert_eq!(encode_name("accountid"), "accountid");
        assert_eq!(encode_name("first_name"), "first_name");
        assert_eq!(encode_name("a.b-c"), "a.b-c");
    }

    #[test]
    fn escapes_illegal_characters() {
        assert_eq!(encode_name("Full Name"), "Full_x0020_Name");
        assert_eq!(encode_name("a<b>"), "a_x003C_b_x003E_");
        assert_eq!(encode_name("x&y;z"), "x_x0026_y_x003B_z");
        assert_eq!(encode_name("it's \"q\""), "it_x0027_s_x0020__x0022_q_x0022_");
    }

    #[test]
    fn escapes_leading_digit() {
        assert_eq!(encode_name("2nd"), "_x0032_nd");
        assert_eq!(encode_name("a2"), "a2");
    }

    #[test]
    fn escapes_escape_lookalikes() {
        let name = "_x0041_";
        let encoded = encode_name(name);
        assert_ne!(encoded, name);
        assert_eq!(decode_name(&encoded), name);
    }

    #[test]
    fn escapes_partial_lookalikes() {
        let name = "_x0041 ";
        assert_eq!(encode_name(name), "_x005F_x0041_x0020_");
        assert_eq!(decode_name(&encode_name(name)), name);
    }

    #[test]
    fn decodes_lowercase_hex() {
        assert_eq!(decode_name("Full_x0020_Name"), "Full Name");
        assert_eq!(decode_name("a_x003c_b"), "a<b");
    }

    #[test]
    fn leaves_broken_escapes() {
        assert_eq!(decode_name("_x00"), "_x00");
        assert_eq!(decode_name("_xZZZZ_"), "_xZZZZ_");
    }

    #[test]
    fn empty_name() {
        assert_eq!(encode_name(""), "");
        assert_eq!(decode_name(""), "");
    }

    #[test]
    fn supplementary_characters() {
        let name = "emoji \u{1F600}";
        assert_eq!(decode_name(&encode_name(name)), name);
    }

    proptest! {
        #[test]
        fn round_trip(name in any::<String>()) {
            prop_assert_eq!(decode_name(&encode_name(&name)), name);
        }

        #[test]
        fn encoded_names_are_element_safe(name in "[ -~]{1,24}") {
            let encoded = encode_name(&name);
            let first = encoded.chars().next().unwrap();
            prop_assert!(first == '_' || first.is_alphabetic());
            prop_assert!(encoded.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')));
        }
    }
}
