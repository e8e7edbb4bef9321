//! Name command implementation.

use crmlink_codec::{decode_name, encode_name};

/// Runs the name command.
pub fn run(text: &str, decode: bool) -> String {
    if decode {
        decode_name(text)
    } else {
        encode_name(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_directions() {
        assert_eq!(run("Full Name", false), "Full_x0020_Name");
        assert_eq!(run("Full_x0020_Name", true), "Full Name");
    }
}
