//! Byte filtering for data read from the pipes.
//!
//! Producers terminate each message with a NUL, and a partial read can also
//! land mid-message, so the raw buffer may carry stray terminator bytes.
//! Only tab, newline, carriage return, and printable ASCII pass through.

/// Filter one read's worth of bytes for forwarding to the output sinks.
///
/// Keeps `\t`, `\n`, `\r`, and bytes in `32..=126`; drops everything else.
/// If the final raw byte is a NUL not preceded by a line ending, a synthetic
/// `\n` is appended so the stray terminator does not glue two lines together.
pub fn filter_message(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 1);
    for &byte in raw {
        if byte == b'\t' || byte == b'\n' || byte == b'\r' || (32..=126).contains(&byte) {
            out.push(byte);
        }
    }
    if needs_synthetic_newline(raw) {
        out.push(b'\n');
    }
    out
}

fn needs_synthetic_newline(raw: &[u8]) -> bool {
    match raw {
        [] => false,
        [0] => true,
        [.., prev, 0] => *prev != b'\n' && *prev != b'\r',
        _ => false,
    }
}
