use crate::bail;
use crate::error::{ErrorKind, ReconcileResult};

/// Number of bytes in a MAC address.
pub const MAC_LENGTH: usize = 6;

/// Converts a MAC address into its 6 raw bytes.
///
/// Colons are ignored, so both `aa:bb:cc:dd:ee:ff` and `aabbccddeeff` are accepted in any
/// letter case. Anything that does not leave exactly 12 hex digits is
/// [`ErrorKind::InvalidFormat`].
pub fn mac_to_bytes(address: &str) -> ReconcileResult<[u8; MAC_LENGTH]> {
    let digits: Vec<u8> = address.bytes().filter(|byte| *byte != b':').collect();

    if digits.len() != MAC_LENGTH * 2 || !digits.iter().all(u8::is_ascii_hexdigit) {
        bail!(
            ErrorKind::InvalidFormat,
            "Invalid MAC address",
            format!("`{address}` does not contain exactly 12 hex digits")
        );
    }

    let mut bytes = [0u8; MAC_LENGTH];
    for (byte, pair) in bytes.iter_mut().zip(digits.chunks_exact(2)) {
        *byte = (hex_value(pair[0]) << 4) | hex_value(pair[1]);
    }

    Ok(bytes)
}

/// Formats 6 bytes as lowercase hex pairs joined by colons.
pub fn bytes_to_mac(bytes: &[u8; MAC_LENGTH]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}
