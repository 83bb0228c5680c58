use std::net::Ipv4Addr;

use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;

/// Converts a dotted-quad IPv4 address into its big-endian integer value.
///
/// `10.0.0.5` becomes `167772165`. Leading zeros, missing octets and surrounding whitespace
/// are rejected with [`ErrorKind::InvalidFormat`].
pub fn ipv4_to_integer(address: &str) -> ReconcileResult<u32> {
    address
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|err| {
            reconcile_error!(
                ErrorKind::InvalidFormat,
                "Invalid IPv4 address",
                format!("`{address}` is not a dotted-quad IPv4 address"),
                source: err
            )
        })
}

/// Converts an integer back into dotted-quad form.
pub fn integer_to_ipv4(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_known_addresses() {
        assert_eq!(ipv4_to_integer("10.0.0.5").unwrap(), 167772165);
        assert_eq!(ipv4_to_integer("0.0.0.0").unwrap(), 0);
        assert_eq!(ipv4_to_integer("255.255.255.255").unwrap(), u32::MAX);
        assert_eq!(integer_to_ipv4(167772165), "10.0.0.5");
    }

    #[test]
    fn round_trips_canonical_addresses() {
        for address in ["192.168.1.20", "172.16.0.1", "1.2.3.4"] {
            assert_eq!(integer_to_ipv4(ipv4_to_integer(address).unwrap()), address);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for address in ["", "10.0.0", "10.0.0.256", "a.b.c.d", " 10.0.0.1", "10.0.0.1/24"] {
            let err = ipv4_to_integer(address).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFormat, "{address}");
        }
    }
}
