use std::collections::BTreeMap;

use reconcile_config::shared::Transcoding;
use tracing::warn;

use crate::bail;
use crate::conversions::ipv4::{integer_to_ipv4, ipv4_to_integer};
use crate::conversions::mac::{MAC_LENGTH, bytes_to_mac, mac_to_bytes};
use crate::error::{ErrorKind, ReconcileResult};
use crate::types::{Cell, TableRows};

/// Cell level conversions between the display form a source stores and the storage form a
/// destination stores.
///
/// Display form is a [`Cell::String`]; storage form is a [`Cell::U64`] for IPv4 and a 6 byte
/// [`Cell::Bytes`] for MAC addresses. [`Cell::Null`] passes through every conversion. Values
/// already in the target form are accepted, so applying a conversion twice is harmless.
pub trait CellTranscoding {
    /// Display form to storage form.
    fn encode(&self, cell: &Cell) -> ReconcileResult<Cell>;

    /// Storage form to display form.
    fn decode(&self, cell: &Cell) -> ReconcileResult<Cell>;

    /// Display form to its normal display form, e.g. `AA:BB:...` to `aa:bb:...`.
    fn canonicalize(&self, cell: &Cell) -> ReconcileResult<Cell> {
        self.decode(&self.encode(cell)?)
    }
}

impl CellTranscoding for Transcoding {
    fn encode(&self, cell: &Cell) -> ReconcileResult<Cell> {
        match (self, cell) {
            (_, Cell::Null) => Ok(Cell::Null),
            (Transcoding::Ipv4, Cell::String(address)) => {
                Ok(Cell::U64(u64::from(ipv4_to_integer(address)?)))
            }
            (Transcoding::Ipv4, Cell::Bytes(bytes)) => {
                Ok(Cell::U64(u64::from(ipv4_to_integer(utf8(self, bytes)?)?)))
            }
            (Transcoding::Ipv4, integer @ (Cell::I64(_) | Cell::U64(_))) => {
                Ok(Cell::U64(u64::from(ipv4_integer(integer)?)))
            }
            (Transcoding::Mac, Cell::String(address)) => {
                Ok(Cell::Bytes(mac_to_bytes(address)?.to_vec()))
            }
            (Transcoding::Mac, Cell::Bytes(bytes)) if bytes.len() == MAC_LENGTH => {
                Ok(Cell::Bytes(bytes.clone()))
            }
            (Transcoding::Mac, Cell::Bytes(bytes)) => {
                Ok(Cell::Bytes(mac_to_bytes(utf8(self, bytes)?)?.to_vec()))
            }
            (_, other) => unsupported(self, other),
        }
    }

    fn decode(&self, cell: &Cell) -> ReconcileResult<Cell> {
        match (self, cell) {
            (_, Cell::Null) => Ok(Cell::Null),
            (Transcoding::Ipv4, integer @ (Cell::I64(_) | Cell::U64(_))) => {
                Ok(Cell::String(integer_to_ipv4(ipv4_integer(integer)?)))
            }
            (Transcoding::Ipv4, Cell::String(address)) => {
                Ok(Cell::String(integer_to_ipv4(ipv4_to_integer(address)?)))
            }
            (Transcoding::Mac, Cell::Bytes(bytes)) => match <[u8; MAC_LENGTH]>::try_from(
                bytes.as_slice(),
            ) {
                Ok(bytes) => Ok(Cell::String(bytes_to_mac(&bytes))),
                Err(_) => Ok(Cell::String(bytes_to_mac(&mac_to_bytes(utf8(self, bytes)?)?))),
            },
            (Transcoding::Mac, Cell::String(address)) => {
                Ok(Cell::String(bytes_to_mac(&mac_to_bytes(address)?)))
            }
            (_, other) => unsupported(self, other),
        }
    }
}

/// Replaces the values of every transcoded column of `rows` with their display form.
///
/// Values that cannot be decoded are left as they are and logged; they compare unequal to
/// any source value and get rewritten by the next update.
pub fn decode_columns(rows: &mut TableRows, transcoding: &BTreeMap<String, Transcoding>) {
    let columns: Vec<(usize, String, Transcoding)> = transcoding
        .iter()
        .filter_map(|(column, transcoding)| {
            rows.column_index(column)
                .map(|index| (index, column.clone(), *transcoding))
        })
        .collect();

    if columns.is_empty() {
        return;
    }

    for row in rows.rows_mut() {
        for (index, column, transcoding) in &columns {
            let Some(cell) = row.values_mut().get_mut(*index) else {
                continue;
            };

            match transcoding.decode(cell) {
                Ok(decoded) => *cell = decoded,
                Err(err) => warn!(
                    column = %column,
                    value = %cell,
                    error = %err,
                    "destination value could not be decoded, keeping it as stored"
                ),
            }
        }
    }
}

fn ipv4_integer(cell: &Cell) -> ReconcileResult<u32> {
    match cell.as_integer().map(u32::try_from) {
        Some(Ok(value)) => Ok(value),
        _ => bail!(
            ErrorKind::InvalidFormat,
            "Invalid IPv4 address",
            format!("{cell} is outside of the IPv4 range")
        ),
    }
}

fn utf8<'a>(transcoding: &Transcoding, bytes: &'a [u8]) -> ReconcileResult<&'a str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(_) => bail!(
            ErrorKind::InvalidFormat,
            "Value cannot be transcoded",
            format!(
                "{} is neither {transcoding:?} storage nor display form",
                Cell::Bytes(bytes.to_vec())
            )
        ),
    }
}

fn unsupported(transcoding: &Transcoding, cell: &Cell) -> ReconcileResult<Cell> {
    bail!(
        ErrorKind::InvalidFormat,
        "Value cannot be transcoded",
        format!("{cell} cannot be transcoded as {transcoding:?}")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TableRow;

    #[test]
    fn ipv4_encodes_to_integer_and_back() {
        let display = Cell::String("10.0.0.5".to_string());

        let stored = Transcoding::Ipv4.encode(&display).unwrap();
        assert_eq!(stored, Cell::U64(167772165));
        assert_eq!(Transcoding::Ipv4.decode(&stored).unwrap(), display);
        assert_eq!(Transcoding::Ipv4.decode(&Cell::I64(167772165)).unwrap(), display);
    }

    #[test]
    fn mac_encodes_to_bytes_and_back() {
        let display = Cell::String("AA:BB:CC:DD:EE:FF".to_string());

        let stored = Transcoding::Mac.encode(&display).unwrap();
        assert_eq!(stored, Cell::Bytes(vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]));
        assert_eq!(
            Transcoding::Mac.decode(&stored).unwrap(),
            Cell::String("aa:bb:cc:dd:ee:ff".to_string())
        );
    }

    #[test]
    fn textual_mac_bytes_are_parsed() {
        let stored = Cell::Bytes(b"aa:bb:cc:dd:ee:ff".to_vec());

        assert_eq!(
            Transcoding::Mac.decode(&stored).unwrap(),
            Cell::String("aa:bb:cc:dd:ee:ff".to_string())
        );
    }

    #[test]
    fn null_passes_through() {
        for transcoding in [Transcoding::Ipv4, Transcoding::Mac] {
            assert_eq!(transcoding.encode(&Cell::Null).unwrap(), Cell::Null);
            assert_eq!(transcoding.decode(&Cell::Null).unwrap(), Cell::Null);
            assert_eq!(transcoding.canonicalize(&Cell::Null).unwrap(), Cell::Null);
        }
    }

    #[test]
    fn canonical_form_is_stable() {
        let canonical = Transcoding::Mac
            .canonicalize(&Cell::String("aabbccddeeff".to_string()))
            .unwrap();

        assert_eq!(canonical, Cell::String("aa:bb:cc:dd:ee:ff".to_string()));
        assert_eq!(Transcoding::Mac.canonicalize(&canonical).unwrap(), canonical);
    }

    #[test]
    fn malformed_values_are_invalid_format() {
        let err = Transcoding::Mac
            .encode(&Cell::String("zz:zz".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = Transcoding::Ipv4.decode(&Cell::I64(-1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);

        let err = Transcoding::Ipv4.encode(&Cell::Bool(true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn decode_columns_converts_only_transcoded_columns() {
        let mut rows = TableRows::with_rows(
            vec![
                "host_id".to_string(),
                "ipv4_address".to_string(),
                "dhcp_identifier".to_string(),
            ],
            vec![
                TableRow::new(vec![
                    Cell::U64(1),
                    Cell::U64(167772165),
                    Cell::Bytes(vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
                ]),
                TableRow::new(vec![Cell::U64(2), Cell::Null, Cell::Bytes(vec![0x01])]),
            ],
        );

        decode_columns(&mut rows, &reconcile_config::shared::default_transcoding());

        assert_eq!(
            rows.rows()[0].values(),
            &[
                Cell::U64(1),
                Cell::String("10.0.0.5".to_string()),
                Cell::String("aa:bb:cc:dd:ee:ff".to_string()),
            ]
        );
        // Undecodable values stay as stored.
        assert_eq!(
            rows.rows()[1].values(),
            &[Cell::U64(2), Cell::Null, Cell::Bytes(vec![0x01])]
        );
    }
}
