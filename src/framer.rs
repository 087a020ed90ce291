//! Message framing: locating the ASCII `GRIB` marker in a byte stream,
//! discriminating the edition, and buffering one whole message through the
//! trailing `7777` marker.

use std::io::Read;

use tracing::warn;

use crate::bits::get_bits;
use crate::error::ParseError;
use crate::helpers::read_as;

pub(crate) const MAGIC: &[u8] = b"GRIB";
pub(crate) const END_MARKER: &[u8] = b"7777";

/// One framed message: the byte buffer runs from the `GRIB` marker through
/// the `7777` end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFrame {
    /// 0 for the legacy GRIB-0 variant, otherwise the edition octet.
    pub edition: u8,
    pub total_len: usize,
    pub buf: Vec<u8>,
}

/// Reads until `buf` is full or the stream ends, returning the number of
/// bytes actually read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ParseError> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Frames the next message from the stream.
///
/// Returns `Ok(None)` on a clean end of stream (before a message or while
/// still hunting for a `GRIB` marker) and `Err` on truncation once a marker
/// has been found. A missing `7777` end marker is only warned about;
/// parsing continues.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<MessageFrame>, ParseError> {
    let mut head = [0u8; 16];

    let n = read_full(reader, &mut head[..4])?;
    if n == 0 {
        return Ok(None);
    }
    if n < 4 {
        return Err(ParseError::ReadError(
            "stream ended inside a message header".to_owned(),
        ));
    }

    // Resynchronise by sliding the 4-byte window towards the next 'G'
    // candidate, refilling only the vacated tail bytes.
    while &head[..4] != MAGIC {
        let refill = if head[1] == b'G' {
            head.copy_within(1..4, 0);
            3..4
        } else if head[2] == b'G' {
            head.copy_within(2..4, 0);
            2..4
        } else if head[3] == b'G' {
            head[0] = head[3];
            1..4
        } else {
            0..4
        };
        let wanted = refill.len();
        if read_full(reader, &mut head[refill])? < wanted {
            return Ok(None);
        }
    }

    if read_full(reader, &mut head[4..8])? < 4 {
        return Err(ParseError::ReadError(
            "stream ended inside a message header".to_owned(),
        ));
    }

    let edition = head[7];
    let (mut edition, total_len, header_len) = if edition == 2 {
        if read_full(reader, &mut head[8..16])? < 8 {
            return Err(ParseError::ReadError(
                "stream ended inside a message header".to_owned(),
            ));
        }
        let total_len = read_as!(u64, head, 8) as usize;
        (2u8, total_len, 16usize)
    } else {
        let total_len = get_bits(&head, 32, 24).map_err(ParseError::from)? as usize;
        (1u8, total_len, 8usize)
    };

    let mut total_len = total_len;
    if edition == 1 && total_len == 24 {
        // legacy GRIB-0: the length field covers only the PDS; extend for
        // the trailing section length and end marker
        edition = 0;
        total_len += 7;
    }
    if total_len < header_len {
        return Err(ParseError::InvalidSectionLength(0));
    }

    let mut buf = vec![0u8; total_len + 4];
    buf[..header_len].copy_from_slice(&head[..header_len]);
    let rest = total_len - header_len;
    if read_full(reader, &mut buf[header_len..total_len])? < rest {
        return Err(ParseError::ReadError(
            "stream ended inside a message body".to_owned(),
        ));
    }

    if &buf[total_len - 4..total_len] != END_MARKER {
        warn!("no end section found");
    }

    Ok(Some(MessageFrame {
        edition,
        total_len,
        buf,
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn tiny_ed1_message() -> Vec<u8> {
        // edition-1 frame with a 16-byte body for framing tests only
        let mut msg = Vec::new();
        msg.extend_from_slice(b"GRIB");
        msg.extend_from_slice(&[0x00, 0x00, 0x10]); // total length 16
        msg.push(1); // edition
        msg.extend_from_slice(&[0u8; 4]);
        msg.extend_from_slice(b"7777");
        msg
    }

    #[test]
    fn frames_a_message_at_stream_start() {
        let msg = tiny_ed1_message();
        let mut cursor = Cursor::new(msg.clone());
        let frame = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(frame.edition, 1);
        assert_eq!(frame.total_len, 16);
        assert_eq!(&frame.buf[..16], &msg[..]);
    }

    #[test]
    fn resynchronises_over_junk_prefixes() {
        let msg = tiny_ed1_message();
        for junk in [
            &b"x"[..],
            b"GG",
            b"abcdefg",
            b"GRIx",
            b"GRI",
            b"\x00\x00\x00\x00\x00",
        ] {
            let mut padded = junk.to_vec();
            padded.extend_from_slice(&msg);
            let mut cursor = Cursor::new(padded);
            let frame = read_frame(&mut cursor).unwrap().unwrap();
            assert_eq!(&frame.buf[..16], &msg[..], "junk {junk:?}");
        }
    }

    #[test]
    fn eof_at_boundary_is_none() {
        let mut cursor = Cursor::new(Vec::new());
        assert_eq!(read_frame(&mut cursor), Ok(None));
    }

    #[test]
    fn eof_during_resync_is_none() {
        let mut cursor = Cursor::new(b"not a grib stream".to_vec());
        assert_eq!(read_frame(&mut cursor), Ok(None));
    }

    #[test]
    fn truncation_after_marker_is_an_error() {
        let msg = tiny_ed1_message();
        let mut cursor = Cursor::new(msg[..10].to_vec());
        assert!(matches!(
            read_frame(&mut cursor),
            Err(ParseError::ReadError(_))
        ));
    }

    #[test]
    fn grib0_length_is_extended() {
        let mut msg = Vec::new();
        msg.extend_from_slice(b"GRIB");
        msg.extend_from_slice(&[0x00, 0x00, 24]); // PDS-only length
        msg.extend_from_slice(&[0u8; 20]); // rest of the 24 + 3 + 4 layout
        msg.extend_from_slice(b"7777");
        let mut cursor = Cursor::new(msg);
        let frame = read_frame(&mut cursor).unwrap().unwrap();
        assert_eq!(frame.edition, 0);
        assert_eq!(frame.total_len, 31);
    }
}
