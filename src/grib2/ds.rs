//! Data Section unpacking: dispatches on the data representation template
//! that was in effect when the section was reached.

use super::GridMetadata;
use crate::bits::get_bits;
use crate::decoder::bitmap::BitmapDecodeIterator;
use crate::decoder::simple::{ScaleOffsetDecoder, SimplePackingDecoder};
use crate::decoder::stream::{FixedValueIterator, NBitwiseIterator};
use crate::error::{DecodeError, GribError, ParseError};

pub(super) fn unpack_ds(
    buf: &[u8],
    offset: usize,
    md: &GridMetadata,
) -> Result<Vec<f64>, GribError> {
    let num_points = md.geometry.num_points();
    let packing = &md.packing;

    let values: Box<dyn Iterator<Item = f64> + '_> = match packing.template_num {
        // simple packing
        0 => {
            if packing.num_bits == 0 {
                Box::new(FixedValueIterator::new(packing.ref_val, num_points))
            } else {
                let payload = buf
                    .get(offset / 8 + 5..)
                    .ok_or(ParseError::UnexpectedEndOfData(offset))?;
                let iter = NBitwiseIterator::new(payload, packing.num_bits);
                Box::new(SimplePackingDecoder::Packed(ScaleOffsetDecoder::new(
                    iter,
                    packing.ref_val,
                    packing.bin_scale,
                    packing.dec_scale,
                )))
            }
        }
        // JPEG 2000 code stream
        40 | 40000 => {
            let length = get_bits(buf, offset, 32).map_err(ParseError::from)? as usize;
            if length < 5 {
                return Err(ParseError::InvalidSectionLength(offset).into());
            }
            let payload_len = length - 5;
            if payload_len == 0 {
                // an empty code stream encodes a constant field
                Box::new(FixedValueIterator::new(packing.ref_val, num_points))
            } else {
                let start = offset / 8 + 5;
                let payload = buf
                    .get(start..start + payload_len)
                    .ok_or(ParseError::UnexpectedEndOfData(offset))?;
                let quantised = decode_jpeg2000(payload, packing.num_packed as usize)?;
                Box::new(ScaleOffsetDecoder::new(
                    quantised.into_iter(),
                    packing.ref_val,
                    packing.bin_scale,
                    packing.dec_scale,
                ))
            }
        }
        n => return Err(DecodeError::NotSupported("Data template", n).into()),
    };

    let flags: Box<dyn Iterator<Item = u8>> = match &md.bitmap {
        Some(flags) => Box::new(flags.clone().into_iter()),
        None => Box::new(FixedValueIterator::new(1u8, num_points)),
    };

    let cells = BitmapDecodeIterator::new(flags, values)
        .take(num_points)
        .collect::<Vec<_>>();
    if cells.len() != num_points {
        return Err(DecodeError::LengthMismatch.into());
    }
    Ok(cells)
}

#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
fn decode_jpeg2000(payload: &[u8], expected_points: usize) -> Result<Vec<i32>, DecodeError> {
    crate::decoder::jpeg2000::decode_codestream(payload, expected_points)
}

#[cfg(not(feature = "jpeg2000-unpack-with-openjpeg"))]
fn decode_jpeg2000(_payload: &[u8], _expected_points: usize) -> Result<Vec<i32>, DecodeError> {
    Err(DecodeError::from(
        "JPEG 2000 code stream format support is disabled",
    ))
}
