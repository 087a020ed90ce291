//! Edition-1 section parsers. Each parser starts at the current bit offset
//! into the message buffer and advances it by the section's length.

use tracing::warn;

use super::Grib1Record;
use crate::bits::{get_bits, get_signed};
use crate::decoder::bitmap::BitmapDecodeIterator;
use crate::decoder::simple::{ScaleOffsetDecoder, SimplePackingDecoder};
use crate::decoder::stream::{FixedValueIterator, NBitwiseIterator};
use crate::error::{DecodeError, GribError, ParseError};
use crate::ibmfloat::ibm2real;

/// Level types whose PDS level field is a single 16-bit value instead of
/// two 8-bit values.
pub const PDS_16BIT_LEVEL_TYPES: [u8; 12] =
    [100, 103, 105, 107, 109, 111, 113, 115, 125, 160, 200, 201];

/// P2 values that indicate a "number included in average" field.
const P2_WITH_NAVG: [u8; 10] = [3, 4, 51, 113, 114, 115, 116, 117, 123, 124];

pub(super) fn unpack_pds(buf: &[u8], rec: &mut Grib1Record) -> Result<usize, GribError> {
    let offset;
    if rec.edition == 0 {
        offset = 32;
        rec.pds_len = 24;
    } else {
        offset = 64;
        rec.pds_len = get_bits(buf, offset, 24).map_err(ParseError::from)? as usize;
        rec.table_version = get_bits(buf, offset + 24, 8).map_err(ParseError::from)? as u8;
    }

    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    rec.centre_id = bits(offset + 32, 8)? as u8;
    rec.gen_proc = bits(offset + 40, 8)? as u8;
    rec.grid_type = bits(offset + 48, 8)? as u8;
    let flag = bits(offset + 56, 8)?;
    rec.gds_included = flag & 0x80 == 0x80;
    rec.bms_included = flag & 0x40 == 0x40;
    rec.param = bits(offset + 64, 8)? as u8;
    rec.level_type = bits(offset + 72, 8)? as u8;
    if PDS_16BIT_LEVEL_TYPES.contains(&rec.level_type) {
        rec.lvl1 = bits(offset + 80, 16)?;
        rec.lvl2 = 0;
    } else {
        rec.lvl1 = bits(offset + 80, 8)?;
        rec.lvl2 = bits(offset + 88, 8)?;
    }
    rec.year = bits(offset + 96, 8)? as i32; // year of century
    rec.month = bits(offset + 104, 8)? as u8;
    rec.day = bits(offset + 112, 8)? as u8;
    let hour = bits(offset + 120, 8)?;
    let minute = bits(offset + 128, 8)?;
    rec.time = hour * 100 + minute;
    rec.fcst_units = bits(offset + 136, 8)? as u8;
    rec.p1 = bits(offset + 144, 8)? as u8;
    rec.p2 = bits(offset + 152, 8)? as u8;
    rec.time_range = bits(offset + 160, 8)? as u8;
    rec.navg = if P2_WITH_NAVG.contains(&rec.p2) {
        bits(offset + 168, 16)?
    } else {
        0
    };
    rec.nmiss = bits(offset + 184, 8)? as u8;

    if rec.edition == 0 {
        rec.pds_ext = None;
        return Ok(offset + 192);
    }

    let century = bits(offset + 192, 8)? as i32;
    rec.year += (century - 1) * 100;
    rec.sub_centre_id = bits(offset + 200, 8)? as u8;
    rec.dec_scale = get_signed(buf, offset + 208, 16).map_err(ParseError::from)?;
    let mut offset = offset + 224;

    if rec.pds_len > 28 {
        // The extension normally follows a 40-octet PDS; files exist where
        // it sits right after the 28 standard octets.
        let (start, ext_len, skip) = if rec.pds_len < 40 {
            warn!("PDS extension is in wrong location");
            let ext_len = rec.pds_len - 28;
            (36usize, ext_len, ext_len * 8)
        } else {
            let ext_len = rec.pds_len - 40;
            (48usize, ext_len, (ext_len + 12) * 8)
        };
        let ext = buf
            .get(start..start + ext_len)
            .ok_or(ParseError::UnexpectedEndOfData(start * 8))?;
        rec.pds_ext = Some(ext.to_vec());
        offset += skip;
    } else {
        rec.pds_ext = None;
    }

    Ok(offset)
}

pub(super) fn unpack_gds(
    buf: &[u8],
    rec: &mut Grib1Record,
    offset: usize,
) -> Result<usize, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };
    let signed = |off: usize, n: usize| -> Result<i32, ParseError> {
        get_signed(buf, off, n).map_err(ParseError::from)
    };

    rec.gds_len = bits(offset, 24)? as usize;
    if rec.edition == 0 {
        rec.total_len += rec.gds_len;
    }
    rec.data_rep = bits(offset + 40, 8)? as u8;
    match rec.data_rep {
        // latitude/longitude, Gaussian and rotated lat/lon grids
        0 | 4 | 10 => {
            rec.nx = bits(offset + 48, 16)? as usize;
            rec.ny = bits(offset + 64, 16)? as usize;
            rec.slat = f64::from(signed(offset + 80, 24)?) * 0.001;
            rec.slon = f64::from(signed(offset + 104, 24)?) * 0.001;
            rec.rescomp = bits(offset + 128, 8)? as u8;
            rec.elat = f64::from(signed(offset + 136, 24)?) * 0.001;
            rec.elon = f64::from(signed(offset + 160, 24)?) * 0.001;
            rec.loinc = f64::from(bits(offset + 184, 16)?) * 0.001;
            // for Gaussian grids this field is the number of parallels
            // between the equator and the pole
            let lainc = bits(offset + 200, 16)?;
            rec.lainc = if rec.data_rep == 0 {
                f64::from(lainc) * 0.001
            } else {
                f64::from(lainc)
            };
            rec.scan_mode = bits(offset + 216, 8)? as u8;
        }
        // Lambert conformal and polar stereographic grids
        3 | 5 => {
            rec.nx = bits(offset + 48, 16)? as usize;
            rec.ny = bits(offset + 64, 16)? as usize;
            rec.slat = f64::from(signed(offset + 80, 24)?) * 0.001;
            rec.slon = f64::from(signed(offset + 104, 24)?) * 0.001;
            rec.rescomp = bits(offset + 128, 8)? as u8;
            rec.olon = f64::from(signed(offset + 136, 24)?) * 0.001;
            rec.xlen = bits(offset + 160, 24)?;
            rec.ylen = bits(offset + 184, 24)?;
            rec.proj = bits(offset + 208, 8)? as u8;
            rec.scan_mode = bits(offset + 216, 8)? as u8;
        }
        n => {
            return Err(DecodeError::NotSupported("Grid type", u16::from(n)).into());
        }
    }

    Ok(offset + rec.gds_len * 8)
}

pub(super) fn unpack_bms(
    buf: &[u8],
    rec: &mut Grib1Record,
    offset: usize,
) -> Result<usize, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    rec.bms_len = bits(offset, 24)? as usize;
    if rec.edition == 0 {
        rec.total_len += rec.bms_len;
    }
    let unused = bits(offset + 24, 8)? as usize;
    let table_ref = bits(offset + 32, 16)?;
    if table_ref != 0 {
        return Err(DecodeError::PredefinedBitmap(table_ref as u16).into());
    }

    let nbits = (rec.bms_len * 8)
        .checked_sub(48 + unused)
        .ok_or(DecodeError::LengthMismatch)?;
    let mut flags = Vec::with_capacity(nbits);
    for n in 0..nbits {
        flags.push(bits(offset + 48 + n, 1)? as u8);
    }
    rec.bitmap = Some(flags);

    Ok(offset + rec.bms_len * 8)
}

pub(super) fn unpack_bds(
    buf: &[u8],
    rec: &mut Grib1Record,
    offset: usize,
) -> Result<usize, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    rec.bds_len = bits(offset, 24)? as usize;
    if rec.edition == 0 {
        rec.total_len += rec.bds_len + 1;
    }
    rec.bds_flag = bits(offset + 24, 4)? as u8;
    let unused = bits(offset + 28, 4)? as usize;
    rec.bin_scale = get_signed(buf, offset + 32, 16).map_err(ParseError::from)?;
    let dec_factor = 10f64.powi(rec.dec_scale);
    rec.ref_val = ibm2real(buf, offset + 48).map_err(ParseError::from)? / dec_factor;
    rec.pack_width = bits(offset + 80, 8)? as usize;

    if rec.bds_flag & 0x04 != 0 {
        return Err(DecodeError::ComplexPackingNotSupported.into());
    }

    let mut offset = offset + 88;
    let data_bits = (rec.bds_len * 8)
        .checked_sub(88 + unused)
        .ok_or(DecodeError::LengthMismatch)?;
    let num_packed = if rec.pack_width > 0 {
        data_bits / rec.pack_width
    } else {
        0
    };

    match rec.data_rep {
        0 | 4 | 10 | 3 | 5 => {
            if matches!(rec.data_rep, 0 | 4 | 10)
                && matches!(rec.grid_type, 23 | 24 | 26 | 63 | 64)
            {
                // these grid catalogue entries carry one extra packed value
                // up front: skip it, then unpack normally
                offset += rec.pack_width;
            }
            rec.gridpoints = unpack_gridpoints(buf, rec, offset, num_packed, rec.nx, rec.ny)?;
        }
        // no recognised GDS: unpack the stream of gridpoints as one row
        _ => {
            rec.ny = 1;
            rec.nx = num_packed;
            rec.gridpoints = unpack_gridpoints(buf, rec, offset, num_packed, num_packed, 1)?;
        }
    }

    Ok(offset + num_packed * rec.pack_width)
}

fn unpack_gridpoints(
    buf: &[u8],
    rec: &Grib1Record,
    offset: usize,
    num_packed: usize,
    nx: usize,
    ny: usize,
) -> Result<Vec<Vec<f64>>, GribError> {
    let num_points = nx * ny;
    let values = if rec.pack_width == 0 {
        SimplePackingDecoder::Constant(FixedValueIterator::new(rec.ref_val, num_points))
    } else {
        let payload = buf
            .get(offset / 8..)
            .ok_or(ParseError::UnexpectedEndOfData(offset))?;
        let iter = NBitwiseIterator::new(payload, rec.pack_width)
            .with_offset(offset % 8)
            .take(num_packed);
        SimplePackingDecoder::Packed(ScaleOffsetDecoder::new(
            iter,
            rec.ref_val,
            rec.bin_scale,
            rec.dec_scale,
        ))
    };

    let flags: Box<dyn Iterator<Item = u8>> = match &rec.bitmap {
        Some(flags) => Box::new(flags.clone().into_iter()),
        None => Box::new(FixedValueIterator::new(1u8, num_points)),
    };

    let cells = BitmapDecodeIterator::new(flags, values)
        .take(num_points)
        .collect::<Vec<_>>();
    if cells.len() != num_points {
        return Err(DecodeError::LengthMismatch.into());
    }

    Ok(cells.chunks(nx).map(|row| row.to_vec()).collect())
}
