//! Decoder for GRIB edition 1 (and the legacy GRIB-0 variant) messages.

use std::io::Read;

use crate::error::{GribError, ParseError};
use crate::framer::{MessageFrame, read_frame};

mod sections;

pub use sections::PDS_16BIT_LEVEL_TYPES;

/// One decoded edition-1 record: the header fields of the PDS/GDS/BMS/BDS
/// and a single `[ny][nx]` grid of values.
///
/// Gridpoints masked out by the bitmap hold
/// [`GRIB_MISSING_VALUE`](crate::GRIB_MISSING_VALUE).
#[derive(Debug, Clone, Default)]
pub struct Grib1Record {
    pub edition: u8,
    pub total_len: usize,
    pub pds_len: usize,
    pub gds_len: usize,
    pub bms_len: usize,
    pub bds_len: usize,

    pub table_version: u8,
    pub centre_id: u8,
    pub sub_centre_id: u8,
    pub gen_proc: u8,
    pub grid_type: u8,
    pub gds_included: bool,
    pub bms_included: bool,
    pub param: u8,
    pub level_type: u8,
    pub lvl1: u32,
    pub lvl2: u32,
    /// Full year for edition 1; year of century for GRIB-0.
    pub year: i32,
    pub month: u8,
    pub day: u8,
    /// `hour * 100 + minute`.
    pub time: u32,
    pub fcst_units: u8,
    pub p1: u8,
    pub p2: u8,
    pub time_range: u8,
    pub navg: u32,
    pub nmiss: u8,
    /// Signed decimal scale factor D.
    pub dec_scale: i32,
    pub pds_ext: Option<Vec<u8>>,

    pub data_rep: u8,
    pub nx: usize,
    pub ny: usize,
    pub slat: f64,
    pub slon: f64,
    pub elat: f64,
    pub elon: f64,
    /// Latitude increment for lat/lon grids, number of parallels between
    /// equator and pole for Gaussian grids.
    pub lainc: f64,
    pub loinc: f64,
    pub olon: f64,
    pub rescomp: u8,
    pub scan_mode: u8,
    pub proj: u8,
    pub xlen: u32,
    pub ylen: u32,

    pub bds_flag: u8,
    /// Signed binary scale factor E.
    pub bin_scale: i32,
    /// Reference value, already divided by `10^D`.
    pub ref_val: f64,
    pub pack_width: usize,

    pub bitmap: Option<Vec<u8>>,
    pub gridpoints: Vec<Vec<f64>>,
}

/// Pulls edition-1 records out of a byte stream, resynchronising on the
/// `GRIB` marker between records.
pub struct Grib1Reader<R> {
    reader: R,
}

impl<R: Read> Grib1Reader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decodes the next record. Returns `Ok(None)` at the end of the
    /// stream.
    pub fn next_record(&mut self) -> Result<Option<Grib1Record>, GribError> {
        let frame = match read_frame(&mut self.reader)? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        decode_record(frame).map(Some)
    }
}

impl<R: Read> Iterator for Grib1Reader<R> {
    type Item = Result<Grib1Record, GribError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

fn decode_record(frame: MessageFrame) -> Result<Grib1Record, GribError> {
    if frame.edition == 2 {
        return Err(ParseError::GRIBVersionMismatch(2).into());
    }

    let mut rec = Grib1Record {
        edition: frame.edition,
        total_len: frame.total_len,
        ..Default::default()
    };
    let buf = &frame.buf;

    let offset = sections::unpack_pds(buf, &mut rec)?;
    let offset = if rec.gds_included {
        sections::unpack_gds(buf, &mut rec, offset)?
    } else {
        offset
    };
    let offset = if rec.bms_included {
        sections::unpack_bms(buf, &mut rec, offset)?
    } else {
        offset
    };
    sections::unpack_bds(buf, &mut rec, offset)?;

    Ok(rec)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::decoder::GRIB_MISSING_VALUE;
    use crate::ibmfloat::ieee2ibm;

    /// Builds a minimal edition-1 message: PDS + GDS (lat/lon) + optional
    /// BMS + BDS.
    fn build_message(
        nx: usize,
        ny: usize,
        ref_val: f64,
        bin_scale: i32,
        dec_scale: i32,
        pack_width: usize,
        packed: &[u32],
        bitmap: Option<&[u8]>,
    ) -> Vec<u8> {
        use crate::bits::set_bits;

        let pds_len = 28;
        let gds_len = 32;
        let bms_len = bitmap.map(|b| 6 + b.len().div_ceil(8));
        let bds_len = 11 + (packed.len() * pack_width).div_ceil(8);
        let total_len =
            8 + pds_len + gds_len + bms_len.unwrap_or(0) + bds_len + 4;

        let mut buf = vec![0u8; total_len];
        buf[0..4].copy_from_slice(b"GRIB");
        set_bits(&mut buf, total_len as u32, 32, 24).unwrap();
        buf[7] = 1;

        // PDS
        let o = 64;
        set_bits(&mut buf, pds_len as u32, o, 24).unwrap();
        set_bits(&mut buf, 3, o + 24, 8).unwrap(); // table version
        set_bits(&mut buf, 7, o + 32, 8).unwrap(); // centre: NCEP
        set_bits(&mut buf, 96, o + 40, 8).unwrap(); // generating process
        set_bits(&mut buf, 255, o + 48, 8).unwrap(); // grid id
        let flag = if bitmap.is_some() { 0xc0 } else { 0x80 };
        set_bits(&mut buf, flag, o + 56, 8).unwrap();
        set_bits(&mut buf, 11, o + 64, 8).unwrap(); // parameter: temperature
        set_bits(&mut buf, 105, o + 72, 8).unwrap(); // level type
        set_bits(&mut buf, 2, o + 80, 16).unwrap(); // level
        set_bits(&mut buf, 21, o + 96, 8).unwrap(); // year of century
        set_bits(&mut buf, 5, o + 104, 8).unwrap();
        set_bits(&mut buf, 17, o + 112, 8).unwrap();
        set_bits(&mut buf, 12, o + 120, 8).unwrap();
        set_bits(&mut buf, 30, o + 128, 8).unwrap();
        set_bits(&mut buf, 1, o + 136, 8).unwrap(); // forecast unit: hour
        set_bits(&mut buf, 6, o + 144, 8).unwrap(); // P1
        set_bits(&mut buf, 0, o + 152, 8).unwrap(); // P2
        set_bits(&mut buf, 0, o + 160, 8).unwrap(); // time range
        set_bits(&mut buf, 0, o + 184, 8).unwrap(); // nmiss
        set_bits(&mut buf, 21, o + 192, 8).unwrap(); // century
        set_bits(&mut buf, 0, o + 200, 8).unwrap(); // sub-centre
        let d_field = if dec_scale < 0 {
            dec_scale.unsigned_abs() | 0x8000
        } else {
            dec_scale as u32
        };
        set_bits(&mut buf, d_field, o + 208, 16).unwrap();

        // GDS (lat/lon)
        let o = o + pds_len * 8;
        set_bits(&mut buf, gds_len as u32, o, 24).unwrap();
        set_bits(&mut buf, 0, o + 40, 8).unwrap(); // data representation
        set_bits(&mut buf, nx as u32, o + 48, 16).unwrap();
        set_bits(&mut buf, ny as u32, o + 64, 16).unwrap();
        set_bits(&mut buf, 90000, o + 80, 24).unwrap(); // first lat
        set_bits(&mut buf, 0, o + 104, 24).unwrap(); // first lon
        set_bits(&mut buf, 0x80, o + 128, 8).unwrap(); // res/comp flags
        set_bits(&mut buf, 0x800000 | 90000, o + 136, 24).unwrap(); // last lat
        set_bits(&mut buf, 359000, o + 160, 24).unwrap(); // last lon
        set_bits(&mut buf, 1000, o + 184, 16).unwrap(); // Di
        set_bits(&mut buf, 1000, o + 200, 16).unwrap(); // Dj
        set_bits(&mut buf, 0, o + 216, 8).unwrap(); // scanning mode

        // BMS
        let mut o = o + gds_len * 8;
        if let Some(flags) = bitmap {
            let len = bms_len.unwrap();
            set_bits(&mut buf, len as u32, o, 24).unwrap();
            set_bits(&mut buf, (len * 8 - 48 - flags.len()) as u32, o + 24, 8).unwrap();
            set_bits(&mut buf, 0, o + 32, 16).unwrap();
            for (i, b) in flags.iter().enumerate() {
                set_bits(&mut buf, u32::from(*b), o + 48 + i, 1).unwrap();
            }
            o += len * 8;
        }

        // BDS
        set_bits(&mut buf, bds_len as u32, o, 24).unwrap();
        set_bits(&mut buf, 0, o + 24, 4).unwrap(); // flag: simple packing
        let unused = (bds_len - 11) * 8 - packed.len() * pack_width;
        set_bits(&mut buf, unused as u32, o + 28, 4).unwrap();
        let e_field = if bin_scale < 0 {
            bin_scale.unsigned_abs() | 0x8000
        } else {
            bin_scale as u32
        };
        set_bits(&mut buf, e_field, o + 32, 16).unwrap();
        set_bits(&mut buf, ieee2ibm(ref_val), o + 48, 32).unwrap();
        set_bits(&mut buf, pack_width as u32, o + 80, 8).unwrap();
        for (i, v) in packed.iter().enumerate() {
            set_bits(&mut buf, *v, o + 88 + i * pack_width, pack_width).unwrap();
        }

        let end = total_len - 4;
        buf[end..].copy_from_slice(b"7777");
        buf
    }

    #[test]
    fn minimal_one_cell_record() {
        let msg = build_message(1, 1, 0.0, 0, 0, 0, &[], None);
        let mut reader = Grib1Reader::new(Cursor::new(msg));
        let rec = reader.next_record().unwrap().unwrap();

        assert_eq!(rec.edition, 1);
        assert_eq!(rec.centre_id, 7);
        assert_eq!(rec.gen_proc, 96);
        assert_eq!(rec.param, 11);
        assert_eq!(rec.level_type, 105);
        assert_eq!(rec.lvl1, 2);
        assert_eq!(rec.year, 2021);
        assert_eq!((rec.month, rec.day, rec.time), (5, 17, 1230));
        assert_eq!((rec.nx, rec.ny), (1, 1));
        assert_eq!(rec.pack_width, 0);
        assert_eq!(rec.gridpoints, vec![vec![0.0]]);

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn bitmap_masks_cells() {
        // 2x2 grid, bitmap 0b1001, packed values only for the present cells
        let msg = build_message(2, 2, 0.0, 0, 0, 8, &[10, 40], Some(&[1, 0, 0, 1]));
        let mut reader = Grib1Reader::new(Cursor::new(msg));
        let rec = reader.next_record().unwrap().unwrap();

        assert_eq!(
            rec.gridpoints,
            vec![
                vec![10.0, GRIB_MISSING_VALUE],
                vec![GRIB_MISSING_VALUE, 40.0],
            ]
        );
    }

    #[test]
    fn scale_and_offset_reconstruction() {
        // R = 100.0, E = 3, D = 2, one 4-bit value 5: (100 + 5*8) * 10^-2
        let msg = build_message(1, 1, 100.0, 3, 2, 4, &[5], None);
        let mut reader = Grib1Reader::new(Cursor::new(msg));
        let rec = reader.next_record().unwrap().unwrap();

        assert_eq!(rec.dec_scale, 2);
        assert_eq!(rec.bin_scale, 3);
        assert!((rec.gridpoints[0][0] - 1.40).abs() < 1e-9);
    }

    #[test]
    fn junk_prefix_decodes_to_the_same_record() {
        let msg = build_message(2, 2, 0.0, 0, 0, 8, &[1, 2, 3, 4], None);
        let mut plain = Grib1Reader::new(Cursor::new(msg.clone()));
        let expected = plain.next_record().unwrap().unwrap();

        let mut padded = b"noise GR then some more".to_vec();
        padded.extend_from_slice(&msg);
        let mut reader = Grib1Reader::new(Cursor::new(padded));
        let rec = reader.next_record().unwrap().unwrap();

        assert_eq!(rec.gridpoints, expected.gridpoints);
        assert_eq!(rec.param, expected.param);
        assert_eq!(rec.time, expected.time);
    }

    #[test]
    fn complex_packing_is_fatal() {
        let mut msg = build_message(1, 1, 0.0, 0, 0, 8, &[1], None);
        // flip the complex-packing flag bit in the BDS flag nibble
        let bds_start = 8 + 28 + 32;
        msg[bds_start + 3] |= 0x40;
        let mut reader = Grib1Reader::new(Cursor::new(msg));
        let err = reader.next_record().unwrap_err();
        assert_eq!(
            err,
            GribError::DecodeError(crate::error::DecodeError::ComplexPackingNotSupported)
        );
    }
}
