//! Transcoding of edition-2 messages into edition-1 messages.
//!
//! Every grid of an edition-2 message becomes one self-contained edition-1
//! message: `GRIB` + 24-bit total length + edition octet + PDS + GDS +
//! optional BMS + BDS + `7777`. The sections are assembled in a scratch
//! buffer first, so a failed mapping leaves nothing in the output sink.

use std::io::{Read, Write};

use crate::bits::{BitWriter, set_bits};
use crate::decoder::GRIB_MISSING_VALUE;
use crate::error::{ConvertError, GribError};
use crate::framer::{END_MARKER, MAGIC};
use crate::grib2::{Grib2Grid, Grib2Message, Grib2Reader, GridGeometry};

mod level;
mod pack;
mod param;
mod timerange;

/// Converts edition-2 grids to edition-1 messages.
///
/// The scratch buffer is reused across grids and grows monotonically to
/// the largest grid seen.
#[derive(Default)]
pub struct Grib1Transcoder {
    scratch: Vec<u8>,
}

impl Grib1Transcoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcodes every grid of `msg` into `out`. Returns the number of
    /// edition-1 messages written.
    pub fn transcode_message<W: Write>(
        &mut self,
        msg: &Grib2Message,
        out: &mut W,
    ) -> Result<usize, GribError> {
        for grid in &msg.grids {
            self.transcode_grid(msg, grid, out)?;
        }
        Ok(msg.grids.len())
    }

    /// Decodes edition-2 messages from `reader` until the end of the
    /// stream, transcoding each into `out`. Returns the number of messages
    /// read and edition-1 messages written.
    pub fn transcode_stream<R: Read, W: Write>(
        &mut self,
        reader: R,
        out: &mut W,
    ) -> Result<(usize, usize), GribError> {
        let mut reader = Grib2Reader::new(reader);
        let mut messages = 0;
        let mut grids = 0;
        while let Some(msg) = reader.next_message()? {
            grids += self.transcode_message(&msg, out)?;
            messages += 1;
        }
        Ok((messages, grids))
    }

    fn transcode_grid<W: Write>(
        &mut self,
        msg: &Grib2Message,
        grid: &Grib2Grid,
        out: &mut W,
    ) -> Result<(), GribError> {
        let md = &grid.metadata;

        let pds_len = match md.product.template_num {
            0 | 8 => 28,
            1 | 11 => 43,
            2 | 12 => 42,
            n => return Err(ConvertError::ProductTemplateNotMapped(n).into()),
        };
        let gds_len = match &md.geometry {
            GridGeometry::LatLon(_) => 32,
            GridGeometry::Lambert(_) => 42,
            GridGeometry::Gaussian(_) => {
                return Err(ConvertError::GridTemplateNotMapped(40).into());
            }
        };
        let num_points = md.geometry.num_points();

        let (bms_len, num_to_pack) = match &md.bitmap {
            Some(flags) => (
                6 + num_points.div_ceil(8),
                flags.iter().take(num_points).filter(|f| **f == 1).count(),
            ),
            None => (0, num_points),
        };

        // quantise the non-missing gridpoints and size the pack width to
        // the largest value
        let packing = &md.packing;
        let dec = 10f64.powi(packing.dec_scale);
        let exp = 2f64.powi(packing.bin_scale);
        let mut pvals = Vec::with_capacity(num_to_pack);
        let mut max_pack: i64 = 0;
        for value in &grid.gridpoints {
            if *value != GRIB_MISSING_VALUE {
                let quantised = ((value - packing.ref_val) * dec / exp).round() as i64;
                if quantised > max_pack {
                    max_pack = quantised;
                }
                pvals.push(quantised);
            }
        }
        let mut pack_width = 1usize;
        while pack_width < 32 && ((1u64 << pack_width) - 1) < max_pack as u64 {
            pack_width += 1;
        }

        let bds_len = 11 + (num_to_pack * pack_width).div_ceil(8);
        let length = pds_len + gds_len + bms_len + bds_len;

        if self.scratch.len() < length {
            self.scratch.resize(length, 0);
        }
        self.scratch[..length].fill(0);

        let mut writer = BitWriter::new(&mut self.scratch[..length]);
        pack::pack_pds(msg, grid, &mut writer)?;
        pack::pack_gds(grid, &mut writer)?;
        if let Some(bitmap) = &md.bitmap {
            pack::pack_bms(bitmap, num_points, &mut writer)?;
        }
        pack::pack_bds(grid, &pvals, pack_width, &mut writer)?;

        let write = |out: &mut W, bytes: &[u8]| -> Result<(), ConvertError> {
            out.write_all(bytes).map_err(ConvertError::from)
        };
        write(out, MAGIC)?;
        let mut head = [0u8; 4];
        set_bits(&mut head, (length + 12) as u32, 0, 24).map_err(ConvertError::from)?;
        head[3] = 1; // edition
        write(out, &head)?;
        write(out, &self.scratch[..length])?;
        write(out, END_MARKER)?;
        Ok(())
    }
}
