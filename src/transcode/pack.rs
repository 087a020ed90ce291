//! Edition-1 section packers. Each packer appends one section to the
//! scratch buffer through a [`BitWriter`] positioned at the section start.

use std::sync::Once;

use tracing::warn;

use crate::bits::BitWriter;
use crate::error::ConvertError;
use crate::grib2::{Grib2Grid, Grib2Message, GridGeometry};
use crate::ibmfloat::ieee2ibm;
use crate::transcode::{level, param, timerange};

static ENSEMBLE_NOTICE: Once = Once::new();

pub(super) fn pack_pds(
    msg: &Grib2Message,
    grid: &Grib2Grid,
    w: &mut BitWriter,
) -> Result<(), ConvertError> {
    use chrono::{Datelike, Timelike};

    let md = &grid.metadata;
    let product = &md.product;

    let pds_len: u32 = if product.ensemble.is_some() {
        43
    } else if product.derived.is_some() {
        42
    } else {
        28
    };
    w.append(pds_len, 24)?;
    w.append(3, 8)?; // GRIB1 tables version
    w.append(u32::from(msg.centre_id), 8)?;
    w.append(u32::from(product.generating_process), 8)?;
    // grid definition catalogue number: 255, the GDS is always included
    w.append(255, 8)?;
    let flag = if md.bitmap.is_none() { 0x80 } else { 0xc0 };
    w.append(flag, 8)?;
    let code = param::map_parameter(
        msg.centre_id,
        msg.discipline,
        product.parameter_category,
        product.parameter_number,
    )?;
    w.append(u32::from(code), 8)?;
    let (level_type, level1, level2) = level::map_level(product, msg.centre_id)?;
    w.append(u32::from(level_type), 8)?;
    if product.second_surface.surface_type == 255 {
        w.append(level1 as u32, 16)?;
    } else {
        w.append(level1 as u32, 8)?;
        w.append(level2 as u32, 8)?;
    }
    let year = msg.ref_time.year();
    w.append((year % 100) as u32, 8)?;
    w.append(msg.ref_time.month(), 8)?;
    w.append(msg.ref_time.day(), 8)?;
    w.append(msg.ref_time.hour(), 8)?;
    w.append(msg.ref_time.minute(), 8)?;
    if product.time_unit == 13 {
        warn!("Unable to indicate 'Second' for time unit in GRIB1");
        w.skip(8);
    } else {
        w.append(u32::from(product.time_unit), 8)?;
    }
    let tr = timerange::map_time_range(msg, product, msg.centre_id)?;
    if tr.t_range == 10 {
        w.append(tr.p1 as u32, 16)?;
    } else {
        w.append(tr.p1 as u32, 8)?;
        w.append(tr.p2 as u32, 8)?;
    }
    w.append(u32::from(tr.t_range), 8)?;
    w.append(tr.n_avg as u32, 16)?;
    w.append(tr.n_missing as u32, 8)?;
    w.append((year / 100 + 1) as u32, 8)?;
    w.append(u32::from(msg.sub_centre_id), 8)?;
    w.append_signed(md.packing.dec_scale, 16)?;

    if let Some(ensemble) = &product.ensemble {
        // octets 29-40 are reserved; the ensemble block lands in 41-43
        w.skip(96);
        w.append(u32::from(ensemble.ens_type), 8)?;
        w.append(u32::from(ensemble.perturbation_number), 8)?;
        w.append(u32::from(ensemble.num_forecasts), 8)?;
        ENSEMBLE_NOTICE.call_once(|| {
            warn!(
                "the 'Ensemble type code', the 'Perturbation Number', and the 'Number of \
                 forecasts in ensemble' have been packed in octets 41, 42, and 43 of the \
                 GRIB1 Product Definition Section"
            );
        });
    } else if let Some(derived) = &product.derived {
        w.skip(96);
        w.append(u32::from(derived.code), 8)?;
        w.append(u32::from(derived.num_forecasts), 8)?;
        ENSEMBLE_NOTICE.call_once(|| {
            warn!(
                "the 'Derived forecast code' and the 'Number of forecasts in ensemble' \
                 have been packed in octets 41 and 42 of the GRIB1 Product Definition \
                 Section"
            );
        });
    }
    Ok(())
}

/// Assembles the edition-1 resolution/component octet from the edition-2
/// flags: bit 5 mirrors to "directions given", earth shape 2 turns on the
/// oblate-spheroid bit, bit 3 (uv relative to grid) is carried through.
fn resolution_flags(res_flags: u8, earth_shape: u8) -> u32 {
    let mut rescomp = 0u32;
    if res_flags & 0x20 == 0x20 {
        rescomp |= 0x80;
    }
    if earth_shape == 2 {
        rescomp |= 0x40;
    }
    if res_flags & 0x08 == 0x08 {
        rescomp |= 0x08;
    }
    rescomp
}

pub(super) fn pack_gds(grid: &Grib2Grid, w: &mut BitWriter) -> Result<(), ConvertError> {
    let start = w.offset();
    // NV and PV: no vertical coordinate parameters
    w.put(255, start + 24, 8)?;
    w.put(255, start + 32, 8)?;

    match &grid.metadata.geometry {
        GridGeometry::LatLon(def) => {
            w.put(32, start, 24)?;
            w.put(0, start + 40, 8)?; // data representation: lat/lon
            w.put(def.ni, start + 48, 16)?;
            w.put(def.nj, start + 64, 16)?;
            w.put_signed((def.first_point_lat * 1000.0) as i32, start + 80, 24)?;
            w.put_signed((def.first_point_lon * 1000.0) as i32, start + 104, 24)?;
            w.put(
                resolution_flags(def.resolution_flags, def.earth_shape),
                start + 128,
                8,
            )?;
            w.put_signed((def.last_point_lat * 1000.0) as i32, start + 136, 24)?;
            w.put_signed((def.last_point_lon * 1000.0) as i32, start + 160, 24)?;
            w.put_signed((def.lon_increment * 1000.0) as i32, start + 184, 16)?;
            w.put_signed((def.lat_increment * 1000.0) as i32, start + 200, 16)?;
            w.put(u32::from(def.scanning_mode), start + 216, 8)?;
            // octets 29-32 are reserved
            w.seek(start + 256);
        }
        GridGeometry::Lambert(def) => {
            w.put(42, start, 24)?;
            w.put(3, start + 40, 8)?; // data representation: Lambert conformal
            w.put(def.nx, start + 48, 16)?;
            w.put(def.ny, start + 64, 16)?;
            w.put_signed((def.first_point_lat * 1000.0) as i32, start + 80, 24)?;
            w.put_signed((def.first_point_lon * 1000.0) as i32, start + 104, 24)?;
            w.put(
                resolution_flags(def.resolution_flags, def.earth_shape),
                start + 128,
                8,
            )?;
            w.put_signed((def.lov * 1000.0) as i32, start + 136, 24)?;
            w.put((def.dx + 0.5) as u32, start + 160, 24)?;
            w.put((def.dy + 0.5) as u32, start + 184, 24)?;
            w.put(u32::from(def.projection_centre_flag), start + 208, 8)?;
            w.put(u32::from(def.scanning_mode), start + 216, 8)?;
            w.put_signed((def.latin1 * 1000.0) as i32, start + 224, 24)?;
            w.put_signed((def.latin2 * 1000.0) as i32, start + 248, 24)?;
            w.put_signed((def.south_pole_lat * 1000.0) as i32, start + 272, 24)?;
            w.put_signed((def.south_pole_lon * 1000.0) as i32, start + 296, 24)?;
            // octets 41-42 are reserved
            w.seek(start + 336);
        }
        GridGeometry::Gaussian(_) => {
            return Err(ConvertError::GridTemplateNotMapped(40));
        }
    }
    Ok(())
}

pub(super) fn pack_bms(
    bitmap: &[u8],
    num_points: usize,
    w: &mut BitWriter,
) -> Result<(), ConvertError> {
    let start = w.offset();
    let length = 6 + num_points.div_ceil(8);
    let unused = 8 - (num_points % 8);
    w.append(length as u32, 24)?;
    w.append(unused as u32, 8)?;
    w.append(0, 16)?; // table reference: bitmap follows
    for n in 0..num_points {
        let flag = bitmap.get(n).copied().unwrap_or(0);
        w.append(u32::from(flag), 1)?;
    }
    w.seek(start + length * 8);
    Ok(())
}

pub(super) fn pack_bds(
    grid: &Grib2Grid,
    pvals: &[i64],
    pack_width: usize,
    w: &mut BitWriter,
) -> Result<(), ConvertError> {
    let packing = &grid.metadata.packing;
    let start = w.offset();
    let length = 11 + (pvals.len() * pack_width).div_ceil(8);
    w.append(length as u32, 24)?;
    w.append(0, 4)?; // flag: grid-point data, simple packing
    w.append(((length - 11) * 8 - pvals.len() * pack_width) as u32, 4)?;
    w.append_signed(packing.bin_scale, 16)?;
    // byte-exact IBM reference of R * 10^D, written in network order
    let ibm = ieee2ibm(packing.ref_val * 10f64.powi(packing.dec_scale));
    w.append_bytes(&ibm.to_be_bytes())?;
    w.append(pack_width as u32, 8)?;
    for v in pvals {
        w.append(*v as u32, pack_width)?;
    }
    w.seek(start + length * 8);
    Ok(())
}
