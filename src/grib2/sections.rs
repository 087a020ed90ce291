//! Edition-2 section parsers. Bit offsets are absolute positions in the
//! message buffer; every section starts byte-aligned.

use chrono::{DateTime, TimeZone, Utc};

use super::{
    DerivedForecast, EnsembleInfo, FixedSurface, GaussianGridDefinition, GridGeometry,
    LambertGridDefinition, LatLonGridDefinition, PackingParam, ProductDefinition, StatEndTime,
    StatisticalProcessing, StatisticalRange,
};
use crate::bits::{get_bits, get_signed};
use crate::error::{DecodeError, GribError, ParseError};

const MICRO: f64 = 1e-6;

pub(super) struct Identification {
    pub(super) centre_id: u16,
    pub(super) sub_centre_id: u16,
    pub(super) master_table_version: u8,
    pub(super) local_table_version: u8,
    pub(super) ref_time_significance: u8,
    pub(super) ref_time: DateTime<Utc>,
    pub(super) prod_status: u8,
    pub(super) data_type: u8,
}

pub(super) fn unpack_ids(
    buf: &[u8],
    offset: usize,
) -> Result<(Identification, usize), GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    let length = bits(offset, 32)? as usize;
    if length < 5 {
        return Err(ParseError::InvalidSectionLength(offset).into());
    }
    let year = bits(offset + 96, 16)?;
    let month = bits(offset + 112, 8)?;
    let day = bits(offset + 120, 8)?;
    let hour = bits(offset + 128, 8)?;
    let minute = bits(offset + 136, 8)?;
    let second = bits(offset + 144, 8)?;
    let ref_time = Utc
        .with_ymd_and_hms(year as i32, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| {
            ParseError::InvalidReferenceTime(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ))
        })?;

    let ids = Identification {
        centre_id: bits(offset + 40, 16)? as u16,
        sub_centre_id: bits(offset + 56, 16)? as u16,
        master_table_version: bits(offset + 72, 8)? as u8,
        local_table_version: bits(offset + 80, 8)? as u8,
        ref_time_significance: bits(offset + 88, 8)? as u8,
        ref_time,
        prod_status: bits(offset + 152, 8)? as u8,
        data_type: bits(offset + 160, 8)? as u8,
    };
    Ok((ids, offset + length * 8))
}

pub(super) fn unpack_gds(buf: &[u8], offset: usize) -> Result<GridGeometry, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };
    let micro_deg = |off: usize| -> Result<f64, ParseError> {
        Ok(f64::from(get_signed(buf, off, 32)?) * MICRO)
    };

    let source = bits(offset + 40, 8)? as u8;
    if source != 0 {
        return Err(DecodeError::PredefinedGridDefinition(source).into());
    }
    let num_in_list = bits(offset + 80, 8)? as u8;
    if num_in_list > 0 {
        return Err(DecodeError::QuasiRegularGrid(num_in_list).into());
    }

    let template_num = bits(offset + 96, 16)? as u16;
    let geometry = match template_num {
        // latitude/longitude and Gaussian grids
        0 | 40 => {
            let earth_shape = bits(offset + 112, 8)? as u8;
            let ni = bits(offset + 240, 32)?;
            let nj = bits(offset + 272, 32)?;
            let first_point_lat = micro_deg(offset + 368)?;
            let first_point_lon = micro_deg(offset + 400)?;
            let resolution_flags = bits(offset + 432, 8)? as u8;
            let last_point_lat = micro_deg(offset + 440)?;
            let last_point_lon = micro_deg(offset + 472)?;
            let lon_increment = f64::from(bits(offset + 504, 32)?) * MICRO;
            let lat_octets = bits(offset + 536, 32)?;
            let scanning_mode = bits(offset + 568, 8)? as u8;
            if template_num == 0 {
                GridGeometry::LatLon(LatLonGridDefinition {
                    earth_shape,
                    ni,
                    nj,
                    first_point_lat,
                    first_point_lon,
                    last_point_lat,
                    last_point_lon,
                    resolution_flags,
                    lon_increment,
                    lat_increment: f64::from(lat_octets) * MICRO,
                    scanning_mode,
                })
            } else {
                GridGeometry::Gaussian(GaussianGridDefinition {
                    earth_shape,
                    ni,
                    nj,
                    first_point_lat,
                    first_point_lon,
                    last_point_lat,
                    last_point_lon,
                    resolution_flags,
                    lon_increment,
                    num_parallels: lat_octets,
                    scanning_mode,
                })
            }
        }
        // Lambert conformal grid
        30 => GridGeometry::Lambert(LambertGridDefinition {
            earth_shape: bits(offset + 112, 8)? as u8,
            nx: bits(offset + 240, 32)?,
            ny: bits(offset + 272, 32)?,
            first_point_lat: micro_deg(offset + 304)?,
            first_point_lon: micro_deg(offset + 336)?,
            resolution_flags: bits(offset + 368, 8)? as u8,
            lad: micro_deg(offset + 376)?,
            lov: micro_deg(offset + 408)?,
            dx: f64::from(bits(offset + 440, 32)?) / 1000.0,
            dy: f64::from(bits(offset + 472, 32)?) / 1000.0,
            projection_centre_flag: bits(offset + 504, 8)? as u8,
            scanning_mode: bits(offset + 512, 8)? as u8,
            latin1: micro_deg(offset + 520)?,
            latin2: micro_deg(offset + 552)?,
            south_pole_lat: micro_deg(offset + 584)?,
            south_pole_lon: micro_deg(offset + 616)?,
        }),
        n => return Err(DecodeError::NotSupported("Grid template", n).into()),
    };
    Ok(geometry)
}

pub(super) fn unpack_pds(buf: &[u8], offset: usize) -> Result<ProductDefinition, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    let num_coords = bits(offset + 40, 16)? as u16;
    if num_coords > 0 {
        return Err(DecodeError::HybridCoordinates(num_coords).into());
    }

    let template_num = bits(offset + 56, 16)? as u16;
    if !matches!(template_num, 0 | 1 | 2 | 8 | 11 | 12) {
        return Err(DecodeError::NotSupported("Product Definition Template", template_num).into());
    }

    let surface = |type_off: usize| -> Result<FixedSurface, ParseError> {
        let surface_type = get_bits(buf, type_off, 8)? as u8;
        let factor = get_bits(buf, type_off + 8, 8)? as i32;
        let value = get_signed(buf, type_off + 16, 32)?;
        Ok(FixedSurface {
            surface_type,
            value: f64::from(value) / 10f64.powi(factor),
        })
    };

    let mut product = ProductDefinition {
        template_num,
        parameter_category: bits(offset + 72, 8)? as u8,
        parameter_number: bits(offset + 80, 8)? as u8,
        generating_process: bits(offset + 88, 8)? as u8,
        time_unit: bits(offset + 136, 8)? as u8,
        forecast_time: bits(offset + 144, 32)?,
        first_surface: surface(offset + 176)?,
        second_surface: surface(offset + 224)?,
        ensemble: None,
        derived: None,
        statistical: None,
    };

    let stat_start = match template_num {
        1 | 11 => {
            product.ensemble = Some(EnsembleInfo {
                ens_type: bits(offset + 272, 8)? as u8,
                perturbation_number: bits(offset + 280, 8)? as u8,
                num_forecasts: bits(offset + 288, 8)? as u8,
            });
            296
        }
        2 | 12 => {
            product.derived = Some(DerivedForecast {
                code: bits(offset + 272, 8)? as u8,
                num_forecasts: bits(offset + 280, 8)? as u8,
            });
            288
        }
        _ => 272,
    };

    if matches!(template_num, 8 | 11 | 12) {
        let start = offset + stat_start;
        let end_time = StatEndTime {
            year: bits(start, 16)? as u16,
            month: bits(start + 16, 8)? as u8,
            day: bits(start + 24, 8)? as u8,
            hour: bits(start + 32, 8)? as u8,
            minute: bits(start + 40, 8)? as u8,
            second: bits(start + 48, 8)? as u8,
        };
        let num_ranges = bits(start + 56, 8)? as usize;
        let num_missing = bits(start + 64, 32)?;
        let mut ranges = Vec::with_capacity(num_ranges);
        let mut off = start + 96;
        for _ in 0..num_ranges {
            ranges.push(StatisticalRange {
                process: bits(off, 8)? as u8,
                increment_type: bits(off + 8, 8)? as u8,
                time_unit: bits(off + 16, 8)? as u8,
                time_length: bits(off + 24, 32)?,
                increment_unit: bits(off + 56, 8)? as u8,
                increment_length: bits(off + 64, 32)?,
            });
            off += 96;
        }
        product.statistical = Some(StatisticalProcessing {
            end_time,
            num_missing,
            ranges,
        });
    }

    Ok(product)
}

pub(super) fn unpack_drs(buf: &[u8], offset: usize) -> Result<PackingParam, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    let num_packed = bits(offset + 40, 32)?;
    let template_num = bits(offset + 72, 16)? as u16;
    if !matches!(template_num, 0 | 40 | 40000) {
        return Err(DecodeError::NotSupported("Data template", template_num).into());
    }

    // the reference value octets are an IEEE-754 binary32 pattern,
    // reinterpreted rather than converted
    let ref_bits = bits(offset + 88, 32)?;
    let mut ref_val = f64::from(f32::from_bits(ref_bits));
    let bin_scale = get_signed(buf, offset + 120, 16).map_err(ParseError::from)?;
    let dec_scale = get_signed(buf, offset + 136, 16).map_err(ParseError::from)?;
    ref_val /= 10f64.powi(dec_scale);
    let num_bits = bits(offset + 152, 8)? as usize;
    let organisation = bits(offset + 160, 8)? as u8;

    // only the simple organisation of a JPEG 2000 payload is decodable;
    // anything else must fail rather than be unpacked as if it were simple
    if matches!(template_num, 40 | 40000) && organisation != 0 {
        return Err(
            DecodeError::NotSupported("JPEG 2000 organisation", u16::from(organisation)).into(),
        );
    }

    Ok(PackingParam {
        template_num,
        num_packed,
        ref_val,
        bin_scale,
        dec_scale,
        num_bits,
        organisation,
    })
}

pub(super) enum BmsAction {
    Set(Vec<u8>),
    Keep,
    Clear,
}

pub(super) fn unpack_bms(buf: &[u8], offset: usize) -> Result<BmsAction, GribError> {
    let bits = |off: usize, n: usize| -> Result<u32, ParseError> {
        get_bits(buf, off, n).map_err(ParseError::from)
    };

    let indicator = bits(offset + 40, 8)?;
    match indicator {
        0 => {
            let length = bits(offset, 32)? as usize;
            let nbits = length
                .checked_sub(6)
                .ok_or(ParseError::InvalidSectionLength(offset))?
                * 8;
            let mut flags = Vec::with_capacity(nbits);
            for n in 0..nbits {
                flags.push(bits(offset + 48 + n, 1)? as u8);
            }
            Ok(BmsAction::Set(flags))
        }
        254 => Ok(BmsAction::Keep),
        255 => Ok(BmsAction::Clear),
        n => Err(DecodeError::PredefinedBitmap(n as u16).into()),
    }
}
