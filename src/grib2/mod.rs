//! Decoder for GRIB edition 2 messages.

use std::io::Read;

use chrono::{DateTime, Utc};
use num_enum::FromPrimitive;

use crate::bits::get_bits;
use crate::error::{DecodeError, GribError, ParseError};
use crate::framer::{END_MARKER, MessageFrame, read_frame};

mod ds;
mod sections;

/// GRIB master table number (code table 0.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Discipline {
    Meteorology = 0,
    Hydrology = 1,
    LandSurface = 2,
    Oceanography = 10,
    #[num_enum(catch_all)]
    Other(u8),
}

/// One edition-2 message: identification metadata and one or more grids.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub discipline: u8,
    pub total_len: usize,
    pub centre_id: u16,
    pub sub_centre_id: u16,
    pub master_table_version: u8,
    pub local_table_version: u8,
    pub ref_time_significance: u8,
    pub ref_time: DateTime<Utc>,
    pub prod_status: u8,
    pub data_type: u8,
    /// Verbatim bytes of the Local Use Section, if present.
    pub local_use: Option<Vec<u8>>,
    pub grids: Vec<Grib2Grid>,
}

impl Grib2Message {
    pub fn discipline_kind(&self) -> Discipline {
        Discipline::from(self.discipline)
    }
}

/// One grid of a message: its metadata snapshot and the unpacked values in
/// scanning order, with masked cells holding
/// [`GRIB_MISSING_VALUE`](crate::GRIB_MISSING_VALUE).
#[derive(Debug, Clone)]
pub struct Grib2Grid {
    pub metadata: GridMetadata,
    pub gridpoints: Vec<f64>,
}

/// The metadata sections in effect when a grid's Data Section was reached.
///
/// A message may carry several grids that share earlier sections; each grid
/// receives a snapshot of the metadata current at its Data Section.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMetadata {
    pub geometry: GridGeometry,
    pub product: ProductDefinition,
    pub packing: PackingParam,
    /// Expanded bitmap: one 0/1 flag per cell, scanning order.
    pub bitmap: Option<Vec<u8>>,
}

/// Grid geometry, discriminated by the grid definition template number.
#[derive(Debug, Clone, PartialEq)]
pub enum GridGeometry {
    /// Template 3.0.
    LatLon(LatLonGridDefinition),
    /// Template 3.40.
    Gaussian(GaussianGridDefinition),
    /// Template 3.30.
    Lambert(LambertGridDefinition),
}

impl GridGeometry {
    pub fn template_num(&self) -> u16 {
        match self {
            Self::LatLon(_) => 0,
            Self::Gaussian(_) => 40,
            Self::Lambert(_) => 30,
        }
    }

    /// `(nx, ny)` of the grid.
    pub fn grid_shape(&self) -> (usize, usize) {
        match self {
            Self::LatLon(def) => (def.ni as usize, def.nj as usize),
            Self::Gaussian(def) => (def.ni as usize, def.nj as usize),
            Self::Lambert(def) => (def.nx as usize, def.ny as usize),
        }
    }

    pub fn num_points(&self) -> usize {
        let (nx, ny) = self.grid_shape();
        nx * ny
    }
}

/// Regular latitude/longitude grid (template 3.0). Coordinates are in
/// degrees, converted from the encoded micro-degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGridDefinition {
    pub earth_shape: u8,
    pub ni: u32,
    pub nj: u32,
    pub first_point_lat: f64,
    pub first_point_lon: f64,
    pub last_point_lat: f64,
    pub last_point_lon: f64,
    pub resolution_flags: u8,
    pub lon_increment: f64,
    pub lat_increment: f64,
    pub scanning_mode: u8,
}

/// Gaussian grid (template 3.40). The latitude-increment octets carry the
/// number of parallels between the equator and the pole.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianGridDefinition {
    pub earth_shape: u8,
    pub ni: u32,
    pub nj: u32,
    pub first_point_lat: f64,
    pub first_point_lon: f64,
    pub last_point_lat: f64,
    pub last_point_lon: f64,
    pub resolution_flags: u8,
    pub lon_increment: f64,
    pub num_parallels: u32,
    pub scanning_mode: u8,
}

/// Lambert conformal grid (template 3.30). Grid lengths are in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertGridDefinition {
    pub earth_shape: u8,
    pub nx: u32,
    pub ny: u32,
    pub first_point_lat: f64,
    pub first_point_lon: f64,
    pub resolution_flags: u8,
    pub lad: f64,
    pub lov: f64,
    pub dx: f64,
    pub dy: f64,
    pub projection_centre_flag: u8,
    pub scanning_mode: u8,
    pub latin1: f64,
    pub latin2: f64,
    pub south_pole_lat: f64,
    pub south_pole_lon: f64,
}

/// Product definition (templates 4.0, 4.1, 4.2, 4.8, 4.11 and 4.12).
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    pub template_num: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub generating_process: u8,
    pub time_unit: u8,
    pub forecast_time: u32,
    pub first_surface: FixedSurface,
    pub second_surface: FixedSurface,
    pub ensemble: Option<EnsembleInfo>,
    pub derived: Option<DerivedForecast>,
    pub statistical: Option<StatisticalProcessing>,
}

/// A fixed surface: type code and value, the latter already scaled by the
/// encoded decimal factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSurface {
    pub surface_type: u8,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleInfo {
    pub ens_type: u8,
    pub perturbation_number: u8,
    pub num_forecasts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedForecast {
    pub code: u8,
    pub num_forecasts: u8,
}

/// Statistical processing block of templates 4.8/4.11/4.12.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticalProcessing {
    pub end_time: StatEndTime,
    pub num_missing: u32,
    pub ranges: Vec<StatisticalRange>,
}

/// End of the overall statistical time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEndTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticalRange {
    pub process: u8,
    pub increment_type: u8,
    pub time_unit: u8,
    pub time_length: u32,
    pub increment_unit: u8,
    pub increment_length: u32,
}

/// Data representation (templates 5.0, 5.40 and 5.40000).
#[derive(Debug, Clone, PartialEq)]
pub struct PackingParam {
    pub template_num: u16,
    pub num_packed: u32,
    /// Reference value, already divided by `10^D`.
    pub ref_val: f64,
    pub bin_scale: i32,
    pub dec_scale: i32,
    pub num_bits: usize,
    pub organisation: u8,
}

/// Pulls edition-2 messages out of a byte stream, resynchronising on the
/// `GRIB` marker between messages.
pub struct Grib2Reader<R> {
    reader: R,
}

impl<R: Read> Grib2Reader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decodes the next message. Returns `Ok(None)` at the end of the
    /// stream.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, GribError> {
        let frame = match read_frame(&mut self.reader)? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        decode_message(frame).map(Some)
    }
}

impl<R: Read> Iterator for Grib2Reader<R> {
    type Item = Result<Grib2Message, GribError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}

fn section_header(buf: &[u8], offset: usize) -> Result<Option<(usize, u8)>, ParseError> {
    let start = offset / 8;
    let marker = buf
        .get(start..start + 4)
        .ok_or(ParseError::UnexpectedEndOfData(offset))?;
    if marker == END_MARKER {
        return Ok(None);
    }
    let len = get_bits(buf, offset, 32)? as usize;
    let num = get_bits(buf, offset + 32, 8)? as u8;
    if len < 5 {
        return Err(ParseError::InvalidSectionLength(offset));
    }
    Ok(Some((len, num)))
}

fn decode_message(frame: MessageFrame) -> Result<Grib2Message, GribError> {
    if frame.edition != 2 {
        return Err(ParseError::GRIBVersionMismatch(frame.edition).into());
    }
    let buf = &frame.buf;
    let discipline = get_bits(buf, 48, 8).map_err(ParseError::from)? as u8;

    let mut offset = 128;
    let (ids, new_offset) = sections::unpack_ids(buf, offset)?;
    offset = new_offset;

    // first pass: count the Data Sections so the grid vector can be sized
    let num_grids = {
        let mut count = 0;
        let mut off = offset;
        while let Some((len, num)) = section_header(buf, off)? {
            if num == 7 {
                count += 1;
            }
            off += len * 8;
        }
        count
    };

    let mut msg = Grib2Message {
        discipline,
        total_len: frame.total_len,
        centre_id: ids.centre_id,
        sub_centre_id: ids.sub_centre_id,
        master_table_version: ids.master_table_version,
        local_table_version: ids.local_table_version,
        ref_time_significance: ids.ref_time_significance,
        ref_time: ids.ref_time,
        prod_status: ids.prod_status,
        data_type: ids.data_type,
        local_use: None,
        grids: Vec::with_capacity(num_grids),
    };

    let mut geometry: Option<GridGeometry> = None;
    let mut product: Option<ProductDefinition> = None;
    let mut packing: Option<PackingParam> = None;
    let mut bitmap: Option<Vec<u8>> = None;

    while let Some((len, num)) = section_header(buf, offset)? {
        match num {
            2 => {
                let start = offset / 8;
                let body = buf
                    .get(start + 5..start + len)
                    .ok_or(ParseError::UnexpectedEndOfData(offset))?;
                msg.local_use = Some(body.to_vec());
            }
            3 => geometry = Some(sections::unpack_gds(buf, offset)?),
            4 => product = Some(sections::unpack_pds(buf, offset)?),
            5 => packing = Some(sections::unpack_drs(buf, offset)?),
            6 => match sections::unpack_bms(buf, offset)? {
                sections::BmsAction::Set(flags) => bitmap = Some(flags),
                sections::BmsAction::Keep => {}
                sections::BmsAction::Clear => bitmap = None,
            },
            7 => {
                let metadata = GridMetadata {
                    geometry: geometry.clone().ok_or(DecodeError::NoGridDefinition)?,
                    product: product.clone().ok_or(GribError::InternalDataError)?,
                    packing: packing.clone().ok_or(GribError::InternalDataError)?,
                    bitmap: bitmap.clone(),
                };
                let gridpoints = ds::unpack_ds(buf, offset, &metadata)?;
                msg.grids.push(Grib2Grid {
                    metadata,
                    gridpoints,
                });
            }
            _ => {}
        }
        offset += len * 8;
    }

    Ok(msg)
}
