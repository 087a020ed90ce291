use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

use crate::bits::BitFieldError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GribError {
    InternalDataError,
    ParseError(ParseError),
    DecodeError(DecodeError),
    ConvertError(ConvertError),
}

impl Error for GribError {}

impl From<ParseError> for GribError {
    fn from(e: ParseError) -> Self {
        Self::ParseError(e)
    }
}

impl From<DecodeError> for GribError {
    fn from(e: DecodeError) -> Self {
        Self::DecodeError(e)
    }
}

impl From<ConvertError> for GribError {
    fn from(e: ConvertError) -> Self {
        Self::ConvertError(e)
    }
}

impl From<BitFieldError> for GribError {
    fn from(e: BitFieldError) -> Self {
        Self::ParseError(e.into())
    }
}

impl Display for GribError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InternalDataError => write!(f, "Something unexpected happened"),
            Self::ParseError(e) => write!(f, "{e}"),
            Self::DecodeError(e) => write!(f, "{e}"),
            Self::ConvertError(e) => write!(f, "{e}"),
        }
    }
}

/// Errors in framing and sectioning a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseError {
    ReadError(String),
    GRIBVersionMismatch(u8),
    UnexpectedEndOfData(usize),
    InvalidSectionLength(usize),
    FieldWidthTooLarge(usize),
    InvalidReferenceTime(String),
}

impl Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ReadError(s) => write!(f, "Read error: {s}"),
            Self::GRIBVersionMismatch(i) => write!(f, "Unexpected GRIB edition: {i}"),
            Self::UnexpectedEndOfData(i) => write!(f, "Unexpected end of data at bit {i}"),
            Self::InvalidSectionLength(i) => write!(f, "Invalid section length at bit {i}"),
            Self::FieldWidthTooLarge(n) => {
                write!(f, "Error: unpacking {n} bits into a 32-bit field")
            }
            Self::InvalidReferenceTime(s) => write!(f, "Invalid reference time: {s}"),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::ReadError(e.to_string())
    }
}

impl From<BitFieldError> for ParseError {
    fn from(e: BitFieldError) -> Self {
        match e {
            BitFieldError::WidthTooLarge(n) => Self::FieldWidthTooLarge(n),
            BitFieldError::OutOfBounds { offset, .. } => Self::UnexpectedEndOfData(offset),
        }
    }
}

/// Errors in decoding section contents and packed gridpoint values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeError {
    NotSupported(&'static str, u16),
    ComplexPackingNotSupported,
    PredefinedGridDefinition(u8),
    QuasiRegularGrid(u8),
    HybridCoordinates(u16),
    PredefinedBitmap(u16),
    NoGridDefinition,
    LengthMismatch,
    Jpeg2000CodestreamError(String),
}

impl Error for DecodeError {}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NotSupported(entity, value) => {
                write!(f, "{entity} {value} is not understood")
            }
            Self::ComplexPackingNotSupported => {
                write!(f, "Error: complex packing not currently supported")
            }
            Self::PredefinedGridDefinition(n) => {
                write!(f, "Don't recognize predetermined grid definition {n}")
            }
            Self::QuasiRegularGrid(n) => {
                write!(f, "Unable to unpack quasi-regular grids ({n} entries in list)")
            }
            Self::HybridCoordinates(n) => {
                write!(f, "Unable to decode hybrid coordinates ({n} coordinate values)")
            }
            Self::PredefinedBitmap(n) => {
                write!(f, "Error: unknown pre-defined bit-map {n}")
            }
            Self::NoGridDefinition => {
                write!(f, "Grid Definition Section not found before the Data Section")
            }
            Self::LengthMismatch => {
                write!(f, "Data length does not match the grid definition")
            }
            Self::Jpeg2000CodestreamError(s) => {
                write!(f, "JPEG 2000 code stream decoding failed: {s}")
            }
        }
    }
}

impl From<String> for DecodeError {
    fn from(value: String) -> Self {
        Self::Jpeg2000CodestreamError(value)
    }
}

impl From<&str> for DecodeError {
    fn from(value: &str) -> Self {
        Self::Jpeg2000CodestreamError(value.to_owned())
    }
}

impl From<BitFieldError> for DecodeError {
    fn from(e: BitFieldError) -> Self {
        match e {
            BitFieldError::WidthTooLarge(_) | BitFieldError::OutOfBounds { .. } => {
                Self::LengthMismatch
            }
        }
    }
}

/// Errors in mapping an edition-2 grid onto edition-1 codes.
///
/// The `Display` texts name the unmappable entity so that a caller can tell
/// exactly which parameter, level or time range has no edition-1
/// counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConvertError {
    ParameterNotMapped(&'static str),
    ParameterCodeNotMapped {
        discipline: u8,
        category: u8,
        number: u8,
    },
    HeterogeneousLevelTypes(u8, u8),
    LevelNotMapped(u8),
    LevelNamedNotMapped(&'static str),
    EndTimeUnitNotMapped(u8),
    StatisticalProcessNotMapped(u8),
    NcepStatisticalProcessNotMapped(u8),
    MultipleStatisticalProcesses(usize),
    DiscreteProcessing,
    ProductTemplateNotMapped(u16),
    GridTemplateNotMapped(u16),
    WriteError(String),
}

impl Error for ConvertError {}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ParameterNotMapped(name) => {
                write!(f, "There is no GRIB1 parameter code for '{name}'")
            }
            Self::ParameterCodeNotMapped {
                discipline,
                category,
                number,
            } => {
                write!(
                    f,
                    "There is no GRIB1 parameter code for discipline {discipline}, \
                     parameter category {category}, parameter number {number}"
                )
            }
            Self::HeterogeneousLevelTypes(t1, t2) => {
                write!(
                    f,
                    "Unable to indicate a layer bounded by different level types \
                     {t1} and {t2} in GRIB1"
                )
            }
            Self::LevelNotMapped(t) => {
                write!(f, "There is no GRIB1 level code for level type {t}")
            }
            Self::LevelNamedNotMapped(name) => {
                write!(f, "There is no GRIB1 level code for '{name}'")
            }
            Self::EndTimeUnitNotMapped(u) => {
                write!(f, "Unable to map end time with units {u} to GRIB1")
            }
            Self::StatisticalProcessNotMapped(c) => {
                write!(f, "Unable to map statistical process {c} to GRIB1")
            }
            Self::NcepStatisticalProcessNotMapped(c) => {
                write!(f, "Unable to map NCEP statistical process code {c} to GRIB1")
            }
            Self::MultipleStatisticalProcesses(n) => {
                write!(f, "Unable to map {n} statistical processes to GRIB1")
            }
            Self::DiscreteProcessing => {
                write!(f, "Unable to map discrete processing to GRIB1")
            }
            Self::ProductTemplateNotMapped(n) => {
                write!(f, "Unable to map Product Definition Template {n} into GRIB1")
            }
            Self::GridTemplateNotMapped(n) => {
                write!(f, "Unable to map Grid Definition Template {n} into GRIB1")
            }
            Self::WriteError(s) => write!(f, "Write error: {s}"),
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(e: io::Error) -> Self {
        Self::WriteError(e.to_string())
    }
}

impl From<BitFieldError> for ConvertError {
    fn from(e: BitFieldError) -> Self {
        Self::WriteError(e.to_string())
    }
}
