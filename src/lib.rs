#![cfg_attr(docsrs, feature(doc_cfg))]

//! A codec for the WMO GRIdded Binary (GRIB) data interchange format.
//!
//! The crate frames GRIB messages out of a byte stream, decodes editions 1
//! and 2 into grids of `f64` values, and transcodes edition-2 messages
//! into edition-1 messages for consumers that only understand the older
//! edition.

pub mod bits;
pub mod ibmfloat;

mod decoder;
mod error;
mod framer;
mod grib1;
mod grib2;
mod helpers;
mod transcode;

pub use crate::{
    decoder::GRIB_MISSING_VALUE, error::*, framer::*, grib1::*, grib2::*, transcode::*,
};
