//! Reconstruction of packed gridpoint values.

pub(crate) mod bitmap;
#[cfg(feature = "jpeg2000-unpack-with-openjpeg")]
pub(crate) mod jpeg2000;
pub(crate) mod simple;
pub(crate) mod stream;

/// Sentinel emitted for gridpoints masked out by a bitmap.
pub const GRIB_MISSING_VALUE: f64 = 1.0e30;
