//! JPEG 2000 code stream decoding for data representation templates 5.40
//! and 5.40000, on top of OpenJPEG.
//!
//! GRIB2 embeds a raw J2K code stream whose single grayscale component
//! carries one quantised integer per encoded gridpoint. The expected
//! gridpoint count is known from the grid definition, so the decoded
//! component is checked against it rather than trusted.

use std::ffi::c_void;
use std::ptr;

use openjpeg_sys as opj;

use crate::error::DecodeError;

/// Read cursor handed to OpenJPEG through its user-data pointer. Owns a
/// copy of the payload so its address stays valid for the whole decode.
struct ByteSource {
    buf: Vec<u8>,
    pos: usize,
}

extern "C" fn source_read(dest: *mut c_void, nbytes: usize, user: *mut c_void) -> usize {
    let source = unsafe { &mut *(user as *mut ByteSource) };
    let wanted = nbytes.min(source.buf.len().saturating_sub(source.pos));
    if dest.is_null() || wanted == 0 {
        // OpenJPEG takes usize::MAX as its end-of-stream marker
        return usize::MAX;
    }
    unsafe {
        ptr::copy_nonoverlapping(
            source.buf.as_ptr().add(source.pos),
            dest as *mut u8,
            wanted,
        );
    }
    source.pos += wanted;
    wanted
}

extern "C" fn source_skip(nbytes: i64, user: *mut c_void) -> i64 {
    let source = unsafe { &mut *(user as *mut ByteSource) };
    let skipped = (nbytes.max(0) as usize).min(source.buf.len() - source.pos);
    source.pos += skipped;
    skipped as i64
}

extern "C" fn source_seek(position: i64, user: *mut c_void) -> i32 {
    let source = unsafe { &mut *(user as *mut ByteSource) };
    if position < 0 || position as usize > source.buf.len() {
        return 0;
    }
    source.pos = position as usize;
    1
}

extern "C" fn source_release(user: *mut c_void) {
    drop(unsafe { Box::from_raw(user as *mut ByteSource) });
}

/// The OpenJPEG handles of one decode, released in reverse order of
/// creation whichever way the decode exits.
struct DecodeSession {
    stream: *mut opj::opj_stream_t,
    codec: *mut opj::opj_codec_t,
    image: *mut opj::opj_image_t,
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        unsafe {
            if !self.image.is_null() {
                opj::opj_image_destroy(self.image);
            }
            if !self.codec.is_null() {
                opj::opj_destroy_codec(self.codec);
            }
            if !self.stream.is_null() {
                opj::opj_stream_destroy(self.stream);
            }
        }
    }
}

fn stage_failed(stage: &str) -> DecodeError {
    DecodeError::Jpeg2000CodestreamError(format!("{stage} failed"))
}

/// Decodes a raw J2K code stream into `expected_points` quantised
/// integers.
pub(crate) fn decode_codestream(
    payload: &[u8],
    expected_points: usize,
) -> Result<Vec<i32>, DecodeError> {
    let mut session = DecodeSession {
        stream: ptr::null_mut(),
        codec: ptr::null_mut(),
        image: ptr::null_mut(),
    };
    let source = Box::new(ByteSource {
        buf: payload.to_vec(),
        pos: 0,
    });

    unsafe {
        session.stream = opj::opj_stream_default_create(1);
        if session.stream.is_null() {
            return Err(stage_failed("stream allocation"));
        }
        opj::opj_stream_set_user_data(
            session.stream,
            Box::into_raw(source) as *mut c_void,
            Some(source_release),
        );
        opj::opj_stream_set_user_data_length(session.stream, payload.len() as u64);
        opj::opj_stream_set_read_function(session.stream, Some(source_read));
        opj::opj_stream_set_skip_function(session.stream, Some(source_skip));
        opj::opj_stream_set_seek_function(session.stream, Some(source_seek));

        session.codec = opj::opj_create_decompress(opj::OPJ_CODEC_FORMAT::OPJ_CODEC_J2K);
        if session.codec.is_null() {
            return Err(stage_failed("codec allocation"));
        }
        let mut params = std::mem::zeroed::<opj::opj_dparameters>();
        opj::opj_set_default_decoder_parameters(&mut params);
        if opj::opj_setup_decoder(session.codec, &mut params) != 1 {
            return Err(stage_failed("decoder setup"));
        }

        if opj::opj_read_header(session.stream, session.codec, &mut session.image) != 1
            || session.image.is_null()
        {
            return Err(stage_failed("code stream header"));
        }
        if opj::opj_decode(session.codec, session.stream, session.image) != 1 {
            return Err(stage_failed("code stream body"));
        }

        let image = &*session.image;
        if image.numcomps != 1 || image.comps.is_null() {
            return Err(DecodeError::Jpeg2000CodestreamError(format!(
                "expected a single grayscale component, found {}",
                image.numcomps
            )));
        }
        let component = &*image.comps;
        let size = component.w as usize * component.h as usize;
        if component.data.is_null() {
            return Err(stage_failed("component readout"));
        }
        if size != expected_points {
            return Err(DecodeError::Jpeg2000CodestreamError(format!(
                "code stream carries {size} values for {expected_points} gridpoints"
            )));
        }
        Ok(std::slice::from_raw_parts(component.data, size).to_vec())
    }
}
