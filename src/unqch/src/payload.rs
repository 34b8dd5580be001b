//! Stored document payloads
//!
//! `FileDataTable.Data` holds a 4-byte tag followed by a zlib stream of the
//! original file. The tag is not interpreted.

use flate2::{Decompress, FlushDecompress, Status};

/// Size of the tag preceding the zlib stream
pub const PAYLOAD_HEADER_SIZE: usize = 4;

/// Output growth step while inflating
const INFLATE_CHUNK: usize = 32 * 1024;

/// Errors from payload decompression
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Payload of {len} bytes is shorter than its 4-byte header")]
    Truncated { len: usize },

    #[error("Failed to inflate payload: {0}")]
    Inflate(#[from] flate2::DecompressError),

    #[error("Compressed stream ends early after {consumed} bytes")]
    Incomplete { consumed: u64 },
}

/// Strip the payload header and inflate the remainder
pub fn decompress(payload: &[u8]) -> Result<Vec<u8>, PayloadError> {
    if payload.len() < PAYLOAD_HEADER_SIZE {
        return Err(PayloadError::Truncated { len: payload.len() });
    }

    inflate(&payload[PAYLOAD_HEADER_SIZE..])
}

/// Inflate a complete zlib stream
///
/// Unlike `ZlibDecoder`, a stream that runs out of input before its end
/// marker is an error rather than a short read.
fn inflate(stream: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let mut inflater = Decompress::new(true);
    let mut data = Vec::with_capacity(stream.len().saturating_mul(4).max(INFLATE_CHUNK));

    loop {
        if data.capacity() - data.len() < INFLATE_CHUNK {
            data.reserve(INFLATE_CHUNK);
        }

        let consumed = inflater.total_in();
        let produced = inflater.total_out();
        let input = &stream[consumed as usize..];

        match inflater.decompress_vec(input, &mut data, FlushDecompress::None)? {
            Status::StreamEnd => return Ok(data),
            Status::Ok | Status::BufError => {
                // Output space was available, so no progress means no more input
                if inflater.total_in() == consumed && inflater.total_out() == produced {
                    return Err(PayloadError::Incomplete { consumed });
                }
            }
        }
    }
}
