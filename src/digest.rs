//! Whole-file content digest for exact-duplicate detection.
//!
//! Unrelated to the perceptual hashes: any byte change produces a new digest.

use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::debug;

use crate::config::DIGEST_BLOCK_SIZE;
use crate::error::Result;

/// SHA-1 of the file's raw bytes as 40 uppercase hex characters.
pub fn content_digest(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mut context = Context::new(&SHA1_FOR_LEGACY_USE_ONLY);
    let mut buf = [0u8; DIGEST_BLOCK_SIZE];
    let mut total = 0usize;

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        context.update(&buf[..read]);
        total += read;
    }

    let digest = hex::encode_upper(context.finish());
    debug!("Digest of {} ({} bytes): {}", path.display(), total, digest);
    Ok(digest)
}
