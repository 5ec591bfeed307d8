use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, SeekFrom};

use depot_core::FileHash;

const CHUNK_SIZE: usize = 8 * 1024;

/// Compute the SHA-256 digest of a rewindable stream.
///
/// Reads the stream to its end in fixed-size chunks, never buffering the
/// whole content, then restores the stream's original read position so the
/// caller can re-read the same bytes for persistence. Returns the digest
/// together with the number of bytes hashed.
///
/// Identical byte content always yields an identical digest; this is the
/// basis of deduplication.
///
/// # Errors
///
/// Propagates any read or seek error; no partial digest is ever returned.
pub async fn compute_digest<R>(reader: &mut R) -> Result<(FileHash, u64), std::io::Error>
where
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    let origin = reader.stream_position().await?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }

    reader.seek(SeekFrom::Start(origin)).await?;

    Ok((FileHash::from_digest(hasher.finalize().into()), total))
}
