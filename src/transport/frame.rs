// Length-prefixed framing: `len: u32 LE || payload[len]`.
use crate::errors::CoreError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Read exactly one frame. Loops internally (via `read_exact`) so short reads never surface
/// a partial frame to the caller. Returns `Ok(None)` on a clean EOF before any bytes of the
/// next frame arrive; a partial length prefix is an I/O error (unexpected EOF).
pub async fn read_frame<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_bytes: u32,
) -> Result<Option<Vec<u8>>, CoreError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf);
    if len > max_frame_bytes {
        return Err(CoreError::FrameTooLarge {
            len: len as u64,
            max: max_frame_bytes,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Write one frame atomically from the peer's perspective: header then payload, one flush.
/// Callers serialize concurrent writers on the same connection through a dedicated queue so
/// two frames' bytes never interleave.
pub async fn write_frame<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), CoreError> {
    let len = payload.len() as u32;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello world").await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let frame = read_frame(&mut cursor, 1024).await.unwrap();
        assert_eq!(frame, Some(b"hello world".to_vec()));
    }

    #[tokio::test]
    async fn rejects_oversized_length_prefix() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        let mut cursor = std::io::Cursor::new(buf);

        let err = read_frame(&mut cursor, 1024).await.unwrap_err();
        assert_eq!(err.error_code(), "FRAME_TOO_LARGE");
    }

    #[tokio::test]
    async fn clean_eof_before_next_frame_is_none() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let frame = read_frame(&mut cursor, 1024).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn short_read_mid_frame_is_an_error() {
        // A length prefix claiming 10 bytes but only 3 follow.
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(&[1, 2, 3]);
        let mut cursor = std::io::Cursor::new(buf);

        assert!(read_frame(&mut cursor, 1024).await.is_err());
    }

    #[tokio::test]
    async fn multiple_frames_read_back_in_order() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[1u8; 50]).await.unwrap();
        write_frame(&mut buf, &[2u8; 30]).await.unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let first = read_frame(&mut cursor, 1024).await.unwrap().unwrap();
        let second = read_frame(&mut cursor, 1024).await.unwrap().unwrap();
        assert_eq!(first, vec![1u8; 50]);
        assert_eq!(second, vec![2u8; 30]);
    }
}
