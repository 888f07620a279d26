use super::ReadAt;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;

/// In-memory archive source, typically the bytes of an uploaded file.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Arc<[u8]>,
}

impl MemoryReader {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_exact_at;

    #[tokio::test]
    async fn reads_are_clamped_to_the_buffer() {
        let reader = MemoryReader::new(b"PK\x05\x06tail".to_vec());
        let mut buf = [0u8; 16];
        let n = reader.read_at(4, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"tail");
        assert_eq!(reader.read_at(100, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_exact_past_end_is_eof() {
        let reader = MemoryReader::new(vec![0u8; 8]);
        let mut buf = [0u8; 4];
        read_exact_at(&reader, 4, &mut buf).await.unwrap();
        let err = read_exact_at(&reader, 6, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
