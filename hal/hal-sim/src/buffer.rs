//! Simulated caller memory

use hal::transfer::UserBuffer;

/// Caller buffer whose transfers can be cut short.
///
/// A limit models a caller pointer that faults part-way through the record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimBuffer {
    data: Vec<u8>,
    read_limit: Option<usize>,
    write_limit: Option<usize>,
}

impl SimBuffer {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            read_limit: None,
            write_limit: None,
        }
    }

    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// At most `limit` bytes are copied in from this buffer.
    pub fn limit_reads(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }

    /// At most `limit` bytes are copied out into this buffer.
    pub fn limit_writes(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl UserBuffer for SimBuffer {
    fn copy_from_user(&self, dst: &mut [u8]) -> usize {
        let limit = self.read_limit.unwrap_or(usize::MAX);
        let len = dst.len().min(self.data.len()).min(limit);
        dst[..len].copy_from_slice(&self.data[..len]);
        len
    }

    fn copy_to_user(&mut self, src: &[u8]) -> usize {
        let limit = self.write_limit.unwrap_or(usize::MAX);
        let len = src.len().min(self.data.len()).min(limit);
        self.data[..len].copy_from_slice(&src[..len]);
        len
    }
}
