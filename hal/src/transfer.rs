//! Transfers between the driver and caller-owned memory.
//!
//! Both directions report how many bytes actually moved. A short count is how
//! a platform signals a faulting or truncated caller buffer; callers decide
//! whether a partial transfer is acceptable.

/// Caller-owned memory reachable from a control request.
pub trait UserBuffer {
    /// Copy from the caller into `dst`, returning the number of bytes copied.
    fn copy_from_user(&self, dst: &mut [u8]) -> usize;

    /// Copy `src` back to the caller, returning the number of bytes copied.
    fn copy_to_user(&mut self, src: &[u8]) -> usize;
}

impl UserBuffer for [u8] {
    fn copy_from_user(&self, dst: &mut [u8]) -> usize {
        let len = dst.len().min(self.len());
        dst[..len].copy_from_slice(&self[..len]);
        len
    }

    fn copy_to_user(&mut self, src: &[u8]) -> usize {
        let len = src.len().min(self.len());
        self[..len].copy_from_slice(&src[..len]);
        len
    }
}

impl<const N: usize> UserBuffer for [u8; N] {
    fn copy_from_user(&self, dst: &mut [u8]) -> usize {
        self.as_slice().copy_from_user(dst)
    }

    fn copy_to_user(&mut self, src: &[u8]) -> usize {
        self.as_mut_slice().copy_to_user(src)
    }
}
