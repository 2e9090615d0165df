//! Buffer lifecycle for renders.
//!
//! The only place render code touches the pool: [`new_buffer`] and
//! [`put_buffer`] against the process-wide pool, or a [`Renderer`] bound
//! to an explicit one.

use bytes::{Bytes, BytesMut};
use std::io::Write;

use crate::error::Result;
use crate::node::Node;
use crate::pool::{buffer_pool, BufferPool};

/// Acquire an empty buffer from the global pool, sized by `hint` (0 = no preference).
#[inline]
pub fn new_buffer(hint: usize) -> BytesMut {
    buffer_pool().acquire(hint)
}

/// Return a buffer to the global pool.
#[inline]
pub fn put_buffer(buf: BytesMut) {
    buffer_pool().release(buf)
}

/// Top-level renderer bound to one pool.
#[derive(Clone, Copy)]
pub struct Renderer<'a> {
    pool: &'a BufferPool,
}

impl<'a> Renderer<'a> {
    /// Create a renderer drawing buffers from `pool`.
    pub fn new(pool: &'a BufferPool) -> Self {
        Self { pool }
    }

    /// Acquire an empty buffer sized by `hint`.
    #[inline]
    pub fn new_buffer(&self, hint: usize) -> BytesMut {
        self.pool.acquire(hint)
    }

    /// Return a buffer to this renderer's pool.
    #[inline]
    pub fn put_buffer(&self, buf: BytesMut) {
        self.pool.release(buf)
    }

    /// Render `node` and return an owned copy of its bytes.
    ///
    /// The copy stays valid after the buffer goes back to the pool.
    pub fn render<N: Node + ?Sized>(&self, node: &N) -> Bytes {
        let mut buf = self.pool.guard(node.size_hint());
        node.render_to_buffer(&mut buf);
        Bytes::copy_from_slice(&buf[..])
    }

    /// Render `node` and write it to `w` in a single bulk write.
    ///
    /// The buffer is released whether or not the write succeeds.
    pub fn render_to<N: Node + ?Sized>(&self, node: &N, w: &mut dyn Write) -> Result<()> {
        let mut buf = self.pool.guard(node.size_hint());
        node.render_to_buffer(&mut buf);
        w.write_all(&buf[..])?;
        Ok(())
    }
}

impl Default for Renderer<'static> {
    fn default() -> Self {
        Self::new(buffer_pool())
    }
}

impl std::fmt::Debug for Renderer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer").field("pool", self.pool).finish()
    }
}
