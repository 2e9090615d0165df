pub mod config;
pub mod error;
pub mod node;
pub mod pool;
pub mod render;
pub mod security;
pub mod text;

pub use error::{Error, Result};
pub use node::{BoxNode, Element, Node};
pub use pool::{buffer_pool, BufferPool, PoolConfig};
pub use render::{new_buffer, put_buffer, Renderer};
