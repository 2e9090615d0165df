use bytes::BytesMut;

use super::{BoxNode, Node};

type NodeFn = dyn Fn() -> Option<BoxNode> + Send + Sync;
type NodesFn = dyn Fn() -> Vec<Option<BoxNode>> + Send + Sync;

/// Node produced by a callback at render time.
///
/// The callback runs once per render, inline, on the rendering thread.
/// Returning `None` renders nothing.
pub struct Deferred {
    f: Box<NodeFn>,
}

impl Deferred {
    /// Create a node that calls `f` on every render.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Option<BoxNode> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

impl Node for Deferred {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        if let Some(node) = (self.f)() {
            node.render_to_buffer(buf);
        }
    }

    fn is_dynamic(&self) -> Option<bool> {
        Some(true)
    }
}

/// Sequence of nodes produced by a callback at render time.
///
/// Useful for loops over request data. `None` entries are skipped.
///
/// ```
/// use fluent::node::{some, DeferredList, Node};
/// use fluent::text::text;
///
/// let items = vec!["a", "b"];
/// let list = DeferredList::new(move || items.iter().map(|i| some(text(i))).collect());
/// assert_eq!(&list.render()[..], b"ab");
/// ```
pub struct DeferredList {
    f: Box<NodesFn>,
}

impl DeferredList {
    /// Create a node that calls `f` on every render and renders each result.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Vec<Option<BoxNode>> + Send + Sync + 'static,
    {
        Self { f: Box::new(f) }
    }
}

impl Node for DeferredList {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        for node in (self.f)().iter().flatten() {
            node.render_to_buffer(buf);
        }
    }

    fn is_dynamic(&self) -> Option<bool> {
        Some(true)
    }
}
