//! Node capability and composite node variants.
//!
//! Every element of a render tree implements [`Node`]. Composition always
//! goes through [`Node::render_to_buffer`], which appends into one shared
//! buffer; [`Node::render`] and [`Node::render_to`] are top-level entry
//! points that borrow a buffer from the pool for the duration of the call.

mod conditional;
mod deferred;
mod element;

pub use conditional::{unless, when, Conditional};
pub use deferred::{Deferred, DeferredList};
pub use element::Tag;

use bytes::{Bytes, BytesMut};
use std::io::Write;
use std::sync::Arc;

use crate::error::Result;
use crate::render::Renderer;

/// Owned, type-erased node.
pub type BoxNode = Box<dyn Node>;

/// Any element of a render tree.
pub trait Node: Send + Sync {
    /// Append this node's serialized bytes to `buf`.
    fn render_to_buffer(&self, buf: &mut BytesMut);

    /// Render through the default pool, returning an owned copy.
    fn render(&self) -> Bytes {
        Renderer::default().render(self)
    }

    /// Render through the default pool and write the result to `w`.
    fn render_to(&self, w: &mut dyn Write) -> Result<()> {
        Renderer::default().render_to(self, w)
    }

    /// Structural children. Composite nodes never expose unevaluated callbacks.
    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }

    /// No-op unless the node carries attributes.
    fn set_attribute(&mut self, _key: &str, _value: &str) {}

    /// Whether content must be re-evaluated on every render.
    /// `None` if the node doesn't say.
    fn is_dynamic(&self) -> Option<bool> {
        None
    }

    /// Expected output size, used to pre-size the top-level buffer.
    fn size_hint(&self) -> usize {
        0
    }

    /// Box this node.
    fn boxed(self) -> BoxNode
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Node that can write its opening and closing tags separately.
pub trait Element: Node {
    /// Write the opening tag and attributes, e.g. `<div class="x">`.
    fn render_open(&self, buf: &mut BytesMut);

    /// Write the closing tag. No-op for void elements.
    fn render_close(&self, buf: &mut BytesMut);
}

/// Wrap a node as a present value.
#[inline]
pub fn some<N: Node + 'static>(node: N) -> Option<BoxNode> {
    Some(Box::new(node))
}

impl<N: Node + ?Sized> Node for Box<N> {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        (**self).render_to_buffer(buf)
    }

    fn render(&self) -> Bytes {
        (**self).render()
    }

    fn children(&self) -> Vec<&dyn Node> {
        (**self).children()
    }

    fn set_attribute(&mut self, key: &str, value: &str) {
        (**self).set_attribute(key, value)
    }

    fn is_dynamic(&self) -> Option<bool> {
        (**self).is_dynamic()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

/// Shared subtree. Attributes can't be set through a shared handle.
impl<N: Node + ?Sized> Node for Arc<N> {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        (**self).render_to_buffer(buf)
    }

    fn render(&self) -> Bytes {
        (**self).render()
    }

    fn children(&self) -> Vec<&dyn Node> {
        (**self).children()
    }

    fn is_dynamic(&self) -> Option<bool> {
        (**self).is_dynamic()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{BufferPool, PoolConfig};
    use crate::text::{raw_text, static_text, text};

    fn example_tree() -> Tag {
        Tag::new("div")
            .child(some(
                Conditional::new(true)
                    .then(some(text("A")))
                    .otherwise(some(text("B"))),
            ))
            .child(some(DeferredList::new(|| {
                vec![some(text("1")), None, some(text("2"))]
            })))
    }

    #[test]
    fn test_end_to_end_concatenation() {
        let cond = Conditional::new(true)
            .then(some(text("A")))
            .otherwise(some(text("B")));
        let list = DeferredList::new(|| vec![some(text("1")), None, some(text("2"))]);

        let pool = BufferPool::new();
        let renderer = Renderer::new(&pool);
        let mut buf = renderer.new_buffer(0);
        cond.render_to_buffer(&mut buf);
        list.render_to_buffer(&mut buf);
        assert_eq!(&buf[..], b"A12");
        renderer.put_buffer(buf);

        assert_eq!(&example_tree().render()[..], b"<div>A12</div>");
    }

    #[test]
    fn test_idempotent_with_and_without_pool() {
        let tree = example_tree();

        for config in [PoolConfig::default(), PoolConfig::disabled()] {
            let pool = BufferPool::with_config(config);
            let renderer = Renderer::new(&pool);
            let first = renderer.render(&tree);
            let second = renderer.render(&tree);
            assert_eq!(first, second);
            assert_eq!(&first[..], b"<div>A12</div>");
        }
    }

    #[test]
    fn test_absence_is_silent() {
        assert!(Conditional::new(false).then(some(text("x"))).render().is_empty());
        assert!(Deferred::new(|| None).render().is_empty());
        assert!(DeferredList::new(|| vec![None, None]).render().is_empty());
        assert!(Tag::new("p").child(None).children().is_empty());
    }

    #[test]
    fn test_render_to_sink() {
        let mut out = Vec::new();
        example_tree().render_to(&mut out).unwrap();
        assert_eq!(out, b"<div>A12</div>");
    }

    #[test]
    fn test_box_and_arc_delegate() {
        let mut boxed: BoxNode = Tag::new("a").boxed();
        boxed.set_attribute("href", "/");
        assert_eq!(&boxed.render()[..], b"<a href=\"/\"></a>");

        let shared = Arc::new(static_text("shared"));
        let wrapper = Deferred::new({
            let shared = shared.clone();
            move || some(shared.clone())
        });
        assert_eq!(&wrapper.render()[..], b"shared");
        assert_eq!(shared.is_dynamic(), Some(false));
    }

    #[test]
    fn test_concurrent_renders_share_pool() {
        let pool = BufferPool::new();
        let trees: Vec<Tag> = (0..8)
            .map(|i| {
                Tag::new("ul").with_children((0..50).map(|j| {
                    some(Tag::new("li").child(some(raw_text(format!("{}-{}", i, j)))))
                }))
            })
            .collect();
        let expected: Vec<Bytes> = trees
            .iter()
            .map(|t| Renderer::new(&BufferPool::with_config(PoolConfig::disabled())).render(t))
            .collect();

        std::thread::scope(|s| {
            for (tree, want) in trees.iter().zip(&expected) {
                let pool = &pool;
                s.spawn(move || {
                    let renderer = Renderer::new(pool);
                    for _ in 0..200 {
                        assert_eq!(&renderer.render(tree), want);
                    }
                });
            }
        });

        assert!(pool.stats().hits > 0);
    }

    #[test]
    fn test_concurrent_renders_during_config_changes() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let pool = BufferPool::new();
        let stop = AtomicBool::new(false);
        let trees: Vec<Tag> = (0..4)
            .map(|i| {
                Tag::new("ol").with_children((0..40 * (i + 1)).map(|j| {
                    some(Tag::new("li").child(some(raw_text(format!("row {} of {}", j, i)))))
                }))
            })
            .collect();
        let expected: Vec<Bytes> = trees.iter().map(|t| t.render()).collect();

        std::thread::scope(|s| {
            let pool = &pool;
            let stop = &stop;
            s.spawn(move || {
                let mut i = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    pool.set_enabled(i % 5 != 0);
                    pool.set_threshold([16, 512, 4096][i % 3]);
                    pool.set_max_pool_size([64, 2048, 1 << 20][i % 3], i % 2 == 0);
                    i += 1;
                }
            });

            let renderers: Vec<_> = trees
                .iter()
                .zip(&expected)
                .map(|(tree, want)| {
                    s.spawn(move || {
                        let renderer = Renderer::new(pool);
                        let mut out = Vec::new();
                        for _ in 0..500 {
                            assert_eq!(&renderer.render(tree), want);
                            out.clear();
                            renderer.render_to(tree, &mut out).unwrap();
                            assert_eq!(&out[..], &want[..]);
                        }
                    })
                })
                .collect();

            let results: Vec<_> = renderers.into_iter().map(|h| h.join()).collect();
            stop.store(true, Ordering::Relaxed);
            assert!(results.iter().all(|r| r.is_ok()));
        });
    }
}
