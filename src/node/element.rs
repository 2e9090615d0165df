use bytes::{BufMut, BytesMut};
use smallvec::SmallVec;
use std::borrow::Cow;

use super::{BoxNode, Element, Node};
use crate::text::{escape_to, text};

/// Generic HTML element: a tag name, ordered attributes and children.
///
/// Attribute values are escaped on output; names are written as given.
pub struct Tag {
    name: Cow<'static, str>,
    attributes: SmallVec<[(String, String); 4]>,
    children: Vec<BoxNode>,
    void: bool,
    size_hint: usize,
}

impl Tag {
    /// Create an empty element.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            attributes: SmallVec::new(),
            children: Vec::new(),
            void: false,
            size_hint: 0,
        }
    }

    /// Element without content or closing tag, e.g. `<br>`.
    pub fn void(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            void: true,
            ..Self::new(name)
        }
    }

    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute, builder style.
    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Current value of an attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a child. `None` is skipped.
    pub fn child(mut self, node: Option<BoxNode>) -> Self {
        self.push(node);
        self
    }

    /// Append children, skipping `None` entries.
    pub fn with_children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = Option<BoxNode>>,
    {
        self.children.extend(nodes.into_iter().flatten());
        self
    }

    /// Append escaped text content.
    pub fn text(self, content: &str) -> Self {
        self.child(Some(Box::new(text(content))))
    }

    /// Append a child in place. `None` is skipped.
    pub fn push(&mut self, node: Option<BoxNode>) {
        if let Some(node) = node {
            self.children.push(node);
        }
    }

    /// Expected rendered size, used as the buffer hint for top-level renders.
    pub fn with_size_hint(mut self, bytes: usize) -> Self {
        self.size_hint = bytes;
        self
    }
}

impl Element for Tag {
    fn render_open(&self, buf: &mut BytesMut) {
        buf.put_u8(b'<');
        buf.put_slice(self.name.as_bytes());
        for (key, value) in &self.attributes {
            buf.put_u8(b' ');
            buf.put_slice(key.as_bytes());
            buf.put_slice(b"=\"");
            escape_to(buf, value);
            buf.put_u8(b'"');
        }
        buf.put_u8(b'>');
    }

    fn render_close(&self, buf: &mut BytesMut) {
        if self.void {
            return;
        }
        buf.put_slice(b"</");
        buf.put_slice(self.name.as_bytes());
        buf.put_u8(b'>');
    }
}

impl Node for Tag {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        self.render_open(buf);
        if !self.void {
            for child in &self.children {
                child.render_to_buffer(buf);
            }
        }
        self.render_close(buf);
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.children.iter().map(|c| &**c).collect()
    }

    /// Sets or overwrites an attribute, keeping first-insertion order.
    fn set_attribute(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => {
                v.clear();
                v.push_str(value);
            }
            None => self.attributes.push((key.to_string(), value.to_string())),
        }
    }

    /// Dynamic unless every child reports static content.
    fn is_dynamic(&self) -> Option<bool> {
        Some(
            self.children
                .iter()
                .any(|c| c.is_dynamic() != Some(false)),
        )
    }

    fn size_hint(&self) -> usize {
        self.size_hint
    }
}
