//! Literal text nodes.
//!
//! Escaping happens once, when the node is built. Rendering copies the
//! stored bytes verbatim.

use bytes::{BufMut, BytesMut};
use std::borrow::Cow;
use std::fmt;

use crate::node::Node;

/// Text content, either HTML-escaped or raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    content: Cow<'static, str>,
    dynamic: bool,
}

impl TextNode {
    /// Stored content, already escaped if built with [`text`].
    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// Escaped text. Marked dynamic.
///
/// `<`, `>`, `&`, `'` and `"` are replaced by entities.
pub fn text(content: impl AsRef<str>) -> TextNode {
    TextNode {
        content: Cow::Owned(escape(content.as_ref()).into_owned()),
        dynamic: true,
    }
}

/// Unescaped text for trusted markup. Marked dynamic.
pub fn raw_text(content: impl Into<Cow<'static, str>>) -> TextNode {
    TextNode {
        content: content.into(),
        dynamic: true,
    }
}

/// Unescaped text that never changes between renders.
pub fn static_text(content: impl Into<Cow<'static, str>>) -> TextNode {
    TextNode {
        content: content.into(),
        dynamic: false,
    }
}

/// Escaped, formatted text. See [`textf!`](crate::textf).
pub fn text_fmt(args: fmt::Arguments<'_>) -> TextNode {
    match args.as_str() {
        Some(s) => text(s),
        None => text(args.to_string()),
    }
}

/// Unescaped, formatted text. See [`raw_textf!`](crate::raw_textf).
pub fn raw_text_fmt(args: fmt::Arguments<'_>) -> TextNode {
    raw_text(args.to_string())
}

/// Escaped text from a format string: `textf!("Hello, {}!", name)`.
#[macro_export]
macro_rules! textf {
    ($($arg:tt)*) => {
        $crate::text::text_fmt(format_args!($($arg)*))
    };
}

/// Unescaped text from a format string. Only for trusted arguments.
#[macro_export]
macro_rules! raw_textf {
    ($($arg:tt)*) => {
        $crate::text::raw_text_fmt(format_args!($($arg)*))
    };
}

impl Node for TextNode {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        buf.put_slice(self.content.as_bytes());
    }

    fn is_dynamic(&self) -> Option<bool> {
        Some(self.dynamic)
    }

    fn size_hint(&self) -> usize {
        self.content.len()
    }
}

impl fmt::Display for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

#[inline]
fn entity(b: u8) -> Option<&'static str> {
    match b {
        b'&' => Some("&amp;"),
        b'<' => Some("&lt;"),
        b'>' => Some("&gt;"),
        b'\'' => Some("&#39;"),
        b'"' => Some("&#34;"),
        _ => None,
    }
}

/// HTML-escape `s`, borrowing when nothing needs replacing.
pub fn escape(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = bytes.iter().position(|&b| entity(b).is_some()) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len() + 16);
    out.push_str(&s[..first]);
    let mut start = first;
    for (i, &b) in bytes.iter().enumerate().skip(first) {
        if let Some(rep) = entity(b) {
            out.push_str(&s[start..i]);
            out.push_str(rep);
            start = i + 1;
        }
    }
    out.push_str(&s[start..]);
    Cow::Owned(out)
}

/// HTML-escape `s` straight into a render buffer.
pub fn escape_to(buf: &mut BytesMut, s: &str) {
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(rep) = entity(b) {
            buf.put_slice(&bytes[start..i]);
            buf.put_slice(rep.as_bytes());
            start = i + 1;
        }
    }
    buf.put_slice(&bytes[start..]);
}
