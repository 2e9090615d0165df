//! Injection checks for content headed into `<script>` or `<style>` blocks.
//!
//! Works on already-rendered bytes: a node is rendered once, the output is
//! matched against a pattern of known breakout constructs, and the cached
//! bytes are reused if the check passes.

use bytes::{BufMut, Bytes, BytesMut};
use regex::bytes::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::{BoxNode, Node};
use crate::text::{raw_text, text};

const PATTERN: &str = concat!(
    r"(?i)(</\s*script\s*>)|(<\s*script)|(</\s*style\s*>)|(on\w+\s*=)",
    r"|(javascript\s*:)|(eval\s*\()|(document\s*\.)|(window\s*\.)|(expression\s*\()",
    r#"|(url\s*\(\s*['"]?\s*javascript:)|(&lt;\s*/\s*script\s*&gt;)|(&lt;\s*/\s*style\s*&gt;)"#,
);

static DISALLOWED: OnceLock<Regex> = OnceLock::new();

fn disallowed() -> &'static Regex {
    DISALLOWED.get_or_init(|| Regex::new(PATTERN).expect("disallowed pattern is valid"))
}

fn check(content: &[u8]) -> Result<()> {
    match disallowed().find(content) {
        Some(m) => {
            let matched = String::from_utf8_lossy(m.as_bytes()).into_owned();
            debug!(pattern = %matched, "content rejected");
            Err(Error::Rejected(matched))
        }
        None => Ok(()),
    }
}

/// Check a string directly, without building a node.
pub fn validate(content: &str) -> Result<()> {
    check(content.as_bytes())
}

/// A node that passed, or failed, the injection check.
///
/// Renders the cached output when valid and nothing otherwise.
pub struct Sanitised {
    component: Option<BoxNode>,
    content: Bytes,
    err: Option<Error>,
}

/// Render `component` once and check its output.
pub fn sanitise(component: Option<BoxNode>) -> Sanitised {
    let Some(component) = component else {
        return Sanitised {
            component: None,
            content: Bytes::new(),
            err: Some(Error::NilComponent),
        };
    };

    let content = component.render();
    let err = check(&content).err();
    Sanitised {
        component: Some(component),
        content,
        err,
    }
}

/// Alias for [`sanitise`].
pub fn sanitize(component: Option<BoxNode>) -> Sanitised {
    sanitise(component)
}

impl Sanitised {
    pub fn is_valid(&self) -> bool {
        self.err.is_none()
    }

    /// Why the content was rejected.
    pub fn reason(&self) -> Option<&Error> {
        self.err.as_ref()
    }

    /// The original node if valid, otherwise an escaped error message.
    pub fn error(self) -> BoxNode {
        match (self.err, self.component) {
            (None, Some(component)) => component,
            (Some(err), _) => Box::new(text(format!("Validation Error: {}", err))),
            (None, None) => Box::new(text("")),
        }
    }

    /// The original node, or the rejection.
    pub fn into_result(self) -> Result<BoxNode> {
        match (self.err, self.component) {
            (None, Some(component)) => Ok(component),
            (Some(err), _) => Err(err),
            (None, None) => Err(Error::NilComponent),
        }
    }
}

impl Node for Sanitised {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        if self.err.is_none() {
            buf.put_slice(&self.content);
        }
    }

    fn render(&self) -> Bytes {
        if self.err.is_none() {
            self.content.clone()
        } else {
            Bytes::new()
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        match (&self.err, &self.component) {
            (None, Some(component)) => component.children(),
            _ => Vec::new(),
        }
    }

    fn is_dynamic(&self) -> Option<bool> {
        Some(true)
    }

    fn size_hint(&self) -> usize {
        self.content.len()
    }
}

/// Raw text if `content` passes, otherwise an escaped error message.
pub fn safe(content: &str) -> BoxNode {
    match validate(content) {
        Ok(()) => Box::new(raw_text(content.to_string())),
        Err(err) => Box::new(text(format!("Validation Error: {}", err))),
    }
}

/// Inline `<script>` if `js` passes, otherwise an escaped error comment.
pub fn safe_script(js: &str) -> BoxNode {
    match validate(js) {
        Ok(()) => Box::new(raw_text(format!("<script>{}</script>", js))),
        Err(err) => Box::new(text(format!("<!-- Validation Error: {} -->", err))),
    }
}

/// Inline `<style>` if `css` passes, otherwise an escaped error comment.
pub fn safe_style(css: &str) -> BoxNode {
    match validate(css) {
        Ok(()) => Box::new(raw_text(format!("<style>{}</style>", css))),
        Err(err) => Box::new(text(format!("<!-- Validation Error: {} -->", err))),
    }
}
