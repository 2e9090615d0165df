use bytes::BytesMut;

use super::{BoxNode, Node};

/// Renders one of two branches depending on a boolean.
///
/// A missing branch renders nothing. Passing `None` to [`then`](Self::then)
/// or [`otherwise`](Self::otherwise) leaves the branch unset.
///
/// ```
/// use fluent::node::{some, Conditional, Node};
/// use fluent::text::text;
///
/// let logged_in = false;
/// let greeting = Conditional::new(logged_in)
///     .then(some(text("Welcome back!")))
///     .otherwise(some(text("Please log in")));
/// assert_eq!(&greeting.render()[..], b"Please log in");
/// ```
pub struct Conditional {
    condition: bool,
    then_branch: Option<BoxNode>,
    else_branch: Option<BoxNode>,
    /// The else branch was set before the then branch.
    else_first: bool,
}

impl Conditional {
    /// Create a conditional with no branches set.
    pub fn new(condition: bool) -> Self {
        Self {
            condition,
            then_branch: None,
            else_branch: None,
            else_first: false,
        }
    }

    /// Node rendered when the condition is true.
    pub fn then(mut self, node: Option<BoxNode>) -> Self {
        if node.is_some() {
            self.then_branch = node;
        }
        self
    }

    /// Node rendered when the condition is false.
    pub fn otherwise(mut self, node: Option<BoxNode>) -> Self {
        if node.is_some() {
            if self.then_branch.is_none() && self.else_branch.is_none() {
                self.else_first = true;
            }
            self.else_branch = node;
        }
        self
    }

    /// Branch selected by the condition, if it is set.
    pub fn selected(&self) -> Option<&dyn Node> {
        let branch = if self.condition {
            &self.then_branch
        } else {
            &self.else_branch
        };
        branch.as_deref()
    }
}

/// Render `node` only when `condition` is true.
pub fn when(condition: bool, node: Option<BoxNode>) -> Conditional {
    Conditional::new(condition).then(node)
}

/// Render `node` only when `condition` is false.
pub fn unless(condition: bool, node: Option<BoxNode>) -> Conditional {
    Conditional::new(!condition).then(node)
}

impl Node for Conditional {
    fn render_to_buffer(&self, buf: &mut BytesMut) {
        if let Some(node) = self.selected() {
            node.render_to_buffer(buf);
        }
    }

    fn children(&self) -> Vec<&dyn Node> {
        let then_branch = self.then_branch.as_deref();
        let else_branch = self.else_branch.as_deref();
        let ordered = if self.else_first {
            [else_branch, then_branch]
        } else {
            [then_branch, else_branch]
        };
        ordered.into_iter().flatten().collect()
    }

    /// Follows the selected branch; an unset branch renders nothing, which is static.
    fn is_dynamic(&self) -> Option<bool> {
        Some(
            self.selected()
                .is_some_and(|node| node.is_dynamic() != Some(false)),
        )
    }
}
