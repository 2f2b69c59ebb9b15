use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// A generic element of the parsed tag tree.
///
/// `next` continuation tags never appear as nodes: the blocks they chain are
/// flattened into the children of the enclosing slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Text directly following the opening tag, if any.
    pub text: Option<String>,
    /// Direct children in document order.
    pub children: Vec<Node>,
    /// Byte span of the opening tag in the source.
    pub span: Range<usize>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            ..Node::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Inline text, or `""` when the tag had none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    fn fmt_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{}{}", "  ".repeat(depth), self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {}=\"{}\"", key, value)?;
        }
        if let Some(text) = &self.text {
            write!(f, " = {:?}", text)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.fmt_outline(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Indented outline, one node per line, two spaces per level.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_outline(f, 0)
    }
}
