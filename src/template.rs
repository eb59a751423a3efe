// Indentation-aware text templates
//
// A template is a tree of text blocks and nested templates. Nested
// templates render one indent level deeper than their parent. Text lines
// may start with a `|` margin marker after leading whitespace; the
// whitespace and the marker are stripped, so multi-line literals can be
// written indented in source without leaking that indentation into the
// output.

/// Left margin marker stripped from text lines
pub const MARGIN: char = '|';

/// One element of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Raw, possibly multi-line text
    Text(String),
    /// Child template rendered at parent level + 1
    Nested(Template),
}

/// A tree of blocks rendered with consistent nested indentation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    blocks: Vec<Block>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text block
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Text(text.into()));
        self
    }

    /// Append several single-line text blocks
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks
            .extend(lines.into_iter().map(|l| Block::Text(l.into())));
        self
    }

    /// Append a nested template
    pub fn nested(mut self, child: Template) -> Self {
        self.blocks.push(Block::Nested(child));
        self
    }

    /// Append every block of another template at the same level
    pub fn append(mut self, other: Template) -> Self {
        self.blocks.extend(other.blocks);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render with `indent_unit` repeated `indent_level` times before each line
    pub fn render(&self, indent_level: usize, indent_unit: &str) -> String {
        let prefix = indent_unit.repeat(indent_level);
        let rendered: Vec<String> = self
            .blocks
            .iter()
            .map(|block| match block {
                Block::Text(text) => text
                    .split('\n')
                    .map(|line| format!("{}{}", prefix, strip_margin(line)))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Block::Nested(child) => child.render(indent_level + 1, indent_unit),
            })
            .collect();
        rendered.join("\n")
    }
}

impl From<&str> for Template {
    fn from(text: &str) -> Self {
        Template::new().text(text)
    }
}

/// Drop leading whitespace and the margin marker, if the line has one
pub fn strip_margin(line: &str) -> &str {
    line.trim_start().strip_prefix(MARGIN).unwrap_or(line)
}
