use std::fmt;

/// Renders an expression with a caret pointing at a character position.
///
/// ```
/// use nmpolicy_dsl::Snippet;
///
/// let rendered = Snippet::new("routes.running", 7).to_string();
/// assert_eq!(rendered, "| routes.running\n| .......^");
/// ```
///
/// Positions past the end of the expression point at its last character.
/// An empty expression renders as nothing.
#[derive(Debug, Clone, Copy)]
pub struct Snippet<'a> {
    expression: &'a str,
    position: usize,
}

impl<'a> Snippet<'a> {
    pub fn new(expression: &'a str, position: usize) -> Self {
        Snippet {
            expression,
            position,
        }
    }
}

impl fmt::Display for Snippet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = self.expression.chars().count();
        if length == 0 {
            return Ok(());
        }
        let position = self.position.min(length - 1);
        write!(f, "| {}\n| {}^", self.expression, ".".repeat(position))
    }
}
