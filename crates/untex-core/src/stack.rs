//! Stack of open LaTeX environments

/// Names of the currently open blocks, innermost last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStack {
    names: Vec<String>,
}

impl BlockStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a block
    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    /// Close the innermost block, returning its name
    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    /// Name of the innermost block
    pub fn peek(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Current nesting depth
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no block is open
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack() {
        let mut stack = BlockStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn test_push_peek_pop() {
        let mut stack = BlockStack::new();
        stack.push("itemize");

        assert!(!stack.is_empty());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some("itemize"));
        assert_eq!(stack.pop().as_deref(), Some("itemize"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = BlockStack::new();
        for name in ["a", "b", "c"] {
            stack.push(name);
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop().as_deref(), Some("c"));
        assert_eq!(stack.pop().as_deref(), Some("b"));
        assert_eq!(stack.pop().as_deref(), Some("a"));
    }
}
