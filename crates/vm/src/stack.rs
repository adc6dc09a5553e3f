use types::{VmError, VmResult, Word};

/// Maximum number of words the operand stack can hold.
pub const STACK_LIMIT: usize = 1024;

/// Bounded LIFO of words.
///
/// BOUNDS: at most [`STACK_LIMIT`] words. A push onto a full stack is
/// [`VmError::StackOverflow`]; reading below the bottom is
/// [`VmError::StackUnderflow`]. A failed operation leaves the stack as it
/// was.
///
/// INDEXING: `peek` counts from zero at the top, `dup` and `swap` from one.
/// No gas is charged for stack operations.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    items: Vec<Word>,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(32),
        }
    }

    /// Number of words currently held.
    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Puts `word` on top. Fails once [`STACK_LIMIT`] words are held.
    pub fn push(&mut self, word: Word) -> VmResult<()> {
        if self.items.len() >= STACK_LIMIT {
            return Err(VmError::StackOverflow { limit: STACK_LIMIT });
        }
        tracing::trace!(depth = self.items.len() + 1, %word, "push");
        self.items.push(word);
        Ok(())
    }

    /// Removes and returns the top word.
    pub fn pop(&mut self) -> VmResult<Word> {
        self.items.pop().ok_or(VmError::StackUnderflow {
            requested: 1,
            depth: 0,
        })
    }

    /// Word `n` places below the top (`peek(0)` is the top).
    pub fn peek(&self, n: usize) -> VmResult<Word> {
        let depth = self.items.len();
        if n >= depth {
            return Err(VmError::StackUnderflow {
                requested: n + 1,
                depth,
            });
        }
        Ok(self.items[depth - 1 - n])
    }

    /// Pushes a copy of the `n`-th word from the top; `dup(1)` copies the top.
    pub fn dup(&mut self, n: usize) -> VmResult<()> {
        if n == 0 {
            return Err(VmError::InvalidStackIndex { index: n });
        }
        let word = self.peek(n - 1)?;
        self.push(word)
    }

    /// Exchanges the top with the word `n` places below it; `swap(1)` swaps
    /// the top two.
    pub fn swap(&mut self, n: usize) -> VmResult<()> {
        if n == 0 {
            return Err(VmError::InvalidStackIndex { index: n });
        }
        let depth = self.items.len();
        if n >= depth {
            return Err(VmError::StackUnderflow {
                requested: n + 1,
                depth,
            });
        }
        self.items.swap(depth - 1, depth - 1 - n);
        Ok(())
    }

    /// Drops the top `n` words. Callers check depth beforehand.
    pub(crate) fn drop_top(&mut self, n: usize) {
        let keep = self.items.len().saturating_sub(n);
        self.items.truncate(keep);
    }

    /// Replaces the top word. Callers check depth beforehand.
    pub(crate) fn set_top(&mut self, word: Word) {
        if let Some(top) = self.items.last_mut() {
            *top = word;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Words from the top down.
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.items.iter().rev()
    }
}
