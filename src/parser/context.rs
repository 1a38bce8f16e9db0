//! Indentation-tracked context frames.

/// Name of the context active at indentation zero.
pub const ROOT_CONTEXT: &str = ".";

/// One open block.
///
/// A frame's `indent` is fixed when it is pushed. Frames are popped, never
/// edited, when a line at the same or a shallower indent arrives.
#[derive(Debug, Clone)]
pub struct Frame<P> {
    /// Leading-space column of the line that opened the block
    pub indent: usize,
    /// Context whose commands apply to lines inside the block; `None` means
    /// the block is opaque
    pub context: Option<String>,
    /// Parameters handed down to lines inside the block
    pub params: P,
}

/// Stack of open blocks, innermost last.
#[derive(Debug, Clone)]
pub struct ContextStack<P> {
    frames: Vec<Frame<P>>,
}

impl<P> Default for ContextStack<P> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<P: Clone + Default> ContextStack<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close every block that a line at `indent` ends.
    ///
    /// A line at the same indent as the innermost block replaces it; a
    /// shallower line closes blocks until the innermost one is shallower
    /// still; a deeper line closes nothing. Indents on the stack are strictly
    /// increasing, so a single loop covers all three cases.
    pub fn close_to(&mut self, indent: usize) {
        while self.frames.last().is_some_and(|top| top.indent >= indent) {
            self.frames.pop();
        }
    }

    /// Context name for lines directly inside the innermost open block.
    ///
    /// Returns `None` when the innermost block is opaque.
    pub fn current_context(&self) -> Option<&str> {
        match self.frames.last() {
            None => Some(ROOT_CONTEXT),
            Some(frame) => frame.context.as_deref(),
        }
    }

    /// Private copy of the innermost block's params.
    ///
    /// Callbacks may refine the copy for the block they open without any
    /// effect on the enclosing blocks.
    pub fn params(&self) -> P {
        self.frames
            .last()
            .map(|frame| frame.params.clone())
            .unwrap_or_default()
    }

    pub fn push(&mut self, frame: Frame<P>) {
        self.frames.push(frame);
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
