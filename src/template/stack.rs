//! Inclusion stack of one render.

use crate::error::{Error, Result};

/// One active template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Module path relative to base (`src/nav`).
    pub module: String,
    /// Template file relative to base (`src/nav/nav.tpl`).
    pub template: String,
}

/// Bounded stack of active templates; the first frame is the page.
#[derive(Debug)]
pub struct IncludeStack {
    frames: Vec<Frame>,
    max: usize,
}

impl IncludeStack {
    pub fn new(max: usize) -> Self {
        Self {
            frames: Vec::new(),
            max,
        }
    }

    /// Fails with [`Error::Recursion`] once `max` frames are active.
    pub fn check_depth(&self) -> Result<()> {
        if self.frames.len() >= self.max {
            return Err(Error::Recursion(self.max));
        }
        Ok(())
    }

    pub fn push(&mut self, frame: Frame) -> Result<()> {
        self.check_depth()?;
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(module: &str) -> Frame {
        Frame {
            module: module.into(),
            template: format!("{module}/x.tpl"),
        }
    }

    #[test]
    fn test_bounded() {
        let mut stack = IncludeStack::new(2);
        stack.push(frame("a")).unwrap();
        stack.push(frame("b")).unwrap();
        let err = stack.push(frame("c")).unwrap_err();
        assert_eq!(err.to_string(), "max include depth exceeded (2)");

        assert_eq!(stack.first().unwrap().module, "a");
        assert_eq!(stack.current().unwrap().module, "b");
        assert_eq!(stack.pop().unwrap().module, "b");
        stack.push(frame("c")).unwrap();
        assert_eq!(stack.len(), 2);
    }
}
