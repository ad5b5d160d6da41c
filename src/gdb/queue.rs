//! Two-tier command queue

use crate::gdb::command::DebuggerCmd;
use crate::gdb::types::Priority;
use std::collections::VecDeque;

/// Pending commands, drained high tier first and FIFO within a tier
#[derive(Default)]
pub struct CommandQueue {
    high: VecDeque<Box<dyn DebuggerCmd>>,
    normal: VecDeque<Box<dyn DebuggerCmd>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: Box<dyn DebuggerCmd>, priority: Priority) {
        match priority {
            Priority::High => self.high.push_back(cmd),
            Priority::Normal => self.normal.push_back(cmd),
        }
    }

    pub fn pop(&mut self) -> Option<Box<dyn DebuggerCmd>> {
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.normal.is_empty()
    }

    pub fn clear(&mut self) {
        self.high.clear();
        self.normal.clear();
    }

    /// Request texts in the order they will be sent
    pub fn texts(&self) -> Vec<&str> {
        self.high
            .iter()
            .chain(self.normal.iter())
            .map(|c| c.text())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gdb::command::RawCmd;

    fn raw(text: &str) -> Box<dyn DebuggerCmd> {
        Box::new(RawCmd::new(text))
    }

    #[test]
    fn test_fifo_within_tier() {
        let mut queue = CommandQueue::new();
        queue.push(raw("a"), Priority::Normal);
        queue.push(raw("b"), Priority::Normal);
        assert_eq!(queue.texts(), vec!["a", "b"]);
        assert_eq!(queue.pop().unwrap().text(), "a");
        assert_eq!(queue.pop().unwrap().text(), "b");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_high_priority_first() {
        let mut queue = CommandQueue::new();
        queue.push(raw("normal 1"), Priority::Normal);
        queue.push(raw("high 1"), Priority::High);
        queue.push(raw("normal 2"), Priority::Normal);
        queue.push(raw("high 2"), Priority::High);
        assert_eq!(queue.len(), 4);
        assert_eq!(
            queue.texts(),
            vec!["high 1", "high 2", "normal 1", "normal 2"]
        );

        queue.clear();
        assert!(queue.is_empty());
    }
}
