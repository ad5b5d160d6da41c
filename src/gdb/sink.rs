//! Consumers of parsed debugger state
//!
//! Commands never render anything themselves; they push structured results
//! into these views. A front-end provides the implementations.

use crate::gdb::types::*;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receives brace-delimited pseudo-structures (`name = {a = 1, b = 2,}`)
pub trait WatchTree: Send {
    fn build_tree(&mut self, watch: Option<&Watch>, text: &str);
}

pub trait BacktraceView: Send {
    fn clear(&mut self);
    fn add_frame(&mut self, frame: StackFrame);
}

pub trait RegistersView: Send {
    /// `index` is the position in [`REGISTER_NAMES`]
    fn set_register_value(&mut self, index: usize, value: u64);
}

pub trait DisassemblyView: Send {
    /// Start over for the function of `frame`
    fn clear(&mut self, frame: &StackFrame);
    fn set_active_address(&mut self, address: u64);
    fn add_line(&mut self, address: u64, text: &str);
}

pub trait TooltipView: Send {
    /// Drop the current tip, if one is still open
    fn dispose(&mut self);
    fn show(&mut self, text: &str, rect: TipRect);
}

/// Lock a view, recovering it if a previous holder panicked
pub(crate) fn lock<T: ?Sized>(view: &Mutex<T>) -> MutexGuard<'_, T> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a [`RecordingViews`] has been told, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Tree { watch: Option<String>, text: String },
    BacktraceCleared,
    Frame(StackFrame),
    Register { index: usize, value: u64 },
    DisassemblyCleared(StackFrame),
    ActiveAddress(u64),
    Assembly { address: u64, text: String },
    TipDisposed,
    TipShown { text: String, rect: TipRect },
}

/// Headless implementation of every view, keeping an event log
#[derive(Debug, Default)]
pub struct RecordingViews {
    pub events: Vec<ViewEvent>,
}

impl RecordingViews {
    pub fn frames(&self) -> Vec<&StackFrame> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Frame(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn tree_texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Tree { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl WatchTree for RecordingViews {
    fn build_tree(&mut self, watch: Option<&Watch>, text: &str) {
        self.events.push(ViewEvent::Tree {
            watch: watch.map(|w| w.keyword.clone()),
            text: text.to_string(),
        });
    }
}

impl BacktraceView for RecordingViews {
    fn clear(&mut self) {
        self.events.push(ViewEvent::BacktraceCleared);
    }

    fn add_frame(&mut self, frame: StackFrame) {
        self.events.push(ViewEvent::Frame(frame));
    }
}

impl RegistersView for RecordingViews {
    fn set_register_value(&mut self, index: usize, value: u64) {
        self.events.push(ViewEvent::Register { index, value });
    }
}

impl DisassemblyView for RecordingViews {
    fn clear(&mut self, frame: &StackFrame) {
        self.events.push(ViewEvent::DisassemblyCleared(frame.clone()));
    }

    fn set_active_address(&mut self, address: u64) {
        self.events.push(ViewEvent::ActiveAddress(address));
    }

    fn add_line(&mut self, address: u64, text: &str) {
        self.events.push(ViewEvent::Assembly {
            address,
            text: text.to_string(),
        });
    }
}

impl TooltipView for RecordingViews {
    fn dispose(&mut self) {
        self.events.push(ViewEvent::TipDisposed);
    }

    fn show(&mut self, text: &str, rect: TipRect) {
        self.events.push(ViewEvent::TipShown {
            text: text.to_string(),
            rect,
        });
    }
}
