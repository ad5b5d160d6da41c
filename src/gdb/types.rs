//! Debugger Domain Type Definitions

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Shared handle to a domain object owned by the session layer
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap a value into a [`Shared`] handle
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Queue priority of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    /// Runs before every normal command still waiting in the queue
    High,
}

/// Breakpoint information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub file: String,
    /// Zero-based line; the debugger is given `line + 1`
    pub line: u32,
    pub enabled: bool,
    pub temporary: bool,
    /// Number assigned by the debugger, -1 while unset
    pub number: i64,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub ignore_count: Option<u32>,
    #[serde(default)]
    pub address: Option<u64>,
    /// Break on this function instead of file:line (constructors, destructors)
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub already_set: bool,
}

impl Breakpoint {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            enabled: true,
            temporary: false,
            number: -1,
            condition: None,
            ignore_count: None,
            address: None,
            function: None,
            already_set: false,
        }
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_ignore_count(mut self, count: u32) -> Self {
        self.ignore_count = Some(count);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Whether the debugger has confirmed this breakpoint
    pub fn is_set(&self) -> bool {
        self.number > 0
    }
}

/// Watch display format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatchFormat {
    #[default]
    Undefined,
    Decimal,
    Unsigned,
    Hex,
    Binary,
    Char,
    /// String type dumped by the debugger as an array of characters
    CompositeString,
}

impl WatchFormat {
    /// Modifier passed to `output`, if any
    pub fn output_modifier(&self) -> Option<&'static str> {
        match self {
            WatchFormat::Decimal => Some("/d"),
            WatchFormat::Unsigned => Some("/u"),
            WatchFormat::Hex => Some("/x"),
            WatchFormat::Binary => Some("/t"),
            WatchFormat::Char => Some("/c"),
            WatchFormat::Undefined | WatchFormat::CompositeString => None,
        }
    }
}

/// Watched expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub keyword: String,
    #[serde(default)]
    pub format: WatchFormat,
    /// Type reported by the last `whatis`
    #[serde(default)]
    pub type_name: Option<String>,
}

impl Watch {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            format: WatchFormat::Undefined,
            type_name: None,
        }
    }

    pub fn with_format(mut self, format: WatchFormat) -> Self {
        self.format = format;
        self
    }
}

/// How a `whatis` type should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    CompositeString,
    Char,
    Plain,
}

/// Stack frame information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    pub number: u64,
    /// 0 when the debugger printed no address
    pub address: u64,
    /// Function name followed by its argument list
    pub function: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    pub valid: bool,
}

/// One `info registers` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    pub name: String,
    pub value: u64,
}

/// One disassembled instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisassemblyLine {
    pub address: u64,
    pub text: String,
}

/// Result of `info frame`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame address exactly as printed, used for change detection
    pub frame_address: String,
    /// Instruction pointer and function, when the debugger printed them
    pub active: Option<(u64, String)>,
}

impl FrameInfo {
    pub fn frame_address_value(&self) -> u64 {
        parse_hex(&self.frame_address).unwrap_or(0)
    }
}

/// Screen rectangle a tooltip is anchored to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Register names in view order
pub const REGISTER_NAMES: &[&str] = &[
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi", "eip", "eflags", "cs", "ss", "ds",
    "es", "fs", "gs", "rax", "rbx", "rcx", "rdx", "rsi", "rdi", "rbp", "rsp", "r8", "r9", "r10",
    "r11", "r12", "r13", "r14", "r15", "rip",
];

/// Fixed view index of a register, by name
pub fn register_index(name: &str) -> Option<usize> {
    REGISTER_NAMES
        .iter()
        .position(|r| r.eq_ignore_ascii_case(name))
}

/// Parse `0x`-prefixed (or bare) hex
pub fn parse_hex(s: &str) -> Option<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}
