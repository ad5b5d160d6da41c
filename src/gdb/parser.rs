//! GDB Console Output Parser
//!
//! Extracts structured values from the text GDB prints in its plain CLI mode.
//! The output format is not a stable contract across GDB versions, so every
//! function here returns `None` (or skips the entry) on anything it does not
//! recognize instead of failing.

use crate::gdb::types::*;
use regex::Regex;
use std::sync::LazyLock;

// #0  main (argc=1, argv=0x3e2440) at main.cpp:15
// #8  0x77d48734 in USER32!GetDC () from C:\WINDOWS\system32\user32.dll
// #9  0x001b04fe in ?? ()
static BACKTRACE_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(\d+)\s+(?:(0x[0-9A-Fa-f]+)\s+in\s+)?(.+)$").unwrap()
});

// Start of the location after the argument list. Function names and
// arguments may contain parentheses themselves, so the last one wins.
static BACKTRACE_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s+(?:at|from)\s+").unwrap());
static BACKTRACE_FILE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+):(\d+)$").unwrap());

// Breakpoint 1 at 0x4013d6: file main.cpp, line 8.
// Temporary breakpoint 2 at 0x401400: file main.cpp, line 12.
static BREAKPOINT_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Temporary breakpoint|Breakpoint) (\d+) at (0x[0-9A-Fa-f]+)").unwrap()
});

// eax            0x40e66666       1088841318
static REGISTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_]+)\s+(0x[0-9A-Fa-f]+)").unwrap());

// 0x00401390 <main+0>:	push   ebp
// => 0x000000000040113a <+4>:	mov    %edi,-0x14(%rbp)
static DISASSEMBLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(0x[0-9A-Fa-f]+)\s+<.*?>:\s+(.*)$").unwrap());

// Stack level 0, frame at 0x22ff80:
//  eip = 0x401497 in main (main.cpp:16); saved eip 0x4011e7
static FRAME_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Stack level \d+, frame at (0x[0-9A-Fa-f]+):").unwrap()
});
static FRAME_INFO_ACTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:eip|rip|pc) = (0x[0-9A-Fa-f]+) in ([^;\n]*)").unwrap()
});

static TYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)*").unwrap()
});

static REPEATS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<repeats (\d+) times>").unwrap());

/// Upper bound on the characters a reconstructed string holds. Repeat counts
/// come from debuggee memory and may be garbage.
pub const MAX_RECONSTRUCTED_CHARS: usize = 65_536;

/// Split a reply into trimmed, non-empty lines
pub fn split_lines(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Parse one line of `bt` output
pub fn parse_backtrace_line(line: &str) -> Option<StackFrame> {
    let line = line.trim();
    let caps = BACKTRACE_FRAME.captures(line)?;
    let body = caps.get(3)?.as_str();

    let (signature, location) = match BACKTRACE_LOCATION.find_iter(body).last() {
        // Keep the parenthesis closing the argument list
        Some(m) => (&body[..m.start() + 1], Some(body[m.end()..].trim())),
        None => (body.trim_end(), None),
    };
    let (name, args) = split_argument_list(signature)?;

    let mut frame = StackFrame {
        number: caps[1].parse().ok()?,
        address: caps.get(2).and_then(|m| parse_hex(m.as_str())).unwrap_or(0),
        function: format!("{}{}", name, args),
        file: None,
        line: None,
        valid: true,
    };

    if let Some(location) = location.filter(|l| !l.is_empty()) {
        match BACKTRACE_FILE_LINE.captures(location) {
            Some(loc) => {
                frame.file = Some(loc[1].to_string());
                frame.line = loc[2].parse().ok();
            }
            None => frame.file = Some(location.to_string()),
        }
    }

    Some(frame)
}

/// Split `name (args)` into the name and the balanced argument list that
/// ends the signature
fn split_argument_list(signature: &str) -> Option<(&str, &str)> {
    if !signature.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in signature.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    let name = signature[..i].trim();
                    return (!name.is_empty()).then_some((name, &signature[i..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a breakpoint confirmation into (number, address)
pub fn parse_breakpoint_confirmation(output: &str) -> Option<(i64, u64)> {
    let caps = BREAKPOINT_SET.captures(output)?;
    let number = caps[1].parse().ok()?;
    let address = parse_hex(&caps[2])?;
    Some((number, address))
}

/// Parse one line of `info registers` output.
///
/// The value column is always read as hex; the natural-format column that
/// follows it is ignored.
pub fn parse_register_line(line: &str) -> Option<RegisterValue> {
    let caps = REGISTER.captures(line.trim())?;
    Some(RegisterValue {
        name: caps[1].to_string(),
        value: parse_hex(&caps[2])?,
    })
}

/// Parse one line of `disassemble` output
pub fn parse_disassembly_line(line: &str) -> Option<DisassemblyLine> {
    let caps = DISASSEMBLY.captures(line)?;
    Some(DisassemblyLine {
        address: parse_hex(&caps[1])?,
        text: caps[2].trim_end().to_string(),
    })
}

/// Parse the frame address and active instruction out of `info frame`
pub fn parse_frame_info(output: &str) -> Option<FrameInfo> {
    let caps = FRAME_INFO.captures(output)?;
    let active = FRAME_INFO_ACTIVE.captures(output).and_then(|a| {
        let addr = parse_hex(&a[1])?;
        Some((addr, a[2].trim().to_string()))
    });
    Some(FrameInfo {
        frame_address: caps[1].to_string(),
        active,
    })
}

/// Classify a `whatis` reply such as `type = const wxChar *`.
///
/// Returns the class and the trimmed type text.
pub fn classify_type(
    output: &str,
    string_types: &[String],
    char_types: &[String],
) -> (TypeClass, String) {
    let type_text = output
        .split_once('=')
        .map(|(_, t)| t)
        .unwrap_or("")
        .trim()
        .to_string();

    let tokens: Vec<&str> = TYPE_TOKEN
        .find_iter(&type_text)
        .map(|m| m.as_str())
        .collect();
    let matches = |names: &[String]| tokens.iter().any(|t| names.iter().any(|n| n == t));

    let class = if matches(string_types) {
        TypeClass::CompositeString
    } else if matches(char_types) {
        TypeClass::Char
    } else {
        TypeClass::Plain
    };
    (class, type_text)
}

/// Rebuild readable text from an element-wise character dump.
///
/// `{72 'H', 105 'i'}` becomes `"Hi"`. Entries without a well-formed quoted
/// character are skipped. The result is cut at [`MAX_RECONSTRUCTED_CHARS`].
pub fn reconstruct_char_sequence(output: &str) -> String {
    let mut text = String::new();
    let mut len = 0usize;
    let mut rest = output;

    while let Some(pos) = rest.find('\'') {
        let after = &rest[pos + 1..];
        match decode_char_literal(after) {
            Some((c, used)) => {
                let tail = &after[used..];
                let (count, skip) = match REPEATS.captures(tail) {
                    Some(caps) => (
                        // Too large for usize is still "too many"
                        caps[1].parse::<usize>().unwrap_or(MAX_RECONSTRUCTED_CHARS),
                        caps.get(0).map_or(0, |m| m.end()),
                    ),
                    None => (1, 0),
                };
                let count = count.min(MAX_RECONSTRUCTED_CHARS - len);
                text.extend(std::iter::repeat(c).take(count));
                len += count;
                if len == MAX_RECONSTRUCTED_CHARS {
                    break;
                }
                rest = &tail[skip..];
            }
            None => rest = after,
        }
    }

    format!("\"{}\"", text)
}

/// Decode the body of a char literal up to and including its closing quote.
/// Returns the character and the number of bytes consumed.
fn decode_char_literal(s: &str) -> Option<(char, usize)> {
    let mut chars = s.char_indices().peekable();
    let (_, first) = chars.next()?;

    let value = match first {
        '\'' => return None,
        '\\' => {
            let (_, esc) = chars.next()?;
            match esc {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'a' => '\x07',
                'b' => '\x08',
                'f' => '\x0c',
                'v' => '\x0b',
                'e' => '\x1b',
                '\\' | '\'' | '"' => esc,
                '0'..='7' => {
                    let mut code = esc.to_digit(8)?;
                    for _ in 0..2 {
                        match chars.peek().and_then(|&(_, d)| d.to_digit(8)) {
                            Some(d) => {
                                code = code * 8 + d;
                                chars.next();
                            }
                            None => break,
                        }
                    }
                    char::from_u32(code)?
                }
                _ => return None,
            }
        }
        c => c,
    };

    let (idx, close) = chars.next()?;
    (close == '\'').then_some((value, idx + 1))
}

/// Convert a path to the form GDB accepts on its command line
pub fn gdb_file_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    if path.contains(' ') && !path.starts_with('"') {
        format!("\"{}\"", path)
    } else {
        path
    }
}
