//! Console front-end
//!
//! Reads one request per line, queues the matching debugger commands and
//! prints what the views receive to stdout.

use anyhow::{anyhow, bail, Context, Result};
use gdb_cmd_driver::gdb::command::{
    AddBreakpoint, AddSourceDir, AddSymbolFile, AttachToProcess, Backtrace, Detach,
    DisassemblyInit, FindTooltipType, FindWatchType, InfoArguments, InfoLocals, InfoRegisters,
    RawCmd, RemoveBreakpoint, SetArguments, SetDebuggee,
};
use gdb_cmd_driver::gdb::sink::{
    BacktraceView, DisassemblyView, RegistersView, TooltipView, WatchTree,
};
use gdb_cmd_driver::gdb::{
    shared, Breakpoint, Driver, Priority, Shared, StackFrame, TipRect, Watch, WatchFormat,
    REGISTER_NAMES,
};
use tracing::debug;

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Break {
        location: Location,
        temporary: bool,
        condition: Option<String>,
    },
    /// One breakpoint by number, or all of them
    Delete(Option<i64>),
    Watch {
        expr: String,
        format: WatchFormat,
    },
    /// Re-evaluate every watch
    Watches,
    Locals,
    Args,
    Backtrace,
    Registers,
    Disassemble,
    Tip(String),
    Attach(u32),
    Detach,
    File(String),
    Dir(String),
    Symbols(String),
    SetArgs(String),
    Quit,
    /// Anything else goes to the debugger unchanged
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// One-based line as typed
    Line { file: String, line: u32 },
    Function(String),
}

/// Parse a console line; blank lines yield `None`
pub fn parse_request(line: &str) -> Result<Option<Request>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let request = match word {
        "break" | "b" | "tbreak" => {
            let (location, condition) = match rest.split_once(" if ") {
                Some((loc, cond)) => (loc.trim(), Some(cond.trim().to_string())),
                None => (rest, None),
            };
            Request::Break {
                location: parse_location(location)?,
                temporary: word == "tbreak",
                condition,
            }
        }
        "delete" | "d" => match rest {
            "" => Request::Delete(None),
            n => Request::Delete(Some(
                n.parse()
                    .with_context(|| format!("Invalid breakpoint number: {}", n))?,
            )),
        },
        "watch" => {
            let (format, expr) = match rest.split_once(char::is_whitespace) {
                Some((modifier, expr)) if modifier.starts_with('/') => {
                    (parse_format(modifier)?, expr.trim())
                }
                _ => (WatchFormat::Undefined, rest),
            };
            if expr.is_empty() {
                bail!("Usage: watch [/d|/u|/x|/t|/c] <expr>");
            }
            Request::Watch {
                expr: expr.to_string(),
                format,
            }
        }
        "watches" => Request::Watches,
        "locals" => Request::Locals,
        "args" => Request::Args,
        "bt" | "backtrace" => Request::Backtrace,
        "regs" | "registers" => Request::Registers,
        "disasm" => Request::Disassemble,
        "tip" => Request::Tip(required(rest, "tip <expr>")?),
        "attach" => Request::Attach(
            rest.parse()
                .with_context(|| format!("Invalid process id: {}", rest))?,
        ),
        "detach" => Request::Detach,
        "file" => Request::File(required(rest, "file <program>")?),
        "dir" => Request::Dir(rest.to_string()),
        "symbols" => Request::Symbols(required(rest, "symbols <file>")?),
        "setargs" => Request::SetArgs(rest.to_string()),
        "quit" | "q" => Request::Quit,
        _ => Request::Raw(line.to_string()),
    };
    Ok(Some(request))
}

fn required(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(rest.to_string())
}

fn parse_location(location: &str) -> Result<Location> {
    if location.is_empty() {
        bail!("Usage: break <file>:<line> | <function> [if <condition>]");
    }
    if let Some((file, line)) = location.rsplit_once(':') {
        if let Ok(line) = line.parse::<u32>() {
            if line == 0 {
                bail!("Line numbers start at 1");
            }
            return Ok(Location::Line {
                file: file.to_string(),
                line,
            });
        }
    }
    Ok(Location::Function(location.to_string()))
}

fn parse_format(modifier: &str) -> Result<WatchFormat> {
    match modifier {
        "/d" => Ok(WatchFormat::Decimal),
        "/u" => Ok(WatchFormat::Unsigned),
        "/x" => Ok(WatchFormat::Hex),
        "/t" => Ok(WatchFormat::Binary),
        "/c" => Ok(WatchFormat::Char),
        other => Err(anyhow!("Unknown format: {}", other)),
    }
}

/// Breakpoints and watches of the console session
pub struct Console {
    views: Shared<ConsoleViews>,
    breakpoints: Vec<Shared<Breakpoint>>,
    watches: Vec<Shared<Watch>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            views: shared(ConsoleViews),
            breakpoints: Vec::new(),
            watches: Vec::new(),
        }
    }

    /// Queue the debugger commands for `request`
    pub fn dispatch(&mut self, request: Request, driver: &mut Driver) -> Result<()> {
        debug!("Dispatching {:?}", request);
        match request {
            Request::Break {
                location,
                temporary,
                condition,
            } => {
                let mut bp = match location {
                    Location::Line { file, line } => Breakpoint::new(file, line - 1),
                    Location::Function(function) => Breakpoint::new("", 0).with_function(function),
                };
                bp.temporary = temporary;
                bp.condition = condition;
                let bp = shared(bp);
                driver.queue_command(AddBreakpoint::new(bp.clone()), Priority::Normal);
                self.breakpoints.push(bp);
            }
            Request::Delete(Some(number)) => {
                let pos = self
                    .breakpoints
                    .iter()
                    .position(|bp| bp.lock().map(|b| b.number == number).unwrap_or(false))
                    .ok_or_else(|| anyhow!("No breakpoint number {}", number))?;
                let bp = self.breakpoints.remove(pos);
                driver.queue_command(RemoveBreakpoint::new(bp), Priority::Normal);
            }
            Request::Delete(None) => {
                self.breakpoints.clear();
                driver.queue_command(RemoveBreakpoint::all(), Priority::Normal);
            }
            Request::Watch { expr, format } => {
                let watch = shared(Watch::new(expr).with_format(format));
                driver.queue_command(
                    FindWatchType::new(self.views.clone(), watch.clone()),
                    Priority::Normal,
                );
                self.watches.push(watch);
            }
            Request::Watches => self.refresh_watches(driver),
            Request::Locals => {
                driver.queue_command(InfoLocals::new(self.views.clone()), Priority::Normal)
            }
            Request::Args => {
                driver.queue_command(InfoArguments::new(self.views.clone()), Priority::Normal)
            }
            Request::Backtrace => {
                driver.queue_command(Backtrace::new(self.views.clone()), Priority::Normal)
            }
            Request::Registers => {
                driver.queue_command(InfoRegisters::new(self.views.clone()), Priority::Normal)
            }
            Request::Disassemble => {
                driver.queue_command(DisassemblyInit::new(self.views.clone()), Priority::Normal)
            }
            Request::Tip(expr) => driver.queue_command(
                FindTooltipType::new(&expr, self.views.clone(), TipRect::default()),
                Priority::Normal,
            ),
            Request::Attach(pid) => {
                driver.queue_command(AttachToProcess::new(pid), Priority::Normal)
            }
            Request::Detach => driver.queue_command(Detach, Priority::Normal),
            Request::File(program) => {
                driver.reset_session_state();
                driver.queue_command(SetDebuggee::new(&program), Priority::Normal);
            }
            Request::Dir(dir) => driver.queue_command(AddSourceDir::new(&dir), Priority::Normal),
            Request::Symbols(file) => {
                driver.queue_command(AddSymbolFile::new(&file), Priority::Normal)
            }
            Request::SetArgs(args) => {
                driver.queue_command(SetArguments::new(&args), Priority::Normal)
            }
            Request::Quit => {
                driver.clear_queue();
                driver.queue_command(RawCmd::quit(), Priority::High);
            }
            Request::Raw(line) => driver.queue_command(RawCmd::new(line), Priority::Normal),
        }
        Ok(())
    }

    /// Re-evaluate every watch, e.g. after the program stopped
    pub fn refresh_watches(&self, driver: &mut Driver) {
        for watch in &self.watches {
            driver.queue_command(
                FindWatchType::new(self.views.clone(), watch.clone()),
                Priority::Normal,
            );
        }
    }
}

/// Views printing to stdout
pub struct ConsoleViews;

impl WatchTree for ConsoleViews {
    fn build_tree(&mut self, _watch: Option<&Watch>, text: &str) {
        print!("{}", text);
    }
}

impl BacktraceView for ConsoleViews {
    fn clear(&mut self) {}

    fn add_frame(&mut self, frame: StackFrame) {
        let location = match (&frame.file, frame.line) {
            (Some(file), Some(line)) => format!(" at {}:{}", file, line),
            (Some(file), None) => format!(" from {}", file),
            _ => String::new(),
        };
        println!(
            "#{:<3} 0x{:08x} {}{}",
            frame.number, frame.address, frame.function, location
        );
    }
}

impl RegistersView for ConsoleViews {
    fn set_register_value(&mut self, index: usize, value: u64) {
        let name = REGISTER_NAMES.get(index).copied().unwrap_or("?");
        println!("{:<8} 0x{:x}", name, value);
    }
}

impl DisassemblyView for ConsoleViews {
    fn clear(&mut self, frame: &StackFrame) {
        println!("Disassembly of {} (frame 0x{:x})", frame.function, frame.address);
    }

    fn set_active_address(&mut self, address: u64) {
        println!("Current instruction: 0x{:x}", address);
    }

    fn add_line(&mut self, address: u64, text: &str) {
        println!("  0x{:08x}  {}", address, text);
    }
}

impl TooltipView for ConsoleViews {
    fn dispose(&mut self) {}

    fn show(&mut self, text: &str, _rect: TipRect) {
        println!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdb_cmd_driver::gdb::GdbConfig;

    fn request(line: &str) -> Request {
        parse_request(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_breakpoints() {
        assert_eq!(
            request("break src/main.cpp:12"),
            Request::Break {
                location: Location::Line {
                    file: "src/main.cpp".to_string(),
                    line: 12
                },
                temporary: false,
                condition: None,
            }
        );
        assert_eq!(
            request("tbreak Widget::Widget if size > 3"),
            Request::Break {
                location: Location::Function("Widget::Widget".to_string()),
                temporary: true,
                condition: Some("size > 3".to_string()),
            }
        );
        assert!(parse_request("break main.cpp:0").is_err());
        assert!(parse_request("break").is_err());
    }

    #[test]
    fn test_parse_other_requests() {
        assert_eq!(parse_request("   ").unwrap(), None);
        assert_eq!(request("delete"), Request::Delete(None));
        assert_eq!(request("d 3"), Request::Delete(Some(3)));
        assert!(parse_request("delete x").is_err());
        assert_eq!(
            request("watch /x flags"),
            Request::Watch {
                expr: "flags".to_string(),
                format: WatchFormat::Hex
            }
        );
        assert_eq!(
            request("watch a + b"),
            Request::Watch {
                expr: "a + b".to_string(),
                format: WatchFormat::Undefined
            }
        );
        assert!(parse_request("watch /z x").is_err());
        assert_eq!(request("attach 4242"), Request::Attach(4242));
        assert!(parse_request("attach").is_err());
        assert_eq!(request("dir"), Request::Dir(String::new()));
        assert_eq!(request("next"), Request::Raw("next".to_string()));
        assert_eq!(request("q"), Request::Quit);
    }

    #[test]
    fn test_dispatch_queues_commands() {
        let mut console = Console::new();
        let mut driver = Driver::new(GdbConfig::default());
        for line in [
            "file a.out",
            "break main.cpp:8 if i == 2",
            "b main",
            "watch /d count",
            "bt",
            "regs",
            "disasm",
            "tip title",
            "run",
        ] {
            console.dispatch(request(line), &mut driver).unwrap();
        }
        assert_eq!(
            driver.pending_texts(),
            vec![
                "file a.out",
                "break main.cpp:8",
                "break main",
                "whatis count",
                "bt 30",
                "info registers",
                "info frame",
                "whatis title",
                "run",
            ]
        );
        assert_eq!(console.breakpoints.len(), 2);
        assert_eq!(console.watches.len(), 1);
    }

    #[test]
    fn test_delete_by_number() {
        let mut console = Console::new();
        let mut driver = Driver::new(GdbConfig::default());
        console.dispatch(request("break main.cpp:8"), &mut driver).unwrap();
        driver.clear_queue();
        console.breakpoints[0].lock().unwrap().number = 5;

        assert!(console.dispatch(request("delete 6"), &mut driver).is_err());
        console.dispatch(request("delete 5"), &mut driver).unwrap();
        assert_eq!(driver.pending_texts(), vec!["delete 5"]);
        assert!(console.breakpoints.is_empty());
    }

    #[test]
    fn test_refresh_watches() {
        let mut console = Console::new();
        let mut driver = Driver::new(GdbConfig::default());
        console.dispatch(request("watch x"), &mut driver).unwrap();
        console.dispatch(request("watch y"), &mut driver).unwrap();
        driver.clear_queue();
        console.dispatch(request("watches"), &mut driver).unwrap();
        assert_eq!(driver.pending_texts(), vec!["whatis x", "whatis y"]);
    }

    #[test]
    fn test_quit_drops_pending_commands() {
        let mut console = Console::default();
        let mut driver = Driver::new(GdbConfig::default());
        console.dispatch(request("bt"), &mut driver).unwrap();
        console.dispatch(request("regs"), &mut driver).unwrap();

        console.dispatch(request("quit"), &mut driver).unwrap();
        assert_eq!(driver.pending_texts(), vec!["quit"]);
    }
}
