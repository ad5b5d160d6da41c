//! Local variables, arguments and watched expressions

use super::{wrap_as_structure, DebuggerCmd};
use crate::gdb::driver::Driver;
use crate::gdb::parser::{classify_type, reconstruct_char_sequence, split_lines};
use crate::gdb::sink::{lock, WatchTree};
use crate::gdb::types::{Priority, Shared, TypeClass, Watch, WatchFormat};

/// `info locals`
pub struct InfoLocals {
    tree: Shared<dyn WatchTree>,
}

impl InfoLocals {
    pub fn new(tree: Shared<dyn WatchTree>) -> Self {
        Self { tree }
    }
}

impl DebuggerCmd for InfoLocals {
    fn text(&self) -> &str {
        "info locals"
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        let text = wrap_as_structure("Local variables", &split_lines(output));
        lock(&self.tree).build_tree(None, &text);
    }
}

/// `info args`
pub struct InfoArguments {
    tree: Shared<dyn WatchTree>,
}

impl InfoArguments {
    pub fn new(tree: Shared<dyn WatchTree>) -> Self {
        Self { tree }
    }
}

impl DebuggerCmd for InfoArguments {
    fn text(&self) -> &str {
        "info args"
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        let text = wrap_as_structure("Function Arguments", &split_lines(output));
        lock(&self.tree).build_tree(None, &text);
    }
}

/// Print a watch's value in its display format
pub struct WatchValue {
    text: String,
    /// Format the request was built for
    format: WatchFormat,
    tree: Shared<dyn WatchTree>,
    watch: Shared<Watch>,
}

impl WatchValue {
    pub fn new(driver: &Driver, tree: Shared<dyn WatchTree>, watch: Shared<Watch>) -> Self {
        let (text, format) = {
            let w = lock(&watch);
            let text = match w.format {
                WatchFormat::CompositeString => {
                    format!("{} {}", driver.config().string_printer, w.keyword)
                }
                format => match format.output_modifier() {
                    Some(modifier) => format!("output {} {}", modifier, w.keyword),
                    None => format!("output {}", w.keyword),
                },
            };
            (text, w.format)
        };
        Self {
            text,
            format,
            tree,
            watch,
        }
    }
}

impl DebuggerCmd for WatchValue {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        let watch = lock(&self.watch).clone();
        let mut text = format!("{} = ", watch.keyword);
        for line in split_lines(output) {
            if self.format == WatchFormat::CompositeString {
                text.push_str(&reconstruct_char_sequence(line));
            } else {
                text.push_str(line);
            }
            text.push(',');
        }
        text.push('\n');
        lock(&self.tree).build_tree(Some(&watch), &text);
    }
}

/// `whatis` for a watch, then its value with the right format.
///
/// The print modifier depends on the type, so the value request can only be
/// built once the type is known.
pub struct FindWatchType {
    text: String,
    tree: Shared<dyn WatchTree>,
    watch: Shared<Watch>,
}

impl FindWatchType {
    pub fn new(tree: Shared<dyn WatchTree>, watch: Shared<Watch>) -> Self {
        let text = format!("whatis {}", lock(&watch).keyword);
        Self { text, tree, watch }
    }
}

impl DebuggerCmd for FindWatchType {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        // type = wxString
        // type = const wxChar
        // type = Action *
        let (class, type_name) = classify_type(
            output,
            &driver.config().string_types,
            &driver.config().char_types,
        );
        {
            let mut watch = lock(&self.watch);
            match class {
                TypeClass::CompositeString => watch.format = WatchFormat::CompositeString,
                TypeClass::Char => watch.format = WatchFormat::Char,
                TypeClass::Plain => {}
            }
            if !type_name.is_empty() {
                watch.type_name = Some(type_name);
            }
        }

        let value = WatchValue::new(driver, self.tree.clone(), self.watch.clone());
        driver.queue_command(value, Priority::High);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::RawCmd;
    use super::*;
    use crate::gdb::sink::{RecordingViews, ViewEvent};
    use crate::gdb::types::shared;
    use std::sync::{Arc, Mutex};

    fn tree() -> (Arc<Mutex<RecordingViews>>, Shared<dyn WatchTree>) {
        let views = shared(RecordingViews::default());
        let tree: Shared<dyn WatchTree> = views.clone();
        (views, tree)
    }

    #[test]
    fn test_info_locals() {
        let (views, tree) = tree();
        let (mut driver, _rx) = driver();
        let mut cmd = InfoLocals::new(tree);
        assert_eq!(cmd.text(), "info locals");
        cmd.parse_output("i = 3\nname = 0x4030a0 \"abc\"", &mut driver);
        assert_eq!(
            views.lock().unwrap().events,
            vec![ViewEvent::Tree {
                watch: None,
                text: "Local variables = {i = 3,name = 0x4030a0 \"abc\",}\n".to_string()
            }]
        );
    }

    #[test]
    fn test_info_args() {
        let (views, tree) = tree();
        let (mut driver, _rx) = driver();
        let mut cmd = InfoArguments::new(tree);
        assert_eq!(cmd.text(), "info args");
        cmd.parse_output("argc = 1\nargv = 0x3e3cb0", &mut driver);
        assert_eq!(
            views.lock().unwrap().tree_texts(),
            vec!["Function Arguments = {argc = 1,argv = 0x3e3cb0,}\n"]
        );
    }

    #[test]
    fn test_watch_requests() {
        let (_views, tree) = tree();
        let (driver, _rx) = driver();
        let text = |format: WatchFormat| {
            let watch = shared(Watch::new("count").with_format(format));
            WatchValue::new(&driver, tree.clone(), watch).text().to_string()
        };
        assert_eq!(text(WatchFormat::Undefined), "output count");
        assert_eq!(text(WatchFormat::Decimal), "output /d count");
        assert_eq!(text(WatchFormat::Unsigned), "output /u count");
        assert_eq!(text(WatchFormat::Hex), "output /x count");
        assert_eq!(text(WatchFormat::Binary), "output /t count");
        assert_eq!(text(WatchFormat::Char), "output /c count");
        assert_eq!(text(WatchFormat::CompositeString), "print_wxstring count");
    }

    #[test]
    fn test_watch_value_verbatim() {
        let (views, tree) = tree();
        let (mut driver, _rx) = driver();
        let watch = shared(Watch::new("p").with_format(WatchFormat::Hex));
        WatchValue::new(&driver, tree, watch).parse_output("{x = 0x1, y = 0x2}", &mut driver);
        assert_eq!(
            views.lock().unwrap().events,
            vec![ViewEvent::Tree {
                watch: Some("p".to_string()),
                text: "p = {x = 0x1, y = 0x2},\n".to_string()
            }]
        );
    }

    #[test]
    fn test_watch_value_composite_string() {
        let (views, tree) = tree();
        let (mut driver, _rx) = driver();
        let watch = shared(Watch::new("title").with_format(WatchFormat::CompositeString));
        WatchValue::new(&driver, tree, watch).parse_output("{72 'H', 105 'i'}", &mut driver);
        assert_eq!(views.lock().unwrap().tree_texts(), vec!["title = \"Hi\",\n"]);
    }

    #[test]
    fn test_find_watch_type_queues_value_first() {
        let (_views, tree) = tree();
        let (mut driver, _rx) = driver();
        driver.queue_command(RawCmd::new("info registers"), Priority::Normal);
        driver.queue_command(RawCmd::new("bt 30"), Priority::Normal);

        let watch = shared(Watch::new("title"));
        let mut cmd = FindWatchType::new(tree, watch.clone());
        assert_eq!(cmd.text(), "whatis title");
        cmd.parse_output("type = wxString", &mut driver);

        assert_eq!(
            driver.pending_texts(),
            vec!["print_wxstring title", "info registers", "bt 30"]
        );
        let w = watch.lock().unwrap();
        assert_eq!(w.format, WatchFormat::CompositeString);
        assert_eq!(w.type_name.as_deref(), Some("wxString"));
    }

    #[test]
    fn test_find_watch_type_char_and_plain() {
        let (_views, tree) = tree();
        let (mut driver, _rx) = driver();

        let watch = shared(Watch::new("c"));
        FindWatchType::new(tree.clone(), watch.clone())
            .parse_output("type = const wxChar", &mut driver);
        assert_eq!(watch.lock().unwrap().format, WatchFormat::Char);

        let watch = shared(Watch::new("n").with_format(WatchFormat::Hex));
        FindWatchType::new(tree, watch.clone()).parse_output("type = int", &mut driver);
        assert_eq!(watch.lock().unwrap().format, WatchFormat::Hex);

        assert_eq!(driver.pending_texts(), vec!["output /c c", "output /x n"]);
    }

    #[test]
    fn test_find_watch_type_unknown_symbol() {
        let (_views, tree) = tree();
        let (mut driver, _rx) = driver();
        let watch = shared(Watch::new("nope"));
        FindWatchType::new(tree, watch.clone())
            .parse_output("No symbol \"nope\" in current context.", &mut driver);
        assert_eq!(watch.lock().unwrap().type_name, None);
        assert_eq!(driver.pending_texts(), vec!["output nope"]);
    }
}
