//! Hover evaluation of an expression

use super::DebuggerCmd;
use crate::gdb::driver::Driver;
use crate::gdb::parser::{classify_type, reconstruct_char_sequence};
use crate::gdb::sink::{lock, TooltipView};
use crate::gdb::types::{Priority, Shared, TipRect, TypeClass};

/// Evaluate an expression and show the result in a tip
pub struct TooltipEvaluation {
    text: String,
    what: String,
    tip: Shared<dyn TooltipView>,
    rect: TipRect,
    is_string: bool,
}

impl TooltipEvaluation {
    pub fn new(
        driver: &Driver,
        what: &str,
        tip: Shared<dyn TooltipView>,
        rect: TipRect,
        is_string: bool,
    ) -> Self {
        let text = if is_string {
            format!("{} {}", driver.config().string_printer, what)
        } else {
            format!("output {}", what)
        };
        Self {
            text,
            what: what.to_string(),
            tip,
            rect,
            is_string,
        }
    }
}

impl DebuggerCmd for TooltipEvaluation {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, _driver: &mut Driver) {
        let text = if output.starts_with("No symbol ") || output.starts_with("Attempt to ") {
            output.to_string()
        } else if self.is_string {
            format!("{}={}", self.what, reconstruct_char_sequence(output))
        } else {
            format!("{}={}", self.what, output)
        };

        let mut tip = lock(&self.tip);
        tip.dispose();
        tip.show(&text, self.rect);
    }
}

/// `whatis` for a hovered expression, then its evaluation
pub struct FindTooltipType {
    text: String,
    what: String,
    tip: Shared<dyn TooltipView>,
    rect: TipRect,
}

impl FindTooltipType {
    pub fn new(what: &str, tip: Shared<dyn TooltipView>, rect: TipRect) -> Self {
        Self {
            text: format!("whatis {}", what),
            what: what.to_string(),
            tip,
            rect,
        }
    }
}

impl DebuggerCmd for FindTooltipType {
    fn text(&self) -> &str {
        &self.text
    }

    fn parse_output(&mut self, output: &str, driver: &mut Driver) {
        let (class, _) = classify_type(
            output,
            &driver.config().string_types,
            &driver.config().char_types,
        );
        let eval = TooltipEvaluation::new(
            driver,
            &self.what,
            self.tip.clone(),
            self.rect,
            class == TypeClass::CompositeString,
        );
        driver.queue_command(eval, Priority::High);
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

    const RECT: TipRect = TipRect {
        x: 10,
        y: 20,
        width: 100,
        height: 16,
    };

    fn tip() -> (Arc<Mutex<RecordingViews>>, Shared<dyn TooltipView>) {
        let views = shared(RecordingViews::default());
        let tip: Shared<dyn TooltipView> = views.clone();
        (views, tip)
    }

    fn shown(views: &Arc<Mutex<RecordingViews>>) -> Vec<ViewEvent> {
        views.lock().unwrap().events.clone()
    }

    #[test]
    fn test_evaluation_requests() {
        let (_views, tip) = tip();
        let (driver, _rx) = driver();
        assert_eq!(
            TooltipEvaluation::new(&driver, "i", tip.clone(), RECT, false).text(),
            "output i"
        );
        assert_eq!(
            TooltipEvaluation::new(&driver, "name", tip, RECT, true).text(),
            "print_wxstring name"
        );
    }

    #[test]
    fn test_value_shown_with_expression() {
        let (views, tip) = tip();
        let (mut driver, _rx) = driver();
        TooltipEvaluation::new(&driver, "i", tip, RECT, false).parse_output("42", &mut driver);
        assert_eq!(
            shown(&views),
            vec![
                ViewEvent::TipDisposed,
                ViewEvent::TipShown {
                    text: "i=42".to_string(),
                    rect: RECT
                }
            ]
        );
    }

    #[test]
    fn test_string_value_reconstructed() {
        let (views, tip) = tip();
        let (mut driver, _rx) = driver();
        TooltipEvaluation::new(&driver, "s", tip, RECT, true)
            .parse_output("{111 'o', 107 'k'}", &mut driver);
        assert_eq!(
            shown(&views)[1],
            ViewEvent::TipShown {
                text: "s=\"ok\"".to_string(),
                rect: RECT
            }
        );
    }

    #[test]
    fn test_errors_shown_verbatim() {
        let (views, tip) = tip();
        let (mut driver, _rx) = driver();
        TooltipEvaluation::new(&driver, "nope", tip.clone(), RECT, false)
            .parse_output("No symbol \"nope\" in current context.", &mut driver);
        TooltipEvaluation::new(&driver, "*p", tip, RECT, false)
            .parse_output("Attempt to take contents of a non-pointer value.", &mut driver);

        let texts: Vec<String> = shown(&views)
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::TipShown { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "No symbol \"nope\" in current context.",
                "Attempt to take contents of a non-pointer value."
            ]
        );
    }

    #[test]
    fn test_find_type_queues_evaluation_first() {
        let (views, tip) = tip();
        let (mut driver, _rx) = driver();
        driver.queue_command(RawCmd::new("bt 30"), Priority::Normal);

        let mut cmd = FindTooltipType::new("title", tip.clone(), RECT);
        assert_eq!(cmd.text(), "whatis title");
        cmd.parse_output("type = const wxString &", &mut driver);

        FindTooltipType::new("n", tip, RECT).parse_output("type = int", &mut driver);
        assert_eq!(
            driver.pending_texts(),
            vec!["print_wxstring title", "output n", "bt 30"]
        );
        assert!(shown(&views).is_empty());
    }
}
