use crate::text::is_blank;

/// Line accumulator behind the directions and notes lists.
///
/// Each non-blank line becomes one entry. A run of blank lines is held back
/// and committed as a single empty entry (a paragraph break) only once more
/// content arrives, so a section never ends on a break.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    pending_break: bool,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw line to `target`.
    pub fn push(&mut self, target: &mut Vec<String>, raw_line: &str) {
        if is_blank(raw_line) {
            if !target.is_empty() {
                self.pending_break = true;
            }
            return;
        }

        if self.pending_break {
            target.push(String::new());
            self.pending_break = false;
        }
        target.push(raw_line.trim().to_string());
    }

    /// Commit buffered state at the end of a section.
    pub fn flush(&mut self) {
        self.pending_break = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_trimmed_and_kept_in_order() {
        let mut acc = TextAccumulator::new();
        let mut out = Vec::new();
        acc.push(&mut out, "  Boil the peas. ");
        acc.push(&mut out, "Serve hot.");
        assert_eq!(out, vec!["Boil the peas.", "Serve hot."]);
    }

    #[test]
    fn test_blank_runs_become_one_break() {
        let mut acc = TextAccumulator::new();
        let mut out = Vec::new();
        acc.push(&mut out, "");
        acc.push(&mut out, "First.");
        acc.push(&mut out, "");
        acc.push(&mut out, "   ");
        acc.push(&mut out, "Second.");
        assert_eq!(out, vec!["First.", "", "Second."]);
    }

    #[test]
    fn test_flush_drops_trailing_break() {
        let mut acc = TextAccumulator::new();
        let mut out = Vec::new();
        acc.push(&mut out, "Only line.");
        acc.push(&mut out, "");
        acc.flush();
        acc.push(&mut out, "After flush.");
        assert_eq!(out, vec!["Only line.", "After flush."]);
    }
}
