// Captured program output

/// Buffer standing in for stdout while a script runs
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    pub lines: Vec<OutputLine>,
    /// Text written since the last newline
    pending: Option<OutputLine>,
}

/// A line of output with the source line of the `print` that finished it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub source_line: usize,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text, splitting it into lines on `\n`
    pub fn write(&mut self, text: &str, source_line: usize) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            // Every part except the last was terminated by a newline
            let terminated = parts.peek().is_some();
            if part.is_empty() && !terminated {
                break;
            }

            let line = self.pending.get_or_insert_with(|| OutputLine {
                text: String::new(),
                source_line,
            });
            line.text.push_str(part);
            line.source_line = source_line;

            if terminated {
                if let Some(done) = self.pending.take() {
                    self.lines.push(done);
                }
            }
        }
    }

    /// All output as lines, including an unterminated final line
    pub fn get_output(&self) -> Vec<String> {
        self.lines
            .iter()
            .chain(self.pending.iter())
            .map(|line| line.text.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_on_newline() {
        let mut out = OutputBuffer::new();
        out.write("a b\n", 3);
        out.write("partial", 4);
        out.write(" done\nnext\n", 5);

        assert_eq!(out.get_output(), vec!["a b", "partial done", "next"]);
        assert_eq!(out.lines[1].source_line, 5);
    }

    #[test]
    fn test_unterminated_output_is_kept() {
        let mut out = OutputBuffer::new();
        assert!(out.is_empty());
        out.write("no newline", 1);
        assert_eq!(out.get_output(), vec!["no newline"]);
    }
}
