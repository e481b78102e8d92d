// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw document text before it reaches the tokenizer.
//
// News corpora exported from SGML/HTML carry stray control
// characters, non-breaking spaces and entity leftovers. The
// tokenizer splits on whitespace and punctuation, so all we need
// is a single-line string with plain spaces:
//
//   1. Map Unicode whitespace and control characters to a space
//   2. Decode the handful of HTML entities news wires leave behind
//   3. Collapse runs of spaces and trim

pub struct Preprocessor;

const ENTITIES: [(&str, &str); 5] = [
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, text: &str) -> String {
        let mut decoded = text.to_string();
        // &amp; last so "&amp;lt;" stays "&lt;"
        for (entity, plain) in ENTITIES {
            if decoded.contains(entity) {
                decoded = decoded.replace(entity, plain);
            }
        }

        let mut out        = String::with_capacity(decoded.len());
        let mut last_space = true;
        for c in decoded.chars() {
            let c = if c.is_whitespace() || c.is_control() || c == '\u{200B}' || c == '\u{FEFF}' {
                ' '
            } else {
                c
            };
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  oil\n\n prices\t rose  "), "oil prices rose");
    }

    #[test]
    fn test_removes_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("wheat\x03exports"), "wheat exports");
    }

    #[test]
    fn test_decodes_entities() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("AT&amp;T &lt;ATT&gt;"), "AT&T <ATT>");
        assert_eq!(p.clean("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(Preprocessor::new().clean(""), "");
    }
}
