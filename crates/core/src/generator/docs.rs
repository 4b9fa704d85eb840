//! XML doc-comment re-emission.

use super::utils::escape_csharp_string;

/// Plain, single-line, XML-escaped text for a doc tag.
pub fn xml_safe(text: &str) -> String {
    let plain: Vec<&str> = text.lines().map(strip_list_marker).collect();
    let collapsed = plain
        .join(" ")
        .replace('`', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    escape_xml(&collapsed)
}

/// `  - item` -> `item`
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    ["- ", "* ", "-\t"]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(*marker))
        .unwrap_or(trimmed)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `[Obsolete]` message: one line, quotes escaped.
pub fn obsolete_message(message: &str) -> String {
    escape_csharp_string(&message.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Builder for a `///` block at a fixed indentation.
#[derive(Debug)]
pub struct DocBlock {
    indent: String,
    lines: Vec<String>,
}

impl DocBlock {
    pub fn new(indent: usize) -> Self {
        Self {
            indent: " ".repeat(indent),
            lines: Vec::new(),
        }
    }

    pub fn summary(&mut self, text: &str) -> &mut Self {
        self.lines.push("<summary>".to_string());
        self.lines.push(xml_safe(text));
        self.lines.push("</summary>".to_string());
        self
    }

    pub fn param(&mut self, name: &str, text: &str) -> &mut Self {
        self.lines
            .push(format!("<param name=\"{name}\">{}</param>", xml_safe(text)));
        self
    }

    pub fn returns(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("<returns>{}</returns>", xml_safe(text)));
        self
    }

    /// Code lines are escaped but keep their layout.
    pub fn example(&mut self, code: &str) -> &mut Self {
        self.lines.push("<example>".to_string());
        self.lines.push("<code>".to_string());
        for line in code.lines() {
            self.lines.push(escape_xml(line));
        }
        self.lines.push("</code>".to_string());
        self.lines.push("</example>".to_string());
        self
    }

    pub fn raw(&mut self, line: &str) -> &mut Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    format!("{}///", self.indent)
                } else {
                    format!("{}/// {line}", self.indent)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_safe_rewrites_markdown() {
        assert_eq!(
            xml_safe("Returns the `id`.\n - first <item>\n - a & b"),
            "Returns the id. first &lt;item&gt; a &amp; b"
        );
    }

    #[test]
    fn test_obsolete_message() {
        assert_eq!(
            obsolete_message("Use \"share\"\n  instead."),
            "Use \\\"share\\\" instead."
        );
    }

    #[test]
    fn test_doc_block() {
        let mut doc = DocBlock::new(8);
        doc.summary("Gets the id.").param("key", "storage key").example("var a = 1 < 2;");
        assert_eq!(
            doc.render(),
            "        /// <summary>\n        /// Gets the id.\n        /// </summary>\n        /// <param name=\"key\">storage key</param>\n        /// <example>\n        /// <code>\n        /// var a = 1 &lt; 2;\n        /// </code>\n        /// </example>"
        );
    }
}
