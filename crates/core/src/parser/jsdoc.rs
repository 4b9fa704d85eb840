//! JSDoc block parsing.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsDoc {
    pub description: Option<String>,
    /// `@param` descriptions keyed by parameter name, in source order.
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
    pub examples: Vec<String>,
    /// `Some("")` when `@deprecated` carries no message.
    pub deprecated: Option<String>,
}

impl JsDoc {
    /// Parse a raw `/** ... */` comment.
    pub fn parse(raw: &str) -> Self {
        let body = raw
            .trim()
            .trim_start_matches("/**")
            .trim_end_matches("*/");

        let lines: Vec<&str> = body.lines().map(strip_star).collect();

        let mut doc = Self::default();
        let mut leading: Vec<&str> = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in lines {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix('@') {
                if let Some((tag, text)) = current.take() {
                    doc.apply_tag(&tag, &text);
                }
                let (tag, text) = rest
                    .split_once(char::is_whitespace)
                    .unwrap_or((rest, ""));
                current = Some((tag.to_string(), vec![text.to_string()]));
            } else if let Some((_, text)) = current.as_mut() {
                text.push(line.to_string());
            } else {
                leading.push(line);
            }
        }
        if let Some((tag, text)) = current.take() {
            doc.apply_tag(&tag, &text);
        }

        if doc.description.is_none() {
            doc.description = non_empty(&leading.join("\n"));
        }
        doc
    }

    fn apply_tag(&mut self, tag: &str, lines: &[String]) {
        let text = lines.join("\n");
        match tag {
            "param" | "arg" | "argument" => {
                if let Some((name, desc)) = parse_param_tag(&text) {
                    self.params.push((name, desc));
                }
            }
            "returns" | "return" => {
                self.returns = non_empty(strip_type_annotation(text.trim()));
            }
            "example" => {
                if let Some(example) = non_empty(&dedent(&text)) {
                    self.examples.push(example);
                }
            }
            "deprecated" => {
                self.deprecated = Some(text.trim().to_string());
            }
            "description" | "desc" => {
                self.description = non_empty(&text);
            }
            _ => {}
        }
    }

    /// Description of a parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_str())
    }
}

/// Drop the leading ` * ` decoration of a comment line.
fn strip_star(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => trimmed,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn strip_type_annotation(text: &str) -> &str {
    if text.starts_with('{') {
        if let Some(end) = text.find('}') {
            return text[end + 1..].trim_start();
        }
    }
    text
}

/// `{Type} [name=default] - description` -> (`name`, `description`)
fn parse_param_tag(text: &str) -> Option<(String, String)> {
    let text = strip_type_annotation(text.trim());
    let (name, rest) = text
        .split_once(char::is_whitespace)
        .unwrap_or((text, ""));
    let name = name
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split('=')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() {
        return None;
    }
    let desc = rest.trim().trim_start_matches('-').trim();
    Some((name.to_string(), desc.to_string()))
}

/// Remove the common leading indentation of a block.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
