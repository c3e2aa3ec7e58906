//! Documentation parsing.
//!
//! Extracts a summary, an extended description, per-parameter descriptions and
//! return documentation from free-form doc text. Three conventions are
//! recognised and may be mixed:
//!
//! * reStructuredText fields (`:param name: text`, `:returns: text`),
//! * Google style sections (`Args:` followed by indented `name: text` entries),
//! * rustdoc sections (`# Arguments` followed by ``* `name` - text`` items).
//!
//! Parsing never fails. Text that matches none of the conventions is either
//! part of the description or ignored.

use serde::{Deserialize, Serialize};

const PARAM_FIELDS: &[&str] = &["param", "parameter", "arg", "argument", "key", "keyword"];
const RETURN_FIELDS: &[&str] = &["return", "returns"];
const GOOGLE_ARGUMENTS: &[&str] = &["Args", "Arguments", "Parameters", "Params"];
const GOOGLE_RETURNS: &[&str] = &["Returns", "Return", "Yields"];
const GOOGLE_OTHER: &[&str] = &[
    "Raises", "Example", "Examples", "Note", "Notes", "Attributes", "See Also", "Warning",
    "Warnings", "Todo",
];

/// A documented parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocParam {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    description: String,
}

impl DocParam {
    /// Parameter name as written in the documentation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type named in the documentation, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Description text; continuation lines are joined with `\n`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Parsed documentation of a callable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docstring {
    short_description: Option<String>,
    long_description: Option<String>,
    params: Vec<DocParam>,
    returns: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SectionKind {
    Arguments,
    Returns,
    Ignored,
}

enum Heading<'a> {
    Field { spec: &'a str, rest: &'a str },
    Google(SectionKind),
    Rustdoc(SectionKind),
}

impl Docstring {
    /// Parses documentation text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let lines = clean(text);
        let mut doc = Self::default();
        let mut description: Vec<&str> = Vec::new();
        let mut describing = true;
        let mut in_fence = false;
        let mut index = 0;

        while index < lines.len() {
            let line = lines[index].as_str();
            if is_fence(line) {
                in_fence = !in_fence;
            }

            let found = if in_fence { None } else { heading(line) };
            match found {
                None => {
                    if describing {
                        description.push(line);
                    }
                    index += 1;
                }
                Some(Heading::Field { spec, rest }) => {
                    describing = false;
                    let end = section_end(&lines, index + 1, false);
                    doc.apply_field(spec, &join_entry(rest, &lines[index + 1..end]));
                    index = end;
                }
                Some(Heading::Google(kind)) => {
                    describing = false;
                    let end = section_end(&lines, index + 1, true);
                    doc.apply_section(kind, &dedent(&lines[index + 1..end]), false);
                    index = end;
                }
                Some(Heading::Rustdoc(kind)) => {
                    describing = false;
                    let end = rustdoc_section_end(&lines, index + 1);
                    doc.apply_section(kind, &dedent(&lines[index + 1..end]), true);
                    index = end;
                }
            }
        }

        doc.set_description(&description);
        doc
    }

    /// The first line of the description.
    #[must_use]
    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    /// The remainder of the description, if any.
    #[must_use]
    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// Documented parameters in documentation order.
    #[must_use]
    pub fn params(&self) -> &[DocParam] {
        &self.params
    }

    /// Looks up a documented parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&DocParam> {
        self.params.iter().find(|param| param.name == name)
    }

    /// Return value documentation.
    #[must_use]
    pub fn returns(&self) -> Option<&str> {
        self.returns.as_deref()
    }

    fn set_description(&mut self, lines: &[&str]) {
        let start = lines.iter().position(|line| !line.trim().is_empty());
        let Some(start) = start else {
            return;
        };

        let block = &lines[start..];
        self.short_description = Some(block[0].trim().to_owned());
        let rest = block[1..].join("\n");
        let rest = rest.trim();
        if !rest.is_empty() {
            self.long_description = Some(rest.to_owned());
        }
    }

    fn apply_field(&mut self, spec: &str, text: &str) {
        let words: Vec<&str> = spec.split_whitespace().collect();
        let Some((kind, operands)) = words.split_first() else {
            return;
        };

        if PARAM_FIELDS.contains(kind) {
            let Some((name, type_words)) = operands.split_last() else {
                return;
            };
            let type_name = (!type_words.is_empty()).then(|| type_words.join(" "));
            self.push_param(name, type_name, text.to_owned());
        } else if RETURN_FIELDS.contains(kind) && !text.is_empty() {
            self.returns = Some(text.to_owned());
        }
    }

    fn apply_section(&mut self, kind: SectionKind, body: &[String], rustdoc: bool) {
        match kind {
            SectionKind::Arguments => {
                for (header, continuation) in entries(body, rustdoc) {
                    let parsed = if rustdoc {
                        split_list_item(header)
                    } else {
                        split_google_item(header)
                    };
                    if let Some((name, type_name, first)) = parsed {
                        self.push_param(name, type_name, join_entry(first, continuation));
                    }
                }
            }
            SectionKind::Returns => {
                let text = body.join("\n");
                let text = text.trim();
                if !text.is_empty() {
                    self.returns = Some(text.to_owned());
                }
            }
            SectionKind::Ignored => {}
        }
    }

    fn push_param(&mut self, name: &str, type_name: Option<String>, description: String) {
        if !is_identifier(name) || self.param(name).is_some() {
            return;
        }
        self.params.push(DocParam {
            name: name.to_owned(),
            type_name,
            description,
        });
    }
}

fn heading(line: &str) -> Option<Heading<'_>> {
    if let Some(stripped) = line.strip_prefix(':') {
        let (spec, rest) = stripped.split_once(':')?;
        if spec.trim().is_empty() {
            return None;
        }
        return Some(Heading::Field { spec, rest });
    }

    if let Some(title) = line.strip_prefix("# ") {
        return Some(Heading::Rustdoc(rustdoc_kind(title.trim())));
    }

    let title = line.trim_end().strip_suffix(':')?;
    if GOOGLE_ARGUMENTS.contains(&title) {
        Some(Heading::Google(SectionKind::Arguments))
    } else if GOOGLE_RETURNS.contains(&title) {
        Some(Heading::Google(SectionKind::Returns))
    } else if GOOGLE_OTHER.contains(&title) {
        Some(Heading::Google(SectionKind::Ignored))
    } else {
        None
    }
}

fn rustdoc_kind(title: &str) -> SectionKind {
    match title.to_ascii_lowercase().as_str() {
        "arguments" | "args" | "parameters" | "params" => SectionKind::Arguments,
        "returns" | "return" => SectionKind::Returns,
        _ => SectionKind::Ignored,
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Finds where a field or Google section body ends.
///
/// Field bodies run until the next heading. Google section bodies also stop at
/// the first non-indented line.
fn section_end(lines: &[String], start: usize, indented_only: bool) -> usize {
    let mut end = start;
    while end < lines.len() {
        let line = lines[end].as_str();
        if heading(line).is_some() {
            break;
        }
        if indented_only && !line.trim().is_empty() && !line.starts_with(char::is_whitespace) {
            break;
        }
        end += 1;
    }
    end
}

fn rustdoc_section_end(lines: &[String], start: usize) -> usize {
    let mut in_fence = false;
    let mut end = start;
    while end < lines.len() {
        let line = lines[end].as_str();
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && matches!(heading(line), Some(Heading::Rustdoc(_))) {
            break;
        }
        end += 1;
    }
    end
}

/// Groups section lines into entries: an entry starts on a non-indented line
/// (or a list bullet) and owns the indented lines that follow it.
fn entries(body: &[String], rustdoc: bool) -> Vec<(&str, &[String])> {
    let starts: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.as_str();
            if rustdoc {
                line.starts_with("* ") || line.starts_with("- ")
            } else {
                !line.trim().is_empty() && !line.starts_with(char::is_whitespace)
            }
        })
        .map(|(index, _)| index)
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(position, &start)| {
            let end = starts.get(position + 1).copied().unwrap_or(body.len());
            (body[start].as_str(), &body[start + 1..end])
        })
        .collect()
}

/// Splits `name (type): text` or `name: text`.
fn split_google_item(header: &str) -> Option<(&str, Option<String>, &str)> {
    let (left, text) = header.split_once(':')?;
    let left = left.trim();
    match left.split_once('(') {
        Some((name, type_part)) => {
            let type_name = type_part.trim_end().trim_end_matches(')').trim();
            Some((name.trim(), Some(type_name.to_owned()), text))
        }
        None => Some((left, None, text)),
    }
}

/// Splits ``* `name` - text``, ``- `name`: text`` or `* name - text`.
fn split_list_item(header: &str) -> Option<(&str, Option<String>, &str)> {
    let item = header[2..].trim_start();
    let (name, rest) = if let Some(quoted) = item.strip_prefix('`') {
        quoted.split_once('`')?
    } else {
        let end = item
            .find(|c: char| c.is_whitespace() || c == ':')
            .unwrap_or(item.len());
        item.split_at(end)
    };

    let rest = rest.trim_start();
    let text = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('-'))
        .unwrap_or(rest);
    Some((name.trim(), None, text))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Normalises raw doc text: tabs become spaces, the first line is trimmed, the
/// common indentation of the remaining lines is removed, and surrounding blank
/// lines are dropped.
fn clean(text: &str) -> Vec<String> {
    let expanded = text.replace('\t', "    ");
    let mut lines = expanded.lines();
    let first = lines.next().map(str::trim).unwrap_or_default().to_owned();
    let rest: Vec<String> = lines.map(str::to_owned).collect();

    let mut cleaned = vec![first];
    cleaned.extend(dedent(&rest));
    for line in &mut cleaned {
        line.truncate(line.trim_end().len());
    }

    let start = cleaned
        .iter()
        .position(|line| !line.is_empty())
        .unwrap_or(cleaned.len());
    let end = cleaned
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(start, |last| last + 1);
    cleaned[start..end].to_vec()
}

fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| leading_whitespace(line))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                let start = line.char_indices().nth(indent).map_or(line.len(), |(at, _)| at);
                line[start..].to_owned()
            }
        })
        .collect()
}

/// Indentation width in characters, not bytes.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Joins the text following an entry header with its continuation lines.
fn join_entry(first: &str, continuation: &[String]) -> String {
    let mut parts = vec![first.trim().to_owned()];
    parts.extend(dedent(continuation).into_iter().map(|line| line.trim_end().to_owned()));
    parts.join("\n").trim().to_owned()
}
