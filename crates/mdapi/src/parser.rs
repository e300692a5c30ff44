//! line scanner turning markdown text into a [Document]
//!
//! ~~~text
//! # free prose is ignored
//!
//! ## vars
//! ### host
//! ```text
//! example.com
//! ```
//! ### env[list]:upper
//! - dev
//! - prod
//!
//! ## type[http]
//! ### url
//! ```
//! https://{{host}}/{{env}}
//! ```
//!
//! ## after
//! ### status[script]:trim
//! ```sh
//! cat {{RESULTDIR}}/status
//! ```
//! ~~~
//!
//! Every header is recognized by an explicit parse that reports a [ParseError] on mismatch.
use crate::document::{ApiType, ComponentKind, Document, TypedComponent, Value, TEXT_CONTENT};

const SECTION: &str = "## ";
const SUBSECTION: &str = "### ";
const VARS_SECTION: &str = "vars";
const AFTER_SECTION: &str = "after";
const TYPE_SECTION: &str = "type";
const FENCE: &str = "```";
const LIST_ITEM: &str = "- ";

pub fn parse(text: &str) -> Result<Document, ParseError> {
    let mut scanner = Scanner::new(text);
    let mut document = Document::default();
    let mut seen_sections: Vec<(&'static str, usize)> = vec![];

    while let Some(line) = scanner.next_line() {
        let Some(section) = line.strip_prefix(SECTION) else {
            continue;
        };
        let line_number = scanner.line_number();

        let name = match section_word(section) {
            VARS_SECTION if section == VARS_SECTION => VARS_SECTION,
            AFTER_SECTION if section == AFTER_SECTION => AFTER_SECTION,
            TYPE_SECTION => TYPE_SECTION,
            _ => {
                tracing::debug!(line = line_number, section, "ignoring section");
                continue;
            }
        };

        if let Some((_, first)) = seen_sections.iter().find(|(seen, _)| *seen == name) {
            return Err(ParseError::DuplicateSection {
                line: line_number,
                section: name.to_string(),
                first: *first,
            });
        }
        seen_sections.push((name, line_number));

        match name {
            VARS_SECTION => document.variables = parse_components(&mut scanner)?,
            AFTER_SECTION => document.after_variables = parse_components(&mut scanner)?,
            _ => {
                let kind = parse_action_header(section).ok_or_else(|| {
                    ParseError::InvalidActionHeader {
                        line: line_number,
                        header: line.to_string(),
                    }
                })?;
                let fields = parse_components(&mut scanner)?;
                document.action = Some(ApiType { kind, fields });
            }
        }
    }

    Ok(document)
}

/// Components of one section, up to (not including) the next `## ` line
fn parse_components(scanner: &mut Scanner) -> Result<Vec<TypedComponent>, ParseError> {
    let mut components: Vec<TypedComponent> = vec![];

    while let Some(line) = scanner.peek() {
        if is_section(line) {
            break;
        }
        scanner.advance();

        let Some(header) = line.strip_prefix(SUBSECTION) else {
            continue;
        };
        let line_number = scanner.line_number();
        let header = ComponentHeader::parse(header, line_number)?;

        if let Some(existing) = components.iter().find(|c| c.name == header.name) {
            return Err(ParseError::DuplicateComponent {
                line: line_number,
                name: header.name,
                first: existing.line,
            });
        }

        let values = match header.kind {
            ComponentKind::List => parse_list(scanner),
            _ => vec![parse_fenced(scanner)?],
        };

        tracing::trace!(name = %header.name, kind = %header.kind, values = values.len(), "component parsed");
        components.push(TypedComponent {
            name: header.name,
            kind: header.kind,
            converters: header.converters,
            values,
            line: line_number,
        });
    }

    Ok(components)
}

fn parse_list(scanner: &mut Scanner) -> Vec<Value> {
    let mut values = vec![];
    while let Some(line) = scanner.peek() {
        if is_section(line) || is_subsection(line) {
            break;
        }
        scanner.advance();

        if let Some(item) = line.strip_prefix(LIST_ITEM) {
            values.push(Value::text(item));
        }
    }
    values
}

/// Body of a single-valued component
///
/// Once a fence is open everything up to the closing fence is content, headers included.
fn parse_fenced(scanner: &mut Scanner) -> Result<Value, ParseError> {
    let mut opened: Option<(usize, String)> = None;
    let mut body: Vec<&str> = vec![];

    while let Some(line) = scanner.peek() {
        if opened.is_none() && (is_section(line) || is_subsection(line)) {
            break;
        }
        scanner.advance();

        if let Some(annotation) = line.strip_prefix(FENCE) {
            if let Some((_, content_kind)) = opened {
                return Ok(Value::new(body.join("\n").trim().to_string(), content_kind));
            }

            let annotation = annotation.trim();
            let content_kind = if annotation.is_empty() {
                TEXT_CONTENT
            } else {
                annotation
            };
            opened = Some((scanner.line_number(), content_kind.to_string()));
            continue;
        }

        if opened.is_some() {
            body.push(line);
        }
    }

    match opened {
        Some((line, _)) => Err(ParseError::UnterminatedFence { line }),
        None => Ok(Value::text("")),
    }
}

fn is_section(line: &str) -> bool {
    line.starts_with(SECTION)
}

fn is_subsection(line: &str) -> bool {
    line.starts_with(SUBSECTION)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_identifier_char)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Leading word of a section title, `type` for `type[http]`
fn section_word(section: &str) -> &str {
    section
        .split(|c: char| c == '[' || c.is_whitespace())
        .next()
        .unwrap_or_default()
}

/// `type[<kind>]`
fn parse_action_header(section: &str) -> Option<String> {
    let rest = section.strip_prefix(TYPE_SECTION)?.strip_prefix('[')?;
    let (kind, rest) = rest.split_once(']')?;
    (is_identifier(kind) && rest.trim().is_empty()).then(|| kind.to_string())
}

/// `<name>([<type>])?(:<converter>)*`
#[derive(Debug, PartialEq)]
struct ComponentHeader {
    name: String,
    kind: ComponentKind,
    converters: Vec<String>,
}

impl ComponentHeader {
    fn parse(header: &str, line: usize) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidComponentHeader {
            line,
            header: format!("{SUBSECTION}{header}"),
        };

        let header = header.trim_end();
        let name_end = header
            .find(|c: char| !is_identifier_char(c))
            .unwrap_or(header.len());
        let (name, mut rest) = header.split_at(name_end);
        if name.is_empty() {
            return Err(invalid());
        }

        let mut kind = ComponentKind::Text;
        if let Some(bracketed) = rest.strip_prefix('[') {
            let (kind_name, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            if !is_identifier(kind_name) {
                return Err(invalid());
            }
            kind = ComponentKind::parse(kind_name).ok_or_else(|| ParseError::UnknownComponentType {
                line,
                kind: kind_name.to_string(),
            })?;
            rest = after;
        }

        let converters = if rest.is_empty() {
            vec![]
        } else {
            let chain = rest.strip_prefix(':').ok_or_else(invalid)?;
            chain
                .split(':')
                .map(|converter| {
                    if converter.is_empty() || converter.contains(char::is_whitespace) {
                        Err(invalid())
                    } else {
                        Ok(converter.to_string())
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            converters,
        })
    }
}

/// Cursor over the document's lines
struct Scanner<'a> {
    lines: Vec<&'a str>,
    /// index of the next line
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self { lines, position: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.advance();
        Some(line)
    }

    /// 1-based number of the most recently consumed line
    fn line_number(&self) -> usize {
        self.position
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: malformed component header {header:?}, expected `### name[type]:converter`")]
    InvalidComponentHeader { line: usize, header: String },
    #[error("line {line}: unknown component type {kind:?}")]
    UnknownComponentType { line: usize, kind: String },
    #[error("line {line}: malformed action header {header:?}, expected `## type[<kind>]`")]
    InvalidActionHeader { line: usize, header: String },
    #[error("line {line}: fenced block is never closed")]
    UnterminatedFence { line: usize },
    #[error("line {line}: component {name:?} was already declared on line {first}")]
    DuplicateComponent {
        line: usize,
        name: String,
        first: usize,
    },
    #[error("line {line}: section {section:?} was already declared on line {first}")]
    DuplicateSection {
        line: usize,
        section: String,
        first: usize,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXAMPLE: &str = r#"# Example api

Some prose that is not part of any section.

## vars
### host
```
example.com
```
### path:urlencode
```text
/a b
```
### env[list]:upper:trim
- dev
- prod

### token[script]
```sh
printf secret
```
### hosts[file_list]
```
hosts.txt
```

## type[http]
### url
```
https://{{host}}{{path}}
```

## after
### status[script]
```
cat {{RESULTDIR}}/status
```
"#;

    fn component(
        name: &str,
        kind: ComponentKind,
        converters: &[&str],
        values: Vec<Value>,
        line: usize,
    ) -> TypedComponent {
        TypedComponent {
            name: name.to_string(),
            kind,
            converters: converters.iter().map(|c| c.to_string()).collect(),
            values,
            line,
        }
    }

    #[test]
    fn parses_all_sections() {
        let document = parse(EXAMPLE).expect("valid document");

        assert_eq!(
            document.variables,
            vec![
                component("host", ComponentKind::Text, &[], vec![Value::text("example.com")], 6),
                component("path", ComponentKind::Text, &["urlencode"], vec![Value::text("/a b")], 10),
                component(
                    "env",
                    ComponentKind::List,
                    &["upper", "trim"],
                    vec![Value::text("dev"), Value::text("prod")],
                    14
                ),
                component(
                    "token",
                    ComponentKind::Script,
                    &[],
                    vec![Value::new("printf secret".to_string(), "sh".to_string())],
                    18
                ),
                component("hosts", ComponentKind::FileList, &[], vec![Value::text("hosts.txt")], 22),
            ]
        );

        let action = document.action.expect("action section");
        assert_eq!(action.kind, "http");
        assert_eq!(
            action.fields,
            vec![component(
                "url",
                ComponentKind::Text,
                &[],
                vec![Value::text("https://{{host}}{{path}}")],
                28
            )]
        );

        assert_eq!(
            document.after_variables,
            vec![component(
                "status",
                ComponentKind::Script,
                &[],
                vec![Value::text("cat {{RESULTDIR}}/status")],
                34
            )]
        );
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(EXAMPLE), parse(EXAMPLE));
    }

    #[test]
    fn fenced_content_is_joined_and_trimmed() {
        let document = parse("## vars\n### body[text]\n```json\n\n  {\n    \"a\": 1\n  }\n\n```\n").unwrap();

        assert_eq!(
            document.variables[0].values,
            vec![Value::new("{\n    \"a\": 1\n  }".to_string(), "json".to_string())]
        );
    }

    #[test]
    fn headers_inside_fence_are_content() {
        let document = parse("## vars\n### notes\n```md\n## not a section\n### nor a component\n```\n").unwrap();

        assert_eq!(
            document.variables[0].first_content(),
            "## not a section\n### nor a component"
        );
    }

    #[test]
    fn missing_fence_yields_empty_value() {
        let document = parse("## vars\n### empty\n### next\n```\nx\n```\n").unwrap();

        assert_eq!(document.variables[0].values, vec![Value::text("")]);
        assert_eq!(document.variables[1].first_content(), "x");
    }

    #[test]
    fn list_ignores_non_item_lines() {
        let document = parse("## vars\n### env[list]\nsome prose\n- a\n\n-b\n- b c\n").unwrap();

        assert_eq!(
            document.variables[0].values,
            vec![Value::text("a"), Value::text("b c")]
        );
    }

    #[test]
    fn crlf_line_endings() {
        let document = parse("## vars\r\n### a\r\n```\r\nvalue\r\n```\r\n").unwrap();

        assert_eq!(document.variables[0].first_content(), "value");
    }

    #[test]
    fn unknown_sections_are_skipped() {
        let document = parse("## notes\n### a\n```\nx\n```\n## typescript\n## vars\n### b\n```\ny\n```\n").unwrap();

        assert_eq!(document.variables.len(), 1);
        assert_eq!(document.variables[0].name, "b");
        assert!(document.action.is_none());
    }

    #[test]
    fn section_markers_match_whole_line() {
        let document = parse("## vars \n### a\n```\nx\n```\n## after\t\n### b\n```\ny\n```\n## type[sh]  \n").unwrap();

        assert!(document.variables.is_empty());
        assert!(document.after_variables.is_empty());
        assert_eq!(document.action.unwrap().kind, "sh");
    }

    #[test]
    fn section_ends_at_next_section() {
        let document = parse("## vars\n### a\n```\nx\n```\n## after\n### b\n```\ny\n```\n").unwrap();

        assert_eq!(document.variables.len(), 1);
        assert_eq!(document.after_variables.len(), 1);
        assert_eq!(document.after_variables[0].name, "b");
    }

    #[test]
    fn action_without_kind_errors() {
        assert_eq!(
            parse("## type\n"),
            Err(ParseError::InvalidActionHeader {
                line: 1,
                header: "## type".to_string()
            })
        );
        assert!(matches!(
            parse("## vars\n\n## type[]\n"),
            Err(ParseError::InvalidActionHeader { line: 3, .. })
        ));
        assert!(matches!(
            parse("## type[http] trailing\n"),
            Err(ParseError::InvalidActionHeader { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_component_headers_error() {
        for header in [
            "### ",
            "### [list]",
            "### name[list",
            "### name extra",
            "### name:",
            "### name:trim::upper",
            "### name[li st]",
        ] {
            let document = format!("## vars\n{header}\n");
            assert!(
                matches!(parse(&document), Err(ParseError::InvalidComponentHeader { line: 2, .. })),
                "{header:?} must be rejected"
            );
        }
    }

    #[test]
    fn unknown_component_type_errors() {
        assert_eq!(
            parse("## vars\n### count[number]\n"),
            Err(ParseError::UnknownComponentType {
                line: 2,
                kind: "number".to_string()
            })
        );
    }

    #[test]
    fn unterminated_fence_errors() {
        assert_eq!(
            parse("## vars\n### a\n```\nnever closed\n"),
            Err(ParseError::UnterminatedFence { line: 3 })
        );
    }

    #[test]
    fn duplicate_component_errors() {
        assert_eq!(
            parse("## vars\n### a\n```\n1\n```\n### a\n```\n2\n```\n"),
            Err(ParseError::DuplicateComponent {
                line: 6,
                name: "a".to_string(),
                first: 2
            })
        );
    }

    #[test]
    fn same_name_in_different_sections_is_allowed() {
        let document = parse("## vars\n### a\n```\n1\n```\n## after\n### a\n```\n2\n```\n").unwrap();

        assert_eq!(document.variables[0].name, document.after_variables[0].name);
    }

    #[test]
    fn duplicate_section_errors() {
        assert_eq!(
            parse("## vars\n## after\n## vars\n"),
            Err(ParseError::DuplicateSection {
                line: 3,
                section: "vars".to_string(),
                first: 1
            })
        );
    }
}
