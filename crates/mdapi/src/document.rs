//! declaration model of a parsed api document
//!
//! A [Document] holds three ordered lists of [TypedComponent]s:
//! - `variables` (`## vars`), resolved first and open to overrides
//! - the fields of the [ApiType] (`## type[<kind>]`), parameterizing the action
//! - `after_variables` (`## after`), resolved once the action ran
use std::path::Path;

/// Content kind used when a fence carries no language annotation
pub const TEXT_CONTENT: &str = "text";

/// Single piece of literal content
#[derive(derive_new::new, Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub content: String,
    /// Language annotation of the fence (informational only)
    pub content_kind: String,
}

impl Value {
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content.into(), TEXT_CONTENT.to_string())
    }
}

/// Declared type of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Text,
    List,
    /// path relative to the document's directory
    FileList,
    /// absolute path
    AbsoluteFileList,
    Script,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Text,
        ComponentKind::List,
        ComponentKind::Script,
        ComponentKind::FileList,
        ComponentKind::AbsoluteFileList,
    ];

    /// Name used in `### name[<kind>]` headers
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Text => "text",
            ComponentKind::List => "list",
            ComponentKind::FileList => "file_list",
            ComponentKind::AbsoluteFileList => "abs_file_list",
            ComponentKind::Script => "script",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ComponentKind::Text => "simple text within a ``` fenced block",
            ComponentKind::List => "one of the values in markdown list format (- value)",
            ComponentKind::FileList => "path relative to the document's directory; one of the file's lines is the value",
            ComponentKind::AbsoluteFileList => "absolute path; one of the file's lines is the value",
            ComponentKind::Script => "same as text, but the content is executed by the shell and its output is the value",
        }
    }

    pub fn is_file_list(&self) -> bool {
        matches!(self, ComponentKind::FileList | ComponentKind::AbsoluteFileList)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedComponent {
    pub name: String,
    pub kind: ComponentKind,
    /// Converter chain, applied in order after the value is computed
    pub converters: Vec<String>,
    pub values: Vec<Value>,
    /// 1-based line of the `###` header
    pub line: usize,
}

impl TypedComponent {
    /// Content of the first value, or an empty string for an empty list
    pub fn first_content(&self) -> &str {
        self.values
            .first()
            .map(|value| value.content.as_str())
            .unwrap_or_default()
    }

    /// Whether `candidate` is one of the declared values
    pub fn permits(&self, candidate: &str) -> bool {
        self.values.iter().any(|value| value.content == candidate)
    }
}

/// Action kind and the fields that parameterize it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiType {
    pub kind: String,
    pub fields: Vec<TypedComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub variables: Vec<TypedComponent>,
    pub after_variables: Vec<TypedComponent>,
    pub action: Option<ApiType>,
}

impl Document {
    /// First variable declared with `name`
    pub fn variable(&self, name: &str) -> Option<&TypedComponent> {
        self.variables.iter().find(|component| component.name == name)
    }

    /// Parse the document at `path` and expand its file lists relative to its directory
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path=%path.display(), "loading document");

        let text = std::fs::read_to_string(path)?;
        let document: Document = text.parse()?;

        Ok(document.expand_file_lists(document_dir(path))?)
    }

    /// Replace every file list declaration by the list read from its file
    pub fn expand_file_lists(self, base_dir: &Path) -> Result<Self, crate::file_list::FileListError> {
        use crate::file_list::expand;

        let action = match self.action {
            Some(action) => Some(ApiType {
                fields: expand(action.fields, base_dir)?,
                kind: action.kind,
            }),
            None => None,
        };

        Ok(Self {
            variables: expand(self.variables, base_dir)?,
            after_variables: expand(self.after_variables, base_dir)?,
            action,
        })
    }
}

/// Directory holding the document at `path`, `.` for a bare file name
pub fn document_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

impl std::str::FromStr for Document {
    type Err = crate::parser::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Unable to read document")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse document")]
    Parse(#[from] crate::parser::ParseError),
    #[error("Unable to expand file list")]
    FileList(#[from] crate::file_list::FileListError),
}
