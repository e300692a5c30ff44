//! action kinds a document can dispatch to (`## type[<kind>]`)
//!
//! Built in are [http::HttpAction] and [shell::ShellAction]. Further kinds are discovered in the
//! configuration directory, see [template::TemplateAction].
pub mod http;
pub mod shell;
pub mod template;

use crate::command::{CommandError, CommandRunner};
use crate::context::ResolvedContext;
use crate::resolve::ResolveError;
use std::path::{Path, PathBuf};

pub trait Action {
    /// Kind as written in `## type[<kind>]`
    fn name(&self) -> &str;

    /// Names of the fields the action reads from the context
    fn fields(&self) -> Vec<String>;

    /// Skeleton document for a new api of this kind
    fn new_api(&self) -> &str;

    /// Perform the action with the fully resolved context
    fn run(&self, context: &ResolvedContext, runner: &dyn CommandRunner) -> Result<(), ActionError>;

    /// Render what [Action::run] would execute, without executing it
    fn compile(&self, context: &ResolvedContext) -> Result<String, ActionError> {
        let _ = context;
        Err(ActionError::CompileUnsupported(self.name().to_string()))
    }
}

/// Registry of known action kinds
pub struct Actions {
    actions: Vec<Box<dyn Action>>,
}

impl Actions {
    pub fn builtin() -> Self {
        Self {
            actions: vec![Box::new(http::HttpAction), Box::new(shell::ShellAction)],
        }
    }

    /// Built-in kinds followed by the template kinds found in `config_dir`
    pub fn discover(config_dir: &Path) -> Result<Self, ActionError> {
        let mut actions = Self::builtin();
        for action in template::TemplateAction::discover(config_dir)? {
            actions.register(Box::new(action));
        }
        Ok(actions)
    }

    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    /// First action registered as `kind`
    pub fn find(&self, kind: &str) -> Result<&dyn Action, ResolveError> {
        self.actions
            .iter()
            .find(|action| action.name() == kind)
            .map(|action| action.as_ref())
            .ok_or_else(|| ResolveError::UnknownAction(kind.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(|action| action.as_ref())
    }
}

/// Value of a field the action can not do without
pub(crate) fn required<'c>(
    context: &'c ResolvedContext,
    field: &'static str,
) -> Result<&'c str, ActionError> {
    context.get(field).ok_or(ActionError::MissingField(field))
}

/// Write one result file into `RESULTDIR`
pub(crate) fn write_result(
    context: &ResolvedContext,
    name: &str,
    contents: impl AsRef<[u8]>,
) -> Result<(), ActionError> {
    let dir = context.result_dir().ok_or(ActionError::MissingResultDir)?;
    let path = Path::new(dir).join(name);
    tracing::debug!(path = %path.display(), "writing result");
    std::fs::write(&path, contents).map_err(|source| ActionError::Io { path, source })
}

#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    #[error("Missing field {0:?}")]
    MissingField(&'static str),
    #[error("Result directory is not set")]
    MissingResultDir,
    #[error("Invalid {field} line {line:?}")]
    InvalidLine { field: &'static str, line: String },
    #[error("Invalid http method {0:?}")]
    InvalidMethod(String),
    #[error("Http request failed")]
    Http(#[from] reqwest::Error),
    #[error("Unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed")]
    Command(#[from] CommandError),
    #[error("Compile is not supported for {0}")]
    CompileUnsupported(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_kinds() {
        let actions = Actions::builtin();

        assert_eq!(actions.iter().map(|a| a.name()).collect::<Vec<_>>(), ["http", "sh"]);
        assert_eq!(actions.find("sh").unwrap().fields(), ["script"]);
    }

    #[test]
    fn unknown_kind_errors() {
        let err = Actions::builtin().find("grpc").err().expect("must error");

        assert!(matches!(err, ResolveError::UnknownAction(ref kind) if kind == "grpc"));
    }

    #[test]
    fn builtin_kinds_do_not_compile() {
        let context = ResolvedContext::default();
        let err = Actions::builtin().find("http").unwrap().compile(&context).expect_err("must error");

        assert!(matches!(err, ActionError::CompileUnsupported(ref kind) if kind == "http"));
    }

    #[test]
    fn write_result_requires_result_dir() {
        let context = ResolvedContext::default();

        assert!(matches!(
            write_result(&context, "body", "x"),
            Err(ActionError::MissingResultDir)
        ));
    }
}
