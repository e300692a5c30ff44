//! user defined action kinds
//!
//! Every directory `<config dir>/<kind>/` holding
//! - `run.tmpl`: command line, `{{name}}` placeholders are substituted from the resolved context
//! - `new_api.md`: skeleton document printed by `mdapi generate <kind>`
//! - `vars` (optional): the kind's field names, one per line
//!
//! is an action kind named after the directory.
use super::{write_result, Action, ActionError};
use crate::command::CommandRunner;
use crate::context::{substitute, ResolvedContext};
use std::path::Path;

const RUN_TEMPLATE: &str = "run.tmpl";
const NEW_API_TEMPLATE: &str = "new_api.md";
const VARS: &str = "vars";

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAction {
    name: String,
    run_template: String,
    new_api: String,
    fields: Vec<String>,
}

impl TemplateAction {
    /// All template actions in `config_dir`, ordered by name
    ///
    /// A missing `config_dir` holds no actions.
    pub fn discover(config_dir: &Path) -> Result<Vec<Self>, ActionError> {
        let io_error = |source| ActionError::Io {
            path: config_dir.to_owned(),
            source,
        };

        if !config_dir.is_dir() {
            tracing::debug!(path = %config_dir.display(), "no configuration directory");
            return Ok(vec![]);
        }

        let mut actions = vec![];
        for dir_entry in std::fs::read_dir(config_dir).map_err(io_error)? {
            let dir_entry = dir_entry.map_err(io_error)?;
            if !dir_entry.file_type().map_err(io_error)?.is_dir() {
                continue;
            }

            if let Some(action) = Self::load(&dir_entry.path())? {
                actions.push(action);
            }
        }

        actions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(actions)
    }

    /// Action defined in `dir`, `None` when it lacks one of the required templates
    pub fn load(dir: &Path) -> Result<Option<Self>, ActionError> {
        let Some(name) = dir.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            return Ok(None);
        };

        let run_template_path = dir.join(RUN_TEMPLATE);
        let new_api_path = dir.join(NEW_API_TEMPLATE);
        if !run_template_path.is_file() || !new_api_path.is_file() {
            tracing::debug!(path = %dir.display(), "skipping directory without templates");
            return Ok(None);
        }

        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|source| ActionError::Io {
                path: path.to_owned(),
                source,
            })
        };

        let vars_path = dir.join(VARS);
        let fields = if vars_path.is_file() {
            read(&vars_path)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        } else {
            vec![]
        };

        tracing::info!(name = %name, path = %dir.display(), "loaded action type");
        Ok(Some(Self {
            run_template: read(&run_template_path)?,
            new_api: read(&new_api_path)?,
            name,
            fields,
        }))
    }
}

impl Action for TemplateAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn new_api(&self) -> &str {
        &self.new_api
    }

    /// Executes the rendered template, its output is stored as `body` in `RESULTDIR`
    fn run(&self, context: &ResolvedContext, runner: &dyn CommandRunner) -> Result<(), ActionError> {
        let command = self.compile(context)?;
        tracing::info!(name = %self.name, "running template");
        let body = runner.run(&command)?;
        write_result(context, "body", body)
    }

    fn compile(&self, context: &ResolvedContext) -> Result<String, ActionError> {
        Ok(substitute(&self.run_template, context))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action::Actions;
    use crate::context::RESULT_DIR;
    use crate::resolve::test::FakeRunner;
    use pretty_assertions::assert_eq;

    fn define(config_dir: &Path, name: &str, run_template: &str, vars: Option<&str>) {
        let dir = config_dir.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(RUN_TEMPLATE), run_template).unwrap();
        std::fs::write(dir.join(NEW_API_TEMPLATE), format!("## type[{name}]\n")).unwrap();
        if let Some(vars) = vars {
            std::fs::write(dir.join(VARS), vars).unwrap();
        }
    }

    #[test]
    fn discovers_template_directories() {
        let config_dir = tempfile::tempdir().unwrap();
        define(config_dir.path(), "zeta", "z", None);
        define(config_dir.path(), "grpc", "grpcurl {{host}}", Some("host\n\nmethod\n"));
        std::fs::create_dir_all(config_dir.path().join("incomplete")).unwrap();
        std::fs::write(config_dir.path().join("incomplete").join(RUN_TEMPLATE), "x").unwrap();
        std::fs::write(config_dir.path().join("stray-file"), "x").unwrap();

        let actions = TemplateAction::discover(config_dir.path()).unwrap();

        assert_eq!(actions.iter().map(|a| a.name()).collect::<Vec<_>>(), ["grpc", "zeta"]);
        assert_eq!(actions[0].fields(), ["host", "method"]);
        assert_eq!(actions[0].new_api(), "## type[grpc]\n");
        assert!(actions[1].fields().is_empty());
    }

    #[test]
    fn missing_config_dir_has_no_actions() {
        let actions = TemplateAction::discover(Path::new("/does/not/exist")).unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn registry_lists_builtins_first() {
        let config_dir = tempfile::tempdir().unwrap();
        define(config_dir.path(), "grpc", "grpcurl", None);

        let actions = Actions::discover(config_dir.path()).unwrap();

        assert_eq!(
            actions.iter().map(|a| a.name().to_string()).collect::<Vec<_>>(),
            ["http", "sh", "grpc"]
        );
        assert!(actions.find("grpc").is_ok());
    }

    #[test]
    fn compile_substitutes_context() {
        let config_dir = tempfile::tempdir().unwrap();
        define(config_dir.path(), "grpc", "grpcurl {{host}} {{missing}}", None);
        let action = TemplateAction::load(&config_dir.path().join("grpc")).unwrap().unwrap();
        let context: ResolvedContext = [("host", "localhost:50051")].into_iter().collect();

        assert_eq!(
            action.compile(&context).unwrap(),
            "grpcurl localhost:50051 {{missing}}"
        );
    }

    #[test]
    fn run_executes_rendered_command() {
        let config_dir = tempfile::tempdir().unwrap();
        let result_dir = tempfile::tempdir().unwrap();
        define(config_dir.path(), "echo", "echo {{message}}", None);
        let action = TemplateAction::load(&config_dir.path().join("echo")).unwrap().unwrap();
        let context: ResolvedContext = [
            (RESULT_DIR, result_dir.path().to_str().unwrap()),
            ("message", "hello"),
        ]
        .into_iter()
        .collect();
        let runner = FakeRunner {
            output: Some("hello".to_string()),
            ..Default::default()
        };

        action.run(&context, &runner).unwrap();

        assert_eq!(runner.commands.borrow().as_slice(), ["echo hello"]);
        assert_eq!(
            std::fs::read_to_string(result_dir.path().join("body")).unwrap(),
            "hello"
        );
    }
}
