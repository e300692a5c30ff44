//! `## type[sh]`
use super::{required, write_result, Action, ActionError};
use crate::command::CommandRunner;
use crate::context::ResolvedContext;

pub const SCRIPT: &str = "script";

/// Runs the `script` field and stores its output as `body` in `RESULTDIR`
pub struct ShellAction;

impl Action for ShellAction {
    fn name(&self) -> &str {
        "sh"
    }

    fn fields(&self) -> Vec<String> {
        vec![SCRIPT.to_string()]
    }

    fn new_api(&self) -> &str {
        include_str!("../../templates/sh_new_api.md")
    }

    fn run(&self, context: &ResolvedContext, runner: &dyn CommandRunner) -> Result<(), ActionError> {
        let script = required(context, SCRIPT)?;
        tracing::info!("running script");
        let body = runner.run(script)?;
        write_result(context, "body", body)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::RESULT_DIR;
    use crate::resolve::test::FakeRunner;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_script_output_as_body() {
        let dir = tempfile::tempdir().unwrap();
        let context: ResolvedContext = [
            (RESULT_DIR, dir.path().to_str().unwrap()),
            (SCRIPT, "echo hi"),
        ]
        .into_iter()
        .collect();
        let runner = FakeRunner {
            output: Some("hi".to_string()),
            ..Default::default()
        };

        ShellAction.run(&context, &runner).unwrap();

        assert_eq!(runner.commands.borrow().as_slice(), ["echo hi"]);
        assert_eq!(std::fs::read_to_string(dir.path().join("body")).unwrap(), "hi");
    }

    #[test]
    fn script_is_required() {
        let err = ShellAction
            .run(&ResolvedContext::default(), &FakeRunner::default())
            .expect_err("must error");

        assert!(matches!(err, ActionError::MissingField(SCRIPT)));
    }

    #[test]
    fn failing_script_errors() {
        let context: ResolvedContext = [(SCRIPT, "false")].into_iter().collect();
        let err = ShellAction
            .run(&context, &FakeRunner::default())
            .expect_err("must error");

        assert!(matches!(err, ActionError::Command(_)));
    }
}
