//! variable resolution
//!
//! Components are resolved strictly in declaration order into one shared [ResolvedContext].
//! Component `k` can reference the final values of components `0..k` (and the reserved entries), never a
//! later one: a forward reference stays as a literal `{{name}}`.
use crate::command::{CommandError, CommandRunner};
use crate::context::{substitute, unresolved_placeholders, ResolvedContext};
use crate::convert::{ConvertError, Converters};
use crate::document::{ApiType, ComponentKind, Document, TypedComponent};

#[derive(derive_new::new)]
pub struct Resolver<'r> {
    converters: &'r Converters,
    runner: &'r dyn CommandRunner,
}

impl Resolver<'_> {
    /// Resolve `components` into `context`
    ///
    /// Unless `force_compute` is set, a value already present in the context is an override: it is validated
    /// and used instead of computing the component. Either way the component's converters are applied.
    /// The first error aborts, values written before it stay in the context.
    pub fn resolve(
        &self,
        components: &[TypedComponent],
        context: &mut ResolvedContext,
        force_compute: bool,
    ) -> Result<(), ResolveError> {
        for component in components {
            let value = match context.get(&component.name) {
                Some(existing) if !force_compute => {
                    validate(component, existing)?;
                    tracing::debug!(name = %component.name, "using override");
                    existing.to_string()
                }
                _ => self.compute(component, context)?,
            };

            let value = self
                .converters
                .apply(value, &component.converters)
                .map_err(|source| ResolveError::Convert {
                    name: component.name.clone(),
                    source,
                })?;

            context.insert(component.name.clone(), value);
        }

        Ok(())
    }

    /// `## vars`, open to overrides
    pub fn resolve_variables(
        &self,
        document: &Document,
        context: &mut ResolvedContext,
    ) -> Result<(), ResolveError> {
        self.resolve(&document.variables, context, false)
    }

    /// `## type[...]` fields, always computed
    pub fn resolve_action<'d>(
        &self,
        document: &'d Document,
        context: &mut ResolvedContext,
    ) -> Result<&'d ApiType, ResolveError> {
        let action = document.action.as_ref().ok_or(ResolveError::MissingAction)?;
        self.resolve(&action.fields, context, true)?;
        Ok(action)
    }

    /// `## after`, always computed
    pub fn resolve_after(
        &self,
        document: &Document,
        context: &mut ResolvedContext,
    ) -> Result<(), ResolveError> {
        self.resolve(&document.after_variables, context, true)
    }

    fn compute(
        &self,
        component: &TypedComponent,
        context: &ResolvedContext,
    ) -> Result<String, ResolveError> {
        if component.kind.is_file_list() {
            return Err(ResolveError::Unexpanded {
                name: component.name.clone(),
            });
        }

        let template = component.first_content();
        let unresolved = unresolved_placeholders(template, context);
        if !unresolved.is_empty() {
            tracing::debug!(name = %component.name, ?unresolved, "placeholders left unresolved");
        }
        let text = substitute(template, context);

        match component.kind {
            ComponentKind::Script => {
                self.runner
                    .run(&text)
                    .map_err(|source| ResolveError::Command {
                        name: component.name.clone(),
                        source,
                    })
            }
            _ => Ok(text),
        }
    }
}

fn validate(component: &TypedComponent, value: &str) -> Result<(), ResolveError> {
    if component.kind == ComponentKind::List && !component.permits(value) {
        return Err(ResolveError::NotPermitted {
            name: component.name.clone(),
            value: value.to_string(),
            permitted: component
                .values
                .iter()
                .map(|value| value.content.clone())
                .collect(),
        });
    }
    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("Value {value:?} is not permitted for {name}, expected one of {permitted:?}")]
    NotPermitted {
        name: String,
        value: String,
        permitted: Vec<String>,
    },
    #[error("Unable to convert {name}")]
    Convert {
        name: String,
        #[source]
        source: ConvertError,
    },
    #[error("Script {name} failed")]
    Command {
        name: String,
        #[source]
        source: CommandError,
    },
    #[error("File list {name} was not expanded before resolution")]
    Unexpanded { name: String },
    #[error("Unknown action type {0:?}")]
    UnknownAction(String),
    #[error("Document has no `## type[<kind>]` section")]
    MissingAction,
}
