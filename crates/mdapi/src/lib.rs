//! # mdapi - api calls declared in markdown
//!
//! ## Introduction for developers
//!
//! Read this to understand how `mdapi` works internally.
//!
//! ### Document terms
//!
//! An api document is plain markdown. Only a few lines carry meaning:
//! - a `section` starts with `## `, we know three of them:
//!   - `## vars`: variables, which may be overridden from the command line
//!   - `## type[<kind>]`: the action to perform and its fields
//!   - `## after`: variables computed once the action ran (e.g. extracting a token from the response)
//! - a `component` starts with `### ` inside a section: `### <name>[<type>]:<converter>:<converter>`
//!   - `type` is one of `text` (default), `list`, `script`, `file_list`, `abs_file_list`
//!   - the converters are applied in order to the computed value
//! - a component's value is either a fenced block (```` ``` ````) or, for lists, the `- ` items below it
//!
//! Everything else is prose and ignored.
//!
//! ### Parsing
//!
//! see [parser::parse]
//!
//! The text is scanned line by line into a [document::Document]. Headers are parsed explicitly, a malformed one is
//! reported as a [parser::ParseError] together with its line.
//!
//! ### Expanding file lists
//!
//! see [file_list::expand]
//!
//! `file_list` and `abs_file_list` components only hold a path. Before resolution each of them is replaced by a `list`
//! component whose items are the lines of that file.
//!
//! ### Resolution
//!
//! see [resolve::Resolver]
//!
//! All values end up in one [context::ResolvedContext], which starts out with the reserved entries `CURDIR`,
//! `CURFILE` and `RESULTDIR` plus any `--vars` given on the command line.
//!
//! Components are resolved in the order they are declared. For each one
//! - an existing value (override) is validated and kept, unless the section is force computed
//! - otherwise `{{name}}` placeholders in its content are substituted from the context ([context::substitute]) and,
//!   for `script` components, the result is run by a [command::CommandRunner]
//! - the converter chain is applied ([convert::Converters])
//! - the value is stored in the context
//!
//! There is no dependency graph: a placeholder referring to a later component is left untouched.
//!
//! **Example**
//!
//! | **component**              | **content**                  | **resolved**                  |
//! |----------------------------|------------------------------|-------------------------------|
//! | `### host`                 | `example.com`                | `example.com`                 |
//! | `### path:urlencode`       | `/a b`                       | `%2Fa+b`                      |
//! | `### url` (in `type[http]`)| `https://{{host}}{{path}}`   | `https://example.com%2Fa+b`   |
//!
//! ### Dispatch
//!
//! The resolved context is handed to the [action::Action] registered for the document's kind. `http` and `sh` are
//! built in, further kinds are defined by templates in the configuration directory.
//!
pub mod action;
pub mod command;
pub mod context;
pub mod convert;
pub mod document;
pub mod file_list;
pub mod parser;
pub mod resolve;
pub mod result_dir;
