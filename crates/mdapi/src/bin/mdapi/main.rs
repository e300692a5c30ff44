mod cli;

use anyhow::Context;
use mdapi::action::Actions;
use mdapi::command::ShellRunner;
use mdapi::context::{ResolvedContext, RESERVED};
use mdapi::convert::Converters;
use mdapi::document::{ComponentKind, Document};
use mdapi::resolve::Resolver;
use mdapi::result_dir::ResultDir;
use std::path::PathBuf;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("MDAPI_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let environment = Environment {
        converters: Converters::builtin(),
        runner: ShellRunner::new(cli.shell),
        config_dir: cli.config_dir.or_else(default_config_dir),
    };

    let command_result = match cli.command {
        None => overview(&environment),
        Some(cli::Command::Vars(vars_cli)) => vars(vars_cli),
        Some(cli::Command::VarTypes(var_types_cli)) => var_types(var_types_cli),
        Some(cli::Command::Types) => types(&environment),
        Some(cli::Command::TypeVars(kind)) => type_vars(&environment, kind),
        Some(cli::Command::Generate(kind)) => generate(&environment, kind),
        Some(cli::Command::Resolve(resolve_cli)) => resolve(&environment, resolve_cli),
        Some(cli::Command::Compile(compile_cli)) => compile(&environment, compile_cli),
        Some(cli::Command::Run(run_cli)) => run(&environment, run_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

/// Registries and collaborators shared by all commands
struct Environment {
    converters: Converters,
    runner: ShellRunner,
    config_dir: Option<PathBuf>,
}

impl Environment {
    fn actions(&self) -> anyhow::Result<Actions> {
        match &self.config_dir {
            Some(config_dir) => Actions::discover(config_dir)
                .with_context(|| format!("Failed to load action types from {}", config_dir.display())),
            None => Ok(Actions::builtin()),
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.converters, &self.runner)
    }
}

fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join("mdapi"))
}

fn overview(environment: &Environment) -> anyhow::Result<()> {
    println!("mdapi calls apis declared in structured markdown files. use --help for details");
    println!();
    println!("each template supports the following variables");
    for reserved in RESERVED {
        println!(" - {reserved}");
    }
    println!();
    println!("each variable supports the following converters");
    for name in environment.converters.names() {
        println!(" - {name}");
    }
    println!();
    println!("built-in action types");
    for action in Actions::builtin().iter() {
        println!(" - {}", action.name());
    }
    Ok(())
}

fn vars(cli: cli::VarsCommand) -> anyhow::Result<()> {
    let document = load(&cli.document.file)?;

    let Some(name) = cli.name else {
        for variable in &document.variables {
            println!("{}:{}:{}", variable.name, variable.kind, variable.values.len());
        }
        return Ok(());
    };

    let variable = document
        .variable(&name)
        .with_context(|| format!("Unknown variable {name}"))?;

    match cli.index {
        None => println!("has values: {}", variable.values.len()),
        Some(index) => {
            let value = variable.values.get(index).with_context(|| {
                format!("Index {index} out of bounds, {name} has {} values", variable.values.len())
            })?;
            println!("{}", value.content_kind);
            println!("{}", value.content);
        }
    }
    Ok(())
}

fn var_types(cli: cli::VarTypesCommand) -> anyhow::Result<()> {
    match cli.kind {
        None => {
            for kind in ComponentKind::ALL {
                println!("{kind}");
            }
        }
        Some(kind) => {
            let kind = ComponentKind::parse(&kind).with_context(|| format!("Unknown type {kind}"))?;
            println!("{}", kind.description());
        }
    }
    Ok(())
}

fn types(environment: &Environment) -> anyhow::Result<()> {
    for action in environment.actions()?.iter() {
        println!("{}", action.name());
    }
    Ok(())
}

fn type_vars(environment: &Environment, cli: cli::KindArgs) -> anyhow::Result<()> {
    let actions = environment.actions()?;
    for field in actions.find(&cli.kind)?.fields() {
        println!("{field}");
    }
    Ok(())
}

fn generate(environment: &Environment, cli: cli::KindArgs) -> anyhow::Result<()> {
    let actions = environment.actions()?;
    println!("{}", actions.find(&cli.kind)?.new_api());
    Ok(())
}

fn resolve(environment: &Environment, cli: cli::ResolveCommand) -> anyhow::Result<()> {
    let (_, _, context) = resolve_document(environment, &cli.args)?;

    match cli.output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &context)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &context)?,
    };

    Ok(())
}

fn compile(environment: &Environment, cli: cli::ResolveArgs) -> anyhow::Result<()> {
    let (document, _, context) = resolve_document(environment, &cli)?;
    let actions = environment.actions()?;
    let action = actions.find(action_kind(&document)?)?;

    println!("{}", action.compile(&context)?);
    Ok(())
}

fn run(environment: &Environment, cli: cli::ResolveArgs) -> anyhow::Result<()> {
    let (document, result_dir, mut context) = resolve_document(environment, &cli)?;
    let actions = environment.actions()?;
    let action = actions.find(action_kind(&document)?)?;

    result_dir
        .prepare()
        .with_context(|| format!("Failed to create result directory {}", result_dir.path.display()))?;

    action
        .run(&context, &environment.runner)
        .with_context(|| format!("Failed to run {}", action.name()))?;

    result_dir
        .write_vars(&context)
        .context("Failed to write resolved variables")?;

    environment
        .resolver()
        .resolve_after(&document, &mut context)
        .context("Failed to compute after variables")?;
    result_dir
        .write_after(&document, &context)
        .context("Failed to write after variables")?;

    println!("{}", result_dir.path.display());
    Ok(())
}

/// Load the document, resolve its variables (with overrides) and its action fields
fn resolve_document(
    environment: &Environment,
    cli: &cli::ResolveArgs,
) -> anyhow::Result<(Document, ResultDir, ResolvedContext)> {
    let document = load(&cli.document.file)?;
    let result_dir = ResultDir::for_document(&cli.document.file);

    let mut context = result_dir.seed();
    context.extend(cli.vars.iter().cloned());

    let resolver = environment.resolver();
    resolver
        .resolve_variables(&document, &mut context)
        .context("Failed to compute variables")?;
    resolver
        .resolve_action(&document, &mut context)
        .context("Failed to compute type fields")?;

    Ok((document, result_dir, context))
}

fn action_kind(document: &Document) -> anyhow::Result<&str> {
    document
        .action
        .as_ref()
        .map(|action| action.kind.as_str())
        .context("Document has no `## type[<kind>]` section")
}

fn load(path: &std::path::Path) -> anyhow::Result<Document> {
    Document::load(path).with_context(|| format!("Failed to load {}", path.display()))
}
