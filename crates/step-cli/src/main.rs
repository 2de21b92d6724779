//! `stepctl` - inspect, validate and normalize pipeline files

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use step_core::{
    builtin_factory, init_logging_from, FrameworkConfig, PipelineDocument, PipelineEditor,
    PipelineReport,
};
use step_model::ViewMode;

fn mode_arg() -> Arg {
    Arg::new("mode")
        .long("mode")
        .short('m')
        .default_value("edit")
        .value_parser(|s: &str| s.parse::<ViewMode>())
        .help("View mode: edit, input-set, input-variable, template, deployment-form, trigger-form")
}

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help("Pipeline file (.yaml, .yml or .json)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn cli() -> Command {
    Command::new("stepctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate, render and normalize pipeline step configuration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Framework configuration file (YAML)"),
        )
        .subcommand(
            Command::new("types")
                .about("List registered step types")
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate every step of a pipeline")
                .arg(file_arg())
                .arg(mode_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("render")
                .about("Render the steps of one stage as JSON views")
                .arg(file_arg())
                .arg(
                    Arg::new("stage")
                        .long("stage")
                        .short('s')
                        .required(true)
                        .help("Stage identifier"),
                )
                .arg(mode_arg())
                .arg(
                    Arg::new("readonly")
                        .long("readonly")
                        .action(ArgAction::SetTrue)
                        .help("Render inputs as read-only"),
                ),
        )
        .subcommand(
            Command::new("process")
                .about("Normalize a pipeline for saving")
                .arg(file_arg())
                .arg(json_arg())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Write to this file instead of stdout"),
                ),
        )
}

fn required<'a, T>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .with_context(|| format!("missing argument '{name}'"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<FrameworkConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => FrameworkConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(FrameworkConfig::default()),
    }
}

fn open_editor(config: FrameworkConfig, args: &ArgMatches) -> anyhow::Result<PipelineEditor> {
    let path = required::<PathBuf>(args, "file")?;
    let document = PipelineDocument::from_file(path)
        .with_context(|| format!("failed to read pipeline {}", path.display()))?;
    let strings = config.load_strings()?;
    let factory = builtin_factory(&config)?;
    Ok(PipelineEditor::new(factory, document)
        .with_strings(strings)
        .with_config(config))
}

fn print_report(report: &PipelineReport) {
    for stage in &report.stages {
        for (step, errors) in &stage.step_errors {
            for (path, message) in errors.iter() {
                println!("{}/{step} {path}: {message}", stage.stage);
            }
        }
        for unsupported in &stage.unsupported {
            println!(
                "{}/{} skipped: unsupported step type '{}'",
                stage.stage, unsupported.identifier, unsupported.type_id
            );
        }
    }
    if report.is_valid() {
        println!("Pipeline is valid ({} mode)", report.mode);
    } else {
        println!("{} error(s) ({} mode)", report.error_count(), report.mode);
    }
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_logging_from(&config)?;

    match matches.subcommand() {
        Some(("types", args)) => {
            let factory = builtin_factory(&config)?;
            let descriptors = factory.descriptors();
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&descriptors)?);
            } else {
                for descriptor in descriptors {
                    println!("{:<28} {}", descriptor.type_id, descriptor.display_name);
                }
            }
        }
        Some(("validate", args)) => {
            let mode = *required::<ViewMode>(args, "mode")?;
            let editor = open_editor(config, args)?;
            let report = editor.validate(mode)?;
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if !report.is_valid() {
                std::process::exit(1);
            }
        }
        Some(("render", args)) => {
            let mode = *required::<ViewMode>(args, "mode")?;
            let stage = required::<String>(args, "stage")?;
            let editor = open_editor(config, args)?;
            let rendered = editor.render_stage(stage, mode, args.get_flag("readonly"))?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Some(("process", args)) => {
            let editor = open_editor(config, args)?;
            let text = if args.get_flag("json") {
                editor.to_json()?
            } else {
                editor.to_yaml()?
            };
            match args.get_one::<PathBuf>("output") {
                Some(out) => {
                    std::fs::write(out, text)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    tracing::info!(path = %out.display(), "wrote processed pipeline");
                }
                None => print!("{text}"),
            }
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
    Ok(())
}
