//! `strata` command line: schema, attribute and anatomy introspection

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use serde_json::Value;
use std::path::Path;
use strata_attrib::{AttributeRegistry, EntityType};
use strata_core::{anatomy_to_project_payload, Anatomy, Settings};
use strata_schema::{SchemaGenerator, ShapeKind};
use tracing_subscriber::EnvFilter;

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("FILE")
        .help("Settings file (TOML) with extra attribute definitions")
}

fn cli() -> Command {
    Command::new("strata")
        .version(strata_core::VERSION)
        .about("Inspect entity schemas, attributes and project anatomy")
        .subcommand_required(true)
        .subcommand(
            Command::new("schema")
                .about("Print the JSON schema of an entity type")
                .arg(
                    Arg::new("entity-type")
                        .required(true)
                        .help("project, folder, task, subset, version, representation, workfile or user"),
                )
                .arg(
                    Arg::new("shape")
                        .long("shape")
                        .default_value("full")
                        .value_parser(["full", "create", "patch", "attrib"])
                        .help("Which shape to print"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("attributes")
                .about("List attribute definitions")
                .arg(Arg::new("entity-type").help("Only attributes applicable to this type"))
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("anatomy")
                .about("Print the project payload produced by an anatomy")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_name("FILE")
                        .help("Anatomy in YAML or JSON; defaults to the built-in preset"),
                )
                .arg(
                    Arg::new("schema")
                        .long("schema")
                        .action(clap::ArgAction::SetTrue)
                        .help("Print the anatomy JSON schema instead"),
                ),
        )
}

fn registry(args: &ArgMatches) -> Result<std::sync::Arc<AttributeRegistry>> {
    let settings = match args.get_one::<String>("config") {
        Some(path) => Settings::from_path(path)?,
        None => Settings::new(),
    };
    Ok(settings.build_registry()?)
}

fn entity_type(args: &ArgMatches) -> Result<Option<EntityType>> {
    args.get_one::<String>("entity-type")
        .map(|name| name.parse::<EntityType>())
        .transpose()
        .map_err(Into::into)
}

fn schema_command(args: &ArgMatches) -> Result<Value> {
    let Some(entity_type) = entity_type(args)? else {
        bail!("entity type is required");
    };
    let generator = SchemaGenerator::new(registry(args)?);
    let schema = generator.schema(entity_type)?;

    let shape = args.get_one::<String>("shape").map_or("full", String::as_str);
    let document = match shape {
        "attrib" => serde_json::to_value(schema.attrib.json_schema())?,
        "create" => schema.json_schema_value(ShapeKind::Create)?,
        "patch" => schema.json_schema_value(ShapeKind::Patch)?,
        _ => schema.json_schema_value(ShapeKind::Full)?,
    };
    Ok(document)
}

fn attributes_command(args: &ArgMatches) -> Result<Value> {
    let registry = registry(args)?;
    let definitions: Vec<_> = match entity_type(args)? {
        Some(entity_type) => registry.list(entity_type).collect(),
        None => registry.iter().collect(),
    };
    Ok(serde_json::to_value(definitions)?)
}

fn load_anatomy(path: &Path) -> Result<Anatomy> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let anatomy = if is_json {
        Anatomy::from_json_str(&text)?
    } else {
        Anatomy::from_yaml_str(&text)?
    };
    Ok(anatomy)
}

fn anatomy_command(args: &ArgMatches) -> Result<Value> {
    if args.get_flag("schema") {
        return Ok(serde_json::to_value(schemars::schema_for!(Anatomy))?);
    }
    let anatomy = match args.get_one::<String>("file") {
        Some(path) => load_anatomy(Path::new(path))?,
        None => Anatomy::default(),
    };
    anatomy.validate()?;
    tracing::debug!(roots = anatomy.roots.len(), "anatomy loaded");
    Ok(Value::Object(anatomy_to_project_payload(&anatomy)?))
}

fn run(matches: &ArgMatches) -> Result<Value> {
    match matches.subcommand() {
        Some(("schema", args)) => schema_command(args),
        Some(("attributes", args)) => attributes_command(args),
        Some(("anatomy", args)) => anatomy_command(args),
        _ => bail!("unknown command"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let output = run(&matches)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn run_args(args: &[&str]) -> Result<Value> {
        let matches = cli().try_get_matches_from(args)?;
        run(&matches)
    }

    #[test]
    fn schema_patch_shape() {
        let value = run_args(&["strata", "schema", "task", "--shape", "patch"]).unwrap();
        assert_eq!(value["title"], "TaskPatchModel");
        assert!(value.get("required").is_none());
    }

    #[test]
    fn schema_attrib_shape() {
        let value = run_args(&["strata", "schema", "folder", "--shape", "attrib"]).unwrap();
        assert_eq!(value["title"], "FolderAttribModel");
        assert!(value["properties"]["frameStart"].is_object());
    }

    #[test]
    fn unknown_entity_type_fails() {
        assert!(run_args(&["strata", "schema", "shot"]).is_err());
    }

    #[test]
    fn attributes_for_user() {
        let value = run_args(&["strata", "attributes", "user"]).unwrap();
        let names: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect();
        assert_eq!(names, vec!["fullName", "email", "avatarUrl"]);
    }

    #[test]
    fn attributes_with_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[attributes]]\nname = \"priority\"\ntype = \"string\"\nscope = [\"task\"]"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let value = run_args(&["strata", "attributes", "task", "--config", &path]).unwrap();
        let last = value.as_array().unwrap().last().unwrap();
        assert_eq!(last["name"], "priority");
    }

    #[test]
    fn default_anatomy_payload() {
        let value = run_args(&["strata", "anatomy"]).unwrap();
        assert!(value["config"]["roots"]["work"].is_object());
        assert_eq!(value["task_types"][0]["name"], "Generic");
    }

    #[test]
    fn anatomy_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "roots:\n  - name: work\n  - name: publish").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let value = run_args(&["strata", "anatomy", "--file", &path]).unwrap();
        assert_eq!(value["config"]["roots"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn anatomy_schema() {
        let value = run_args(&["strata", "anatomy", "--schema"]).unwrap();
        assert_eq!(value["title"], "Anatomy");
    }
}
