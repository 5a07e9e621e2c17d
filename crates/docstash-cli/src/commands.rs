use std::process::ExitCode;

use anyhow::{bail, Context};
use colored::Colorize;
use docstash_engine::{
    add_files, create_schema, Admission, ConnectionString, EngineConfig, FailurePolicy,
    IngestEntry, IngestOptions, IngestStatus, IngestSummary, MetadataRecord, StorageEngine,
};
use docstash_index::{MetadataIndex, SqliteIndex};
use docstash_types::ObjectId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let global = cli.global;
    match cli.command {
        Command::Createdb(args) => cmd_createdb(&global, args),
        Command::Checkstorage(args) => cmd_checkstorage(&global, args),
        Command::Addfiles(args) => cmd_addfiles(&global, args),
        Command::Show(args) => cmd_show(&global, args),
        Command::Delete(args) => cmd_delete(&global, args),
    }
}

// ---------------------------------------------------------------------------
// Configuration resolution
// ---------------------------------------------------------------------------

fn load_base(global: &GlobalArgs) -> anyhow::Result<Option<EngineConfig>> {
    global
        .config
        .as_deref()
        .map(|path| EngineConfig::load(path).with_context(|| format!("loading {}", path.display())))
        .transpose()
}

fn parse_connection(engine: &str) -> anyhow::Result<ConnectionString> {
    engine
        .parse()
        .with_context(|| format!("invalid --engine {engine:?}"))
}

/// Connection from `--engine`, falling back to the config file.
pub(crate) fn resolve_connection(
    global: &GlobalArgs,
    engine: Option<&str>,
) -> anyhow::Result<ConnectionString> {
    if let Some(engine) = engine {
        return parse_connection(engine);
    }
    match load_base(global)? {
        Some(config) => Ok(config.connection),
        None => bail!("--engine is required unless --config is given"),
    }
}

/// Full engine config: the config file (if any) overridden by flags.
pub(crate) fn resolve_config(
    global: &GlobalArgs,
    location: &LocationArgs,
) -> anyhow::Result<EngineConfig> {
    let mut config = match load_base(global)? {
        Some(config) => config,
        None => {
            let engine = location
                .engine
                .as_deref()
                .context("--engine is required unless --config is given")?;
            let storage = location
                .storage
                .as_ref()
                .context("--storage is required unless --config is given")?;
            EngineConfig::new(storage, parse_connection(engine)?)
        }
    };

    if let Some(engine) = &location.engine {
        config.connection = parse_connection(engine)?;
    }
    if let Some(storage) = &location.storage {
        config.storage_root = storage.clone();
    }
    if let Some(depth) = global.depth {
        config.layout.depth = depth;
    }
    if let Some(width) = global.width {
        config.layout.width = width;
    }
    config.admission = config.admission.with_env_defaults();
    config.validate()?;
    Ok(config)
}

fn parse_digest(digest: &str) -> anyhow::Result<ObjectId> {
    ObjectId::from_hex(digest).with_context(|| format!("invalid digest {digest:?}"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_createdb(global: &GlobalArgs, args: CreatedbArgs) -> anyhow::Result<ExitCode> {
    let connection = resolve_connection(global, args.engine.as_deref())?;
    create_schema(&connection)?;
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "connection": connection.to_string(),
            "created": true,
        }))?,
        OutputFormat::Text => println!(
            "{} Metadata schema ready at {}",
            "✓".green().bold(),
            connection.to_string().bold()
        ),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_checkstorage(global: &GlobalArgs, args: LocationArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(global, &args)?;
    let report = StorageEngine::open(&config)?.check_consistency()?;
    match global.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text if report.consistent => println!(
            "{} Storage consistent: {} objects",
            "✓".green().bold(),
            report.store_count.to_string().bold()
        ),
        OutputFormat::Text => {
            println!("{} Storage drift detected", "✗".red().bold());
            println!("  Content store:  {}", report.store_count.to_string().yellow());
            println!("  Metadata index: {}", report.index_count.to_string().yellow());
        }
    }
    Ok(if report.consistent {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_addfiles(global: &GlobalArgs, args: AddfilesArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(global, &args.location)?;
    let engine = StorageEngine::open(&config)?;
    let options = IngestOptions {
        policy: if args.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Continue
        },
        extension: args.extension,
    };
    let json = global.format == OutputFormat::Json;
    let summary = add_files(&engine, &args.samples, &options, |entry| {
        if json {
            // One JSON document per line; the summary follows the last entry.
            match serde_json::to_string(entry) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "could not serialize ingest entry"),
            }
        } else {
            print_entry(entry);
        }
    })?;

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }
    Ok(if summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_entry(entry: &IngestEntry) {
    let path = entry.path.display();
    match &entry.status {
        IngestStatus::Stored { placement } => println!(
            "  {} {} -> {}",
            "stored:   ".green(),
            path,
            placement.relative_path.display().to_string().dimmed()
        ),
        IngestStatus::Duplicate { placement } => println!(
            "  {} {} ({})",
            "duplicate:".yellow(),
            path,
            placement.id.short_hex().dimmed()
        ),
        IngestStatus::Skipped { admission } => {
            let detail = match admission {
                Admission::Rejected { mime_type } => mime_type.as_str(),
                Admission::Accepted(_) => "",
            };
            println!("  {} {} {}", "skipped:  ".dimmed(), path, detail.dimmed())
        }
        IngestStatus::Failed { kind, message } => {
            println!("  {} {} [{}] {}", "failed:   ".red().bold(), path, kind, message)
        }
    }
}

fn print_summary(summary: &IngestSummary) {
    let mark = if summary.failed == 0 {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!(
        "{} {} stored, {} duplicates, {} skipped, {} failed{}",
        mark,
        summary.stored,
        summary.duplicates,
        summary.skipped,
        summary.failed,
        if summary.aborted { " (aborted)" } else { "" }
    );
}

fn cmd_show(global: &GlobalArgs, args: ShowArgs) -> anyhow::Result<ExitCode> {
    let id = parse_digest(&args.digest)?;

    // The object location is only reported when the store is known.
    let have_store = args.location.storage.is_some() || global.config.is_some();
    let (record, location) = if have_store {
        let engine = StorageEngine::open(&resolve_config(global, &args.location)?)?;
        (engine.get(&id)?, engine.locate(&id)?)
    } else {
        let connection = resolve_connection(global, args.location.engine.as_deref())?;
        (SqliteIndex::connect(connection)?.get(&id)?, None)
    };

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "record": record,
            "location": location,
        }))?,
        OutputFormat::Text => print_record(&record, location.as_deref()),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_record(record: &MetadataRecord, location: Option<&std::path::Path>) {
    println!("{} {}", record.primary_algorithm.to_string().cyan(), record.id.as_str().yellow().bold());
    for (algorithm, hex) in &record.secondary {
        println!("{} {}", algorithm.to_string().cyan(), hex);
    }
    println!("Stored: {}", record.stored_at.to_rfc3339());
    if let Some(path) = location {
        println!("Object: {}", path.display());
    }
}

fn cmd_delete(global: &GlobalArgs, args: DeleteArgs) -> anyhow::Result<ExitCode> {
    let id = parse_digest(&args.digest)?;
    let engine = StorageEngine::open(&resolve_config(global, &args.location)?)?;
    let report = engine.delete(&id)?;

    match global.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("{} Deleted {}", "✓".green().bold(), id.as_str().yellow());
            if !report.removed_object {
                println!("  {}", "no object file was stored".dimmed());
            }
            if !report.removed_record {
                println!("  {}", "no metadata record was indexed".dimmed());
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn location(engine: Option<&str>, storage: Option<&str>) -> LocationArgs {
        LocationArgs {
            engine: engine.map(Into::into),
            storage: storage.map(PathBuf::from),
        }
    }

    #[test]
    fn flags_alone_build_a_config() {
        let global = GlobalArgs {
            depth: Some(2),
            ..Default::default()
        };
        let config = resolve_config(&global, &location(Some("sqlite:///f.db"), Some("objects"))).unwrap();
        assert_eq!(config.connection.path(), Path::new("f.db"));
        assert_eq!(config.storage_root, PathBuf::from("objects"));
        assert_eq!(config.layout.depth, 2);
        assert_eq!(config.layout.width, 2);
    }

    #[test]
    fn missing_locations_are_reported() {
        let global = GlobalArgs::default();
        assert!(resolve_config(&global, &location(None, Some("objects"))).is_err());
        assert!(resolve_config(&global, &location(Some("f.db"), None)).is_err());
        assert!(resolve_connection(&global, None).is_err());
    }

    #[test]
    fn invalid_layout_flag_is_rejected() {
        let global = GlobalArgs {
            width: Some(0),
            ..Default::default()
        };
        assert!(resolve_config(&global, &location(Some("f.db"), Some("objects"))).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstash.toml");
        std::fs::write(
            &path,
            "storage_root = \"/srv/objects\"\nconnection = \"sqlite:////srv/files.sqlite\"\n[layout]\ndepth = 4\nwidth = 1\n",
        )
        .unwrap();
        let global = GlobalArgs {
            config: Some(path),
            ..Default::default()
        };

        let config = resolve_config(&global, &location(None, Some("elsewhere"))).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("elsewhere"));
        assert_eq!(config.connection.path(), Path::new("/srv/files.sqlite"));
        assert_eq!(config.layout.depth, 4);

        let conn = resolve_connection(&global, None).unwrap();
        assert_eq!(conn.path(), Path::new("/srv/files.sqlite"));
    }

    // Only test in this crate that sets these variables.
    #[test]
    fn config_file_tool_paths_beat_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstash.toml");
        std::fs::write(
            &path,
            "storage_root = \"objects\"\nconnection = \"f.db\"\n[admission]\nfile_bin = \"/srv/tools/file\"\n",
        )
        .unwrap();
        let global = GlobalArgs {
            config: Some(path),
            ..Default::default()
        };

        std::env::set_var("FILETYPE_FPATH", "/env/file");
        std::env::set_var("XDGMIME_FPATH", "/env/xdg-mime");
        let config = resolve_config(&global, &location(None, None));
        std::env::remove_var("FILETYPE_FPATH");
        std::env::remove_var("XDGMIME_FPATH");

        let admission = config.unwrap().admission;
        assert_eq!(admission.file_bin, PathBuf::from("/srv/tools/file"));
        assert_eq!(admission.mime_bin, PathBuf::from("/env/xdg-mime"));
    }

    #[test]
    fn digest_must_be_hex() {
        assert!(parse_digest("not-hex").is_err());
        assert_eq!(parse_digest("ABCD").unwrap().as_str(), "abcd");
    }
}
