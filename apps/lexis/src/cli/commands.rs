//! # CLI Command Implementations

use crate::api;
use crate::config::{AppConfig, BackendKind};
use lexis_core::{
    LexisError, NewConcept, Representation, SearchFilter, SearchOptions, Session, Window, demo,
    formats::MAX_SNAPSHOT_SIZE, snapshot_from_bytes, snapshot_to_bytes,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a JSON import file (100 MB).
const MAX_IMPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Reject files larger than `max_size` before reading them.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LexisError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LexisError::Io(format!("cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LexisError::InvalidArgument(format!(
            "file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LexisError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| LexisError::Io(format!("invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(LexisError::Io(format!(
            "path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Canonicalize the parent of an output path, keeping the file name.
fn validate_output_path(path: &Path) -> Result<PathBuf, LexisError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LexisError::Io(format!(
            "invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    if !canonical_parent.is_dir() {
        return Err(LexisError::Io(format!(
            "output directory '{}' is not a directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LexisError::Io("output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

fn print_json(value: &impl Serialize) -> Result<(), LexisError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LexisError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: AppConfig, demo_mode: bool) -> Result<(), LexisError> {
    let session = if demo_mode {
        Session::with_store(demo::store()?).with_settings(config.engine_settings())
    } else {
        config.open_session()?
    };
    let backend = if demo_mode {
        "memory (demo)"
    } else {
        config.storage.backend.as_str()
    };

    println!("Lexis Concept Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {}", backend);
    println!("  Database: {}", config.storage.path.display());
    println!("  Locale:   {}", config.context.locale);
    println!();
    println!("Endpoints:");
    println!("  GET    /concept       - List or search (q, memberOf, answerTo)");
    println!("  POST   /concept       - Create a concept");
    println!("  GET    /concept/{{id}}  - Retrieve by uuid or name");
    println!("  POST   /concept/{{id}}  - Update a concept");
    println!("  DELETE /concept/{{id}}  - Retire (?reason=) or purge (?purge=true)");
    println!("  GET    /status        - Concept counts");
    println!("  GET    /health        - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    api::run_server(&addr, session, config).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create a fresh redb database, optionally seeded with the demo dictionary.
pub fn cmd_init(config: &AppConfig, force: bool, demo_mode: bool) -> Result<(), LexisError> {
    if config.storage.backend != BackendKind::Redb {
        return Err(LexisError::InvalidArgument(
            "init needs the redb backend".to_string(),
        ));
    }

    let path = &config.storage.path;
    if path.exists() {
        if !force {
            return Err(LexisError::InvalidArgument(format!(
                "database {} already exists, use --force to overwrite",
                path.display()
            )));
        }
        std::fs::remove_file(path)
            .map_err(|e| LexisError::Io(format!("remove {}: {}", path.display(), e)))?;
    }

    let mut session = config.open_session()?;
    if demo_mode {
        session.restore_concepts(demo::concepts()?)?;
    }

    println!(
        "Initialized redb database at {} ({} concepts)",
        path.display(),
        session.counts()?.total
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show concept counts.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), LexisError> {
    let session = config.open_session()?;
    let counts = session.counts()?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": config.storage.path.to_string_lossy(),
            "backend": config.storage.backend.as_str(),
            "total": counts.total,
            "active": counts.active,
            "retired": counts.retired,
        }));
    }

    println!("Lexis Dictionary Status");
    println!("=======================");
    println!("Database: {}", config.storage.path.display());
    println!("Backend:  {}", config.storage.backend.as_str());
    println!();
    println!("Concepts: {}", counts.total);
    println!("Active:   {}", counts.active);
    println!("Retired:  {}", counts.retired);
    Ok(())
}

// =============================================================================
// GET COMMAND
// =============================================================================

/// Print one concept as JSON.
pub fn cmd_get(
    config: &AppConfig,
    id: &str,
    representation: Option<&str>,
) -> Result<(), LexisError> {
    let session = config.open_session()?;
    let view = session.retrieve(&config.default_context(), id, representation)?;
    print_json(&view)
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Parsed `search` arguments.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub query: String,
    pub member_of: Option<String>,
    pub answer_to: Option<String>,
    pub representation: Option<String>,
    pub limit: Option<usize>,
    pub include_retired: bool,
}

/// Search and print matching concepts.
pub fn cmd_search(
    config: &AppConfig,
    json_mode: bool,
    args: &SearchArgs,
) -> Result<(), LexisError> {
    let session = config.open_session()?;
    let ctx = config.default_context();

    let level = Representation::for_listing(args.representation.as_deref())?;
    let filter = SearchFilter::from_params(args.member_of.as_deref(), args.answer_to.as_deref())?;
    let options = SearchOptions {
        include_retired: args.include_retired,
    };
    let window = Window::resolve(None, args.limit, session.paging())?;

    let page = session.search(&ctx, &args.query, filter, options, window)?;

    if json_mode {
        let page = page.try_map(|c| session.project(&ctx, &c, level))?;
        return print_json(&page);
    }

    println!(
        "{} of {} matches for '{}'",
        page.results.len(),
        page.total_count,
        args.query
    );
    for concept in &page.results {
        let marker = if concept.retired { " (retired)" } else { "" };
        println!("  {}  {}{}", concept.id, concept.display(&ctx.locale), marker);
    }
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Create every concept spec in a JSON array file.
pub fn cmd_import(config: &AppConfig, json_mode: bool, file: &Path) -> Result<(), LexisError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_IMPORT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&path)
        .map_err(|e| LexisError::Io(format!("read {}: {}", path.display(), e)))?;
    let specs: Vec<NewConcept> =
        serde_json::from_str(&text).map_err(|e| LexisError::Serialization(e.to_string()))?;

    let mut session = config.open_session()?;
    let created = session.import(&config.default_context(), specs)?;

    if json_mode {
        return print_json(&created);
    }
    println!("Imported {} concepts from {}", created.len(), path.display());
    Ok(())
}

// =============================================================================
// EXPORT / RESTORE COMMANDS
// =============================================================================

/// Write every concept to a binary snapshot.
pub fn cmd_export(config: &AppConfig, output: &Path) -> Result<(), LexisError> {
    let output = validate_output_path(output)?;
    let session = config.open_session()?;
    let concepts = session.export_concepts()?;
    let data = snapshot_to_bytes(&concepts)?;

    std::fs::write(&output, &data)
        .map_err(|e| LexisError::Io(format!("write {}: {}", output.display(), e)))?;

    println!(
        "Exported {} concepts ({} bytes) to {}",
        concepts.len(),
        data.len(),
        output.display()
    );
    Ok(())
}

/// Replace the store content with a snapshot.
pub fn cmd_restore(config: &AppConfig, input: &Path) -> Result<(), LexisError> {
    let path = validate_file_path(input)?;
    validate_file_size(&path, MAX_SNAPSHOT_SIZE as u64)?;

    let data = std::fs::read(&path)
        .map_err(|e| LexisError::Io(format!("read {}: {}", path.display(), e)))?;
    let concepts = snapshot_from_bytes(&data)?;
    let count = concepts.len();

    let mut session = config.open_session()?;
    session.restore_concepts(concepts)?;

    println!("Restored {} concepts from {}", count, path.display());
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn redb_config(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.path = dir.join("lexis.redb");
        config
    }

    #[test]
    fn init_demo_then_export_restore() {
        let temp = tempdir().expect("temp dir");
        let config = redb_config(temp.path());

        cmd_init(&config, false, true).expect("init");
        assert!(cmd_init(&config, false, false).is_err());

        let snapshot = temp.path().join("dump.lxs");
        cmd_export(&config, &snapshot).expect("export");

        cmd_init(&config, true, false).expect("reinit");
        assert_eq!(config.open_session().expect("open").counts().expect("counts").total, 0);

        cmd_restore(&config, &snapshot).expect("restore");
        let counts = config.open_session().expect("open").counts().expect("counts");
        assert_eq!(counts.total, 25);
        assert_eq!(counts.retired, 1);
    }

    #[test]
    fn import_json_specs() {
        let temp = tempdir().expect("temp dir");
        let config = redb_config(temp.path());
        let file = temp.path().join("concepts.json");
        std::fs::write(
            &file,
            r#"[
                {"names": [{"name": "MALARIA"}], "datatype": "N/A", "conceptClass": "Diagnosis"},
                {"names": [{"name": "FEVER"}], "datatype": "N/A", "conceptClass": "Symptom"}
            ]"#,
        )
        .expect("write");

        cmd_import(&config, true, &file).expect("import");
        let session = config.open_session().expect("open");
        assert_eq!(session.counts().expect("counts").total, 2);
        assert!(session.resolve("malaria").is_ok());
    }

    #[test]
    fn init_rejects_memory_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = BackendKind::Memory;
        assert!(matches!(
            cmd_init(&config, false, false),
            Err(LexisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn output_path_without_parent_uses_cwd() {
        let path = validate_output_path(Path::new("out.lxs")).expect("path");
        assert_eq!(path.file_name().and_then(|f| f.to_str()), Some("out.lxs"));
    }
}
