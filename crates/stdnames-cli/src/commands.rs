//! Subcommand implementations.

use std::error::Error as StdError;
use std::path::Path;

use tracing::info;

use stdnames_core::{
    AuditOptions, BatchMode, Catalog, CodegenCommand, EditCatalog, Kind, Operation, SearchFilter,
    Status, VocabKind, VocabularyAuditor, VocabularyEditor, VocabularySet, YamlStore,
};

use crate::{Args, Command, VocabCommand};

type CliResult = Result<(), Box<dyn StdError>>;

pub fn run(args: Args) -> CliResult {
    let Args {
        root,
        vocab_dir,
        json,
        command,
    } = args;

    match command {
        Command::List { kind } => list(&root, kind.as_deref(), json),
        Command::Show { name } => show(&root, &name),
        Command::Search {
            query,
            kind,
            status,
            tag,
        } => search(&root, &query, kind.as_deref(), status.as_deref(), tag, json),
        Command::Apply {
            file,
            dry_run,
            mode,
            resume_from,
        } => apply(&root, &file, dry_run, &mode, resume_from),
        Command::Audit {
            vocabulary,
            threshold,
            max_results,
        } => audit(
            &root,
            &vocab_dir,
            vocabulary.as_deref(),
            threshold,
            max_results,
            json,
        ),
        Command::Check { name, threshold } => check(&root, &vocab_dir, &name, threshold, json),
        Command::Vocab(cmd) => vocab(&vocab_dir, cmd, json),
    }
}

fn open_catalog(root: &Path) -> Result<Catalog<YamlStore>, Box<dyn StdError>> {
    Ok(Catalog::new(YamlStore::open(root)?))
}

fn parse_kind(s: &str) -> Result<Kind, Box<dyn StdError>> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown kind '{s}'").into())
}

fn parse_status(s: &str) -> Result<Status, Box<dyn StdError>> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown status '{s}'").into())
}

fn list(root: &Path, kind: Option<&str>, json: bool) -> CliResult {
    let catalog = open_catalog(root)?;
    let kind = kind.map(parse_kind).transpose()?;
    let entries = catalog.list(kind);
    if json {
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for entry in entries {
            println!("{}", entry.name);
        }
    }
    Ok(())
}

fn show(root: &Path, name: &str) -> CliResult {
    let catalog = open_catalog(root)?;
    let entry = catalog
        .get(name)
        .ok_or_else(|| format!("no entry named '{name}'"))?;
    print!("{}", serde_yaml::to_string(entry)?);
    Ok(())
}

fn search(
    root: &Path,
    query: &str,
    kind: Option<&str>,
    status: Option<&str>,
    tag: Option<String>,
    json: bool,
) -> CliResult {
    let catalog = open_catalog(root)?;
    let filter = SearchFilter {
        kind: kind.map(parse_kind).transpose()?,
        status: status.map(parse_status).transpose()?,
        tag,
    };
    let matches = catalog.search(query, &filter);
    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        for entry in matches {
            println!("{:<50} {}", entry.name, entry.description);
        }
    }
    Ok(())
}

fn apply(
    root: &Path,
    file: &Path,
    dry_run: bool,
    mode: &str,
    resume_from: Option<usize>,
) -> CliResult {
    let mode = match mode {
        "continue" => BatchMode::Continue,
        "atomic" => BatchMode::Atomic,
        other => return Err(format!("unknown mode '{other}' (continue|atomic)").into()),
    };

    let text = std::fs::read_to_string(file)?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    let operations: Vec<Operation> = match document {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?,
        single => vec![serde_json::from_value(single)?],
    };
    info!(operations = operations.len(), dry_run, "applying operations");

    let mut edit = EditCatalog::from_store(YamlStore::open(root)?);
    let result = edit.apply_batch(operations, mode, dry_run, resume_from);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if dry_run {
        return Ok(());
    }
    if mode == BatchMode::Atomic && result.summary.failed > 0 {
        return Err("batch failed; nothing was committed".into());
    }

    let diff = edit.diff();
    if diff.is_empty() {
        println!("nothing to commit");
        return Ok(());
    }
    let report = edit.write()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.ok {
        return Err("validation failed; nothing was written".into());
    }
    Ok(())
}

fn audit(
    root: &Path,
    vocab_dir: &Path,
    vocabulary: Option<&str>,
    threshold: usize,
    max_results: usize,
    json: bool,
) -> CliResult {
    let catalog = open_catalog(root)?;
    let corpus = catalog.list_names();
    let vocabs = VocabularySet::load(vocab_dir)?;
    let mut auditor = VocabularyAuditor::new(vocabs);

    let options = AuditOptions {
        vocabulary: vocabulary.map(str::parse).transpose()?,
        frequency_threshold: threshold,
        max_results,
    };
    let report = auditor.audit(&corpus, &options);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.is_clean() {
        println!("no vocabulary gaps found ({} names scanned)", corpus.len());
        return Ok(());
    }
    for group in &report.gaps {
        println!("{}:", group.vocabulary);
        for c in &group.candidates {
            println!(
                "  {:<30} {:>3}x  {:<6} ({} names)",
                c.token,
                c.frequency,
                c.priority,
                c.affected_names.len()
            );
        }
    }
    Ok(())
}

fn check(root: &Path, vocab_dir: &Path, name: &str, threshold: usize, json: bool) -> CliResult {
    let catalog = open_catalog(root)?;
    let corpus = catalog.list_names();
    let vocabs = VocabularySet::load(vocab_dir)?;
    let mut auditor = VocabularyAuditor::new(vocabs);

    let report = auditor.check_name(name, &corpus, threshold);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if !report.has_gaps() {
        println!("{name}: no vocabulary gaps");
        return Ok(());
    }
    for gap in &report.gaps {
        println!(
            "{}: '{}' missing from {} ({}x, {})",
            name, gap.token, gap.vocabulary, gap.frequency, gap.priority
        );
    }
    Ok(())
}

fn vocab(vocab_dir: &Path, cmd: VocabCommand, json: bool) -> CliResult {
    match cmd {
        VocabCommand::List { vocabulary } => {
            let kind: VocabKind = vocabulary.parse()?;
            let vocabs = VocabularySet::load(vocab_dir)?;
            for token in vocabs.get(kind).tokens() {
                println!("{token}");
            }
            Ok(())
        }
        VocabCommand::Add {
            vocabulary,
            tokens,
            codegen,
        } => {
            let kind: VocabKind = vocabulary.parse()?;
            let editor = editor_with_codegen(vocab_dir, codegen)?;
            let outcome = editor.add_tokens(kind, &tokens)?;
            report_vocab_outcome(&outcome, json)
        }
        VocabCommand::Remove {
            vocabulary,
            tokens,
            codegen,
        } => {
            let kind: VocabKind = vocabulary.parse()?;
            let editor = editor_with_codegen(vocab_dir, codegen)?;
            let outcome = editor.remove_tokens(kind, &tokens)?;
            report_vocab_outcome(&outcome, json)
        }
    }
}

fn editor_with_codegen(
    vocab_dir: &Path,
    codegen: Option<String>,
) -> Result<VocabularyEditor, Box<dyn StdError>> {
    let editor = VocabularyEditor::new(vocab_dir);
    match codegen {
        Some(command) => {
            let mut parts = command.split_whitespace().map(str::to_string);
            let program = parts
                .next()
                .ok_or("empty codegen command")?;
            Ok(editor.with_codegen(CodegenCommand::new(program, parts)))
        }
        None => Ok(editor),
    }
}

fn report_vocab_outcome(
    outcome: &stdnames_core::VocabEditOutcome,
    json: bool,
) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!(
            "{}: {} ({} changed, {} unchanged)",
            outcome.vocabulary,
            outcome.message,
            outcome.changed.len(),
            outcome.unchanged.len()
        );
    }
    if outcome.status == stdnames_core::EditStatus::Failed {
        return Err(outcome.message.clone().into());
    }
    Ok(())
}
