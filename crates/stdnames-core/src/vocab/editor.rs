//! Vocabulary file mutation and grammar code generation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::token::validate_token;
use super::vocabulary::VocabKind;
use crate::error::Error;

/// Default timeout for the codegen subprocess.
const CODEGEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for codegen to exit.
const CODEGEN_POLL: Duration = Duration::from_millis(100);

/// Outcome status of a vocabulary edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStatus {
    /// Nothing to do; no file was touched and codegen did not run.
    Unchanged,
    /// File written and codegen succeeded. The hosting process must restart
    /// for the regenerated grammar types to take effect.
    Success,
    /// Codegen errored or the rewritten YAML failed re-validation.
    Failed,
}

/// Result of an `add_tokens` / `remove_tokens` call.
#[derive(Debug, Clone, Serialize)]
pub struct VocabEditOutcome {
    /// Vocabulary that was targeted.
    pub vocabulary: VocabKind,
    /// Final status.
    pub status: EditStatus,
    /// Human-readable summary.
    pub message: String,
    /// Tokens actually added or removed.
    pub changed: Vec<String>,
    /// Tokens that were already present (add) or not found (remove).
    pub unchanged: Vec<String>,
}

/// External command that regenerates grammar enumerations from YAML.
#[derive(Debug, Clone)]
pub struct CodegenCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CodegenCommand {
    /// Build a codegen command.
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
            timeout: CODEGEN_TIMEOUT,
        }
    }

    /// Override the subprocess timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command, polling until exit or timeout.
    ///
    /// Timeouts and non-zero exits are reported as `Err(message)`; this
    /// never panics and never raises past the editor's public methods.
    fn run(&self) -> Result<String, String> {
        debug!(program = %self.program, "running codegen");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn codegen '{}': {e}", self.program))?;

        // Drain both pipes on background threads while waiting. A codegen
        // that writes more than the OS pipe buffer would otherwise block on
        // the full pipe and never exit, turning a success into a timeout.
        let stdout = drain_pipe(child.stdout.take());
        let stderr = drain_pipe(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() >= self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(format!(
                            "codegen timed out after {}s",
                            self.timeout.as_secs()
                        ));
                    }
                    std::thread::sleep(CODEGEN_POLL);
                }
                Err(e) => return Err(format!("failed to wait for codegen: {e}")),
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if status.success() {
            Ok(stdout)
        } else {
            let detail = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr
            };
            Err(format!(
                "codegen exited with {}: {}",
                status,
                detail.trim()
            ))
        }
    }
}

/// Read a child pipe to completion on a background thread.
fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

/// Mutates vocabulary YAML files and keeps generated grammar types in sync.
///
/// All tokens in a batch are validated before any file is touched; a single
/// invalid token rejects the whole call with itemized messages.
pub struct VocabularyEditor {
    root: PathBuf,
    codegen: Option<CodegenCommand>,
}

impl VocabularyEditor {
    /// Create an editor over a vocabulary directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            codegen: None,
        }
    }

    /// Attach a codegen command to run after successful file edits.
    pub fn with_codegen(mut self, codegen: CodegenCommand) -> Self {
        self.codegen = Some(codegen);
        self
    }

    /// Add tokens to a vocabulary.
    pub fn add_tokens(
        &self,
        vocabulary: VocabKind,
        tokens: &[String],
    ) -> Result<VocabEditOutcome, Error> {
        self.validate_batch(tokens)?;

        let path = self.root.join(vocabulary.file_name());
        let (header, mut current) = self.load_file(&path)?;

        let mut added = Vec::new();
        let mut already_present = Vec::new();
        for token in tokens {
            if current.iter().any(|t| t == token) {
                already_present.push(token.clone());
            } else {
                current.push(token.clone());
                added.push(token.clone());
            }
        }

        if added.is_empty() {
            return Ok(VocabEditOutcome {
                vocabulary,
                status: EditStatus::Unchanged,
                message: "all tokens already present".to_string(),
                changed: added,
                unchanged: already_present,
            });
        }

        self.finish_edit(vocabulary, &path, &header, &current, added, already_present)
    }

    /// Remove tokens from a vocabulary.
    pub fn remove_tokens(
        &self,
        vocabulary: VocabKind,
        tokens: &[String],
    ) -> Result<VocabEditOutcome, Error> {
        self.validate_batch(tokens)?;

        let path = self.root.join(vocabulary.file_name());
        let (header, current) = self.load_file(&path)?;

        let mut removed = Vec::new();
        let mut not_found = Vec::new();
        for token in tokens {
            if current.iter().any(|t| t == token) {
                removed.push(token.clone());
            } else {
                not_found.push(token.clone());
            }
        }

        if removed.is_empty() {
            return Ok(VocabEditOutcome {
                vocabulary,
                status: EditStatus::Unchanged,
                message: "no matching tokens to remove".to_string(),
                changed: removed,
                unchanged: not_found,
            });
        }

        let remaining: Vec<String> = current
            .into_iter()
            .filter(|t| !removed.contains(t))
            .collect();

        self.finish_edit(vocabulary, &path, &header, &remaining, removed, not_found)
    }

    /// Validate every token in the batch before any write.
    fn validate_batch(&self, tokens: &[String]) -> Result<(), Error> {
        let errors: Vec<String> = tokens
            .iter()
            .filter_map(|t| validate_token(t).err())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation("tokens", errors.join("; ")))
        }
    }

    /// Load a vocabulary file, returning its header comments and tokens.
    fn load_file(&self, path: &Path) -> Result<(String, Vec<String>), Error> {
        if !path.exists() {
            return Ok((String::new(), Vec::new()));
        }
        let text = std::fs::read_to_string(path)?;
        let header: String = text
            .lines()
            .take_while(|line| line.trim_start().starts_with('#') || line.trim().is_empty())
            .map(|line| format!("{line}\n"))
            .collect();
        // A comments-only file parses as null, not an empty list.
        let tokens: Option<Vec<String>> = serde_yaml::from_str(&text)?;
        Ok((header, tokens.unwrap_or_default()))
    }

    /// Rewrite the file, re-validate it, and run codegen.
    fn finish_edit(
        &self,
        vocabulary: VocabKind,
        path: &Path,
        header: &str,
        tokens: &[String],
        changed: Vec<String>,
        unchanged: Vec<String>,
    ) -> Result<VocabEditOutcome, Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_yaml::to_string(&tokens)?;
        std::fs::write(path, format!("{header}{body}"))?;
        info!(vocabulary = %vocabulary, changed = changed.len(), "vocabulary file rewritten");

        // Re-validate what landed on disk.
        let written = std::fs::read_to_string(path)?;
        if let Err(e) = serde_yaml::from_str::<Vec<String>>(&written) {
            warn!(vocabulary = %vocabulary, error = %e, "rewritten vocabulary failed re-validation");
            return Ok(VocabEditOutcome {
                vocabulary,
                status: EditStatus::Failed,
                message: format!("rewritten file failed re-validation: {e}"),
                changed,
                unchanged,
            });
        }

        match &self.codegen {
            Some(cmd) => match cmd.run() {
                Ok(_) => Ok(VocabEditOutcome {
                    vocabulary,
                    status: EditStatus::Success,
                    message: "vocabulary updated; restart required for grammar types".to_string(),
                    changed,
                    unchanged,
                }),
                Err(msg) => {
                    warn!(vocabulary = %vocabulary, error = %msg, "codegen failed");
                    Ok(VocabEditOutcome {
                        vocabulary,
                        status: EditStatus::Failed,
                        message: msg,
                        changed,
                        unchanged,
                    })
                }
            },
            None => Ok(VocabEditOutcome {
                vocabulary,
                status: EditStatus::Success,
                message: "vocabulary updated; no codegen configured".to_string(),
                changed,
                unchanged,
            }),
        }
    }
}
