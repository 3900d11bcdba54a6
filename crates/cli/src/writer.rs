//! Writing generated modules and mock data to disk.
//!
//! Files are planned first and written second, so a dry run can show the
//! same changes as a diff without touching anything.

use console::style;
use serde_json::{Value, json};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use swaggen_core::{CompileOutput, GeneratedModule, MockArtifact};

/// Route table written next to the mock bodies.
pub const ROUTES_FILE: &str = "routes.json";

/// Unchanged lines shown around each hunk.
const DIFF_CONTEXT_LINES: usize = 3;

/// A file to be written.
#[derive(Debug, Clone)]
pub struct FileChange {
    /// Target file.
    pub path: PathBuf,
    /// Text to write.
    pub new_content: String,
    /// Existing content (None if file doesn't exist)
    pub existing_content: Option<String>,
}

impl FileChange {
    fn read(path: PathBuf, new_content: String) -> Self {
        let existing_content = fs::read_to_string(&path).ok();
        Self {
            path,
            new_content,
            existing_content,
        }
    }

    /// Whether the file does not exist yet.
    pub const fn is_new(&self) -> bool {
        self.existing_content.is_none()
    }

    /// Whether the file exists with different content.
    pub fn is_modified(&self) -> bool {
        match &self.existing_content {
            Some(existing) => existing != &self.new_content,
            None => false,
        }
    }

    /// Hunks turning the file on disk into the generated text, `None` for
    /// new or unchanged files.
    pub fn generate_diff(&self) -> Option<String> {
        let existing = self.existing_content.as_deref()?;
        if existing == self.new_content {
            return None;
        }
        let name = self.path.display();
        let unified = TextDiff::from_lines(existing, self.new_content.as_str())
            .unified_diff()
            .context_radius(DIFF_CONTEXT_LINES)
            .header(&format!("{name} (on disk)"), &format!("{name} (generated)"))
            .to_string();
        Some(unified.lines().map(|line| paint_diff_line(line) + "\n").collect())
    }
}

fn paint_diff_line(line: &str) -> String {
    if line.starts_with("---") || line.starts_with("+++") {
        style(line).bold().to_string()
    } else if line.starts_with("@@") {
        style(line).cyan().to_string()
    } else if line.starts_with('-') {
        style(line).red().to_string()
    } else if line.starts_with('+') {
        style(line).green().to_string()
    } else {
        line.to_string()
    }
}

/// Counts reported after writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files that did not exist.
    pub created: usize,
    /// Files whose content changed.
    pub updated: usize,
    /// Files left as they were.
    pub unchanged: usize,
}

fn plan_module(out_dir: &Path, module: &GeneratedModule) -> FileChange {
    FileChange::read(out_dir.join(&module.name), module.text.clone())
}

/// Plan the interface and request modules of `output` under `out_dir`.
pub fn plan_modules(out_dir: &Path, output: &CompileOutput) -> Vec<FileChange> {
    let mut changes = vec![plan_module(out_dir, &output.types)];
    if let Some(requests) = &output.requests {
        changes.push(plan_module(out_dir, requests));
    }
    changes
}

/// Wrap a mock body in the `{ code, msg, data }` envelope.
pub fn wrap_body(body: &Value) -> Value {
    json!({ "code": 200, "msg": "success", "data": body })
}

fn pretty_json(value: &Value) -> Result<String, String> {
    serde_json::to_string_pretty(value)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|err| format!("Failed to serialize mock data: {err}"))
}

/// Plan one `<name>.json` per mock entry plus the route table.
pub fn plan_mocks(mock_dir: &Path, mocks: &MockArtifact, wrap: bool) -> Result<Vec<FileChange>, String> {
    let mut changes = Vec::with_capacity(mocks.entries.len() + 1);
    for entry in &mocks.entries {
        let body = if wrap {
            wrap_body(&entry.body)
        } else {
            entry.body.clone()
        };
        changes.push(FileChange::read(
            mock_dir.join(format!("{}.json", entry.name)),
            pretty_json(&body)?,
        ));
    }
    changes.push(FileChange::read(
        mock_dir.join(ROUTES_FILE),
        pretty_json(&mocks.routes())?,
    ));
    Ok(changes)
}

/// Write every new or modified file, creating parent directories.
pub fn apply(changes: &[FileChange]) -> Result<WriteSummary, String> {
    let mut summary = WriteSummary::default();
    for change in changes {
        if !change.is_new() && !change.is_modified() {
            summary.unchanged += 1;
            continue;
        }
        if let Some(parent) = change.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create {}: {err}", parent.display()))?;
        }
        fs::write(&change.path, &change.new_content)
            .map_err(|err| format!("Failed to write {}: {err}", change.path.display()))?;
        if change.is_new() {
            summary.created += 1;
        } else {
            summary.updated += 1;
        }
    }
    Ok(summary)
}

/// Describe what `apply` would do, with diffs for modified files.
pub fn preview(changes: &[FileChange]) -> String {
    let mut output = String::new();
    for change in changes {
        if change.is_new() {
            output.push_str(&format!("{} {}\n", style("create").green(), change.path.display()));
        } else if let Some(diff) = change.generate_diff() {
            output.push_str(&diff);
        }
    }
    output
}
