//! Code workspace inspection router.
//!
//! Resolves a target file (explicit filename token, conventional entry
//! point, or first source file under the workspace root), truncates its
//! content to a fixed byte budget, and forwards it to the LLM with a
//! task-specific instruction. Workspace walking is gitignore-aware and
//! skips build/VCS/dependency directories.

use crate::config::WorkspaceConfig;
use crate::dispatch::DispatchResult;
use crate::launcher::ProcessHost;
use crate::llm::{LLM_UNAVAILABLE_MESSAGE, LlmClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Directory names never descended into, on top of gitignore rules.
const IGNORED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    "node_modules",
    ".vscode",
    "venv",
    "env",
    ".pytest_cache",
    "target",
    "dist",
    "build",
];

/// Extensions treated as source code.
const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "rs", "go", "java", "c", "cpp", "html", "css",
];

/// How many workspace files a debug sweep analyzes.
const DEBUG_SWEEP_LIMIT: usize = 3;

const DEBUG_FILE_INSTRUCTION: &str = "Debug this code. Find syntax errors, logic issues, and \
     potential bugs. Provide specific fixes.";
const DEBUG_WORKSPACE_INSTRUCTION: &str =
    "Find bugs, syntax errors, and potential issues in this code";
const ANALYZE_INSTRUCTION: &str =
    "Analyze this code for quality, structure, performance, and best practices";
const QUALITY_INSTRUCTION: &str =
    "Assess code quality, structure, and provide improvement suggestions";
const EXPLAIN_INSTRUCTION: &str = "Explain what this code does in simple terms. Describe its \
     purpose, main functions, and how it works.";
const IMPROVE_INSTRUCTION: &str = "Suggest specific improvements for this code: performance \
     optimizations, better practices, cleaner structure, and modern language features.";

/// Router for code-assistant commands.
pub struct CodeAssistant {
    config: WorkspaceConfig,
    llm: LlmClient,
    host: Arc<dyn ProcessHost>,
}

impl CodeAssistant {
    /// Create a router over the given workspace and collaborators.
    pub fn new(config: WorkspaceConfig, llm: LlmClient, host: Arc<dyn ProcessHost>) -> Self {
        Self { config, llm, host }
    }

    fn root(&self) -> PathBuf {
        self.config
            .root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Debug a file named in the utterance (or a conventional entry point).
    pub async fn debug_file(&self, utterance: &str) -> DispatchResult {
        let Some(path) = self.resolve_target_file(utterance) else {
            return DispatchResult::fail(
                "Please specify which file to debug, or I couldn't find a main file.",
            );
        };
        info!("debugging {}", path.display());
        self.analyze_one(&path, DEBUG_FILE_INSTRUCTION).await
    }

    /// Sweep the workspace for issues, one file at a time.
    pub async fn debug_workspace(&self) -> DispatchResult {
        let files = self.find_source_files(DEBUG_SWEEP_LIMIT);
        if files.is_empty() {
            return DispatchResult::fail("No source files found in workspace to debug.");
        }

        let mut findings = Vec::new();
        for path in &files {
            info!("checking {}", path.display());
            let result = self.analyze_one(path, DEBUG_WORKSPACE_INSTRUCTION).await;
            if result.success {
                findings.push(format!("{}:\n{}", file_name(path), result.message));
            }
        }

        if findings.is_empty() {
            return DispatchResult::fail(LLM_UNAVAILABLE_MESSAGE);
        }
        DispatchResult::ok(format!(
            "Issues found in workspace:\n\n{}",
            findings.join("\n\n")
        ))
    }

    /// Analyze a file named in the utterance.
    pub async fn analyze_file(&self, utterance: &str) -> DispatchResult {
        let Some(path) = explicit_file_token(utterance).map(|name| self.absolute(&name)) else {
            return DispatchResult::fail("Please specify which file to analyze.");
        };
        info!("analyzing {}", path.display());
        self.analyze_one(&path, ANALYZE_INSTRUCTION).await
    }

    /// Workspace overview plus a quality pass over the first source file.
    pub async fn analyze_workspace(&self) -> DispatchResult {
        let overview = self.overview();
        let Some(first) = self.find_source_files(1).into_iter().next() else {
            return DispatchResult::ok(overview);
        };

        let quality = self.analyze_one(&first, QUALITY_INSTRUCTION).await;
        if quality.success {
            DispatchResult::ok(format!(
                "{overview}\n\nCode quality analysis:\n{}",
                quality.message
            ))
        } else {
            // The overview alone is still useful.
            DispatchResult::ok(overview)
        }
    }

    /// Explain what the code does, preferring a conventional entry point.
    pub async fn explain_code(&self) -> DispatchResult {
        let target = self
            .entry_point()
            .or_else(|| self.find_source_files(1).into_iter().next());
        let Some(path) = target else {
            return DispatchResult::fail("No code files found to explain.");
        };
        info!("explaining {}", path.display());
        self.analyze_one(&path, EXPLAIN_INSTRUCTION).await
    }

    /// Suggest improvements for the first source file.
    pub async fn suggest_improvements(&self) -> DispatchResult {
        let Some(path) = self.find_source_files(1).into_iter().next() else {
            return DispatchResult::fail("No source files found to improve.");
        };
        self.analyze_one(&path, IMPROVE_INSTRUCTION).await
    }

    /// Open a file or folder in the code editor.
    pub async fn open_in_editor(&self, utterance: &str) -> DispatchResult {
        let editor = ["code", "codium", "code.exe"]
            .iter()
            .find_map(|name| self.host.resolve(name));
        let Some(editor) = editor else {
            return DispatchResult::fail("No code editor found. Please install VS Code first.");
        };

        let target = editor_target(utterance);
        let args: Vec<String> = target.iter().cloned().collect();
        match self.host.spawn(&editor, &args).await {
            Ok(_) => match target {
                Some(target) => DispatchResult::ok(format!("Opened {target} in editor")),
                None => DispatchResult::ok("Opened editor"),
            },
            Err(e) => DispatchResult::fail(format!("Failed to open editor: {e}")),
        }
    }

    /// Summarize the workspace: file counts by extension and total size.
    pub async fn workspace_overview(&self) -> DispatchResult {
        DispatchResult::ok(self.overview())
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Read, truncate, and forward one file to the LLM. The LLM's
    /// response is returned verbatim as the result message.
    async fn analyze_one(&self, path: &Path, instruction: &str) -> DispatchResult {
        let content = match self.read_truncated(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("could not read {}: {e}", path.display());
                return DispatchResult::fail(format!("Could not read {}.", file_name(path)));
            }
        };

        let prompt = analysis_prompt(&file_name(path), language_for(path), &content, instruction);
        match self.llm.generate(&prompt).await {
            Ok(response) => DispatchResult::ok(response),
            Err(e) => {
                debug!("code analysis failed: {e}");
                DispatchResult::fail(LLM_UNAVAILABLE_MESSAGE)
            }
        }
    }

    /// Explicit filename token, else the first existing entry point.
    fn resolve_target_file(&self, utterance: &str) -> Option<PathBuf> {
        if let Some(name) = explicit_file_token(utterance) {
            return Some(self.absolute(&name));
        }
        self.entry_point()
    }

    fn entry_point(&self) -> Option<PathBuf> {
        let root = self.root();
        self.config
            .entry_points
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.exists())
    }

    fn absolute(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.root().join(path)
    }

    fn read_truncated(&self, path: &Path) -> std::io::Result<String> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let max = self.config.max_file_bytes;
        if content.len() <= max {
            return Ok(content.into_owned());
        }
        let mut end = max;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        Ok(format!("{}\n... (truncated)", &content[..end]))
    }

    /// First `limit` source files under the root, gitignore-aware.
    fn find_source_files(&self, limit: usize) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = ignore::WalkBuilder::new(self.root())
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !IGNORED_DIRS.contains(&name))
            })
            .build();

        for entry in walker.flatten() {
            if files.len() >= limit {
                break;
            }
            let path = entry.path();
            if path.is_file() && has_source_extension(path) {
                files.push(path.to_path_buf());
            }
        }
        files
    }

    fn overview(&self) -> String {
        let root = self.root();
        let mut counts: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
        let mut total_files = 0usize;
        let mut total_size = 0u64;

        let walker = ignore::WalkBuilder::new(&root)
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_none_or(|name| !IGNORED_DIRS.contains(&name))
            })
            .build();

        for entry in walker.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or_else(|| "(no extension)".to_owned(), |e| format!(".{e}"));
            *counts.entry(ext).or_default() += 1;
            total_files += 1;
            if let Ok(meta) = entry.metadata() {
                total_size += meta.len();
            }
        }

        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());

        let mut by_count: Vec<(String, usize)> = counts.into_iter().collect();
        by_count.sort_by(|a, b| b.1.cmp(&a.1));

        let mut overview = format!(
            "Workspace: {name}\nTotal files: {total_files}\nTotal size: {}\n\nFile types:\n",
            format_size(total_size)
        );
        for (ext, count) in by_count.into_iter().take(10) {
            overview.push_str(&format!("  {ext}: {count} files\n"));
        }
        overview
    }
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// First whitespace token that looks like a source filename.
fn explicit_file_token(utterance: &str) -> Option<String> {
    utterance
        .split_whitespace()
        .map(|word| word.trim_matches(['"', '\'', ',', '?']))
        .find(|word| {
            word.contains('.')
                && Path::new(word)
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| {
                        SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) || ext == "txt"
                    })
        })
        .map(str::to_owned)
}

/// Target following an "open"/"file"/"folder" marker word.
fn editor_target(utterance: &str) -> Option<String> {
    let words: Vec<&str> = utterance.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let lowered = word.to_lowercase();
        if matches!(lowered.as_str(), "open" | "file" | "folder")
            && let Some(next) = words.get(i + 1)
        {
            let next = next.trim_matches(['"', '\'']);
            // Skip marker-word pairs like "open file x".
            if !matches!(next.to_lowercase().as_str(), "file" | "folder" | "in") {
                return Some(next.to_owned());
            }
        }
    }
    None
}

fn language_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("rs") => "rust",
        Some("go") => "go",
        Some("java") => "java",
        Some("c") => "c",
        Some("cpp") => "cpp",
        Some("html") => "html",
        Some("css") => "css",
        _ => "text",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn analysis_prompt(file_name: &str, language: &str, content: &str, instruction: &str) -> String {
    format!(
        "I'm analyzing a {language} code file: {file_name}\n\n\
         CODE CONTENT:\n```{language}\n{content}\n```\n\n\
         ANALYSIS REQUEST: {instruction}\n\n\
         Please provide:\n\
         1. Code quality assessment\n\
         2. Potential bugs or issues\n\
         3. Suggestions for improvement\n\
         4. Best practices recommendations\n\
         5. Security considerations (if applicable)\n\n\
         Keep your response practical and actionable. Focus on the most important issues first."
    )
}

fn format_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes > MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes > KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::config::LlmConfig;
    use crate::error::{AssistantError, Result};
    use async_trait::async_trait;

    struct NoHost;

    #[async_trait]
    impl ProcessHost for NoHost {
        async fn spawn(&self, _program: &Path, _args: &[String]) -> Result<u32> {
            Err(AssistantError::Launch("not available".into()))
        }
        fn resolve(&self, _name: &str) -> Option<PathBuf> {
            None
        }
        async fn terminate_matching(&self, _name: &str) -> Result<bool> {
            Ok(false)
        }
        async fn open_url(&self, _url: &str) -> Result<()> {
            Ok(())
        }
    }

    fn assistant_for(root: &Path) -> CodeAssistant {
        let config = WorkspaceConfig {
            root: Some(root.to_path_buf()),
            ..Default::default()
        };
        CodeAssistant::new(config, LlmClient::new(&LlmConfig::default()), Arc::new(NoHost))
    }

    #[test]
    fn explicit_file_token_finds_source_names() {
        assert_eq!(explicit_file_token("debug main.py please").as_deref(), Some("main.py"));
        assert_eq!(explicit_file_token("analyze 'app.js'").as_deref(), Some("app.js"));
        assert_eq!(explicit_file_token("debug something"), None);
        // Version numbers are not filenames.
        assert_eq!(explicit_file_token("debug version 3.14"), None);
    }

    #[test]
    fn editor_target_follows_marker_words() {
        assert_eq!(editor_target("open file notes.txt").as_deref(), Some("notes.txt"));
        assert_eq!(editor_target("open folder src").as_deref(), Some("src"));
        // The word after "open" is taken literally, marker words aside.
        assert_eq!(editor_target("open the editor").as_deref(), Some("the"));
        assert_eq!(editor_target("editor please"), None);
    }

    #[test]
    fn language_detection_by_extension() {
        assert_eq!(language_for(Path::new("x.py")), "python");
        assert_eq!(language_for(Path::new("x.rs")), "rust");
        assert_eq!(language_for(Path::new("x.unknown")), "text");
    }

    #[test]
    fn truncation_respects_byte_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.py");
        std::fs::write(&path, "x".repeat(10_000)).unwrap();

        let assistant = assistant_for(dir.path());
        let content = assistant.read_truncated(&path).unwrap();
        assert!(content.ends_with("... (truncated)"));
        assert!(content.len() < 10_000);
    }

    #[test]
    fn small_files_are_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.py");
        std::fs::write(&path, "print('hi')\n").unwrap();

        let assistant = assistant_for(dir.path());
        assert_eq!(assistant.read_truncated(&path).unwrap(), "print('hi')\n");
    }

    #[test]
    fn source_walk_skips_dependency_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/dep.js"), "x").unwrap();
        std::fs::write(dir.path().join("app.py"), "x").unwrap();

        let assistant = assistant_for(dir.path());
        let files = assistant.find_source_files(10);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app.py"));
    }

    #[test]
    fn entry_point_resolution_prefers_configured_candidates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("helper.py"), "x").unwrap();
        std::fs::write(dir.path().join("main.py"), "x").unwrap();

        let assistant = assistant_for(dir.path());
        let entry = assistant.entry_point().unwrap();
        assert!(entry.ends_with("main.py"));
    }

    #[test]
    fn overview_counts_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "x").unwrap();
        std::fs::write(dir.path().join("b.py"), "y").unwrap();
        std::fs::write(dir.path().join("c.rs"), "z").unwrap();

        let assistant = assistant_for(dir.path());
        let overview = assistant.overview();
        assert!(overview.contains("Total files: 3"));
        assert!(overview.contains(".py: 2 files"));
        assert!(overview.contains(".rs: 1 files"));
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
