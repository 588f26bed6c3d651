//! Workstation file actions.
//!
//! The [`FileStation`] trait abstracts a sandboxed view of the user's
//! files; [`HomeFileStation`] implements it over a root directory with
//! `tokio::fs`. Every tool formats voice-friendly result strings: long
//! file content is truncated, folder listings are capped, search results
//! are summarized.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::tools::{ParameterKind, ToolDefinition, handler_fn};

use super::{CapabilityBundle, CapabilityError, optional_bool, optional_str, required_str};

/// Read limit before a file is summarized instead of recited.
const READ_LIMIT: usize = 1000;
/// Folder entries spoken before the listing is summarized.
const LIST_LIMIT: usize = 20;
/// Search hits spoken before the result is summarized.
const SEARCH_LIMIT: usize = 10;

/// One entry in a folder listing.
#[derive(Debug, Clone)]
pub struct FolderEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Sandboxed file operations. Paths are relative to the station's root;
/// implementations must reject escapes.
#[async_trait]
pub trait FileStation: Send + Sync {
    /// Create a new file with `content` inside `folder` (root-relative;
    /// empty string means the root). Fails if the file already exists.
    async fn create_file(
        &self,
        folder: &str,
        name: &str,
        content: &str,
    ) -> Result<String, CapabilityError>;

    /// Read a file's full content.
    async fn read_file(&self, path: &str) -> Result<String, CapabilityError>;

    /// Overwrite (or append to) an existing file.
    async fn write_file(
        &self,
        path: &str,
        content: &str,
        append: bool,
    ) -> Result<String, CapabilityError>;

    /// List a folder's entries.
    async fn list_folder(&self, path: &str) -> Result<Vec<FolderEntry>, CapabilityError>;

    /// Create a folder (and missing parents).
    async fn create_folder(&self, path: &str) -> Result<String, CapabilityError>;

    /// Find files whose name contains `query` (case-insensitive), starting
    /// from `folder` (root when `None`). Returns root-relative paths.
    async fn search_files(
        &self,
        query: &str,
        folder: Option<&str>,
    ) -> Result<Vec<String>, CapabilityError>;
}

/// A [`FileStation`] rooted at one directory on the local disk.
pub struct HomeFileStation {
    root: PathBuf,
}

impl HomeFileStation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a root-relative path, rejecting absolute paths and any
    /// `..` component. Lexical check; the root itself is trusted.
    fn resolve(&self, relative: &str) -> Result<PathBuf, CapabilityError> {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            return Err(CapabilityError::InvalidInput(format!(
                "path must be relative to the workspace: {relative}"
            )));
        }
        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(CapabilityError::InvalidInput(format!(
                        "path escapes the workspace: {relative}"
                    )));
                }
            }
        }
        Ok(self.root.join(candidate))
    }
}

#[async_trait]
impl FileStation for HomeFileStation {
    async fn create_file(
        &self,
        folder: &str,
        name: &str,
        content: &str,
    ) -> Result<String, CapabilityError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(CapabilityError::InvalidInput(format!(
                "invalid file name: {name}"
            )));
        }
        let dir = self.resolve(folder)?;
        let path = dir.join(name);
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?
        {
            return Err(CapabilityError::InvalidInput(format!(
                "file already exists: {}",
                display_path(folder, name)
            )));
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        Ok(display_path(folder, name))
    }

    async fn read_file(&self, path: &str) -> Result<String, CapabilityError> {
        let resolved = self.resolve(path)?;
        match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CapabilityError::NotFound(format!("file: {path}")))
            }
            Err(e) => Err(CapabilityError::Backend(e.to_string())),
        }
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        append: bool,
    ) -> Result<String, CapabilityError> {
        let resolved = self.resolve(path)?;
        if !tokio::fs::try_exists(&resolved)
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?
        {
            return Err(CapabilityError::NotFound(format!("file: {path}")));
        }
        if append {
            let mut existing = tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| CapabilityError::Backend(e.to_string()))?;
            existing.push_str(content);
            tokio::fs::write(&resolved, existing)
                .await
                .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        } else {
            tokio::fs::write(&resolved, content)
                .await
                .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        }
        Ok(path.to_string())
    }

    async fn list_folder(&self, path: &str) -> Result<Vec<FolderEntry>, CapabilityError> {
        let resolved = self.resolve(path)?;
        let mut dir = match tokio::fs::read_dir(&resolved).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CapabilityError::NotFound(format!("folder: {path}")));
            }
            Err(e) => return Err(CapabilityError::Backend(e.to_string())),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| CapabilityError::Backend(e.to_string()))?
                .is_dir();
            entries.push(FolderEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn create_folder(&self, path: &str) -> Result<String, CapabilityError> {
        let resolved = self.resolve(path)?;
        tokio::fs::create_dir_all(&resolved)
            .await
            .map_err(|e| CapabilityError::Backend(e.to_string()))?;
        Ok(path.to_string())
    }

    async fn search_files(
        &self,
        query: &str,
        folder: Option<&str>,
    ) -> Result<Vec<String>, CapabilityError> {
        let needle = query.to_lowercase();
        let start = self.resolve(folder.unwrap_or(""))?;

        let mut matches = Vec::new();
        let mut stack = vec![start];
        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(CapabilityError::NotFound(format!(
                        "folder: {}",
                        folder.unwrap_or("")
                    )));
                }
                Err(e) => return Err(CapabilityError::Backend(e.to_string())),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| CapabilityError::Backend(e.to_string()))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry
                    .file_type()
                    .await
                    .map_err(|e| CapabilityError::Backend(e.to_string()))?
                    .is_dir();
                if is_dir {
                    stack.push(entry.path());
                } else if name.to_lowercase().contains(&needle) {
                    let rel = entry
                        .path()
                        .strip_prefix(&self.root)
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or(name);
                    matches.push(rel);
                }
            }
        }
        matches.sort();
        Ok(matches)
    }
}

fn display_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", folder.trim_end_matches('/'))
    }
}

// ─── Voice-friendly formatting ───

fn format_read(path: &str, content: &str) -> String {
    if content.is_empty() {
        return format!("The file '{path}' is empty.");
    }
    if content.chars().count() > READ_LIMIT {
        let head: String = content.chars().take(READ_LIMIT).collect();
        format!("{head}... (truncated, file is large)")
    } else {
        content.to_string()
    }
}

fn format_listing(path: &str, entries: &[FolderEntry]) -> String {
    if entries.is_empty() {
        return format!("The folder '{path}' is empty.");
    }
    let shown: Vec<String> = entries
        .iter()
        .take(LIST_LIMIT)
        .map(|e| {
            if e.is_dir {
                format!("{}/", e.name)
            } else {
                e.name.clone()
            }
        })
        .collect();
    let mut out = format!(
        "The folder '{path}' contains {} item(s): {}",
        entries.len(),
        shown.join(", ")
    );
    if entries.len() > LIST_LIMIT {
        out.push_str(&format!(
            " ... and {} more items",
            entries.len() - LIST_LIMIT
        ));
    }
    out
}

fn format_search(query: &str, matches: &[String]) -> String {
    if matches.is_empty() {
        return format!("No files matching '{query}' were found.");
    }
    let shown: Vec<&str> = matches.iter().take(SEARCH_LIMIT).map(String::as_str).collect();
    let mut out = format!(
        "Found {} file(s) matching '{query}': {}",
        matches.len(),
        shown.join(", ")
    );
    if matches.len() > SEARCH_LIMIT {
        out.push_str(&format!(" ... and {} more", matches.len() - SEARCH_LIMIT));
    }
    out
}

/// Bundle the file tools over `station`.
pub fn bundle(station: Arc<dyn FileStation>) -> CapabilityBundle {
    let mut bundle = CapabilityBundle::new();

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new(
            "pc_create_file",
            "Create a new file on the user's workstation.",
        )
        .required_param("name", ParameterKind::String, "File name, e.g. 'notes.txt'")
        .optional_param(
            "content",
            ParameterKind::String,
            "Initial file content; empty when omitted",
        )
        .optional_param(
            "folder",
            ParameterKind::String,
            "Workspace-relative folder; workspace root when omitted",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let name = required_str(&args, "name")?;
                let content = optional_str(&args, "content").unwrap_or_default();
                let folder = optional_str(&args, "folder").unwrap_or_default();
                let path = st.create_file(&folder, &name, &content).await?;
                Ok(serde_json::json!({ "result": format!("Created file '{path}'.") }))
            }
        }),
    );

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("pc_read_file", "Read a file's content aloud.").required_param(
            "path",
            ParameterKind::String,
            "Workspace-relative file path",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let path = required_str(&args, "path")?;
                let content = st.read_file(&path).await?;
                Ok(serde_json::json!({ "result": format_read(&path, &content) }))
            }
        }),
    );

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new(
            "pc_write_file",
            "Overwrite or append to an existing file.",
        )
        .required_param("path", ParameterKind::String, "Workspace-relative file path")
        .required_param("content", ParameterKind::String, "Content to write")
        .optional_param(
            "append",
            ParameterKind::Boolean,
            "Append instead of overwriting; defaults to false",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let path = required_str(&args, "path")?;
                let content = required_str(&args, "content")?;
                let append = optional_bool(&args, "append").unwrap_or(false);
                let path = st.write_file(&path, &content, append).await?;
                let verb = if append { "Appended to" } else { "Updated" };
                Ok(serde_json::json!({ "result": format!("{verb} file '{path}'.") }))
            }
        }),
    );

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("pc_list_folder", "List a folder's contents.").optional_param(
            "path",
            ParameterKind::String,
            "Workspace-relative folder; workspace root when omitted",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let path = optional_str(&args, "path").unwrap_or_default();
                let entries = st.list_folder(&path).await?;
                let label = if path.is_empty() { "workspace" } else { &path };
                Ok(serde_json::json!({ "result": format_listing(label, &entries) }))
            }
        }),
    );

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new("pc_create_folder", "Create a new folder.").required_param(
            "path",
            ParameterKind::String,
            "Workspace-relative folder path",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let path = required_str(&args, "path")?;
                let path = st.create_folder(&path).await?;
                Ok(serde_json::json!({ "result": format!("Created folder '{path}'.") }))
            }
        }),
    );

    let st = Arc::clone(&station);
    bundle.push(
        ToolDefinition::new(
            "pc_search_files",
            "Find files by name on the user's workstation.",
        )
        .required_param(
            "query",
            ParameterKind::String,
            "Case-insensitive substring of the file name",
        )
        .optional_param(
            "folder",
            ParameterKind::String,
            "Workspace-relative folder to search from; whole workspace when omitted",
        ),
        handler_fn(move |args| {
            let st = Arc::clone(&st);
            async move {
                let query = required_str(&args, "query")?;
                let folder = optional_str(&args, "folder");
                let matches = st.search_files(&query, folder.as_deref()).await?;
                Ok(serde_json::json!({ "result": format_search(&query, &matches) }))
            }
        }),
    );

    bundle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> (tempfile::TempDir, HomeFileStation) {
        let dir = tempfile::tempdir().expect("tempdir");
        let station = HomeFileStation::new(dir.path());
        (dir, station)
    }

    #[tokio::test]
    async fn create_then_read_roundtrip() {
        let (_dir, station) = station();
        let path = station
            .create_file("notes", "todo.txt", "buy milk")
            .await
            .expect("create");
        assert_eq!(path, "notes/todo.txt");
        assert_eq!(station.read_file("notes/todo.txt").await.unwrap(), "buy milk");
    }

    #[tokio::test]
    async fn create_refuses_existing_file() {
        let (_dir, station) = station();
        station.create_file("", "a.txt", "one").await.expect("create");
        let err = station.create_file("", "a.txt", "two").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));
        assert_eq!(station.read_file("a.txt").await.unwrap(), "one");
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let (_dir, station) = station();
        let err = station.read_file("../outside.txt").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));

        let err = station.read_file("/etc/hostname").await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));

        let err = station
            .create_file("docs/../..", "x.txt", "")
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn write_requires_existing_file() {
        let (_dir, station) = station();
        let err = station.write_file("ghost.txt", "hi", false).await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));

        station.create_file("", "log.txt", "a").await.expect("create");
        station.write_file("log.txt", "b", true).await.expect("append");
        assert_eq!(station.read_file("log.txt").await.unwrap(), "ab");

        station.write_file("log.txt", "fresh", false).await.expect("overwrite");
        assert_eq!(station.read_file("log.txt").await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn list_and_search() {
        let (_dir, station) = station();
        station.create_folder("projects/demo").await.expect("mkdir");
        station
            .create_file("projects", "Plan.md", "")
            .await
            .expect("create");
        station
            .create_file("projects/demo", "plan_b.md", "")
            .await
            .expect("create");

        let entries = station.list_folder("projects").await.expect("list");
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Plan.md", "demo"]);
        assert!(entries[1].is_dir);

        let matches = station.search_files("plan", None).await.expect("search");
        assert_eq!(
            matches,
            vec!["projects/Plan.md".to_string(), "projects/demo/plan_b.md".to_string()]
        );
    }

    #[test]
    fn long_content_is_truncated_for_speech() {
        let content = "x".repeat(READ_LIMIT + 500);
        let spoken = format_read("big.txt", &content);
        assert!(spoken.ends_with("... (truncated, file is large)"));
        assert!(spoken.chars().count() < content.chars().count());
    }

    #[test]
    fn listing_is_capped_for_speech() {
        let entries: Vec<FolderEntry> = (0..LIST_LIMIT + 5)
            .map(|i| FolderEntry {
                name: format!("file{i:02}.txt"),
                is_dir: false,
            })
            .collect();
        let spoken = format_listing("stuff", &entries);
        assert!(spoken.contains("25 item(s)"));
        assert!(spoken.contains("and 5 more items"));
    }

    #[test]
    fn bundle_exposes_six_tools() {
        let (_dir, station) = station();
        let bundle = bundle(Arc::new(station));
        assert_eq!(
            bundle.tool_names(),
            vec![
                "pc_create_file",
                "pc_read_file",
                "pc_write_file",
                "pc_list_folder",
                "pc_create_folder",
                "pc_search_files",
            ]
        );
    }
}
