use crate::error::{Result, SchemaError};
use globset::{GlobSet, GlobSetBuilder};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Collects schema documents below a root directory.
///
/// Entries directly in the root are at depth 0. Include and exclude globs are
/// matched against the path relative to the root, so `vendor/**` works the
/// same wherever the tree lives.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// Lowercase, without the dot
    extensions: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    max_depth: Option<usize>,
    follow_symlinks: bool,
}

/// Counters gathered during one walk
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryStats {
    pub files_found: usize,
    pub directories: usize,
    pub skipped_symlinks: usize,
    /// Entries that could not be read; the walk continues past them
    pub errors: usize,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xsd".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    /// Deepest directory level to descend into (`None` = unlimited)
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Schema documents under `path`, sorted. A path naming a file is
    /// returned as is, whatever its extension.
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let (files, _) = self.walk(path).await?;
        Ok(files)
    }

    pub async fn get_discovery_stats(&self, root: &Path) -> Result<DiscoveryStats> {
        let (_, stats) = self.walk(root).await?;
        Ok(stats)
    }

    /// Extension and pattern filter for a path relative to the walk root
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        self.include_set
            .as_ref()
            .is_none_or(|include_set| include_set.is_match(path))
    }

    /// Breadth-first walk. Only a failure on `root` itself is an error.
    async fn walk(&self, root: &Path) -> Result<(Vec<PathBuf>, DiscoveryStats)> {
        let mut stats = DiscoveryStats::default();

        if fs::metadata(root).await?.is_file() {
            stats.files_found = 1;
            return Ok((vec![root.to_path_buf()], stats));
        }

        let mut files = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = VecDeque::from([(root.to_path_buf(), 0usize)]);

        while let Some((dir, depth)) = pending.pop_front() {
            // Symlinked directories may lead back up the tree
            if self.follow_symlinks {
                let canonical = fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
                if !visited.insert(canonical) {
                    continue;
                }
            }

            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == root => return Err(e.into()),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
                    stats.errors += 1;
                    continue;
                }
            };
            stats.directories += 1;

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %dir.display(), error = %e, "directory listing interrupted");
                        stats.errors += 1;
                        break;
                    }
                };
                let path = entry.path();

                let is_symlink = entry
                    .file_type()
                    .await
                    .map(|file_type| file_type.is_symlink())
                    .unwrap_or(false);
                if is_symlink && !self.follow_symlinks {
                    stats.skipped_symlinks += 1;
                    continue;
                }

                let metadata = match fs::metadata(&path).await {
                    Ok(metadata) => metadata,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                        stats.errors += 1;
                        continue;
                    }
                };

                if metadata.is_dir() {
                    if self.max_depth.is_none_or(|max| depth < max) {
                        pending.push_back((path, depth + 1));
                    }
                } else if metadata.is_file() {
                    let relative = path.strip_prefix(root).unwrap_or(&path);
                    if self.should_process(relative) {
                        files.push(path);
                    }
                }
            }
        }

        files.sort();
        stats.files_found = files.len();
        debug!(root = %root.display(), ?stats, "discovery finished");
        Ok((files, stats))
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String], role: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                SchemaError::Config(format!("Invalid glob pattern '{}': {}", pattern, e))
            })?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| SchemaError::Config(format!("Failed to build {} glob set: {}", role, e)))?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;
    use tokio::fs;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#;

    async fn create_test_directory() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("common")).await.unwrap();
        fs::create_dir_all(root.join("vendor/legacy")).await.unwrap();

        fs::write(root.join("main.xsd"), SCHEMA).await.unwrap();
        fs::write(root.join("types.xsd"), SCHEMA).await.unwrap();
        fs::write(root.join("notes.txt"), "text file").await.unwrap();
        fs::write(root.join("common/base.xsd"), SCHEMA).await.unwrap();
        fs::write(root.join("vendor/legacy/old.xsd"), SCHEMA).await.unwrap();
        fs::write(root.join("vendor/legacy/instance.xml"), "<a/>").await.unwrap();

        temp_dir
    }

    fn names(files: &[PathBuf]) -> HashSet<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_discover_schema_files() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(files.len(), 4);
        let found = names(&files);
        assert!(found.contains("main.xsd"));
        assert!(found.contains("base.xsd"));
        assert!(found.contains("old.xsd"));
        assert!(!found.contains("instance.xml"));
    }

    #[tokio::test]
    async fn test_results_are_sorted() {
        let temp_dir = create_test_directory().await;
        let files = FileDiscovery::new()
            .discover_files(temp_dir.path())
            .await
            .unwrap();

        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[tokio::test]
    async fn test_multiple_extensions() {
        let temp_dir = create_test_directory().await;
        let discovery =
            FileDiscovery::new().with_extensions(vec!["xsd".to_string(), ".XML".to_string()]);

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 5);
    }

    #[tokio::test]
    async fn test_max_depth_limit() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new().with_max_depth(Some(1));

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        let found = names(&files);

        assert_eq!(files.len(), 3);
        assert!(found.contains("base.xsd"));
        assert!(!found.contains("old.xsd"));
    }

    #[tokio::test]
    async fn test_exclude_patterns() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new()
            .with_exclude_patterns(vec!["**/vendor/**".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(files.len(), 3);
        assert!(!names(&files).contains("old.xsd"));
    }

    #[tokio::test]
    async fn test_include_patterns() {
        let temp_dir = create_test_directory().await;
        let discovery = FileDiscovery::new()
            .with_include_patterns(vec!["common/*".to_string()])
            .unwrap();

        let files = discovery.discover_files(temp_dir.path()).await.unwrap();
        assert_eq!(names(&files), HashSet::from(["base.xsd".to_string()]));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let result = FileDiscovery::new().with_include_patterns(vec!["a[".to_string()]);
        assert!(matches!(result, Err(SchemaError::Config(_))));
    }

    #[tokio::test]
    async fn test_explicit_file_is_taken() {
        let temp_dir = create_test_directory().await;
        let path = temp_dir.path().join("notes.txt");
        let files = FileDiscovery::new().discover_files(&path).await.unwrap();
        assert_eq!(files, vec![path]);
    }

    #[tokio::test]
    async fn test_should_process() {
        let discovery = FileDiscovery::new();

        assert!(discovery.should_process(Path::new("schema.xsd")));
        assert!(discovery.should_process(Path::new("SCHEMA.XSD")));
        assert!(!discovery.should_process(Path::new("doc.xml")));
        assert!(!discovery.should_process(Path::new("schema")));
    }

    #[tokio::test]
    async fn test_discovery_stats() {
        let temp_dir = create_test_directory().await;
        let stats = FileDiscovery::new()
            .get_discovery_stats(temp_dir.path())
            .await
            .unwrap();

        assert_eq!(stats.files_found, 4);
        assert_eq!(stats.directories, 4);
        assert_eq!(stats.errors, 0);
    }

    #[test]
    fn test_patterns_match_relative_path() {
        let discovery = FileDiscovery::new()
            .with_exclude_patterns(vec!["vendor/**".to_string()])
            .unwrap();

        assert!(!discovery.should_process(Path::new("vendor/legacy/old.xsd")));
        assert!(discovery.should_process(Path::new("common/vendor.xsd")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_skipped_unless_followed() {
        let temp_dir = create_test_directory().await;
        let root = temp_dir.path();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("shared.xsd"), SCHEMA).await.unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linked")).unwrap();
        // A link back to the root must not loop
        std::os::unix::fs::symlink(root, root.join("common/up")).unwrap();

        let stats = FileDiscovery::new().get_discovery_stats(root).await.unwrap();
        assert_eq!(stats.files_found, 4);
        assert_eq!(stats.skipped_symlinks, 2);

        let followed = FileDiscovery::new()
            .with_follow_symlinks(true)
            .discover_files(root)
            .await
            .unwrap();
        assert_eq!(followed.len(), 5);
        assert!(followed.contains(&root.join("linked/shared.xsd")));
    }

    #[tokio::test]
    async fn test_nonexistent_directory() {
        let result = FileDiscovery::new()
            .discover_files(Path::new("/nonexistent/path"))
            .await;

        match result {
            Err(SchemaError::Io(_)) => {}
            other => panic!("Expected IO error, got {:?}", other),
        }
    }
}
