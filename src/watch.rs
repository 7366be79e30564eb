//! Polling file watcher for the `--watch` mode

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use tracing::{debug, trace};
use walkdir::WalkDir;

/// Default delay between two polls
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Watches every file below a directory by comparing modification times
#[derive(Debug)]
pub struct Watcher {
    root: PathBuf,
    interval: Duration,
    ignored: Vec<PathBuf>,
    snapshot: Snapshot,
}

impl Watcher {
    /// Start watching `root`, taking an initial snapshot
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = absolute(&root.into());
        let mut watcher = Self {
            root,
            interval: DEFAULT_INTERVAL,
            ignored: Vec::new(),
            snapshot: Snapshot::new(),
        };
        watcher.snapshot = watcher.scan();
        watcher
    }

    /// Set the delay between polls
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Never report changes to `path` (e.g. the compiler's own output)
    pub fn ignore(mut self, path: &Path) -> Self {
        self.ignored.push(absolute(path));
        self.snapshot = self.scan();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check once for changes since the last snapshot
    ///
    /// Returns the added, modified and removed files, or `None` if nothing
    /// changed.
    pub fn poll(&mut self) -> Option<Vec<PathBuf>> {
        let current = self.scan();
        if current == self.snapshot {
            return None;
        }

        let mut changed: Vec<PathBuf> = current
            .iter()
            .filter(|(path, mtime)| self.snapshot.get(*path) != Some(*mtime))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(
            self.snapshot
                .keys()
                .filter(|path| !current.contains_key(*path))
                .cloned(),
        );
        self.snapshot = current;
        Some(changed)
    }

    /// Block until something changes
    pub fn wait_for_change(&mut self) -> Vec<PathBuf> {
        loop {
            thread::sleep(self.interval);
            if let Some(changed) = self.poll() {
                debug!(count = changed.len(), "Detected file changes");
                return changed;
            }
        }
    }

    fn scan(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let Ok(entry) = entry else {
                continue;
            };
            if !entry.file_type().is_file() || self.ignored.iter().any(|p| p == entry.path()) {
                continue;
            }
            match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                Some(mtime) => {
                    snapshot.insert(entry.path().to_path_buf(), mtime);
                }
                None => trace!(path = %entry.path().display(), "No modification time"),
            }
        }
        snapshot
    }
}

/// Canonical form of a path that may not exist yet
fn absolute(path: &Path) -> PathBuf {
    if let Ok(path) = fs::canonicalize(path) {
        return path;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            fs::canonicalize(parent)
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
