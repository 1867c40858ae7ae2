use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use lsp_core::{lsp_error, lsp_info, lsp_warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, RwLock};

use crate::Indexer;

/// Window over which successive filesystem events for the same paths are
/// coalesced before triggering a re-index, so a multi-file `git checkout`
/// doesn't thrash the indexer once per touched file.
const DEBOUNCE: Duration = Duration::from_millis(200);

const EXCLUDED_DIRS: &[&str] = &["build", "target", ".gradle", ".git", "out", "bin"];

/// Watches a workspace root for changes that didn't come through the LSP's
/// own `didOpen`/`didChange`/`didSave` notifications -- files touched by an
/// external tool, a VCS checkout, or a build step. Holds the underlying
/// `notify` watcher alive for as long as this struct lives; dropping it
/// stops the watch.
pub struct WorkspaceWatcher {
    _inner: RecommendedWatcher,
}

impl WorkspaceWatcher {
    pub fn spawn(
        root: PathBuf,
        indexer: Arc<RwLock<Option<Indexer>>>,
        extensions: HashSet<String>,
    ) -> notify::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        tokio::spawn(async move {
            let mut pending: HashSet<PathBuf> = HashSet::new();

            while let Some(first) = rx.recv().await {
                absorb(first, &extensions, &mut pending);

                // Keep draining whatever else is already queued or arrives
                // within the debounce window before acting.
                loop {
                    match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                        Ok(Some(event)) => absorb(event, &extensions, &mut pending),
                        Ok(None) => return,
                        Err(_elapsed) => break,
                    }
                }

                if pending.is_empty() {
                    continue;
                }

                let paths: Vec<PathBuf> = pending.drain().collect();
                let guard = indexer.read().await;
                let Some(indexer) = guard.as_ref() else {
                    continue;
                };
                for path in paths {
                    if is_build_descriptor(&path) {
                        lsp_info!(
                            "{} changed; re-open the workspace to re-resolve dependencies",
                            path.display()
                        );
                        continue;
                    }
                    if path.is_file() {
                        if let Err(e) = indexer.index_file_path(&path).await {
                            lsp_error!("failed to reindex {}: {e}", path.display());
                        }
                    } else if !path.exists() {
                        if let Err(e) = indexer.remove_file_path(&path).await {
                            lsp_error!("failed to drop index for {}: {e}", path.display());
                        }
                    }
                }
            }
        });

        Ok(Self { _inner: watcher })
    }
}

fn absorb(
    event: notify::Result<Event>,
    extensions: &HashSet<String>,
    pending: &mut HashSet<PathBuf>,
) {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            lsp_warn!("workspace watch error: {e}");
            return;
        }
    };

    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return;
    }

    for path in event.paths {
        if path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .map(|s| EXCLUDED_DIRS.contains(&s))
                .unwrap_or(false)
        }) {
            continue;
        }

        let is_source = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.contains(ext))
            .unwrap_or(false);
        if is_source {
            pending.insert(path);
            continue;
        }

        if is_build_descriptor(&path) {
            pending.insert(path);
        }
    }
}

fn is_build_descriptor(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(
            "build.gradle"
                | "build.gradle.kts"
                | "settings.gradle"
                | "settings.gradle.kts"
                | "pom.xml"
        )
    )
}
