pub mod gradle;
pub mod maven;
pub mod no_build_tool;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;

use crate::build_tools::{gradle::GradleHandler, maven::MavenHandler, no_build_tool::NoBuildTool};

#[derive(Debug, Clone, PartialEq)]
pub enum BuildTool {
    Gradle,
    Maven,
    Composite,
    None,
}

pub fn get_build_tool(root: &Path) -> Arc<dyn BuildToolHandler> {
    let handler: Box<dyn BuildToolHandler> = if GradleHandler.is_project(root) {
        Box::new(GradleHandler)
    } else if MavenHandler.is_project(root) {
        Box::new(MavenHandler)
    } else {
        Box::new(NoBuildTool)
    };
    Arc::new(CachedResolver::new(handler))
}

impl BuildToolHandler for Box<dyn BuildToolHandler> {
    fn is_project(&self, root: &Path) -> bool {
        (**self).is_project(root)
    }

    fn get_dependency_paths(&self, root: &Path) -> Result<Vec<(Option<PathBuf>, Option<PathBuf>)>> {
        (**self).get_dependency_paths(root)
    }

    fn get_jdk_dependency_path(&self, root: &Path) -> Result<Option<PathBuf>> {
        (**self).get_jdk_dependency_path(root)
    }

    fn get_source_directories(&self, root: &Path) -> Vec<PathBuf> {
        (**self).get_source_directories(root)
    }

    fn get_build_system(&self) -> BuildTool {
        (**self).get_build_system()
    }
}

pub trait BuildToolHandler: Send + Sync {
    fn is_project(&self, root: &Path) -> bool;

    /// Returns (bytecode_jar, optional_sources_jar) pairs for the project's
    /// resolved dependencies. Implementations that shell out enforce their
    /// own timeout and return an empty result rather than hang the indexer.
    fn get_dependency_paths(&self, root: &Path) -> Result<Vec<(Option<PathBuf>, Option<PathBuf>)>>;

    fn get_jdk_dependency_path(&self, root: &Path) -> Result<Option<PathBuf>>;

    /// The well-known Groovy/Java main + test source roots that exist on
    /// disk under `root`, for the ones this build system conventionally
    /// lays out.
    fn get_source_directories(&self, root: &Path) -> Vec<PathBuf> {
        [
            "src/main/groovy",
            "src/main/java",
            "src/test/groovy",
            "src/test/java",
        ]
        .iter()
        .map(|rel| root.join(rel))
        .filter(|p| p.is_dir())
        .collect()
    }

    fn get_build_system(&self) -> BuildTool;
}

/// Decorates any [`BuildToolHandler`] with a per-project-root memoization of
/// `get_dependency_paths`/`get_source_directories`, invalidated whenever a
/// build descriptor under that root is observed to change (see the
/// workspace file watcher).
pub struct CachedResolver<H: BuildToolHandler> {
    inner: H,
    cache: std::sync::Mutex<
        std::collections::HashMap<PathBuf, (Vec<(Option<PathBuf>, Option<PathBuf>)>, Vec<PathBuf>)>,
    >,
}

impl<H: BuildToolHandler> CachedResolver<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            cache: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Drops any memoized result for `root`, forcing the next resolution to
    /// hit the underlying handler again.
    pub fn invalidate(&self, root: &Path) {
        self.cache.lock().unwrap().remove(root);
    }
}

impl<H: BuildToolHandler> BuildToolHandler for CachedResolver<H> {
    fn is_project(&self, root: &Path) -> bool {
        self.inner.is_project(root)
    }

    fn get_dependency_paths(&self, root: &Path) -> Result<Vec<(Option<PathBuf>, Option<PathBuf>)>> {
        if let Some((deps, _)) = self.cache.lock().unwrap().get(root) {
            return Ok(deps.clone());
        }
        let deps = self.inner.get_dependency_paths(root)?;
        let dirs = self.inner.get_source_directories(root);
        self.cache
            .lock()
            .unwrap()
            .insert(root.to_path_buf(), (deps.clone(), dirs));
        Ok(deps)
    }

    fn get_jdk_dependency_path(&self, root: &Path) -> Result<Option<PathBuf>> {
        self.inner.get_jdk_dependency_path(root)
    }

    fn get_source_directories(&self, root: &Path) -> Vec<PathBuf> {
        if let Some((_, dirs)) = self.cache.lock().unwrap().get(root) {
            return dirs.clone();
        }
        self.inner.get_source_directories(root)
    }

    fn get_build_system(&self) -> BuildTool {
        self.inner.get_build_system()
    }
}

/// Runs `f` on a dedicated thread and gives up after `timeout`, returning
/// `Ok(None)` rather than blocking the caller forever. Used to bound
/// subprocess-backed resolution (Gradle probes).
pub(crate) fn run_with_timeout<T, F>(timeout: std::time::Duration, f: F) -> Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map(Some),
        Err(std::sync::mpsc::RecvTimeoutError::Timeout) => Ok(None),
        Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => Ok(None),
    }
}
