use std::{path::PathBuf, time::Duration};

/// Ambient settings carried across the whole server; intentionally free of
/// anything workspace-specific so it can be built once in `main` before a
/// root is even known.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub cache_dir: PathBuf,
    pub event_handler_deadline: Duration,
    pub gradle_probe_timeout: Duration,
    pub jar_max_entries: usize,
    pub jar_max_entry_bytes: u64,
    pub jar_index_timeout: Duration,
    pub watch_debounce: Duration,
    pub worker_pool_size: usize,
    pub case_sensitive_search: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            event_handler_deadline: Duration::from_secs(5),
            gradle_probe_timeout: Duration::from_secs(5),
            jar_max_entries: 100_000,
            jar_max_entry_bytes: 50 * 1024 * 1024,
            jar_index_timeout: Duration::from_secs(30 * 60),
            watch_debounce: Duration::from_millis(200),
            worker_pool_size: num_cpus::get().min(8).max(1),
            case_sensitive_search: true,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("groovy-lsp"))
        .unwrap_or_else(|| PathBuf::from(".groovy-lsp-cache"))
}
