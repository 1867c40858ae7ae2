use std::time::Duration;

use tokio::sync::broadcast;
use tower_lsp::lsp_types::Url;

/// A source file finished (re-)indexing into the symbol store.
#[derive(Debug, Clone)]
pub struct FileIndexedEvent {
    pub uri: Url,
    pub symbol_count: usize,
}

/// A full workspace scan completed.
#[derive(Debug, Clone)]
pub struct WorkspaceIndexedEvent {
    pub file_count: usize,
}

/// An open document's content changed.
#[derive(Debug, Clone)]
pub struct DocumentChangedEvent {
    pub uri: Url,
    pub version: i32,
}

const CHANNEL_CAPACITY: usize = 256;

/// Default deadline a single subscriber handler is given to process an
/// event before the publisher stops waiting on it.
pub const DEFAULT_HANDLER_DEADLINE: Duration = Duration::from_secs(5);

/// Typed pub/sub hub wiring together the indexer, document store and query
/// layer without giving any of them a direct reference to one another.
pub struct EventBus {
    file_indexed: broadcast::Sender<FileIndexedEvent>,
    workspace_indexed: broadcast::Sender<WorkspaceIndexedEvent>,
    document_changed: broadcast::Sender<DocumentChangedEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            file_indexed: broadcast::channel(CHANNEL_CAPACITY).0,
            workspace_indexed: broadcast::channel(CHANNEL_CAPACITY).0,
            document_changed: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn publish_file_indexed(&self, event: FileIndexedEvent) {
        // No subscribers is not an error: indexing can run before anyone subscribes.
        let _ = self.file_indexed.send(event);
    }

    pub fn publish_workspace_indexed(&self, event: WorkspaceIndexedEvent) {
        let _ = self.workspace_indexed.send(event);
    }

    pub fn publish_document_changed(&self, event: DocumentChangedEvent) {
        let _ = self.document_changed.send(event);
    }

    pub fn subscribe_file_indexed(&self) -> broadcast::Receiver<FileIndexedEvent> {
        self.file_indexed.subscribe()
    }

    pub fn subscribe_workspace_indexed(&self) -> broadcast::Receiver<WorkspaceIndexedEvent> {
        self.workspace_indexed.subscribe()
    }

    pub fn subscribe_document_changed(&self) -> broadcast::Receiver<DocumentChangedEvent> {
        self.document_changed.subscribe()
    }
}

/// Awaits `handler` but never longer than `deadline`; a handler that blows
/// past its deadline is logged and dropped rather than allowed to wedge the
/// publisher.
pub async fn run_with_deadline<F>(deadline: Duration, handler: F)
where
    F: std::future::Future<Output = ()>,
{
    if tokio::time::timeout(deadline, handler).await.is_err() {
        tracing::warn!("event handler exceeded {:?} deadline", deadline);
    }
}
