use std::sync::Arc;

use tempfile::TempDir;
use tower_lsp::lsp_types::{InitializeParams, InitializedParams, Url};
use tower_lsp::{ClientSocket, LanguageServer, LspService};
use uuid::Uuid;

use groovy_lsp_server::{SymbolIndex, server::Backend};

/// An in-process LSP server rooted at a throwaway directory, used to drive
/// the real `LanguageServer` handlers against fixture source files without
/// a subprocess or a committed fixtures tree.
pub struct TestServer {
    service: LspService<Backend>,
    root: TempDir,
    _socket: ClientSocket,
}

impl TestServer {
    pub async fn new(files: &[(&str, &str)]) -> Self {
        let root = TempDir::new().expect("cannot create temp dir");
        for (rel_path, content) in files {
            let full_path = root.path().join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).expect("cannot create fixture dirs");
            }
            std::fs::write(&full_path, content).expect("cannot write fixture file");
        }

        let db_name = Uuid::new_v4();
        let db_dir = format!("file:{}?mode=memory&cache=shared", db_name);
        let index = Arc::new(SymbolIndex::initialize(&db_dir).await.unwrap());
        let (service, socket) = LspService::new(|client| Backend::new(client, index.clone()));

        let mut init_params = InitializeParams::default();
        init_params.root_uri =
            Some(Url::from_file_path(root.path()).expect("cannot parse root URI"));
        service.inner().initialize(init_params).await.unwrap();
        service.inner().initialized(InitializedParams {}).await;

        Self {
            service,
            root,
            _socket: socket,
        }
    }

    pub fn backend(&self) -> &Backend {
        self.service.inner()
    }

    pub fn uri(&self, rel_path: &str) -> Url {
        Url::from_file_path(self.root.path().join(rel_path)).expect("cannot parse file URI")
    }
}

pub async fn get_test_server(files: &[(&str, &str)]) -> TestServer {
    TestServer::new(files).await
}
