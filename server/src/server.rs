use dashmap::DashMap;
use groovy::GroovySupport;
use lsp_core::{
    build_tools::get_build_tool,
    document::Document,
    event_bus::{self, EventBus},
    language_support::LanguageSupport,
    lsp_error, lsp_info, lsp_logging, lsp_progress, lsp_progress_begin, lsp_progress_end,
    lsp_warn,
    util::capitalize,
};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Instant,
};
use tokio::sync::RwLock;
use tower_lsp::lsp_types::*;
use tower_lsp::{LanguageServer, lsp_types::request::GotoImplementationParams};
use tower_lsp::{jsonrpc::Result, lsp_types::request::GotoImplementationResponse};
use tracing::debug;
use tree_sitter::Tree;

use crate::{
    CompileCache, CompiledUnit, Indexer, SymbolIndex,
    enums::ResolvedSymbol,
    lsp_convert::{AsLspHover, AsLspLocation},
    models::symbol::Symbol,
};

const SEARCH_LIMIT: i64 = 200;

pub struct Backend {
    pub client: tower_lsp::Client,
    indexer: Arc<RwLock<Option<Indexer>>>,
    index: Arc<SymbolIndex>,
    events: Arc<EventBus>,
    workspace_root: Arc<RwLock<Option<PathBuf>>>,
    languages: std::collections::HashMap<String, Arc<dyn LanguageSupport>>,
    documents: DashMap<Url, Document>,
    watcher: Arc<RwLock<Option<crate::WorkspaceWatcher>>>,
    compile_cache: Arc<CompileCache>,
}

impl Backend {
    pub fn new(client: tower_lsp::Client, index: Arc<SymbolIndex>) -> Self {
        lsp_logging::init_logging_service(client.clone());

        let mut languages: std::collections::HashMap<String, Arc<dyn LanguageSupport>> =
            std::collections::HashMap::new();
        languages.insert("groovy".to_string(), Arc::new(GroovySupport::new()));

        let events = Arc::new(EventBus::new());
        spawn_event_logger(Arc::clone(&events));

        Self {
            client,
            indexer: Arc::new(RwLock::new(None)),
            index,
            events,
            workspace_root: Arc::new(RwLock::new(None)),
            languages,
            documents: DashMap::new(),
            watcher: Arc::new(RwLock::new(None)),
            compile_cache: Arc::new(CompileCache::new()),
        }
    }

    #[tracing::instrument(skip_all)]
    async fn resolve_fqn(
        &self,
        name: &str,
        imports: Vec<String>,
        package_name: Option<String>,
    ) -> Option<String> {
        if name.contains('.') {
            return Some(name.to_string());
        }

        // Direct import match
        if let Some(import) = imports.iter().find(|i| i.split('.').last() == Some(name)) {
            return Some(import.clone());
        }

        // Wildcard import match
        for import in imports.iter().filter(|i| i.ends_with(".*")) {
            let tmp_fqn = import.replace("*", name);
            if let Some(_) = self.index.find_symbol_by_fqn(&tmp_fqn).await.ok()? {
                return Some(tmp_fqn);
            }
            if let Ok(Some(_)) = self.index.find_external_symbol_by_fqn(&tmp_fqn).await {
                return Some(tmp_fqn);
            }
        }

        // Package + name fallback
        let fallback_fqn = package_name
            .map(|pkg| {
                if !name.contains(&pkg) {
                    format!("{}.{}", pkg, name)
                } else {
                    name.to_string()
                }
            })
            .unwrap_or_else(|| name.to_string());

        if let Ok(Some(_)) = self.index.find_external_symbol_by_fqn(&fallback_fqn).await {
            return Some(fallback_fqn);
        }

        Some(fallback_fqn)
    }

    #[tracing::instrument(skip_all)]
    async fn try_type_member(
        &self,
        qualifier: &str,
        member: &str,
        imports: &[String],
        package_name: Option<String>,
    ) -> Vec<ResolvedSymbol> {
        let class_fqn = match self
            .resolve_fqn(qualifier, imports.to_vec(), package_name.clone())
            .await
        {
            Some(fqn) => fqn,
            None => return vec![],
        };

        let mut visited = HashSet::new();
        self.try_members_with_inheritance(
            &class_fqn,
            member,
            &mut visited,
            imports.to_vec(),
            package_name,
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn try_property_access(&self, class_fqn: &str, ident: &str) -> Option<Symbol> {
        // Try getter
        let getter_fqn = format!("{}#get{}", class_fqn, capitalize(ident));
        if let Ok(Some(found)) = self.index.find_symbol_by_fqn(&getter_fqn).await {
            return Some(found);
        }

        // Try boolean getter (isX for boolean properties)
        let is_getter_fqn = format!("{}#is{}", class_fqn, capitalize(ident));
        self.index
            .find_symbol_by_fqn(&is_getter_fqn)
            .await
            .ok()
            .flatten()
    }

    async fn try_parent_member(
        &self,
        type_fqn: &str,
        member: &str,
        visited: &mut HashSet<String>,
        imports: Vec<String>,
        package_name: Option<String>,
    ) -> Vec<ResolvedSymbol> {
        let type_symbol = match self.index.find_symbol_by_fqn(type_fqn).await {
            Ok(symbol) => symbol,
            Err(_) => None,
        };

        let type_symbol = match type_symbol {
            Some(s) => s,
            None => return vec![],
        };

        let supers = match self
            .index
            .find_supers_by_symbol_fqn(&type_symbol.fully_qualified_name)
            .await
        {
            Ok(symbols) => symbols,
            Err(_) => return vec![],
        };

        for super_name in supers.iter().map(|symbol| &symbol.fully_qualified_name) {
            let results = self
                .recurse_try_members_with_inheritance(
                    super_name,
                    member,
                    visited,
                    imports.clone(),
                    package_name.clone(),
                )
                .await;
            if !results.is_empty() {
                return results;
            }
        }

        vec![]
    }

    #[tracing::instrument(skip(self))]
    async fn try_members_with_inheritance(
        &self,
        type_fqn: &str,
        member: &str,
        visited: &mut HashSet<String>,
        imports: Vec<String>,
        package_name: Option<String>,
    ) -> Vec<ResolvedSymbol> {
        if !visited.insert(type_fqn.to_string()) {
            return vec![];
        }

        // Try direct member
        let member_fqn = format!("{}#{}", type_fqn, member);
        if let Ok(found) = self.index.find_symbols_by_fqn(&member_fqn).await {
            if !found.is_empty() {
                return found.into_iter().map(ResolvedSymbol::Project).collect();
            }
        }

        if let Some(found) = self.try_property_access(type_fqn, member).await {
            return vec![ResolvedSymbol::Project(found)];
        }

        let result = self
            .try_parent_member(type_fqn, member, visited, imports, package_name)
            .await;
        if !result.is_empty() {
            return result;
        }

        if let Ok(Some(found)) = self.index.find_external_symbol_by_fqn(&member_fqn).await {
            return vec![ResolvedSymbol::External(found)];
        }

        vec![]
    }

    #[tracing::instrument(skip(self))]
    async fn recurse_try_members_with_inheritance(
        &self,
        parent_short_name: &str,
        member: &str,
        visited: &mut HashSet<String>,
        imports: Vec<String>,
        package_name: Option<String>,
    ) -> Vec<ResolvedSymbol> {
        let fqn = match self
            .resolve_fqn(parent_short_name, imports.clone(), package_name.clone())
            .await
        {
            Some(fqn) => fqn,
            None => return vec![],
        };

        let parent_symbol = match self.index.find_symbols_by_fqn(&fqn).await {
            Ok(symbols) => symbols.into_iter().next(),
            Err(_) => return vec![],
        };

        match parent_symbol {
            Some(parent) => {
                Box::pin(self.try_members_with_inheritance(
                    &parent.fully_qualified_name,
                    member,
                    visited,
                    imports,
                    package_name,
                ))
                .await
            }
            None => vec![],
        }
    }

    fn resolved_symbols_to_impl_response(
        &self,
        implementations: Vec<ResolvedSymbol>,
    ) -> Option<GotoImplementationResponse> {
        let locations: Vec<Location> = implementations
            .into_iter()
            .filter_map(|sym| sym.as_lsp_location())
            .collect();

        match locations.len() {
            0 => None,
            1 => Some(GotoImplementationResponse::Scalar(
                locations.into_iter().next().unwrap(),
            )),
            _ => Some(GotoImplementationResponse::Array(locations)),
        }
    }

    #[tracing::instrument(skip_all)]
    async fn resolve_type_member_chain(
        &self,
        qualifier: &str,
        member: &str,
        lang: &Arc<dyn LanguageSupport>,
        tree: &Tree,
        content: &str,
        imports: Vec<String>,
        position: &Position,
        package_name: Option<String>,
    ) -> Vec<ResolvedSymbol> {
        let parts: Vec<&str> = qualifier.split('#').collect();
        if parts.is_empty() {
            return vec![];
        }
        let base_type =
            if let Some(var_type) = lang.find_variable_type(tree, content, parts[0], position) {
                var_type
            } else {
                parts[0].to_string()
            };
        let mut current_type_fqn = match self
            .resolve_fqn(&base_type, imports.clone(), package_name.clone())
            .await
        {
            Some(fqn) => fqn,
            None => return vec![],
        };
        if parts.len() > 1 {
            for part in &parts[1..] {
                let symbols = self
                    .try_type_member(&current_type_fqn, part, &imports, None)
                    .await;
                let resolved = match symbols.into_iter().next() {
                    Some(s) => s,
                    None => return vec![],
                };

                current_type_fqn = if let Some(return_type) =
                    resolved.metadata().and_then(|m| m.return_type.as_ref())
                {
                    // For methods/fields, resolve their return/field type
                    let parent_package = resolved.package_name().unwrap_or_default().to_string();
                    match self
                        .resolve_fqn(return_type, imports.clone(), Some(parent_package))
                        .await
                    {
                        Some(fqn) => fqn,
                        None => return vec![],
                    }
                } else {
                    // For types (Class/Interface/Enum), use their FQN directly
                    resolved.package_name().unwrap_or_default().to_string()
                };
            }
        }
        // Returns all overloads
        self.try_type_member(&current_type_fqn, member, &imports, None)
            .await
    }

    async fn select_best_overload(
        &self,
        symbols: Vec<ResolvedSymbol>,
        call_args: Vec<(String, Position)>,
        lang: &Arc<dyn LanguageSupport>,
        tree: &Tree,
        content: &str,
        imports: &[String],
        package_name: Option<String>,
    ) -> Option<ResolvedSymbol> {
        let arg_count = call_args.len();

        let arity_matches: Vec<ResolvedSymbol> = symbols
            .into_iter()
            .filter(|s| {
                s.metadata()
                    .and_then(|m| m.parameters.as_ref())
                    .map_or(false, |params| params.len() == arg_count)
            })
            .collect();

        if arity_matches.len() == 1 {
            return arity_matches.into_iter().next();
        }

        if arity_matches.is_empty() {
            return None;
        }

        let mut arg_fqns = Vec::new();
        for (arg, position) in &call_args {
            let arg_type =
                if let Some(literal_type) = lang.get_literal_type(tree, content, &position) {
                    literal_type
                } else {
                    lang.find_variable_type(tree, content, arg, &position)
                        .unwrap_or_else(|| arg.clone())
                };

            let arg_fqn = self
                .resolve_fqn(&arg_type, imports.to_vec(), package_name.clone())
                .await
                .unwrap_or(arg_type);

            arg_fqns.push(arg_fqn);
        }

        for resolved in arity_matches {
            let params = &resolved.metadata().and_then(|m| m.parameters.as_ref());
            let pkg_name = resolved.package_name().unwrap_or_default();

            if let Some(params) = params {
                let mut all_match = true;
                for (i, param) in params.iter().enumerate() {
                    if let Some(param_type) = &param.type_name {
                        let mut param_type = param_type.to_string();
                        if let Some(top_generic_type) = param_type.split_once('<') {
                            param_type = top_generic_type.0.to_string();
                        }

                        let param_fqn = self
                            .resolve_fqn(
                                &param_type,
                                imports.to_vec(),
                                Some(pkg_name.to_string()),
                            )
                            .await
                            .unwrap_or(param_type.to_string());

                        if param_fqn != arg_fqns[i] {
                            all_match = false;
                            break;
                        }
                    } else {
                        all_match = false;
                        break;
                    }
                }
                if all_match {
                    return Some(resolved);
                }
            }
        }

        None
    }

    /**
     For cases where matching exact parameter types is impractical/overkill.
    */
    fn filter_by_arity(
        &self,
        symbols: Vec<ResolvedSymbol>,
        expected_param_count: usize,
    ) -> Vec<ResolvedSymbol> {
        symbols
            .into_iter()
            .filter(|s| match s {
                ResolvedSymbol::Project(symbol) => symbol
                    .metadata
                    .parameters
                    .as_ref()
                    .map_or(false, |params| params.len() == expected_param_count),
                ResolvedSymbol::External(external) => external
                    .metadata
                    .parameters
                    .as_ref()
                    .map_or(false, |params| params.len() == expected_param_count),
                ResolvedSymbol::Local { .. } => false,
            })
            .collect()
    }

    async fn resolve_symbol_at_position(
        &self,
        params: &TextDocumentPositionParams,
    ) -> Result<Vec<ResolvedSymbol>> {
        let path = PathBuf::from_str(params.text_document.uri.path()).unwrap();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| tower_lsp::jsonrpc::Error::invalid_params("No file extension"))?;

        let lang = self.languages.get(ext).ok_or_else(|| {
            tower_lsp::jsonrpc::Error::invalid_params("Failed to get language support")
        })?;

        let (tree, content) = self.parse_document(&path, lang).ok_or_else(|| {
            tower_lsp::jsonrpc::Error::invalid_params("Failed to parse file")
        })?;

        let imports = lang.get_imports(&tree, &content);
        let package_name = lang.get_package_name(&tree, &content);
        let position = params.position;

        if let Some(type_name) = lang.get_type_at_position(tree.root_node(), &content, &position) {
            let fqn = self
                .resolve_fqn(&type_name, imports, package_name)
                .await
                .ok_or_else(|| {
                    tower_lsp::jsonrpc::Error::invalid_params("Failed to find FQN by location")
                })?;

            return self.fqn_to_symbols(fqn).await;
        }

        if let Some((ident, qualifier)) = lang.find_ident_at_position(&tree, &content, &position) {
            match qualifier {
                Some(q) => {
                    let symbols = self
                        .resolve_type_member_chain(
                            &q,
                            &ident,
                            &lang,
                            &tree,
                            &content,
                            imports.clone(),
                            &position,
                            package_name.clone(),
                        )
                        .await;

                    if symbols.is_empty() {
                        return Err(tower_lsp::jsonrpc::Error::invalid_params(format!(
                            "Qualifier {q} found but failed to resolve"
                        )));
                    }

                    if symbols.len() == 1 {
                        return Ok(symbols);
                    }

                    if let Some(args) = lang.extract_call_arguments(&tree, &content, &position) {
                        if let Some(symbol) = self
                            .select_best_overload(
                                symbols.clone(),
                                args,
                                lang,
                                &tree,
                                &content,
                                &imports,
                                package_name,
                            )
                            .await
                        {
                            return Ok(vec![symbol]);
                        }
                    }

                    Ok(symbols)
                }
                None => {
                    if let Some((var_type, var_pos)) =
                        lang.find_variable_declaration(&tree, &content, &ident, &position)
                    {
                        return Ok(vec![ResolvedSymbol::Local {
                            name: ident.clone(),
                            var_type,
                            uri: params.text_document.uri.clone(),
                            position: var_pos,
                        }]);
                    }

                    let fqn = self
                        .resolve_fqn(&ident, imports, package_name)
                        .await
                        .ok_or_else(|| {
                            tower_lsp::jsonrpc::Error::invalid_params(
                                "Failed to find FQN by location",
                            )
                        })?;

                    self.fqn_to_symbols(fqn).await
                }
            }
        } else {
            Err(tower_lsp::jsonrpc::Error::invalid_params(
                "Failed to get ident/type name",
            ))
        }
    }

    #[tracing::instrument(skip_all)]
    async fn fqn_to_symbols(&self, fqn: String) -> Result<Vec<ResolvedSymbol>> {
        if let Ok(Some(symbol)) = self.index.find_symbol_by_fqn(&fqn).await {
            return Ok(vec![ResolvedSymbol::Project(symbol)]);
        }

        let external_symbol = self
            .index
            .find_external_symbol_by_fqn(&fqn)
            .await
            .map_err(|e| {
                tower_lsp::jsonrpc::Error::invalid_params(format!("Failed to find symbol: {}", e))
            })?
            .ok_or_else(|| {
                tower_lsp::jsonrpc::Error::invalid_params(format!("Symbol not found for {}", fqn))
            })?;
        Ok(vec![ResolvedSymbol::External(external_symbol)])
    }

    fn is_cache_dir(&self, path: Option<&Path>) -> bool {
        path.map(|p| {
            p.components()
                .any(|c| matches!(c.as_os_str().to_str(), Some(".gradle" | ".m2" | "caches")))
        })
        .unwrap_or(false)
    }

    /// Parses `content` and forwards any syntax diagnostics to the editor.
    /// Files at or above the 10 MiB parser cutoff are reported empty rather
    /// than handed to tree-sitter, mirroring the indexer's own size guard.
    /// Consults the per-document compile cache first: if this exact text has
    /// already been compiled (e.g. an undo lands back on a prior version),
    /// the cached tree and diagnostics are reused instead of re-parsing.
    #[tracing::instrument(skip_all)]
    async fn publish_diagnostics_for(&self, uri: &Url, content: &str, version: i32) {
        let Some(ext) = Path::new(uri.path()).extension().and_then(|e| e.to_str()) else {
            return;
        };
        let Some(lang) = self.languages.get(ext) else {
            return;
        };

        let diagnostics = if content.len() as u64 >= crate::constants::MAX_SOURCE_FILE_BYTES {
            lsp_warn!(
                "{} exceeds the {}-byte parse limit; reporting no diagnostics",
                uri,
                crate::constants::MAX_SOURCE_FILE_BYTES
            );
            vec![]
        } else if let Some(cached) = self.compile_cache.get(uri, content) {
            cached.diagnostics
        } else {
            match lang.parse_str(content) {
                Some((tree, parsed_content)) => {
                    let diagnostics = lang.syntax_diagnostics(&tree, &parsed_content);
                    self.compile_cache.put(
                        uri.clone(),
                        CompiledUnit {
                            version,
                            tree,
                            content: parsed_content,
                            diagnostics: diagnostics.clone(),
                        },
                    );
                    diagnostics
                }
                None => vec![],
            }
        };

        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(version))
            .await;
    }

    /// Prefers an open buffer's in-memory content over the on-disk file, so
    /// goto/hover see unsaved edits.
    fn parse_document(
        &self,
        path: &Path,
        lang: &Arc<dyn LanguageSupport>,
    ) -> Option<(Tree, String)> {
        let uri = Url::from_file_path(path).ok()?;
        if let Some(doc) = self.documents.get(&uri) {
            return lang.parse_str(&doc.content);
        }
        lang.parse(path)
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let workspace_root = params
            .root_uri
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| {
                params
                    .workspace_folders
                    .and_then(|folders| folders.first().cloned())
                    .and_then(|folder| folder.uri.to_file_path().ok())
            });

        if let Some(root) = workspace_root {
            if self.is_cache_dir(Some(&root)) {
                debug!("not a project directory, shutting down: {:?}", root);
                std::process::exit(0);
            }

            *self.workspace_root.write().await = Some(root);
        } else {
            debug!("workspace root not found, shutting down");
            std::process::exit(0);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                implementation_provider: Some(ImplementationProviderCapability::Simple(true)),
                type_definition_provider: Some(TypeDefinitionProviderCapability::Simple(true)),
                references_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), ":".to_string()]),
                    ..Default::default()
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Left(true)),
                folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(false),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "groovy-lsp".to_string(),
                version: Some("0.1.0".to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let workspace_root = self.workspace_root.read().await.clone();

        if let Some(root) = workspace_root {
            let index = Arc::clone(&self.index);
            let indexer_lock = Arc::clone(&self.indexer);
            let languages: Vec<_> = self
                .languages
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let build_tool = get_build_tool(&root);

            let mut indexer = Indexer::new(Arc::clone(&index), Arc::clone(&self.events));
            languages.iter().for_each(|(k, v)| {
                indexer.register_language(k, v.clone());
            });

            let indexing_start = Instant::now();

            lsp_info!("Resolving dependencies...");
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;

            // A probe failing here (no network, no local gradle/maven cache,
            // unreadable JDK) should not take the whole server down -- we
            // still want goto/hover to work against whatever already got
            // indexed for project-local symbols.
            let external_deps = match build_tool.get_dependency_paths(&root) {
                Ok(deps) => deps,
                Err(e) => {
                    lsp_error!("Failed to get dependencies: {e}");
                    vec![]
                }
            };
            let jdk_sources = match build_tool.get_jdk_dependency_path(&root) {
                Ok(deps) => deps,
                Err(e) => {
                    lsp_error!("Failed to get JDK sources: {e}");
                    None
                }
            };
            let mut jars: Vec<_> = external_deps;
            if let Some(src_zip) = jdk_sources {
                jars.push((None, Some(src_zip)));
            }

            let token_ws = format!("idx-ws-{}", uuid::Uuid::new_v4());
            let token_ws_end = token_ws.clone();

            lsp_progress_begin!(&token_ws, "Indexing...");

            let ws_result = indexer
                .index_workspace(&root, move |completed, total| {
                    lsp_progress!(
                        &token_ws,
                        &format!("(1/2) Indexing workspace ({}/{})", completed, total),
                        (completed as f32 / total as f32) * 100.0
                    );
                    if completed == total {
                        lsp_progress_end!(&token_ws_end);
                    }
                })
                .await;

            if let Err(e) = ws_result {
                lsp_error!("Failed to index workspace: {e}");
            }

            let token_jar = format!("idx-ext-{}", uuid::Uuid::new_v4());
            let token_jar_end = token_jar.clone();

            lsp_progress_begin!(&token_jar, "Indexing...");

            indexer
                .index_external_deps(jars, move |completed, total| {
                    lsp_progress!(
                        &token_jar,
                        &format!("(2/2) Indexing JARs ({}/{})", completed, total),
                        (completed as f32 / total as f32) * 100.0
                    );
                    if completed == total {
                        lsp_progress_end!(&token_jar_end);
                    }
                })
                .await;

            lsp_info!(
                "Indexing finished in {:.2}s",
                indexing_start.elapsed().as_secs_f64()
            );

            *indexer_lock.write().await = Some(indexer);

            let extensions: std::collections::HashSet<String> =
                self.languages.keys().cloned().collect();
            match crate::WorkspaceWatcher::spawn(root, Arc::clone(&indexer_lock), extensions) {
                Ok(watcher) => *self.watcher.write().await = Some(watcher),
                Err(e) => lsp_warn!("failed to start workspace watcher: {e}"),
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let symbols = self
            .resolve_symbol_at_position(&params.text_document_position_params)
            .await?;

        let locations: Vec<Location> = symbols
            .into_iter()
            .filter_map(|s| s.as_lsp_location())
            .collect();
        match locations.len() {
            0 => Ok(None),
            1 => Ok(Some(GotoDefinitionResponse::from(
                locations.into_iter().next().unwrap(),
            ))),
            _ => Ok(Some(GotoDefinitionResponse::Array(locations))),
        }
    }

    async fn goto_implementation(
        &self,
        params: GotoImplementationParams,
    ) -> Result<Option<GotoImplementationResponse>> {
        let path = PathBuf::from_str(
            params
                .text_document_position_params
                .text_document
                .uri
                .path(),
        )
        .unwrap();

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let lang = self.languages.get(ext).ok_or_else(|| {
                tower_lsp::jsonrpc::Error::invalid_params("Failed to get language support")
            })?;

            let (tree, content) = self
                .parse_document(&path, lang)
                .ok_or_else(|| tower_lsp::jsonrpc::Error::invalid_params("Failed to parse file"))?;

            let imports = lang.get_imports(&tree, &content);
            let package_name = lang.get_package_name(&tree, &content);

            let position = params.text_document_position_params.position;

            if let Some((ident, _)) = lang.find_ident_at_position(&tree, &content, &position) {
                if let Some(type_name) =
                    lang.get_type_at_position(tree.root_node(), &content, &position)
                {
                    let fqn = self
                        .resolve_fqn(&type_name, imports, package_name)
                        .await
                        .ok_or(tower_lsp::jsonrpc::Error::invalid_params(
                            "Failed to find FQN by location",
                        ))?;

                    let implementations = self
                        .index
                        .find_super_impls_by_fqn(&fqn)
                        .await
                        .map_err(|e| {
                            tower_lsp::jsonrpc::Error::invalid_params(format!(
                                "Failed to find parent implementations by FQN: {}",
                                e,
                            ))
                        })?;

                    let implementations = if implementations.is_empty() {
                        // Best effort
                        self.index
                            .find_super_impls_by_short_name(&type_name)
                            .await
                            .map_err(|e| {
                                tower_lsp::jsonrpc::Error::invalid_params(format!(
                                    "Failed to find parent implementations by short name: {}",
                                    e,
                                ))
                            })?
                    } else {
                        implementations
                    };

                    return Ok(self.resolved_symbols_to_impl_response(
                        implementations
                            .into_iter()
                            .map(ResolvedSymbol::Project)
                            .collect(),
                    ));
                };

                if let Some((receiver_type, params)) =
                    lang.get_method_receiver_and_params(tree.root_node(), &content, &position)
                {
                    let parent_fqn = self
                        .resolve_fqn(&receiver_type, imports, package_name)
                        .await
                        .ok_or_else(|| {
                            tower_lsp::jsonrpc::Error::invalid_params("Failed to resolve FQN")
                        })?;

                    let implementations = self
                        .index
                        .find_super_impls_by_fqn(&parent_fqn)
                        .await
                        .map_err(|e| {
                            tower_lsp::jsonrpc::Error::invalid_params(format!(
                                "Failed to find parent implementations by FQN: {}",
                                e,
                            ))
                        })?;

                    let mut method_symbols = Vec::new();
                    for impl_symbol in &implementations {
                        let method_fqn = format!("{}#{}", impl_symbol.fully_qualified_name, &ident);

                        if let Ok(symbols) = self.index.find_symbols_by_fqn(&method_fqn).await {
                            let resolved: Vec<ResolvedSymbol> =
                                symbols.into_iter().map(ResolvedSymbol::Project).collect();

                            method_symbols.extend(resolved);
                        }
                    }

                    method_symbols = self.filter_by_arity(method_symbols, params.len());

                    return Ok(self.resolved_symbols_to_impl_response(method_symbols));
                }
            }
        }

        Ok(None)
    }

    #[tracing::instrument(skip_all)]
    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let symbols = self
            .resolve_symbol_at_position(&params.text_document_position_params)
            .await;

        let Ok(symbols) = symbols else {
            return Ok(None);
        };

        let symbol = symbols
            .into_iter()
            .find(|s| !matches!(s, ResolvedSymbol::Local { .. }));

        let Some(symbol) = symbol else {
            return Ok(None);
        };

        Ok(symbol.as_lsp_hover())
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position_params = params.text_document_position;
        let path = PathBuf::from_str(position_params.text_document.uri.path()).unwrap();

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(None);
        };
        let Some(lang) = self.languages.get(ext) else {
            return Ok(None);
        };

        let Some((tree, content)) = self.parse_document(&path, lang) else {
            return Ok(None);
        };

        let position = position_params.position;
        let Some((ident, qualifier)) = lang.find_ident_at_position(&tree, &content, &position)
        else {
            return Ok(None);
        };

        let imports = lang.get_imports(&tree, &content);
        let package_name = lang.get_package_name(&tree, &content);

        let prefix = match &qualifier {
            Some(q) => {
                let fqn = self
                    .resolve_fqn(q, imports, package_name)
                    .await
                    .unwrap_or_else(|| q.clone());
                format!("{}#{}", fqn, ident)
            }
            None => ident.clone(),
        };

        let matches = self
            .index
            .search(&prefix, true, SEARCH_LIMIT)
            .await
            .map_err(|e| {
                tower_lsp::jsonrpc::Error::invalid_params(format!("search failed: {}", e))
            })?;

        let items = matches
            .iter()
            .map(|s| CompletionItem {
                label: s.short_name.clone(),
                kind: completion_kind(&s.symbol_type),
                detail: Some(s.fully_qualified_name.clone()),
                ..Default::default()
            })
            .collect();

        Ok(Some(CompletionResponse::Array(items)))
    }

    /// Bounds candidate files to every file with at least one indexed
    /// symbol (a superset of files that could plausibly reference the
    /// target), then re-resolves each same-named identifier occurrence in
    /// those files the same way `goto_definition` would, keeping only the
    /// ones that resolve back to the target's fully-qualified name.
    #[tracing::instrument(skip_all)]
    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let position_params = params.text_document_position;
        let targets = self.resolve_symbol_at_position(&position_params).await?;

        let Some(target) = targets
            .iter()
            .find(|s| !matches!(s, ResolvedSymbol::Local { .. }))
        else {
            return Ok(None);
        };
        let Some(target_fqn) = target.fully_qualified_name().map(|f| f.to_string()) else {
            return Ok(None);
        };
        let short_name = target_fqn
            .rsplit(['#', '.'])
            .next()
            .unwrap_or(&target_fqn)
            .to_string();

        let candidate_files = self.index.list_indexed_files().await.map_err(|e| {
            tower_lsp::jsonrpc::Error::invalid_params(format!(
                "failed to list indexed files: {}",
                e
            ))
        })?;

        let mut locations = Vec::new();

        for file_path in candidate_files {
            let path = PathBuf::from(&file_path);
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let Some(lang) = self.languages.get(ext) else {
                continue;
            };
            let Some((tree, content)) = self.parse_document(&path, lang) else {
                continue;
            };
            if !content.contains(&short_name) {
                continue;
            }

            let imports = lang.get_imports(&tree, &content);
            let package_name = lang.get_package_name(&tree, &content);

            let mut occurrences = Vec::new();
            collect_identifier_occurrences(tree.root_node(), &content, &short_name, &mut occurrences);

            for occurrence in occurrences {
                let Some((ident, qualifier)) =
                    lang.find_ident_at_position(&tree, &content, &occurrence.start)
                else {
                    continue;
                };

                let resolved_fqn = match qualifier {
                    Some(q) => self
                        .resolve_type_member_chain(
                            &q,
                            &ident,
                            lang,
                            &tree,
                            &content,
                            imports.clone(),
                            &occurrence.start,
                            package_name.clone(),
                        )
                        .await
                        .into_iter()
                        .next()
                        .and_then(|s| s.fully_qualified_name().map(|f| f.to_string())),
                    None => {
                        self.resolve_fqn(&ident, imports.clone(), package_name.clone())
                            .await
                    }
                };

                if resolved_fqn.as_deref() == Some(target_fqn.as_str()) {
                    if let Ok(uri) = Url::from_file_path(&path) {
                        locations.push(Location {
                            uri,
                            range: occurrence,
                        });
                    }
                }
            }
        }

        if params.context.include_declaration {
            if let Some(location) = target.as_lsp_location() {
                locations.push(location);
            }
        }

        if locations.is_empty() {
            Ok(None)
        } else {
            Ok(Some(locations))
        }
    }

    /// Renames every occurrence found by [`Self::references`] (including the
    /// declaration) to `new_name`, grouped into one `WorkspaceEdit` per file.
    #[tracing::instrument(skip_all)]
    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let new_name = params.new_name.clone();
        let reference_params = ReferenceParams {
            text_document_position: params.text_document_position,
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: ReferenceContext {
                include_declaration: true,
            },
        };

        let Some(locations) = self.references(reference_params).await? else {
            return Ok(None);
        };

        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        for location in locations {
            changes
                .entry(location.uri)
                .or_default()
                .push(TextEdit {
                    range: location.range,
                    new_text: new_name.clone(),
                });
        }

        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }))
    }

    /// Not yet implemented: formatting requires a Groovy pretty-printer this
    /// server doesn't carry, so this always reports "no edits" rather than
    /// advertising a capability it can't back with a wrong answer.
    async fn formatting(&self, _params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        Ok(None)
    }

    async fn range_formatting(
        &self,
        _params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        Ok(None)
    }

    /// Folds every class/interface/trait/enum/method/constructor body found
    /// among the file's indexed symbols.
    #[tracing::instrument(skip_all)]
    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let path = PathBuf::from_str(params.text_document.uri.path()).unwrap();
        let symbols = self
            .index
            .file_symbols(&path.to_string_lossy())
            .await
            .map_err(|e| {
                tower_lsp::jsonrpc::Error::invalid_params(format!("file_symbols failed: {}", e))
            })?;

        let ranges = symbols
            .into_iter()
            .filter(|s| s.line_end > s.line_start)
            .map(|s| FoldingRange {
                start_line: s.line_start as u32,
                start_character: Some(s.char_start as u32),
                end_line: s.line_end as u32,
                end_character: Some(s.char_end as u32),
                kind: Some(FoldingRangeKind::Region),
                collapsed_text: None,
            })
            .collect::<Vec<_>>();

        if ranges.is_empty() {
            Ok(None)
        } else {
            Ok(Some(ranges))
        }
    }

    /// No quick fixes are currently derived from diagnostics; reserved for a
    /// future unresolved-import/unused-symbol fixer.
    async fn code_action(&self, _params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        Ok(None)
    }

    /// No code lenses (e.g. reference counts) are computed yet.
    async fn code_lens(&self, _params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        Ok(None)
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let path = PathBuf::from_str(params.text_document.uri.path()).unwrap();
        let symbols = self
            .index
            .file_symbols(&path.to_string_lossy())
            .await
            .map_err(|e| {
                tower_lsp::jsonrpc::Error::invalid_params(format!(
                    "Failed to list document symbols: {}",
                    e
                ))
            })?;

        let flat: Vec<SymbolInformation> = symbols
            .iter()
            .filter_map(|s| symbol_to_information(s))
            .collect();

        if flat.is_empty() {
            return Ok(None);
        }
        Ok(Some(DocumentSymbolResponse::Flat(flat)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let matches = self
            .index
            .search(&params.query, false, SEARCH_LIMIT)
            .await
            .map_err(|e| {
                tower_lsp::jsonrpc::Error::invalid_params(format!("search failed: {}", e))
            })?;

        let flat: Vec<SymbolInformation> =
            matches.iter().filter_map(|s| symbol_to_information(s)).collect();
        Ok(Some(flat))
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let (uri, content, version) = (doc.uri.clone(), doc.text.clone(), doc.version);
        self.documents.insert(doc.uri, Document::new(doc.text, doc.version));
        self.publish_diagnostics_for(&uri, &content, version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let version = params.text_document.version;

        let content = {
            let Some(mut entry) = self.documents.get_mut(&uri) else {
                return;
            };

            for change in params.content_changes {
                let result = match change.range {
                    Some(range) => entry.apply_range_change(range, &change.text, version),
                    None => entry.apply_full_change(change.text, version),
                };
                if let Err(e) = result {
                    lsp_error!("Failed to apply document change: {e}");
                    break;
                }
            }
            entry.content.clone()
        };

        self.events.publish_document_changed(
            lsp_core::event_bus::DocumentChangedEvent {
                uri: uri.clone(),
                version,
            },
        );
        self.publish_diagnostics_for(&uri, &content, version).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
        self.compile_cache.evict_document(&params.text_document.uri);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Some(path) = params.text_document.uri.to_file_path().ok() else {
            return;
        };
        let indexer_guard = self.indexer.read().await;
        if let Some(indexer) = indexer_guard.as_ref() {
            if let Err(e) = indexer.index_file_path(&path).await {
                lsp_error!("Failed to reindex {}: {e}", path.display());
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.index.close().await;
        Ok(())
    }
}

/// Background consumer decoupled from the indexer: logs progress milestones
/// without the indexer needing a direct reference to the LSP client.
fn spawn_event_logger(events: Arc<EventBus>) {
    let mut file_indexed = events.subscribe_file_indexed();
    let mut workspace_indexed = events.subscribe_workspace_indexed();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Ok(event) = file_indexed.recv() => {
                    event_bus::run_with_deadline(event_bus::DEFAULT_HANDLER_DEADLINE, async {
                        tracing::debug!(uri = %event.uri, symbols = event.symbol_count, "file indexed");
                    })
                    .await;
                }
                Ok(event) = workspace_indexed.recv() => {
                    event_bus::run_with_deadline(event_bus::DEFAULT_HANDLER_DEADLINE, async {
                        tracing::debug!(files = event.file_count, "workspace indexed");
                    })
                    .await;
                }
                else => break,
            }
        }
    });
}

/// Collects the span of every `identifier`/`type_identifier` leaf whose
/// text equals `name`, for the reference finder's candidate scan.
fn collect_identifier_occurrences(
    node: tree_sitter::Node,
    content: &str,
    name: &str,
    out: &mut Vec<Range>,
) {
    if matches!(node.kind(), "identifier" | "type_identifier") {
        if node.utf8_text(content.as_bytes()) == Ok(name) {
            let start = node.start_position();
            let end_char = start.column as u32 + name.chars().map(char::len_utf16).sum::<usize>() as u32;
            out.push(Range {
                start: Position {
                    line: start.row as u32,
                    character: start.column as u32,
                },
                end: Position {
                    line: start.row as u32,
                    character: end_char,
                },
            });
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifier_occurrences(child, content, name, out);
    }
}

fn completion_kind(symbol_type: &str) -> Option<CompletionItemKind> {
    match symbol_type {
        "Class" => Some(CompletionItemKind::CLASS),
        "Interface" | "Trait" => Some(CompletionItemKind::INTERFACE),
        "Enum" => Some(CompletionItemKind::ENUM),
        "Method" | "Constructor" => Some(CompletionItemKind::METHOD),
        "Field" | "Property" => Some(CompletionItemKind::FIELD),
        _ => None,
    }
}

#[allow(deprecated)]
fn symbol_to_information(symbol: &Symbol) -> Option<SymbolInformation> {
    let location = symbol.as_lsp_location()?;
    Some(SymbolInformation {
        name: symbol.short_name.clone(),
        kind: match symbol.symbol_type.as_str() {
            "Class" => SymbolKind::CLASS,
            "Interface" | "Trait" => SymbolKind::INTERFACE,
            "Enum" => SymbolKind::ENUM,
            "Method" | "Constructor" => SymbolKind::METHOD,
            "Field" | "Property" => SymbolKind::FIELD,
            _ => SymbolKind::VARIABLE,
        },
        tags: None,
        deprecated: None,
        location,
        container_name: symbol.parent_name.clone(),
    })
}
