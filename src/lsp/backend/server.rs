//! Standard `LanguageServer` surface: lifecycle, document sync, completion,
//! and definition lookup. Vendor methods live in `custom.rs`.

use tower_lsp_server::jsonrpc::Result as RpcResult;
use tower_lsp_server::lsp_types::{
    CompletionList, CompletionOptions, CompletionParams, CompletionResponse,
    DiagnosticOptions, DiagnosticServerCapabilities, DidChangeTextDocumentParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams,
    GotoDefinitionParams, GotoDefinitionResponse, InitializeParams, InitializeResult,
    InitializedParams, OneOf, ServerCapabilities, ServerInfo, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions,
};
use tower_lsp_server::LanguageServer;
use tracing::info;

use crate::lsp::completion::build_completions;

use super::{to_lsp_location, uri_to_path, Backend};

impl LanguageServer for Backend {
    async fn initialize(&self, _params: InitializeParams) -> RpcResult<InitializeResult> {
        info!("received initialize request");
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec!["m".to_string(), "p".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: None,
                        inter_file_dependencies: false,
                        workspace_diagnostics: false,
                        work_done_progress_options: Default::default(),
                    },
                )),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "HDL Copilot Server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            ..Default::default()
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let _ = self.find_and_report_diagnostics().await;
    }

    async fn shutdown(&self) -> RpcResult<()> {
        self.project.write().await.take();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return;
        };
        let changed = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.add_file(&path, &params.text_document.text),
                None => return,
            }
        };
        if changed {
            let _ = self.find_and_report_diagnostics().await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return;
        };
        // Full-text sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.update_file_buffer(&path, &change.text),
                None => return,
            }
        }
        let _ = self.find_and_report_diagnostics().await;
    }

    async fn did_save(&self, _params: DidSaveTextDocumentParams) {}

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Some(path) = uri_to_path(&params.text_document.uri) else {
            return;
        };
        {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.remove_file_if_no_ent(&path),
                None => return,
            }
        }
        let _ = self.find_and_report_diagnostics().await;
    }

    async fn completion(&self, params: CompletionParams) -> RpcResult<Option<CompletionResponse>> {
        let position = params.text_document_position.position;
        let Some(path) = uri_to_path(&params.text_document_position.text_document.uri) else {
            return Ok(None);
        };
        let mut guard = self.project.write().await;
        let Some(project) = guard.as_mut() else {
            return Ok(None);
        };
        let Some(line_text) = project.get_text_from_file_loc(&path, position.line) else {
            return Ok(Some(CompletionResponse::List(CompletionList::default())));
        };
        let list = build_completions(project, &line_text, position.line, position.character);
        info!(items = list.items.len(), "returning completions");
        Ok(Some(CompletionResponse::List(list)))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> RpcResult<Option<GotoDefinitionResponse>> {
        info!("received definition request");
        let position = params.text_document_position_params.position;
        let Some(path) = uri_to_path(&params.text_document_position_params.text_document.uri)
        else {
            return Ok(None);
        };
        let mut guard = self.project.write().await;
        let Some(project) = guard.as_mut() else {
            return Ok(None);
        };
        let locations = project.lookup(&path, position.line, position.character);
        let converted = locations.iter().filter_map(to_lsp_location).collect();
        Ok(Some(GotoDefinitionResponse::Array(converted)))
    }
}
