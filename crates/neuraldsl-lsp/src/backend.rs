//! LSP backend implementation for NeuralDSL.
//!
//! This module implements the Language Server Protocol handler
//! using tower-lsp.

use serde::Deserialize;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use neuraldsl_core::ValidationOptions;

use crate::code_action::get_code_actions;
use crate::context::ValidationContext;
use crate::diagnostics::{to_lsp_diagnostics, SOURCE};
use crate::document::DocumentStore;
use crate::hover::get_hover;

/// Client settings as sent with `workspace/didChangeConfiguration`.
#[derive(Debug, Deserialize)]
struct Settings {
    neuraldsl: Option<ValidationOptions>,
}

/// NeuralDSL Language Server.
pub struct NeuralDslServer {
    /// The LSP client connection.
    client: Client,
    /// Document store for open files.
    documents: Arc<DocumentStore>,
    /// Cache, debounce scheduler and options.
    context: Arc<ValidationContext>,
}

impl NeuralDslServer {
    /// Create a new NeuralDSL language server.
    pub fn new(client: Client, options: ValidationOptions) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            context: Arc::new(ValidationContext::new(options)),
        }
    }

    /// Schedule validation of a document after the debounce window.
    fn schedule_validation(&self, uri: Url) {
        let client = self.client.clone();
        let documents = Arc::clone(&self.documents);
        let context = Arc::clone(&self.context);
        let key = uri.to_string();

        self.context.debouncer().schedule(&key, async move {
            publish(&client, &documents, &context, uri).await;
        });
    }

    fn full_report(items: Vec<Diagnostic>) -> DocumentDiagnosticReportResult {
        DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
            RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            },
        ))
    }
}

/// Validate a document and publish its diagnostics.
async fn publish(client: &Client, documents: &DocumentStore, context: &ValidationContext, uri: Url) {
    let Some(doc) = documents.get(&uri) else {
        return;
    };

    let Some(analysis) =
        context.validate_if_open(uri.as_str(), &doc.text(), doc.version, || documents.contains(&uri))
    else {
        return;
    };
    let diagnostics = to_lsp_diagnostics(&analysis.diagnostics, &uri, Some(&doc));
    client
        .publish_diagnostics(uri, diagnostics, Some(doc.version))
        .await;
}

#[tower_lsp::async_trait]
impl LanguageServer for NeuralDslServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            match serde_json::from_value::<ValidationOptions>(options) {
                Ok(options) => self.context.set_options(options),
                Err(e) => log::warn!("Ignoring invalid initialization options: {}", e),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                code_action_provider: Some(CodeActionProviderCapability::Options(
                    CodeActionOptions {
                        code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                        ..Default::default()
                    },
                )),
                diagnostic_provider: Some(DiagnosticServerCapabilities::Options(
                    DiagnosticOptions {
                        identifier: Some(SOURCE.to_string()),
                        inter_file_dependencies: false,
                        workspace_diagnostics: false,
                        ..Default::default()
                    },
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "neuraldsl-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "NeuralDSL LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;

        self.documents.open(uri.clone(), &text, version);
        publish(&self.client, &self.documents, &self.context, uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Get the full text (we use FULL sync mode)
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.update(&uri, &change.text, version);
            self.schedule_validation(uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.context.close(uri.as_str());

        // Clear diagnostics
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let options = match serde_json::from_value::<Settings>(params.settings) {
            Ok(Settings {
                neuraldsl: Some(options),
            }) => options,
            Ok(_) => return,
            Err(e) => {
                log::warn!("Ignoring invalid settings: {}", e);
                self.client
                    .log_message(MessageType::WARNING, format!("Invalid neuraldsl settings: {}", e))
                    .await;
                return;
            }
        };

        self.context.set_options(options);
        self.client
            .log_message(MessageType::INFO, "NeuralDSL settings updated")
            .await;

        for uri in self.documents.uris() {
            publish(&self.client, &self.documents, &self.context, uri).await;
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let doc = match self.documents.get(&uri) {
            Some(d) => d,
            None => return Ok(None),
        };

        let analysis = self.context.validate(uri.as_str(), &doc.text(), doc.version);
        Ok(get_hover(&analysis.structure, &doc, position))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;

        let doc = match self.documents.get(&uri) {
            Some(d) => d,
            None => return Ok(None),
        };

        let analysis = self.context.validate(uri.as_str(), &doc.text(), doc.version);
        let actions = get_code_actions(&uri, &doc, &analysis.structure, &params.context.diagnostics);
        if actions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(actions))
        }
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let uri = params.text_document.uri;

        let doc = match self.documents.get(&uri) {
            Some(d) => d,
            None => return Ok(Self::full_report(vec![])),
        };

        let analysis = self.context.validate(uri.as_str(), &doc.text(), doc.version);
        Ok(Self::full_report(to_lsp_diagnostics(
            &analysis.diagnostics,
            &uri,
            Some(&doc),
        )))
    }
}
