//! Language Server Protocol implementation for NeuralDSL.
//!
//! This crate wires the NeuralDSL validator into any editor supporting the
//! Language Server Protocol.
//!
//! Features:
//! - Diagnostics on open, debounced diagnostics on change, pull diagnostics
//! - Hover information for layers, training statements and models
//! - Quick fixes keyed on diagnostic codes
//! - Settings via `workspace/didChangeConfiguration`

mod backend;
mod code_action;
mod context;
mod debounce;
mod diagnostics;
mod document;
mod hover;

pub use backend::NeuralDslServer;
pub use context::ValidationContext;
pub use debounce::Debouncer;
pub use document::{Document, DocumentStore};

use neuraldsl_core::ValidationOptions;
use tower_lsp::{LspService, Server};

/// Run the LSP server over stdio.
///
/// This function blocks until the client disconnects.
pub async fn run_lsp_server(options: ValidationOptions) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(move |client| NeuralDslServer::new(client, options.clone()));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
