//! LSP backend state and the publish pipeline.
//!
//! The backend owns the single project handle behind a lock; every request
//! handler goes through it. The tower-lsp `Client` is the only channel back
//! to the editor, so nothing here ever references the transport.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp_server::lsp_types::notification::Notification;
use tower_lsp_server::lsp_types::{
    self, Diagnostic as LspDiagnostic, DiagnosticSeverity, Location as LspLocation, Uri,
};
use tower_lsp_server::{Client, UriExt};
use tracing::{error, info, warn};

use crate::project::types::{Diagnostic, Location, Severity};
use crate::project::Project;

use super::ext::{BackendWarning, WarningParams};

mod custom;
mod server;

pub struct Backend {
    client: Client,
    project: Arc<RwLock<Option<Project>>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            project: Arc::new(RwLock::new(None)),
        }
    }

    pub(super) async fn send_warning(&self, message: &str) {
        self.client
            .send_notification::<BackendWarning>(WarningParams {
                kind: 2,
                message: message.to_string(),
            })
            .await;
    }

    /// Broadcast pending compiler warnings, recompute diagnostics, and
    /// publish them per file, clearing files that went quiet.
    pub(super) async fn find_and_report_diagnostics(&self) -> bool {
        let (warnings, publishes) = {
            let mut guard = self.project.write().await;
            let Some(project) = guard.as_mut() else {
                error!("find and report: no current project");
                return false;
            };
            let warnings = project.take_unsent_warnings();
            let diagnostics = project.find_diagnostics();
            let publishes = project.plan_publishes(diagnostics);
            (warnings, publishes)
        };

        for message in &warnings {
            warn!(%message, "compiler warning");
            self.send_warning(message).await;
        }

        for (path, diagnostics) in publishes {
            let Some(uri) = Uri::from_file_path(&path) else {
                warn!(path = %path.display(), "cannot build uri for path");
                continue;
            };
            let published: Vec<LspDiagnostic> = diagnostics
                .iter()
                .filter(|diag| diag.severity != Severity::None)
                .map(to_lsp_diagnostic)
                .collect();
            self.client.publish_diagnostics(uri, published, None).await;
        }
        true
    }

    pub(super) async fn notify<N>(&self)
    where
        N: Notification<Params = ()>,
    {
        info!(method = N::METHOD, "sending notification");
        self.client.send_notification::<N>(()).await;
    }
}

pub(super) fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.to_file_path().map(|cow: Cow<'_, std::path::Path>| cow.into_owned())
}

pub(super) fn to_lsp_range(range: &crate::project::types::Range) -> lsp_types::Range {
    lsp_types::Range {
        start: lsp_types::Position {
            line: range.start.line,
            character: range.start.character,
        },
        end: lsp_types::Position {
            line: range.end.line,
            character: range.end.character,
        },
    }
}

pub(super) fn to_lsp_diagnostic(diag: &Diagnostic) -> LspDiagnostic {
    let severity = match diag.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint | Severity::None => DiagnosticSeverity::HINT,
    };
    LspDiagnostic {
        range: to_lsp_range(&diag.range),
        severity: Some(severity),
        source: Some("HDL Copilot".to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

pub(super) fn to_lsp_location(location: &Location) -> Option<LspLocation> {
    let uri = Uri::from_file_path(&location.path)?;
    Some(LspLocation {
        uri,
        range: to_lsp_range(&location.range),
    })
}
