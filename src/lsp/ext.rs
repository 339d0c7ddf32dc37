//! Vendor protocol extensions: the `backend/*` notifications the server
//! pushes to the editor and the parameter shapes of the custom requests.

use serde::{Deserialize, Serialize};
use tower_lsp_server::lsp_types::notification::Notification;

/// Non-blocking warning toast shown by the editor frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningParams {
    /// Message type, matching the LSP `MessageType` scale (2 = warning).
    #[serde(rename = "type")]
    pub kind: i32,
    pub message: String,
}

#[derive(Debug)]
pub enum BackendWarning {}

impl Notification for BackendWarning {
    type Params = WarningParams;
    const METHOD: &'static str = "backend/warning";
}

#[derive(Debug)]
pub enum ProjectStructureChanged {}

impl Notification for ProjectStructureChanged {
    type Params = ();
    const METHOD: &'static str = "backend/projectStructureChanged";
}

#[derive(Debug)]
pub enum ExclusionsChanged {}

impl Notification for ExclusionsChanged {
    type Params = ();
    const METHOD: &'static str = "backend/exclusionsChanged";
}

#[derive(Debug)]
pub enum MacrosChanged {}

impl Notification for MacrosChanged {
    type Params = ();
    const METHOD: &'static str = "backend/macrosChanged";
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathParams {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMacrosParams {
    pub macros: Vec<MacroParam>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MacroParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticStringsParams {
    pub file_path: String,
    pub line: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticStringsResult {
    pub names: Vec<String>,
}
