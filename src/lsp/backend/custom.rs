//! Vendor request handlers: project lifecycle, exclusions, macros, root
//! units, and per-line diagnostic names. Operation failures surface as
//! `backend/warning` notifications; replies stay structurally valid.

use serde_json::Value;
use tower_lsp_server::jsonrpc::Result as RpcResult;
use tracing::{error, info};

use crate::lsp::ext::{
    DiagnosticStringsParams, DiagnosticStringsResult, ExclusionsChanged, MacrosChanged,
    PathParams, ProjectStructureChanged, SetMacrosParams,
};
use crate::paths::normalize_path;
use crate::project::{Project, ProjectError};

use super::Backend;

impl Backend {
    pub(crate) async fn set_project_path(&self, params: PathParams) -> RpcResult<Value> {
        info!(path = %params.path, "setting project path");
        let path = normalize_path(&params.path);
        let created = Project::create(&path);
        {
            let mut guard = self.project.write().await;
            if guard.is_some() {
                info!("removing current project");
            }
            match created {
                Ok(project) => *guard = Some(project),
                Err(err) => {
                    error!(%err, "failed to create project");
                    drop(guard);
                    self.send_warning(&err.to_string()).await;
                    return Ok(Value::Null);
                }
            }
        }
        self.find_and_report_diagnostics().await;
        Ok(Value::Null)
    }

    pub(crate) async fn reload_dotfile(&self) -> RpcResult<Value> {
        {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.load_dotfile(true),
                None => return Ok(Value::Null),
            }
        }
        self.find_and_report_diagnostics().await;
        Ok(Value::Null)
    }

    pub(crate) async fn recompile(&self) -> RpcResult<Value> {
        self.find_and_report_diagnostics().await;
        Ok(Value::Null)
    }

    pub(crate) async fn include_resource(&self, params: PathParams) -> RpcResult<Value> {
        let path = normalize_path(&params.path);
        let result = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.include_resource(&path),
                None => return Ok(Value::Null),
            }
        };
        self.after_exclusion_change(result).await;
        Ok(Value::Null)
    }

    pub(crate) async fn exclude_resource(&self, params: PathParams) -> RpcResult<Value> {
        let path = normalize_path(&params.path);
        let result = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.exclude_resource(&path),
                None => return Ok(Value::Null),
            }
        };
        self.after_exclusion_change(result).await;
        Ok(Value::Null)
    }

    async fn after_exclusion_change(&self, result: Result<(), ProjectError>) {
        match result {
            Ok(()) => self.notify::<ExclusionsChanged>().await,
            Err(err) => {
                error!(%err, "exclusion change failed");
                self.send_warning(&err.to_string()).await;
            }
        }
    }

    pub(crate) async fn set_macros(&self, params: SetMacrosParams) -> RpcResult<Value> {
        let macros: Vec<(String, String)> = params
            .macros
            .into_iter()
            .map(|entry| (entry.name, entry.value))
            .collect();
        let result = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.set_macros(&macros),
                None => return Ok(Value::Null),
            }
        };
        match result {
            Ok(()) => self.notify::<MacrosChanged>().await,
            Err(err) => {
                error!(%err, "failed to set macros");
                self.send_warning(&err.to_string()).await;
            }
        }
        Ok(Value::Null)
    }

    pub(crate) async fn add_root_unit(&self, params: PathParams) -> RpcResult<Value> {
        let path = normalize_path(&params.path);
        let result = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.add_root_unit(&path),
                None => return Ok(Value::Null),
            }
        };
        self.after_structure_change(result).await;
        Ok(Value::Null)
    }

    pub(crate) async fn remove_root_unit(&self, params: PathParams) -> RpcResult<Value> {
        let path = normalize_path(&params.path);
        let result = {
            let mut guard = self.project.write().await;
            match guard.as_mut() {
                Some(project) => project.remove_root_unit(&path),
                None => return Ok(Value::Null),
            }
        };
        self.after_structure_change(result).await;
        Ok(Value::Null)
    }

    async fn after_structure_change(&self, result: Result<(), ProjectError>) {
        match result {
            Ok(()) => {
                self.notify::<ProjectStructureChanged>().await;
                self.find_and_report_diagnostics().await;
            }
            Err(err) => {
                error!(%err, "root unit change failed");
                self.send_warning(&err.to_string()).await;
            }
        }
    }

    pub(crate) async fn diagnostic_strings_for_line(
        &self,
        params: DiagnosticStringsParams,
    ) -> RpcResult<DiagnosticStringsResult> {
        let path = normalize_path(&params.file_path);
        let guard = self.project.read().await;
        let names = match guard.as_ref() {
            Some(project) => project.diagnostic_names_for_line(&path, params.line),
            None => Vec::new(),
        };
        Ok(DiagnosticStringsResult { names })
    }
}
