//! Service wiring: stdio transport plus the vendor method routes.

use std::error::Error;

use tokio::runtime::Runtime;
use tower_lsp_server::{LspService, Server};

use super::backend::Backend;

pub fn serve_stdio() -> Result<(), Box<dyn Error + Send + Sync>> {
    let runtime = Runtime::new()?;
    runtime.block_on(async {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let (service, socket) = LspService::build(Backend::new)
            .custom_method("setProjectPath", Backend::set_project_path)
            .custom_method("reloadDotFile", Backend::reload_dotfile)
            .custom_method("recompile", Backend::recompile)
            .custom_method("includeResource", Backend::include_resource)
            .custom_method("excludeResource", Backend::exclude_resource)
            .custom_method("setMacros", Backend::set_macros)
            .custom_method("compiler/addRootUnit", Backend::add_root_unit)
            .custom_method("compiler/removeRootUnit", Backend::remove_root_unit)
            .custom_method(
                "getDiagnosticStringsForLine",
                Backend::diagnostic_strings_for_line,
            )
            .finish();
        Server::new(stdin, stdout, socket).serve(service).await;
        Ok(())
    })
}
