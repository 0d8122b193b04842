//! Thin `rmcp` stdio adapter: one `#[tool]` per query operation (spec §6's
//! 18-operation surface, §1's "the core exposes typed functions; a thin
//! server adapts them").
//!
//! Grounded on `CodeIndexServer` in the teacher: `tool_router`/
//! `tool_handler`, `ServerHandler`/`ServerInfo`, `stdio()` transport, and
//! `extract_result_text` are kept close to verbatim in structure. Tool
//! bodies are replaced wholesale — they call straight into `QueryEngine`
//! instead of querying SQLite — since there is no persisted database left
//! to query (spec §6: "Persistence: None").

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Serialize;

use crate::index::IndexHandle;
use crate::query::{self, QueryEngine};

/// MCP server exposing the 17 read-only query operations plus `reindex`.
/// `IndexHandle` is already `Clone + Send + Sync` (an `Arc<RwLock<..>>>`
/// underneath), so unlike the teacher's `Mutex<SearchDb>` wrapper (needed
/// only because `rusqlite::Connection` isn't `Sync`), no extra locking
/// wrapper is needed at this layer.
#[derive(Clone)]
pub struct CodenavServer {
    handle: IndexHandle,
    tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
}

impl CodenavServer {
    pub fn new(handle: IndexHandle) -> Self {
        Self {
            handle,
            tool_router: Self::tool_router(),
        }
    }
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("serialization failed: {e}"), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn query_err(e: crate::error::QueryError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

#[tool_router]
impl CodenavServer {
    #[tool(description = "Project-wide counts: files, symbols, functions, classes, imports, languages.")]
    pub async fn get_project_summary(&self) -> Result<CallToolResult, McpError> {
        let summary = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_project_summary());
        ok_json(&summary)
    }

    #[tool(description = "List indexed files, optionally filtered by a leading/trailing-* pattern.")]
    pub async fn list_files(
        &self,
        Parameters(params): Parameters<query::ListFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        let page = self
            .handle
            .with_index(|index| QueryEngine::new(index).list_files(params));
        ok_json(&page)
    }

    #[tool(description = "Structural summary: function/class/section names, for one file or the whole project.")]
    pub async fn get_structure_summary(
        &self,
        Parameters(params): Parameters<query::GetStructureSummaryParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_structure_summary(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "List function records, optionally scoped to one file.")]
    pub async fn get_functions(
        &self,
        Parameters(params): Parameters<query::GetFunctionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_functions(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "List class/struct/enum/interface/trait records, optionally scoped to one file.")]
    pub async fn get_classes(
        &self,
        Parameters(params): Parameters<query::GetClassesParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_classes(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "List import statements, optionally scoped to one file.")]
    pub async fn get_imports(
        &self,
        Parameters(params): Parameters<query::GetImportsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_imports(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Fetch the verbatim source of a function/method by name, optionally disambiguated by path.")]
    pub async fn get_function_source(
        &self,
        Parameters(params): Parameters<query::GetFunctionSourceParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_function_source(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Fetch the verbatim source of a class/struct/enum by name, optionally disambiguated by path.")]
    pub async fn get_class_source(
        &self,
        Parameters(params): Parameters<query::GetClassSourceParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_class_source(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Locate every definition of a symbol name across the project.")]
    pub async fn find_symbol(
        &self,
        Parameters(params): Parameters<query::FindSymbolParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).find_symbol(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Symbols this symbol's body references (outgoing dependency edges).")]
    pub async fn get_dependencies(
        &self,
        Parameters(params): Parameters<query::GetDependenciesParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_dependencies(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Symbols that reference this symbol (incoming dependency edges).")]
    pub async fn get_dependents(
        &self,
        Parameters(params): Parameters<query::GetDependentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_dependents(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Blast radius of changing a symbol: direct dependents plus the transitive BFS closure beyond them.")]
    pub async fn get_change_impact(
        &self,
        Parameters(params): Parameters<query::GetChangeImpactParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_change_impact(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Shortest reference chain from one symbol to another over the dependency graph, or null if none exists.")]
    pub async fn get_call_chain(
        &self,
        Parameters(params): Parameters<query::GetCallChainParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_call_chain(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Files this file imports (outgoing import edges).")]
    pub async fn get_file_dependencies(
        &self,
        Parameters(params): Parameters<query::GetFileDependenciesParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_file_dependencies(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Files that import this file (incoming import edges).")]
    pub async fn get_file_dependents(
        &self,
        Parameters(params): Parameters<query::GetFileDependentsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_file_dependents(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Regex search over every indexed file's raw lines, sorted by path, capped at max_results (default 100).")]
    pub async fn search_codebase(
        &self,
        Parameters(params): Parameters<query::SearchCodebaseParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).search_codebase(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Fetch a verbatim, 1-indexed inclusive line range from one file.")]
    pub async fn get_lines(
        &self,
        Parameters(params): Parameters<query::GetLinesParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_lines(params));
        result.map(|r| ok_json(&r)).map_err(query_err)?
    }

    #[tool(description = "Re-walk the project root from disk and replace the index wholesale.")]
    pub async fn reindex(
        &self,
        Parameters(_params): Parameters<query::ReindexParams>,
    ) -> Result<CallToolResult, McpError> {
        self.handle.reindex();
        let summary = self
            .handle
            .with_index(|index| QueryEngine::new(index).get_project_summary());
        ok_json(&summary)
    }
}

#[tool_handler]
impl ServerHandler for CodenavServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Structural code index: navigation and impact queries over a codebase \
                 without reading source files directly.\n\n\
                 Start with `get_project_summary` or `list_files` to orient, `find_symbol` \
                 to locate a declaration, `get_function_source`/`get_class_source` to read \
                 it, and `get_dependents`/`get_change_impact` before changing it. \
                 `search_codebase` takes a regex over raw source lines. Every list-returning \
                 tool takes `max_results` (0 = unlimited); a truncated response sets \
                 `truncated: true` and `total` to the untruncated count."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Extract the concatenated text content of a `CallToolResult`, for the
/// one-shot CLI `query` subcommand that reuses these tool bodies.
pub fn extract_result_text(result: &CallToolResult) -> String {
    use rmcp::model::RawContent;
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Start the MCP server over stdio against one project's index.
pub async fn start_server(handle: IndexHandle) -> Result<()> {
    let server = CodenavServer::new(handle);
    let service = server
        .serve(stdio())
        .await
        .map_err(|e| anyhow::anyhow!("MCP serve error: {e}"))?;
    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP runtime error: {e}"))?;
    Ok(())
}
