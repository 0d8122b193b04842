//! Typed parameter structs, one per query operation (spec §4.E, §6).
//!
//! Grounded on `server::mcp`'s parameter-struct convention
//! (`SearchParams`, `GetFileSymbolsParams`, ...): every struct derives
//! `Debug, Deserialize, JsonSchema, clap::Args` so the same type serves as
//! an MCP tool's input schema and as a `clap` subcommand's flattened args,
//! exactly the dual role the teacher's structs play between `server::mcp`
//! and `cli::query`.

use clap::Args;
use rmcp::schemars::JsonSchema;
use serde::Deserialize;

fn default_max_results() -> u32 {
    100
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct ListFilesParams {
    /// Glob-ish pattern filter (leading/trailing `*`); omit for all files.
    pub pattern: Option<String>,
    /// 0 = unlimited.
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct GetStructureSummaryParams {
    /// Limit the summary to one file; omit for the whole project.
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct GetFunctionsParams {
    pub path: Option<String>,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct GetClassesParams {
    pub path: Option<String>,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct GetImportsParams {
    pub path: Option<String>,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetFunctionSourceParams {
    pub name: String,
    /// Disambiguate when several files define `name`.
    #[arg(long)]
    pub path: Option<String>,
    /// 0 = unlimited.
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_lines: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetClassSourceParams {
    pub name: String,
    #[arg(long)]
    pub path: Option<String>,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_lines: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct FindSymbolParams {
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetDependenciesParams {
    pub symbol: String,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetDependentsParams {
    pub symbol: String,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

fn default_impact_cap() -> u32 {
    0
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetChangeImpactParams {
    pub symbol: String,
    #[arg(long, default_value_t = 0)]
    #[serde(default = "default_impact_cap")]
    pub max_direct: u32,
    #[arg(long, default_value_t = 0)]
    #[serde(default = "default_impact_cap")]
    pub max_transitive: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetCallChainParams {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetFileDependenciesParams {
    pub path: String,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetFileDependentsParams {
    pub path: String,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct SearchCodebaseParams {
    pub regex: String,
    #[arg(long, default_value_t = 100)]
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize, JsonSchema, Args)]
pub struct GetLinesParams {
    pub path: String,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Default, Deserialize, JsonSchema, Args)]
pub struct ReindexParams {
    /// Always true in this implementation: `reindex` re-walks the project
    /// root from disk. A partial (`full: false`) reindex is the
    /// incremental updater's job (component D), driven by an external
    /// changeset rather than by this query operation.
    #[arg(long, default_value_t = true)]
    #[serde(default = "default_true")]
    pub full: bool,
}

fn default_true() -> bool {
    true
}
