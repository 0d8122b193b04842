//! `codenav query <operation> [args...]`: one-shot invocation of any of the
//! 18 operations in spec §6's table, for scripting/testing. Grounded on the
//! non-REPL branch of the teacher's own `cli::query::QueryCommand`
//! dispatch — the `QueryCommand` enum-of-subcommands idea is kept, the
//! `clap_repl` interactive loop is dropped (DESIGN.md: the MCP adapter
//! already exposes the full operation surface; a one-shot invocation
//! covers scripting without an entire interactive-loop dependency).

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Config;
use crate::index::IndexHandle;
use crate::query::{self, QueryEngine};

/// One subcommand per query operation (spec §6), plus `reindex`.
/// NOTE: keep in sync with `server::mcp::CodenavServer`'s `#[tool]` list.
#[derive(Debug, Parser)]
#[command(name = "query")]
pub enum QueryCommand {
    GetProjectSummary,
    ListFiles(#[command(flatten)] query::ListFilesParams),
    GetStructureSummary(#[command(flatten)] query::GetStructureSummaryParams),
    GetFunctions(#[command(flatten)] query::GetFunctionsParams),
    GetClasses(#[command(flatten)] query::GetClassesParams),
    GetImports(#[command(flatten)] query::GetImportsParams),
    GetFunctionSource(#[command(flatten)] query::GetFunctionSourceParams),
    GetClassSource(#[command(flatten)] query::GetClassSourceParams),
    FindSymbol(#[command(flatten)] query::FindSymbolParams),
    GetDependencies(#[command(flatten)] query::GetDependenciesParams),
    GetDependents(#[command(flatten)] query::GetDependentsParams),
    GetChangeImpact(#[command(flatten)] query::GetChangeImpactParams),
    GetCallChain(#[command(flatten)] query::GetCallChainParams),
    GetFileDependencies(#[command(flatten)] query::GetFileDependenciesParams),
    GetFileDependents(#[command(flatten)] query::GetFileDependentsParams),
    SearchCodebase(#[command(flatten)] query::SearchCodebaseParams),
    GetLines(#[command(flatten)] query::GetLinesParams),
    Reindex(#[command(flatten)] query::ReindexParams),
}

/// Build the index (watching the root afterward if `watch`), execute
/// `command` once, print its JSON result, and exit.
pub fn run(root: &Path, watch: bool, command: Vec<String>) -> Result<()> {
    let config = Config::from_root(root)
        .with_context(|| format!("cannot resolve path: {}", root.display()))?;
    let handle = IndexHandle::build(config);

    if watch {
        let watch_handle = handle.clone();
        std::thread::spawn(move || {
            if let Err(e) = crate::watch::run(watch_handle) {
                tracing::error!("watch error: {e}");
            }
        });
    }

    let mut args = vec!["query".to_string()];
    args.extend(command);
    let cmd = QueryCommand::try_parse_from(&args)?;
    execute(&handle, cmd)
}

fn execute(handle: &IndexHandle, cmd: QueryCommand) -> Result<()> {
    macro_rules! run_query {
        ($params:expr, $method:ident) => {{
            let result = handle.with_index(|index| QueryEngine::new(index).$method($params));
            print_result(result)
        }};
    }

    match cmd {
        QueryCommand::GetProjectSummary => {
            let summary = handle.with_index(|index| QueryEngine::new(index).get_project_summary());
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        QueryCommand::ListFiles(p) => {
            let page = handle.with_index(|index| QueryEngine::new(index).list_files(p));
            println!("{}", serde_json::to_string_pretty(&page)?);
            Ok(())
        }
        QueryCommand::GetStructureSummary(p) => run_query!(p, get_structure_summary),
        QueryCommand::GetFunctions(p) => run_query!(p, get_functions),
        QueryCommand::GetClasses(p) => run_query!(p, get_classes),
        QueryCommand::GetImports(p) => run_query!(p, get_imports),
        QueryCommand::GetFunctionSource(p) => run_query!(p, get_function_source),
        QueryCommand::GetClassSource(p) => run_query!(p, get_class_source),
        QueryCommand::FindSymbol(p) => run_query!(p, find_symbol),
        QueryCommand::GetDependencies(p) => run_query!(p, get_dependencies),
        QueryCommand::GetDependents(p) => run_query!(p, get_dependents),
        QueryCommand::GetChangeImpact(p) => run_query!(p, get_change_impact),
        QueryCommand::GetCallChain(p) => run_query!(p, get_call_chain),
        QueryCommand::GetFileDependencies(p) => run_query!(p, get_file_dependencies),
        QueryCommand::GetFileDependents(p) => run_query!(p, get_file_dependents),
        QueryCommand::SearchCodebase(p) => run_query!(p, search_codebase),
        QueryCommand::GetLines(p) => run_query!(p, get_lines),
        QueryCommand::Reindex(_) => {
            handle.reindex();
            let summary = handle.with_index(|index| QueryEngine::new(index).get_project_summary());
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn print_result<T: serde::Serialize, E: std::fmt::Display>(result: Result<T, E>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_find_symbol() {
        let cmd = QueryCommand::try_parse_from(["query", "find-symbol", "foo"]).unwrap();
        match cmd {
            QueryCommand::FindSymbol(p) => assert_eq!(p.name, "foo"),
            _ => panic!("expected FindSymbol"),
        }
    }

    #[test]
    fn parses_search_codebase_with_default_limit() {
        let cmd = QueryCommand::try_parse_from(["query", "search-codebase", "TODO"]).unwrap();
        match cmd {
            QueryCommand::SearchCodebase(p) => {
                assert_eq!(p.regex, "TODO");
                assert_eq!(p.max_results, 100);
            }
            _ => panic!("expected SearchCodebase"),
        }
    }

    #[test]
    fn parses_get_lines() {
        let cmd =
            QueryCommand::try_parse_from(["query", "get-lines", "a.py", "1", "3"]).unwrap();
        match cmd {
            QueryCommand::GetLines(p) => {
                assert_eq!(p.path, "a.py");
                assert_eq!(p.start, 1);
                assert_eq!(p.end, 3);
            }
            _ => panic!("expected GetLines"),
        }
    }
}
