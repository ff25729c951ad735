use anyhow::{Context, Result};
use rmcp::model::{ListToolsResult, Tool};
use std::collections::HashSet;
use std::io::Write;

use crate::lister::{ToolLister, ToolRoute};

/// Handle `--list-tools`: fetch every page from `route` and print the tools
/// as a pretty JSON listing on stdout.
pub async fn handle_list_tools<L: ToolLister>(route: &ToolRoute<L>) -> Result<()> {
    let tools = collect_tools(route).await?;
    let listing = ListToolsResult::with_all_items(tools);

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &listing)
        .context("Failed to write tool listing")?;
    writeln!(stdout)?;

    Ok(())
}

/// Follow `next_cursor` until the route has returned every tool. A cursor
/// handed out twice is an error, since following it would never finish.
pub async fn collect_tools<L: ToolLister>(route: &ToolRoute<L>) -> Result<Vec<Tool>> {
    let mut tools = Vec::new();
    let mut cursor = None;
    let mut seen_cursors = HashSet::new();

    loop {
        let request = cursor.map(|cursor| rmcp::model::PaginatedRequestParam {
            cursor: Some(cursor),
        });
        let page = route
            .list_tools(request)
            .await
            .map_err(|e| anyhow::anyhow!("tools/list failed: {}", e.message))?;

        tools.extend(page.tools);

        match page.next_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    anyhow::bail!(
                        "tools/list returned cursor '{next}' twice after {} tools",
                        tools.len()
                    );
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    log::debug!("Collected {} tools", tools.len());
    Ok(tools)
}
