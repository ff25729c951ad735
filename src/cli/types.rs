use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;

use crate::install::StrictOptions;
use crate::schema::DEFAULT_MAX_DEPTH;

/// KODEGEN strict-schema proxy - MCP tools that pass OpenAI strict mode
///
/// Serves the tools of an upstream MCP server (or a static JSON catalog) over
/// stdio, rewriting every tool input schema so that each object-typed
/// subschema sets `additionalProperties: false`.
///
/// Examples:
///   kodegen-strict -- npx -y @modelcontextprotocol/server-filesystem /tmp
///   kodegen-strict --catalog tools.json --list-tools
#[derive(Parser, Debug)]
#[command(name = "kodegen-strict")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Serve tools from a static JSON catalog instead of an upstream server
    ///
    /// JSON format:
    /// ```json
    /// { "tools": [ { "name": "...", "description": "...", "inputSchema": { ... } } ] }
    /// ```
    #[arg(long, value_name = "PATH", conflicts_with = "upstream")]
    pub catalog: Option<PathBuf>,

    /// Maximum schema nesting depth; deeper schemas are served unchanged
    /// Can also be set via `KODEGEN_STRICT_MAX_DEPTH` environment variable
    #[arg(
        long,
        value_name = "DEPTH",
        env = "KODEGEN_STRICT_MAX_DEPTH",
        default_value_t = DEFAULT_MAX_DEPTH
    )]
    pub max_depth: usize,

    /// Also normalize tool output schemas
    /// Can also be set via `KODEGEN_STRICT_OUTPUT_SCHEMAS` environment variable
    #[arg(long, env = "KODEGEN_STRICT_OUTPUT_SCHEMAS")]
    pub output_schemas: bool,

    /// Print the normalized tool listing as JSON and exit
    #[arg(long)]
    pub list_tools: bool,

    /// Upstream MCP server command and its arguments (after `--`)
    #[arg(last = true, value_name = "UPSTREAM")]
    pub upstream: Vec<String>,
}

/// Where the tools come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolSource {
    Catalog(PathBuf),
    Upstream { program: String, args: Vec<String> },
}

impl Cli {
    /// Resolve the tool source (exactly one of `--catalog` or `-- <UPSTREAM>`)
    pub fn source(&self) -> anyhow::Result<ToolSource> {
        if let Some(ref path) = self.catalog {
            return Ok(ToolSource::Catalog(path.clone()));
        }

        match self.upstream.split_first() {
            Some((program, args)) => Ok(ToolSource::Upstream {
                program: program.clone(),
                args: args.to_vec(),
            }),
            None => bail!("No tool source: pass --catalog <PATH> or an upstream command after `--`"),
        }
    }

    /// Options for the strict wrapper
    pub fn strict_options(&self) -> StrictOptions {
        StrictOptions {
            max_depth: self.max_depth,
            output_schemas: self.output_schemas,
        }
    }
}
