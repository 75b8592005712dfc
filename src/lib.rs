//! `aider-mcp` — MCP server wrapping the aider CLI.
//!
//! Exposes aider's AI pair-programming abilities, plus a handful of
//! repository helpers, as Model Context Protocol tools over stdio
//! (JSON-RPC 2.0, newline-delimited). The editing intelligence lives in
//! the external `aider` process; this crate orchestrates configuration
//! resolution, command construction, subprocess lifecycle, and the
//! per-call working-directory switch.
//!
//! # Tools
//!
//! - `edit_files` — run aider against a directory with piped instructions
//! - `create_files` — write new files, optionally staging and committing
//! - `git_status` — categorized repository status
//! - `extract_code` — fenced-code-block extraction from markdown text
//! - `aider_status` — installation / environment diagnostics
//! - `aider_config` — configuration introspection
//!
//! # Architecture
//!
//! ```text
//! stdin (JSON-RPC) → server → ToolRouter → tool handlers
//!                                 │            ├─ config   (layered resolution)
//!                                 │            ├─ command  (options → argv)
//!                                 │            ├─ workdir  (scoped chdir + lock)
//!                                 │            └─ process  (vector exec, aider/git)
//! stdout (JSON-RPC) ←─────────────┘
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod git;
pub mod process;
pub mod server;
pub mod tools;
pub mod workdir;

pub use error::{AiderError, AiderResult};
pub use server::{ServerContext, run_mcp_server};
