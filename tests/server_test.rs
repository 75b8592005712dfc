//! Integration tests for the aider-mcp tool router.
//!
//! Drives the router directly with JSON arguments, the way the server's
//! `tools/call` handler does, using tempdir fixtures and (where needed) a
//! real `git` binary or a fake `aider` shell script.

use std::path::{Path, PathBuf};

use serde_json::json;

use aider_mcp::server::ServerContext;
use aider_mcp::tools::ToolRouter;

fn router_for(repo: &Path) -> ToolRouter {
    ToolRouter::new(ServerContext {
        aider_path: "aider".to_owned(),
        repo_path: repo.to_path_buf(),
        config_file: None,
        env_file: None,
    })
}

fn git_in(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("run git");
    assert!(status.success(), "git {args:?} failed");
}

fn init_repo(dir: &Path) {
    git_in(dir, &["init", "-q"]);
    git_in(dir, &["config", "user.email", "test@example.com"]);
    git_in(dir, &["config", "user.name", "Test User"]);
}

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

#[test]
fn json_rpc_request_parses() {
    let req: aider_mcp::server::JsonRpcRequest = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": "git_status", "arguments": { "directory": "/tmp" } }
    }))
    .expect("should parse");

    assert_eq!(req.method, "tools/call");
    assert_eq!(req.id, Some(json!(1)));
}

#[test]
fn json_rpc_response_skips_absent_fields() {
    let resp = aider_mcp::server::JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id: Some(json!(7)),
        result: Some(json!({"ok": true})),
        error: None,
    };
    let text = serde_json::to_string(&resp).expect("serialize");
    assert!(text.contains("\"ok\""));
    assert!(!text.contains("error"));
}

// ---------------------------------------------------------------------------
// Router / dispatch
// ---------------------------------------------------------------------------

#[test]
fn tool_definitions_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let tools = router.list_tools();
    assert_eq!(tools.len(), 6);

    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    for expected in [
        "edit_files",
        "create_files",
        "git_status",
        "extract_code",
        "aider_status",
        "aider_config",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }

    for tool in &tools {
        assert!(!tool.description.is_empty(), "{} has no description", tool.name);
        assert!(tool.input_schema.is_object(), "{} has no schema", tool.name);
    }
}

#[test]
fn unknown_tool_fails_without_killing_the_router() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let result = router
        .call_tool("definitely_not_a_tool", json!({}))
        .expect("dispatch should not error");
    assert!(result.is_error);
    assert!(result.content[0].text.contains("Unknown tool"));
    assert!(result.content[0].text.contains("definitely_not_a_tool"));

    // The router keeps servicing calls afterwards.
    let next = router
        .call_tool("extract_code", json!({ "text": "no fences here" }))
        .expect("call after unknown tool");
    assert!(!next.is_error);
}

#[test]
fn missing_directory_is_rejected_before_any_work() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());
    let ghost = dir.path().join("no-such-subdir");

    for (tool, args) in [
        (
            "edit_files",
            json!({ "directory": &ghost, "message": "do something" }),
        ),
        (
            "create_files",
            json!({ "directory": &ghost, "files": { "a.txt": "x" } }),
        ),
        ("git_status", json!({ "directory": &ghost })),
    ] {
        let result = router.call_tool(tool, args).expect("dispatch");
        assert!(result.is_error, "{tool} should fail");
        assert!(
            result.content[0].text.contains("does not exist"),
            "{tool}: {}",
            result.content[0].text
        );
    }
}

#[test]
fn missing_required_argument_is_a_failure_envelope_at_the_boundary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    // `message` missing — the handler errors, which the server boundary
    // turns into an envelope; here we just check it surfaces as Err, not
    // a panic.
    let result = router.call_tool("edit_files", json!({ "directory": "." }));
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// extract_code
// ---------------------------------------------------------------------------

#[test]
fn extract_code_returns_blocks_in_source_order_with_tags() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let text = "Intro.\n```python\nprint('hi')\n```\nMiddle.\n```javascript\nconsole.log('hi');\n```\nEnd.";
    let result = router
        .call_tool("extract_code", json!({ "text": text }))
        .expect("extract");

    assert!(!result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("Extracted 2 code blocks"));

    let py = body.find("Block 1 (python)").expect("python block");
    let js = body.find("Block 2 (javascript)").expect("javascript block");
    assert!(py < js);
    assert!(body.contains("print('hi')"));
    assert!(body.contains("console.log('hi');"));
}

#[test]
fn extract_code_saves_numbered_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());
    let out_dir = dir.path().join("snippets");

    let text = "```rust\nfn main() {}\n```\n```\nplain text\n```";
    let result = router
        .call_tool(
            "extract_code",
            json!({ "text": text, "save_to_directory": &out_dir }),
        )
        .expect("extract");

    assert!(!result.is_error);
    assert!(result.content[0].text.contains("Saved 2 files"));

    let rust_block = std::fs::read_to_string(out_dir.join("code_block_1.rust"))
        .expect("rust block file");
    assert!(rust_block.contains("fn main() {}"));
    assert!(out_dir.join("code_block_2.txt").exists());
}

#[test]
fn extract_code_without_fences_is_informational() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let result = router
        .call_tool("extract_code", json!({ "text": "just prose" }))
        .expect("extract");
    assert!(!result.is_error);
    assert!(result.content[0].text.contains("No code blocks found"));
}

// ---------------------------------------------------------------------------
// create_files
// ---------------------------------------------------------------------------

#[test]
fn create_files_writes_content_and_skips_escapes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let result = router
        .call_tool(
            "create_files",
            json!({
                "directory": dir.path(),
                "files": {
                    "inside.txt": "alpha",
                    "sub/dir/nested.txt": "beta\nwith lines\n",
                    "../escape.txt": "should never land"
                },
                "git_commit": false
            }),
        )
        .expect("create");

    assert!(!result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("Created 2 files:"));
    assert!(body.contains("- inside.txt"));
    assert!(body.contains("Skipped 1 files:"));
    assert!(body.contains("- ../escape.txt"));

    // Byte-identical content for the files that landed.
    assert_eq!(
        std::fs::read_to_string(dir.path().join("inside.txt")).expect("read"),
        "alpha"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("sub/dir/nested.txt")).expect("read"),
        "beta\nwith lines\n"
    );
    assert!(!dir.path().join("..").join("escape.txt").exists());
}

#[test]
fn create_files_overwrites_existing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("present.txt"), "old").expect("seed");
    let router = router_for(dir.path());

    let result = router
        .call_tool(
            "create_files",
            json!({
                "directory": dir.path(),
                "files": { "present.txt": "new" },
                "git_commit": false
            }),
        )
        .expect("create");

    assert!(!result.is_error);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("present.txt")).expect("read"),
        "new"
    );
}

#[test]
fn create_files_reports_when_directory_is_not_a_repo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let result = router
        .call_tool(
            "create_files",
            json!({
                "directory": dir.path(),
                "files": { "a.txt": "content" },
                "git_commit": true
            }),
        )
        .expect("create");

    assert!(!result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("Created 1 files:"));
    assert!(body.contains("not committed: not a git repository"));
    assert!(dir.path().join("a.txt").exists());
}

#[test]
fn create_files_commits_and_distinguishes_nothing_to_commit() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_repo(dir.path());
    let router = router_for(dir.path());

    let args = json!({
        "directory": dir.path(),
        "files": { "generated.txt": "payload" },
        "message": "Add generated file",
        "git_commit": true
    });

    let first = router.call_tool("create_files", args.clone()).expect("create");
    assert!(!first.is_error);
    assert!(
        first.content[0].text.contains("Committed files:"),
        "unexpected report: {}",
        first.content[0].text
    );

    // Same content again: the write succeeds but git has nothing new.
    let second = router.call_tool("create_files", args).expect("create again");
    assert!(!second.is_error);
    assert!(
        second.content[0].text.contains("No changes to commit."),
        "unexpected report: {}",
        second.content[0].text
    );
}

// ---------------------------------------------------------------------------
// git_status
// ---------------------------------------------------------------------------

#[test]
fn git_status_rejects_a_plain_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router_for(dir.path());

    let result = router
        .call_tool("git_status", json!({ "directory": dir.path() }))
        .expect("status");
    assert!(result.is_error);
    assert!(result.content[0].text.contains("not a git repository"));
}

#[test]
fn git_status_reports_a_clean_tree_distinctly() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_repo(dir.path());
    std::fs::write(dir.path().join("tracked.txt"), "v1\n").expect("seed");
    git_in(dir.path(), &["add", "tracked.txt"]);
    git_in(dir.path(), &["commit", "-q", "-m", "initial commit"]);

    let router = router_for(dir.path());
    let result = router
        .call_tool("git_status", json!({ "directory": dir.path() }))
        .expect("status");

    assert!(!result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("Working directory is clean"));
    assert!(body.contains("Recent Commits"));
    assert!(body.contains("initial commit"));
}

#[test]
fn git_status_categorizes_modified_and_untracked_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_repo(dir.path());
    std::fs::write(dir.path().join("tracked.txt"), "v1\n").expect("seed");
    git_in(dir.path(), &["add", "tracked.txt"]);
    git_in(dir.path(), &["commit", "-q", "-m", "initial commit"]);

    std::fs::write(dir.path().join("tracked.txt"), "v2\n").expect("modify");
    std::fs::write(dir.path().join("fresh.txt"), "new\n").expect("untracked");

    let router = router_for(dir.path());
    let result = router
        .call_tool("git_status", json!({ "directory": dir.path() }))
        .expect("status");

    assert!(!result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("## Modified Files"));
    assert!(body.contains("- tracked.txt"));
    assert!(body.contains("## Untracked Files"));
    assert!(body.contains("- fresh.txt"));
    assert!(!body.contains("Working directory is clean"));
}

// ---------------------------------------------------------------------------
// edit_files (driven by a fake aider script)
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

#[cfg(unix)]
fn router_with_aider(repo: &Path, aider: &Path) -> ToolRouter {
    ToolRouter::new(ServerContext {
        aider_path: aider.to_string_lossy().into_owned(),
        repo_path: repo.to_path_buf(),
        config_file: None,
        env_file: None,
    })
}

#[cfg(unix)]
#[test]
fn edit_files_pipes_instructions_and_reports_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work = dir.path().join("work");
    std::fs::create_dir(&work).expect("mkdir");

    // Fake aider: record args and stdin into the working directory.
    let aider = write_script(
        dir.path(),
        "fake-aider",
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > args.txt\ncat > instructions.txt\necho Applied the requested edit.\n",
    );

    let router = router_with_aider(&work, &aider);
    let result = router
        .call_tool(
            "edit_files",
            json!({
                "directory": &work,
                "message": "add a hello function",
                "options": ["--no-auto-commit", "--model=gpt-4"]
            }),
        )
        .expect("edit");

    assert!(!result.is_error, "{}", result.content[0].text);
    assert!(result.content[0].text.contains("Code changes completed successfully"));
    assert!(result.content[0].text.contains("Applied the requested edit."));

    // The fake ran inside the target directory (DirGuard) with the built
    // argument vector and the piped instructions.
    let args = std::fs::read_to_string(work.join("args.txt")).expect("args recorded");
    assert!(args.contains("--yes-always"));
    assert!(args.contains("--no-auto-commit"));
    assert!(args.lines().any(|l| l == "--model"));
    assert!(args.lines().any(|l| l == "gpt-4"));

    let instructions =
        std::fs::read_to_string(work.join("instructions.txt")).expect("stdin recorded");
    assert_eq!(instructions, "add a hello function");
}

#[cfg(unix)]
#[test]
fn edit_files_classifies_stderr_error_markers_despite_exit_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work = dir.path().join("work");
    std::fs::create_dir(&work).expect("mkdir");

    let aider = write_script(
        dir.path(),
        "fake-aider-err",
        "#!/bin/sh\ncat > /dev/null\necho partial output\necho 'Error: model unavailable' >&2\nexit 0\n",
    );

    let router = router_with_aider(&work, &aider);
    let result = router
        .call_tool(
            "edit_files",
            json!({ "directory": work, "message": "anything" }),
        )
        .expect("edit");

    assert!(result.is_error);
    let body = &result.content[0].text;
    assert!(body.contains("Error making code changes"));
    assert!(body.contains("model unavailable"));
    assert!(body.contains("partial output"));
}

#[cfg(unix)]
#[test]
fn edit_files_reports_nonzero_exit_as_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let work = dir.path().join("work");
    std::fs::create_dir(&work).expect("mkdir");

    let aider = write_script(
        dir.path(),
        "fake-aider-fail",
        "#!/bin/sh\ncat > /dev/null\necho boom >&2\nexit 2\n",
    );

    let router = router_with_aider(&work, &aider);
    let result = router
        .call_tool(
            "edit_files",
            json!({ "directory": work, "message": "anything" }),
        )
        .expect("edit");

    assert!(result.is_error);
    assert!(result.content[0].text.contains("status 2"));
}

#[test]
fn edit_files_reports_missing_aider_distinctly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = ToolRouter::new(ServerContext {
        aider_path: "aider-mcp-test-missing-binary".to_owned(),
        repo_path: dir.path().to_path_buf(),
        config_file: None,
        env_file: None,
    });

    let result = router
        .call_tool(
            "edit_files",
            json!({ "directory": dir.path(), "message": "anything" }),
        )
        .expect("edit");

    assert!(result.is_error);
    assert!(result.content[0].text.contains("executable not found"));
}

// ---------------------------------------------------------------------------
// aider_status / aider_config
// ---------------------------------------------------------------------------

#[test]
fn aider_status_with_missing_executable_is_an_error_envelope() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = ToolRouter::new(ServerContext {
        aider_path: "aider-mcp-test-missing-binary".to_owned(),
        repo_path: dir.path().to_path_buf(),
        config_file: None,
        env_file: None,
    });

    let result = router.call_tool("aider_status", json!({})).expect("status");
    assert!(result.is_error);
    assert!(result.content[0].text.contains("not found"));
}

#[cfg(unix)]
#[test]
fn aider_status_reports_version_and_environment_presence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let aider = write_script(
        dir.path(),
        "fake-aider-version",
        "#!/bin/sh\necho 'aider 0.42.0'\n",
    );

    let router = router_with_aider(dir.path(), &aider);
    let result = router
        .call_tool("aider_status", json!({ "check_environment": true }))
        .expect("status");

    assert!(!result.is_error);
    let report: serde_json::Value =
        serde_json::from_str(&result.content[0].text).expect("JSON report");
    assert_eq!(report["aider"]["installed"], json!(true));
    assert_eq!(report["aider"]["version"], json!("aider 0.42.0"));
    assert_eq!(report["directory"]["exists"], json!(true));
    // Presence flags only, never values.
    assert!(report["environment"]["OPENAI_API_KEY"].is_boolean());
    assert!(report["environment"]["ANTHROPIC_API_KEY"].is_boolean());
}

#[test]
fn aider_config_reports_merged_config_and_candidates() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join(".aider.conf.yml"),
        "model: test-model-xyz\nauto-commits: false\n",
    )
    .expect("write config");
    std::fs::write(dir.path().join(".env"), "AIDER_TEST_KEY=secret-value\n").expect("write env");

    let router = router_for(dir.path());
    let result = router.call_tool("aider_config", json!({})).expect("config");

    assert!(!result.is_error);
    let report: serde_json::Value =
        serde_json::from_str(&result.content[0].text).expect("JSON report");

    // The directory-level source wins over anything lower in the chain.
    assert_eq!(report["aider_config"]["model"], json!("test-model-xyz"));
    assert_eq!(report["aider_config"]["auto-commits"], json!(false));

    // Env var names are reported, values are not.
    let found = report["environment_variables"]["found"]
        .as_array()
        .expect("found list");
    assert!(found.contains(&json!("AIDER_TEST_KEY")));
    assert!(!result.content[0].text.contains("secret-value"));

    // The directory candidate exists; labels cover the whole chain.
    let candidates = report["config_files"].as_array().expect("candidates");
    let dir_entry = candidates
        .iter()
        .find(|c| c["location"] == json!("directory"))
        .expect("directory candidate");
    assert_eq!(dir_entry["exists"], json!(true));
}
