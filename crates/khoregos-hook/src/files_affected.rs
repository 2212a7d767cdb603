//! Files-affected derivation (`spec.md` §4.7): most tools carry an
//! explicit path; shell-invoking tools don't, so their command text is
//! tokenized with a conservative heuristic that skips flags, URLs, JSON
//! fragments, device paths, and known command names.

const MAX_FILES: usize = 10;

const KNOWN_COMMANDS: &[&str] = &[
    "rm", "ls", "cat", "echo", "git", "npm", "npx", "yarn", "pnpm", "cargo", "python", "python3",
    "node", "pip", "pip3", "curl", "wget", "chmod", "chown", "kill", "mkdir", "cp", "mv", "touch",
    "grep", "find", "sed", "awk", "tar", "make", "go", "docker", "sudo", "bash", "sh",
];

pub fn derive_files_affected(tool_input: &serde_json::Value) -> Vec<String> {
    if let Some(path) = direct_path(tool_input) {
        return vec![path];
    }
    if let Some(command) = tool_input.get("command").and_then(|v| v.as_str()) {
        return extract_from_command(command);
    }
    Vec::new()
}

fn direct_path(tool_input: &serde_json::Value) -> Option<String> {
    ["file_path", "path", "filename"]
        .iter()
        .find_map(|key| tool_input.get(*key).and_then(|v| v.as_str()).map(str::to_string))
}

fn extract_from_command(command: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (index, raw) in command.split_whitespace().enumerate() {
        let token = raw.trim_matches(|c| c == '"' || c == '\'' || c == ';' || c == ',');
        if token.is_empty() {
            continue;
        }
        if index == 0 && KNOWN_COMMANDS.contains(&token) {
            continue;
        }
        if token.starts_with('-') {
            continue;
        }
        if token.contains("://") {
            continue;
        }
        if token.starts_with('{') || token.starts_with('[') {
            continue;
        }
        if token.starts_with("/dev/") {
            continue;
        }
        // Rejects HTTP headers ("Content-Type:") and scheme fragments;
        // bare paths never contain a colon.
        if token.contains(':') {
            continue;
        }
        if KNOWN_COMMANDS.contains(&token) {
            continue;
        }
        if !token.contains('/') && !token.starts_with('.') {
            continue;
        }
        out.push(token.to_string());
        if out.len() >= MAX_FILES {
            break;
        }
    }
    out
}
