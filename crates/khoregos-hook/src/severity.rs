//! Severity classification for the primary `tool_use` event (`spec.md`
//! §4.7). Critical beats warning beats info; a strict-mode violation
//! escalates the event regardless of which files were touched.

use khoregos_store::model::Severity;

pub const CRITICAL_PATTERNS: &[&str] = &[".env*", "**/auth/**", "**/security/**", "**/*.pem", "**/*.key"];

pub const WARNING_MANIFESTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "requirements.txt",
    "go.mod",
    "go.sum",
    "Cargo.toml",
    "Cargo.lock",
    "**/pom.xml",
];

const DANGEROUS_COMMANDS: &[&str] = &["rm", "kill", "chmod", "chown", "curl", "wget"];

pub fn classify(files: &[String], command: Option<&str>, violated: bool) -> Severity {
    if violated || matches_any(CRITICAL_PATTERNS, files) {
        return Severity::Critical;
    }
    if matches_any(WARNING_MANIFESTS, files) || command.is_some_and(is_dangerous_command) {
        return Severity::Warning;
    }
    Severity::Info
}

fn matches_any(patterns: &[&str], files: &[String]) -> bool {
    files
        .iter()
        .any(|file| patterns.iter().any(|pattern| khoregos_boundary::matching::matches(pattern, file)))
}

fn is_dangerous_command(command: &str) -> bool {
    command
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| DANGEROUS_COMMANDS.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_is_critical() {
        let files = vec![".env".to_string()];
        assert_eq!(classify(&files, None, false), Severity::Critical);
    }

    #[test]
    fn violation_forces_critical_regardless_of_files() {
        let files = vec!["notes.md".to_string()];
        assert_eq!(classify(&files, None, true), Severity::Critical);
    }

    #[test]
    fn manifest_file_is_warning() {
        let files = vec!["package.json".to_string()];
        assert_eq!(classify(&files, None, false), Severity::Warning);
    }

    #[test]
    fn dangerous_command_is_warning() {
        let files = vec![];
        assert_eq!(classify(&files, Some("rm -rf /tmp/x"), false), Severity::Warning);
    }

    #[test]
    fn ordinary_edit_is_info() {
        let files = vec!["src/lib.rs".to_string()];
        assert_eq!(classify(&files, None, false), Severity::Info);
    }

    #[test]
    fn nested_env_file_is_still_critical() {
        let files = vec!["src/.env".to_string()];
        assert_eq!(classify(&files, None, false), Severity::Critical);
    }

    #[test]
    fn nested_manifest_file_is_still_warning() {
        let files = vec!["backend/package.json".to_string()];
        assert_eq!(classify(&files, None, false), Severity::Warning);
    }
}
