#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin load failed: {0}")]
    LoadFailed(String),

    #[error("plugin hook {hook} failed: {reason}")]
    HookFailed { hook: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, PluginError>;
