use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0";

#[derive(Debug, Clone)]
pub struct Options {
    /// yt-dlp executable used to resolve video URLs
    pub ytdlp_bin: PathBuf,
    pub user_agent: String,
    /// directory offered as the destination when the user gives none
    pub default_output: PathBuf,
    /// leave a half-written file on disk when a transfer fails
    pub keep_partial: bool,
    pub show_progress: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ytdlp_bin: PathBuf::from("yt-dlp"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_output: PathBuf::from("."),
            keep_partial: false,
            show_progress: true,
        }
    }
}
