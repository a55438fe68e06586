use crate::config::Config;

/// Check that the external tools the audio fallback needs are on PATH.
/// Returns human-readable descriptions of whatever is missing.
pub async fn check_dependencies(config: &Config) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&config.tools.yt_dlp, "--version").await {
        missing.push(format!(
            "{} - required for audio download (https://github.com/yt-dlp/yt-dlp)",
            config.tools.yt_dlp
        ));
    }

    // ffmpeg spells its version flag with a single dash
    if !check_command_available(&config.tools.ffmpeg, "-version").await {
        missing.push(format!(
            "{} - required for audio chunking",
            config.tools.ffmpeg
        ));
    }

    missing
}

/// Check if a command is available in PATH.
async fn check_command_available(command: &str, version_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_arg)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_nonexistent_command_is_unavailable() {
        assert!(!check_command_available("definitely-not-a-real-binary", "--version").await);
    }

    #[tokio::test]
    async fn test_missing_tools_are_both_reported() {
        let mut config = Config::default();
        config.tools.yt_dlp = "no-such-yt-dlp".to_string();
        config.tools.ffmpeg = "no-such-ffmpeg".to_string();

        let missing = check_dependencies(&config).await;
        assert_eq!(missing.len(), 2);
    }
}
