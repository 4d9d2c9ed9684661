use clap::Parser;
use std::path::PathBuf;

use crate::config::{self, Config};

/// Play a language lesson in the terminal.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "lesson-player",
    version,
    about = "Lesson Player - practice a lesson in the terminal"
)]
pub struct Cli {
    /// Lesson to fetch from the lesson API
    #[arg(short, long, value_name = "ID", required_unless_present = "file")]
    pub lesson_id: Option<i64>,

    /// Play a lesson from a local JSON file instead of the API
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Lesson API root (overrides LESSON_API_URL)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Pronunciation similarity threshold in [0, 1)
    #[arg(short, long, value_parser = threshold)]
    pub threshold: Option<f64>,

    /// Log the lesson result instead of posting it
    #[arg(long)]
    pub offline: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags take precedence over the environment.
    pub fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url.clone_from(url);
        }
        if let Some(threshold) = self.threshold {
            config.settings.similarity_threshold = threshold;
        }
    }
}

fn threshold(value: &str) -> Result<f64, String> {
    config::parse_threshold("--threshold", value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "lesson-player",
            "--lesson-id",
            "7",
            "--threshold",
            "0.6",
            "--api-url",
            "http://127.0.0.1:9000/api/",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(cli.lesson_id, Some(7));
        assert_eq!(config.settings.similarity_threshold, 0.6);
        assert_eq!(config.api_url, "http://127.0.0.1:9000/api/");
    }

    #[test]
    fn test_file_without_lesson_id() {
        let cli =
            Cli::try_parse_from(["lesson-player", "--file", "lesson.json", "--offline"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("lesson.json")));
        assert!(cli.offline);
        assert!(cli.lesson_id.is_none());
    }

    #[test]
    fn test_lesson_source_required() {
        assert!(Cli::try_parse_from(["lesson-player"]).is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(Cli::try_parse_from(["lesson-player", "-l", "1", "-t", "1.0"]).is_err());
    }
}
