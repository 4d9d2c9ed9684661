//! Line-oriented terminal front end.

use lesson_core::player::{Notice, Phase};
use lesson_core::{ExerciseKind, Player, PlayerError, Verdict};
use std::fmt::Write as _;
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::adapters::NoticeSink;
use crate::session::{Command, SessionHandle};
use crate::speech::TypedRecognizer;

pub const HELP: &str = "\
Commands:
  answer <text>   translate the word
  pick <n>        choose image n
  word <w>        select a word to match
  tr <t>          select a translation to match
  record          speak the word (type what you said on the next line)
  stop            cancel the recording
  play            hear the word again
  say <text>      hear any text in the lesson language
  retry           resend the lesson result after a failure
  quit            leave the lesson";

/// Heading for matching exercises authored without one.
const MATCHING_PROMPT: &str = "Match each word with its translation";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{0}' is not an option number")]
    BadOption(String),
}

/// Parse one input line. `pick` numbers options from 1.
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let argument = |name: &'static str| {
        if rest.is_empty() {
            Err(InputError::MissingArgument(name))
        } else {
            Ok(rest.to_string())
        }
    };

    match verb.to_lowercase().as_str() {
        "answer" | "a" => argument("answer").map(Command::Answer),
        "pick" | "p" => {
            let n = argument("pick")?;
            match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(Command::Pick(n - 1)),
                _ => Err(InputError::BadOption(n)),
            }
        }
        "word" | "w" => argument("word").map(Command::Word),
        "tr" | "t" => argument("tr").map(Command::Translation),
        "say" => argument("say").map(Command::Say),
        "record" | "r" => Ok(Command::Record),
        "stop" => Ok(Command::CancelRecording),
        "play" | "replay" => Ok(Command::Replay),
        "retry" => Ok(Command::RetryCompletion),
        "quit" | "exit" | "q" => Ok(Command::Close),
        other => Err(InputError::Unknown(other.to_string())),
    }
}

/// Describe the current exercise and what the learner can do with it.
pub fn render_exercise(player: &Player) -> String {
    let mut out = String::new();

    let (Some(index), Some(exercise)) = (player.index(), player.current_exercise()) else {
        return out;
    };

    let _ = writeln!(
        out,
        "\n[{}/{}] {}  ({}%, score {}, streak {})",
        index + 1,
        player.total_exercises(),
        player.lesson().title,
        player.progress_percent(),
        player.score(),
        player.streak()
    );

    match exercise.kind() {
        ExerciseKind::WordWithAudio => {
            let _ = writeln!(out, "  Translate: {}", exercise.word);
        }
        ExerciseKind::ImageSelection => {
            let _ = writeln!(out, "  Pick the picture of: {}", exercise.word);
            for (i, image) in exercise.images().iter().enumerate() {
                let _ = writeln!(out, "    {}. {}", i + 1, image.url);
            }
        }
        ExerciseKind::Pronunciation => {
            let _ = writeln!(out, "  Say: {}  ({})", exercise.word, exercise.translation);
            if player.is_recording() {
                let _ = writeln!(out, "  Listening... type what you said");
            }
        }
        ExerciseKind::Matching => {
            let prompt = match exercise.word.trim() {
                "" => MATCHING_PROMPT,
                word => word,
            };
            let _ = writeln!(out, "  {}", prompt);
            let matched = player.matched_pairs();

            let words: Vec<&str> = exercise
                .pairs()
                .iter()
                .filter(|p| !matched.contains(p))
                .map(|p| p.word.as_str())
                .collect();
            let mut translations: Vec<&str> = exercise
                .pairs()
                .iter()
                .filter(|p| !matched.contains(p))
                .map(|p| p.translation.as_str())
                .collect();
            translations.sort_unstable();

            let _ = writeln!(out, "    words:        {}", mark(&words, player.selected_word()));
            let _ = writeln!(
                out,
                "    translations: {}",
                mark(&translations, player.selected_translation())
            );
            if !matched.is_empty() {
                let done: Vec<String> = matched
                    .iter()
                    .map(|p| format!("{} = {}", p.word, p.translation))
                    .collect();
                let _ = writeln!(out, "    matched:      {}", done.join(", "));
            }
        }
    }

    out
}

fn mark(items: &[&str], selected: Option<&str>) -> String {
    items
        .iter()
        .map(|item| {
            if Some(*item) == selected {
                format!("[{}]", item)
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn verdict_line(verdict: Verdict, player: &Player) -> String {
    match verdict {
        Verdict::Correct => "  ✓ Correct!".to_string(),
        Verdict::Incorrect => match player.current_exercise() {
            Some(exercise) if exercise.kind() == ExerciseKind::WordWithAudio => {
                format!("  ✗ Not quite. The answer is: {}", exercise.translation)
            }
            _ => "  ✗ Try again".to_string(),
        },
    }
}

/// Prints notices and redraws the exercise when the session changes.
#[derive(Default)]
pub struct TerminalNotices {
    last_view: Mutex<String>,
}

impl TerminalNotices {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoticeSink for TerminalNotices {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::Streak { count } => println!("  🔥 {} in a row!", count),
            Notice::RecognitionFailed { error } => println!("  🎤 {}", error),
            Notice::CompletionFailed { message } => {
                println!("  Could not save your progress: {} (type 'retry')", message)
            }
            Notice::LessonCompleted { summary } => {
                println!(
                    "\nLesson complete! {}/{} correct, {} XP earned, best streak {}.",
                    summary.correct_answers,
                    summary.total_exercises,
                    summary.experience,
                    summary.best_streak
                );
            }
        }
    }

    fn rejected(&self, error: &PlayerError) {
        println!("  ! {}", error);
    }

    fn refresh(&self, player: &Player) {
        let view = match player.phase() {
            Phase::Feedback { verdict, .. } => verdict_line(verdict, player),
            Phase::Presenting { .. } => {
                let mut view = render_exercise(player);
                if let Some(verdict) = player.feedback() {
                    view.push_str(&verdict_line(verdict, player));
                }
                view
            }
            Phase::Completing => match player.completion_error() {
                Some(_) => String::new(),
                None => "\nSaving your progress...".to_string(),
            },
            Phase::Closed => String::new(),
        };

        let mut last = self.last_view.lock().unwrap_or_else(|e| e.into_inner());
        if !view.is_empty() && *last != view {
            println!("{}", view.trim_end());
        }
        *last = view;
    }
}

/// Feed stdin into the session until it ends or input closes.
///
/// Lines are read on a dedicated thread so a pending read never holds up
/// runtime shutdown. While a recording is in flight the next line goes to the
/// recognizer.
pub async fn read_input(handle: SessionHandle, recognizer: Arc<TypedRecognizer>) {
    let (tx, mut lines) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "failed to read input");
                    break;
                }
            }
        }
    });

    while let Some(line) = lines.recv().await {
        if recognizer.is_listening() && recognizer.provide(&line) {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if line.trim().eq_ignore_ascii_case("help") {
            println!("{}", HELP);
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                if !handle.send(command) {
                    return;
                }
            }
            Err(error) => println!("  {}", error),
        }
    }

    handle.send(Command::Close);
}
