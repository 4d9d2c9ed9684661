//! Session runtime tests.
//!
//! Sessions run against fake adapters with a paused clock, so feedback
//! delays and recognition latency elapse instantly and deterministically.

mod common;

use std::time::Duration;

use lesson_core::player::Notice;
use lesson_core::speech::RecognitionError;
use lesson_core::{ExerciseKind, PlayerError};
use lesson_player::session::{Command, SessionOutcome};
use pretty_assertions::assert_eq;

use common::fixtures;
use common::{wait, FakeCompletion, FakeRecognizer, TestContext};

fn completed(outcome: SessionOutcome) -> lesson_core::LessonSummary {
    match outcome {
        SessionOutcome::Completed(summary) => summary,
        SessionOutcome::Abandoned(summary) => panic!("lesson was abandoned: {:?}", summary),
    }
}

/// Test the walkthrough lesson: typed "house", spoken "pero" for "perro".
#[tokio::test(start_paused = true)]
async fn test_casa_perro_scenario() {
    let ctx = TestContext::new(
        FakeRecognizer::new(Duration::from_millis(800), vec![Ok("pero".into())]),
        FakeCompletion::default(),
    );
    let (handle, session) = ctx.spawn(fixtures::casa_perro());

    assert!(handle.send(Command::Answer("house".into())));
    wait(600).await;
    assert!(handle.send(Command::Record));

    let summary = completed(session.await.unwrap());
    assert_eq!(summary.correct_answers, 2);
    assert_eq!(summary.score, 20);
    assert_eq!(summary.best_streak, 2);
    assert_eq!(summary.experience, 100);

    assert_eq!(ctx.completion.calls(), vec![(7, 100)]);
    assert_eq!(ctx.notices.streaks(), vec![1, 2]);
    assert_eq!(ctx.synth.spoken_texts(), vec!["casa", "perro"]);
    assert_eq!(*ctx.recognizer.languages.lock().unwrap(), vec!["es-ES"]);
    assert!(matches!(
        ctx.notices.notices().last(),
        Some(Notice::LessonCompleted { .. })
    ));
}

/// Test a lesson using every exercise type, with one miss.
#[tokio::test(start_paused = true)]
async fn test_mixed_lesson_with_one_miss() {
    let ctx = TestContext::new(
        FakeRecognizer::new(Duration::from_millis(300), vec![Ok("gato".into())]),
        FakeCompletion::default(),
    );
    let lesson = fixtures::lesson(
        11,
        vec![
            fixtures::word(1, 1, "hola", "hello"),
            fixtures::images(2, 2, "perro", "dog"),
            fixtures::matching(3, 3, &[("uno", "one"), ("dos", "two")]),
            fixtures::pronunciation(4, 4, "gato", "cat"),
        ],
    );
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Answer("goodbye".into()));
    wait(600).await;
    handle.send(Command::Pick(1));
    wait(600).await;
    handle.send(Command::Word("dos".into()));
    handle.send(Command::Translation("two".into()));
    handle.send(Command::Translation("one".into()));
    handle.send(Command::Word("uno".into()));
    wait(1100).await;
    handle.send(Command::Record);

    let summary = completed(session.await.unwrap());
    assert_eq!(summary.correct_answers, 3);
    assert_eq!(summary.experience, 75);
    // image 10 + two pairs at 5 + pronunciation 10
    assert_eq!(summary.score, 30);
    assert_eq!(ctx.completion.calls(), vec![(11, 75)]);
    assert_eq!(ctx.notices.streaks(), vec![1, 2, 3, 4]);
    assert!(ctx.notices.rejections().is_empty());
}

/// Test that closing during feedback cancels the advance and skips completion.
#[tokio::test(start_paused = true)]
async fn test_close_before_timer_fires() {
    let ctx = TestContext::silent();
    let lesson = fixtures::lesson(3, vec![fixtures::word(1, 1, "casa", "house")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Answer("house".into()));
    handle.send(Command::Close);

    match session.await.unwrap() {
        SessionOutcome::Abandoned(summary) => assert_eq!(summary.correct_answers, 1),
        other => panic!("expected abandoned session, got {:?}", other),
    }

    wait(5_000).await;
    assert!(ctx.completion.calls().is_empty());
    assert!(!handle.send(Command::Replay));
}

/// Test that a cancelled recording never grades its late transcript.
#[tokio::test(start_paused = true)]
async fn test_cancelled_recording_is_discarded() {
    let ctx = TestContext::new(
        FakeRecognizer::new(
            Duration::from_secs(3),
            vec![Ok("perro".into()), Ok("perro".into())],
        ),
        FakeCompletion::default(),
    );
    let lesson = fixtures::lesson(4, vec![fixtures::pronunciation(1, 1, "perro", "dog")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Record);
    wait(1_000).await;
    handle.send(Command::CancelRecording);
    wait(5_000).await;

    assert!(ctx.notices.streaks().is_empty());
    assert!(ctx.completion.calls().is_empty());
    // one stop before the capture starts, one for the cancel
    assert_eq!(ctx.recognizer.stop_count(), 2);

    handle.send(Command::Record);
    let summary = completed(session.await.unwrap());
    assert_eq!(summary.experience, 100);
}

/// Test that a pronunciation miss keeps the exercise open for another try.
#[tokio::test(start_paused = true)]
async fn test_pronunciation_miss_then_retry() {
    let ctx = TestContext::new(
        FakeRecognizer::new(
            Duration::from_millis(200),
            vec![Ok("gato".into()), Ok("perro".into())],
        ),
        FakeCompletion::default(),
    );
    let lesson = fixtures::lesson(5, vec![fixtures::pronunciation(1, 1, "perro", "dog")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Record);
    wait(2_000).await;
    assert!(ctx.notices.streaks().is_empty());

    handle.send(Command::Record);
    let summary = completed(session.await.unwrap());
    assert_eq!(summary.correct_answers, 1);
    assert_eq!(summary.experience, 100);
    assert_eq!(ctx.notices.streaks(), vec![1]);
}

/// Test that recognition failures are surfaced and the learner can try again.
#[tokio::test(start_paused = true)]
async fn test_recognition_failure_is_reported() {
    let ctx = TestContext::new(
        FakeRecognizer::new(
            Duration::from_millis(200),
            vec![Err(RecognitionError::NotAllowed), Ok("perro".into())],
        ),
        FakeCompletion::default(),
    );
    let lesson = fixtures::lesson(6, vec![fixtures::pronunciation(1, 1, "perro", "dog")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Record);
    wait(500).await;
    assert_eq!(
        ctx.notices.notices(),
        vec![Notice::RecognitionFailed {
            error: RecognitionError::NotAllowed
        }]
    );

    handle.send(Command::Record);
    completed(session.await.unwrap());
}

/// Test that a failed completion can be retried.
#[tokio::test(start_paused = true)]
async fn test_completion_failure_then_retry() {
    let ctx = TestContext::new(
        FakeRecognizer::new(Duration::from_millis(100), Vec::new()),
        FakeCompletion::scripted(vec![Err("Lesson completion failed".into())]),
    );
    let lesson = fixtures::lesson(8, vec![fixtures::word(1, 1, "casa", "house")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Answer("house".into()));
    wait(600).await;
    assert!(ctx.notices.notices().contains(&Notice::CompletionFailed {
        message: "Lesson completion failed".into()
    }));

    handle.send(Command::RetryCompletion);
    let summary = completed(session.await.unwrap());
    assert_eq!(summary.experience, 100);
    assert_eq!(ctx.completion.calls(), vec![(8, 100), (8, 100)]);
}

/// Test that commands which do not fit the exercise are rejected without side effects.
#[tokio::test(start_paused = true)]
async fn test_wrong_commands_are_rejected() {
    let ctx = TestContext::silent();
    let lesson = fixtures::lesson(9, vec![fixtures::word(1, 1, "casa", "house")]);
    let (handle, session) = ctx.spawn(lesson);

    handle.send(Command::Pick(0));
    handle.send(Command::Record);
    handle.send(Command::RetryCompletion);
    handle.send(Command::Close);
    session.await.unwrap();

    assert_eq!(
        ctx.notices.rejections(),
        vec![
            PlayerError::WrongExerciseKind {
                expected: "image_selection",
                actual: ExerciseKind::WordWithAudio
            },
            PlayerError::WrongExerciseKind {
                expected: "pronunciation",
                actual: ExerciseKind::WordWithAudio
            },
            PlayerError::NotCompleting,
        ]
    );
    assert!(ctx.completion.calls().is_empty());
}

/// Test that replay and say go through the synthesizer in the lesson language.
#[tokio::test(start_paused = true)]
async fn test_replay_and_say() {
    let ctx = TestContext::silent();
    let (handle, session) = ctx.spawn(fixtures::casa_perro());

    // each new utterance interrupts the previous one, so let each play first
    wait(10).await;
    handle.send(Command::Replay);
    wait(10).await;
    handle.send(Command::Say("buenos dias".into()));
    wait(10).await;
    handle.send(Command::Close);
    session.await.unwrap();

    assert_eq!(ctx.synth.spoken_texts(), vec!["casa", "casa", "buenos dias"]);
    assert!(ctx
        .synth
        .spoken
        .lock()
        .unwrap()
        .iter()
        .all(|(_, language)| language == "es-ES"));
}
