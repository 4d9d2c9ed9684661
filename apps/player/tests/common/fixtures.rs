//! Lesson payloads used across tests.

use lesson_core::Lesson;
use serde_json::{json, Value};

/// Lesson payload in the API's shape.
pub fn lesson_json(id: i64, exercises: Vec<Value>) -> Value {
    json!({
        "id": id,
        "title": "Animals",
        "unit": {
            "language": {
                "id": 2,
                "name": "Spanish",
                "code": "es",
                "speech_recognition_code": "es-ES"
            }
        },
        "exercises": exercises
    })
}

pub fn lesson(id: i64, exercises: Vec<Value>) -> Lesson {
    lesson_core::parse(&lesson_json(id, exercises).to_string())
        .expect("fixture lesson should parse")
}

pub fn word(id: i64, order: i64, word: &str, translation: &str) -> Value {
    json!({
        "id": id,
        "exercise_type": "word_with_audio",
        "order": order,
        "word": word,
        "translation": translation,
        "audio_url": format!("https://cdn.example/audio/{}.mp3", word)
    })
}

pub fn pronunciation(id: i64, order: i64, word: &str, translation: &str) -> Value {
    json!({
        "id": id,
        "exercise_type": "pronunciation",
        "order": order,
        "word": word,
        "translation": translation
    })
}

/// Image exercise whose second option is the right one.
pub fn images(id: i64, order: i64, word: &str, translation: &str) -> Value {
    json!({
        "id": id,
        "exercise_type": "image_selection",
        "order": order,
        "word": word,
        "translation": translation,
        "images": [
            {"url": "https://cdn.example/img/cat.png", "is_correct": false},
            {"url": format!("https://cdn.example/img/{}.png", translation), "is_correct": true},
            {"url": "https://cdn.example/img/fish.png", "is_correct": false}
        ]
    })
}

pub fn matching(id: i64, order: i64, pairs: &[(&str, &str)]) -> Value {
    let options: Vec<Value> = pairs
        .iter()
        .map(|(w, t)| json!({"word": w, "translation": t}))
        .collect();
    json!({
        "id": id,
        "exercise_type": "matching",
        "order": order,
        "word": "Match the pairs",
        "options": options
    })
}

/// The two-exercise lesson from the product walkthrough: "casa" then "perro".
pub fn casa_perro() -> Lesson {
    lesson(
        7,
        vec![
            word(1, 1, "casa", "house"),
            pronunciation(2, 2, "perro", "dog"),
        ],
    )
}
