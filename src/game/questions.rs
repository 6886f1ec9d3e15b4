//! Wire types for the daily question feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuestion {
    pub id: String,
    /// Image URL of the cover.
    pub album_cover: String,
    pub album_name: String,
    /// The artist to guess.
    pub correct_answer: String,
    /// Four artists, one of them correct.
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl GameQuestion {
    pub fn is_correct(&self, option: &str) -> bool {
        self.correct_answer == option
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub questions: Vec<GameQuestion>,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// The day a question set belongs to, as the backend expects it.
pub fn question_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub fn questions_url(api_base: &str, date: &str) -> String {
    format!(
        "{}/game/get-questions?date={}",
        api_base.trim_end_matches('/'),
        date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_backend_payload() {
        let json = r#"{
            "questions": [{
                "id": "q1",
                "albumCover": "https://covers.test/blonde.jpg",
                "albumName": "Blonde",
                "correctAnswer": "Frank Ocean",
                "options": ["Frank Ocean", "Tyler, The Creator", "Kendrick Lamar", "Drake"],
                "genre": "R&B",
                "difficulty": "medium",
                "releaseDate": "2016-08-20"
            }],
            "totalQuestions": 1
        }"#;
        let data: GameData = serde_json::from_str(json).unwrap();
        assert_eq!(data.total_questions, 1);
        assert!(data.generated_at.is_none());

        let q = &data.questions[0];
        assert_eq!(q.album_name, "Blonde");
        assert_eq!(q.difficulty, Some(Difficulty::Medium));
        assert!(q.is_correct("Frank Ocean"));
        assert!(!q.is_correct("Drake"));
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let json = r#"{"id":"q2","albumCover":"c","albumName":"n","correctAnswer":"a","options":["a","b","c","d"]}"#;
        let q: GameQuestion = serde_json::from_str(json).unwrap();
        assert!(q.genre.is_none() && q.difficulty.is_none() && q.release_date.is_none());
    }

    #[test]
    fn url_uses_utc_calendar_date() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 23, 30, 0).unwrap();
        let date = question_date(now);
        assert_eq!(date, "2026-03-09");
        assert_eq!(
            questions_url("http://localhost:3030/api/", &date),
            "http://localhost:3030/api/game/get-questions?date=2026-03-09"
        );
    }
}
