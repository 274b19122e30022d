// src/models/question.rs

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{html::clean_html, subject::normalize_subject};

/// Question difficulty. Stored as its display name ('Easy', 'Medium', 'Hard').
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy")]
    Easy,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    /// Case-insensitive, so query strings like `?difficulty=easy` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// A multiple-choice question owned by the question bank.
///
/// Also used as the frozen snapshot inside an assembled test, which is why it
/// (de)serializes with the correct answer included. Never send it to a
/// submitter; use [`PublicQuestion`] instead.
///
/// `topic`, `question` and the option texts are sanitized HTML fragments
/// (see [`clean_html`]): `&` and `<` in imported text come back as `&amp;`
/// and `&lt;`. Ids, subject and option keys are plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,

    /// The text content of the question.
    pub question: String,

    /// Option key ("A".."D") to option text.
    pub options: BTreeMap<String, String>,

    /// Key into `options`.
    pub correct_answer: String,
}

impl Question {
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            question_id: self.question_id.clone(),
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            difficulty: self.difficulty,
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

/// DTO for sending a question to a test taker (excludes the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub question_id: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub options: BTreeMap<String, String>,
}

/// Number of questions available per subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubjectCount {
    pub subject: String,
    pub questions: i64,
}

/// DTO for importing a question into the bank.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_answer_key))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 64))]
    pub question_id: String,
    #[validate(length(min = 1, max = 64))]
    pub subject: String,
    #[validate(length(min = 1, max = 200))]
    pub topic: String,
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: BTreeMap<String, String>,
    #[validate(length(min = 1, max = 8))]
    pub correct_answer: String,
}

impl CreateQuestionRequest {
    /// Sanitizes the free text and canonicalizes the subject label.
    pub fn into_question(self) -> Question {
        Question {
            question_id: self.question_id.trim().to_string(),
            subject: normalize_subject(&self.subject),
            topic: clean_html(self.topic.trim()),
            difficulty: self.difficulty,
            question: clean_html(self.question.trim()),
            options: self
                .options
                .into_iter()
                .map(|(key, text)| (key.trim().to_string(), clean_html(text.trim())))
                .collect(),
            correct_answer: self.correct_answer.trim().to_string(),
        }
    }
}

/// DTO for `POST /api/admin/questions`. Imported all-or-nothing.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportQuestionsRequest {
    #[validate(length(min = 1, max = 500))]
    pub questions: Vec<CreateQuestionRequest>,
}

fn validate_options(options: &BTreeMap<String, String>) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("options_need_at_least_two_entries"));
    }
    for (key, text) in options {
        if key.trim().is_empty() || key.len() > 8 {
            return Err(validator::ValidationError::new("invalid_option_key"));
        }
        if text.trim().is_empty() || text.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_text"));
        }
    }
    Ok(())
}

/// The answer key must reference one of the options.
fn validate_answer_key(req: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    let key = req.correct_answer.trim();
    if !req.options.keys().any(|k| k.trim() == key) {
        return Err(validator::ValidationError::new("correct_answer_not_in_options"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(correct: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            question_id: "Q_POL_001".to_string(),
            subject: "  polity ".to_string(),
            topic: "Fundamental Rights".to_string(),
            difficulty: Difficulty::Medium,
            question: "Which Article empowers the Supreme Court to issue writs?".to_string(),
            options: BTreeMap::from([
                ("A".to_string(), "Article 32".to_string()),
                ("B".to_string(), "Article 21".to_string()),
            ]),
            correct_answer: correct.to_string(),
        }
    }

    #[test]
    fn test_answer_key_must_be_an_option() {
        assert!(request("A").validate().is_ok());
        assert!(request("C").validate().is_err());
    }

    #[test]
    fn test_single_option_rejected() {
        let mut req = request("A");
        req.options.remove("B");
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_into_question_sanitizes() {
        let mut req = request("A");
        req.question = "Pick one <script>alert(1)</script>".to_string();
        let q = req.into_question();
        assert_eq!(q.subject, "Polity");
        assert!(!q.question.contains("script"));
    }

    #[test]
    fn test_into_question_stores_html_fragments() {
        let mut req = request("A");
        req.topic = "Flora & Fauna".to_string();
        req.options.insert("B".to_string(), "3 < 5".to_string());
        let q = req.into_question();
        assert_eq!(q.topic, "Flora &amp; Fauna");
        assert_eq!(q.options["B"], "3 &lt; 5");
        assert_eq!(q.options["A"], "Article 32");
        assert_eq!(q.correct_answer, "A");
    }

    #[test]
    fn test_public_projection_hides_answer() {
        let q = request("A").into_question();
        let json = serde_json::to_value(q.to_public()).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["options"]["A"], "Article 32");
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" HARD ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
