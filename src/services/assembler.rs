// src/services/assembler.rs

use std::collections::HashSet;

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::{
        question::{Difficulty, Question},
        test_paper::{GenerateTestParams, MIXED_SUBJECT, TestPaper, TestPattern},
    },
    store::{QuestionBank, QuestionFilter, TestStore},
    utils::subject::normalize_subject,
};

/// A validated request to assemble a test.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyRequest {
    pub pattern: TestPattern,
    pub subject: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub count: usize,
    pub user_id: Option<String>,
}

impl AssemblyRequest {
    /// Applies defaults and limits from `config` to raw query parameters.
    pub fn from_params(params: GenerateTestParams, config: &Config) -> Result<Self, AppError> {
        let count = params.count.unwrap_or(config.default_test_size);
        if count == 0 || count > config.max_test_size {
            return Err(AppError::Validation(format!(
                "count must be between 1 and {}",
                config.max_test_size
            )));
        }

        let difficulty = params
            .difficulty
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| d.parse::<Difficulty>())
            .transpose()
            .map_err(AppError::Validation)?;

        let subject = params
            .subject
            .as_deref()
            .map(normalize_subject)
            .filter(|s| !s.is_empty());

        if params.pattern == TestPattern::Subject && subject.is_none() {
            return Err(AppError::Validation("subject is required".to_string()));
        }

        Ok(Self {
            pattern: params.pattern,
            subject,
            difficulty,
            count,
            user_id: params.user_id,
        })
    }
}

/// Drops duplicate ids, shuffles, and keeps at most `count` questions.
pub fn select_questions<R: Rng + ?Sized>(
    mut candidates: Vec<Question>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut seen = HashSet::new();
    candidates.retain(|q| seen.insert(q.question_id.clone()));
    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates
}

/// Per-subject quota for a weighted draw: `max(1, round(count * weight))`.
pub fn mixed_quota(count: usize, weight: f64) -> usize {
    ((count as f64 * weight).round() as usize).max(1)
}

async fn draw_subject<R: Rng + ?Sized>(
    bank: &dyn QuestionBank,
    subject: &str,
    difficulty: Option<Difficulty>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Question>, AppError> {
    let filter = QuestionFilter {
        subject: Some(subject.to_string()),
        difficulty,
    };
    let candidates = bank.find_questions(&filter, None).await?;
    Ok(select_questions(candidates, count, rng))
}

/// Assembles and persists a test.
///
/// A count above availability is truncated to what the bank holds. An empty
/// draw is `NotFound`.
pub async fn assemble<R: Rng + Send + ?Sized>(
    bank: &dyn QuestionBank,
    store: &dyn TestStore,
    request: AssemblyRequest,
    mixed_weights: &[(String, f64)],
    rng: &mut R,
) -> Result<TestPaper, AppError> {
    let (label, questions) = match request.pattern {
        TestPattern::Subject => {
            let subject = request
                .subject
                .clone()
                .ok_or_else(|| AppError::Validation("subject is required".to_string()))?;
            let questions =
                draw_subject(bank, &subject, request.difficulty, request.count, rng).await?;
            if questions.is_empty() {
                return Err(AppError::NotFound(format!(
                    "No questions found for subject '{}'",
                    subject
                )));
            }
            (subject, questions)
        }
        TestPattern::Mixed => {
            let mut pool = Vec::new();
            for (subject, weight) in mixed_weights {
                let quota = mixed_quota(request.count, *weight);
                pool.extend(draw_subject(bank, subject, request.difficulty, quota, rng).await?);
            }
            let questions = select_questions(pool, request.count, rng);
            if questions.is_empty() {
                return Err(AppError::NotFound(
                    "No questions available for a mixed test".to_string(),
                ));
            }
            (MIXED_SUBJECT.to_string(), questions)
        }
    };

    if questions.len() < request.count {
        tracing::info!(
            "Requested {} questions for '{}', only {} available",
            request.count,
            label,
            questions.len()
        );
    }

    let test = TestPaper {
        test_id: Uuid::new_v4().to_string(),
        user_id: request.user_id,
        subject: label,
        questions,
        created_at: Utc::now(),
    };

    store.save_test(&test).await?;
    tracing::info!(
        "Assembled test {} ({}, {} questions)",
        test.test_id,
        test.subject,
        test.questions.len()
    );

    Ok(test)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::store::sqlite::{SqliteStore, connect, migrate};

    fn question(id: &str, subject: &str) -> Question {
        Question {
            question_id: id.to_string(),
            subject: subject.to_string(),
            topic: "General".to_string(),
            difficulty: Difficulty::Medium,
            question: format!("Question {}", id),
            options: BTreeMap::from([
                ("A".to_string(), "first".to_string()),
                ("B".to_string(), "second".to_string()),
            ]),
            correct_answer: "A".to_string(),
        }
    }

    async fn seeded_store(bank: &[Question]) -> SqliteStore {
        let pool = connect("sqlite::memory:").await.unwrap();
        migrate(&pool).await.unwrap();
        let store = SqliteStore::new(pool);
        store.insert_questions(bank).await.unwrap();
        store
    }

    fn request(subject: &str, count: usize) -> AssemblyRequest {
        AssemblyRequest {
            pattern: TestPattern::Subject,
            subject: Some(subject.to_string()),
            difficulty: None,
            count,
            user_id: None,
        }
    }

    #[test]
    fn test_select_questions_dedupes_and_truncates() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![question("a", "Polity"), question("a", "Polity"), question("b", "Polity")];

        let picked = select_questions(candidates.clone(), 10, &mut rng);
        assert_eq!(picked.len(), 2);

        let picked = select_questions(candidates, 1, &mut rng);
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn test_select_questions_is_deterministic_for_a_seed() {
        let candidates: Vec<Question> = (0..30).map(|i| question(&format!("q{}", i), "History")).collect();
        let first = select_questions(candidates.clone(), 5, &mut StdRng::seed_from_u64(42));
        let second = select_questions(candidates, 5, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_mixed_quota() {
        assert_eq!(mixed_quota(10, 0.25), 3);
        assert_eq!(mixed_quota(10, 0.15), 2);
        assert_eq!(mixed_quota(1, 0.15), 1);
    }

    #[test]
    fn test_from_params_limits() {
        let config = Config::for_testing("secret");
        let params = |count: Option<usize>| GenerateTestParams {
            subject: Some("polity".to_string()),
            difficulty: None,
            count,
            pattern: TestPattern::Subject,
            user_id: None,
        };

        let req = AssemblyRequest::from_params(params(None), &config).unwrap();
        assert_eq!(req.count, config.default_test_size);
        assert_eq!(req.subject.as_deref(), Some("Polity"));

        let err = AssemblyRequest::from_params(params(Some(config.max_test_size + 1)), &config).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut bad = params(Some(5));
        bad.difficulty = Some("extreme".to_string());
        assert!(matches!(
            AssemblyRequest::from_params(bad, &config),
            Err(AppError::Validation(_))
        ));

        let mut missing = params(Some(5));
        missing.subject = None;
        assert!(AssemblyRequest::from_params(missing, &config).is_err());
    }

    #[tokio::test]
    async fn test_count_above_availability_is_truncated() {
        let bank: Vec<Question> = (0..12).map(|i| question(&format!("geo{}", i), "Geography")).collect();
        let store = seeded_store(&bank).await;
        let mut rng = StdRng::seed_from_u64(1);

        let test = assemble(&store, &store, request("geography", 50), &[], &mut rng)
            .await
            .unwrap();

        assert_eq!(test.questions.len(), 12);
        assert!(test.questions.iter().all(|q| q.subject == "Geography"));
        let ids: HashSet<&str> = test.questions.iter().map(|q| q.question_id.as_str()).collect();
        assert_eq!(ids.len(), 12);

        let stored = store.load_test(&test.test_id).await.unwrap().unwrap();
        assert_eq!(stored, test);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_not_found() {
        let store = seeded_store(&[question("p1", "Polity")]).await;
        let mut rng = StdRng::seed_from_u64(1);

        let err = assemble(&store, &store, request("Astrology", 5), &[], &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mixed_pattern_draws_by_weight() {
        let mut bank = Vec::new();
        for subject in ["Polity", "Economy", "History"] {
            for i in 0..10 {
                bank.push(question(&format!("{}{}", subject, i), subject));
            }
        }
        let store = seeded_store(&bank).await;
        let weights = vec![
            ("Polity".to_string(), 0.5),
            ("Economy".to_string(), 0.3),
            ("History".to_string(), 0.2),
        ];
        let req = AssemblyRequest {
            pattern: TestPattern::Mixed,
            subject: None,
            difficulty: None,
            count: 10,
            user_id: Some("u1".to_string()),
        };

        let test = assemble(&store, &store, req, &weights, &mut StdRng::seed_from_u64(3))
            .await
            .unwrap();

        assert_eq!(test.subject, MIXED_SUBJECT);
        assert_eq!(test.questions.len(), 10);
        let polity = test.questions.iter().filter(|q| q.subject == "Polity").count();
        assert_eq!(polity, 5);
    }
}
