// src/services/scorer.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    error::AppError,
    models::{
        response::{GradedAnswer, QuestionResponse},
        score::{ReviewItem, ScoreSummary},
        test_paper::TestPaper,
    },
};

/// Output of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSubmission {
    pub summary: ScoreSummary,
    /// One entry per frozen question, in test order.
    pub graded: Vec<GradedAnswer>,
}

/// round(100 * part / whole); 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// Scores a submission against the test's frozen question set.
///
/// * Questions without a response count as unanswered (incorrect).
/// * A response is correct iff its key equals the answer key exactly.
/// * Entries for questions outside the test are ignored and reported.
/// * Two entries for the same question reject the submission.
pub fn score_test(
    test: &TestPaper,
    user_id: &str,
    responses: &[QuestionResponse],
) -> Result<ScoredSubmission, AppError> {
    let frozen: HashSet<&str> = test.questions.iter().map(|q| q.question_id.as_str()).collect();

    let mut by_id: HashMap<&str, &QuestionResponse> = HashMap::with_capacity(responses.len());
    let mut ignored = Vec::new();

    for response in responses {
        let qid = response.question_id.as_str();
        if !frozen.contains(qid) {
            tracing::warn!(test_id = %test.test_id, question_id = %qid, "Ignoring response for a question outside the test");
            ignored.push(response.question_id.clone());
            continue;
        }
        if by_id.insert(qid, response).is_some() {
            return Err(AppError::Validation(format!(
                "question '{}' answered more than once",
                qid
            )));
        }
    }

    // subject -> (correct, total)
    let mut per_subject: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut graded = Vec::with_capacity(test.questions.len());
    let mut review = Vec::new();
    let mut correct_count = 0;
    let mut answered_count = 0;

    for question in &test.questions {
        let response = by_id.get(question.question_id.as_str());
        let selected = response.and_then(|r| r.selected());
        let correct = selected == Some(question.correct_answer.as_str());

        if selected.is_some() {
            answered_count += 1;
        }
        if correct {
            correct_count += 1;
        } else {
            review.push(ReviewItem {
                question_id: question.question_id.clone(),
                subject: question.subject.clone(),
                topic: question.topic.clone(),
                selected_answer: selected.map(str::to_string),
                correct_answer: question.correct_answer.clone(),
            });
        }

        let entry = per_subject.entry(question.subject.clone()).or_default();
        entry.1 += 1;
        if correct {
            entry.0 += 1;
        }

        graded.push(GradedAnswer {
            question_id: question.question_id.clone(),
            subject: question.subject.clone(),
            topic: question.topic.clone(),
            user_answer: selected.map(str::to_string),
            correct_answer: question.correct_answer.clone(),
            correct,
            time_taken: response.and_then(|r| r.time_taken),
        });
    }

    let subject_accuracy = per_subject
        .into_iter()
        .filter(|(_, (_, total))| *total > 0)
        .map(|(subject, (correct, total))| (subject, percent(correct, total)))
        .collect();

    let summary = ScoreSummary {
        test_id: test.test_id.clone(),
        user_id: user_id.to_string(),
        total_questions: test.questions.len(),
        answered_count,
        correct_count,
        score_percent: percent(correct_count, test.questions.len()),
        subject_accuracy,
        review,
        ignored_question_ids: ignored,
    };

    Ok(ScoredSubmission { summary, graded })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;
    use crate::models::question::{Difficulty, Question};

    fn question(id: &str, subject: &str, answer: &str) -> Question {
        Question {
            question_id: id.to_string(),
            subject: subject.to_string(),
            topic: "General".to_string(),
            difficulty: Difficulty::Easy,
            question: format!("Question {}", id),
            options: BTreeMap::from([
                ("A".to_string(), "one".to_string()),
                ("B".to_string(), "two".to_string()),
                ("C".to_string(), "three".to_string()),
                ("D".to_string(), "four".to_string()),
            ]),
            correct_answer: answer.to_string(),
        }
    }

    fn paper() -> TestPaper {
        TestPaper {
            test_id: "t-1".to_string(),
            user_id: None,
            subject: "Mixed".to_string(),
            questions: vec![
                question("p1", "Polity", "A"),
                question("p2", "Polity", "B"),
                question("p3", "Polity", "C"),
                question("e1", "Economy", "D"),
            ],
            created_at: Utc::now(),
        }
    }

    fn answer(id: &str, key: &str) -> QuestionResponse {
        QuestionResponse {
            question_id: id.to_string(),
            user_answer: Some(key.to_string()),
            time_taken: Some(12.5),
        }
    }

    #[test]
    fn test_empty_responses_score_zero() {
        let scored = score_test(&paper(), "u1", &[]).unwrap();
        assert_eq!(scored.summary.score_percent, 0);
        assert_eq!(scored.summary.answered_count, 0);
        assert!(scored.summary.subject_accuracy.values().all(|a| *a == 0));
        assert_eq!(scored.summary.review.len(), 4);
        assert_eq!(scored.graded.len(), 4);
    }

    #[test]
    fn test_all_correct_scores_hundred() {
        let responses = vec![answer("p1", "A"), answer("p2", "B"), answer("p3", "C"), answer("e1", "D")];
        let scored = score_test(&paper(), "u1", &responses).unwrap();
        assert_eq!(scored.summary.score_percent, 100);
        assert_eq!(scored.summary.subject_accuracy["Polity"], 100);
        assert_eq!(scored.summary.subject_accuracy["Economy"], 100);
        assert!(scored.summary.review.is_empty());
    }

    #[test]
    fn test_partial_submission_uses_test_size() {
        // One correct answer out of four questions, three left blank.
        let scored = score_test(&paper(), "u1", &[answer("p1", "A")]).unwrap();
        assert_eq!(scored.summary.score_percent, 25);
        assert_eq!(scored.summary.subject_accuracy["Polity"], 33);
        assert_eq!(scored.summary.subject_accuracy["Economy"], 0);
    }

    #[test]
    fn test_rounding_half_up() {
        // 2 of 3 Polity correct -> 66.67 -> 67
        let scored = score_test(&paper(), "u1", &[answer("p1", "A"), answer("p2", "B")]).unwrap();
        assert_eq!(scored.summary.subject_accuracy["Polity"], 67);
        assert_eq!(scored.summary.score_percent, 50);
    }

    #[test]
    fn test_key_match_is_case_sensitive() {
        let scored = score_test(&paper(), "u1", &[answer("p1", "a")]).unwrap();
        assert_eq!(scored.summary.correct_count, 0);
        assert_eq!(scored.summary.answered_count, 1);
    }

    #[test]
    fn test_empty_string_is_unanswered() {
        let scored = score_test(&paper(), "u1", &[answer("p1", "")]).unwrap();
        assert_eq!(scored.summary.answered_count, 0);
        assert_eq!(scored.graded[0].user_answer, None);
    }

    #[test]
    fn test_stray_response_ignored() {
        let responses = vec![answer("p1", "A"), answer("zz-404", "A")];
        let scored = score_test(&paper(), "u1", &responses).unwrap();
        assert_eq!(scored.summary.ignored_question_ids, vec!["zz-404".to_string()]);
        assert_eq!(scored.summary.total_questions, 4);
        assert_eq!(scored.summary.score_percent, 25);
    }

    #[test]
    fn test_duplicate_response_rejected() {
        let responses = vec![answer("p1", "A"), answer("p1", "B")];
        assert!(matches!(
            score_test(&paper(), "u1", &responses),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let responses = vec![answer("p1", "A"), answer("e1", "C"), answer("nope", "A")];
        let first = score_test(&paper(), "u1", &responses).unwrap();
        let second = score_test(&paper(), "u1", &responses).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_review_records_selection() {
        let scored = score_test(&paper(), "u1", &[answer("e1", "C")]).unwrap();
        let item = scored
            .summary
            .review
            .iter()
            .find(|r| r.question_id == "e1")
            .unwrap();
        assert_eq!(item.selected_answer.as_deref(), Some("C"));
        assert_eq!(item.correct_answer, "D");
    }

    #[test]
    fn test_empty_test_does_not_divide_by_zero() {
        let mut empty = paper();
        empty.questions.clear();
        let scored = score_test(&empty, "u1", &[answer("p1", "A")]).unwrap();
        assert_eq!(scored.summary.score_percent, 0);
        assert!(scored.summary.subject_accuracy.is_empty());
    }
}
