use super::type_code::{resolve_type, TypeCode};
use super::{AnswerSet, Axis, Pole, Question};

/// Returned when no question list is available to score against.
pub const FALLBACK_TYPE: TypeCode = TypeCode::ISTJ;

/// Sum of ratings per letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Scores([u32; 8]);

impl Scores {
    pub fn get(&self, pole: Pole) -> u32 {
        self.0[pole.index()]
    }

    fn add(&mut self, pole: Pole, value: u32) {
        self.0[pole.index()] += value;
    }

    /// Percentage of `limit` reached by `pole`, capped at 100.
    pub fn share(&self, pole: Pole, limit: u32) -> u32 {
        if limit == 0 {
            return 0;
        }
        round_half_up(f64::from(self.get(pole)) / f64::from(limit) * 100.0).min(100.0) as u32
    }
}

/// Signed lean per axis; positive values favour E/S/T/J.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AxisScores([i32; 4]);

impl AxisScores {
    #[cfg(test)]
    pub fn from_values(values: [i32; 4]) -> Self {
        Self(values)
    }

    pub fn get(&self, axis: Axis) -> i32 {
        self.0[axis.index()]
    }

    fn add(&mut self, axis: Axis, value: i32) {
        self.0[axis.index()] += value;
    }

    /// Share of the positive pole in percent, where `limit` is the largest possible |value|.
    /// The negative pole's share is the remainder.
    pub fn positive_share(&self, axis: Axis, limit: i32) -> u32 {
        if limit <= 0 {
            return 50;
        }
        let lean = 50.0 + f64::from(self.get(axis)) / f64::from(2 * limit) * 100.0;
        round_half_up(lean).clamp(0.0, 100.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScoreCard {
    pub type_code: TypeCode,
    pub scores: Scores,
    pub axis_scores: AxisScores,
}

/// Reduces the canonical question list and the answers into letter sums and axis leans.
///
/// Iterates `questions` rather than `answers`, so every question counts exactly once
/// whatever order it was shown in. Unanswered questions are skipped.
pub fn score(questions: &[Question], answers: &AnswerSet) -> (Scores, AxisScores) {
    let mut scores = Scores::default();
    let mut axis_scores = AxisScores::default();

    for question in questions {
        let Some(rating) = answers.get(question.id) else {
            continue;
        };
        scores.add(question.side, u32::from(rating.value()));

        let centered = rating.centered();
        let axis = question.side.axis();
        if question.side.is_positive() {
            axis_scores.add(axis, centered);
        } else {
            axis_scores.add(axis, -centered);
        }
    }

    (scores, axis_scores)
}

/// Scores and resolves a type. With no question list yet, returns [`FALLBACK_TYPE`]
/// and zeroed scores.
pub fn calculate_result(questions: Option<&[Question]>, answers: &AnswerSet) -> ScoreCard {
    let Some(questions) = questions else {
        return ScoreCard {
            type_code: FALLBACK_TYPE,
            scores: Scores::default(),
            axis_scores: AxisScores::default(),
        };
    };

    let (scores, axis_scores) = score(questions, answers);
    ScoreCard {
        type_code: resolve_type(&axis_scores),
        scores,
        axis_scores,
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::sequencer::shuffle;
    use crate::quiz::{QuestionId, Rating};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn answer(id: u32, rating: u8) -> (QuestionId, Rating) {
        (QuestionId(id), Rating::new(rating).unwrap())
    }

    fn full_question_set() -> Vec<Question> {
        (0..16)
            .map(|id| Question::new(id, format!("q{id}"), Pole::ALL[id as usize % 8]))
            .collect()
    }

    #[test]
    fn two_question_scenario() {
        let questions = vec![
            Question::new(1, "I recharge around people", Pole::E),
            Question::new(2, "I look for the meaning behind things", Pole::N),
        ];
        let answers = AnswerSet::from_iter([answer(1, 5), answer(2, 5)]);

        let card = calculate_result(Some(&questions), &answers);

        assert_eq!(card.scores.get(Pole::E), 5);
        assert_eq!(card.scores.get(Pole::N), 5);
        for pole in [Pole::I, Pole::S, Pole::T, Pole::F, Pole::J, Pole::P] {
            assert_eq!(card.scores.get(pole), 0);
        }
        assert_eq!(card.axis_scores, AxisScores::from_values([2, -2, 0, 0]));
        assert_eq!(card.type_code.to_string(), "ENTJ");
    }

    #[test]
    fn all_neutral_answers_resolve_to_positive_poles() {
        let questions = full_question_set();
        let answers = questions.iter().map(|q| answer(q.id.0, 3)).collect::<AnswerSet>();
        let card = calculate_result(Some(&questions), &answers);
        assert_eq!(card.axis_scores, AxisScores::default());
        assert_eq!(card.type_code.to_string(), "ESTJ");
    }

    #[test]
    fn unanswered_questions_are_skipped() {
        let questions = full_question_set();
        let answers = AnswerSet::from_iter([answer(1, 1)]);
        let (scores, axis_scores) = score(&questions, &answers);
        // Question 1 is on side I; a rating of 1 centres to -2 and flips to +2 on EI
        assert_eq!(scores.get(Pole::I), 1);
        assert_eq!(axis_scores.get(Axis::EI), 2);
        assert_eq!(axis_scores.get(Axis::SN), 0);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let questions = full_question_set();
        let answers = AnswerSet::from_iter([answer(99, 5)]);
        assert_eq!(score(&questions, &answers), (Scores::default(), AxisScores::default()));
    }

    #[test]
    fn missing_question_list_falls_back() {
        let answers = AnswerSet::from_iter([answer(1, 5)]);
        let card = calculate_result(None, &answers);
        assert_eq!(card.type_code.to_string(), "ISTJ");
        assert_eq!(card.scores, Scores::default());
        assert_eq!(card.axis_scores, AxisScores::default());
    }

    #[test]
    fn shares_match_display_percentages() {
        let axis_scores = AxisScores::from_values([20, -20, 0, 5]);
        assert_eq!(axis_scores.positive_share(Axis::EI, 20), 100);
        assert_eq!(axis_scores.positive_share(Axis::SN, 20), 0);
        assert_eq!(axis_scores.positive_share(Axis::TF, 20), 50);
        assert_eq!(axis_scores.positive_share(Axis::JP, 20), 63);
        assert_eq!(axis_scores.positive_share(Axis::JP, 0), 50);

        let questions = full_question_set();
        let answers = AnswerSet::from_iter([answer(0, 5), answer(8, 4)]);
        let (scores, _) = score(&questions, &answers);
        assert_eq!(scores.get(Pole::E), 9);
        assert_eq!(scores.share(Pole::E, 25), 36);
        assert_eq!(scores.share(Pole::E, 5), 100);
        assert_eq!(scores.share(Pole::E, 0), 0);
    }

    proptest! {
        #[test]
        fn scoring_ignores_question_order(
            ratings in prop::collection::vec(prop::option::of(1u8..=5), 16),
            seed: u64,
        ) {
            let questions = full_question_set();
            let answers = ratings
                .iter()
                .enumerate()
                .filter_map(|(id, r)| r.map(|r| answer(id as u32, r)))
                .collect::<AnswerSet>();
            let mut rng = StdRng::seed_from_u64(seed);
            let shuffled = shuffle(&questions, &mut rng);

            prop_assert_eq!(score(&shuffled, &answers), score(&questions, &answers));
        }

        #[test]
        fn scoring_is_pure(ratings in prop::collection::vec(1u8..=5, 16)) {
            let questions = full_question_set();
            let answers = ratings
                .iter()
                .enumerate()
                .map(|(id, r)| answer(id as u32, *r))
                .collect::<AnswerSet>();
            let questions_before = questions.clone();
            let answers_before = answers.clone();

            let first = calculate_result(Some(&questions), &answers);
            let second = calculate_result(Some(&questions), &answers);

            prop_assert_eq!(first, second);
            prop_assert_eq!(&questions, &questions_before);
            prop_assert_eq!(&answers, &answers_before);
        }
    }
}
