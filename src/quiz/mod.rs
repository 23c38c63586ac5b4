pub mod catalog;
pub mod matching;
pub mod scoring;
pub mod sequencer;
pub mod session;
pub mod type_code;

use std::collections::BTreeMap;
use std::fmt;

/// One of the four bipolar dimensions a question measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    EI,
    SN,
    TF,
    JP,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::EI, Axis::SN, Axis::TF, Axis::JP];

    /// The pole that wins ties.
    pub fn positive(self) -> Pole {
        match self {
            Axis::EI => Pole::E,
            Axis::SN => Pole::S,
            Axis::TF => Pole::T,
            Axis::JP => Pole::J,
        }
    }

    pub fn negative(self) -> Pole {
        match self {
            Axis::EI => Pole::I,
            Axis::SN => Pole::N,
            Axis::TF => Pole::F,
            Axis::JP => Pole::P,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Axis::EI => 0,
            Axis::SN => 1,
            Axis::TF => 2,
            Axis::JP => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.positive(), self.negative())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Pole {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Pole {
    pub const ALL: [Pole; 8] = [
        Pole::E,
        Pole::I,
        Pole::S,
        Pole::N,
        Pole::T,
        Pole::F,
        Pole::J,
        Pole::P,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Pole::E | Pole::I => Axis::EI,
            Pole::S | Pole::N => Axis::SN,
            Pole::T | Pole::F => Axis::TF,
            Pole::J | Pole::P => Axis::JP,
        }
    }

    pub fn is_positive(self) -> bool {
        self.axis().positive() == self
    }

    pub fn index(self) -> usize {
        match self {
            Pole::E => 0,
            Pole::I => 1,
            Pole::S => 2,
            Pole::N => 3,
            Pole::T => 4,
            Pole::F => 5,
            Pole::J => 6,
            Pole::P => 7,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Pole::E => 'E',
            Pole::I => 'I',
            Pole::S => 'S',
            Pole::N => 'N',
            Pole::T => 'T',
            Pole::F => 'F',
            Pole::J => 'J',
            Pole::P => 'P',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        Pole::ALL.into_iter().find(|p| p.as_char() == c)
    }
}

impl fmt::Display for Pole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub axis: Axis,
    pub side: Pole,
}

impl Question {
    pub fn new(id: u32, text: impl Into<String>, side: Pole) -> Self {
        Self {
            id: QuestionId(id),
            text: text.into(),
            axis: side.axis(),
            side,
        }
    }
}

/// A 1..=5 agreement rating. 3 is neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    const NEUTRAL: i32 = 3;

    pub fn new(value: u8) -> Result<Self, QuizError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuizError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Maps 1..=5 onto -2..=2.
    pub fn centered(self) -> i32 {
        i32::from(self.0) - Self::NEUTRAL
    }
}

impl TryFrom<u8> for Rating {
    type Error = QuizError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Answers given so far in one quiz run, one per question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnswerSet {
    answers: BTreeMap<QuestionId, Rating>,
}

impl AnswerSet {
    /// Records a rating, replacing any earlier answer to the same question.
    pub fn record(&mut self, id: QuestionId, rating: Rating) {
        self.answers.insert(id, rating);
    }

    pub fn get(&self, id: QuestionId) -> Option<Rating> {
        self.answers.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

impl FromIterator<(QuestionId, Rating)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, Rating)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    InvalidRating(u8),
    UnknownQuestion(QuestionId),
    NotCurrentQuestion {
        expected: QuestionId,
        got: QuestionId,
    },
    NotInQuiz,
}

impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRating(value) => write!(
                f,
                "rating {value} is outside {}..={}",
                Rating::MIN,
                Rating::MAX
            ),
            Self::UnknownQuestion(id) => write!(f, "unknown question id {id}"),
            Self::NotCurrentQuestion { expected, got } => write!(
                f,
                "answer for question {got} while question {expected} is shown"
            ),
            Self::NotInQuiz => write!(f, "no quiz is running"),
        }
    }
}

impl std::error::Error for QuizError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poles_belong_to_their_axis() {
        for axis in Axis::ALL {
            assert_eq!(axis.positive().axis(), axis);
            assert_eq!(axis.negative().axis(), axis);
            assert!(axis.positive().is_positive());
            assert!(!axis.negative().is_positive());
        }
    }

    #[test]
    fn rating_rejects_out_of_range_values() {
        assert_eq!(Rating::new(0), Err(QuizError::InvalidRating(0)));
        assert_eq!(Rating::new(6), Err(QuizError::InvalidRating(6)));
        assert_eq!(Rating::new(1).map(Rating::centered), Ok(-2));
        assert_eq!(Rating::new(3).map(Rating::centered), Ok(0));
        assert_eq!(Rating::new(5).map(Rating::centered), Ok(2));
    }

    #[test]
    fn rating_deserialization_is_validated() {
        assert!(serde_json::from_str::<Rating>("4").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn answer_set_keeps_one_answer_per_question() {
        let mut answers = AnswerSet::default();
        answers.record(QuestionId(1), Rating::new(2).unwrap());
        answers.record(QuestionId(1), Rating::new(5).unwrap());
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(QuestionId(1)), Rating::new(5).ok());
    }
}
