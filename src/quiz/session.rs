use rand::Rng;

use super::catalog::QuestionCatalog;
use super::scoring::{calculate_result, ScoreCard};
use super::sequencer::{Sequencer, Step};
use super::{AnswerSet, Question, QuestionId, QuizError, Rating};

/// A completed result, kept so the chat can come back to it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResultSnapshot {
    #[serde(flatten)]
    pub card: ScoreCard,
    /// Milliseconds since the Unix epoch.
    pub completed_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    #[default]
    Intro,
    InQuiz(Sequencer),
    Result(ResultSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Answer { question_id: QuestionId, rating: u8 },
    Skip,
    Back,
    Restart,
}

/// What the session shows after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The question list has not been loaded yet; nothing changed.
    NotReady,
    Intro,
    Question {
        index: usize,
        total: usize,
        question: Question,
    },
    Completed(ResultSnapshot),
}

/// One chat's walk through the quiz: Intro -> InQuiz(cursor) -> Result(type).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    phase: Phase,
    answers: AnswerSet,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&ResultSnapshot> {
        match &self.phase {
            Phase::Result(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.phase {
            Phase::InQuiz(sequencer) => sequencer.current(),
            _ => None,
        }
    }

    /// What to show for the current phase, without changing anything.
    pub fn view(&self) -> Transition {
        match &self.phase {
            Phase::Intro => Transition::Intro,
            Phase::InQuiz(sequencer) => question_view(sequencer),
            Phase::Result(snapshot) => Transition::Completed(*snapshot),
        }
    }

    pub fn handle<R: Rng>(
        &mut self,
        command: Command,
        questions: Option<&QuestionCatalog>,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<Transition, QuizError> {
        match command {
            Command::Start => Ok(self.start(questions, rng)),
            Command::Answer {
                question_id,
                rating,
            } => {
                let rating = Rating::new(rating)?;
                self.answer(question_id, rating, questions, now_ms)
            }
            Command::Skip => Ok(self.advance(questions, now_ms)),
            Command::Back => Ok(self.back()),
            Command::Restart => {
                self.phase = Phase::Intro;
                Ok(Transition::Intro)
            }
        }
    }

    fn start<R: Rng>(&mut self, questions: Option<&QuestionCatalog>, rng: &mut R) -> Transition {
        if let Phase::InQuiz(sequencer) = &self.phase {
            return question_view(sequencer);
        }
        let Some(catalog) = questions else {
            return Transition::NotReady;
        };

        self.answers.clear();
        let sequencer = Sequencer::new(catalog.questions(), rng);
        let view = question_view(&sequencer);
        self.phase = Phase::InQuiz(sequencer);
        view
    }

    fn answer(
        &mut self,
        question_id: QuestionId,
        rating: Rating,
        questions: Option<&QuestionCatalog>,
        now_ms: u64,
    ) -> Result<Transition, QuizError> {
        let Phase::InQuiz(sequencer) = &self.phase else {
            return Err(QuizError::NotInQuiz);
        };
        let current = sequencer
            .current()
            .ok_or(QuizError::UnknownQuestion(question_id))?;
        if current.id != question_id {
            if sequencer.order().iter().any(|q| q.id == question_id) {
                return Err(QuizError::NotCurrentQuestion {
                    expected: current.id,
                    got: question_id,
                });
            }
            return Err(QuizError::UnknownQuestion(question_id));
        }

        self.answers.record(question_id, rating);
        Ok(self.advance(questions, now_ms))
    }

    fn advance(&mut self, questions: Option<&QuestionCatalog>, now_ms: u64) -> Transition {
        let Phase::InQuiz(sequencer) = &mut self.phase else {
            return self.view();
        };
        match sequencer.advance() {
            Step::Moved(_) => question_view(sequencer),
            Step::Finished | Step::ExitToIntro => {
                log::debug!(
                    "Quiz finished with {} of {} questions answered",
                    self.answers.len(),
                    sequencer.len()
                );
                let card = calculate_result(questions.map(QuestionCatalog::questions), &self.answers);
                let snapshot = ResultSnapshot {
                    card,
                    completed_at: now_ms,
                };
                self.phase = Phase::Result(snapshot);
                Transition::Completed(snapshot)
            }
        }
    }

    fn back(&mut self) -> Transition {
        let Phase::InQuiz(sequencer) = &mut self.phase else {
            return self.view();
        };
        match sequencer.retreat() {
            Step::Moved(_) => question_view(sequencer),
            Step::ExitToIntro | Step::Finished => {
                self.phase = Phase::Intro;
                Transition::Intro
            }
        }
    }
}

fn question_view(sequencer: &Sequencer) -> Transition {
    match sequencer.current() {
        Some(question) => Transition::Question {
            index: sequencer.cursor(),
            total: sequencer.len(),
            question: question.clone(),
        },
        None => Transition::Intro,
    }
}
