use rand::Rng;

use super::Question;

/// Returns a uniformly shuffled copy of `items` (Fisher-Yates). The input is left untouched.
pub fn shuffle<T: Clone, R: Rng>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    // Walk down from the last index; each slot swaps with a partner drawn from 0..=i
    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cursor moved to this index.
    Moved(usize),
    /// Advanced past the last question.
    Finished,
    /// Retreated before the first question.
    ExitToIntro,
}

/// Display order of one quiz run plus the cursor into it.
/// The order is frozen once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Sequencer {
    order: Vec<Question>,
    cursor: usize,
}

impl Sequencer {
    pub fn new<R: Rng>(questions: &[Question], rng: &mut R) -> Self {
        Self::with_order(shuffle(questions, rng))
    }

    pub fn with_order(order: Vec<Question>) -> Self {
        Self { order, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn current(&self) -> Option<&Question> {
        self.order.get(self.cursor)
    }

    pub fn order(&self) -> &[Question] {
        &self.order
    }

    pub fn advance(&mut self) -> Step {
        if self.cursor + 1 < self.order.len() {
            self.cursor += 1;
            Step::Moved(self.cursor)
        } else {
            Step::Finished
        }
    }

    pub fn retreat(&mut self) -> Step {
        if self.cursor > 0 {
            self.cursor -= 1;
            Step::Moved(self.cursor)
        } else {
            Step::ExitToIntro
        }
    }
}
