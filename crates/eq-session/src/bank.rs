//! Offline question bank.
//!
//! A built-in [`QuestionProvider`] for playing without the question
//! service. Questions are picked per subject and difficulty; a question is
//! not served again for the same subject, difficulty and interaction type
//! until every alternative has been used.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use eq_core::{Difficulty, Question, QuestionRequest};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ProviderResult;
use crate::provider::QuestionProvider;

use Difficulty::{Easy, Hard, Medium};

struct Entry {
    subject: &'static str,
    difficulty: Difficulty,
    question: &'static str,
    options: [&'static str; 4],
    correct: usize,
    explanation: &'static str,
}

const fn q(
    subject: &'static str,
    difficulty: Difficulty,
    question: &'static str,
    options: [&'static str; 4],
    correct: usize,
    explanation: &'static str,
) -> Entry {
    Entry {
        subject,
        difficulty,
        question,
        options,
        correct,
        explanation,
    }
}

static BANK: &[Entry] = &[
    q("Math", Easy, "What is 5 + 7?", ["10", "11", "12", "13"], 2, "5 + 7 = 12"),
    q("Math", Easy, "What is 9 - 4?", ["3", "4", "5", "6"], 2, "9 - 4 = 5"),
    q("Math", Easy, "How many sides does a triangle have?", ["2", "3", "4", "5"], 1, "A triangle has three sides"),
    q("Math", Medium, "What is 24 ÷ 4?", ["4", "5", "6", "7"], 2, "24 ÷ 4 = 6"),
    q("Math", Medium, "What is 7 × 8?", ["54", "56", "58", "64"], 1, "7 × 8 = 56"),
    q("Math", Medium, "What is half of 3/4?", ["3/8", "3/2", "1/4", "6/4"], 0, "3/4 ÷ 2 = 3/8"),
    q("Math", Hard, "Solve: 3x + 5 = 20. What is x?", ["3", "5", "7", "15"], 1, "3x + 5 = 20 → 3x = 15 → x = 5"),
    q("Math", Hard, "What is 15% of 80?", ["8", "10", "12", "15"], 2, "0.15 × 80 = 12"),
    q("Math", Hard, "What is the area of a circle with radius 3? (π ≈ 3.14)", ["9.42", "18.84", "28.26", "31.4"], 2, "π × 3² = 3.14 × 9 = 28.26"),
    q("Science", Easy, "What gas do plants absorb from the air?", ["Oxygen", "Nitrogen", "Carbon Dioxide", "Hydrogen"], 2, "Plants absorb carbon dioxide for photosynthesis"),
    q("Science", Easy, "Which planet is closest to the Sun?", ["Venus", "Mercury", "Earth", "Mars"], 1, "Mercury orbits closest to the Sun"),
    q("Science", Medium, "What is the boiling point of water?", ["90°C", "100°C", "110°C", "120°C"], 1, "Water boils at 100°C at sea level"),
    q("Science", Medium, "What part of the cell holds its genetic material?", ["Membrane", "Nucleus", "Cytoplasm", "Wall"], 1, "DNA is stored in the nucleus"),
    q("Science", Hard, "What is the chemical formula for water?", ["CO2", "H2O", "NaCl", "O2"], 1, "Water is H2O - two hydrogen atoms and one oxygen"),
    q("Science", Hard, "What force keeps the planets in orbit around the Sun?", ["Magnetism", "Friction", "Gravity", "Inertia"], 2, "Gravity pulls the planets toward the Sun"),
    q("History", Easy, "Who was the first President of the United States?", ["Abraham Lincoln", "George Washington", "Thomas Jefferson", "John Adams"], 1, "George Washington took office in 1789"),
    q("History", Medium, "Which civilization built the pyramids of Giza?", ["Romans", "Greeks", "Egyptians", "Persians"], 2, "The pyramids were built in ancient Egypt"),
    q("History", Hard, "In which year did World War II end?", ["1918", "1939", "1945", "1950"], 2, "World War II ended in 1945"),
    q("Geography", Easy, "What is the largest ocean on Earth?", ["Atlantic", "Indian", "Arctic", "Pacific"], 3, "The Pacific is the largest ocean"),
    q("Geography", Medium, "What is the capital of Japan?", ["Seoul", "Tokyo", "Beijing", "Osaka"], 1, "Tokyo is the capital of Japan"),
    q("Geography", Hard, "Which river is the longest in the world?", ["Amazon", "Nile", "Yangtze", "Mississippi"], 1, "The Nile is usually measured as the longest"),
    q("English", Easy, "Which word is a noun?", ["Run", "Happy", "Table", "Quickly"], 2, "A table is a thing, so it is a noun"),
    q("English", Medium, "What is the plural of 'child'?", ["Childs", "Children", "Childes", "Childrens"], 1, "'Children' is the irregular plural"),
    q("English", Hard, "Which sentence uses the correct form of 'their'?", ["Their going home.", "The dog wagged their tail.", "They lost their keys.", "Put it over their."], 2, "'Their' shows possession"),
];

const DEFAULT_SUBJECT: &str = "Math";

/// Offline question provider with per-key repeat avoidance.
pub struct QuestionBank {
    state: Mutex<BankState>,
}

struct BankState {
    rng: StdRng,
    used: HashMap<String, Vec<usize>>,
}

impl QuestionBank {
    /// A bank with a random seed.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// A bank with a fixed seed, for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(BankState {
                rng: StdRng::seed_from_u64(seed),
                used: HashMap::new(),
            }),
        }
    }

    /// Subjects with built-in questions.
    pub fn subjects() -> Vec<&'static str> {
        let mut subjects: Vec<&'static str> = Vec::new();
        for entry in BANK {
            if !subjects.contains(&entry.subject) {
                subjects.push(entry.subject);
            }
        }
        subjects
    }

    /// Pick a question for the request.
    pub fn pick(&self, request: &QuestionRequest) -> Question {
        let subject = if BANK.iter().any(|e| e.subject == request.subject) {
            request.subject.as_str()
        } else {
            DEFAULT_SUBJECT
        };
        let mut pool = candidates(subject, request.difficulty);
        if pool.is_empty() {
            pool = candidates(subject, Medium);
        }

        let key = format!("{subject}/{}/{}", request.difficulty, request.interaction_type);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let BankState { rng, used } = &mut *state;
        let used = used.entry(key).or_default();
        let mut available: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|i| !used.contains(i))
            .collect();
        if available.is_empty() {
            used.clear();
            available = pool;
        }
        let Some(&index) = available.get(rng.random_range(0..available.len().max(1))) else {
            return Question::fallback();
        };
        used.push(index);
        to_question(&BANK[index])
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for QuestionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBank").finish_non_exhaustive()
    }
}

#[async_trait]
impl QuestionProvider for QuestionBank {
    async fn generate(&self, request: &QuestionRequest) -> ProviderResult<Question> {
        Ok(self.pick(request))
    }
}

fn candidates(subject: &str, difficulty: Difficulty) -> Vec<usize> {
    BANK.iter()
        .enumerate()
        .filter(|(_, e)| e.subject == subject && e.difficulty == difficulty)
        .map(|(i, _)| i)
        .collect()
}

fn to_question(entry: &Entry) -> Question {
    Question {
        question: entry.question.to_string(),
        options: entry.options.iter().map(|s| s.to_string()).collect(),
        correct_index: entry.correct,
        explanation: entry.explanation.to_string(),
    }
}
