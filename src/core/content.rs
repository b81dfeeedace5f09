//! # Biblioteca de Conteúdo — Lições, Quizzes e Frases de Apoio
//!
//! A [`ContentLibrary`] reúne todo o conteúdo **estático** do tutor:
//!
//! - [`Lesson`] / [`Phrase`]: lições de coreano com romanização e tradução
//! - [`QuizItem`]: banco de perguntas filtrável por nível e categoria
//! - Pools de texto: motivação, afirmações, prompts de inspiração, coping
//!
//! A biblioteca é construída **uma vez** na inicialização
//! ([`ContentLibrary::builtin()`]) e compartilhada via `Arc`; nada aqui é
//! mutado depois disso.
//!
//! ## Aleatoriedade Explícita
//!
//! Toda seleção aleatória recebe o gerador como parâmetro (`&mut R: Rng`).
//! Em produção os handlers passam um `StdRng::from_entropy()`; nos testes,
//! `StdRng::seed_from_u64(..)` torna as escolhas reprodutíveis.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Nível de dificuldade de uma lição ou pergunta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Beginner,
    Intermediate,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::Beginner, Level::Intermediate];

    pub fn label(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Categoria de uma pergunta de quiz.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vocab,
    Phrases,
    Grammar,
    Culture,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Vocab,
        Category::Phrases,
        Category::Grammar,
        Category::Culture,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Vocab => "vocab",
            Category::Phrases => "phrases",
            Category::Grammar => "grammar",
            Category::Culture => "culture",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Valor de filtro inválido vindo de um formulário.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filtro inválido: {0}")]
pub struct InvalidFilter(pub String);

/// Filtro de nível: `All` ou um nível específico.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelFilter(pub Option<Level>);

impl FromStr for LevelFilter {
    type Err = InvalidFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") || s.is_empty() {
            return Ok(Self(None));
        }
        Level::ALL
            .into_iter()
            .find(|l| l.label() == s)
            .map(|l| Self(Some(l)))
            .ok_or_else(|| InvalidFilter(s.to_string()))
    }
}

/// Filtro de categoria: `Any` ou uma categoria específica.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CategoryFilter(pub Option<Category>);

impl CategoryFilter {
    /// Label gravado junto do resultado do quiz (`mixed` sem filtro).
    pub fn record_label(self) -> &'static str {
        self.0.map(Category::label).unwrap_or("mixed")
    }
}

impl FromStr for CategoryFilter {
    type Err = InvalidFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("any") || s.is_empty() {
            return Ok(Self(None));
        }
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .map(|c| Self(Some(c)))
            .ok_or_else(|| InvalidFilter(s.to_string()))
    }
}

/// Uma frase de lição: Hangul, romanização e tradução.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Phrase {
    pub ko: &'static str,
    pub roman: &'static str,
    pub en: &'static str,
}

/// Lição temática com suas frases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub id: u32,
    pub level: Level,
    pub title: &'static str,
    pub phrases: Vec<Phrase>,
}

/// Pergunta de múltipla escolha.
///
/// O `id` é estável (posição no banco): o formulário de quiz o usa
/// para reencontrar a pergunta na correção.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizItem {
    pub id: usize,
    pub category: Category,
    pub question: &'static str,
    pub options: Vec<&'static str>,
    pub answer: &'static str,
    pub level: Level,
}

impl QuizItem {
    pub fn is_correct(&self, chosen: &str) -> bool {
        chosen == self.answer
    }
}

/// Número de perguntas permitido pelo formulário de quiz.
pub const QUIZ_LEN_MIN: usize = 3;
pub const QUIZ_LEN_MAX: usize = 10;
pub const QUIZ_LEN_DEFAULT: usize = 5;

/// Conteúdo estático imutável do tutor.
#[derive(Clone, Debug)]
pub struct ContentLibrary {
    pub lessons: Vec<Lesson>,
    pub quiz_bank: Vec<QuizItem>,
    pub motivation_quotes: Vec<&'static str>,
    pub inspiration_prompts: Vec<&'static str>,
    pub affirmations: Vec<&'static str>,
    pub coping_strategies: Vec<&'static str>,
}

fn phrase(ko: &'static str, roman: &'static str, en: &'static str) -> Phrase {
    Phrase { ko, roman, en }
}

fn quiz(
    category: Category,
    question: &'static str,
    options: [&'static str; 3],
    answer: &'static str,
    level: Level,
) -> (Category, &'static str, Vec<&'static str>, &'static str, Level) {
    (category, question, options.to_vec(), answer, level)
}

impl ContentLibrary {
    /// Conteúdo embutido do AmyeouBot.
    pub fn builtin() -> Self {
        use Category::*;
        use Level::*;

        let lessons = vec![
            Lesson {
                id: 1,
                level: Beginner,
                title: "Greetings & Introductions",
                phrases: vec![
                    phrase("안녕하세요", "Annyeonghaseyo", "Hello (formal)"),
                    phrase("안녕", "Annyeong", "Hi / Hello (informal)"),
                    phrase("감사합니다", "Gamsahamnida", "Thank you"),
                    phrase("죄송합니다", "Joesonghamnida", "I'm sorry"),
                    phrase("제 이름은 ... 입니다", "Je ireumeun ... imnida", "My name is ..."),
                ],
            },
            Lesson {
                id: 2,
                level: Beginner,
                title: "Daily Expressions & Politeness",
                phrases: vec![
                    phrase("잘 자요", "Jal jayo", "Good night (polite)"),
                    phrase("잘 지내요?", "Jal jinaeyo?", "How are you? (polite)"),
                    phrase("네 / 아니요", "Ne / Aniyo", "Yes / No"),
                    phrase("실례합니다", "Sillyehamnida", "Excuse me"),
                ],
            },
            Lesson {
                id: 3,
                level: Intermediate,
                title: "Encouragement & Comfort",
                phrases: vec![
                    phrase("힘내세요", "Himnaeseyo", "Cheer up / Stay strong"),
                    phrase("괜찮아요", "Gwaenchanayo", "It's okay / I'm okay"),
                    phrase("천천히 하세요", "Cheoncheonhi haseyo", "Take it slow"),
                    phrase("잘하고 있어요", "Jalhago isseoyo", "You're doing well"),
                ],
            },
        ];

        let quiz_bank = [
            quiz(Vocab, "How do you say 'Thank you' in Korean?", ["안녕", "감사합니다", "잘자요"], "감사합니다", Beginner),
            quiz(Vocab, "What does '힘내세요' mean?", ["Cheer up", "Goodbye", "Thank you"], "Cheer up", Intermediate),
            quiz(Vocab, "Translate to English: '안녕하세요'", ["Goodbye", "Hello (formal)", "See you"], "Hello (formal)", Beginner),
            quiz(Vocab, "What is '안녕' in English?", ["Hello (informal)", "Thank you", "Excuse me"], "Hello (informal)", Beginner),
            quiz(Culture, "Which bow is generally used for formal greetings in Korea?", ["Slight bow", "Deep bow", "Side bow"], "Deep bow", Intermediate),
            quiz(Grammar, "Which particle often marks the subject in Korean (informal)?", ["은/는", "이/가", "를/을"], "이/가", Intermediate),
            quiz(Vocab, "How do you say 'I'm sorry' politely in Korean?", ["미안", "미안해요", "죄송합니다"], "죄송합니다", Beginner),
            quiz(Vocab, "What does '괜찮아요' mean?", ["It's okay", "Thank you", "Goodbye"], "It's okay", Beginner),
            quiz(Phrases, "How to say 'Take it slow' in Korean?", ["힘내세요", "천천히 하세요", "잘 지내요"], "천천히 하세요", Intermediate),
        ]
        .into_iter()
        .enumerate()
        .map(|(id, (category, question, options, answer, level))| QuizItem {
            id,
            category,
            question,
            options,
            answer,
            level,
        })
        .collect();

        Self {
            lessons,
            quiz_bank,
            motivation_quotes: vec![
                "Small steps every day lead to big changes. Keep going.",
                "You are capable of more than you think. Take one tiny action today.",
                "Progress, not perfection. Celebrate small wins.",
                "Setbacks are setups for comebacks. You've got this.",
            ],
            inspiration_prompts: vec![
                "Name one thing you're grateful for today.",
                "What is one small goal you can complete in 30 minutes?",
                "Who inspires you and why?",
            ],
            affirmations: vec![
                "I am learning and improving every day.",
                "I deserve rest and progress in equal measure.",
                "I am capable of overcoming hard things.",
            ],
            coping_strategies: vec![
                "Try box breathing: inhale 4s — hold 4s — exhale 4s — hold 4s. Repeat 4 times.",
                "Take a 5-minute walk outside and notice your surroundings.",
                "Write down one thing you did well today, however small.",
            ],
        }
    }

    /// Perguntas que satisfazem **ambos** os filtros.
    pub fn quiz_pool(&self, level: LevelFilter, category: CategoryFilter) -> Vec<&QuizItem> {
        self.quiz_bank
            .iter()
            .filter(|q| level.0.map_or(true, |l| q.level == l))
            .filter(|q| category.0.map_or(true, |c| q.category == c))
            .collect()
    }

    pub fn quiz_item(&self, id: usize) -> Option<&QuizItem> {
        self.quiz_bank.get(id)
    }

    /// Lição sorteada, depois frase sorteada dentro dela.
    pub fn lesson_phrase<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Phrase> {
        self.lessons.choose(rng)?.phrases.choose(rng)
    }

    pub fn pick_motivation<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.motivation_quotes.choose(rng).copied()
    }

    pub fn pick_inspiration<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.inspiration_prompts.choose(rng).copied()
    }

    pub fn pick_affirmation<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.affirmations.choose(rng).copied()
    }

    pub fn pick_coping<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        self.coping_strategies.choose(rng).copied()
    }
}

/// Sorteia até `n` perguntas distintas do pool.
///
/// Pedir mais perguntas do que o pool tem devolve o pool inteiro
/// (embaralhado), nunca é erro.
pub fn sample_quiz<'a, R: Rng + ?Sized>(
    pool: &[&'a QuizItem],
    n: usize,
    rng: &mut R,
) -> Vec<&'a QuizItem> {
    pool.choose_multiple(rng, n.min(pool.len()))
        .copied()
        .collect()
}

/// Restringe o número de perguntas pedido ao intervalo do formulário.
pub fn clamp_quiz_len(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(QUIZ_LEN_DEFAULT)
        .clamp(QUIZ_LEN_MIN, QUIZ_LEN_MAX)
}
