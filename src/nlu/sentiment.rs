//! # Sentiment Scorer — Polaridade por Bag-of-Words
//!
//! Pontua texto livre em um inteiro no intervalo **[-5, 5]**:
//!
//! ```text
//! "I feel so anxious and tired"
//!   → tokens: i, feel, so, anxious, tired...
//!   → anxious (-1) + tired (-1) = -2
//! ```
//!
//! - Tokeniza por espaço em branco
//! - Remove pontuação das pontas (`.,!?;:()[]`) e põe em minúsculas
//! - `+1` por palavra positiva, `-1` por palavra negativa
//! - Soma limitada a [-5, 5]
//!
//! Os léxicos embutidos são **disjuntos**. Um léxico customizado com a
//! mesma palavra nos dois conjuntos aplica os dois deltas (soma 0).

use std::collections::HashSet;

/// Limite absoluto do score.
pub const SCORE_LIMIT: i32 = 5;

/// Caracteres removidos das pontas de cada token.
const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']'];

const POSITIVE_WORDS: &[&str] = &[
    "good", "happy", "well", "great", "fine", "better", "excited", "calm", "relaxed", "okay",
    "ok", "motivated",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sad", "stressed", "depressed", "anxious", "tired", "angry", "upset", "lonely", "worry",
    "worried", "burnout", "overwhelmed",
];

/// Léxicos positivo e negativo.
#[derive(Clone, Debug)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Lexicon {
    pub fn new<'a>(
        positive: impl IntoIterator<Item = &'a str>,
        negative: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            positive: positive.into_iter().map(str::to_lowercase).collect(),
            negative: negative.into_iter().map(str::to_lowercase).collect(),
        }
    }

    fn weight(&self, token: &str) -> i32 {
        i32::from(self.positive.contains(token)) - i32::from(self.negative.contains(token))
    }

    pub fn is_disjoint(&self) -> bool {
        self.positive.is_disjoint(&self.negative)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(POSITIVE_WORDS.iter().copied(), NEGATIVE_WORDS.iter().copied())
    }
}

/// Scorer puro e sem estado.
#[derive(Clone, Debug, Default)]
pub struct SentimentScorer {
    lexicon: Lexicon,
}

impl SentimentScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        if !lexicon.is_disjoint() {
            tracing::warn!("Léxico com palavras nos dois conjuntos; elas pontuam 0");
        }
        Self { lexicon }
    }

    /// Score em [-5, 5]. Texto vazio dá 0.
    pub fn score(&self, text: &str) -> i32 {
        let raw: i32 = text
            .split_whitespace()
            .map(|w| w.trim_matches(STRIP_CHARS).to_lowercase())
            .map(|token| self.lexicon.weight(&token))
            .sum();
        raw.clamp(-SCORE_LIMIT, SCORE_LIMIT)
    }
}

/// Classe de humor derivada do score; decide o ramo de resposta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Negative,
    Neutral,
    Positive,
}

impl Mood {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s < 0 => Mood::Negative,
            0 => Mood::Neutral,
            _ => Mood::Positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn anxious_and_tired_is_minus_two() {
        let s = SentimentScorer::default();
        assert_eq!(s.score("I feel so anxious and tired"), -2);
    }

    #[test]
    fn clamps_at_five() {
        let s = SentimentScorer::default();
        assert_eq!(s.score("happy happy happy happy happy happy"), 5);
        assert_eq!(s.score("sad sad sad sad sad sad sad"), -5);
    }

    #[test]
    fn blank_is_zero() {
        let s = SentimentScorer::default();
        assert_eq!(s.score(""), 0);
        assert_eq!(s.score("   \t "), 0);
    }

    #[test]
    fn punctuation_and_case_are_ignored() {
        let s = SentimentScorer::default();
        assert_eq!(s.score("HAPPY! (calm), [okay]."), 3);
        // só pontas: "well-being" não é "well"
        assert_eq!(s.score("well-being"), 0);
    }

    #[test]
    fn mixed_polarity_cancels() {
        let s = SentimentScorer::default();
        assert_eq!(s.score("good but worried"), 0);
    }

    #[test]
    fn overlapping_words_apply_both_deltas() {
        let lex = Lexicon::new(["meh", "nice"], ["meh"]);
        assert!(!lex.is_disjoint());
        let s = SentimentScorer::new(lex);
        assert_eq!(s.score("meh"), 0);
        assert_eq!(s.score("meh nice"), 1);
    }

    #[test]
    fn builtin_lexicon_is_disjoint() {
        assert!(Lexicon::default().is_disjoint());
    }

    #[test]
    fn mood_branches() {
        assert_eq!(Mood::from_score(-3), Mood::Negative);
        assert_eq!(Mood::from_score(0), Mood::Neutral);
        assert_eq!(Mood::from_score(2), Mood::Positive);
    }

    proptest! {
        #[test]
        fn score_is_bounded(s in ".{0,200}") {
            let score = SentimentScorer::default().score(&s);
            prop_assert!((-SCORE_LIMIT..=SCORE_LIMIT).contains(&score));
        }

        #[test]
        fn score_is_deterministic(s in ".{0,100}") {
            let scorer = SentimentScorer::default();
            prop_assert_eq!(scorer.score(&s), scorer.score(&s));
        }
    }
}
