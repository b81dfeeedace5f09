//! # Matcher por Keywords — O Fallback Determinístico
//!
//! O [`KeywordMatcher`] adivinha o intent por **substring matching**
//! case-insensitive contra listas fixas de marcadores. É a camada que
//! sempre funciona: não depende de modelo, não falha, não tem estado.
//!
//! ## Ordem de Avaliação
//!
//! A ordem é significativa: a **primeira** categoria com algum marcador
//! presente vence:
//!
//! ```text
//! 1. greeting      hi, hello, 안녕, 안녕하세요
//! 2. learn_korean  teach, learn, korean, phrase, 한국어, 말
//! 3. quiz          quiz, test, practice, question
//! 4. wellness      sad, stressed, anxious, depressed, tired, lonely, i feel, i'm feeling
//! 5. motivation    motivate, motivation, inspire, inspiration, encourage
//! 6. journal       journal, diary, write, reflect
//! 7. (nenhuma)     → smalltalk
//! ```
//!
//! `"hello, give me a quiz"` resolve para `greeting`, não `quiz`.
//!
//! ## Limitações Conhecidas
//!
//! - Substring puro: "hi" casa dentro de "this" e "think". Mantido como está.
//! - `inspiration` e `unknown` **nunca** saem daqui, só o classificador
//!   zero-shot alcança esses intents. "inspire" cai em `motivation`.

use crate::core::Intent;

/// Regras padrão, em ordem de prioridade.
const DEFAULT_RULES: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["hi", "hello", "안녕", "안녕하세요"]),
    (Intent::LearnKorean, &["teach", "learn", "korean", "phrase", "한국어", "말"]),
    (Intent::Quiz, &["quiz", "test", "practice", "question"]),
    (
        Intent::Wellness,
        &["sad", "stressed", "anxious", "depressed", "tired", "lonely", "i feel", "i'm feeling"],
    ),
    (
        Intent::Motivation,
        &["motivate", "motivation", "inspire", "inspiration", "encourage"],
    ),
    (Intent::Journal, &["journal", "diary", "write", "reflect"]),
];

/// Uma regra: intent + marcadores (já em minúsculas).
#[derive(Clone, Debug)]
pub struct KeywordRule {
    pub intent: Intent,
    pub markers: Vec<String>,
}

/// Tabela ordenada de regras. Construída uma vez e injetada no matcher.
#[derive(Clone, Debug)]
pub struct KeywordTable {
    rules: Vec<KeywordRule>,
    fallback: Intent,
}

impl KeywordTable {
    /// Cria uma tabela a partir de regras em ordem de prioridade.
    ///
    /// Os marcadores são normalizados para minúsculas aqui, uma única vez.
    pub fn new(rules: &[(Intent, &[&str])], fallback: Intent) -> Self {
        let rules = rules
            .iter()
            .map(|&(intent, markers)| KeywordRule {
                intent,
                markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            })
            .collect();
        Self { rules, fallback }
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(DEFAULT_RULES, Intent::Smalltalk)
    }
}

/// Classificador determinístico por substring.
#[derive(Clone, Debug, Default)]
pub struct KeywordMatcher {
    table: KeywordTable,
}

impl KeywordMatcher {
    pub fn new(table: KeywordTable) -> Self {
        Self { table }
    }

    /// Classifica o texto. Sempre devolve um intent (default `smalltalk`).
    pub fn classify(&self, text: &str) -> Intent {
        let lowered = text.to_lowercase();
        self.table
            .rules
            .iter()
            .find(|rule| rule.markers.iter().any(|m| lowered.contains(m.as_str())))
            .map(|rule| rule.intent)
            .unwrap_or(self.table.fallback)
    }
}
