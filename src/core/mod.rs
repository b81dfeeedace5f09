//! # Módulo Core — Tipos do Domínio do Tutor
//!
//! Tipos fundamentais compartilhados por NLU, dispatcher e web:
//!
//! - [`Intent`]: conjunto fechado de intenções conversacionais
//! - [`Utterance`] / [`UtteranceResult`]: texto validado e resultado da resolução
//! - [`ContentLibrary`]: lições, banco de quiz e pools de frases (somente leitura)

/// Sub-módulo com [`Intent`], [`IntentSource`], [`Utterance`] e [`UtteranceResult`].
pub mod intent;

/// Sub-módulo com o conteúdo estático: lições, quizzes, citações.
pub mod content;

pub use content::{Category, CategoryFilter, ContentLibrary, Lesson, Level, LevelFilter, Phrase, QuizItem};
pub use intent::{Intent, IntentSource, Utterance, UtteranceResult};
