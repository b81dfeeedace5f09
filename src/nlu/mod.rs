//! # NLU — Compreensão das Mensagens do Usuário
//!
//! Tudo que transforma texto livre em sinais para o dispatcher:
//!
//! ```text
//! Mensagem
//!   ├── classifier  → Option<Intent>   (camada opcional, pode estar indisponível)
//!   ├── keywords    → Intent           (fallback que nunca falha)
//!   └── sentiment   → i32 em [-5, 5]   (check-in de humor / ramo wellness)
//! ```
//!
//! | Módulo | Responsabilidade |
//! |--------|-----------------|
//! | [`keywords`] | Matcher determinístico por substring |
//! | [`sentiment`] | Score de polaridade bag-of-words |
//! | [`classifier`] | Contrato `ZeroShotClassifier` + adaptadores (indisponível, lazy, timeout) |
//! | [`zero_shot`] | Classificador real por similaridade de embeddings |
//! | [`embedder`] | Modelo BERT via candle |

pub mod classifier;
pub mod embedder;
pub mod keywords;
pub mod sentiment;
pub mod zero_shot;

pub use classifier::{LazyClassifier, TimeBoxed, Unavailable, ZeroShotClassifier};
pub use keywords::KeywordMatcher;
pub use sentiment::{Mood, SentimentScorer};
