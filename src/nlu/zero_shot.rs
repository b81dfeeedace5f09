//! # Zero-Shot por Similaridade de Embeddings
//!
//! [`EmbeddingZeroShot`] é a implementação real de
//! [`ZeroShotClassifier`]: cada intent ganha uma **hipótese** em linguagem
//! natural, embeddada uma única vez na inicialização. Na classificação, o
//! embedding da mensagem é comparado por cosine similarity com as hipóteses
//! dos candidatos pedidos, e o top-1 vence.
//!
//! ```text
//! "could you cheer me up"
//!   ├── greeting     "The user is saying hello..."        0.21
//!   ├── motivation   "The user wants encouragement..."    0.58  ← top-1
//!   └── ...
//! ```
//!
//! Não há limiar mínimo: quando o classificador responde, ele vence.
//! Qualquer erro do modelo (tokenização, forward pass) vira `None` e é
//! registrado em `warn`.

use anyhow::Result;

use super::classifier::ZeroShotClassifier;
use super::embedder::Embedder;
use crate::core::Intent;

/// Hipótese textual usada para representar cada intent.
pub fn hypothesis(intent: Intent) -> &'static str {
    match intent {
        Intent::Greeting => "The user is saying hello or greeting someone.",
        Intent::LearnKorean => "The user wants to learn a Korean word or phrase.",
        Intent::Quiz => "The user wants a quiz, a test or practice questions.",
        Intent::Wellness => "The user feels sad, stressed, anxious, tired or lonely.",
        Intent::Motivation => "The user wants motivation or encouragement to keep going.",
        Intent::Inspiration => "The user wants an inspiring idea or a reflection prompt.",
        Intent::Journal => "The user wants to write a journal or diary reflection.",
        Intent::Smalltalk => "The user is making casual small talk.",
        Intent::Unknown => "The message is unclear or about something unrelated.",
    }
}

/// Cosine similarity entre dois vetores; `0.0` para tamanhos diferentes,
/// vazios ou de norma zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, na, nb), (x, y)| {
            (d + x * y, na + x * x, nb + y * y)
        });
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Devolve o candidato cuja hipótese é mais similar ao embedding.
///
/// Empates ficam com o primeiro candidato na ordem dada.
pub fn rank_top1(
    embedding: &[f32],
    hypotheses: &[(Intent, Vec<f32>)],
    candidates: &[Intent],
) -> Option<Intent> {
    let mut best: Option<(Intent, f32)> = None;
    for &candidate in candidates {
        let Some((_, hyp)) = hypotheses.iter().find(|(i, _)| *i == candidate) else {
            continue;
        };
        let score = cosine_similarity(embedding, hyp);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(intent, _)| intent)
}

/// Classificador zero-shot baseado em [`Embedder`].
pub struct EmbeddingZeroShot {
    embedder: Embedder,
    hypotheses: Vec<(Intent, Vec<f32>)>,
}

impl EmbeddingZeroShot {
    /// Embedda as hipóteses de todos os intents em um único lote.
    pub fn new(embedder: Embedder) -> Result<Self> {
        let texts: Vec<String> = Intent::ALL
            .iter()
            .map(|&i| hypothesis(i).to_string())
            .collect();
        let embeddings = embedder.embed_batch(&texts)?;
        let hypotheses = Intent::ALL.into_iter().zip(embeddings).collect();
        Ok(Self {
            embedder,
            hypotheses,
        })
    }

    fn try_classify(&self, text: &str, candidates: &[Intent]) -> Result<Option<Intent>> {
        let embedding = self.embedder.embed(text)?;
        Ok(rank_top1(&embedding, &self.hypotheses, candidates))
    }
}

impl ZeroShotClassifier for EmbeddingZeroShot {
    fn classify(&self, text: &str, candidates: &[Intent]) -> Option<Intent> {
        match self.try_classify(text, candidates) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::warn!(error = %e, "Classificação zero-shot falhou");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "embedding-zero-shot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs_are_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn every_intent_has_a_distinct_hypothesis() {
        let mut seen = std::collections::HashSet::new();
        for intent in Intent::ALL {
            assert!(seen.insert(hypothesis(intent)));
        }
    }

    fn toy_hypotheses() -> Vec<(Intent, Vec<f32>)> {
        vec![
            (Intent::Greeting, vec![1.0, 0.0, 0.0]),
            (Intent::Quiz, vec![0.0, 1.0, 0.0]),
            (Intent::Inspiration, vec![0.0, 0.0, 1.0]),
        ]
    }

    #[test]
    fn top1_picks_most_similar_candidate() {
        let hyps = toy_hypotheses();
        let emb = [0.1, 0.2, 0.9];
        assert_eq!(rank_top1(&emb, &hyps, &Intent::ALL), Some(Intent::Inspiration));
    }

    #[test]
    fn top1_is_restricted_to_candidates() {
        let hyps = toy_hypotheses();
        let emb = [0.1, 0.2, 0.9];
        assert_eq!(
            rank_top1(&emb, &hyps, &[Intent::Greeting, Intent::Quiz]),
            Some(Intent::Quiz)
        );
        assert_eq!(rank_top1(&emb, &hyps, &[]), None);
        assert_eq!(rank_top1(&emb, &hyps, &[Intent::Journal]), None);
    }
}
