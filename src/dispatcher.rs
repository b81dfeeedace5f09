//! # Dispatcher — Do Texto à Resposta
//!
//! O [`Dispatcher`] é o **coração do tutor**: resolve o intent de cada
//! mensagem e escolhe a resposta correspondente, lendo da
//! [`ContentLibrary`] ou gravando via [`HistoryStore`].
//!
//! ## Resolução em Duas Camadas
//!
//! ```text
//! Utterance
//!   │
//!   ├── 1. ZeroShotClassifier.classify(texto, Intent::ALL)
//!   │      └── Some(intent) → vence, sem mistura de scores
//!   │
//!   └── 2. None → KeywordMatcher.classify(texto)  (nunca falha)
//! ```
//!
//! Não há retry nem memória entre chamadas: com o mesmo texto e o mesmo
//! estado do classificador, [`Dispatcher::resolve()`] devolve sempre o
//! mesmo resultado.
//!
//! ## Seleção de Resposta
//!
//! | Intent | Resposta |
//! |--------|----------|
//! | `greeting` | saudação fixa |
//! | `learn_korean` | frase sorteada de uma lição |
//! | `quiz` | indica a página de quizzes |
//! | `wellness` | ramo pelo sentimento (acolhimento + coping / neutro / afirmação) |
//! | `motivation` | citação sorteada |
//! | `inspiration` | prompt sorteado |
//! | `journal` | grava a mensagem no diário |
//! | `smalltalk`, `unknown` | resposta genérica |
//!
//! O mapeamento é total: nenhum intent produz erro.
//!
//! ## Efeitos Colaterais
//!
//! Escritas no histórico são fire-and-forget: uma falha do banco é
//! registrada em `error` e a resposta avisa que nada foi salvo, mas a
//! conversa continua.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::core::{ContentLibrary, Intent, IntentSource, QuizItem, Utterance, UtteranceResult};
use crate::nlu::{KeywordMatcher, Mood, SentimentScorer, ZeroShotClassifier};
use crate::persistence::HistoryStore;

pub const GREETING_REPLY: &str = "안녕하세요! (Annyeonghaseyo) — Hi!";
pub const QUIZ_REFERRAL: &str = "Try the 'Quizzes' page for practice questions.";
pub const FALLBACK_REPLY: &str = "Hmm, try asking me to teach Korean or give motivation.";
pub const JOURNAL_SAVED: &str = "Reflection saved.";
pub const JOURNAL_NOT_SAVED: &str = "Sorry, I couldn't save that reflection right now.";

pub const SYMPATHY_REPLY: &str = "I'm sorry you're feeling this way 💙";
pub const NEUTRAL_REPLY: &str = "Thanks for sharing. Maybe try a quiz or a breathing exercise.";
pub const AFFIRMING_REPLY: &str = "I'm glad you're feeling good! 🌸";

/// Resposta do chat, uma ou mais linhas em ordem de exibição.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub lines: Vec<String>,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }
}

/// Resultado de um check-in de humor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MoodOutcome {
    pub score: i32,
    /// Linha principal (acolhimento, neutra ou afirmação).
    pub message: &'static str,
    /// Estratégia de coping, só no ramo negativo.
    pub coping: Option<&'static str>,
    /// `false` se a gravação da entrada de humor falhou.
    pub saved: bool,
}

/// Placar de um quiz corrigido.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub percent: u32,
}

/// Corrige um quiz. `answers[i]` é a opção escolhida para `items[i]`;
/// pergunta sem resposta conta como errada.
///
/// `percent` usa divisão inteira (`2/3` → 66). Quiz vazio dá 0%.
pub fn grade(items: &[&QuizItem], answers: &[Option<&str>]) -> QuizScore {
    let total = items.len();
    let correct = items
        .iter()
        .enumerate()
        .filter(|(i, item)| {
            answers
                .get(*i)
                .copied()
                .flatten()
                .is_some_and(|chosen| item.is_correct(chosen))
        })
        .count();
    let percent = if total == 0 {
        0
    } else {
        (correct * 100 / total) as u32
    };
    QuizScore {
        correct,
        total,
        percent,
    }
}

/// Resolve intents e monta respostas.
pub struct Dispatcher {
    classifier: Arc<dyn ZeroShotClassifier>,
    matcher: KeywordMatcher,
    scorer: SentimentScorer,
    content: Arc<ContentLibrary>,
    store: Arc<dyn HistoryStore>,
}

impl Dispatcher {
    /// Monta o dispatcher com suas dependências já escolhidas.
    ///
    /// Para rodar só com keywords, injete
    /// [`Unavailable`](crate::nlu::Unavailable) como classificador.
    pub fn new(
        classifier: Arc<dyn ZeroShotClassifier>,
        matcher: KeywordMatcher,
        scorer: SentimentScorer,
        content: Arc<ContentLibrary>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            classifier,
            matcher,
            scorer,
            content,
            store,
        }
    }

    pub fn content(&self) -> &ContentLibrary {
        &self.content
    }

    /// Classificador primeiro; keywords se ele não responder.
    pub fn resolve(&self, utterance: &Utterance) -> UtteranceResult {
        let text = utterance.as_str();
        let (intent, source) = match self.classifier.classify(text, &Intent::ALL) {
            Some(intent) => (intent, IntentSource::Classifier),
            None => (self.matcher.classify(text), IntentSource::Keyword),
        };
        tracing::debug!(
            %intent,
            ?source,
            classifier = self.classifier.name(),
            "Intent resolvido"
        );
        UtteranceResult {
            raw_text: text.to_string(),
            intent,
            source,
        }
    }

    /// Resposta para um intent já resolvido.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        user: &str,
        resolved: &UtteranceResult,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Reply {
        match resolved.intent {
            Intent::Greeting => Reply::line(GREETING_REPLY),
            Intent::LearnKorean => match self.content.lesson_phrase(rng) {
                Some(p) => Reply::line(format!("{} ({}) — {}", p.ko, p.roman, p.en)),
                None => Reply::line(FALLBACK_REPLY),
            },
            Intent::Quiz => Reply::line(QUIZ_REFERRAL),
            Intent::Wellness => {
                let score = self.scorer.score(&resolved.raw_text);
                let (message, coping) = self.mood_reply(score, rng);
                Reply {
                    lines: std::iter::once(message)
                        .chain(coping)
                        .map(str::to_string)
                        .collect(),
                }
            }
            Intent::Motivation => {
                Reply::line(self.content.pick_motivation(rng).unwrap_or(FALLBACK_REPLY))
            }
            Intent::Inspiration => {
                Reply::line(self.content.pick_inspiration(rng).unwrap_or(FALLBACK_REPLY))
            }
            Intent::Journal => {
                match self.store.record_journal_entry(user, &resolved.raw_text, now) {
                    Ok(()) => Reply::line(JOURNAL_SAVED),
                    Err(e) => {
                        tracing::error!(user, error = %e, "Falha ao salvar entrada do diário");
                        Reply::line(JOURNAL_NOT_SAVED)
                    }
                }
            }
            Intent::Smalltalk | Intent::Unknown => Reply::line(FALLBACK_REPLY),
        }
    }

    /// `resolve` + `respond` em uma chamada. Texto em branco → `None`.
    pub fn chat<R: Rng + ?Sized>(
        &self,
        user: &str,
        raw: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<(UtteranceResult, Reply)> {
        let utterance = Utterance::parse(raw)?;
        let resolved = self.resolve(&utterance);
        let reply = self.respond(user, &resolved, now, rng);
        Some((resolved, reply))
    }

    /// Check-in de humor: pontua, grava e escolhe o ramo de resposta.
    pub fn check_in<R: Rng + ?Sized>(
        &self,
        user: &str,
        text: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<MoodOutcome> {
        let utterance = Utterance::parse(text)?;
        let score = self.scorer.score(utterance.as_str());
        let saved = match self.store.record_mood(user, utterance.as_str(), score, now) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user, error = %e, "Falha ao salvar humor");
                false
            }
        };
        let (message, coping) = self.mood_reply(score, rng);
        Some(MoodOutcome {
            score,
            message,
            coping,
            saved,
        })
    }

    /// Grava uma reflexão. Texto em branco ou falha do banco → `false`.
    pub fn write_journal(&self, user: &str, text: &str, now: DateTime<Utc>) -> bool {
        let Some(utterance) = Utterance::parse(text) else {
            return false;
        };
        match self.store.record_journal_entry(user, utterance.as_str(), now) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user, error = %e, "Falha ao salvar entrada do diário");
                false
            }
        }
    }

    /// Corrige o quiz e grava o percentual com o label de categoria.
    ///
    /// Devolve o placar e se a gravação deu certo.
    pub fn submit_quiz(
        &self,
        user: &str,
        category_label: &str,
        items: &[&QuizItem],
        answers: &[Option<&str>],
        now: DateTime<Utc>,
    ) -> (QuizScore, bool) {
        let score = grade(items, answers);
        let saved = match self
            .store
            .record_quiz_result(user, category_label, score.percent, now)
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(user, error = %e, "Falha ao salvar resultado do quiz");
                false
            }
        };
        tracing::info!(
            user,
            category = category_label,
            correct = score.correct,
            total = score.total,
            "Quiz corrigido"
        );
        (score, saved)
    }

    fn mood_reply<R: Rng + ?Sized>(
        &self,
        score: i32,
        rng: &mut R,
    ) -> (&'static str, Option<&'static str>) {
        match Mood::from_score(score) {
            Mood::Negative => (SYMPATHY_REPLY, self.content.pick_coping(rng)),
            Mood::Neutral => (NEUTRAL_REPLY, None),
            Mood::Positive => (AFFIRMING_REPLY, None),
        }
    }
}
