//! # Intents — O Vocabulário Fechado da Conversa
//!
//! Toda mensagem do chat é resolvida para exatamente um [`Intent`].
//! O conjunto é **fechado** e definido uma única vez aqui: o
//! [`KeywordMatcher`](crate::nlu::keywords::KeywordMatcher) e o
//! classificador zero-shot compartilham a mesma enumeração.
//!
//! | Intent | Label | Resposta típica |
//! |--------|-------|-----------------|
//! | [`Greeting`](Intent::Greeting) | `greeting` | "안녕하세요!" |
//! | [`LearnKorean`](Intent::LearnKorean) | `learn_korean` | frase aleatória de uma lição |
//! | [`Quiz`](Intent::Quiz) | `quiz` | indica a página de quizzes |
//! | [`Wellness`](Intent::Wellness) | `wellness` | acolhimento + estratégia de coping |
//! | [`Motivation`](Intent::Motivation) | `motivation` | citação motivacional |
//! | [`Inspiration`](Intent::Inspiration) | `inspiration` | prompt de inspiração |
//! | [`Journal`](Intent::Journal) | `journal` | salva a mensagem no diário |
//! | [`Smalltalk`](Intent::Smalltalk) | `smalltalk` | resposta genérica |
//! | [`Unknown`](Intent::Unknown) | `unknown` | resposta genérica |
//!
//! ## Fronteira de Entrada
//!
//! [`Utterance::parse()`] é o portão de entrada: normaliza Unicode (NFC)
//! e rejeita texto em branco **antes** de qualquer classificação. A
//! normalização importa para o coreano: um "안녕" digitado em NFD
//! (jamo separados) não casaria com as keywords compostas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Intenção conversacional resolvida a partir do texto do usuário.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Saudação ("hi", "안녕하세요").
    Greeting,
    /// Pedido para aprender coreano.
    LearnKorean,
    /// Pedido de quiz/prática.
    Quiz,
    /// Sinais de angústia ou cansaço.
    Wellness,
    /// Pedido de motivação.
    Motivation,
    /// Pedido de inspiração; só alcançável pelo classificador.
    Inspiration,
    /// Reflexão para o diário.
    Journal,
    /// Conversa solta; default do matcher por keywords.
    Smalltalk,
    /// Nada reconhecível; só alcançável pelo classificador.
    Unknown,
}

impl Intent {
    /// Todos os intents, na ordem de declaração.
    ///
    /// É o conjunto de candidatos que o dispatcher entrega ao classificador.
    pub const ALL: [Intent; 9] = [
        Intent::Greeting,
        Intent::LearnKorean,
        Intent::Quiz,
        Intent::Wellness,
        Intent::Motivation,
        Intent::Inspiration,
        Intent::Journal,
        Intent::Smalltalk,
        Intent::Unknown,
    ];

    /// Label snake_case, idêntico à serialização serde.
    pub fn label(self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::LearnKorean => "learn_korean",
            Intent::Quiz => "quiz",
            Intent::Wellness => "wellness",
            Intent::Motivation => "motivation",
            Intent::Inspiration => "inspiration",
            Intent::Journal => "journal",
            Intent::Smalltalk => "smalltalk",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Erro de parsing de um label desconhecido.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("intent desconhecido: {0}")]
pub struct UnknownIntentLabel(pub String);

impl FromStr for Intent {
    type Err = UnknownIntentLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == s)
            .ok_or_else(|| UnknownIntentLabel(s.to_string()))
    }
}

/// Qual camada resolveu o intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    /// Classificador zero-shot (camada opcional).
    Classifier,
    /// Fallback determinístico por keywords.
    Keyword,
}

/// Texto do usuário já validado: NFC, sem espaços nas pontas, não vazio.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance(String);

impl Utterance {
    /// Valida texto bruto vindo da UI.
    ///
    /// Retorna `None` para texto vazio ou só com espaços; nesse caso
    /// nada é despachado nem persistido.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw.nfc().collect();
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resultado de uma resolução de intent. Criado por chamada, nunca persistido.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UtteranceResult {
    /// Texto como o usuário enviou (após validação).
    pub raw_text: String,
    /// Intent resolvido.
    pub intent: Intent,
    /// Camada que decidiu.
    pub source: IntentSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for intent in Intent::ALL {
            assert_eq!(intent.label().parse::<Intent>(), Ok(intent));
        }
        assert!("farewell".parse::<Intent>().is_err());
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Intent::LearnKorean).unwrap();
        assert_eq!(json, "\"learn_korean\"");
    }

    #[test]
    fn blank_utterance_is_rejected() {
        assert_eq!(Utterance::parse(""), None);
        assert_eq!(Utterance::parse("   \n\t"), None);
    }

    #[test]
    fn utterance_is_trimmed_and_composed() {
        // "안녕" em jamo decompostos (NFD)
        let decomposed: String = "안녕".nfd().collect();
        let u = Utterance::parse(&format!("  {}  ", decomposed)).unwrap();
        assert_eq!(u.as_str(), "안녕");
    }
}
