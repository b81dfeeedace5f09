//! # Síntese de Voz — Pronúncia das Frases
//!
//! Fronteira com o serviço externo de TTS. Dado um texto curto e um
//! código de idioma, devolve bytes MP3 ou `None`. Falhas **nunca** viram
//! erro para quem chama: a página de lições simplesmente não toca áudio.
//!
//! | Tipo | Papel |
//! |------|-------|
//! | [`Silent`] | Sempre `None` (voz desligada na config) |
//! | [`TranslateTts`] | GET no endpoint público de TTS do Google Translate |
//! | [`CachedSpeech`] | Memoriza clipes já sintetizados por `(texto, idioma)` |
//!
//! As chamadas são bloqueantes; os handlers as executam em `spawn_blocking`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use moka::sync::Cache;
use reqwest::blocking::Client;
use reqwest::Url;

const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Sintetizador de voz opcional.
pub trait SpeechSynth: Send + Sync {
    /// Áudio MP3 para `text` no idioma `lang` (ex.: `"ko"`), ou `None`.
    fn synthesize(&self, text: &str, lang: &str) -> Option<Vec<u8>>;
}

/// Voz desligada.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl SpeechSynth for Silent {
    fn synthesize(&self, _text: &str, _lang: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Cliente HTTP do TTS do Google Translate.
pub struct TranslateTts {
    client: Client,
}

impl TranslateTts {
    /// O client `reqwest::blocking` não pode ser criado dentro do runtime
    /// async; chame em `spawn_blocking`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("amyeou-tutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build TTS HTTP client")?;
        Ok(Self { client })
    }

    fn fetch(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let url = request_url(text, lang)?;
        let response = self
            .client
            .get(url)
            .send()
            .context("TTS request failed")?
            .error_for_status()
            .context("TTS endpoint returned an error")?;
        let bytes = response.bytes().context("Failed to read TTS body")?;
        anyhow::ensure!(!bytes.is_empty(), "TTS endpoint returned an empty body");
        Ok(bytes.to_vec())
    }
}

impl SpeechSynth for TranslateTts {
    fn synthesize(&self, text: &str, lang: &str) -> Option<Vec<u8>> {
        match self.fetch(text, lang) {
            Ok(bytes) => {
                tracing::debug!(lang, size_bytes = bytes.len(), "Áudio sintetizado");
                Some(bytes)
            }
            Err(e) => {
                tracing::warn!(lang, error = %e, "Síntese de voz indisponível");
                None
            }
        }
    }
}

/// URL do endpoint de TTS com os parâmetros da frase.
fn request_url(text: &str, lang: &str) -> Result<Url> {
    Url::parse_with_params(
        TTS_ENDPOINT,
        &[("ie", "UTF-8"), ("q", text), ("tl", lang), ("client", "tw-ob")],
    )
    .context("Invalid TTS URL")
}

/// Cache em memória na frente de outro sintetizador.
///
/// Só sucessos são guardados: uma falha transitória não fica presa no
/// cache e a próxima chamada tenta de novo. O texto vem da query string de
/// `/audio`, então o cache é limitado (`moka`, TinyLFU) a `capacity` clipes.
pub struct CachedSpeech {
    inner: Arc<dyn SpeechSynth>,
    clips: Cache<(String, String), Arc<[u8]>>,
}

impl CachedSpeech {
    pub fn new(inner: Arc<dyn SpeechSynth>, capacity: u64) -> Self {
        let clips = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self { inner, clips }
    }

    /// Clipes em cache, depois de aplicar as evicções pendentes.
    pub fn len(&self) -> u64 {
        self.clips.run_pending_tasks();
        self.clips.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpeechSynth for CachedSpeech {
    fn synthesize(&self, text: &str, lang: &str) -> Option<Vec<u8>> {
        let key = (text.to_string(), lang.to_string());
        if let Some(clip) = self.clips.get(&key) {
            return Some(clip.to_vec());
        }
        let bytes = self.inner.synthesize(text, lang)?;
        self.clips.insert(key, Arc::from(bytes.as_slice()));
        Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Conta chamadas; falha nas `fail_first` primeiras.
    struct Counting {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl Counting {
        fn new(fail_first: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }
    }

    impl SpeechSynth for Counting {
        fn synthesize(&self, text: &str, lang: &str) -> Option<Vec<u8>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            (n >= self.fail_first).then(|| format!("{lang}:{text}").into_bytes())
        }
    }

    #[test]
    fn silent_never_produces_audio() {
        assert_eq!(Silent.synthesize("안녕하세요", "ko"), None);
    }

    #[test]
    fn cache_hits_skip_the_inner_synth() {
        let inner = Arc::new(Counting::new(0));
        let cached = CachedSpeech::new(inner.clone(), 16);

        assert_eq!(cached.synthesize("감사합니다", "ko").unwrap(), "ko:감사합니다".as_bytes());
        assert_eq!(cached.synthesize("감사합니다", "ko").unwrap(), "ko:감사합니다".as_bytes());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.synthesize("감사합니다", "en").unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let inner = Arc::new(Counting::new(1));
        let cached = CachedSpeech::new(inner.clone(), 16);

        assert_eq!(cached.synthesize("네", "ko"), None);
        assert!(cached.is_empty());
        assert!(cached.synthesize("네", "ko").is_some());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn request_url_encodes_hangul() {
        let url = request_url("안녕 하세요", "ko").unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["q"], "안녕 하세요");
        assert_eq!(params["tl"], "ko");
        assert_eq!(params["client"], "tw-ob");
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn cache_stays_bounded_under_distinct_texts() {
        let inner = Arc::new(Counting::new(0));
        let cached = CachedSpeech::new(inner.clone(), 8);

        for i in 0..500 {
            assert!(cached.synthesize(&format!("문장 {i}"), "ko").is_some());
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 500);
        let len = cached.len();
        assert!(len <= 8, "cache grew to {len} clips");
    }
}
