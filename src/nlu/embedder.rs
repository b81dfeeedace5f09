//! # Embedder — Sentenças em Vetores via Candle
//!
//! O [`Embedder`] carrega um modelo BERT de sentence embeddings do
//! HuggingFace Hub (por padrão `sentence-transformers/all-MiniLM-L6-v2`,
//! 384 dimensões) e transforma texto em vetores normalizados.
//!
//! ## Pipeline
//!
//! ```text
//! Texto → Tokenizer → Token IDs → BERT Forward → Mean Pooling → L2 Normalize
//!                                                        ↓
//!                                                  Vec<f32> (384-dim)
//! ```
//!
//! ## Carregamento
//!
//! | Arquivo | Origem |
//! |---------|--------|
//! | `config.json` | Hub (obrigatório) |
//! | `tokenizer.json` | Hub (obrigatório) |
//! | Pesos | `model.safetensors`, com fallback para `pytorch_model.bin` |
//!
//! Os arquivos ficam em `~/.cache/huggingface/` depois do primeiro download.
//! O carregamento é bloqueante e roda em `spawn_blocking` (ver `main.rs`).

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert;
use hf_hub::api::sync::Api;
use tokenizers::{Tokenizer, TruncationParams};

/// Comprimento máximo em tokens; mensagens de chat raramente chegam perto.
const MAX_TOKENS: usize = 256;

/// Modelo BERT + tokenizer, sempre em CPU.
pub struct Embedder {
    model: bert::BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl Embedder {
    /// Baixa (ou lê do cache) e carrega o modelo `repo_id`.
    ///
    /// # Erros
    ///
    /// Falha de rede no primeiro download, arquivos corrompidos, ou
    /// configuração incompatível com `bert::Config`.
    pub fn load(repo_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        tracing::info!(repo = repo_id, "Loading embedding model from HuggingFace Hub...");
        let api = Api::new().context("Failed to create HF Hub API")?;
        let repo = api.model(repo_id.to_string());

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow::anyhow!("{}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        // Padding é montado à mão em embed_batch()
        tokenizer.with_padding(None);

        let config_str = std::fs::read_to_string(&config_path)?;
        let config: bert::Config =
            serde_json::from_str(&config_str).context("Failed to parse model config")?;

        let vb = match repo.get("model.safetensors") {
            Ok(safetensors_path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[safetensors_path], DType::F32, &device)
                    .context("Failed to load safetensors weights")?
            },
            Err(_) => {
                tracing::info!("model.safetensors not available, falling back to pytorch_model.bin");
                let weights_path = repo
                    .get("pytorch_model.bin")
                    .context("Failed to download pytorch_model.bin")?;
                VarBuilder::from_pth(&weights_path, DType::F32, &device)
                    .context("Failed to load pytorch weights")?
            }
        };

        let model = bert::BertModel::load(vb, &config).context("Failed to load BERT model")?;
        tracing::info!(repo = repo_id, "Embedding model loaded");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    /// Embedding de um único texto.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()])?;
        batch.pop().context("Empty embedding batch")
    }

    /// Embeddings de vários textos em uma única forward pass.
    ///
    /// Textos curtos são completados com zeros até o maior do lote; o
    /// attention mask garante que o padding não entre no pooling.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();
        let mut all_ids = vec![0u32; batch_size * max_len];
        let all_type_ids = vec![0u32; batch_size * max_len];
        let mut all_mask = vec![0u32; batch_size * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            let offset = i * max_len;
            for (j, (&id, &mask)) in enc
                .get_ids()
                .iter()
                .zip(enc.get_attention_mask())
                .enumerate()
            {
                all_ids[offset + j] = id;
                all_mask[offset + j] = mask;
            }
        }

        let input_ids = Tensor::from_vec(all_ids, (batch_size, max_len), &self.device)?;
        let token_type_ids = Tensor::from_vec(all_type_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(all_mask, (batch_size, max_len), &self.device)?;

        // [batch, seq, hidden]
        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .to_dtype(DType::F32)?
            .broadcast_as(output.shape())?;
        let summed = (output * mask_expanded.clone())?.sum(1)?;
        let mask_sum = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;
        let pooled = (summed / mask_sum)?;

        let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = pooled.broadcast_div(&norm)?;

        (0..batch_size)
            .map(|i| -> Result<Vec<f32>> { Ok(normalized.get(i)?.to_vec1()?) })
            .collect()
    }
}
