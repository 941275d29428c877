use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use ingest_domain::{DomainError, Embedding, TextEncoderPort};

use crate::device::{select_device, DeviceChoice};

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

#[derive(Debug, Clone)]
pub struct BertEncoderConfig {
    pub model_name: String,
    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_dir: PathBuf,
    pub device: DeviceChoice,
    pub max_sequence_length: usize,
}

/// Sentence encoder: BERT forward pass, attention-masked mean pooling, L2 normalization.
pub struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
}

impl BertEncoder {
    pub fn load(config: &BertEncoderConfig) -> Result<Self, DomainError> {
        let config_path = required_file(&config.model_dir, CONFIG_FILE)?;
        let tokenizer_path = required_file(&config.model_dir, TOKENIZER_FILE)?;
        let weights_path = required_file(&config.model_dir, WEIGHTS_FILE)?;

        let raw_config = fs::read_to_string(&config_path)
            .map_err(|err| model_error(&format!("reading {}: {err}", config_path.display())))?;
        let bert_config: BertConfig = serde_json::from_str(&raw_config)
            .map_err(|err| model_error(&format!("parsing {}: {err}", config_path.display())))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|err| model_error(&format!("loading {}: {err}", tokenizer_path.display())))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|err| model_error(&format!("configuring truncation: {err}")))?;

        let device = select_device(config.device)?;
        // SAFETY: the weights file is treated as read-only for the life of the process.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(candle_error)?;
        let model = BertModel::load(vb, &bert_config).map_err(candle_error)?;

        tracing::info!(
            model = %config.model_name,
            hidden_size = bert_config.hidden_size,
            max_sequence_length = config.max_sequence_length,
            "bert encoder ready"
        );

        Ok(Self {
            model,
            tokenizer,
            device,
            dimension: bert_config.hidden_size,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Blocking; run off the async executor.
    pub fn encode_batch(&self, texts: Vec<String>) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts, true)
            .map_err(|err| DomainError::internal_error(&format!("tokenization failed: {err}")))?;

        let ids = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(candle_error)?;
        let masks = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()
            .map_err(candle_error)?;

        let input_ids = Tensor::stack(&ids, 0).map_err(candle_error)?;
        let attention_mask = Tensor::stack(&masks, 0).map_err(candle_error)?;
        let token_type_ids = input_ids.zeros_like().map_err(candle_error)?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_error)?;
        let pooled = mean_pool(&hidden, &attention_mask).map_err(candle_error)?;
        l2_normalize(&pooled)
            .and_then(|normalized| normalized.to_vec2::<f32>())
            .map_err(candle_error)
    }
}

/// Average of token vectors `[batch, tokens, hidden]` where the mask `[batch, tokens]` is set.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?;
    summed.broadcast_div(&counts)
}

pub fn l2_normalize(vectors: &Tensor) -> candle_core::Result<Tensor> {
    let norms = vectors.sqr()?.sum_keepdim(1)?.sqrt()?;
    vectors.broadcast_div(&norms)?.to_dtype(DType::F32)
}

fn required_file(dir: &Path, name: &str) -> Result<PathBuf, DomainError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(model_error(&format!("missing model file {}", path.display())))
    }
}

fn model_error(message: &str) -> DomainError {
    DomainError::external_service_error("embedding model", message)
}

fn candle_error(err: candle_core::Error) -> DomainError {
    DomainError::internal_error(&format!("candle: {err}"))
}

/// [`TextEncoderPort`] over a shared [`BertEncoder`]; each batch runs on the blocking pool.
pub struct CandleTextEncoder {
    inner: Arc<BertEncoder>,
}

impl CandleTextEncoder {
    pub fn new(inner: BertEncoder) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl TextEncoderPort for CandleTextEncoder {
    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn encode(&self, texts: Vec<String>) -> Result<Vec<Embedding>, DomainError> {
        let encoder = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || encoder.encode_batch(texts))
            .await
            .map_err(|err| DomainError::internal_error(&format!("embedding task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn mean_pool_ignores_padding() -> candle_core::Result<()> {
        let device = Device::Cpu;
        let hidden = Tensor::new(
            &[
                [[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]],
                [[2.0, 0.0], [4.0, 0.0], [6.0, 0.0]],
            ],
            &device,
        )?;
        let mask = Tensor::new(&[[1u32, 1, 0], [1, 1, 1]], &device)?;

        let pooled = mean_pool(&hidden, &mask)?.to_vec2::<f32>()?;
        assert_close(&pooled[0], &[2.0, 3.0]);
        assert_close(&pooled[1], &[4.0, 0.0]);
        Ok(())
    }

    #[test]
    fn normalized_rows_have_unit_length() -> candle_core::Result<()> {
        let vectors = Tensor::new(&[[3.0f32, 4.0], [0.0, 2.0]], &Device::Cpu)?;
        let normalized = l2_normalize(&vectors)?.to_vec2::<f32>()?;
        assert_close(&normalized[0], &[0.6, 0.8]);
        assert_close(&normalized[1], &[0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn loading_from_an_empty_directory_names_the_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = BertEncoderConfig {
            model_name: "all-MiniLM-L6-v2".to_string(),
            model_dir: dir.path().to_path_buf(),
            device: DeviceChoice::Cpu,
            max_sequence_length: 256,
        };

        let err = match BertEncoder::load(&config) {
            Ok(_) => panic!("empty directory must not load"),
            Err(err) => err,
        };
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
