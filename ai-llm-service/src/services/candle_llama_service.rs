//! In-process Llama inference with candle.
//!
//! Loads a Llama-family checkpoint (TinyLlama by default) from a local
//! directory, or from the Hugging Face Hub cache when that directory does
//! not exist (downloaded on first run):
//! - `config.json`      — Hugging Face model config
//! - `tokenizer.json`   — tokenizer
//! - `*.safetensors`    — weights (single file or shards)
//!
//! Decoding is greedy with a repetition penalty over the whole context and
//! stops at `</s>` or after `max_new_tokens`. The weights are shared
//! read-only; every call builds its own KV cache, so concurrent requests do
//! not interfere (they only compete for compute).

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::{
    generation::{LogitsProcessor, Sampling},
    models::llama::{Cache, Config, Llama, LlamaConfig},
    utils::apply_repeat_penalty,
};
use tokenizers::Tokenizer;
use tracing::{debug, info, instrument};

use crate::{
    config::generation_config::GenerationConfig,
    error_handler::GenerationError,
    generator::{GenerationFuture, TextGenerator},
};

/// End-of-sequence token used by Llama/TinyLlama tokenizers.
const EOS_TOKEN: &str = "</s>";

struct LlamaRuntime {
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    eos_token_id: Option<u32>,
    generation: GenerationConfig,
}

/// Local Llama text generator.
///
/// Cheap to clone; all clones share the same weights.
#[derive(Clone)]
pub struct CandleLlamaService {
    runtime: Arc<LlamaRuntime>,
}

/// Resolved paths of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    /// One file or ordered shards.
    pub weights: Vec<PathBuf>,
}

impl ModelFiles {
    /// Collects the checkpoint files from a local directory.
    ///
    /// # Errors
    /// [`GenerationError::MissingModelFile`] naming the first absent artifact.
    pub fn from_dir(dir: &Path) -> Result<Self, GenerationError> {
        Ok(Self {
            tokenizer: require_file(dir, "tokenizer.json")?,
            config: require_file(dir, "config.json")?,
            weights: safetensors_files(dir)?,
        })
    }

    /// Downloads the checkpoint from the Hugging Face Hub into the local
    /// cache (`HF_HOME`), or reuses the cached copy.
    ///
    /// Blocking network IO; call it from a blocking task.
    ///
    /// # Errors
    /// [`GenerationError::Hub`] if the repo or a file cannot be fetched.
    pub fn from_hub(repo_id: &str) -> Result<Self, GenerationError> {
        let api = hf_hub::api::sync::Api::new().map_err(hub_error)?;
        let repo = api.model(repo_id.to_string());

        info!(repo = repo_id, "fetching model from hub (cached after first run)");
        let config = repo.get("config.json").map_err(hub_error)?;
        let tokenizer = repo.get("tokenizer.json").map_err(hub_error)?;

        let weights = match repo.get("model.safetensors") {
            Ok(single) => vec![single],
            Err(single_err) => {
                let index = repo
                    .get("model.safetensors.index.json")
                    .map_err(|_| hub_error(single_err))?;
                shard_names(&std::fs::read_to_string(index)?)?
                    .iter()
                    .map(|name| repo.get(name).map_err(hub_error))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(Self {
            config,
            tokenizer,
            weights,
        })
    }
}

impl CandleLlamaService {
    /// Loads the checkpoint from `model_dir` when it exists, otherwise from
    /// the hub repo `hf_model_id`.
    ///
    /// This is blocking and slow (seconds, minutes on first download); call
    /// it from a blocking task.
    ///
    /// # Errors
    /// - [`GenerationError::MissingModelFile`] if there is no directory and no
    ///   hub repo, or the directory lacks an artifact
    /// - [`GenerationError::Hub`] if the hub download fails
    /// - anything [`CandleLlamaService::load_files`] returns
    pub fn load_from(
        model_dir: Option<&Path>,
        hf_model_id: Option<&str>,
        generation: GenerationConfig,
    ) -> Result<Self, GenerationError> {
        let files = match (model_dir, hf_model_id) {
            (Some(dir), _) if dir.is_dir() => ModelFiles::from_dir(dir)?,
            (dir, Some(repo_id)) => {
                if let Some(dir) = dir {
                    info!(model_dir = %dir.display(), "model dir not found; using hub");
                }
                ModelFiles::from_hub(repo_id)?
            }
            (Some(dir), None) => {
                return Err(GenerationError::MissingModelFile(dir.display().to_string()));
            }
            (None, None) => {
                return Err(GenerationError::MissingModelFile("MODEL_DIR".into()));
            }
        };
        Self::load_files(&files, generation)
    }

    /// Loads tokenizer, config and weights from `model_dir`.
    ///
    /// # Errors
    /// [`GenerationError::MissingModelFile`] if an artifact is absent, or
    /// anything [`CandleLlamaService::load_files`] returns.
    pub fn load(model_dir: &Path, generation: GenerationConfig) -> Result<Self, GenerationError> {
        Self::load_files(&ModelFiles::from_dir(model_dir)?, generation)
    }

    /// Builds the model from resolved checkpoint files.
    ///
    /// # Errors
    /// - [`GenerationError::Tokenizer`] if `tokenizer.json` is invalid
    /// - [`GenerationError::Json`] if `config.json` is invalid
    /// - [`GenerationError::Candle`] if weights cannot be mapped
    pub fn load_files(files: &ModelFiles, generation: GenerationConfig) -> Result<Self, GenerationError> {
        let started = Instant::now();
        let device = select_device();
        let dtype = DType::F32;

        debug!(path = %files.tokenizer.display(), "loading tokenizer");
        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;

        debug!(path = %files.config.display(), "loading model config");
        let llama_config: LlamaConfig = serde_json::from_slice(&std::fs::read(&files.config)?)?;
        let config = llama_config.into_config(false);

        debug!(shards = files.weights.len(), "mapping weights");
        // SAFETY: the weight files are not modified while the process runs.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files.weights, dtype, &device)? };
        let model = Llama::load(vb, &config)?;

        let eos_token_id = tokenizer.token_to_id(EOS_TOKEN);

        info!(
            config = %files.config.display(),
            elapsed_ms = started.elapsed().as_millis(),
            max_new_tokens = generation.max_new_tokens,
            repetition_penalty = generation.repetition_penalty,
            "llama model loaded"
        );

        Ok(Self {
            runtime: Arc::new(LlamaRuntime {
                model,
                config,
                tokenizer,
                device,
                dtype,
                eos_token_id,
                generation,
            }),
        })
    }
}

impl TextGenerator for CandleLlamaService {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(async move {
            let runtime = Arc::clone(&self.runtime);
            let prompt = prompt.to_owned();
            tokio::task::spawn_blocking(move || runtime.generate_blocking(&prompt))
                .await
                .map_err(|e| GenerationError::Worker(e.to_string()))?
        })
    }
}

impl LlamaRuntime {
    #[instrument(skip_all, fields(prompt_chars = prompt.chars().count()))]
    fn generate_blocking(&self, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;
        let prompt_tokens = encoding.get_ids();

        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let generated = greedy_decode(
            prompt_tokens,
            &self.generation,
            self.eos_token_id,
            |context, index_pos| {
                let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
                Ok(self.model.forward(&input, index_pos, &mut cache)?.squeeze(0)?)
            },
        )?;

        let text = self
            .tokenizer
            .decode(&generated, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;

        debug!(
            prompt_tokens = prompt_tokens.len(),
            new_tokens = generated.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "llama generation finished"
        );
        Ok(text)
    }
}

/// Greedy decoding over any logits source; returns only the new tokens.
///
/// `next_logits(context, index_pos)` must return 1-D logits for the position
/// after `context`. The first call gets the whole prompt at position 0, later
/// calls only the last token (the source keeps its own KV cache). The
/// repetition penalty covers the prompt and everything generated so far.
/// Stops at `eos_token_id` (not included) or after `max_new_tokens`.
pub(crate) fn greedy_decode<F>(
    prompt_tokens: &[u32],
    generation: &GenerationConfig,
    eos_token_id: Option<u32>,
    mut next_logits: F,
) -> Result<Vec<u32>, GenerationError>
where
    F: FnMut(&[u32], usize) -> Result<Tensor, GenerationError>,
{
    let mut tokens = prompt_tokens.to_vec();
    let mut logits_processor = LogitsProcessor::from_sampling(0, Sampling::ArgMax);
    let penalty = generation.repetition_penalty;

    let mut index_pos = 0;
    for step in 0..generation.max_new_tokens {
        let context_size = if step > 0 { 1 } else { tokens.len() };
        let start = tokens.len() - context_size;
        let logits = next_logits(&tokens[start..], index_pos)?.to_dtype(DType::F32)?;
        let logits = if penalty == 1.0 {
            logits
        } else {
            apply_repeat_penalty(&logits, penalty, &tokens)?
        };
        index_pos += context_size;

        let next = logits_processor.sample(&logits)?;
        if Some(next) == eos_token_id {
            break;
        }
        tokens.push(next);
    }

    Ok(tokens.split_off(prompt_tokens.len()))
}

fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            info!("device: metal");
            return dev;
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) {
            info!("device: cuda");
            return dev;
        }
    }
    info!("device: cpu");
    Device::Cpu
}

fn require_file(dir: &Path, name: &str) -> Result<PathBuf, GenerationError> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(GenerationError::MissingModelFile(path.display().to_string()))
    }
}

fn hub_error(err: hf_hub::api::sync::ApiError) -> GenerationError {
    GenerationError::Hub(err.to_string())
}

/// Distinct shard file names from a `model.safetensors.index.json`, sorted.
fn shard_names(index_json: &str) -> Result<Vec<String>, GenerationError> {
    let index: serde_json::Value = serde_json::from_str(index_json)?;
    let map = index
        .get("weight_map")
        .and_then(|m| m.as_object())
        .ok_or_else(|| GenerationError::Hub("safetensors index has no weight_map".into()))?;

    let mut names: Vec<String> = map
        .values()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// Lists `*.safetensors` files in `dir`, sorted so shards load in order.
fn safetensors_files(dir: &Path) -> Result<Vec<PathBuf>, GenerationError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "safetensors") {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(GenerationError::MissingModelFile(format!(
            "{}/*.safetensors",
            dir.display()
        )));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCAB: usize = 8;
    const EOS: u32 = 2;

    /// Logits with the given `(token, score)` pairs set and everything else 0.
    fn logits(scores: &[(u32, f32)]) -> Tensor {
        let mut row = [0f32; VOCAB];
        for &(token, score) in scores {
            row[token as usize] = score;
        }
        Tensor::new(&row, &Device::Cpu).unwrap()
    }

    fn config(max_new_tokens: u32, repetition_penalty: f32) -> GenerationConfig {
        GenerationConfig {
            max_new_tokens,
            repetition_penalty,
        }
    }

    #[test]
    fn stops_at_eos_and_returns_only_new_tokens() {
        let mut step = 0;
        let out = greedy_decode(&[1, 3], &config(10, 1.0), Some(EOS), |_, _| {
            step += 1;
            Ok(match step {
                1 => logits(&[(5, 1.0)]),
                2 => logits(&[(6, 1.0)]),
                _ => logits(&[(EOS, 1.0)]),
            })
        })
        .unwrap();

        assert_eq!(out, vec![5, 6]);
        assert_eq!(step, 3);
    }

    #[test]
    fn caps_at_max_new_tokens() {
        let mut calls = 0;
        let out = greedy_decode(&[1], &config(4, 1.0), Some(EOS), |_, _| {
            calls += 1;
            Ok(logits(&[(4, 1.0)]))
        })
        .unwrap();

        assert_eq!(out, vec![4, 4, 4, 4]);
        assert_eq!(calls, 4);
    }

    #[test]
    fn feeds_prompt_once_then_single_tokens() {
        let mut seen: Vec<(Vec<u32>, usize)> = Vec::new();
        greedy_decode(&[1, 3, 7], &config(3, 1.0), None, |context, index_pos| {
            seen.push((context.to_vec(), index_pos));
            Ok(logits(&[(5 + seen.len() as u32 % 2, 1.0)]))
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![(vec![1, 3, 7], 0), (vec![6], 3), (vec![5], 4)]
        );
    }

    #[test]
    fn penalty_covers_prompt_tokens() {
        let source = |_: &[u32], _: usize| Ok(logits(&[(3, 1.0), (6, 0.95)]));

        let plain = greedy_decode(&[1, 3], &config(1, 1.0), None, source).unwrap();
        assert_eq!(plain, vec![3]);

        // 1.0 / 1.1 drops below 0.95 once token 3 is in the context.
        let penalized = greedy_decode(&[1, 3], &config(1, 1.1), None, source).unwrap();
        assert_eq!(penalized, vec![6]);
    }

    #[test]
    fn penalty_covers_generated_tokens() {
        let source = |_: &[u32], _: usize| Ok(logits(&[(4, 1.0), (5, 0.95), (6, 0.8)]));

        let out = greedy_decode(&[1], &config(3, 1.1), None, source).unwrap();
        // 4 is penalized after it is emitted, then 5; both penalized, 4 wins again.
        assert_eq!(out, vec![4, 5, 4]);
    }

    #[test]
    fn decoding_is_deterministic() {
        let source = |context: &[u32], index_pos: usize| {
            let last = *context.last().unwrap_or(&0);
            let hot = (last + index_pos as u32 + 3) % VOCAB as u32;
            Ok(logits(&[(hot, 2.0), ((hot + 1) % VOCAB as u32, 1.9)]))
        };

        let first = greedy_decode(&[1, 0, 7], &config(12, 1.1), Some(EOS), source).unwrap();
        let second = greedy_decode(&[1, 0, 7], &config(12, 1.1), Some(EOS), source).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn logits_source_errors_propagate() {
        let result = greedy_decode(&[1], &config(5, 1.0), None, |_, _| {
            Err(GenerationError::Worker("device lost".into()))
        });
        assert!(matches!(result, Err(GenerationError::Worker(_))));
    }

    #[test]
    fn missing_artifacts_are_reported_by_name() {
        let dir = tempfile::tempdir().unwrap();

        let err = require_file(dir.path(), "tokenizer.json").unwrap_err();
        assert!(err.to_string().contains("tokenizer.json"));

        let err = safetensors_files(dir.path()).unwrap_err();
        assert!(matches!(err, GenerationError::MissingModelFile(_)));
    }

    #[test]
    fn shards_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "model-00002-of-00002.safetensors",
            "model-00001-of-00002.safetensors",
            "config.json",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = safetensors_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "model-00001-of-00002.safetensors",
                "model-00002-of-00002.safetensors"
            ]
        );
    }

    #[test]
    fn model_files_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["config.json", "tokenizer.json", "model.safetensors"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.config, dir.path().join("config.json"));
        assert_eq!(files.tokenizer, dir.path().join("tokenizer.json"));
        assert_eq!(files.weights, vec![dir.path().join("model.safetensors")]);
    }

    #[test]
    fn no_dir_and_no_hub_repo_is_missing_model() {
        let result = CandleLlamaService::load_from(None, None, GenerationConfig::default());
        assert!(matches!(result, Err(GenerationError::MissingModelFile(_))));

        let missing = Path::new("/definitely/not/a/model/dir");
        let result = CandleLlamaService::load_from(Some(missing), None, GenerationConfig::default());
        match result {
            Err(GenerationError::MissingModelFile(what)) => assert!(what.contains("not/a/model")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a missing model error"),
        }
    }

    #[test]
    fn existing_dir_wins_over_hub() {
        // An existing but empty dir is used as-is, so no download happens.
        let dir = tempfile::tempdir().unwrap();
        let result = CandleLlamaService::load_from(
            Some(dir.path()),
            Some("TinyLlama/TinyLlama-1.1B-Chat-v1.0"),
            GenerationConfig::default(),
        );
        assert!(matches!(result, Err(GenerationError::MissingModelFile(_))));
    }

    #[test]
    fn shard_index_lists_each_file_once() {
        let index = r#"{
            "metadata": {"total_size": 1},
            "weight_map": {
                "lm_head.weight": "model-00002-of-00002.safetensors",
                "model.embed_tokens.weight": "model-00001-of-00002.safetensors",
                "model.norm.weight": "model-00002-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_names(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors",
                "model-00002-of-00002.safetensors"
            ]
        );

        assert!(matches!(shard_names("{}"), Err(GenerationError::Hub(_))));
    }

    #[test]
    fn load_fails_soft_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = CandleLlamaService::load(dir.path(), GenerationConfig::default());
        assert!(matches!(result, Err(GenerationError::MissingModelFile(_))));
    }
}
