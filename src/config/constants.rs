// Project-wide constants
//
// Centralised here so defaults have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Config file used when neither `--config` nor `MIKOSHI_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "MIKOSHI_CONFIG";

/// Prefix for environment overrides (`MIKOSHI__LLM_CONFIG__CLIENT__NAME=gemini`).
pub const ENV_OVERRIDE_PREFIX: &str = "MIKOSHI";

/// Sampling temperature when `model_params.temperature` is absent.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Output token limit when `max_output_tokens` / `max_gen_len` is absent.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Nucleus sampling parameter when `model_params.top_p` is absent.
pub const DEFAULT_TOP_P: f32 = 1.0;

/// Provider-level retries when `model_params.max_retries` is absent.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Regenerations allowed per turn when reflection grading fails the answer.
pub const DEFAULT_REFLECTION_RETRIES: u32 = 2;

/// Placeholder substituted in `s3.output_prefix`.
pub const TRANSACTION_ID_PLACEHOLDER: &str = "{transaction_id}";
