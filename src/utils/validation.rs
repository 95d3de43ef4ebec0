// file: src/utils/validation.rs
// description: input validation for command arguments
// reference: input validation patterns

use crate::config::MAX_BATCH_SIZE;
use crate::error::{PipelineError, Result};
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if !path.is_file() {
            return Err(PipelineError::Validation(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_batch_size(size: usize) -> Result<()> {
        if size == 0 {
            return Err(PipelineError::Validation(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        if size > MAX_BATCH_SIZE {
            return Err(PipelineError::Validation(format!(
                "Batch size too large (max {})",
                MAX_BATCH_SIZE
            )));
        }

        Ok(())
    }

    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(PipelineError::Validation(
                "Model name must not be empty".to_string(),
            ));
        }

        if model.chars().any(char::is_whitespace) {
            return Err(PipelineError::Validation(format!(
                "Model name must not contain whitespace: {:?}",
                model
            )));
        }

        Ok(())
    }

    pub fn validate_threshold(threshold: f64) -> Result<()> {
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(PipelineError::Validation(format!(
                "Threshold must be within [-1, 1]: {}",
                threshold
            )));
        }
        Ok(())
    }
}
