//! ONNX-backed implementation of the fraud classifier capability.
//!
//! Handles the two output layouts sklearn-style exports produce: plain
//! `f32` probability tensors and `seq(map(int64, float))` (zipmap).

use crate::engine::classifier::{FeatureVector, FraudClassifier};
use crate::error::EngineError;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::transaction::TransactionType;
use anyhow::Result;
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, warn};

/// One-hot category order for the transaction type, matching the training
/// encoder (categories in lexicographic order).
const TYPE_CATEGORIES: [TransactionType; 4] = [
    TransactionType::CashOut,
    TransactionType::Deposit,
    TransactionType::Payment,
    TransactionType::Transfer,
];

/// Dense input width: 4 one-hot type columns + 9 numeric features.
const ENCODED_WIDTH: usize = 13;

/// Fraud classifier backed by an ONNX Runtime session.
///
/// The session is wrapped in an `RwLock` for interior mutability; a single
/// instance is shared behind `Arc` across worker tasks.
pub struct OnnxClassifier {
    model: RwLock<LoadedModel>,
}

impl OnnxClassifier {
    /// Load the classifier from an ONNX file.
    pub fn from_file<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path)?;
        Ok(Self {
            model: RwLock::new(model),
        })
    }

    /// Encode a feature vector as the model's dense `f32` input.
    ///
    /// Layout: one-hot transaction type in [`TYPE_CATEGORIES`] order, then
    /// the nine numeric features in [`FeatureVector::FIELD_NAMES`] order.
    pub fn encode(features: &FeatureVector) -> Vec<f32> {
        let mut encoded = Vec::with_capacity(ENCODED_WIDTH);

        for category in TYPE_CATEGORIES {
            encoded.push(if features.tx_type == category { 1.0 } else { 0.0 });
        }

        encoded.push(features.amount as f32);
        encoded.push(features.old_balance_orig as f32);
        encoded.push(features.new_balance_orig as f32);
        encoded.push(features.old_balance_dest as f32);
        encoded.push(features.new_balance_dest as f32);
        encoded.push(features.balance_diff_orig as f32);
        encoded.push(features.balance_diff_dest as f32);
        encoded.push(features.amount_to_balance_ratio as f32);
        encoded.push(if features.account_emptied { 1.0 } else { 0.0 });

        encoded
    }

    /// Run one session pass and extract the label (when present) and the
    /// class probabilities.
    fn run(&self, features: &FeatureVector) -> Result<(Option<i64>, [f64; 2]), EngineError> {
        use ort::value::Tensor;

        let mut model = self
            .model
            .write()
            .map_err(|e| EngineError::ClassifierUnavailable(format!("session lock poisoned: {}", e)))?;

        let encoded = Self::encode(features);
        let shape = vec![1_i64, encoded.len() as i64];
        let input_tensor = Tensor::from_array((shape, encoded))
            .map_err(|e| EngineError::ClassifierFailure(format!("failed to create input tensor: {}", e)))?;

        let input_name = model.input_name.clone();
        let label_name = model.label_output.clone();
        let prob_name = model.probabilities_output.clone();

        let outputs = model
            .session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| EngineError::ClassifierFailure(format!("inference failed: {}", e)))?;

        let label = Self::extract_label(&outputs, &label_name);
        let probabilities = Self::extract_probabilities(&outputs, &prob_name)?;

        Ok((label, probabilities))
    }

    /// Extract the predicted class from the label output, if the model has one.
    fn extract_label(outputs: &ort::session::SessionOutputs, label_name: &str) -> Option<i64> {
        let output = outputs.get(label_name)?;
        if let Ok(tensor) = output.try_extract_tensor::<i64>() {
            let (_shape, data) = tensor;
            return data.first().copied();
        }
        None
    }

    /// Extract `[p_legitimate, p_fraud]` from the probabilities output,
    /// trying the tensor layout first and falling back to seq(map).
    fn extract_probabilities(
        outputs: &ort::session::SessionOutputs,
        prob_name: &str,
    ) -> Result<[f64; 2], EngineError> {
        if let Some(output) = outputs.get(prob_name) {
            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                return Ok(Self::probabilities_from_tensor(&shape, data));
            }

            let dtype = output.dtype();
            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(probs) = Self::extract_from_sequence_map(output) {
                    return Ok(probs);
                }
            }
        }

        // Fallback: scan all outputs for anything probability-shaped
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }

            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                debug!(output = %name, "Extracted probabilities from tensor (fallback)");
                return Ok(Self::probabilities_from_tensor(&shape, data));
            }

            let dtype = output.dtype();
            if DynSequenceValueType::can_downcast(&dtype) {
                if let Ok(probs) = Self::extract_from_sequence_map(&output) {
                    debug!(output = %name, "Extracted probabilities from seq(map) (fallback)");
                    return Ok(probs);
                }
            }
        }

        Err(EngineError::ClassifierFailure(
            "no probability output found in model outputs".to_string(),
        ))
    }

    /// Interpret a probability tensor of shape `[1, 2]`, `[2]`, or `[1, 1]`.
    fn probabilities_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> [f64; 2] {
        let dims: Vec<i64> = shape.iter().copied().collect();

        let num_classes = match dims.len() {
            2 => dims[1] as usize,
            1 => dims[0] as usize,
            _ => data.len(),
        };

        if num_classes >= 2 && data.len() >= 2 {
            [data[0] as f64, data[1] as f64]
        } else {
            // Single-column output: treat it as the fraud probability
            let p_fraud = data.first().copied().unwrap_or(0.5) as f64;
            [1.0 - p_fraud, p_fraud]
        }
    }

    /// Extract probabilities from the `seq(map(int64, float))` zipmap format.
    fn extract_from_sequence_map(output: &ort::value::DynValue) -> Result<[f64; 2], EngineError> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| EngineError::ClassifierFailure(format!("failed to downcast to sequence: {}", e)))?;

        let maps = sequence
            .try_extract_sequence::<DynMapValueType>(&allocator)
            .map_err(|e| EngineError::ClassifierFailure(format!("failed to extract sequence: {}", e)))?;

        if maps.is_empty() {
            return Err(EngineError::ClassifierFailure("empty probability sequence".to_string()));
        }

        // Batch size is 1, so the first map holds the class probabilities
        let kv_pairs = maps[0]
            .try_extract_key_values::<i64, f32>()
            .map_err(|e| EngineError::ClassifierFailure(format!("failed to extract map entries: {}", e)))?;

        let mut p_legitimate = None;
        let mut p_fraud = None;
        for (class_id, prob) in &kv_pairs {
            match *class_id {
                0 => p_legitimate = Some(*prob as f64),
                1 => p_fraud = Some(*prob as f64),
                _ => {}
            }
        }

        match (p_legitimate, p_fraud) {
            (Some(l), Some(f)) => Ok([l, f]),
            (None, Some(f)) => Ok([1.0 - f, f]),
            (Some(l), None) => Ok([l, 1.0 - l]),
            (None, None) => Err(EngineError::ClassifierFailure(
                "no class probabilities found in map".to_string(),
            )),
        }
    }
}

impl FraudClassifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<u8, EngineError> {
        let (label, probabilities) = self.run(features)?;

        let class = match label {
            Some(class) => class,
            None => {
                warn!("Label output missing, thresholding fraud probability at 0.5");
                (probabilities[1] >= 0.5) as i64
            }
        };

        Ok((class == 1) as u8)
    }

    fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], EngineError> {
        let (_label, probabilities) = self.run(features)?;
        Ok(probabilities)
    }
}
