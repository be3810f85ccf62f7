//! ONNX classifier collaborator

pub mod loader;
pub mod onnx;

pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
