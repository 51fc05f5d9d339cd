pub mod huggingface_embedder;
pub mod sentence_encoder;

pub use huggingface_embedder::HuggingFaceEmbedder;
pub use sentence_encoder::SentenceEncoder;
