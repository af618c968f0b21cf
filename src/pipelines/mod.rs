/// Binary text classification
pub mod text_classification;
