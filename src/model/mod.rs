pub mod exon;
pub mod gene;
pub mod transcript;
pub mod types;

pub use exon::Exon;
pub use gene::Gene;
pub use transcript::Transcript;
pub use types::FeatureType;
