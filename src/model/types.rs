use std::fmt;

use serde::{Deserialize, Serialize};

/// The two exonic feature classes carried through parsing and comparison.
///
/// CDS rows mark the coding subset of a transcript; both kinds contribute
/// intervals to the transcript model and both are reported in diffs. The
/// exon/CDS distinction plays no role in the matched/partial decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "exon")]
    Exon,
    #[serde(rename = "CDS")]
    Cds,
}

impl FeatureType {
    /// Map column 3 of a GFF3 line; `None` for any other feature type.
    pub fn from_gff3(s: &str) -> Option<Self> {
        match s {
            "exon" => Some(FeatureType::Exon),
            "CDS" => Some(FeatureType::Cds),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Exon => "exon",
            FeatureType::Cds => "CDS",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_type_round_trips_column_three() {
        assert_eq!(FeatureType::from_gff3("exon"), Some(FeatureType::Exon));
        assert_eq!(FeatureType::from_gff3("CDS"), Some(FeatureType::Cds));
        assert_eq!(FeatureType::from_gff3("mRNA"), None);
        assert_eq!(FeatureType::from_gff3("cds"), None);

        assert_eq!(FeatureType::Exon.as_str(), "exon");
        assert_eq!(FeatureType::Cds.as_str(), "CDS");
    }
}
