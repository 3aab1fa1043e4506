pub mod fidelity;
pub mod structure;
pub mod style;

pub use fidelity::{FidelityDiff, FidelityReport, Severity};
pub use structure::{
    DocumentZones, InsertionKind, InsertionPoint, PatternKind, PatternMatch, PatternMetadata,
};
pub use style::{FrontMatterInfo, Margins, ParagraphDefaults, StyleConfig};
