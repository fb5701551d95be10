//! External market collaborators: snapshot and evidence providers

pub mod evidence;
pub mod snapshot;

pub use evidence::{
    EvidenceProvider, EvidenceRecipe, HttpEvidenceProvider, ResolvedEvidence, SourceBundle,
    SourceEntry, resolve_evidence,
};
pub use snapshot::{HttpSnapshotProvider, SnapshotProvider};
