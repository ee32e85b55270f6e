pub mod audio;
pub mod dna;
pub mod export;
pub mod reconcile;
pub mod silence;
pub mod tiers;
