//! # VariantForge - Somatic Micro-Assembly Variant Caller
//!
//! A high-performance somatic variant caller core built in Rust.
//! Reference windows and aligned tumor/normal reads are reassembled into a
//! colored de Bruijn graph, pruned, and walked from a reference-anchored
//! source to a reference-anchored sink; each candidate haplotype path is
//! aligned back to the reference anchor and decomposed into typed variant
//! records (SNV, insertion, deletion, complex).

pub mod alignment;
pub mod assembly;
pub mod core;
pub mod errors;
pub mod pipeline;
pub mod utils;
pub mod variant;

// Re-export commonly used types at crate level
pub use crate::assembly::graph::Graph;
pub use crate::core::kmer::Kmer;
pub use crate::pipeline::window::RefWindow;
pub use crate::utils::configuration::CallerConfig;
pub use crate::variant::Variant;

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_result_type() -> Result<()> {
        let success: Result<i32> = Ok(42);
        assert_eq!(success?, 42);

        let error: Result<i32> = Err(anyhow::anyhow!("test error"));
        assert!(error.is_err());
        Ok(())
    }

    #[test]
    fn test_module_exports() {
        let kmer = Kmer::new("ATCG").expect("valid k-mer");
        assert_eq!(kmer.len(), 4);

        let config = CallerConfig::default();
        assert!(config.validate().is_ok());
    }
}
