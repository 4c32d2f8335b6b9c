//! Strand orientation correction for homozygous calls.
//!
//! Some vendors report calls relative to the opposite DNA strand from the
//! reference panel. A homozygous call whose allele is absent from the panel's
//! reference pair is assumed to be such a call and is complemented.

use crate::{
    format::{Call, OutputFormat},
    panel::TemplateRecord,
};

/// Get the complement of a DNA base.
pub fn complement(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        _ => base,
    }
}

/// Get the complement of a DNA sequence.
pub fn complement_seq(seq: &str) -> String {
    seq.chars().map(complement).collect()
}

/// True for exactly one of `A`, `C`, `G`, `T`.
pub fn is_nucleotide(allele: &str) -> bool {
    matches!(allele, "A" | "C" | "G" | "T")
}

/// Which path the corrector took for a marker.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Correction {
    /// An allele was outside the nucleotide alphabet; the layout's no-call was emitted.
    NoCall,
    /// Heterozygous call replaced by the panel's reference alleles.
    ReferenceFallback,
    /// Homozygous call matched neither reference allele and was complemented.
    Complemented,
    /// Homozygous call matched a reference allele.
    Unchanged,
}

/// Decides the emitted call for a matched marker when correction is requested.
///
/// Heterozygous calls are strand-ambiguous and are replaced by the panel's own
/// reference alleles. This discards the sample call.
pub fn correct(
    allele1: &str,
    allele2: &str,
    template: &TemplateRecord,
    format: OutputFormat,
) -> (Call, Correction) {
    if !is_nucleotide(allele1) || !is_nucleotide(allele2) {
        return (format.no_call(), Correction::NoCall);
    }

    if allele1 != allele2 {
        return (
            Call::new(template.reference_a1.as_str(), template.reference_a2.as_str()),
            Correction::ReferenceFallback,
        );
    }

    if allele1 != template.reference_a1 && allele1 != template.reference_a2 {
        let flipped = complement_seq(allele1);
        return (Call::new(flipped.clone(), flipped), Correction::Complemented);
    }

    (Call::new(allele1, allele2), Correction::Unchanged)
}
