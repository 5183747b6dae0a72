use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Snp,
    Ins,
    Del,
    Mnp,
    Multi,
}

impl VariantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariantKind::Snp => "SNP",
            VariantKind::Ins => "INS",
            VariantKind::Del => "DEL",
            VariantKind::Mnp => "MNP",
            VariantKind::Multi => "MULTIALLELIC",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One minimal, left-anchored allele derived from a REF/ALT pair.
///
/// `allele` is a single base for substitutions, `+<bases>` for insertions
/// and `-<n>` for deletions of `n` bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAllele {
    pub position: String,
    pub reference: u8,
    pub allele: String,
    /// 0-based index into the comma-separated ALT column.
    pub source_alt_index: usize,
}

impl NormalizedAllele {
    pub fn kind(&self) -> VariantKind {
        match self.allele.as_bytes().first() {
            Some(b'+') => VariantKind::Ins,
            Some(b'-') => VariantKind::Del,
            _ => VariantKind::Snp,
        }
    }

    /// Genotype allele number this record is compared against (`0` is REF).
    pub fn genotype_allele(&self) -> usize {
        self.source_alt_index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub kind: VariantKind,
    pub alleles: Vec<NormalizedAllele>,
}

/// Samples bucketed for a single target allele, by index into the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenotypeSummary {
    pub homs: Vec<usize>,
    pub hets: Vec<usize>,
    pub missing: Vec<usize>,
    pub alt_count: u32,
    pub total_count: u32,
}

impl GenotypeSummary {
    pub fn clear(&mut self) {
        self.homs.clear();
        self.hets.clear();
        self.missing.clear();
        self.alt_count = 0;
        self.total_count = 0;
    }
}

pub const NOT_TSTV: u8 = b'0';
pub const TRANSITION: u8 = b'1';
pub const TRANSVERSION: u8 = b'2';

pub fn tstv(reference: u8, alt: u8) -> u8 {
    match (reference, alt) {
        (b'A', b'G') | (b'G', b'A') | (b'C', b'T') | (b'T', b'C') => TRANSITION,
        (b'A', b'C')
        | (b'C', b'A')
        | (b'A', b'T')
        | (b'T', b'A')
        | (b'C', b'G')
        | (b'G', b'C')
        | (b'G', b'T')
        | (b'T', b'G') => TRANSVERSION,
        _ => NOT_TSTV,
    }
}
