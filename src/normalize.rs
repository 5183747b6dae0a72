use thiserror::Error;

use crate::model::{NormalizedAllele, Site, VariantKind};

/// Genotypes are matched one character at a time, so allele numbers stop at 9.
pub const MAX_GENOTYPE_ALLELE: usize = 9;

/// Reasons a whole site produces no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("ALT matches REF")]
    ReferenceOnly,
    #[error("position is not an integer")]
    InvalidPosition,
    #[error("no representable alternate allele")]
    NoValidAllele,
    #[error("allele number exceeds {MAX_GENOTYPE_ALLELE}")]
    TooManyAlleles,
}

/// Reasons a single ALT candidate is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
enum AlleleError {
    #[error("allele contains bases other than A, C, G, T")]
    InvalidBase,
    #[error("allele matches REF")]
    ReferenceOnly,
    #[error("first base differs from REF")]
    LeftEdgeMismatch,
    #[error("shared suffix covers the whole shorter allele")]
    NoLeftEdge,
    #[error("mixed substitution and indel")]
    Mixed,
    #[error("no base shared with REF")]
    IncompatibleSubstitution,
    #[error("position is not an integer")]
    InvalidPosition,
}

fn is_base(b: u8) -> bool {
    matches!(b, b'A' | b'C' | b'G' | b'T')
}

/// Rewrites a REF/ALT pair into minimal, left-anchored alleles.
///
/// Candidates that cannot be represented are logged and skipped; the site is
/// rejected only when nothing survives.
pub fn normalize(
    chrom: &str,
    pos: &str,
    reference: &str,
    alt: &str,
) -> std::result::Result<Site, Rejection> {
    if alt == reference {
        return Err(Rejection::ReferenceOnly);
    }
    let refr = reference.as_bytes();
    if refr.is_empty() {
        return Err(Rejection::NoValidAllele);
    }
    let int_pos = pos.parse::<u64>().ok();

    // Single base ALT: plain SNP or a 1-base padded deletion
    if alt.len() == 1 {
        let base = alt.as_bytes()[0];
        if !is_base(base) {
            tracing::debug!(chrom, pos, alt, "skipping site with invalid ALT");
            return Err(Rejection::NoValidAllele);
        }
        if refr.len() == 1 {
            let allele = NormalizedAllele {
                position: pos.to_string(),
                reference: refr[0],
                allele: alt.to_string(),
                source_alt_index: 0,
            };
            return Ok(Site {
                kind: VariantKind::Snp,
                alleles: vec![allele],
            });
        }
        if base != refr[0] {
            tracing::debug!(chrom, pos, reference, alt, "skipping deletion without padding base");
            return Err(Rejection::NoValidAllele);
        }
        let position = int_pos
            .and_then(|p| p.checked_add(1))
            .ok_or(Rejection::InvalidPosition)?;
        return Ok(Site {
            kind: VariantKind::Del,
            alleles: vec![deletion(position, refr[1], refr.len() - 1, 0)],
        });
    }

    let mut alleles = Vec::new();
    for (idx, candidate) in alt.split(',').enumerate() {
        match push_candidate(&mut alleles, pos, int_pos, refr, candidate.as_bytes(), idx) {
            Ok(()) => {}
            Err(AlleleError::InvalidPosition) => return Err(Rejection::InvalidPosition),
            Err(reason) => {
                tracing::debug!(chrom, pos, reference, allele = candidate, %reason, "skipping allele");
            }
        }
    }

    let (Some(first), Some(last)) = (alleles.first(), alleles.last()) else {
        return Err(Rejection::NoValidAllele);
    };
    if last.genotype_allele() > MAX_GENOTYPE_ALLELE {
        return Err(Rejection::TooManyAlleles);
    }

    let kind = if first.source_alt_index != last.source_alt_index {
        VariantKind::Multi
    } else if alleles.len() > 1 {
        VariantKind::Mnp
    } else {
        first.kind()
    };
    Ok(Site { kind, alleles })
}

fn deletion(position: u64, reference: u8, n_deleted: usize, source_alt_index: usize) -> NormalizedAllele {
    NormalizedAllele {
        position: position.to_string(),
        reference,
        allele: format!("-{n_deleted}"),
        source_alt_index,
    }
}

fn insertion(position: String, reference: u8, inserted: &[u8], source_alt_index: usize) -> NormalizedAllele {
    let mut allele = String::with_capacity(inserted.len() + 1);
    allele.push('+');
    allele.extend(inserted.iter().map(|&b| b as char));
    NormalizedAllele {
        position,
        reference,
        allele,
        source_alt_index,
    }
}

fn substitution(position: String, reference: u8, alt: u8, source_alt_index: usize) -> NormalizedAllele {
    NormalizedAllele {
        position,
        reference,
        allele: (alt as char).to_string(),
        source_alt_index,
    }
}

fn shift(pos: u64, by: usize) -> std::result::Result<u64, AlleleError> {
    pos.checked_add(by as u64).ok_or(AlleleError::InvalidPosition)
}

fn push_candidate(
    alleles: &mut Vec<NormalizedAllele>,
    pos: &str,
    int_pos: Option<u64>,
    refr: &[u8],
    candidate: &[u8],
    idx: usize,
) -> std::result::Result<(), AlleleError> {
    if candidate.is_empty() || !candidate.iter().all(|&b| is_base(b)) {
        return Err(AlleleError::InvalidBase);
    }
    if candidate == refr {
        return Err(AlleleError::ReferenceOnly);
    }

    if refr.len() == 1 {
        if candidate.len() == 1 {
            alleles.push(substitution(pos.to_string(), refr[0], candidate[0], idx));
            return Ok(());
        }
        if candidate[0] != refr[0] {
            return Err(AlleleError::LeftEdgeMismatch);
        }
        alleles.push(insertion(pos.to_string(), refr[0], &candidate[1..], idx));
        return Ok(());
    }

    let int_pos = int_pos.ok_or(AlleleError::InvalidPosition)?;

    if candidate.len() == 1 {
        if candidate[0] != refr[0] {
            return Err(AlleleError::LeftEdgeMismatch);
        }
        alleles.push(deletion(shift(int_pos, 1)?, refr[1], refr.len() - 1, idx));
        return Ok(());
    }

    // Same length: one SNP per differing base, all tied to this ALT entry
    if candidate.len() == refr.len() {
        let n_diff = refr.iter().zip(candidate).filter(|(r, a)| r != a).count();
        if n_diff == refr.len() {
            return Err(AlleleError::IncompatibleSubstitution);
        }
        for (offset, (&r, &a)) in refr.iter().zip(candidate).enumerate() {
            if r != a {
                let position = shift(int_pos, offset)?.to_string();
                alleles.push(substitution(position, r, a, idx));
            }
        }
        return Ok(());
    }

    let (longer, shorter) = if candidate.len() > refr.len() {
        (candidate, refr)
    } else {
        (refr, candidate)
    };
    let mut suffix = longer
        .iter()
        .rev()
        .zip(shorter.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    if suffix == shorter.len() {
        // A deletion keeps one base of ALT as its left anchor
        if candidate.len() > refr.len() {
            return Err(AlleleError::NoLeftEdge);
        }
        suffix -= 1;
    }
    // Everything left of the shared suffix in the shorter allele must anchor
    // the longer one exactly; otherwise a substitution sits next to the indel.
    let left = shorter.len() - suffix;
    if longer[..left] != shorter[..left] {
        return Err(AlleleError::Mixed);
    }

    if candidate.len() > refr.len() {
        let position = shift(int_pos, left - 1)?.to_string();
        let inserted = &candidate[left..candidate.len() - suffix];
        alleles.push(insertion(position, refr[left - 1], inserted, idx));
    } else {
        let n_deleted = refr.len() - suffix - left;
        alleles.push(deletion(shift(int_pos, left)?, refr[left], n_deleted, idx));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pos: &str, reference: &str, alt: &str) -> (VariantKind, String, char, String) {
        let site = normalize("1", pos, reference, alt).expect("site should normalize");
        assert_eq!(site.alleles.len(), 1, "expected a single allele: {site:?}");
        let allele = &site.alleles[0];
        (
            site.kind,
            allele.position.clone(),
            allele.reference as char,
            allele.allele.clone(),
        )
    }

    #[test]
    fn snp_passes_through() {
        assert_eq!(
            single("100", "T", "C"),
            (VariantKind::Snp, "100".into(), 'T', "C".into())
        );
    }

    #[test]
    fn padded_snp_is_trimmed() {
        assert_eq!(
            single("100", "TCCT", "TCCA"),
            (VariantKind::Snp, "103".into(), 'T', "A".into())
        );
    }

    #[test]
    fn simple_deletions() {
        assert_eq!(
            single("100", "TC", "T"),
            (VariantKind::Del, "101".into(), 'C', "-1".into())
        );
        assert_eq!(
            single("100", "TAGCGT", "T"),
            (VariantKind::Del, "101".into(), 'A', "-5".into())
        );
    }

    #[test]
    fn insertions() {
        assert_eq!(
            single("100", "T", "TAGCTT"),
            (VariantKind::Ins, "100".into(), 'T', "+AGCTT".into())
        );
        assert_eq!(
            single("100", "TA", "TAGCTT"),
            (VariantKind::Ins, "101".into(), 'A', "+GCTT".into())
        );
    }

    #[test]
    fn insertion_without_left_edge_is_rejected() {
        assert_eq!(
            normalize("1", "100", "TT", "TAGCTT"),
            Err(Rejection::NoValidAllele)
        );
    }

    #[test]
    fn homopolymer_deletion_keeps_left_anchor() {
        assert_eq!(
            single("100", "TTT", "TT"),
            (VariantKind::Del, "101".into(), 'T', "-1".into())
        );
        let site = normalize("1", "100", "TTT", "T,TT").unwrap();
        assert_eq!(site.kind, VariantKind::Multi);
        let got: Vec<_> = site
            .alleles
            .iter()
            .map(|a| (a.position.as_str(), a.reference, a.allele.as_str(), a.source_alt_index))
            .collect();
        assert_eq!(got, vec![("101", b'T', "-2", 0), ("101", b'T', "-1", 1)]);
    }

    #[test]
    fn incompatible_substitution_is_rejected() {
        assert_eq!(
            normalize("1", "100", "TCCT", "GTAA"),
            Err(Rejection::NoValidAllele)
        );
    }

    #[test]
    fn padded_deletion_prefers_shared_suffix() {
        assert_eq!(
            single("100", "AATCG", "AG"),
            (VariantKind::Del, "101".into(), 'A', "-3".into())
        );
    }

    #[test]
    fn mixed_indel_is_rejected() {
        // C->G next to a 2-base deletion
        assert_eq!(
            normalize("1", "100", "ACTTG", "AGG"),
            Err(Rejection::NoValidAllele)
        );
    }

    #[test]
    fn reference_only_site_is_rejected() {
        assert_eq!(normalize("1", "100", "A", "A"), Err(Rejection::ReferenceOnly));
    }

    #[test]
    fn multiallelic_keeps_source_indices() {
        let site = normalize("1", "100", "TC", "T,TCA,GC").unwrap();
        assert_eq!(site.kind, VariantKind::Multi);
        let got: Vec<_> = site
            .alleles
            .iter()
            .map(|a| (a.position.as_str(), a.reference, a.allele.as_str(), a.source_alt_index))
            .collect();
        assert_eq!(
            got,
            vec![
                ("101", b'C', "-1", 0),
                ("101", b'C', "+A", 1),
                ("100", b'T', "G", 2),
            ]
        );
    }

    #[test]
    fn invalid_candidate_downgrades_multiallelic() {
        let site = normalize("1", "100", "A", "N,G").unwrap();
        assert_eq!(site.kind, VariantKind::Snp);
        assert_eq!(site.alleles.len(), 1);
        assert_eq!(site.alleles[0].source_alt_index, 1);
        assert_eq!(site.alleles[0].allele, "G");
    }

    #[test]
    fn mnp_from_one_alt_is_not_multiallelic() {
        let site = normalize("1", "100", "ACGT", "AGGA").unwrap();
        assert_eq!(site.kind, VariantKind::Mnp);
        let positions: Vec<_> = site.alleles.iter().map(|a| a.position.as_str()).collect();
        assert_eq!(positions, vec!["101", "103"]);
        assert!(site.alleles.iter().all(|a| a.source_alt_index == 0));
    }

    #[test]
    fn unparsable_position_rejects_site() {
        assert_eq!(
            normalize("1", "1x0", "TC", "T"),
            Err(Rejection::InvalidPosition)
        );
    }

    #[test]
    fn position_overflow_rejects_site() {
        let max = u64::MAX.to_string();
        assert_eq!(normalize("1", &max, "TC", "T"), Err(Rejection::InvalidPosition));
        assert_eq!(
            normalize("1", &max, "TCA", "T,TCAG"),
            Err(Rejection::InvalidPosition)
        );
        assert_eq!(
            normalize("1", &max, "ACGT", "AGGA"),
            Err(Rejection::InvalidPosition)
        );
    }

    #[test]
    fn allele_numbers_above_nine_are_rejected() {
        let alts = [
            "C", "G", "T", "AA", "AC", "AG", "AT", "ACA", "ACC", "ACG",
        ]
        .join(",");
        assert_eq!(
            normalize("1", "100", "A", &alts),
            Err(Rejection::TooManyAlleles)
        );
        let nine = ["C", "G", "T", "AA", "AC", "AG", "AT", "ACA", "ACC"].join(",");
        assert_eq!(normalize("1", "100", "A", &nine).unwrap().alleles.len(), 9);
    }

    #[test]
    fn normalization_is_stable() {
        for (reference, alt) in [("TA", "TAGCTT"), ("TCCT", "TCCA"), ("TC", "T,TCA,GC")] {
            assert_eq!(
                normalize("1", "100", reference, alt),
                normalize("1", "100", reference, alt)
            );
        }
    }
}
