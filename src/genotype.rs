use thiserror::Error;

use crate::model::GenotypeSummary;
use crate::reader::Fields;

const FORMAT_SEPARATOR: u8 = b':';

/// A genotype that cannot be decoded. Taints every allele call at the site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed genotype {genotype:?} in sample column {sample}")]
pub struct MalformedGenotype {
    pub sample: usize,
    pub genotype: String,
}

fn is_phase_separator(b: u8) -> bool {
    b == b'|' || b == b'/'
}

/// Buckets every sample for the genotype allele number `target` (`b'1'`..=`b'9'`).
///
/// `summary` is cleared first and holds sample offsets (0 = first sample column).
pub fn classify(
    fields: Fields<'_>,
    target: u8,
    summary: &mut GenotypeSummary,
) -> std::result::Result<(), MalformedGenotype> {
    summary.clear();

    for (sample, field) in fields.samples().enumerate() {
        let bytes = field.as_bytes();
        let malformed = || MalformedGenotype {
            sample,
            genotype: field.to_string(),
        };

        let Some(&first) = bytes.first() else {
            return Err(malformed());
        };
        if first == b'.' {
            summary.missing.push(sample);
            continue;
        }

        // Haploid
        if bytes.len() == 1 || bytes[1] == FORMAT_SEPARATOR {
            if !first.is_ascii_digit() {
                return Err(malformed());
            }
            summary.total_count += 1;
            if first == target {
                summary.alt_count += 1;
                summary.homs.push(sample);
            }
            continue;
        }

        let gt = match bytes.iter().position(|&b| b == FORMAT_SEPARATOR) {
            Some(end) => &bytes[..end],
            None => bytes,
        };
        if gt.len() < 3 || !is_phase_separator(gt[1]) || gt[2] == b'.' {
            return Err(malformed());
        }

        if gt.len() == 3 {
            match (gt[0], gt[2], target) {
                (b'0', b'0', _) => {
                    summary.total_count += 2;
                    continue;
                }
                (b'0', b'1', b'1') | (b'1', b'0', b'1') => {
                    summary.total_count += 2;
                    summary.alt_count += 1;
                    summary.hets.push(sample);
                    continue;
                }
                (b'1', b'1', b'1') => {
                    summary.total_count += 2;
                    summary.alt_count += 2;
                    summary.homs.push(sample);
                    continue;
                }
                _ => {}
            }
        }

        let mut ploidy = 0u32;
        let mut n_alt = 0u32;
        let mut is_missing = false;
        for call in gt.split(|&b| is_phase_separator(b)) {
            if call == b"." {
                is_missing = true;
                break;
            }
            if call.is_empty() || !call.iter().all(u8::is_ascii_digit) {
                return Err(malformed());
            }
            ploidy += 1;
            if call.len() == 1 && call[0] == target {
                n_alt += 1;
            }
        }

        if is_missing {
            summary.missing.push(sample);
            continue;
        }
        summary.total_count += ploidy;
        summary.alt_count += n_alt;
        if n_alt == ploidy {
            summary.homs.push(sample);
        } else if n_alt > 0 {
            summary.hets.push(sample);
        }
    }
    Ok(())
}
