use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use serde::Serialize;

use crate::config::Config;
use crate::error::{CustomError, Result};
use crate::model::{GenotypeSummary, NOT_TSTV, NormalizedAllele, VariantKind, tstv};
use crate::pipeline::WorkerStats;
use crate::reader::{CHROM_IDX, Fields, Header, ID_IDX, INFO_IDX, POS_IDX, QUAL_IDX};

pub const BASE_COLUMNS: [&str; 15] = [
    "chrom",
    "pos",
    "type",
    "ref",
    "alt",
    "trTv",
    "heterozygotes",
    "heterozygosity",
    "homozygotes",
    "homozygosity",
    "missingGenos",
    "missingness",
    "ac",
    "an",
    "sampleMaf",
];

/// Output column names, including the optional trailing columns enabled in `config`.
pub fn header_columns(config: &Config) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    if config.keep_pos {
        columns.push("vcfPos");
    }
    if config.keep_id {
        columns.push("id");
    }
    if config.keep_qual {
        columns.push("qual");
    }
    if config.keep_info {
        columns.push("alleleIndex");
        columns.push("info");
    }
    columns
}

/// Tab-delimited writer that never quotes; VCF fields carry no tabs.
pub fn tsv_writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(inner)
}

/// Ratios use three significant digits, `%g` style.
pub fn format_ratio(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    // Round first so the exponent reflects the rounded value
    let scientific = format!("{value:.2e}");
    let Some((mantissa, exp)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exp.parse().unwrap_or(0);
    if !(-4..3).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.abs());
    }
    let decimals = (2 - exponent).max(0) as usize;
    trim_zeros(&format!("{value:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Formats one output row per (site, allele) pair.
pub struct RowFormatter<'a> {
    config: &'a Config,
    header: &'a Header,
    chrom: String,
}

impl<'a> RowFormatter<'a> {
    pub fn new(config: &'a Config, header: &'a Header) -> Self {
        Self {
            config,
            header,
            chrom: String::with_capacity(16),
        }
    }

    pub fn write_row<W: Write>(
        &mut self,
        wtr: &mut csv::Writer<W>,
        fields: Fields<'_>,
        kind: VariantKind,
        allele: &NormalizedAllele,
        summary: &GenotypeSummary,
    ) -> Result<()> {
        let n_samples = self.header.n_samples();
        let effective = n_samples - summary.missing.len();

        let chrom = fields.get(CHROM_IDX);
        self.chrom.clear();
        if !chrom.starts_with("chr") {
            self.chrom.push_str("chr");
        }
        self.chrom.push_str(chrom);
        wtr.write_field(&self.chrom)?;

        wtr.write_field(&allele.position)?;
        wtr.write_field(kind.as_str())?;
        wtr.write_field([allele.reference])?;
        wtr.write_field(&allele.allele)?;
        let trtv = match (kind, allele.allele.as_bytes()) {
            (VariantKind::Snp, &[alt]) => tstv(allele.reference, alt),
            _ => NOT_TSTV,
        };
        wtr.write_field([trtv])?;

        self.write_samples(wtr, &summary.hets, effective)?;
        self.write_samples(wtr, &summary.homs, effective)?;
        self.write_samples(wtr, &summary.missing, n_samples)?;

        wtr.write_field(summary.alt_count.to_string())?;
        wtr.write_field(summary.total_count.to_string())?;
        let maf = if summary.total_count == 0 {
            0.0
        } else {
            summary.alt_count as f64 / summary.total_count as f64
        };
        wtr.write_field(format_ratio(maf))?;

        if self.config.keep_pos {
            wtr.write_field(fields.get(POS_IDX))?;
        }
        if self.config.keep_id {
            wtr.write_field(fields.get(ID_IDX))?;
        }
        if self.config.keep_qual {
            wtr.write_field(fields.get(QUAL_IDX))?;
        }
        if self.config.keep_info {
            wtr.write_field(allele.source_alt_index.to_string())?;
            wtr.write_field(fields.get(INFO_IDX))?;
        }
        wtr.write_record(None::<&[u8]>)?;
        Ok(())
    }

    fn write_samples<W: Write>(
        &self,
        wtr: &mut csv::Writer<W>,
        samples: &[usize],
        denominator: usize,
    ) -> Result<()> {
        if samples.is_empty() || denominator == 0 {
            wtr.write_field(&self.config.empty_field)?;
            wtr.write_field("0")?;
            return Ok(());
        }
        let names = self.header.samples();
        let joined = samples
            .iter()
            .map(|&idx| names[idx].as_str())
            .join(&self.config.field_delimiter);
        wtr.write_field(joined)?;
        wtr.write_field(format_ratio(samples.len() as f64 / denominator as f64))?;
        Ok(())
    }
}

/// Writes the sample names (header columns after FORMAT), one per line.
pub fn write_sample_list(path: &Path, header: &Header) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    })?;
    let mut wtr = tsv_writer(std::io::BufWriter::new(file));
    for sample in header.samples() {
        wtr.write_record([sample])?;
    }
    wtr.flush().map_err(|e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    })?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: String,
    pub timestamp: String,
    pub input: String,
    pub output: String,
    pub threads: usize,
    pub n_samples: usize,
    pub statistics: WorkerStats,
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|e| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::FieldSplitter;

    #[test]
    fn ratios_use_three_significant_digits() {
        assert_eq!(format_ratio(1.0 / 3.0), "0.333");
        assert_eq!(format_ratio(2.0 / 3.0), "0.667");
        assert_eq!(format_ratio(0.5), "0.5");
        assert_eq!(format_ratio(1.0), "1");
        assert_eq!(format_ratio(0.0123456), "0.0123");
        assert_eq!(format_ratio(0.0), "0");
        assert_eq!(format_ratio(1.5e-5), "1.5e-05");
    }

    #[test]
    fn ratio_exponent_follows_rounding() {
        assert_eq!(format_ratio(0.00009996), "0.0001");
        assert_eq!(format_ratio(0.99996), "1");
        assert_eq!(format_ratio(0.0009996), "0.001");
        assert_eq!(format_ratio(0.000012345), "1.23e-05");
    }

    #[test]
    fn optional_columns_keep_fixed_order() {
        let config = Config {
            keep_id: true,
            keep_qual: true,
            keep_pos: true,
            keep_info: true,
            ..Config::default()
        };
        let columns = header_columns(&config);
        assert_eq!(
            &columns[BASE_COLUMNS.len()..],
            &["vcfPos", "id", "qual", "alleleIndex", "info"]
        );
        assert_eq!(header_columns(&Config::default()).len(), BASE_COLUMNS.len());
    }

    fn render(config: &Config, summary: &GenotypeSummary, kind: VariantKind, allele: &str) -> String {
        let header = Header::parse(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3\tS4",
        )
        .unwrap();
        let line = "1\t100\trs1\tA\tG\t50\tPASS\tDP=10\tGT\t0|1\t1|1\t.|.\t0|0";
        let mut splitter = FieldSplitter::default();
        let allele = NormalizedAllele {
            position: "100".to_string(),
            reference: b'A',
            allele: allele.to_string(),
            source_alt_index: 0,
        };
        let mut wtr = tsv_writer(Vec::new());
        let mut formatter = RowFormatter::new(config, &header);
        formatter
            .write_row(&mut wtr, splitter.split(line), kind, &allele, summary)
            .unwrap();
        wtr.flush().unwrap();
        String::from_utf8(wtr.get_ref().clone()).unwrap()
    }

    #[test]
    fn formats_site_statistics() {
        let summary = GenotypeSummary {
            homs: vec![1],
            hets: vec![0],
            missing: vec![2],
            alt_count: 3,
            total_count: 6,
        };
        let row = render(&Config::default(), &summary, VariantKind::Snp, "G");
        assert_eq!(
            row,
            "chr1\t100\tSNP\tA\tG\t1\tS1\t0.333\tS2\t0.333\tS3\t0.25\t3\t6\t0.5\n"
        );
    }

    #[test]
    fn empty_lists_use_marker_and_optional_columns_follow() {
        let config = Config {
            keep_id: true,
            keep_pos: true,
            keep_info: true,
            empty_field: "NA".to_string(),
            ..Config::default()
        };
        let summary = GenotypeSummary {
            homs: vec![0, 1],
            hets: vec![],
            missing: vec![],
            alt_count: 4,
            total_count: 8,
        };
        let row = render(&config, &summary, VariantKind::Multi, "+T");
        assert_eq!(
            row,
            "chr1\t100\tMULTIALLELIC\tA\t+T\t0\tNA\t0\tS1;S2\t0.5\tNA\t0\t4\t8\t0.5\t100\trs1\t0\tDP=10\n"
        );
    }
}
