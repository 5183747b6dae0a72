#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const META: &str = "##fileformat=VCFv4.2\n##source=vcfprep-tests\n";
pub const FIXED: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";

/// Data lines in the generated bulk dataset; every tenth is filtered out.
pub const BULK_LINES: usize = 5_000;
pub const BULK_GENOTYPES: [&str; 3] = ["0|1", "1|1", "0|0"];

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct Dataset {
    pub dir: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Dataset {
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn read_output(&self) -> String {
        fs::read_to_string(&self.output).unwrap()
    }
}

fn scratch_dir(label: &str) -> io::Result<PathBuf> {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join("vcfprep-tests").join(format!(
        "{}-{}-{}",
        std::process::id(),
        id,
        label
    ));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Writes `contents` verbatim as the input VCF.
pub fn create_dataset(label: &str, contents: &str) -> io::Result<Dataset> {
    let dir = scratch_dir(label)?;
    let input = dir.join("input.vcf");
    fs::write(&input, contents)?;
    let output = dir.join("output.tsv");
    Ok(Dataset { dir, input, output })
}

/// Builds a complete VCF from sample names and data lines.
pub fn vcf(samples: &[&str], lines: &[&str]) -> String {
    let mut out = String::from(META);
    out.push_str(FIXED);
    for sample in samples {
        out.push('\t');
        out.push_str(sample);
    }
    out.push('\n');
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn create_bulk_dataset(label: &str) -> io::Result<Dataset> {
    let dir = scratch_dir(label)?;
    let input = dir.join("input.vcf");
    let mut file = io::BufWriter::new(File::create(&input)?);
    write!(file, "{META}{FIXED}")?;
    for idx in 0..BULK_GENOTYPES.len() {
        write!(file, "\tS{}", idx + 1)?;
    }
    writeln!(file)?;
    for pos in 1..=BULK_LINES {
        let filter = if pos % 10 == 0 { "LowQual" } else { "PASS" };
        write!(file, "1\t{pos}\trs{pos}\tA\tG\t50\t{filter}\t.\tGT")?;
        for gt in BULK_GENOTYPES {
            write!(file, "\t{gt}")?;
        }
        writeln!(file)?;
    }
    file.flush()?;
    let output = dir.join("output.tsv");
    Ok(Dataset { dir, input, output })
}

pub fn expected_bulk_rows() -> usize {
    BULK_LINES - BULK_LINES / 10
}
