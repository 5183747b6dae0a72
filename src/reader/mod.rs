pub mod framer;
pub mod header;
pub mod record;

pub use framer::LineFramer;
pub use header::Header;
pub use record::{FieldSplitter, Fields};

pub const CHROM_IDX: usize = 0;
pub const POS_IDX: usize = 1;
pub const ID_IDX: usize = 2;
pub const REF_IDX: usize = 3;
pub const ALT_IDX: usize = 4;
pub const QUAL_IDX: usize = 5;
pub const FILTER_IDX: usize = 6;
pub const INFO_IDX: usize = 7;
