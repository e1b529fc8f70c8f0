//! Corpus ingestion: numeral parsing, act/scene segmentation, entity annotation

mod entities;
mod numerals;
mod processor;
mod segmenter;

pub use entities::EntityAnnotator;
pub use numerals::roman_to_int;
pub use processor::IngestPipeline;
pub use segmenter::{BoundaryScan, SegmentedCorpus, Segmenter, SegmenterConfig};
