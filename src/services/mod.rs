//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Field extraction from listing/detail documents (`extractor`)
//! - Deadline heuristics (`deadline`)
//! - Detail content resolution with OCR fallback (`DescriptionResolver`)
//! - OCR provider access (`OcrProvider`, `MistralOcr`)
//! - Run summary aggregation (`RunSummary`)

pub mod deadline;
pub mod description;
pub mod extractor;
pub mod ocr;
pub mod summary;

pub use description::{ContentSource, DescriptionResolver, ExtractionResult};
pub use ocr::{MistralOcr, OcrProvider};
pub use summary::RunSummary;
