//! Annotation format implementations.

mod coco;
mod json;
mod voc;

#[cfg(test)]
mod tests;

pub use coco::CocoFormat;
pub use json::JsonFormat;
pub use voc::{
    PascalVocFormat, VocAnnotation, VocBndBox, VocDocument, VocObject, VocRecord, VocSize,
    VocSource, build_records, parse_xml, to_xml, xml_documents,
};
