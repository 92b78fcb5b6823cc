//! Pascal VOC format implementation.
//!
//! The registry export is a JSON array with one `{"annotation": ...}` record
//! per image that has at least one annotation of any type. Only rectangles
//! become `object` entries; everything else is silently omitted.
//!
//! The same records can be rendered as classic per-image VOC XML documents.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::format::dataset::{Dataset, DatasetView};
use crate::format::error::FormatError;
use crate::format::traits::AnnotationFormat;
use crate::geometry::Rect;
use crate::model::{Annotation, ImageInfo, Shape};

/// Folder name used when the project has no name.
const DEFAULT_FOLDER: &str = "dataset";

/// One per-image VOC record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocRecord {
    pub annotation: VocAnnotation,
}

/// Body of a VOC record (the `<annotation>` element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocAnnotation {
    pub folder: String,
    pub filename: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub source: VocSource,
    pub size: VocSize,
    #[serde(default)]
    pub segmented: u8,
    #[serde(default)]
    pub object: Vec<VocObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocSource {
    pub database: String,
}

impl Default for VocSource {
    fn default() -> Self {
        Self {
            database: "Unknown".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VocSize {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocObject {
    pub name: String,
    #[serde(default = "unspecified")]
    pub pose: String,
    #[serde(default)]
    pub truncated: u8,
    #[serde(default)]
    pub difficult: u8,
    pub bndbox: VocBndBox,
}

fn unspecified() -> String {
    "Unspecified".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VocBndBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl VocBndBox {
    fn from_rect(rect: &Rect) -> Self {
        Self {
            xmin: rect.x,
            ymin: rect.y,
            xmax: rect.x + rect.width,
            ymax: rect.y + rect.height,
        }
    }

    fn to_rect(self) -> Rect {
        Rect::new(self.xmin, self.ymin, self.xmax - self.xmin, self.ymax - self.ymin)
    }
}

/// A rendered VOC XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct VocDocument {
    /// Image stem plus `.xml`, suffixed when stems collide.
    pub file_name: String,
    pub xml: String,
}

/// Pascal VOC format.
///
/// Supports:
/// - Bounding boxes only
///
/// Does not support:
/// - Polygons, points and keypoints (silently omitted)
pub struct PascalVocFormat;

impl AnnotationFormat for PascalVocFormat {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn display_name(&self) -> &'static str {
        "Pascal VOC"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json", "xml"]
    }

    fn supports_polygon(&self) -> bool {
        false
    }

    fn supports_point(&self) -> bool {
        false
    }

    fn export(&self, data: &DatasetView<'_>) -> Result<String, FormatError> {
        let records = build_records(data);
        let json = serde_json::to_string_pretty(&records)?;

        log::info!(
            "Exported {} VOC records with {} objects",
            records.len(),
            records
                .iter()
                .map(|r| r.annotation.object.len())
                .sum::<usize>()
        );
        Ok(json)
    }

    /// Accepts the JSON record array or a single VOC XML document.
    fn import(&self, content: &str, images: &[ImageInfo]) -> Result<Dataset, FormatError> {
        let records: Vec<VocAnnotation> = if content.trim_start().starts_with('<') {
            vec![parse_xml(content)?]
        } else {
            serde_json::from_str::<Vec<VocRecord>>(content)?
                .into_iter()
                .map(|r| r.annotation)
                .collect()
        };

        let timestamp = clock::now_iso8601();
        let mut dataset = Dataset::default();
        for (record_idx, record) in records.iter().enumerate() {
            let image = if images.is_empty() {
                Some(ImageInfo::new(
                    record.filename.clone(),
                    &record.filename,
                    record.size.width,
                    record.size.height,
                ))
            } else {
                images
                    .iter()
                    .find(|img| img.filename == record.filename)
                    .cloned()
            };
            let Some(image) = image else {
                log::warn!("VOC import: no image matches '{}'", record.filename);
                continue;
            };

            for (obj_idx, obj) in record.object.iter().enumerate() {
                dataset.annotations.push(Annotation::new(
                    format!("voc-{}-{}", record_idx + 1, obj_idx + 1),
                    image.id.clone(),
                    obj.name.clone(),
                    Shape::Rectangle(obj.bndbox.to_rect()),
                    timestamp.clone(),
                ));
            }
            dataset.images.push(image);
        }

        log::info!(
            "Imported {} images with {} annotations from VOC",
            dataset.images.len(),
            dataset.annotations.len()
        );
        Ok(dataset)
    }
}

/// Build one record per image that has at least one annotation.
///
/// Images are visited in the order supplied; only rectangles become objects.
pub fn build_records(data: &DatasetView<'_>) -> Vec<VocRecord> {
    let folder = data
        .project
        .map(|p| p.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FOLDER);

    data.images
        .iter()
        .filter_map(|img| {
            let annotations: Vec<&Annotation> = data.annotations_for(&img.id).collect();
            if annotations.is_empty() {
                return None;
            }

            let object = annotations
                .iter()
                .filter_map(|ann| match &ann.shape {
                    Shape::Rectangle(rect) => Some(VocObject {
                        name: ann.category.clone(),
                        pose: unspecified(),
                        truncated: 0,
                        difficult: 0,
                        bndbox: VocBndBox::from_rect(rect),
                    }),
                    _ => None,
                })
                .collect();

            Some(VocRecord {
                annotation: VocAnnotation {
                    folder: folder.to_string(),
                    filename: img.filename.clone(),
                    path: img.url.clone(),
                    source: VocSource::default(),
                    size: VocSize {
                        width: img.width,
                        height: img.height,
                        depth: 3,
                    },
                    segmented: 0,
                    object,
                },
            })
        })
        .collect()
}

/// Render every VOC record as an XML document.
///
/// Images sharing a stem (`a.jpg`, `a.png`) get `_<n>` suffixes so every
/// document has a distinct file name.
pub fn xml_documents(data: &DatasetView<'_>) -> Result<Vec<VocDocument>, FormatError> {
    let mut used = HashSet::new();
    build_records(data)
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let stem = Path::new(&record.annotation.filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown");
            Ok(VocDocument {
                file_name: unique_file_name(&mut used, stem, idx),
                xml: to_xml(&record.annotation)?,
            })
        })
        .collect()
}

fn unique_file_name(used: &mut HashSet<String>, stem: &str, idx: usize) -> String {
    let mut name = format!("{}.xml", stem);
    let mut suffix = idx;
    while used.contains(&name) {
        log::warn!("VOC document name {} already taken, adding suffix", name);
        name = format!("{}_{}.xml", stem, suffix);
        suffix += 1;
    }
    used.insert(name.clone());
    name
}

/// Write one `<annotation>` document.
pub fn to_xml(annotation: &VocAnnotation) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.write_event(Event::Start(BytesStart::new("annotation")))?;

    write_text_element(&mut writer, "folder", &annotation.folder)?;
    write_text_element(&mut writer, "filename", &annotation.filename)?;
    write_text_element(&mut writer, "path", &annotation.path)?;

    writer.write_event(Event::Start(BytesStart::new("source")))?;
    write_text_element(&mut writer, "database", &annotation.source.database)?;
    writer.write_event(Event::End(BytesEnd::new("source")))?;

    writer.write_event(Event::Start(BytesStart::new("size")))?;
    write_text_element(&mut writer, "width", &annotation.size.width.to_string())?;
    write_text_element(&mut writer, "height", &annotation.size.height.to_string())?;
    write_text_element(&mut writer, "depth", &annotation.size.depth.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("size")))?;

    write_text_element(&mut writer, "segmented", &annotation.segmented.to_string())?;

    for obj in &annotation.object {
        writer.write_event(Event::Start(BytesStart::new("object")))?;
        write_text_element(&mut writer, "name", &obj.name)?;
        write_text_element(&mut writer, "pose", &obj.pose)?;
        write_text_element(&mut writer, "truncated", &obj.truncated.to_string())?;
        write_text_element(&mut writer, "difficult", &obj.difficult.to_string())?;

        writer.write_event(Event::Start(BytesStart::new("bndbox")))?;
        write_text_element(&mut writer, "xmin", &obj.bndbox.xmin.to_string())?;
        write_text_element(&mut writer, "ymin", &obj.bndbox.ymin.to_string())?;
        write_text_element(&mut writer, "xmax", &obj.bndbox.xmax.to_string())?;
        write_text_element(&mut writer, "ymax", &obj.bndbox.ymax.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("bndbox")))?;

        writer.write_event(Event::End(BytesEnd::new("object")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("annotation")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|_| FormatError::invalid_format("Invalid UTF-8 in XML"))
}

/// Write a simple text element.
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Parse one VOC XML document.
pub fn parse_xml(content: &str) -> Result<VocAnnotation, FormatError> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut annotation = VocAnnotation {
        folder: String::new(),
        filename: String::new(),
        path: String::new(),
        source: VocSource::default(),
        size: VocSize {
            width: 0,
            height: 0,
            depth: 3,
        },
        segmented: 0,
        object: Vec::new(),
    };

    // Current parsing state
    let mut current_element = String::new();
    let mut in_object = false;
    let mut in_bndbox = false;
    let mut in_size = false;
    let mut in_source = false;
    let mut saw_root = false;

    // Current object data
    let mut obj_name = String::new();
    let mut obj_pose = unspecified();
    let mut bndbox = VocBndBox::default();

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "annotation" => saw_root = true,
                    "object" => {
                        in_object = true;
                        obj_name.clear();
                        obj_pose = unspecified();
                        bndbox = VocBndBox::default();
                    }
                    "bndbox" => in_bndbox = true,
                    "size" => in_size = true,
                    "source" => in_source = true,
                    _ => {}
                }
                current_element = name;
            }
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "object" => {
                        if obj_name.is_empty() {
                            log::warn!("VOC import: skipping object without a name");
                        } else {
                            annotation.object.push(VocObject {
                                name: std::mem::take(&mut obj_name),
                                pose: std::mem::take(&mut obj_pose),
                                truncated: 0,
                                difficult: 0,
                                bndbox,
                            });
                        }
                        in_object = false;
                    }
                    "bndbox" => in_bndbox = false,
                    "size" => in_size = false,
                    "source" => in_source = false,
                    _ => {}
                }
                current_element.clear();
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.to_string();
                let number = || -> Result<f32, FormatError> {
                    text.parse().map_err(|_| {
                        FormatError::invalid_coordinates(format!(
                            "<{}> is not a number: '{}'",
                            current_element, text
                        ))
                    })
                };

                if in_size {
                    match current_element.as_str() {
                        "width" => annotation.size.width = number()? as u32,
                        "height" => annotation.size.height = number()? as u32,
                        "depth" => annotation.size.depth = number()? as u32,
                        _ => {}
                    }
                } else if in_source {
                    if current_element == "database" {
                        annotation.source.database = text;
                    }
                } else if in_object {
                    if in_bndbox {
                        match current_element.as_str() {
                            "xmin" => bndbox.xmin = number()?,
                            "ymin" => bndbox.ymin = number()?,
                            "xmax" => bndbox.xmax = number()?,
                            "ymax" => bndbox.ymax = number()?,
                            _ => {}
                        }
                    } else {
                        match current_element.as_str() {
                            "name" => obj_name = text,
                            "pose" => obj_pose = text,
                            _ => {}
                        }
                    }
                } else {
                    match current_element.as_str() {
                        "folder" => annotation.folder = text,
                        "filename" => annotation.filename = text,
                        "path" => annotation.path = text,
                        "segmented" => annotation.segmented = u8::from(text == "1"),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(FormatError::missing_field("annotation"));
    }
    if annotation.filename.is_empty() {
        return Err(FormatError::missing_field("annotation.filename"));
    }
    Ok(annotation)
}
