//! Page sizes from PDF files
//!
//! The CLI never renders content; each page's content handle is its lopdf
//! object id.

use anyhow::{Context, Result};
use lopdf::{Dictionary, Object, ObjectId};
use print_layout::constants::DEFAULT_PAGE_DIMENSIONS;
use print_layout::{Document, Page, PageContent, Size};
use std::path::Path;

/// Load a PDF file
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<lopdf::Document> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = tokio::task::spawn_blocking(move || lopdf::Document::load_mem(&bytes))
        .await?
        .context("Failed to parse PDF")?;
    Ok(doc)
}

/// Build a layout document from the pages of a PDF
pub fn layout_document(pdf: &lopdf::Document) -> Document {
    let pages = pdf
        .get_pages()
        .into_values()
        .map(|page_id| Page::new(page_size(pdf, page_id), PageContent::new(page_id)))
        .collect();
    Document::new(pages, 0.0)
}

/// Displayed size of a page: its media box, inherited from the page tree
/// when the page has none, turned by `/Rotate`.
pub fn page_size(pdf: &lopdf::Document, page_id: ObjectId) -> Size {
    let (width, height) = inherited(pdf, page_id, b"MediaBox")
        .and_then(|obj| box_dimensions(pdf, obj))
        .unwrap_or(DEFAULT_PAGE_DIMENSIONS);

    let rotate = inherited(pdf, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);

    if rotate.rem_euclid(180) == 90 {
        Size::new(height, width)
    } else {
        Size::new(width, height)
    }
}

fn inherited<'a>(pdf: &'a lopdf::Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict: &Dictionary = pdf.get_dictionary(page_id).ok()?;
    // Bounded walk up the page tree
    for _ in 0..32 {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        dict = pdf.get_dictionary(parent).ok()?;
    }
    None
}

fn box_dimensions(pdf: &lopdf::Document, obj: &Object) -> Option<(f32, f32)> {
    let array = match obj {
        Object::Reference(id) => pdf.get_object(*id).ok()?.as_array().ok()?,
        other => other.as_array().ok()?,
    };
    if array.len() != 4 {
        return None;
    }
    let values: Vec<f32> = array.iter().filter_map(extract_number).collect();
    if values.len() != 4 {
        return None;
    }
    Some(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()))
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, Stream};

    fn create_test_document(media_boxes: &[(i64, i64, Option<i64>)]) -> lopdf::Document {
        let mut doc = lopdf::Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for &(width, height, rotate) in media_boxes {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
            let mut page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(width),
                        Object::Integer(height),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            if let Some(rotate) = rotate {
                page.set("Rotate", Object::Integer(rotate));
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(media_boxes.len() as i64)),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_page_sizes_and_rotation() {
        let pdf = create_test_document(&[(612, 792, None), (842, 595, None), (612, 792, Some(90))]);
        let doc = layout_document(&pdf);

        assert_eq!(
            doc.page_sizes(),
            vec![
                Size::new(612.0, 792.0),
                Size::new(842.0, 595.0),
                Size::new(792.0, 612.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_saved_pdf() {
        let mut pdf = create_test_document(&[(300, 400, None), (300, 400, None)]);
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        pdf.save(temp_file.path()).unwrap();

        let loaded = load_pdf(temp_file.path()).await.unwrap();
        let doc = layout_document(&loaded);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page(1).unwrap().size(), Size::new(300.0, 400.0));
    }

    #[tokio::test]
    async fn test_missing_file() {
        assert!(load_pdf("/nonexistent/input.pdf").await.is_err());
    }
}
