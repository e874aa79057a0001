//! Document assembly and saving.

use std::path::Path;

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use md5::{Digest, Md5};

use super::canvas::{Page, FONT_RESOURCE, IMAGE_RESOURCE};
use super::font::FontResource;
use crate::atomic::write_atomic_with;
use crate::error::{Error, Result};
use crate::model::Metadata;

/// Accumulates sealed pages into one PDF document.
///
/// Pages are written into the object graph as they arrive, so page images
/// are not held in memory until the end. Nothing touches the filesystem
/// before [`save`](DocumentAssembler::save).
pub struct DocumentAssembler {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    font: FontResource,
    font_used: bool,
    kids: Vec<Object>,
    digest: Md5,
    metadata: Metadata,
}

impl DocumentAssembler {
    /// Start a document with the given text-layer font.
    pub fn new(font: FontResource, metadata: Metadata) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            font_id,
            font,
            font_used: false,
            kids: Vec::new(),
            digest: Md5::new(),
            metadata,
        }
    }

    /// The text-layer font, for composing the next page.
    pub fn font_mut(&mut self) -> &mut FontResource {
        &mut self.font
    }

    pub fn font(&self) -> &FontResource {
        &self.font
    }

    /// Pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page. Pages appear in the order they are added.
    pub fn add_page(&mut self, mut page: Page) -> Result<()> {
        let content = page.content()?;
        self.digest.update(&content);
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

        let mut resources = lopdf::Dictionary::new();

        if let Some(image) = page.take_image() {
            self.digest.update(image.data());
            let image_id = self.doc.add_object(image.into_stream());
            resources.set(
                "XObject",
                dictionary! { IMAGE_RESOURCE => image_id },
            );
        }

        if page.uses_font() {
            self.font_used = true;
            resources.set("Font", dictionary! { FONT_RESOURCE => self.font_id });
        }

        if !page.alpha_states().is_empty() {
            let mut states = lopdf::Dictionary::new();
            for (name, alpha) in page.alpha_states() {
                states.set(
                    name.as_str(),
                    dictionary! {
                        "Type" => "ExtGState",
                        "ca" => *alpha,
                    },
                );
            }
            resources.set("ExtGState", states);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(page.width() as i64),
                Object::Integer(page.height() as i64),
            ],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());

        log::debug!(
            "Added page {} ({}x{})",
            self.kids.len(),
            page.width(),
            page.height()
        );
        Ok(())
    }

    /// Finalize the object graph. Fails with [`Error::EmptyDocument`] when
    /// no page was added.
    pub fn finish(mut self) -> Result<Document> {
        if self.kids.is_empty() {
            return Err(Error::EmptyDocument);
        }

        if self.font_used {
            self.font.write(&mut self.doc, self.font_id)?;
        }

        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });

        let mut info = dictionary! {
            "Producer" => Object::string_literal(self.metadata.producer.as_str()),
            "Creator" => Object::string_literal(self.metadata.creator.as_str()),
            "CreationDate" => Object::string_literal(self.metadata.pdf_creation_date()),
        };
        if let Some(title) = &self.metadata.title {
            info.set("Title", text_string(title));
        }
        let info_id = self.doc.add_object(info);

        let id = self.digest.finalize().to_vec();
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.trailer.set(
            "ID",
            vec![
                Object::String(id.clone(), StringFormat::Hexadecimal),
                Object::String(id, StringFormat::Hexadecimal),
            ],
        );

        self.doc.compress();
        log::info!("Assembled document with {} page(s)", count);
        Ok(self.doc)
    }

    /// Finalize and write the document to `path` in one atomic step.
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let mut doc = self.finish()?;
        save_document(&mut doc, path.as_ref())
    }
}

/// Write a finished document to `path` atomically.
pub fn save_document(doc: &mut Document, path: &Path) -> Result<()> {
    write_atomic_with(path, |w| {
        doc.save_to(w)?;
        Ok(())
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Build a whole document from sealed pages.
pub fn assemble(
    pages: impl IntoIterator<Item = Page>,
    font: FontResource,
    metadata: Metadata,
) -> Result<Document> {
    let mut assembler = DocumentAssembler::new(font, metadata);
    for page in pages {
        assembler.add_page(page)?;
    }
    assembler.finish()
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

impl std::fmt::Debug for DocumentAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAssembler")
            .field("pages", &self.kids.len())
            .field("font", &self.font.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Quad, SourceImage, TextRegion};
    use crate::ocr::Recognition;
    use crate::pdf::{PageCompositor, PreparedPage};
    use image::RgbImage;

    fn page(index: usize, w: u32, h: u32, texts: &[&str]) -> (Page, FontResource) {
        let img = SourceImage::from_rgb(index, format!("p{}.png", index + 1), RgbImage::new(w, h));
        let regions = texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextRegion::new(index, Quad::from_rect(5.0, 5.0 + 20.0 * i as f32, 50.0, 15.0), *t, 0.9))
            .collect();
        let prepared = PreparedPage::new(&img, Recognition { regions, ..Default::default() }).unwrap();
        let mut font = FontResource::builtin();
        let page = PageCompositor::default().compose(prepared, &mut font).unwrap();
        (page, font)
    }

    #[test]
    fn test_empty_document_rejected() {
        let assembler = DocumentAssembler::new(FontResource::builtin(), Metadata::default());
        assert!(matches!(assembler.finish(), Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_pages_in_order_with_sizes() {
        let (p1, _) = page(0, 100, 50, &["alpha"]);
        let (p2, _) = page(1, 80, 120, &[]);
        let doc = assemble([p1, p2], FontResource::builtin(), Metadata::default()).unwrap();

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        let second = doc.get_dictionary(pages[&2]).unwrap();
        let media_box = second.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 80);
        assert_eq!(media_box[3].as_i64().unwrap(), 120);
    }

    #[test]
    fn test_text_is_extractable() {
        let (p1, _) = page(0, 200, 100, &["Hello", "World"]);
        let doc = assemble([p1], FontResource::builtin(), Metadata::default()).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
    }

    #[test]
    fn test_info_and_id() {
        let (p1, _) = page(0, 10, 10, &[]);
        let metadata = Metadata::new().with_title("Scan");
        let doc = assemble([p1], FontResource::builtin(), metadata).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert!(info.get(b"Producer").is_ok());
        assert!(info.get(b"Title").is_ok());
        assert_eq!(doc.trailer.get(b"ID").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_image_only_pages_skip_font() {
        let (p1, _) = page(0, 10, 10, &[]);
        let mut assembler = DocumentAssembler::new(FontResource::builtin(), Metadata::default());
        assembler.add_page(p1).unwrap();
        let font_id = assembler.font_id;
        let doc = assembler.finish().unwrap();
        assert!(doc.get_object(font_id).is_err());
    }

    #[test]
    fn test_save_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let (p1, _) = page(0, 20, 20, &["x"]);
        let mut assembler = DocumentAssembler::new(FontResource::builtin(), Metadata::default());
        assembler.add_page(p1).unwrap();
        assembler.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(crate::detect::is_pdf_bytes(&bytes));
        assert_eq!(Document::load(&path).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn test_text_string_encoding() {
        match text_string("abc") {
            Object::String(bytes, StringFormat::Literal) => assert_eq!(bytes, b"abc".to_vec()),
            other => panic!("unexpected {:?}", other),
        }
        match text_string("日") {
            Object::String(bytes, _) => assert_eq!(bytes, vec![0xFE, 0xFF, 0x65, 0xE5]),
            other => panic!("unexpected {:?}", other),
        }
    }
}
