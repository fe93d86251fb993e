//! PDF Document wrapper

use crate::image::{
    aligned_offset, calculate_scaled_dimensions, generate_image_operators, ImageScaleMode,
    ImageXObject,
};
use crate::text::{
    generate_text_operators, text_width_points, unencodable_chars, TextRenderContext,
    FONT_RESOURCE,
};
use crate::{Align, PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};

/// A4 page width in points
pub const A4_WIDTH: f64 = 595.28;
/// A4 page height in points
pub const A4_HEIGHT: f64 = 841.89;

/// PDF Document wrapper providing high-level operations
///
/// All coordinates taken by the public API are measured from the top-left
/// corner of the page; conversion to PDF's bottom-left origin happens here.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Root page tree node
    pages_id: ObjectId,
    /// Shared Helvetica font dictionary
    font_id: ObjectId,
    /// Current font size
    current_font_size: f32,
    /// Embedded images (data hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Page image resources (page number -> image name -> object ID)
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    ///
    /// Ordered so that flushing assigns object ids deterministically.
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
}

impl PdfDocument {
    /// Create an empty document (no pages yet)
    ///
    /// # Example
    /// ```ignore
    /// let mut doc = PdfDocument::new();
    /// let page = doc.add_blank_page()?;
    /// doc.insert_text("Vollmacht", page, 56.0, 72.0, Align::Left)?;
    /// let bytes = doc.to_bytes()?;
    /// ```
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Count" => 0,
            "Kids" => Vec::<Object>::new(),
        });

        let font_id = inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self {
            inner,
            pages_id,
            font_id,
            current_font_size: 12.0,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: BTreeMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Set the font size used by subsequent text insertions
    pub fn set_font_size(&mut self, size: f32) {
        self.current_font_size = size;
    }

    /// Current font size in points
    pub fn font_size(&self) -> f32 {
        self.current_font_size
    }

    /// Width of `text` in points at the current font size
    pub fn get_text_width(&self, text: &str) -> f64 {
        text_width_points(text, self.current_font_size)
    }

    /// Add a blank A4 page and return its number (1-indexed)
    pub fn add_blank_page(&mut self) -> Result<usize> {
        let contents_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let page_count = self.page_count();

        let resources = dictionary! {
            "Font" => dictionary! {
                FONT_RESOURCE => self.font_id,
            },
        };

        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(A4_WIDTH as f32),
                Object::Real(A4_HEIGHT as f32),
            ],
            "Resources" => resources,
            "Contents" => contents_id,
        };
        let new_page_id = self.inner.add_object(page_dict);

        let pages_dict = self
            .inner
            .get_object(self.pages_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?
            .clone();

        let mut kids_array = pages_dict
            .get(b"Kids")
            .and_then(Object::as_array)
            .map_err(|_| PdfError::ParseError("Pages object missing Kids array".to_string()))?
            .clone();
        kids_array.push(Object::Reference(new_page_id));

        let mut new_pages_dict = pages_dict;
        new_pages_dict.set(b"Kids", Object::Array(kids_array));
        new_pages_dict.set(b"Count", Object::Integer(page_count as i64 + 1));
        self.inner
            .objects
            .insert(self.pages_id, new_pages_dict.into());

        Ok(page_count + 1)
    }

    fn check_page(&self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        Ok(())
    }

    /// Insert text at a position
    ///
    /// # Arguments
    /// * `text` - Text to insert (WinAnsi subset, see `text` module)
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the baseline in points (from top)
    /// * `align` - Alignment of the text relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        self.check_page(page)?;

        if text.is_empty() {
            return Ok(());
        }

        let replaced = unencodable_chars(text);
        if replaced > 0 {
            tracing::warn!(page, replaced, "characters outside WinAnsi drawn as '?'");
        }

        let ctx = TextRenderContext {
            font_name: FONT_RESOURCE.to_string(),
            font_size: self.current_font_size,
            text_width: self.get_text_width(text),
        };

        let operators = generate_text_operators(text, x, A4_HEIGHT - y, align, &ctx);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Insert an image inside a box
    ///
    /// The image is scaled per `mode` and placed horizontally per `align`;
    /// vertically it sits on the bottom edge of the box.
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `page` - Page number (1-indexed)
    /// * `x` - Left edge of the box in points
    /// * `y` - Top edge of the box in points (from top)
    /// * `width` - Box width in points
    /// * `height` - Box height in points
    /// * `mode` - Scaling mode
    /// * `align` - Horizontal alignment inside the box
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image_in_box(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
        align: Align,
    ) -> Result<(f64, f64)> {
        self.check_page(page)?;

        let (image_resource_name, orig_width, orig_height) =
            self.get_or_create_image_ref(data, page)?;

        let (actual_width, actual_height) =
            calculate_scaled_dimensions(orig_width, orig_height, width, height, mode);
        let pdf_x = x + aligned_offset(width, actual_width, align);
        let pdf_y = A4_HEIGHT - y - height;

        let operators =
            generate_image_operators(&image_resource_name, pdf_x, pdf_y, actual_width, actual_height);
        self.buffer_content(page, &operators);

        Ok((actual_width, actual_height))
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Append every page's buffered operators to its content stream
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page, &content)?;
            }
        }

        Ok(())
    }

    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;

        let page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();

        let mut new_content = match page_dict.get(b"Contents") {
            Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                Ok(Object::Stream(stream)) => stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone()),
                _ => Vec::new(),
            },
            Ok(Object::Stream(stream)) => stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
            _ => Vec::new(),
        };
        new_content.extend_from_slice(content);

        let mut new_stream = Stream::new(Dictionary::new(), new_content);
        if let Err(err) = new_stream.compress() {
            tracing::warn!(page, error = %err, "content stream left uncompressed");
        }
        let stream_id = self.inner.add_object(new_stream);

        let mut new_page_dict = page_dict;
        new_page_dict.set(b"Contents", Object::Reference(stream_id));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Get or create an image reference for a specific page
    ///
    /// Returns the resource name (e.g., "Im1") and the pixel dimensions.
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let object_id = match self.embedded_images.get(&data_hash) {
            Some(id) => *id,
            None => {
                let xobject = ImageXObject::from_bytes(data).map_err(|e| {
                    PdfError::ImageError(format!("Failed to create image XObject: {e}"))
                })?;
                let id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(data_hash, id);
                id
            }
        };

        let xobject_dict = &self
            .inner
            .get_object(object_id)?
            .as_stream()
            .map_err(|_| PdfError::ParseError("Image object is not a stream".to_string()))?
            .dict;
        let width = xobject_dict
            .get(b"Width")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Image missing Width".to_string()))?
            as u32;
        let height = xobject_dict
            .get(b"Height")
            .and_then(Object::as_i64)
            .map_err(|_| PdfError::ParseError("Image missing Height".to_string()))?
            as u32;

        let page_resources = self.page_image_resources.entry(page).or_default();
        if let Some((name, _)) = page_resources.iter().find(|(_, id)| **id == object_id) {
            return Ok((name.clone(), width, height));
        }

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        page_resources.insert(resource_name.clone(), object_id);

        self.add_image_to_page_resources(page, &resource_name, object_id)?;

        Ok((resource_name, width, height))
    }

    /// Add image to a specific page's Resources dictionary
    fn add_image_to_page_resources(
        &mut self,
        page: usize,
        resource_name: &str,
        object_id: ObjectId,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?
            .clone();

        let mut resources_dict = page_dict
            .get(b"Resources")
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default();

        let mut xobject_dict = resources_dict
            .get(b"XObject")
            .and_then(Object::as_dict)
            .cloned()
            .unwrap_or_default();

        xobject_dict.set(resource_name.as_bytes(), Object::Reference(object_id));
        resources_dict.set(b"XObject", Object::Dictionary(xobject_dict));
        page_dict.set(b"Resources", Object::Dictionary(resources_dict));

        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_no_pages() {
        let doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_add_blank_page_numbers() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.add_blank_page().unwrap(), 1);
        assert_eq!(doc.add_blank_page().unwrap(), 2);
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_insert_text_invalid_page() {
        let mut doc = PdfDocument::new();
        let result = doc.insert_text("x", 1, 0.0, 0.0, Align::Left);
        assert!(matches!(result, Err(PdfError::InvalidPage(1, 0))));
    }

    #[test]
    fn test_font_size() {
        let mut doc = PdfDocument::new();
        doc.set_font_size(10.0);
        assert_eq!(doc.font_size(), 10.0);
        assert!((doc.get_text_width("A") - 6.67).abs() < 1e-9);
    }
}
