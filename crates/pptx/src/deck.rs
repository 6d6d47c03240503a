//! In-memory PPTX deck implementing the core drawing surface.

use crate::package::{relationships_xml, PackageWriter};
use crate::shapes::{self, emu};
use crate::template::{self, TitleGeometry};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jupdeck_core::{
    DeckSurface, Error, Frame, ImageRef, LayoutConfig, Result, TableGrid, TextBlock,
};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Notes page size (portrait 7.5in x 10in).
const NOTES_WIDTH: i64 = 6_858_000;
const NOTES_HEIGHT: i64 = 9_144_000;

/// First slide id PowerPoint accepts.
const FIRST_SLIDE_ID: usize = 256;

/// One slide under construction.
#[derive(Debug, Clone)]
struct SlideBuilder {
    title: String,
    shapes: String,
    next_shape_id: u32,
    /// Indices into the deck's media list, in relationship order.
    images: Vec<usize>,
    notes: Option<String>,
}

impl SlideBuilder {
    fn new(title: &str) -> Self {
        let mut shapes = String::with_capacity(4096);
        shapes::title_xml(&mut shapes, 2, title);
        Self {
            title: title.to_string(),
            shapes,
            next_shape_id: 3,
            images: Vec::new(),
            notes: None,
        }
    }

    fn take_shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    fn image_rel_id(position: usize) -> String {
        format!("rId{}", position + 2)
    }

    fn notes_rel_id(&self) -> String {
        format!("rId{}", self.images.len() + 2)
    }
}

/// An embedded media file.
#[derive(Debug, Clone)]
struct Media {
    extension: &'static str,
    content_type: &'static str,
    bytes: Vec<u8>,
}

/// A PowerPoint deck built slide by slide.
///
/// Regions are positioned exactly as given; the only placeholder is the
/// title, which inherits its frame from the "Title Only" layout.
#[derive(Debug, Clone)]
pub struct PptxDeck {
    slide_width: i64,
    slide_height: i64,
    title: TitleGeometry,
    slides: Vec<SlideBuilder>,
    media: Vec<Media>,
}

impl Default for PptxDeck {
    fn default() -> Self {
        Self::from_layout(&LayoutConfig::default())
    }
}

impl PptxDeck {
    /// Create an empty 10in x 7.5in deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty deck sized and titled per `layout`.
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        Self {
            slide_width: emu(layout.slide_width),
            slide_height: emu(layout.slide_height),
            title: TitleGeometry {
                x: emu(layout.title.left),
                y: emu(layout.title.top),
                cx: emu(layout.title.width),
                cy: emu(layout.title.height),
            },
            slides: Vec::new(),
            media: Vec::new(),
        }
    }

    /// Number of slides added so far.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Number of embedded media files.
    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    fn current_slide(&mut self) -> Result<&mut SlideBuilder> {
        self.slides
            .last_mut()
            .ok_or_else(|| Error::Deck("No slide has been added yet".to_string()))
    }

    /// Serialize the deck into an in-memory package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.write_package(PackageWriter::with_writer(Cursor::new(Vec::new())))?;
        Ok(cursor.into_inner())
    }

    fn write_package<W: Write + Seek>(&self, mut package: PackageWriter<W>) -> Result<W> {
        let has_notes = self.slides.iter().any(|s| s.notes.is_some());

        for media in &self.media {
            package.add_default(media.extension, media.content_type);
        }

        package.add_file(
            "_rels/.rels",
            relationships_xml(&[
                ("rId1".to_string(), template::REL_OFFICE_DOCUMENT, "ppt/presentation.xml".to_string()),
                ("rId2".to_string(), template::REL_CORE_PROPS, "docProps/core.xml".to_string()),
                ("rId3".to_string(), template::REL_APP_PROPS, "docProps/app.xml".to_string()),
            ])
            .as_bytes(),
        )?;

        let deck_title = self
            .slides
            .iter()
            .map(|s| s.title.as_str())
            .find(|t| !t.is_empty())
            .unwrap_or_default();
        package.add_part(
            "docProps/core.xml",
            template::CT_CORE_PROPS,
            template::core_props_xml(&shapes::escape_text(deck_title)).as_bytes(),
        )?;
        let notes_count = self.slides.iter().filter(|s| s.notes.is_some()).count();
        package.add_part(
            "docProps/app.xml",
            template::CT_APP_PROPS,
            template::app_props_xml(self.slides.len(), notes_count).as_bytes(),
        )?;

        package.add_part(
            "ppt/presentation.xml",
            template::CT_PRESENTATION,
            self.presentation_xml(has_notes).as_bytes(),
        )?;
        package.add_file(
            "ppt/_rels/presentation.xml.rels",
            self.presentation_rels(has_notes).as_bytes(),
        )?;

        package.add_part(
            "ppt/slideMasters/slideMaster1.xml",
            template::CT_SLIDE_MASTER,
            template::slide_master_xml(self.title).as_bytes(),
        )?;
        package.add_file(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            relationships_xml(&[
                ("rId1".to_string(), template::REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml".to_string()),
                ("rId2".to_string(), template::REL_THEME, "../theme/theme1.xml".to_string()),
            ])
            .as_bytes(),
        )?;
        package.add_part(
            "ppt/slideLayouts/slideLayout1.xml",
            template::CT_SLIDE_LAYOUT,
            template::slide_layout_xml(self.title).as_bytes(),
        )?;
        package.add_file(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            relationships_xml(&[(
                "rId1".to_string(),
                template::REL_SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml".to_string(),
            )])
            .as_bytes(),
        )?;
        package.add_part("ppt/theme/theme1.xml", template::CT_THEME, template::THEME_XML.as_bytes())?;

        if has_notes {
            package.add_part(
                "ppt/notesMasters/notesMaster1.xml",
                template::CT_NOTES_MASTER,
                template::notes_master_xml(NOTES_WIDTH, NOTES_HEIGHT).as_bytes(),
            )?;
            package.add_file(
                "ppt/notesMasters/_rels/notesMaster1.xml.rels",
                relationships_xml(&[(
                    "rId1".to_string(),
                    template::REL_THEME,
                    "../theme/theme2.xml".to_string(),
                )])
                .as_bytes(),
            )?;
            package.add_part("ppt/theme/theme2.xml", template::CT_THEME, template::THEME_XML.as_bytes())?;
        }

        for (i, slide) in self.slides.iter().enumerate() {
            let number = i + 1;
            package.add_part(
                &format!("ppt/slides/slide{}.xml", number),
                template::CT_SLIDE,
                slide_xml(slide).as_bytes(),
            )?;
            package.add_file(
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                self.slide_rels(slide, number).as_bytes(),
            )?;

            if let Some(notes) = &slide.notes {
                package.add_part(
                    &format!("ppt/notesSlides/notesSlide{}.xml", number),
                    template::CT_NOTES_SLIDE,
                    notes_xml(notes).as_bytes(),
                )?;
                package.add_file(
                    &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", number),
                    relationships_xml(&[
                        ("rId1".to_string(), template::REL_NOTES_MASTER, "../notesMasters/notesMaster1.xml".to_string()),
                        ("rId2".to_string(), template::REL_SLIDE, format!("../slides/slide{}.xml", number)),
                    ])
                    .as_bytes(),
                )?;
            }
        }

        for (i, media) in self.media.iter().enumerate() {
            package.add_file(&media_path(i, media.extension), &media.bytes)?;
        }

        package.finish()
    }

    fn presentation_xml(&self, has_notes: bool) -> String {
        let mut xml = String::with_capacity(1024 + self.slides.len() * 48);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            template::NS_A,
            template::NS_R,
            template::NS_P
        ));
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if has_notes {
            xml.push_str(&format!(
                r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId{}"/></p:notesMasterIdLst>"#,
                self.slides.len() + 3
            ));
        }
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.slides.len() {
                xml.push_str(&format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    FIRST_SLIDE_ID + i,
                    i + 3
                ));
            }
            xml.push_str("</p:sldIdLst>");
        }
        xml.push_str(&format!(
            r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/>"#,
            self.slide_width, self.slide_height, NOTES_WIDTH, NOTES_HEIGHT
        ));
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels(&self, has_notes: bool) -> String {
        let mut rels = vec![
            ("rId1".to_string(), template::REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml".to_string()),
            ("rId2".to_string(), template::REL_THEME, "theme/theme1.xml".to_string()),
        ];
        for i in 0..self.slides.len() {
            rels.push((
                format!("rId{}", i + 3),
                template::REL_SLIDE,
                format!("slides/slide{}.xml", i + 1),
            ));
        }
        if has_notes {
            rels.push((
                format!("rId{}", self.slides.len() + 3),
                template::REL_NOTES_MASTER,
                "notesMasters/notesMaster1.xml".to_string(),
            ));
        }
        relationships_xml(&rels)
    }

    fn slide_rels(&self, slide: &SlideBuilder, number: usize) -> String {
        let mut rels = vec![(
            "rId1".to_string(),
            template::REL_SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml".to_string(),
        )];
        for (position, &media_index) in slide.images.iter().enumerate() {
            let extension = self.media[media_index].extension;
            rels.push((
                SlideBuilder::image_rel_id(position),
                template::REL_IMAGE,
                format!("../{}", media_path(media_index, extension).trim_start_matches("ppt/")),
            ));
        }
        if slide.notes.is_some() {
            rels.push((
                slide.notes_rel_id(),
                template::REL_NOTES_SLIDE,
                format!("../notesSlides/notesSlide{}.xml", number),
            ));
        }
        relationships_xml(&rels)
    }
}

impl DeckSurface for PptxDeck {
    fn add_slide(&mut self, title: &str) -> Result<()> {
        self.slides.push(SlideBuilder::new(title));
        Ok(())
    }

    fn add_text(&mut self, frame: Frame, block: &TextBlock) -> Result<()> {
        let slide = self.current_slide()?;
        let id = slide.take_shape_id();
        shapes::text_box_xml(&mut slide.shapes, id, frame, block);
        Ok(())
    }

    fn add_image(&mut self, frame: Frame, image: &ImageRef) -> Result<()> {
        self.current_slide()?;
        let (extension, content_type, bytes) = match decode_image(image) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Skipping image: {}", e);
                return Ok(());
            }
        };

        let media_index = self.media.len();
        self.media.push(Media {
            extension,
            content_type,
            bytes,
        });

        let slide = self.current_slide()?;
        let id = slide.take_shape_id();
        let rel_id = SlideBuilder::image_rel_id(slide.images.len());
        slide.images.push(media_index);
        shapes::picture_xml(&mut slide.shapes, id, frame, &rel_id);
        Ok(())
    }

    fn add_table(&mut self, frame: Frame, grid: &TableGrid) -> Result<()> {
        let slide = self.current_slide()?;
        if grid.columns.is_empty() {
            log::warn!("Skipping table without columns");
            return Ok(());
        }
        let id = slide.take_shape_id();
        shapes::table_xml(&mut slide.shapes, id, frame, grid);
        Ok(())
    }

    fn attach_notes(&mut self, notes: &str) -> Result<()> {
        let slide = self.current_slide()?;
        slide.notes = if notes.is_empty() {
            None
        } else {
            Some(notes.to_string())
        };
        Ok(())
    }

    fn persist(&mut self, path: &Path) -> Result<()> {
        self.write_package(PackageWriter::create(path)?)?;
        log::debug!(
            "Wrote {} slides and {} media files to {}",
            self.slides.len(),
            self.media.len(),
            path.display()
        );
        Ok(())
    }
}

fn media_path(index: usize, extension: &str) -> String {
    format!("ppt/media/image{}.{}", index + 1, extension)
}

/// Decode an image payload into its media extension, content type and bytes.
fn decode_image(image: &ImageRef) -> Result<(&'static str, &'static str, Vec<u8>)> {
    let (extension, content_type) = match image.mime_type.as_str() {
        "image/png" => ("png", "image/png"),
        "image/jpeg" | "image/jpg" => ("jpeg", "image/jpeg"),
        other => {
            return Err(Error::Image(format!("unsupported image type '{}'", other)));
        }
    };

    let compact: String = image.data.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| Error::Image(format!("invalid base64 payload: {}", e)))?;
    if bytes.is_empty() {
        return Err(Error::Image("empty image payload".to_string()));
    }
    Ok((extension, content_type, bytes))
}

fn slide_xml(slide: &SlideBuilder) -> String {
    let mut xml = String::with_capacity(slide.shapes.len() + 1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
        template::NS_A,
        template::NS_R,
        template::NS_P
    ));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(template::SP_TREE_HEADER);
    xml.push_str(&slide.shapes);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    xml
}

fn notes_xml(notes: &str) -> String {
    let mut xml = String::with_capacity(1024 + notes.len());
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<p:notes xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#,
        template::NS_A,
        template::NS_R,
        template::NS_P
    ));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(template::SP_TREE_HEADER);
    xml.push_str(r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>");
    for line in notes.split('\n') {
        if line.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
        } else {
            xml.push_str(&format!(
                r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                shapes::escape_text(line)
            ));
        }
    }
    xml.push_str("</p:txBody></p:sp></p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>");
    xml
}
