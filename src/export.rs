//! PNG export of a generated QR code with optional captions
//!
//! The QR code fills a `size × size` square at the top of the canvas. A title
//! (bold, 16 px) and a description (14 px) are centered below it on fixed
//! baselines. With [`ExportOptions::expand_canvas`] the canvas grows to hold
//! them; without it the captions fall outside the canvas and are clipped.

use crate::config::ExportOptions;
use crate::error::{Error, Result};
use crate::qr::VectorImage;
use crate::raster;
use image::{ImageFormat, RgbaImage};
use resvg::usvg::fontdb::{self, Family, Query};
use resvg::{tiny_skia, usvg};
use std::io::Cursor;
use std::path::{Path, PathBuf};

const TITLE_FONT_PX: u32 = 16;
const DESCRIPTION_FONT_PX: u32 = 14;
const TITLE_BASELINE: u32 = 20;
const DESCRIPTION_BASELINE: u32 = 40;
const CAPTION_PADDING: u32 = 10;

/// What to export
#[derive(Debug, Clone, Copy)]
pub struct ExportRequest<'a> {
    /// Rendered QR code
    pub image: &'a VectorImage,
    /// Width of the canvas and side of the QR square, in pixels
    pub size: u32,
    /// Leave the background transparent instead of white
    pub transparent: bool,
    /// Optional bold caption
    pub title: Option<&'a str>,
    /// Optional regular caption below the title
    pub description: Option<&'a str>,
}

/// A rasterized export ready to be written out
#[derive(Debug, Clone)]
pub struct ExportedImage {
    file_name: String,
    image: RgbaImage,
}

impl ExportedImage {
    /// File name the export should be saved under
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Rasterized pixels
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write the PNG into `dir` under [`Self::file_name`]
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        self.save_as(&path)?;
        Ok(path)
    }

    /// Write the PNG to an explicit path
    pub fn save_as(&self, path: &Path) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        tracing::info!(path = %path.display(), "Exported QR code");
        Ok(())
    }
}

/// Rasterize the request onto a canvas and return the result
pub fn export(request: &ExportRequest<'_>, options: &ExportOptions) -> Result<ExportedImage> {
    let title = request.title.filter(|t| !t.trim().is_empty());
    let description = request.description.filter(|d| !d.trim().is_empty());

    let size = request.size;
    let height = if options.expand_canvas {
        size + caption_height(title.is_some(), description.is_some())
    } else {
        size
    };

    let mut pixmap = raster::canvas(size, height)?;
    if !request.transparent {
        pixmap.fill(tiny_skia::Color::WHITE);
    }

    let tree = raster::parse(request.image.as_svg(), &usvg::Options::default())?;
    raster::draw_scaled(&tree, size, &mut pixmap);

    // Without expansion the baselines sit below the canvas and nothing would show
    if options.expand_canvas && (title.is_some() || description.is_some()) {
        let markup = caption_svg(size, height, title, description, &options.font_family);
        let mut caption_options = usvg::Options::default();
        load_caption_fonts(caption_options.fontdb_mut())?;
        let captions = raster::parse(&markup, &caption_options)?;
        // usvg drops text it cannot shape instead of failing
        if !captions.root().has_children() {
            return Err(Error::CaptionFont(format!(
                "no installed face matches '{}'",
                options.font_family
            )));
        }
        resvg::render(
            &captions,
            tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
    }

    tracing::debug!(
        width = size,
        height,
        transparent = request.transparent,
        captions = title.is_some() || description.is_some(),
        "Rasterized export canvas"
    );

    Ok(ExportedImage {
        file_name: options.file_name.clone(),
        image: raster::to_rgba(&pixmap),
    })
}

/// Load system fonts, pointing the generic sans-serif family at an installed
/// face when the default one is missing
fn load_caption_fonts(db: &mut fontdb::Database) -> Result<()> {
    db.load_system_fonts();

    let sans_serif = Query {
        families: &[Family::SansSerif],
        ..Query::default()
    };
    if db.query(&sans_serif).is_some() {
        return Ok(());
    }

    let fallback = db
        .faces()
        .find_map(|face| face.families.first().map(|(family, _)| family.clone()))
        .ok_or_else(|| Error::CaptionFont("no system fonts installed".to_string()))?;
    tracing::debug!(%fallback, "Default sans-serif family missing, using fallback");
    db.set_sans_serif_family(fallback);
    Ok(())
}

/// Extra canvas height needed below the QR square for the given captions
fn caption_height(title: bool, description: bool) -> u32 {
    if description {
        DESCRIPTION_BASELINE + CAPTION_PADDING
    } else if title {
        TITLE_BASELINE + CAPTION_PADDING
    } else {
        0
    }
}

fn caption_svg(
    width: u32,
    height: u32,
    title: Option<&str>,
    description: Option<&str>,
    font_family: &str,
) -> String {
    let center = width as f32 / 2.0;
    let family = escape_xml(font_family);
    let mut markup = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );

    if let Some(title) = title {
        markup.push_str(&format!(
            r#"<text x="{center}" y="{y}" text-anchor="middle" font-family="{family}" font-size="{TITLE_FONT_PX}" font-weight="bold" fill="black">{text}</text>"#,
            y = width + TITLE_BASELINE,
            text = escape_xml(title),
        ));
    }
    if let Some(description) = description {
        markup.push_str(&format!(
            r#"<text x="{center}" y="{y}" text-anchor="middle" font-family="{family}" font-size="{DESCRIPTION_FONT_PX}" fill="black">{text}</text>"#,
            y = width + DESCRIPTION_BASELINE,
            text = escape_xml(description),
        ));
    }

    markup.push_str("</svg>");
    markup
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
