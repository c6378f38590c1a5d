//! SVG rasterization backed by resvg

use crate::error::{Error, Result};
use crate::qr::VectorImage;
use image::RgbaImage;
use resvg::{tiny_skia, usvg};

/// Parse SVG markup into a render tree
pub(crate) fn parse(svg: &str, options: &usvg::Options<'_>) -> Result<usvg::Tree> {
    usvg::Tree::from_str(svg, options).map_err(|e| Error::RenderLoad(e.to_string()))
}

/// Allocate an empty (fully transparent) canvas
pub(crate) fn canvas(width: u32, height: u32) -> Result<tiny_skia::Pixmap> {
    tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::RenderLoad(format!("cannot allocate a {width}x{height} canvas")))
}

/// Draw `tree` scaled to fill the `size × size` square at the canvas origin
pub(crate) fn draw_scaled(tree: &usvg::Tree, size: u32, pixmap: &mut tiny_skia::Pixmap) {
    let natural = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        size as f32 / natural.width(),
        size as f32 / natural.height(),
    );
    resvg::render(tree, transform, &mut pixmap.as_mut());
}

/// Convert a premultiplied canvas into a straight-alpha RGBA image
pub(crate) fn to_rgba(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
    out
}

/// Rasterize a vector QR image at its display size
pub fn rasterize(image: &VectorImage) -> Result<RgbaImage> {
    let tree = parse(image.as_svg(), &usvg::Options::default())?;
    let mut pixmap = canvas(image.size(), image.size())?;
    draw_scaled(&tree, image.size(), &mut pixmap);
    Ok(to_rgba(&pixmap))
}
