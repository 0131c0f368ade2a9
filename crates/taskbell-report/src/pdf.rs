use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::debug;

use crate::layout::{Page, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::ReportError;

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn render_err<E: std::fmt::Debug>(e: E) -> ReportError {
    ReportError::Render(format!("{e:?}"))
}

/// Draw laid-out pages into a PDF using the built-in Helvetica faces.
pub fn render_pages(title: &str, pages: &[Page]) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        mm(PAGE_WIDTH_PT),
        mm(PAGE_HEIGHT_PT),
        "Page 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    for (i, page) in pages.iter().enumerate() {
        let (page_idx, layer_idx) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(
                mm(PAGE_WIDTH_PT),
                mm(PAGE_HEIGHT_PT),
                format!("Page {}", i + 1),
            )
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        for line in &page.lines {
            let font = if line.bold { &bold } else { &regular };
            layer.use_text(line.text.clone(), line.size, mm(line.x), mm(line.y), font);
        }
    }

    let bytes = doc.save_to_bytes().map_err(render_err)?;
    debug!(pages = pages.len(), bytes = bytes.len(), "rendered report pdf");
    Ok(bytes)
}
