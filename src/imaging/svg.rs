//! SVG markup for caption layers.
//!
//! Each [`TextLayer`] becomes a standalone SVG document covering the whole
//! canvas, so the backend can rasterize it at 1:1 and composite it at the
//! origin. One `<text>` element per wrapped line, horizontally centered with
//! `text-anchor="middle"`. The outline is painted first (`paint-order="stroke
//! fill"`) so it never eats into the glyph interiors.

use super::layout::TextLayer;
use super::params::CaptionStyle;
use std::fmt::Write;

/// Escape text content for embedding between XML tags.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted XML attribute.
pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// Render one caption layer as an SVG document of `width` x `height`.
pub fn render_layer_svg(layer: &TextLayer, width: u32, height: u32, style: &CaptionStyle) -> String {
    let mut svg = String::with_capacity(512 + layer.lines.iter().map(String::len).sum::<usize>());

    // `write!` into a String cannot fail.
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = width,
        h = height,
    );
    let _ = write!(
        svg,
        r#"<g font-family="{family}" font-weight="{weight}" font-size="{size}" letter-spacing="{spacing}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}" paint-order="stroke fill" text-anchor="middle">"#,
        family = escape_attr(&style.font_family),
        weight = style.font_weight,
        size = layer.font_size,
        spacing = style.letter_spacing,
        fill = escape_attr(&style.fill),
        stroke = escape_attr(&style.stroke),
        stroke_width = layer.stroke_width,
    );

    let x = width as f64 / 2.0;
    for (line, y) in layer.lines.iter().zip(&layer.baselines) {
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y:.2}">{}</text>"#,
            escape_text(line)
        );
    }

    svg.push_str("</g></svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::layout::LayerPosition;

    fn layer(lines: &[&str]) -> TextLayer {
        TextLayer {
            position: LayerPosition::Top,
            lines: lines.iter().map(|s| s.to_string()).collect(),
            font_size: 61,
            stroke_width: 6,
            baselines: (0..lines.len()).map(|i| 79.3 + 67.1 * i as f32).collect(),
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_text("A & B <C>"), "A &amp; B &lt;C&gt;");
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn escape_leaves_quotes_in_text_content() {
        assert_eq!(escape_text("IT'S \"FINE\""), "IT'S \"FINE\"");
    }

    #[test]
    fn document_covers_canvas() {
        let svg = render_layer_svg(&layer(&["HI"]), 1024, 768, &CaptionStyle::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"width="1024" height="768" viewBox="0 0 1024 768""#));
        assert!(svg.ends_with("</g></svg>"));
    }

    #[test]
    fn one_text_element_per_line_centered() {
        let svg = render_layer_svg(&layer(&["ONE", "TWO"]), 1024, 768, &CaptionStyle::default());
        assert_eq!(svg.matches("<text ").count(), 2);
        assert!(svg.contains(r#"<text x="512" y="79.30">ONE</text>"#));
        assert!(svg.contains(r#"text-anchor="middle""#));
    }

    #[test]
    fn paint_settings_follow_style() {
        let svg = render_layer_svg(&layer(&["X"]), 100, 100, &CaptionStyle::default());
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r##"stroke="#000000""##));
        assert!(svg.contains(r#"stroke-width="6""#));
        assert!(svg.contains(r#"paint-order="stroke fill""#));
        assert!(svg.contains(r#"font-weight="900""#));
        assert!(svg.contains(r#"font-family="Impact, 'Arial Black', sans-serif""#));
    }

    #[test]
    fn caption_text_is_escaped() {
        let svg = render_layer_svg(&layer(&["TOM & JERRY <3"]), 100, 100, &CaptionStyle::default());
        assert!(svg.contains(">TOM &amp; JERRY &lt;3</text>"));
    }
}
