//! PDF export of a compliance plan.
//!
//! Layout: a blue header band with the product name, a "Parameter / Value"
//! profile table built from the visible answers, the plan text with markdown
//! emphasis stripped, and a disclaimer footer with "Page i of n" on every page.
//! Text uses the PDF base fonts (Helvetica, Helvetica-Bold) with WinAnsi
//! encoding, so no font files are embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use thiserror::Error;

use crate::plans::metrics::{measure, wrap, Font};
use crate::plans::request::display_value;
use crate::questionnaire::answers::AnswerSet;
use crate::questionnaire::navigation::QuestionGraph;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

// A4 in points. Vertical positions below are measured from the top edge and
// flipped when emitted.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_X: f32 = 40.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;
const TOP_MARGIN: f32 = 56.0;
const BODY_BOTTOM: f32 = 780.0;

const HEADER_HEIGHT: f32 = 113.0;
const BRAND_BLUE: [f32; 3] = [0.145, 0.388, 0.922];
const STRIPE_GRAY: [f32; 3] = [0.96, 0.96, 0.96];
const FOOTER_GRAY: [f32; 3] = [0.59, 0.59, 0.59];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];
const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

const BODY_SIZE: f32 = 10.0;
const BODY_LEADING: f32 = 14.0;
const TABLE_SIZE: f32 = 9.5;
const TABLE_LEADING: f32 = 12.0;
const TABLE_PADDING: f32 = 5.0;
const PARAM_COLUMN: f32 = 170.0;
const FOOTER_SIZE: f32 = 8.0;

const TITLE: &str = "ComplianceAlpha";
const SUBTITLE: &str = "Indian Freelancer Tax Compliance Roadmap";
const DISCLAIMER: &str = "This compliance plan is AI-generated based on information you provided. \
It is for informational purposes only and does not constitute professional tax advice. \
Please consult a Chartered Accountant before filing returns or making tax decisions.";

/// Renders `plan` and the profile summary of `answers` as PDF bytes.
///
/// CPU-bound; callers on the async runtime should go through `spawn_blocking`.
pub fn render_plan_pdf(
    graph: &QuestionGraph,
    plan: &str,
    answers: &AnswerSet,
) -> Result<Vec<u8>, ExportError> {
    let mut canvas = Canvas::new();

    canvas.fill_rect(0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, BRAND_BLUE);
    canvas.text(MARGIN_X, 57.0, Font::HelveticaBold, 24.0, WHITE, TITLE);
    canvas.text(MARGIN_X, 80.0, Font::Helvetica, 12.0, WHITE, SUBTITLE);
    canvas.y = HEADER_HEIGHT + 30.0;

    canvas.heading("User Profile Summary", 14.0);
    canvas.y += 4.0;
    let pruned = graph.pruned(answers);
    let rows: Vec<(String, String)> = graph
        .visible(&pruned)
        .map(|q| (q.label.to_string(), display_value(q, &pruned)))
        .collect();
    canvas.profile_table(&rows);

    canvas.y += 24.0;
    canvas.heading("Your Compliance Plan", 14.0);
    canvas.y += 4.0;
    for line in plan.lines() {
        canvas.plan_line(line);
    }

    canvas.finish()
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas: page-breaking operation buffer
// ────────────────────────────────────────────────────────────────────────────

struct Canvas {
    pages: Vec<Vec<Operation>>,
    /// Cursor, distance from the top edge of the current page.
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: TOP_MARGIN,
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = TOP_MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > BODY_BOTTOM {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, top: f32, font: Font, size: f32, color: [f32; 3], text: &str) {
        push_text(self.ops(), x, top, font, size, color, text);
    }

    fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: [f32; 3]) {
        let [r, g, b] = color;
        let ops = self.ops();
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new(
            "re",
            vec![
                x.into(),
                (PAGE_HEIGHT - top - height).into(),
                width.into(),
                height.into(),
            ],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    fn heading(&mut self, text: &str, size: f32) {
        let text = normalize(text);
        let lines = wrap(&text, Font::HelveticaBold, size, CONTENT_WIDTH);
        let leading = size * 1.3;
        for line in lines {
            self.ensure_room(leading);
            self.y += size;
            self.text(MARGIN_X, self.y, Font::HelveticaBold, size, BLACK, &line);
            self.y += leading - size;
        }
    }

    fn profile_table(&mut self, rows: &[(String, String)]) {
        let value_width = CONTENT_WIDTH - PARAM_COLUMN;
        let header_height = TABLE_LEADING + 2.0 * TABLE_PADDING;

        self.ensure_room(header_height);
        let top = self.y;
        self.fill_rect(MARGIN_X, top, CONTENT_WIDTH, header_height, BRAND_BLUE);
        let baseline = top + TABLE_PADDING + TABLE_SIZE;
        self.text(MARGIN_X + TABLE_PADDING, baseline, Font::HelveticaBold, TABLE_SIZE, WHITE, "Parameter");
        self.text(MARGIN_X + PARAM_COLUMN + TABLE_PADDING, baseline, Font::HelveticaBold, TABLE_SIZE, WHITE, "Value");
        self.y += header_height;

        for (index, (param, value)) in rows.iter().enumerate() {
            let param_lines = wrap(&normalize(param), Font::HelveticaBold, TABLE_SIZE, PARAM_COLUMN - 2.0 * TABLE_PADDING);
            let value_lines = wrap(&normalize(value), Font::Helvetica, TABLE_SIZE, value_width - 2.0 * TABLE_PADDING);
            let line_count = param_lines.len().max(value_lines.len()).max(1);
            let height = line_count as f32 * TABLE_LEADING + 2.0 * TABLE_PADDING;

            self.ensure_room(height);
            let top = self.y;
            if index % 2 == 1 {
                self.fill_rect(MARGIN_X, top, CONTENT_WIDTH, height, STRIPE_GRAY);
            }
            for (i, line) in param_lines.iter().enumerate() {
                let baseline = top + TABLE_PADDING + TABLE_SIZE + i as f32 * TABLE_LEADING;
                self.text(MARGIN_X + TABLE_PADDING, baseline, Font::HelveticaBold, TABLE_SIZE, BLACK, line);
            }
            for (i, line) in value_lines.iter().enumerate() {
                let baseline = top + TABLE_PADDING + TABLE_SIZE + i as f32 * TABLE_LEADING;
                self.text(MARGIN_X + PARAM_COLUMN + TABLE_PADDING, baseline, Font::Helvetica, TABLE_SIZE, BLACK, line);
            }
            self.y += height;
        }
    }

    fn plan_line(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.y += BODY_LEADING / 2.0;
            return;
        }
        if trimmed.chars().all(|c| c == '-' || c == '*' || c == '_') && trimmed.len() >= 3 {
            self.y += BODY_LEADING / 2.0;
            return;
        }

        let cleaned = normalize(&strip_emphasis(trimmed));
        if trimmed.starts_with('#') {
            let title = cleaned.trim_start_matches('#').trim();
            self.y += 4.0;
            self.heading(title, 11.5);
            return;
        }

        let (prefix, body) = match bullet_body(&cleaned) {
            Some(body) => ("\u{2022} ", body),
            None => ("", cleaned.as_str()),
        };
        let indent = measure(prefix, Font::Helvetica, BODY_SIZE);
        let lines = wrap(body, Font::Helvetica, BODY_SIZE, CONTENT_WIDTH - indent);
        for (i, line) in lines.iter().enumerate() {
            self.ensure_room(BODY_LEADING);
            self.y += BODY_LEADING;
            if i == 0 && !prefix.is_empty() {
                self.text(MARGIN_X, self.y, Font::Helvetica, BODY_SIZE, BLACK, prefix);
            }
            self.text(MARGIN_X + indent, self.y, Font::Helvetica, BODY_SIZE, BLACK, line);
        }
    }

    /// Stamps the footer on every page and serializes the document.
    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let total = self.pages.len();
        let disclaimer = wrap(DISCLAIMER, Font::Helvetica, FOOTER_SIZE, CONTENT_WIDTH);
        for (index, ops) in self.pages.iter_mut().enumerate() {
            let mut top = 798.0;
            for line in &disclaimer {
                push_text(ops, MARGIN_X, top, Font::Helvetica, FOOTER_SIZE, FOOTER_GRAY, line);
                top += FOOTER_SIZE + 2.0;
            }
            let label = format!("Page {} of {}", index + 1, total);
            let x = PAGE_WIDTH - MARGIN_X - measure(&label, Font::Helvetica, FOOTER_SIZE);
            push_text(ops, x, top + 4.0, Font::Helvetica, FOOTER_SIZE, FOOTER_GRAY, &label);
        }
        write_document(self.pages)
    }
}

/// `top` is the baseline's distance from the top edge.
fn push_text(
    ops: &mut Vec<Operation>,
    x: f32,
    top: f32,
    font: Font,
    size: f32,
    color: [f32; 3],
    text: &str,
) {
    let [r, g, b] = color;
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![font.resource_name().into(), size.into()],
    ));
    ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
    ops.push(Operation::new(
        "Td",
        vec![x.into(), (PAGE_HEIGHT - top).into()],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(encode_win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn write_document(pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(Font::Helvetica));
    let bold_id = doc.add_object(font_dictionary(Font::HelveticaBold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Helvetica.resource_name() => regular_id,
            Font::HelveticaBold.resource_name() => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn font_dictionary(font: Font) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text cleanup
// ────────────────────────────────────────────────────────────────────────────

fn strip_emphasis(line: &str) -> String {
    line.replace("**", "").replace("__", "").replace('`', "")
}

fn bullet_body(line: &str) -> Option<&str> {
    ["- ", "* ", "\u{2022} "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim_start)
}

/// Replaces characters the base fonts cannot show with close equivalents.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20B9}' => out.push_str("Rs."),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push(c),
            '\t' => out.push(' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0xFF => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            c if (c as u32) <= 0xFF => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::complete_answers;

    fn render(plan: &str) -> Vec<u8> {
        render_plan_pdf(&QuestionGraph::canonical(), plan, &complete_answers()).unwrap()
    }

    #[test]
    fn test_short_plan_is_single_page_pdf() {
        let bytes = render("## 1. Registration\n\n- **File** LUT before the first invoice.\n");
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_long_plan_breaks_pages() {
        let paragraph = "Maintain separate books for foreign receipts and reconcile FIRCs every quarter. ";
        let plan: String = (0..120).map(|i| format!("## Section {i}\n{}\n\n", paragraph.repeat(3))).collect();
        let doc = Document::load_mem(&render(&plan)).unwrap();
        assert!(doc.get_pages().len() > 3);
    }

    #[test]
    fn test_empty_answers_still_render() {
        let bytes = render_plan_pdf(&QuestionGraph::canonical(), "", &AnswerSet::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_normalize_maps_rupee_and_dashes() {
        assert_eq!(normalize("₹20 Lakhs – ₹50 Lakhs"), "Rs.20 Lakhs - Rs.50 Lakhs");
        assert_eq!(normalize("“W-8BEN” … ✓"), "\"W-8BEN\" ... ?");
        assert_eq!(encode_win_ansi("\u{2022} café"), vec![0x95, b' ', b'c', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_markdown_cleanup() {
        assert_eq!(strip_emphasis("**Due:** `31 July`"), "Due: 31 July");
        assert_eq!(bullet_body("- file GSTR-1"), Some("file GSTR-1"));
        assert_eq!(bullet_body("plain"), None);
    }
}
