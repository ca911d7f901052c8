use super::html::{ColumnItem, Content, FlowItem, Heading, SlideSource};

pub const EMU_PER_INCH: f64 = 914_400.0;
pub const EMU_PER_POINT: i64 = 12_700;

pub const SLIDE_WIDTH: i64 = 12_191_695;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

pub const TEXT_COLOR: &str = "475569";
pub const HEADING_COLOR: &str = "0f172a";
pub const SUBHEADING_COLOR: &str = "334155";
pub const RULE_COLOR: &str = "e2e8f0";
pub const FONT_FACE: &str = "Arial";

/// Inches to EMU, truncated.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH) as i64
}

fn margin_x() -> i64 {
    inches(0.83)
}

fn margin_y() -> i64 {
    inches(0.625)
}

fn content_width() -> i64 {
    SLIDE_WIDTH - margin_x() * 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    TextBox,
    Rect,
    RoundRect,
    Ellipse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub color: String,
    pub width: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub size_pt: u32,
    pub bold: bool,
    pub color: String,
    pub align: Align,
    pub space_after_pt: Option<u32>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, size_pt: u32) -> Self {
        Self {
            text: text.into(),
            size_pt,
            bold: false,
            color: TEXT_COLOR.to_string(),
            align: Align::Left,
            space_after_pt: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn space_after(mut self, pt: u32) -> Self {
        self.space_after_pt = Some(pt);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub geometry: Geometry,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    pub fill: Option<String>,
    pub line: Option<Line>,
    /// Left and top text insets; `None` keeps the renderer default.
    pub insets: Option<(i64, i64)>,
    pub paragraphs: Vec<Paragraph>,
}

impl Shape {
    fn new(geometry: Geometry, x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self {
            geometry,
            x,
            y,
            cx,
            cy,
            fill: None,
            line: None,
            insets: None,
            paragraphs: Vec::new(),
        }
    }

    fn text_box(x: i64, y: i64, cx: i64, cy: i64, paragraph: Paragraph) -> Self {
        let mut shape = Self::new(Geometry::TextBox, x, y, cx, cy);
        shape.paragraphs.push(paragraph);
        shape
    }

    fn fill(mut self, color: &str) -> Self {
        self.fill = Some(color.to_string());
        self
    }

    fn line(mut self, color: &str, width: Option<i64>) -> Self {
        self.line = Some(Line {
            color: color.to_string(),
            width,
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideLayout {
    pub shapes: Vec<Shape>,
}

/// Positions one slide. The footer reads `"<footer_label> | <date>"` when the
/// source slide has a footer.
pub fn layout_slide(slide: &SlideSource, footer_label: &str) -> SlideLayout {
    let mut shapes = Vec::new();
    let mx = margin_x();
    let width = content_width();
    let mut y = margin_y();

    match &slide.heading {
        Heading::Title { tag, title, subtitle } => {
            if let Some(tag) = tag {
                shapes.push(Shape::text_box(
                    mx,
                    y,
                    width,
                    inches(0.5),
                    Paragraph::new(tag, 14).bold().color("4338ca"),
                ));
                y += inches(0.5);
            }
            shapes.push(Shape::text_box(
                mx,
                y,
                width,
                inches(1.5),
                Paragraph::new(title, 72).bold().color(HEADING_COLOR),
            ));
            y += inches(1.5);
            if let Some(subtitle) = subtitle {
                shapes.push(Shape::text_box(
                    mx,
                    y,
                    width,
                    inches(1.0),
                    Paragraph::new(subtitle, 32).color("64748b"),
                ));
                y += inches(1.2);
            }
        }
        Heading::Titled(title) => {
            shapes.push(Shape::text_box(
                mx,
                y,
                width,
                inches(0.8),
                Paragraph::new(title, 42).bold().color(HEADING_COLOR),
            ));
            shapes.push(Shape::new(Geometry::Rect, mx, y + inches(0.8), width, inches(0.02)).fill(RULE_COLOR));
            y += inches(1.2);
        }
        Heading::Centered { heading, body } => {
            let center_y = SLIDE_HEIGHT / 2 - inches(1.0);
            shapes.push(Shape::text_box(
                mx,
                center_y,
                width,
                inches(1.5),
                Paragraph::new(heading, 80)
                    .bold()
                    .color(HEADING_COLOR)
                    .align(Align::Center),
            ));
            if let Some(body) = body {
                shapes.push(Shape::text_box(
                    mx,
                    center_y + inches(1.5),
                    width,
                    inches(1.0),
                    Paragraph::new(body, 28).align(Align::Center),
                ));
            }
            return SlideLayout { shapes };
        }
        Heading::None => {}
    }

    match &slide.content {
        Content::TwoColumn { left, right } => {
            let col_w = (width - inches(0.5)) / 2;
            for item in left {
                match item {
                    ColumnItem::Heading(text) => {
                        shapes.push(Shape::text_box(
                            mx,
                            y,
                            col_w,
                            inches(0.5),
                            Paragraph::new(text, 32).bold().color(SUBHEADING_COLOR),
                        ));
                        y += inches(0.6);
                    }
                    ColumnItem::Paragraph(text) => {
                        shapes.push(Shape::text_box(mx, y, col_w, inches(0.5), Paragraph::new(text, 20)));
                        y += inches(0.6);
                    }
                    ColumnItem::Callout(text) => {
                        let mut callout = Shape::new(Geometry::RoundRect, mx, y, col_w, inches(1.5))
                            .fill("ffffff")
                            .line("ef4444", Some(4 * EMU_PER_POINT));
                        callout.paragraphs.push(Paragraph::new(text, 18).color("333333"));
                        shapes.push(callout);
                    }
                }
            }
            if !right.is_empty() {
                let mut list = Shape::new(
                    Geometry::TextBox,
                    mx + col_w + inches(0.5),
                    margin_y() + inches(1.2),
                    col_w,
                    inches(4.0),
                );
                list.paragraphs = right
                    .iter()
                    .map(|li| Paragraph::new(li, 22).space_after(14))
                    .collect();
                shapes.push(list);
            }
        }
        Content::Tiles(tiles) => {
            let columns = if tiles.len() == 2 { 2 } else { 3 };
            let tile_w = (width - inches(0.5)) / columns;
            for (idx, tile) in tiles.iter().enumerate() {
                let x = mx + (tile_w + inches(0.2)) * idx as i64;
                let mut shape = Shape::new(Geometry::RoundRect, x, y, tile_w, inches(2.5))
                    .fill("f8fafc")
                    .line(RULE_COLOR, None);
                shape.insets = Some((inches(0.2), inches(0.2)));
                if let Some(title) = &tile.title {
                    shape
                        .paragraphs
                        .push(Paragraph::new(title, 20).bold().color(SUBHEADING_COLOR));
                }
                shape
                    .paragraphs
                    .extend(tile.bullets.iter().map(|li| Paragraph::new(li, 16)));
                shape
                    .paragraphs
                    .extend(tile.paragraphs.iter().map(|p| Paragraph::new(p, 16)));
                shapes.push(shape);
            }
        }
        Content::Timeline(items) => {
            for item in items {
                shapes.push(Shape::text_box(
                    mx + inches(1.0),
                    y,
                    width - inches(1.0),
                    inches(0.5),
                    Paragraph::new(&item.title, 24).bold(),
                ));
                shapes.push(Shape::text_box(
                    mx + inches(1.0),
                    y + inches(0.4),
                    width - inches(1.0),
                    inches(0.5),
                    Paragraph::new(&item.body, 20),
                ));
                shapes.push(
                    Shape::new(Geometry::Ellipse, mx, y + inches(0.1), inches(0.3), inches(0.3))
                        .fill("ffffff")
                        .line("4f46e5", Some(4 * EMU_PER_POINT)),
                );
                y += inches(1.2);
            }
        }
        Content::Flow(items) => {
            for item in items {
                let (paragraph, advance) = match item {
                    FlowItem::Heading(text) => {
                        (Paragraph::new(text, 24).bold().color(SUBHEADING_COLOR), 0.6)
                    }
                    FlowItem::Paragraph(text) => (Paragraph::new(text, 20), 0.6),
                    FlowItem::Bullet(text) => (Paragraph::new(format!("\u{2022} {text}"), 20), 0.5),
                };
                shapes.push(Shape::text_box(mx, y, width, inches(0.5), paragraph));
                y += inches(advance);
            }
        }
        Content::None => {}
    }

    if let Some(date) = &slide.footer {
        shapes.push(Shape::text_box(
            mx,
            SLIDE_HEIGHT - inches(0.5),
            width,
            inches(0.3),
            Paragraph::new(format!("{footer_label} | {date}"), 12)
                .color("94a3b8")
                .align(Align::Right),
        ));
    }

    SlideLayout { shapes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::html::{Tile, TimelineItem};

    fn titled(content: Content) -> SlideSource {
        SlideSource {
            heading: Heading::Titled("Title".into()),
            content,
            footer: None,
        }
    }

    #[test]
    fn page_constants_match_sixteen_by_nine() {
        assert_eq!(inches(13.333), SLIDE_WIDTH);
        assert_eq!(inches(7.5), SLIDE_HEIGHT);
    }

    #[test]
    fn titled_slide_gets_a_rule_under_the_title() {
        let layout = layout_slide(&titled(Content::None), "Deck");
        assert_eq!(layout.shapes.len(), 2);
        assert_eq!(layout.shapes[0].paragraphs[0].size_pt, 42);
        let rule = &layout.shapes[1];
        assert_eq!(rule.geometry, Geometry::Rect);
        assert_eq!(rule.cy, inches(0.02));
        assert_eq!(rule.fill.as_deref(), Some(RULE_COLOR));
        assert!(rule.line.is_none());
    }

    #[test]
    fn tiles_split_the_width_in_two_or_three() {
        let tile = Tile { title: Some("T".into()), ..Tile::default() };
        let three = layout_slide(&titled(Content::Tiles(vec![tile.clone(); 3])), "Deck");
        let two = layout_slide(&titled(Content::Tiles(vec![tile; 2])), "Deck");
        let w = content_width() - inches(0.5);
        assert_eq!(three.shapes[2].cx, w / 3);
        assert_eq!(two.shapes[2].cx, w / 2);
        assert_eq!(two.shapes[3].x, margin_x() + w / 2 + inches(0.2));
        assert_eq!(two.shapes[2].cy, inches(2.5));
        assert_eq!(two.shapes[2].fill.as_deref(), Some("f8fafc"));
    }

    #[test]
    fn timeline_dots_and_spacing() {
        let item = TimelineItem { title: "Phase".into(), body: "Body".into() };
        let layout = layout_slide(&titled(Content::Timeline(vec![item.clone(), item])), "Deck");
        let dots: Vec<&Shape> = layout
            .shapes
            .iter()
            .filter(|s| s.geometry == Geometry::Ellipse)
            .collect();
        assert_eq!(dots.len(), 2);
        assert_eq!(dots[0].cx, inches(0.3));
        assert_eq!(dots[1].y - dots[0].y, inches(1.2));
        assert_eq!(
            dots[0].line,
            Some(Line { color: "4f46e5".into(), width: Some(4 * EMU_PER_POINT) })
        );
    }

    #[test]
    fn footer_is_right_aligned_with_label() {
        let slide = SlideSource {
            heading: Heading::Title { tag: None, title: "Doable".into(), subtitle: None },
            content: Content::None,
            footer: Some("December 30, 2025".into()),
        };
        let layout = layout_slide(&slide, "Doable Presentation");
        let footer = layout.shapes.last().unwrap();
        assert_eq!(footer.paragraphs[0].text, "Doable Presentation | December 30, 2025");
        assert_eq!(footer.paragraphs[0].size_pt, 12);
        assert_eq!(footer.paragraphs[0].align, Align::Right);
        assert_eq!(footer.paragraphs[0].color, "94a3b8");
    }

    #[test]
    fn centered_slide_ignores_footer() {
        let slide = SlideSource {
            heading: Heading::Centered { heading: "Make It Doable.".into(), body: Some("Go".into()) },
            content: Content::None,
            footer: Some("today".into()),
        };
        let layout = layout_slide(&slide, "Deck");
        assert_eq!(layout.shapes.len(), 2);
        assert_eq!(layout.shapes[0].y, SLIDE_HEIGHT / 2 - inches(1.0));
        assert_eq!(layout.shapes[1].paragraphs[0].align, Align::Center);
        assert_eq!(layout.shapes[1].paragraphs[0].color, TEXT_COLOR);
    }
}
