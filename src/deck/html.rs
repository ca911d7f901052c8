use scraper::{ElementRef, Html, Node, Selector};

use super::DeckError;

/// How a slide introduces itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Heading {
    /// Cover slide: an `h1` with an optional tag line and subtitle.
    Title {
        tag: Option<String>,
        title: String,
        subtitle: Option<String>,
    },
    /// `h2.slide-title` above a content area.
    Titled(String),
    /// Any other `h2`, centred with the first paragraph under it.
    Centered { heading: String, body: Option<String> },
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnItem {
    Heading(String),
    Paragraph(String),
    Callout(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    pub title: Option<String>,
    pub bullets: Vec<String>,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineItem {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowItem {
    Heading(String),
    Paragraph(String),
    Bullet(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    TwoColumn {
        left: Vec<ColumnItem>,
        right: Vec<String>,
    },
    Tiles(Vec<Tile>),
    Timeline(Vec<TimelineItem>),
    Flow(Vec<FlowItem>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideSource {
    pub heading: Heading,
    pub content: Content,
    pub footer: Option<String>,
}

struct Selectors {
    slide: Selector,
    h1: Selector,
    h2: Selector,
    slide_title: Selector,
    tag: Selector,
    subtitle: Selector,
    p: Selector,
    h3: Selector,
    li: Selector,
    ul: Selector,
    content_area: Selector,
    two_column: Selector,
    tiled: Selector,
    tile: Selector,
    timeline: Selector,
    timeline_item: Selector,
    flow: Selector,
    footer: Selector,
}

impl Selectors {
    fn new() -> Result<Self, DeckError> {
        Ok(Self {
            slide: selector("div.slide-container")?,
            h1: selector("h1")?,
            h2: selector("h2")?,
            slide_title: selector("h2.slide-title")?,
            tag: selector("span.tag")?,
            subtitle: selector("p.subtitle")?,
            p: selector("p")?,
            h3: selector("h3")?,
            li: selector("li")?,
            ul: selector("ul")?,
            content_area: selector("div.content-area")?,
            two_column: selector("div.two-column")?,
            tiled: selector("div.tiled-content")?,
            tile: selector("div.tile")?,
            timeline: selector("div.timeline-container")?,
            timeline_item: selector("div.timeline-item")?,
            flow: selector("h3, p, li")?,
            footer: selector("div.slide-footer")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, DeckError> {
    Selector::parse(css).map_err(|_| DeckError::Selector(css.to_string()))
}

/// Reads every `div.slide-container` in document order.
pub fn parse_deck(html: &str) -> Result<Vec<SlideSource>, DeckError> {
    let sel = Selectors::new()?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&sel.slide)
        .map(|slide| parse_slide(&sel, slide))
        .collect())
}

fn parse_slide(sel: &Selectors, slide: ElementRef<'_>) -> SlideSource {
    let heading = parse_heading(sel, slide);
    let content = match heading {
        // Cover and centred slides carry no body beyond their heading.
        Heading::Title { .. } | Heading::Centered { .. } => Content::None,
        _ => slide
            .select(&sel.content_area)
            .next()
            .map(|area| parse_content(sel, area))
            .unwrap_or(Content::None),
    };
    let footer = slide
        .select(&sel.footer)
        .next()
        .and_then(|footer| footer.select(&sel.p).last())
        .map(element_text)
        .filter(|t| !t.is_empty());
    SlideSource {
        heading,
        content,
        footer,
    }
}

fn parse_heading(sel: &Selectors, slide: ElementRef<'_>) -> Heading {
    if let Some(h1) = slide.select(&sel.h1).next() {
        return Heading::Title {
            tag: first_text(slide, &sel.tag),
            title: element_text(h1),
            subtitle: first_text(slide, &sel.subtitle),
        };
    }
    if let Some(title) = slide.select(&sel.slide_title).next() {
        return Heading::Titled(element_text(title));
    }
    if let Some(h2) = slide.select(&sel.h2).next() {
        return Heading::Centered {
            heading: element_text(h2),
            body: first_text(slide, &sel.p),
        };
    }
    Heading::None
}

fn parse_content(sel: &Selectors, area: ElementRef<'_>) -> Content {
    if let Some(columns) = area.select(&sel.two_column).next() {
        return parse_two_column(sel, columns);
    }
    if let Some(tiled) = area.select(&sel.tiled).next() {
        let tiles = tiled.select(&sel.tile).map(|tile| parse_tile(sel, tile)).collect();
        return Content::Tiles(tiles);
    }
    if let Some(timeline) = area.select(&sel.timeline).next() {
        let items = timeline
            .select(&sel.timeline_item)
            .filter_map(|item| {
                Some(TimelineItem {
                    title: first_text(item, &sel.h3)?,
                    body: first_text(item, &sel.p)?,
                })
            })
            .collect();
        return Content::Timeline(items);
    }

    let flow: Vec<FlowItem> = area
        .select(&sel.flow)
        .filter_map(|el| {
            let text = element_text(el);
            if text.is_empty() {
                return None;
            }
            Some(match el.value().name() {
                "h3" => FlowItem::Heading(text),
                "li" => FlowItem::Bullet(text),
                _ => FlowItem::Paragraph(text),
            })
        })
        .collect();
    if flow.is_empty() {
        Content::None
    } else {
        Content::Flow(flow)
    }
}

fn parse_two_column(sel: &Selectors, columns: ElementRef<'_>) -> Content {
    let mut cols = child_elements(columns).filter(|el| el.value().name() == "div");
    let left = cols
        .next()
        .map(|col| {
            child_elements(col)
                .filter_map(|child| match child.value().name() {
                    "h3" => Some(ColumnItem::Heading(element_text(child))),
                    "p" => Some(ColumnItem::Paragraph(element_text(child))),
                    "div" if has_class(child, "tile") => {
                        first_text(child, &sel.p).map(ColumnItem::Callout)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let right = cols
        .next()
        .map(|col| col.select(&sel.li).map(element_text).collect())
        .unwrap_or_default();
    Content::TwoColumn { left, right }
}

fn parse_tile(sel: &Selectors, tile: ElementRef<'_>) -> Tile {
    Tile {
        title: first_text(tile, &sel.h3),
        bullets: tile
            .select(&sel.ul)
            .next()
            .map(|ul| ul.select(&sel.li).map(element_text).collect())
            .unwrap_or_default(),
        paragraphs: tile.select(&sel.p).map(element_text).collect(),
    }
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Visible text with `<br>` as a line break and whitespace collapsed per line.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(e) if e.name() == "br" => raw.push('\n'),
            _ => {}
        }
    }
    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
