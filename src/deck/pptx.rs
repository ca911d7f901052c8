use std::fmt::Write as _;
use std::io::{Seek, Write};

use quick_xml::escape::escape;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::layout::{Align, Geometry, Paragraph, Shape, SlideLayout, FONT_FACE, SLIDE_HEIGHT, SLIDE_WIDTH};
use super::DeckError;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument.presentationml";
const XML_DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// Writes `slides` as a PresentationML package and returns the writer.
pub fn write_pptx<W: Write + Seek>(writer: W, slides: &[SlideLayout]) -> Result<W, DeckError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types(slides.len())),
        ("_rels/.rels".into(), package_rels()),
        ("docProps/core.xml".into(), core_props()),
        ("docProps/app.xml".into(), app_props(slides.len())),
        ("ppt/presentation.xml".into(), presentation(slides.len())),
        ("ppt/_rels/presentation.xml.rels".into(), presentation_rels(slides.len())),
        ("ppt/presProps.xml".into(), pres_props()),
        ("ppt/slideMasters/slideMaster1.xml".into(), slide_master()),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "theme", "../theme/theme1.xml"),
            ]),
        ),
        ("ppt/slideLayouts/slideLayout1.xml".into(), slide_layout()),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
            rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        ),
        ("ppt/theme/theme1.xml".into(), theme()),
    ];
    for (idx, slide) in slides.iter().enumerate() {
        let n = idx + 1;
        parts.push((format!("ppt/slides/slide{n}.xml"), slide_xml(slide)));
        parts.push((
            format!("ppt/slides/_rels/slide{n}.xml.rels"),
            rels(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        ));
    }

    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }
    Ok(zip.finish()?)
}

fn content_types(slide_count: usize) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>",
    );
    let overrides = [
        ("/ppt/presentation.xml", format!("{CT_BASE}.presentation.main+xml")),
        ("/ppt/presProps.xml", format!("{CT_BASE}.presProps+xml")),
        ("/ppt/slideMasters/slideMaster1.xml", format!("{CT_BASE}.slideMaster+xml")),
        ("/ppt/slideLayouts/slideLayout1.xml", format!("{CT_BASE}.slideLayout+xml")),
        ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml".to_string()),
        ("/docProps/app.xml", "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string()),
    ];
    for (part, ct) in overrides {
        let _ = write!(xml, "<Override PartName=\"{part}\" ContentType=\"{ct}\"/>");
    }
    for n in 1..=slide_count {
        let _ = write!(
            xml,
            "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"{CT_BASE}.slide+xml\"/>"
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    let _ = write!(
        xml,
        "<Relationship Id=\"rId1\" Type=\"{REL_BASE}/officeDocument\" Target=\"ppt/presentation.xml\"/>\
         <Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
         <Relationship Id=\"rId3\" Type=\"{REL_BASE}/extended-properties\" Target=\"docProps/app.xml\"/>"
    );
    xml.push_str("</Relationships>");
    xml
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str("<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">");
    for (id, kind, target) in entries {
        let _ = write!(
            xml,
            "<Relationship Id=\"{id}\" Type=\"{REL_BASE}/{kind}\" Target=\"{target}\"/>"
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_props() -> String {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "{XML_DECL}<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:title>Doable Presentation</dc:title>\
         <dc:creator>generate_deck</dc:creator>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:created>\
         <dcterms:modified xsi:type=\"dcterms:W3CDTF\">{now}</dcterms:modified>\
         </cp:coreProperties>"
    )
}

fn app_props(slide_count: usize) -> String {
    format!(
        "{XML_DECL}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
         <Application>doable_agent_server</Application><Slides>{slide_count}</Slides>\
         <PresentationFormat>Custom</PresentationFormat></Properties>"
    )
}

fn presentation(slide_count: usize) -> String {
    let mut ids = String::new();
    for n in 1..=slide_count {
        // rId1 is the master, slides follow.
        let _ = write!(ids, "<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 255 + n, n + 1);
    }
    format!(
        "{XML_DECL}<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" saveSubsetFonts=\"1\">\
         <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
         <p:sldIdLst>{ids}</p:sldIdLst>\
         <p:sldSz cx=\"{SLIDE_WIDTH}\" cy=\"{SLIDE_HEIGHT}\"/>\
         <p:notesSz cx=\"6858000\" cy=\"9144000\"/>\
         </p:presentation>"
    )
}

fn presentation_rels(slide_count: usize) -> String {
    let slide_targets: Vec<(String, String)> = (1..=slide_count)
        .map(|n| (format!("rId{}", n + 1), format!("slides/slide{n}.xml")))
        .collect();
    let pres_id = format!("rId{}", slide_count + 2);
    let theme_id = format!("rId{}", slide_count + 3);
    let mut entries: Vec<(&str, &str, &str)> =
        vec![("rId1", "slideMaster", "slideMasters/slideMaster1.xml")];
    entries.extend(
        slide_targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
    );
    entries.push((pres_id.as_str(), "presProps", "presProps.xml"));
    entries.push((theme_id.as_str(), "theme", "theme/theme1.xml"));
    rels(&entries)
}

fn pres_props() -> String {
    format!("{XML_DECL}<p:presentationPr xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\"/>")
}

const EMPTY_TREE: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
     <p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/>\
     <a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

fn slide_master() -> String {
    format!(
        "{XML_DECL}<p:sldMaster xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>\
         <p:spTree>{EMPTY_TREE}</p:spTree></p:cSld>\
         <p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" \
         accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
         <p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst>\
         </p:sldMaster>"
    )
}

fn slide_layout() -> String {
    format!(
        "{XML_DECL}<p:sldLayout xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" type=\"blank\" preserve=\"1\">\
         <p:cSld name=\"Blank\"><p:spTree>{EMPTY_TREE}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

fn theme() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "0F172A"),
        ("lt2", "F1F5F9"),
        ("accent1", "4F46E5"),
        ("accent2", "7C3AED"),
        ("accent3", "EF4444"),
        ("accent4", "F59E0B"),
        ("accent5", "10B981"),
        ("accent6", "64748B"),
        ("hlink", "4338CA"),
        ("folHlink", "7C3AED"),
    ];
    let mut scheme = String::new();
    for (name, value) in colors {
        let _ = write!(scheme, "<a:{name}><a:srgbClr val=\"{value}\"/></a:{name}>");
    }
    let solid = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";
    let line = format!("<a:ln w=\"9525\">{solid}</a:ln>");
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        "{XML_DECL}<a:theme xmlns:a=\"{NS_A}\" name=\"Doable\"><a:themeElements>\
         <a:clrScheme name=\"Doable\">{scheme}</a:clrScheme>\
         <a:fontScheme name=\"Doable\">\
         <a:majorFont><a:latin typeface=\"{FONT_FACE}\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
         <a:minorFont><a:latin typeface=\"{FONT_FACE}\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
         </a:fontScheme>\
         <a:fmtScheme name=\"Doable\">\
         <a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst>\
         <a:lnStyleLst>{line}{line}{line}</a:lnStyleLst>\
         <a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>\
         <a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst>\
         </a:fmtScheme></a:themeElements></a:theme>"
    )
}

fn slide_xml(slide: &SlideLayout) -> String {
    let mut shapes = String::new();
    for (idx, shape) in slide.shapes.iter().enumerate() {
        // id 1 belongs to the group root.
        shape_xml(&mut shapes, idx + 2, shape);
    }
    format!(
        "{XML_DECL}<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
         <p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"FFFFFF\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>\
         <p:spTree>{EMPTY_TREE}{shapes}</p:spTree></p:cSld>\
         <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
    )
}

fn shape_xml(out: &mut String, id: usize, shape: &Shape) {
    let (name, preset, text_box) = match shape.geometry {
        Geometry::TextBox => ("TextBox", "rect", true),
        Geometry::Rect => ("Rectangle", "rect", false),
        Geometry::RoundRect => ("Rounded Rectangle", "roundRect", false),
        Geometry::Ellipse => ("Oval", "ellipse", false),
    };
    let _ = write!(
        out,
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{name} {id}\"/><p:cNvSpPr{}/><p:nvPr/></p:nvSpPr>",
        if text_box { " txBox=\"1\"" } else { "" }
    );
    let _ = write!(
        out,
        "<p:spPr><a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>\
         <a:prstGeom prst=\"{preset}\"><a:avLst/></a:prstGeom>",
        shape.x, shape.y, shape.cx, shape.cy
    );
    match &shape.fill {
        Some(color) => solid_fill(out, color),
        None => out.push_str("<a:noFill/>"),
    }
    match &shape.line {
        Some(line) => {
            match line.width {
                Some(w) => {
                    let _ = write!(out, "<a:ln w=\"{w}\">");
                }
                None => out.push_str("<a:ln>"),
            }
            solid_fill(out, &line.color);
            out.push_str("</a:ln>");
        }
        None => out.push_str("<a:ln><a:noFill/></a:ln>"),
    }
    out.push_str("</p:spPr>");

    let anchor = if text_box { "t" } else { "ctr" };
    out.push_str("<p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"");
    if let Some((left, top)) = shape.insets {
        let _ = write!(out, " lIns=\"{left}\" tIns=\"{top}\"");
    }
    let _ = write!(out, " anchor=\"{anchor}\"/><a:lstStyle/>");
    if shape.paragraphs.is_empty() {
        out.push_str("<a:p><a:endParaRPr lang=\"en-US\"/></a:p>");
    }
    for paragraph in &shape.paragraphs {
        paragraph_xml(out, paragraph);
    }
    out.push_str("</p:txBody></p:sp>");
}

fn paragraph_xml(out: &mut String, p: &Paragraph) {
    out.push_str("<a:p>");
    let align = match p.align {
        Align::Left => None,
        Align::Center => Some("ctr"),
        Align::Right => Some("r"),
    };
    if align.is_some() || p.space_after_pt.is_some() {
        out.push_str("<a:pPr");
        if let Some(algn) = align {
            let _ = write!(out, " algn=\"{algn}\"");
        }
        out.push('>');
        if let Some(pt) = p.space_after_pt {
            let _ = write!(out, "<a:spcAft><a:spcPts val=\"{}\"/></a:spcAft>", pt * 100);
        }
        out.push_str("</a:pPr>");
    }

    let mut run_props = format!(
        "<a:rPr lang=\"en-US\" sz=\"{}\" b=\"{}\" dirty=\"0\">",
        p.size_pt * 100,
        if p.bold { 1 } else { 0 }
    );
    solid_fill(&mut run_props, &p.color);
    let _ = write!(run_props, "<a:latin typeface=\"{FONT_FACE}\"/></a:rPr>");

    for (idx, line) in p.text.split('\n').enumerate() {
        if idx > 0 {
            let _ = write!(out, "<a:br>{run_props}</a:br>");
        }
        let _ = write!(out, "<a:r>{run_props}<a:t>{}</a:t></a:r>", escape(line));
    }
    out.push_str("</a:p>");
}

fn solid_fill(out: &mut String, color: &str) {
    let _ = write!(
        out,
        "<a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>",
        color.trim_start_matches('#').to_uppercase()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::layout::{inches, Line};
    use std::io::{Cursor, Read};

    fn text_shape(text: &str) -> Shape {
        Shape {
            geometry: Geometry::TextBox,
            x: 0,
            y: 0,
            cx: inches(1.0),
            cy: inches(1.0),
            fill: None,
            line: None,
            insets: None,
            paragraphs: vec![Paragraph::new(text, 18)],
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn package_contains_every_part() {
        let slides = vec![SlideLayout::default(), SlideLayout::default()];
        let bytes = write_pptx(Cursor::new(Vec::new()), &slides).unwrap().into_inner();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/theme/theme1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide2.xml.rels",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide2.xml"));
        let pres = read_part(&bytes, "ppt/presentation.xml");
        assert!(pres.contains("<p:sldId id=\"257\" r:id=\"rId3\"/>"));
        assert!(pres.contains(&format!("cx=\"{SLIDE_WIDTH}\"")));
        let rels = read_part(&bytes, "ppt/_rels/presentation.xml.rels");
        assert!(rels.contains("Id=\"rId5\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme\""));
    }

    #[test]
    fn text_is_escaped_and_breaks_become_br() {
        let slide = SlideLayout {
            shapes: vec![text_shape("Tools & <tags>\nline two")],
        };
        let bytes = write_pptx(Cursor::new(Vec::new()), &[slide]).unwrap().into_inner();
        let xml = read_part(&bytes, "ppt/slides/slide1.xml");
        assert!(xml.contains("<a:t>Tools &amp; &lt;tags&gt;</a:t>"));
        assert!(xml.contains("<a:br>"));
        assert!(xml.contains("<a:t>line two</a:t>"));
        assert!(xml.contains("txBox=\"1\""));
        assert!(xml.contains("<a:srgbClr val=\"475569\"/>"));
    }

    #[test]
    fn outlines_and_alignment() {
        let mut dot = text_shape("");
        dot.geometry = Geometry::Ellipse;
        dot.fill = Some("ffffff".into());
        dot.line = Some(Line { color: "4f46e5".into(), width: Some(50_800) });
        dot.paragraphs = vec![Paragraph::new("right", 12).align(Align::Right).space_after(14)];
        let mut xml = String::new();
        shape_xml(&mut xml, 2, &dot);
        assert!(xml.contains("prst=\"ellipse\""));
        assert!(xml.contains("<a:ln w=\"50800\"><a:solidFill><a:srgbClr val=\"4F46E5\"/>"));
        assert!(xml.contains("<a:pPr algn=\"r\"><a:spcAft><a:spcPts val=\"1400\"/></a:spcAft></a:pPr>"));
    }
}
