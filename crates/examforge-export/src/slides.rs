//! Slide-deck export.
//!
//! [`build_deck`] lays the exam out as a sequence of slides of plain text
//! blocks; [`render_pptx`] packages a deck as an Office Open XML
//! presentation.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use examforge_core::model::{GeneratedExam, GeneratorConfig, Question, RubricEntry};
use examforge_core::normalize::normalize;

use crate::document::option_letter;
use crate::ExportVariant;

/// Rubric rows shown on an answer slide; the rest are dropped.
pub const MAX_RUBRIC_LINES: usize = 4;

const EMU_PER_INCH: f64 = 914_400.0;
const SLIDE_WIDTH: u64 = 9_144_000;
const SLIDE_HEIGHT: u64 = 5_143_500;
const ACCENT: &str = "E3000B";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Subtitle,
    Note,
    Heading,
    AnswerHeading,
    Stem,
    Question,
    Option,
    Placeholder,
    Label,
    Body,
    Bullet,
}

struct Format {
    size: u32,
    bold: bool,
    italic: bool,
    color: &'static str,
    centered: bool,
    x: f64,
    width: f64,
    /// Vertical space consumed, in inches.
    advance: f64,
}

impl TextStyle {
    fn format(self) -> Format {
        let base = Format {
            size: 14,
            bold: false,
            italic: false,
            color: "333333",
            centered: false,
            x: 0.5,
            width: 9.0,
            advance: 0.5,
        };
        match self {
            TextStyle::Title => Format {
                size: 32,
                bold: true,
                color: "000000",
                centered: true,
                x: 1.0,
                width: 8.0,
                advance: 1.3,
                ..base
            },
            TextStyle::Subtitle => Format {
                size: 18,
                centered: true,
                x: 1.0,
                width: 8.0,
                advance: 0.7,
                ..base
            },
            TextStyle::Note => Format {
                italic: true,
                color: "666666",
                centered: true,
                x: 1.0,
                width: 8.0,
                ..base
            },
            TextStyle::Heading => Format {
                bold: true,
                color: ACCENT,
                ..base
            },
            TextStyle::AnswerHeading => Format {
                size: 24,
                bold: true,
                color: "1D1D1B",
                advance: 1.0,
                ..base
            },
            TextStyle::Stem => Format {
                italic: true,
                color: "666666",
                advance: 1.2,
                ..base
            },
            TextStyle::Question => Format {
                size: 18,
                bold: true,
                color: "000000",
                advance: 1.2,
                ..base
            },
            TextStyle::Option => Format {
                x: 0.8,
                width: 8.5,
                advance: 0.6,
                ..base
            },
            TextStyle::Placeholder => Format {
                italic: true,
                color: "999999",
                x: 0.8,
                width: 8.5,
                advance: 0.6,
                ..base
            },
            TextStyle::Label => Format {
                bold: true,
                color: "666666",
                ..base
            },
            TextStyle::Body => Format {
                size: 16,
                color: "000000",
                advance: 1.0,
                ..base
            },
            TextStyle::Bullet => Format {
                size: 11,
                advance: 0.4,
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    pub style: TextStyle,
}

impl TextBlock {
    fn new(style: TextStyle, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    Title,
    Prompt,
    Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub kind: SlideKind,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDeck {
    pub title: String,
    pub slides: Vec<Slide>,
}

/// Lay out an exam as slides.
///
/// One title slide, then a prompt slide per question. The teacher variant
/// follows each prompt with an answer slide.
pub fn build_deck(
    exam: &GeneratedExam,
    config: &GeneratorConfig,
    variant: ExportVariant,
) -> SlideDeck {
    let title = normalize(&exam.metadata.title);
    let mut title_blocks = vec![
        TextBlock::new(TextStyle::Title, title.clone()),
        TextBlock::new(
            TextStyle::Subtitle,
            format!("Niveau: {}", config.difficulty.label()),
        ),
    ];
    if variant.is_student() {
        title_blocks.push(TextBlock::new(TextStyle::Note, "Studentversie"));
    }

    let mut slides = vec![Slide {
        kind: SlideKind::Title,
        blocks: title_blocks,
    }];
    for (i, question) in exam.questions.iter().enumerate() {
        slides.push(prompt_slide(i, question));
        if !variant.is_student() {
            slides.push(answer_slide(i, question));
        }
    }
    SlideDeck { title, slides }
}

fn prompt_slide(index: usize, question: &Question) -> Slide {
    let mut blocks = vec![TextBlock::new(
        TextStyle::Heading,
        format!("Vraag {} ({} pt)", index + 1, question.points()),
    )];
    if let Some(stem) = question.stem_text() {
        blocks.push(TextBlock::new(TextStyle::Stem, normalize(stem)));
    }
    blocks.push(TextBlock::new(
        TextStyle::Question,
        normalize(&question.question),
    ));

    let options = question.option_list();
    if options.is_empty() {
        blocks.push(TextBlock::new(TextStyle::Placeholder, "[Open Vraag]"));
    } else {
        blocks.extend(options.iter().enumerate().map(|(idx, option)| {
            TextBlock::new(
                TextStyle::Option,
                format!("{}. {}", option_letter(idx), normalize(option)),
            )
        }));
    }
    Slide {
        kind: SlideKind::Prompt,
        blocks,
    }
}

fn answer_slide(index: usize, question: &Question) -> Slide {
    let mut blocks = vec![
        TextBlock::new(
            TextStyle::AnswerHeading,
            format!("Antwoord Vraag {}", index + 1),
        ),
        TextBlock::new(TextStyle::Label, "Correct antwoord:"),
        TextBlock::new(TextStyle::Body, normalize(&question.correct_answer.join(", "))),
    ];

    match question.rubric.as_deref() {
        Some(rubric) if !rubric.is_empty() => {
            blocks.push(TextBlock::new(
                TextStyle::Label,
                "Beoordelingsmodel (3pt schaal):",
            ));
            blocks.extend(rubric.iter().take(MAX_RUBRIC_LINES).map(|entry| {
                let text = match entry {
                    RubricEntry::Structured(row) => {
                        format!("{}: {} (3pt)", row.criterion, row.excellent)
                    }
                    RubricEntry::FreeText(text) => text.clone(),
                };
                TextBlock::new(TextStyle::Bullet, format!("• {}", normalize(&text)))
            }));
        }
        _ => {
            blocks.push(TextBlock::new(TextStyle::Label, "Toelichting:"));
            blocks.push(TextBlock::new(
                TextStyle::Body,
                normalize(&question.explanation),
            ));
        }
    }
    Slide {
        kind: SlideKind::Answer,
        blocks,
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn emu(inches: f64) -> u64 {
    (inches * EMU_PER_INCH).round() as u64
}

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CORE_PROPERTIES_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";

fn accent_bar(id: u32, height: f64) -> String {
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Accent\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>\
<p:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{SLIDE_WIDTH}\" cy=\"{}\"/></a:xfrm>\
<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val=\"{ACCENT}\"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>",
        emu(height)
    )
}

fn text_box(id: u32, block: &TextBlock, y: f64) -> String {
    let f = block.style.format();
    let align = if f.centered { "<a:pPr algn=\"ctr\"/>" } else { "" };
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Text {id}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
<p:spPr><a:xfrm><a:off x=\"{}\" y=\"{}\"/><a:ext cx=\"{}\" cy=\"{}\"/></a:xfrm>\
<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
<p:txBody><a:bodyPr wrap=\"square\" rtlCol=\"0\"><a:spAutoFit/></a:bodyPr><a:lstStyle/>\
<a:p>{align}<a:r><a:rPr lang=\"nl-NL\" sz=\"{}\" b=\"{}\" i=\"{}\" dirty=\"0\"><a:solidFill><a:srgbClr val=\"{}\"/></a:solidFill>\
<a:latin typeface=\"Arial\"/></a:rPr><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
        emu(f.x),
        emu(y),
        emu(f.width),
        emu(f.advance),
        f.size * 100,
        u8::from(f.bold),
        u8::from(f.italic),
        f.color,
        xml_escape(&block.text)
    )
}

fn slide_xml(slide: &Slide) -> String {
    let (mut y, bar, background) = match slide.kind {
        SlideKind::Title => (1.6, 0.2, None),
        SlideKind::Prompt => (0.5, 0.1, None),
        SlideKind::Answer => (0.5, 0.1, Some("FAFAFA")),
    };

    let mut shapes = accent_bar(2, bar);
    for (i, block) in slide.blocks.iter().enumerate() {
        shapes.push_str(&text_box(i as u32 + 3, block, y));
        y += block.style.format().advance;
    }

    let bg = background
        .map(|color| {
            format!(
                "<p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"{color}\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"
            )
        })
        .unwrap_or_default();

    format!(
        "{XML_HEADER}<p:sld xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\"><p:cSld>{bg}<p:spTree>{GROUP_PROPS}{shapes}</p:spTree></p:cSld>\
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"
    )
}

const GROUP_PROPS: &str = "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\
<p:grpSpPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/><a:chOff x=\"0\" y=\"0\"/><a:chExt cx=\"0\" cy=\"0\"/></a:xfrm></p:grpSpPr>";

fn content_types(slide_count: usize) -> String {
    let mut xml = format!(
        "{XML_HEADER}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/ppt/presentation.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml\"/>\
<Override PartName=\"/ppt/slideMasters/slideMaster1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml\"/>\
<Override PartName=\"/ppt/slideLayouts/slideLayout1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml\"/>\
<Override PartName=\"/ppt/theme/theme1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.theme+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>"
    );
    for n in 1..=slide_count {
        xml.push_str(&format!(
            "<Override PartName=\"/ppt/slides/slide{n}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.presentationml.slide+xml\"/>"
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        "{XML_HEADER}<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">"
    );
    for (id, kind, target) in rels {
        let kind = if kind.contains("://") {
            kind.to_string()
        } else {
            format!("{REL_BASE}/{kind}")
        };
        xml.push_str(&format!(
            "<Relationship Id=\"{id}\" Type=\"{kind}\" Target=\"{target}\"/>"
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn presentation(slide_count: usize) -> String {
    let slide_ids: String = (0..slide_count)
        .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, i + 3))
        .collect();
    format!(
        "{XML_HEADER}<p:presentation xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" saveSubsetFonts=\"1\">\
<p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\
<p:sldIdLst>{slide_ids}</p:sldIdLst>\
<p:sldSz cx=\"{SLIDE_WIDTH}\" cy=\"{SLIDE_HEIGHT}\"/><p:notesSz cx=\"6858000\" cy=\"9144000\"/></p:presentation>"
    )
}

fn slide_master() -> String {
    format!(
        "{XML_HEADER}<p:sldMaster xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\">\
<p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld>\
<p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" folHlink=\"folHlink\"/>\
<p:sldLayoutIdLst><p:sldLayoutId id=\"2147483649\" r:id=\"rId1\"/></p:sldLayoutIdLst></p:sldMaster>"
    )
}

fn slide_layout() -> String {
    format!(
        "{XML_HEADER}<p:sldLayout xmlns:a=\"{NS_A}\" xmlns:r=\"{NS_R}\" xmlns:p=\"{NS_P}\" type=\"blank\" preserve=\"1\">\
<p:cSld name=\"Blank\"><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"
    )
}

fn theme() -> String {
    let colors = [
        ("dk1", "000000"),
        ("lt1", "FFFFFF"),
        ("dk2", "1D1D1B"),
        ("lt2", "EEEEEE"),
        ("accent1", ACCENT),
        ("accent2", "666666"),
        ("accent3", "999999"),
        ("accent4", "166534"),
        ("accent5", "BBF7D0"),
        ("accent6", "F5F7FA"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ];
    let scheme: String = colors
        .iter()
        .map(|(name, rgb)| format!("<a:{name}><a:srgbClr val=\"{rgb}\"/></a:{name}>"))
        .collect();
    let font = "<a:latin typeface=\"Arial\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/>";
    let fill = "<a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill>";
    let line = "<a:ln w=\"9525\"><a:solidFill><a:schemeClr val=\"phClr\"/></a:solidFill></a:ln>";
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        "{XML_HEADER}<a:theme xmlns:a=\"{NS_A}\" name=\"examforge\"><a:themeElements>\
<a:clrScheme name=\"examforge\">{scheme}</a:clrScheme>\
<a:fontScheme name=\"examforge\"><a:majorFont>{font}</a:majorFont><a:minorFont>{font}</a:minorFont></a:fontScheme>\
<a:fmtScheme name=\"examforge\"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst>\
<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst>\
<a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>\
<a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme>\
</a:themeElements></a:theme>"
    )
}

fn core_properties(title: &str) -> String {
    format!(
        "{XML_HEADER}<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\"><dc:title>{}</dc:title><dc:creator>examforge</dc:creator></cp:coreProperties>",
        xml_escape(title)
    )
}

fn app_properties(slide_count: usize) -> String {
    format!(
        "{XML_HEADER}<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
<Application>examforge</Application><Slides>{slide_count}</Slides></Properties>"
    )
}

/// Package a deck as a `.pptx` archive.
pub fn render_pptx(deck: &SlideDeck) -> Result<Vec<u8>> {
    let count = deck.slides.len();
    let layout_rels = relationships(&[(
        "rId1",
        "slideLayout",
        "../slideLayouts/slideLayout1.xml",
    )]);

    let slide_targets: Vec<(String, String)> = (1..=count)
        .map(|n| (format!("rId{}", n + 2), format!("slides/slide{n}.xml")))
        .collect();
    let mut presentation_rels = vec![
        ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        ("rId2", "theme", "theme/theme1.xml"),
    ];
    presentation_rels.extend(
        slide_targets
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str())),
    );

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types(count)),
        (
            "_rels/.rels".into(),
            relationships(&[
                ("rId1", "officeDocument", "ppt/presentation.xml"),
                ("rId2", CORE_PROPERTIES_REL, "docProps/core.xml"),
                ("rId3", "extended-properties", "docProps/app.xml"),
            ]),
        ),
        ("docProps/core.xml".into(), core_properties(&deck.title)),
        ("docProps/app.xml".into(), app_properties(count)),
        ("ppt/presentation.xml".into(), presentation(count)),
        (
            "ppt/_rels/presentation.xml.rels".into(),
            relationships(&presentation_rels),
        ),
        ("ppt/slideMasters/slideMaster1.xml".into(), slide_master()),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            relationships(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "theme", "../theme/theme1.xml"),
            ]),
        ),
        ("ppt/slideLayouts/slideLayout1.xml".into(), slide_layout()),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
            relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
        ),
        ("ppt/theme/theme1.xml".into(), theme()),
    ];
    for (i, slide) in deck.slides.iter().enumerate() {
        let n = i + 1;
        parts.push((format!("ppt/slides/slide{n}.xml"), slide_xml(slide)));
        parts.push((format!("ppt/slides/_rels/slide{n}.xml.rels"), layout_rels.clone()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in &parts {
        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("failed to add {name} to presentation"))?;
        writer
            .write_all(content.as_bytes())
            .with_context(|| format!("failed to write {name}"))?;
    }
    let bytes = writer
        .finish()
        .context("failed to finalize presentation")?
        .into_inner();
    tracing::debug!(slides = count, bytes = bytes.len(), "presentation packaged");
    Ok(bytes)
}
