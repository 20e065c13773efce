//! Resume templates: lay a `ResumeSnapshot` out into the host document.
//!
//! The rendered subtree is rooted at an element with id `resume-template`, is one
//! A4 page wide, at least one A4 page tall, and grows downward with content.
//! Rendering again replaces the previous subtree, which is how the live preview
//! refreshes after the store changes.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::dom::{Content, Document, Element, ImageContent, NodeId, Origin, Position, Rect, TextBlock};
use crate::layout::font_metrics::{get_metrics, FontFamily};
use crate::layout::page::{mm_to_px, A4_HEIGHT_MM, A4_WIDTH_MM};
use crate::models::{PersonalInfo, ResumeSnapshot, TemplateKind};

pub const TEMPLATE_ELEMENT_ID: &str = "resume-template";

const PRIMARY: Rgba<u8> = Rgba([0xFF, 0x6B, 0x6B, 0xFF]);
const SECONDARY: Rgba<u8> = Rgba([0x4E, 0xCD, 0xC4, 0xFF]);
const ACCENT: Rgba<u8> = Rgba([0xFF, 0xD1, 0x66, 0xFF]);
const DARK: Rgba<u8> = Rgba([0x2D, 0x30, 0x47, 0xFF]);
const LIGHT: Rgba<u8> = Rgba([0xF7, 0xFF, 0xF7, 0xFF]);
const GRAY: Rgba<u8> = Rgba([0xA1, 0xA1, 0xA1, 0xFF]);
const DARK_GRAY: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 0xFF]);
const WHITE: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

const PADDING: f32 = 32.0;

/// Decoded images keyed by the ref stored in the document model.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    images: HashMap<String, Arc<RgbaImage>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, src: impl Into<String>, image: RgbaImage) {
        self.images.insert(src.into(), Arc::new(image));
    }

    /// Resolves an image ref: inline `data:` URLs are decoded, anything else is
    /// looked up in the cache.
    pub fn resolve(&self, src: &str) -> Option<ImageContent> {
        let pixels = if src.starts_with("data:") {
            Arc::new(decode_data_url(src)?)
        } else {
            self.images.get(src)?.clone()
        };
        Some(ImageContent {
            src: src.to_string(),
            origin: Origin::classify(src),
            pixels,
        })
    }
}

fn decode_data_url(src: &str) -> Option<RgbaImage> {
    let (header, payload) = src.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    image::load_from_memory(&bytes).ok().map(|img| img.to_rgba8())
}

// ────────────────────────────────────────────────────────────────────────────
// Flow layout helper
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: FontFamily,
    size: f32,
    line_height: f32,
    color: Rgba<u8>,
    space_after: f32,
    uppercase: bool,
}

impl TextStyle {
    fn new(font: FontFamily, size: f32, color: Rgba<u8>) -> Self {
        TextStyle {
            font,
            size,
            line_height: size * 1.5,
            color,
            space_after: 4.0,
            uppercase: false,
        }
    }

    fn after(mut self, space: f32) -> Self {
        self.space_after = space;
        self
    }

    fn upper(mut self) -> Self {
        self.uppercase = true;
        self
    }
}

/// Vertical flow inside one container: places blocks top to bottom.
struct Flow<'a> {
    doc: &'a mut Document,
    container: NodeId,
    x: f32,
    width: f32,
    y: f32,
}

impl<'a> Flow<'a> {
    fn new(doc: &'a mut Document, container: NodeId, width: f32) -> Self {
        Flow {
            doc,
            container,
            x: PADDING,
            width: width - 2.0 * PADDING,
            y: PADDING,
        }
    }

    fn place(&mut self, element: Element) -> NodeId {
        let id = self.doc.create_element(element);
        self.doc.append_child(self.container, id);
        id
    }

    fn text_block(&self, text: &str, style: TextStyle, width: f32) -> Option<TextBlock> {
        let source = if style.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        let lines = get_metrics(style.font).wrap_lines(&source, style.size, width);
        if lines.is_empty() {
            return None;
        }
        Some(TextBlock {
            lines,
            font: style.font,
            font_size: style.size,
            line_height: style.line_height,
            color: style.color,
        })
    }

    /// Wrapped paragraph at the cursor, indented by `indent`.
    fn text_indented(&mut self, text: &str, style: TextStyle, indent: f32) -> f32 {
        let Some(block) = self.text_block(text, style, self.width - indent) else {
            return 0.0;
        };
        let height = block.lines.len() as f32 * block.line_height;
        self.place(
            Element::new("p", Rect::new(self.x + indent, self.y, self.width - indent, height))
                .with_content(Content::Text(block)),
        );
        height
    }

    fn text(&mut self, text: &str, style: TextStyle) {
        let height = self.text_indented(text, style, 0.0);
        if height > 0.0 {
            self.y += height + style.space_after;
        }
    }

    /// Section heading with an underline rule.
    fn heading(&mut self, text: &str, color: Rgba<u8>, rule: Rgba<u8>, font: FontFamily) {
        self.y += 8.0;
        self.text(text, TextStyle::new(font, 16.0, color).upper().after(2.0));
        self.place(Element::new("hr", Rect::new(self.x, self.y, self.width, 2.0)).with_background(rule));
        self.y += 12.0;
    }

    /// Small coloured square followed by a line of text.
    fn icon_row(&mut self, icon: Rgba<u8>, text: &str, style: TextStyle) {
        if text.trim().is_empty() {
            return;
        }
        const ICON: f32 = 24.0;
        self.place(
            Element::new("span", Rect::new(self.x, self.y, ICON, ICON)).with_background(icon),
        );
        let height = self.text_indented(text, style, ICON + 10.0);
        self.y += height.max(ICON) + style.space_after;
    }

    fn spacer(&mut self, dy: f32) {
        self.y += dy;
    }

    fn content_height(&self) -> f32 {
        self.y + PADDING
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Renders the snapshot with its selected template and attaches it to the body,
/// replacing any earlier render. Returns the root node.
pub fn render_resume(doc: &mut Document, snapshot: &ResumeSnapshot, assets: &AssetCache) -> NodeId {
    while let Some(previous) = doc.get_element_by_id(TEMPLATE_ELEMENT_ID) {
        doc.remove_subtree(previous);
    }

    let page_width = mm_to_px(A4_WIDTH_MM);
    let page_height = mm_to_px(A4_HEIGHT_MM);

    let root = doc.create_element(
        Element::new("div", Rect::new(0.0, 0.0, page_width, page_height))
            .with_id(TEMPLATE_ELEMENT_ID)
            .with_position(Position::Relative),
    );

    let content_height = match snapshot.selected_template {
        TemplateKind::Creative => render_creative(doc, root, snapshot, assets, page_width),
        TemplateKind::Classic => render_classic(doc, root, snapshot, page_width),
    };
    let height = content_height.max(page_height);
    doc.set_frame(root, Rect::new(0.0, 0.0, page_width, height));
    doc.append_to_body(root);

    debug!(
        template = ?snapshot.selected_template,
        width = page_width,
        height,
        "resume rendered"
    );
    root
}

fn display_name(info: &PersonalInfo) -> &str {
    if info.full_name.trim().is_empty() {
        "Your Name"
    } else {
        info.full_name.trim()
    }
}

fn display_title(info: &PersonalInfo) -> &str {
    if info.title.trim().is_empty() {
        "Your Profession"
    } else {
        info.title.trim()
    }
}

fn date_range(start: &str, end: &str, is_current: bool) -> String {
    let end = if is_current { "Present" } else { end };
    match (start.trim().is_empty(), end.trim().is_empty()) {
        (true, true) => String::new(),
        (false, true) => start.to_string(),
        (true, false) => end.to_string(),
        (false, false) => format!("{start} - {end}"),
    }
}

fn join_non_empty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

// ────────────────────────────────────────────────────────────────────────────
// Creative template: dark sidebar plus main column
// ────────────────────────────────────────────────────────────────────────────

fn render_creative(
    doc: &mut Document,
    root: NodeId,
    snapshot: &ResumeSnapshot,
    assets: &AssetCache,
    page_width: f32,
) -> f32 {
    let root_bg = doc.create_element(Element::new("div", Rect::default()).with_background(LIGHT));
    doc.append_child(root, root_bg);

    let sidebar_width = (page_width / 3.0).round();
    let main_width = page_width - sidebar_width;

    let sidebar = doc.create_element(
        Element::new("aside", Rect::new(0.0, 0.0, sidebar_width, 0.0))
            .with_background(DARK)
            .with_z_index(1),
    );
    doc.append_child(root, sidebar);
    let main = doc.create_element(
        Element::new("main", Rect::new(sidebar_width, 0.0, main_width, 0.0)).with_z_index(1),
    );
    doc.append_child(root, main);

    let sidebar_height = render_sidebar(doc, sidebar, snapshot, assets, sidebar_width);
    let main_height = render_main_column(doc, main, snapshot, main_width);
    let height = sidebar_height
        .max(main_height)
        .max(mm_to_px(A4_HEIGHT_MM));

    doc.set_frame(root_bg, Rect::new(0.0, 0.0, page_width, height));
    doc.set_frame(sidebar, Rect::new(0.0, 0.0, sidebar_width, height));
    doc.set_frame(main, Rect::new(sidebar_width, 0.0, main_width, height));

    // Gradient foot of the sidebar.
    let foot = doc.create_element(
        Element::new("div", Rect::new(0.0, height - 100.0, sidebar_width, 100.0))
            .with_background(PRIMARY)
            .with_position(Position::Absolute),
    );
    doc.append_child(sidebar, foot);
    height
}

fn render_sidebar(
    doc: &mut Document,
    sidebar: NodeId,
    snapshot: &ResumeSnapshot,
    assets: &AssetCache,
    width: f32,
) -> f32 {
    let info = &snapshot.personal_info;
    let mut flow = Flow::new(doc, sidebar, width);
    let sans = FontFamily::Sans;

    // Avatar: photo when it resolves, otherwise the initial on a coloured tile.
    let avatar_size = 140.0_f32.min(flow.width);
    let avatar_x = (width - avatar_size) / 2.0;
    let frame = Rect::new(avatar_x, flow.y, avatar_size, avatar_size);
    let photo = info.photo.as_deref().filter(|s| !s.trim().is_empty());
    match photo.and_then(|src| assets.resolve(src)) {
        Some(image) => {
            flow.place(
                Element::new("img", frame)
                    .with_border(4.0, ACCENT)
                    .with_content(Content::Image(image)),
            );
        }
        None => {
            if let Some(src) = photo {
                warn!(src, "photo could not be resolved, using initial avatar");
            }
            let initial: String = display_name(info)
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_else(|| "Y".to_string());
            let tile = flow.place(
                Element::new("div", frame)
                    .with_background(PRIMARY)
                    .with_border(4.0, ACCENT),
            );
            let style = TextStyle::new(sans, 48.0, WHITE);
            if let Some(block) = flow.text_block(&initial, style, avatar_size) {
                let glyph_w = get_metrics(sans).measure_str(&initial) * 48.0;
                let letter = flow.doc.create_element(
                    Element::new(
                        "span",
                        Rect::new(
                            (avatar_size - glyph_w) / 2.0,
                            (avatar_size - style.line_height) / 2.0,
                            glyph_w,
                            style.line_height,
                        ),
                    )
                    .with_content(Content::Text(block)),
                );
                flow.doc.append_child(tile, letter);
            }
        }
    }
    flow.spacer(avatar_size + 20.0);

    flow.text(display_name(info), TextStyle::new(sans, 32.0, WHITE).after(8.0));

    // Title pill.
    let pill_style = TextStyle::new(sans, 14.0, WHITE).upper();
    if let Some(block) = flow.text_block(display_title(info), pill_style, flow.width - 32.0) {
        let text_h = block.lines.len() as f32 * block.line_height;
        let pill = flow.place(
            Element::new("div", Rect::new(flow.x, flow.y, flow.width, text_h + 12.0))
                .with_background(PRIMARY),
        );
        let label = flow.doc.create_element(
            Element::new("span", Rect::new(16.0, 6.0, flow.width - 32.0, text_h))
                .with_content(Content::Text(block)),
        );
        flow.doc.append_child(pill, label);
        flow.spacer(text_h + 12.0 + 16.0);
    }

    flow.heading("Contact", ACCENT, SECONDARY, sans);
    let contact = TextStyle::new(sans, 12.0, WHITE).after(10.0);
    flow.icon_row(PRIMARY, &info.email, contact);
    flow.icon_row(SECONDARY, &info.phone, contact);
    flow.icon_row(ACCENT, &info.address, contact);
    flow.icon_row(SECONDARY, &info.linkedin, contact);
    flow.icon_row(PRIMARY, &info.github, contact);

    if !snapshot.skills.is_empty() {
        flow.heading("Skills", ACCENT, SECONDARY, sans);
        for skill in &snapshot.skills {
            flow.text(&skill.data.name, TextStyle::new(sans, 12.0, WHITE).after(2.0));
            let stars = skill.data.level.stars();
            for i in 0..5u8 {
                let color = if i < stars { ACCENT } else { GRAY };
                flow.place(
                    Element::new(
                        "i",
                        Rect::new(flow.x + f32::from(i) * 14.0, flow.y, 10.0, 10.0),
                    )
                    .with_background(color),
                );
            }
            flow.spacer(18.0);
        }
    }

    if !snapshot.languages.is_empty() {
        flow.heading("Languages", ACCENT, SECONDARY, sans);
        for language in &snapshot.languages {
            let label = format!("{} ({})", language.data.name, language.data.proficiency);
            flow.text(&label, TextStyle::new(sans, 12.0, WHITE).after(4.0));
            let track = flow.place(
                Element::new("div", Rect::new(flow.x, flow.y, flow.width, 6.0))
                    .with_background(GRAY),
            );
            let fill = flow.doc.create_element(
                Element::new(
                    "div",
                    Rect::new(0.0, 0.0, flow.width * language.data.proficiency.bar_fraction(), 6.0),
                )
                .with_background(SECONDARY),
            );
            flow.doc.append_child(track, fill);
            flow.spacer(16.0);
        }
    }

    // Leave room for the sidebar foot.
    flow.content_height() + 100.0
}

fn render_main_column(doc: &mut Document, main: NodeId, snapshot: &ResumeSnapshot, width: f32) -> f32 {
    let mut flow = Flow::new(doc, main, width);
    render_sections(&mut flow, snapshot, FontFamily::Sans, PRIMARY, SECONDARY);
    flow.content_height()
}

/// Profile, experience, education, projects and certifications, in that order.
fn render_sections(
    flow: &mut Flow<'_>,
    snapshot: &ResumeSnapshot,
    font: FontFamily,
    accent: Rgba<u8>,
    rule: Rgba<u8>,
) {
    let body = TextStyle::new(font, 12.0, DARK_GRAY).after(6.0);
    let strong = TextStyle::new(font, 15.0, DARK).after(0.0);
    let meta = TextStyle::new(font, 12.0, accent).after(2.0);
    let muted = TextStyle::new(font, 11.0, GRAY).after(4.0);

    let summary = snapshot.personal_info.summary.trim();
    if !summary.is_empty() {
        flow.heading("Profile", DARK, rule, font);
        flow.text(summary, body);
    }

    if !snapshot.experience.is_empty() {
        flow.heading("Experience", DARK, rule, font);
        for exp in &snapshot.experience {
            let e = &exp.data;
            flow.text(&e.position, strong);
            flow.text(&join_non_empty(&[&e.company, &e.location], " | "), meta);
            flow.text(&date_range(&e.start_date, &e.end_date, e.is_current), muted);
            flow.text(&e.description, body);
            skill_chips(flow, &e.skills, font, rule);
            flow.spacer(8.0);
        }
    }

    if !snapshot.education.is_empty() {
        flow.heading("Education", DARK, rule, font);
        for edu in &snapshot.education {
            let e = &edu.data;
            let title = join_non_empty(&[e.education_type.label(), &e.degree], " - ");
            flow.text(&title, strong);
            flow.text(&join_non_empty(&[&e.institution, &e.board_university], ", "), meta);
            let score = if e.score.trim().is_empty() {
                String::new()
            } else {
                format!("{} {}", e.score.trim(), e.score_type)
            };
            flow.text(&join_non_empty(&[&e.year, &e.location, &score], " | "), muted);
            flow.text(&e.description, body);
            flow.spacer(6.0);
        }
    }

    if !snapshot.projects.is_empty() {
        flow.heading("Projects", DARK, rule, font);
        for project in &snapshot.projects {
            let p = &project.data;
            flow.text(&p.name, strong);
            if let Some(link) = p.link.as_deref() {
                flow.text(link, meta);
            }
            flow.text(&p.description, body);
            flow.spacer(6.0);
        }
    }

    if !snapshot.certifications.is_empty() {
        flow.heading("Certifications", DARK, rule, font);
        for cert in &snapshot.certifications {
            let c = &cert.data;
            flow.text(&c.name, strong);
            flow.text(&join_non_empty(&[&c.issuer, &c.date], " | "), muted);
        }
    }
}

/// Experience skill tags laid out as wrapping chips.
fn skill_chips(flow: &mut Flow<'_>, skills: &[String], font: FontFamily, color: Rgba<u8>) {
    if skills.is_empty() {
        return;
    }
    const CHIP_H: f32 = 18.0;
    const GAP: f32 = 6.0;
    let style = TextStyle::new(font, 10.0, WHITE);
    let metrics = get_metrics(font);
    let mut x = 0.0_f32;

    for skill in skills.iter().filter(|s| !s.trim().is_empty()) {
        let chip_w = (metrics.measure_str(skill) * style.size + 12.0).min(flow.width);
        if x > 0.0 && x + chip_w > flow.width {
            x = 0.0;
            flow.spacer(CHIP_H + GAP);
        }
        let chip = flow.place(
            Element::new("span", Rect::new(flow.x + x, flow.y, chip_w, CHIP_H)).with_background(color),
        );
        if let Some(mut block) = flow.text_block(skill, style, f32::INFINITY) {
            block.line_height = CHIP_H;
            let label = flow.doc.create_element(
                Element::new("span", Rect::new(6.0, 0.0, chip_w - 12.0, CHIP_H))
                    .with_content(Content::Text(block)),
            );
            flow.doc.append_child(chip, label);
        }
        x += chip_w + GAP;
    }
    flow.spacer(CHIP_H + GAP);
}

// ────────────────────────────────────────────────────────────────────────────
// Classic template: single serif column
// ────────────────────────────────────────────────────────────────────────────

fn render_classic(doc: &mut Document, root: NodeId, snapshot: &ResumeSnapshot, page_width: f32) -> f32 {
    let page = doc.create_element(
        Element::new("div", Rect::new(0.0, 0.0, page_width, 0.0)).with_background(WHITE),
    );
    doc.append_child(root, page);

    let info = &snapshot.personal_info;
    let serif = FontFamily::Serif;
    let mut flow = Flow::new(doc, page, page_width);

    flow.text(display_name(info), TextStyle::new(serif, 30.0, DARK).after(0.0));
    flow.text(display_title(info), TextStyle::new(serif, 14.0, GRAY).upper().after(6.0));
    let contact = join_non_empty(
        &[&info.email, &info.phone, &info.address, &info.linkedin, &info.github],
        " | ",
    );
    flow.text(&contact, TextStyle::new(serif, 11.0, DARK_GRAY).after(6.0));

    render_sections(&mut flow, snapshot, serif, DARK, DARK);

    if !snapshot.skills.is_empty() {
        flow.heading("Skills", DARK, DARK, serif);
        let skills = snapshot
            .skills
            .iter()
            .map(|s| format!("{} ({})", s.data.name, s.data.level))
            .collect::<Vec<_>>()
            .join(", ");
        flow.text(&skills, TextStyle::new(serif, 12.0, DARK_GRAY));
    }
    if !snapshot.languages.is_empty() {
        flow.heading("Languages", DARK, DARK, serif);
        let languages = snapshot
            .languages
            .iter()
            .map(|l| format!("{} ({})", l.data.name, l.data.proficiency))
            .collect::<Vec<_>>()
            .join(", ");
        flow.text(&languages, TextStyle::new(serif, 12.0, DARK_GRAY));
    }

    let height = flow.content_height().max(mm_to_px(A4_HEIGHT_MM));
    doc.set_frame(page, Rect::new(0.0, 0.0, page_width, height));
    height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Size;
    use crate::models::{Entry, EntryId, ExperienceEntry, SkillEntry, SkillLevel};

    fn make_doc() -> Document {
        Document::new(Size::new(1280.0, 800.0))
    }

    fn texts(doc: &Document, root: NodeId) -> Vec<String> {
        doc.descendants(root)
            .into_iter()
            .filter_map(|id| match &doc.element(id)?.content {
                Content::Text(block) => Some(block.lines.join(" ")),
                _ => None,
            })
            .collect()
    }

    fn make_experience(description: &str) -> Entry<ExperienceEntry> {
        Entry {
            id: EntryId::new(),
            data: ExperienceEntry {
                company: "Acme".to_string(),
                position: "Engineer".to_string(),
                location: "Remote".to_string(),
                start_date: "2020".to_string(),
                end_date: String::new(),
                description: description.to_string(),
                is_current: true,
                skills: vec!["Rust".to_string(), "Kafka".to_string()],
            },
        }
    }

    #[test]
    fn test_empty_snapshot_renders_one_page_with_placeholders() {
        let mut doc = make_doc();
        let root = render_resume(&mut doc, &ResumeSnapshot::default(), &AssetCache::new());
        let frame = doc.element(root).unwrap().frame;
        assert!((frame.width - mm_to_px(A4_WIDTH_MM)).abs() < 1e-3);
        assert!((frame.height - mm_to_px(A4_HEIGHT_MM)).abs() < 1e-3);

        let all = texts(&doc, root);
        assert!(all.iter().any(|t| t == "Your Name"));
        assert!(all.iter().any(|t| t == "YOUR PROFESSION"));
        assert!(all.iter().any(|t| t == "Y"), "initial avatar expected");
    }

    #[test]
    fn test_rerender_replaces_previous_tree() {
        let mut doc = make_doc();
        let snapshot = ResumeSnapshot::default();
        let first = render_resume(&mut doc, &snapshot, &AssetCache::new());
        let live = doc.live_node_count();
        let second = render_resume(&mut doc, &snapshot, &AssetCache::new());

        assert_ne!(first, second);
        assert_eq!(doc.body_child_count(), 1);
        assert_eq!(doc.live_node_count(), live);
        assert_eq!(doc.get_element_by_id(TEMPLATE_ELEMENT_ID), Some(second));
    }

    #[test]
    fn test_long_content_grows_past_one_page() {
        let mut snapshot = ResumeSnapshot::default();
        let paragraph = "Led the migration of a monolith to event-driven services. ".repeat(12);
        snapshot.experience = (0..12).map(|_| make_experience(&paragraph)).collect();

        let mut doc = make_doc();
        let root = render_resume(&mut doc, &snapshot, &AssetCache::new());
        let frame = doc.element(root).unwrap().frame;
        assert!(frame.height > mm_to_px(A4_HEIGHT_MM) * 1.5, "height {}", frame.height);
    }

    #[test]
    fn test_current_role_shows_present() {
        let mut snapshot = ResumeSnapshot::default();
        snapshot.experience.push(make_experience("Built things"));
        let mut doc = make_doc();
        let root = render_resume(&mut doc, &snapshot, &AssetCache::new());
        assert!(texts(&doc, root).iter().any(|t| t == "2020 - Present"));
    }

    #[test]
    fn test_classic_template_uses_serif() {
        let mut snapshot = ResumeSnapshot::default();
        snapshot.selected_template = TemplateKind::Classic;
        snapshot.skills.push(Entry {
            id: EntryId::new(),
            data: SkillEntry {
                name: "Rust".to_string(),
                level: SkillLevel::Expert,
            },
        });
        let mut doc = make_doc();
        let root = render_resume(&mut doc, &snapshot, &AssetCache::new());
        let fonts: Vec<FontFamily> = doc
            .descendants(root)
            .into_iter()
            .filter_map(|id| match &doc.element(id)?.content {
                Content::Text(block) => Some(block.font),
                _ => None,
            })
            .collect();
        assert!(!fonts.is_empty());
        assert!(fonts.iter().all(|f| *f == FontFamily::Serif));
        assert!(texts(&doc, root).iter().any(|t| t == "Rust (Expert)"));
    }

    #[test]
    fn test_cached_photo_is_rendered_as_image() {
        let mut assets = AssetCache::new();
        assets.insert("https://cdn.example.com/jane.png", RgbaImage::from_pixel(4, 4, PRIMARY));
        let mut snapshot = ResumeSnapshot::default();
        snapshot.personal_info.photo = Some("https://cdn.example.com/jane.png".to_string());

        let mut doc = make_doc();
        let root = render_resume(&mut doc, &snapshot, &assets);
        let image = doc
            .descendants(root)
            .into_iter()
            .find_map(|id| match &doc.element(id)?.content {
                Content::Image(img) => Some(img.clone()),
                _ => None,
            })
            .expect("photo element");
        assert_eq!(image.origin, Origin::CrossOrigin);
    }

    #[test]
    fn test_data_url_photo_is_decoded() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(2, 2, SECONDARY)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let src = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let resolved = AssetCache::new().resolve(&src).expect("decoded");
        assert_eq!(resolved.origin, Origin::SameOrigin);
        assert_eq!(resolved.pixels.dimensions(), (2, 2));
        assert!(AssetCache::new().resolve("data:image/png,notbase64").is_none());
    }

    #[test]
    fn test_date_range_variants() {
        assert_eq!(date_range("2019", "2021", false), "2019 - 2021");
        assert_eq!(date_range("2019", "", false), "2019");
        assert_eq!(date_range("", "", false), "");
        assert_eq!(date_range("2019", "2021", true), "2019 - Present");
    }
}
