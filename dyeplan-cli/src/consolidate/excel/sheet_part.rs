//! Worksheet and style sheet XML for a sheet replaced inside an existing package
//!
//! Cells are written as inline strings so the shared string table stays as it
//! was. Styles are appended after the workbook's own entries, so every index an
//! untouched sheet refers to keeps its meaning.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::consolidate::{Dataset, Value};

use super::package::attr_value;
use super::styling::{StyleConfig, column_widths, hex_rgb};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// First id Excel leaves to custom number formats
const FIRST_CUSTOM_NUM_FMT: u32 = 164;

/// `cellXfs` indices of the appended styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyles {
    pub header: usize,
    pub body: usize,
    pub datetime: usize,
}

/// Children already present in the style sheet's containers
#[derive(Debug, Default)]
struct StyleCounts {
    num_fmts: Option<usize>,
    max_num_fmt_id: u32,
    fonts: usize,
    borders: usize,
    cell_xfs: usize,
}

/// What gets appended, derived from the counts and the configured style
struct StylePlan<'a> {
    style: &'a StyleConfig,
    counts: StyleCounts,
    num_fmt_id: u32,
}

impl StylePlan<'_> {
    fn body_font(&self) -> usize {
        self.counts.fonts
    }

    fn header_font(&self) -> usize {
        if self.style.bold_header { self.counts.fonts + 1 } else { self.counts.fonts }
    }

    fn border(&self) -> usize {
        if self.style.borders { self.counts.borders } else { 0 }
    }

    fn cell_styles(&self) -> CellStyles {
        let first = self.counts.cell_xfs;
        CellStyles {
            header: first,
            body: first + 1,
            datetime: first + 2,
        }
    }

    fn font(&self, p: &str, bold: bool) -> String {
        let mut xml = format!("<{p}font>");
        if bold {
            xml.push_str(&format!("<{p}b/>"));
        }
        xml.push_str(&format!("<{p}sz val=\"{}\"/>", self.style.font_size));
        match hex_rgb(&self.style.font_color) {
            Some(rgb) => xml.push_str(&format!("<{p}color rgb=\"FF{:06X}\"/>", rgb)),
            None => log::warn!("Ignoring invalid font color '{}'", self.style.font_color),
        }
        xml.push_str(&format!("<{p}name val=\"{}\"/></{p}font>", escape(&self.style.font_family)));
        xml
    }

    fn xf(&self, p: &str, num_fmt_id: u32, font_id: usize) -> String {
        let apply_num_fmt = if num_fmt_id != 0 { " applyNumberFormat=\"1\"" } else { "" };
        let apply_border = if self.style.borders { " applyBorder=\"1\"" } else { "" };
        format!(
            "<{p}xf numFmtId=\"{num_fmt_id}\" fontId=\"{font_id}\" fillId=\"0\" borderId=\"{}\" xfId=\"0\" applyFont=\"1\"{apply_border}{apply_num_fmt}/>",
            self.border()
        )
    }

    /// Fragment appended to a container and how many children it adds
    fn additions(&self, container: &[u8], p: &str) -> Option<(usize, usize, String)> {
        match container {
            b"numFmts" => Some((self.counts.num_fmts.unwrap_or(0), 1, self.num_fmt(p))),
            b"fonts" => {
                let mut xml = self.font(p, false);
                if self.style.bold_header {
                    xml.push_str(&self.font(p, true));
                }
                Some((self.counts.fonts, if self.style.bold_header { 2 } else { 1 }, xml))
            }
            b"borders" if self.style.borders => {
                let mut xml = format!("<{p}border>");
                for side in ["left", "right", "top", "bottom"] {
                    xml.push_str(&format!("<{p}{side} style=\"thin\"><{p}color auto=\"1\"/></{p}{side}>"));
                }
                xml.push_str(&format!("<{p}diagonal/></{p}border>"));
                Some((self.counts.borders, 1, xml))
            }
            b"cellXfs" => {
                let xml = [
                    self.xf(p, 0, self.header_font()),
                    self.xf(p, 0, self.body_font()),
                    self.xf(p, self.num_fmt_id, self.body_font()),
                ]
                .concat();
                Some((self.counts.cell_xfs, 3, xml))
            }
            _ => None,
        }
    }

    fn num_fmt(&self, p: &str) -> String {
        format!(
            "<{p}numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
            self.num_fmt_id,
            escape(&self.style.datetime_format)
        )
    }

    /// Whole `numFmts` container for a style sheet that has none
    fn num_fmts_block(&self, p: &str) -> String {
        format!("<{p}numFmts count=\"1\">{}</{p}numFmts>", self.num_fmt(p))
    }
}

/// Append header/body/datetime cell formats to `styles.xml`
pub fn append_cell_styles(styles_xml: &[u8], style: &StyleConfig) -> Result<(Vec<u8>, CellStyles)> {
    let counts = count_styles(styles_xml)?;
    let num_fmt_id = (counts.max_num_fmt_id + 1).max(FIRST_CUSTOM_NUM_FMT);
    let plan = StylePlan { style, counts, num_fmt_id };

    let mut reader = Reader::from_reader(styles_xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(styles_xml.len() + 1024));
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) => {
                depth += 1;
                if depth == 2 {
                    let p = prefix(e)?;
                    let local = e.local_name();
                    if local.as_ref() == b"fonts" && plan.counts.num_fmts.is_none() {
                        writer.get_mut().extend_from_slice(plan.num_fmts_block(&p).as_bytes());
                    }
                    match plan.additions(local.as_ref(), &p) {
                        Some((existing, added, _)) => {
                            writer.write_event(Event::Start(with_count(e, existing + added)?))?
                        }
                        None => writer.write_event(Event::Start(e.to_owned()))?,
                    }
                } else {
                    writer.write_event(Event::Start(e.to_owned()))?;
                }
            }
            Event::Empty(ref e) if depth == 1 => {
                let p = prefix(e)?;
                if e.local_name().as_ref() == b"fonts" && plan.counts.num_fmts.is_none() {
                    writer.get_mut().extend_from_slice(plan.num_fmts_block(&p).as_bytes());
                }
                match plan.additions(e.local_name().as_ref(), &p) {
                    Some((existing, added, xml)) => {
                        let start = with_count(e, existing + added)?;
                        let end = BytesEnd::new(std::str::from_utf8(e.name().as_ref())?.to_string());
                        writer.write_event(Event::Start(start))?;
                        writer.get_mut().extend_from_slice(xml.as_bytes());
                        writer.write_event(Event::End(end))?;
                    }
                    None => writer.write_event(Event::Empty(e.to_owned()))?,
                }
            }
            Event::End(ref e) => {
                if depth == 2 {
                    let p = end_prefix(e)?;
                    if let Some((_, _, xml)) = plan.additions(e.local_name().as_ref(), &p) {
                        writer.get_mut().extend_from_slice(xml.as_bytes());
                    }
                }
                depth = depth.saturating_sub(1);
                writer.write_event(Event::End(e.to_owned()))?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
        buf.clear();
    }

    let cell_styles = plan.cell_styles();
    log::debug!("Appended cell styles {:?} (number format {})", cell_styles, plan.num_fmt_id);
    Ok((writer.into_inner(), cell_styles))
}

fn count_styles(styles_xml: &[u8]) -> Result<StyleCounts> {
    let mut reader = Reader::from_reader(styles_xml);
    let mut buf = Vec::new();
    let mut counts = StyleCounts::default();
    let mut container: Vec<u8> = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                depth += 1;
                count_element(&mut counts, &mut container, e, depth, false)?;
            }
            Event::Empty(ref e) => count_element(&mut counts, &mut container, e, depth + 1, true)?,
            Event::End(_) => {
                if depth == 2 {
                    container.clear();
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(counts)
}

/// `level` is 1 for the root; containers sit at 2, their entries at 3
fn count_element(
    counts: &mut StyleCounts,
    container: &mut Vec<u8>,
    e: &BytesStart<'_>,
    level: usize,
    empty: bool,
) -> Result<()> {
    if level == 2 {
        *container = e.local_name().as_ref().to_vec();
        if container.as_slice() == b"numFmts" {
            counts.num_fmts = Some(0);
        }
        if empty {
            container.clear();
        }
        return Ok(());
    }

    if level == 3 {
        match (container.as_slice(), e.local_name().as_ref()) {
            (b"numFmts", b"numFmt") => {
                counts.num_fmts = Some(counts.num_fmts.unwrap_or(0) + 1);
                let id = attr_value(e, b"numFmtId")?.and_then(|id| id.parse::<u32>().ok());
                counts.max_num_fmt_id = counts.max_num_fmt_id.max(id.unwrap_or(0));
            }
            (b"fonts", b"font") => counts.fonts += 1,
            (b"borders", b"border") => counts.borders += 1,
            (b"cellXfs", b"xf") => counts.cell_xfs += 1,
            _ => {}
        }
    }
    Ok(())
}

/// Namespace prefix of an element, colon included ("" for the default namespace)
fn prefix(e: &BytesStart<'_>) -> Result<String> {
    split_prefix(e.name().as_ref(), e.local_name().as_ref())
}

fn end_prefix(e: &BytesEnd<'_>) -> Result<String> {
    split_prefix(e.name().as_ref(), e.local_name().as_ref())
}

fn split_prefix(name: &[u8], local: &[u8]) -> Result<String> {
    let prefix = &name[..name.len() - local.len()];
    Ok(std::str::from_utf8(prefix)?.to_string())
}

fn with_count(e: &BytesStart<'_>, count: usize) -> Result<BytesStart<'static>> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let count = count.to_string();
    let mut start = BytesStart::new(name);
    let mut replaced = false;

    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"count" {
            start.push_attribute(("count", count.as_str()));
            replaced = true;
        } else {
            start.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    if !replaced {
        start.push_attribute(("count", count.as_str()));
    }
    Ok(start)
}

/// Worksheet part for `dataset`: styled header row, body rows, fitted column widths
pub fn render_sheet_xml(dataset: &Dataset, styles: &CellStyles, width_padding: f64, date1904: bool) -> String {
    let mut xml = String::with_capacity(256 + dataset.len() * dataset.width() * 48);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    let _ = write!(xml, "<worksheet xmlns=\"{MAIN_NS}\" xmlns:r=\"{REL_NS}\">");

    let dimension = match dataset.width() {
        0 => "A1".to_string(),
        width => format!("A1:{}{}", column_name(width - 1), dataset.len() + 1),
    };
    let _ = write!(xml, "<dimension ref=\"{dimension}\"/>");
    xml.push_str("<sheetFormatPr defaultRowHeight=\"15\"/>");

    let widths = column_widths(dataset, width_padding);
    if !widths.is_empty() {
        xml.push_str("<cols>");
        for (idx, width) in widths.iter().enumerate() {
            let col = idx + 1;
            let _ = write!(xml, "<col min=\"{col}\" max=\"{col}\" width=\"{width}\" customWidth=\"1\"/>");
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    if dataset.width() > 0 {
        xml.push_str("<row r=\"1\">");
        for (col, name) in dataset.columns().iter().enumerate() {
            inline_string(&mut xml, &cell_ref(col, 1), styles.header, name);
        }
        xml.push_str("</row>");
    }

    for (idx, row) in dataset.rows().iter().enumerate() {
        let row_num = idx + 2;
        let _ = write!(xml, "<row r=\"{row_num}\">");
        for (col, value) in row.iter().enumerate() {
            write_cell(&mut xml, &cell_ref(col, row_num), value, styles, date1904);
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    xml.push_str("<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>");
    xml.push_str("</worksheet>");
    xml
}

fn write_cell(xml: &mut String, r: &str, value: &Value, styles: &CellStyles, date1904: bool) {
    let s = styles.body;
    match value {
        Value::Empty => {
            let _ = write!(xml, "<c r=\"{r}\" s=\"{s}\"/>");
        }
        Value::String(text) => inline_string(xml, r, s, text),
        Value::Number(n) if n.is_finite() => {
            let _ = write!(xml, "<c r=\"{r}\" s=\"{s}\"><v>{n}</v></c>");
        }
        Value::Number(n) => inline_string(xml, r, s, &n.to_string()),
        Value::Bool(b) => {
            let _ = write!(xml, "<c r=\"{r}\" s=\"{s}\" t=\"b\"><v>{}</v></c>", u8::from(*b));
        }
        Value::DateTime(dt) => match excel_serial(dt, date1904) {
            Some(serial) => {
                let _ = write!(xml, "<c r=\"{r}\" s=\"{}\"><v>{serial}</v></c>", styles.datetime);
            }
            None => inline_string(xml, r, s, &value.to_string()),
        },
    }
}

fn inline_string(xml: &mut String, r: &str, s: usize, text: &str) {
    let _ = write!(
        xml,
        "<c r=\"{r}\" s=\"{s}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
        escape(text)
    );
}

fn cell_ref(col: usize, row: usize) -> String {
    format!("{}{}", column_name(col), row)
}

/// Zero-based column index to letters (0 -> A, 26 -> AA)
pub fn column_name(idx: usize) -> String {
    let mut letters = Vec::new();
    let mut n = idx + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Excel serial date (days since the workbook epoch); None before the epoch
pub fn excel_serial(dt: &NaiveDateTime, date1904: bool) -> Option<f64> {
    let epoch = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = dt.signed_duration_since(epoch.and_hms_opt(0, 0, 0)?).num_milliseconds();
    if millis < 0 {
        return None;
    }
    Some(millis as f64 / 86_400_000.0)
}
