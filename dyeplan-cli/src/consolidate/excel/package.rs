//! Part-level access to an xlsx package
//!
//! An xlsx file is a zip of XML parts. Rewriting one worksheet means replacing
//! that part (plus the styles it needs) and raw-copying every other entry, so
//! untouched sheets keep their formulas, formats, and layout byte for byte.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use anyhow::{Context, Result};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub const CALC_CHAIN_PART: &str = "xl/calcChain.xml";
const DEFAULT_STYLES_PART: &str = "xl/styles.xml";

/// A sheet as listed in the workbook part
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    /// Relationship id pointing at the worksheet part
    pub rel_id: String,
}

/// The bits of `xl/workbook.xml` needed to locate and encode a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookInfo {
    pub sheets: Vec<SheetEntry>,
    /// Dates are serials from 1904-01-01 instead of 1899-12-30
    pub date1904: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Opened xlsx package backed by borrowed bytes
pub struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> Package<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .context("Failed to open workbook (is it an .xlsx file?)")?;
        Ok(Package { archive })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .with_context(|| format!("Workbook has no '{}' part", name))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read '{}' part", name))?;
        Ok(bytes)
    }

    pub fn workbook(&mut self) -> Result<WorkbookInfo> {
        let xml = self.read_part(WORKBOOK_PART)?;
        parse_workbook(&xml)
    }

    pub fn workbook_relationships(&mut self) -> Result<Vec<Relationship>> {
        let xml = self.read_part(WORKBOOK_RELS_PART)?;
        parse_relationships(&xml)
    }

    /// Part name of the worksheet behind `rel_id`
    pub fn sheet_part(&mut self, rel_id: &str) -> Result<String> {
        self.workbook_relationships()?
            .into_iter()
            .find(|r| r.id == rel_id)
            .map(|r| resolve_target(WORKBOOK_PART, &r.target))
            .with_context(|| format!("Workbook relationships have no '{}' entry", rel_id))
    }

    /// Part name of the shared style sheet
    pub fn styles_part(&mut self) -> Result<String> {
        let styles = self
            .workbook_relationships()?
            .into_iter()
            .find(|r| r.rel_type.ends_with("/styles"))
            .map(|r| resolve_target(WORKBOOK_PART, &r.target));
        Ok(styles.unwrap_or_else(|| DEFAULT_STYLES_PART.to_string()))
    }

    /// Write a new package: `replaced` parts get new content, `dropped` parts
    /// are left out, everything else is copied without recompression
    pub fn rewrite(mut self, replaced: &HashMap<String, Vec<u8>>, dropped: &[&str]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            let name = file.name().to_string();

            if dropped.contains(&name.as_str()) {
                log::debug!("Dropping part '{}'", name);
                continue;
            }

            match replaced.get(&name) {
                Some(bytes) => {
                    zip.start_file(name, options)?;
                    zip.write_all(bytes)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Value of the attribute whose local name is `key` (so `r:id` matches `id`)
pub fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(Some(unescape(raw)?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_workbook(xml: &[u8]) -> Result<WorkbookInfo> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut info = WorkbookInfo::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"sheet" => {
                    let name = attr_value(e, b"name")?.context("Sheet entry without a name")?;
                    let rel_id = attr_value(e, b"id")?
                        .with_context(|| format!("Sheet '{}' has no relationship id", name))?;
                    info.sheets.push(SheetEntry { name, rel_id });
                }
                b"workbookPr" => {
                    info.date1904 = matches!(attr_value(e, b"date1904")?.as_deref(), Some("1" | "true"));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"Relationship" => {
                relationships.push(Relationship {
                    id: attr_value(e, b"Id")?.unwrap_or_default(),
                    rel_type: attr_value(e, b"Type")?.unwrap_or_default(),
                    target: attr_value(e, b"Target")?.unwrap_or_default(),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

/// Resolve a relationship target against the part that owns the relationship
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let base = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
            format!("{}/{}", base, target)
        }
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Drop empty elements named `element` for which `matches` is true
fn remove_elements<F>(xml: &[u8], element: &[u8], mut matches: F) -> Result<Vec<u8>>
where
    F: FnMut(&BytesStart<'_>) -> Result<bool>,
{
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buf = Vec::new();
    let mut skipping = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Eof => break,
            Event::Empty(ref e) if e.local_name().as_ref() == element => {
                if !matches(e)? {
                    writer.write_event(Event::Empty(e.to_owned()))?;
                }
            }
            Event::Start(ref e) if e.local_name().as_ref() == element => {
                if matches(e)? {
                    skipping = true;
                } else {
                    writer.write_event(Event::Start(e.to_owned()))?;
                }
            }
            Event::End(ref e) if skipping && e.local_name().as_ref() == element => {
                skipping = false;
            }
            _ if skipping => {}
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Remove the calcChain override from `[Content_Types].xml`
pub fn content_types_without_calc_chain(xml: &[u8]) -> Result<Vec<u8>> {
    remove_elements(xml, b"Override", |e| {
        Ok(attr_value(e, b"PartName")?.is_some_and(|p| p.ends_with("/calcChain.xml")))
    })
}

/// Remove the calcChain relationship from the workbook relationships
pub fn relationships_without_calc_chain(xml: &[u8]) -> Result<Vec<u8>> {
    remove_elements(xml, b"Relationship", |e| {
        let rel_type = attr_value(e, b"Type")?.unwrap_or_default();
        let target = attr_value(e, b"Target")?.unwrap_or_default();
        Ok(rel_type.ends_with("/calcChain") || target.ends_with("calcChain.xml"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::excel::test_support::workbook_bytes;

    #[test]
    fn test_workbook_sheets_and_parts() {
        let bytes = workbook_bytes(&[("Summary", &[&["a"]]), ("Dye plan 8.22", &[&["b"]])]);
        let mut package = Package::open(&bytes).unwrap();

        let info = package.workbook().unwrap();
        let names: Vec<_> = info.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Summary", "Dye plan 8.22"]);
        assert!(!info.date1904);

        assert_eq!(package.sheet_part(&info.sheets[1].rel_id).unwrap(), "xl/worksheets/sheet2.xml");
        assert_eq!(package.styles_part().unwrap(), "xl/styles.xml");
        assert!(package.has_part("xl/worksheets/sheet1.xml"));
        assert!(!package.has_part(CALC_CHAIN_PART));
    }

    #[test]
    fn test_parse_workbook_escaped_names_and_1904() {
        let xml = br#"<?xml version="1.0"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="1"/>
  <sheets>
    <sheet name="R&amp;D" sheetId="1" r:id="rId1"/>
    <sheet name="Dye plan 9.1" sheetId="2" r:id="rId7"/>
  </sheets>
</workbook>"#;

        let info = parse_workbook(xml).unwrap();
        assert!(info.date1904);
        assert_eq!(info.sheets[0].name, "R&D");
        assert_eq!(info.sheets[1], SheetEntry { name: "Dye plan 9.1".to_string(), rel_id: "rId7".to_string() });
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target(WORKBOOK_PART, "worksheets/sheet3.xml"), "xl/worksheets/sheet3.xml");
        assert_eq!(resolve_target(WORKBOOK_PART, "/xl/worksheets/sheet3.xml"), "xl/worksheets/sheet3.xml");
        assert_eq!(resolve_target(WORKBOOK_PART, "./styles.xml"), "xl/styles.xml");
    }

    #[test]
    fn test_calc_chain_entries_removed() {
        let content_types = br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/xl/workbook.xml" ContentType="a"/><Override PartName="/xl/calcChain.xml" ContentType="b"/></Types>"#;
        let out = String::from_utf8(content_types_without_calc_chain(content_types).unwrap()).unwrap();
        assert!(out.contains("/xl/workbook.xml"));
        assert!(!out.contains("calcChain"));

        let rels = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain" Target="calcChain.xml"/></Relationships>"#;
        let out = String::from_utf8(relationships_without_calc_chain(rels).unwrap()).unwrap();
        assert!(out.contains("rId1"));
        assert!(!out.contains("rId9"));
    }

    #[test]
    fn test_rewrite_copies_untouched_parts() {
        let bytes = workbook_bytes(&[("Summary", &[&["a"]]), ("Notes", &[&["b"]])]);
        let mut replaced = HashMap::new();
        replaced.insert("xl/worksheets/sheet2.xml".to_string(), b"<worksheet/>".to_vec());

        let out = Package::open(&bytes).unwrap().rewrite(&replaced, &[]).unwrap();

        let mut before = Package::open(&bytes).unwrap();
        let mut after = Package::open(&out).unwrap();
        assert_eq!(
            after.read_part("xl/worksheets/sheet1.xml").unwrap(),
            before.read_part("xl/worksheets/sheet1.xml").unwrap()
        );
        assert_eq!(after.read_part("xl/worksheets/sheet2.xml").unwrap(), b"<worksheet/>");
    }
}
