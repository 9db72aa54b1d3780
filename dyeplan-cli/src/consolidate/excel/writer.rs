//! Write datasets to styled workbooks

use std::collections::HashMap;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::consolidate::{ConsolidateError, Dataset, Value};

use super::package::{
    CALC_CHAIN_PART, CONTENT_TYPES_PART, Package, WORKBOOK_RELS_PART, content_types_without_calc_chain,
    relationships_without_calc_chain,
};
use super::sheet_part::{append_cell_styles, render_sheet_xml};
use super::styling::{StyleConfig, column_widths};

/// Render `dataset` as a one-sheet workbook
pub fn render_workbook(dataset: &Dataset, sheet_name: &str, style: &StyleConfig) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_dataset_sheet(worksheet, sheet_name, dataset, style)?;

    workbook.save_to_buffer().context("Failed to render workbook")
}

/// Rewrite `sheet_name` inside `original` with `dataset`
///
/// Only the sheet's own part and the style sheet change; every other part is
/// copied byte for byte. The calculation chain is dropped and Excel rebuilds it
/// on load.
pub fn replace_sheet_in_workbook(
    original: &[u8],
    sheet_name: &str,
    dataset: &Dataset,
    style: &StyleConfig,
) -> Result<Vec<u8>> {
    let mut package = Package::open(original)?;
    let workbook = package.workbook()?;

    let Some(entry) = workbook.sheets.iter().find(|s| s.name == sheet_name) else {
        return Err(ConsolidateError::SheetNotFoundAtEmission {
            sheet: sheet_name.to_string(),
        }
        .into());
    };

    let sheet_part = package.sheet_part(&entry.rel_id)?;
    let styles_part = package.styles_part()?;

    let (styles_xml, cell_styles) = append_cell_styles(&package.read_part(&styles_part)?, style)
        .with_context(|| format!("Failed to extend styles in '{}'", styles_part))?;
    let sheet_xml = render_sheet_xml(dataset, &cell_styles, style.width_padding, workbook.date1904);

    let mut replaced = HashMap::new();
    replaced.insert(sheet_part.clone(), sheet_xml.into_bytes());
    replaced.insert(styles_part, styles_xml);

    let mut dropped = Vec::new();
    if package.has_part(CALC_CHAIN_PART) {
        let content_types = content_types_without_calc_chain(&package.read_part(CONTENT_TYPES_PART)?)?;
        let relationships = relationships_without_calc_chain(&package.read_part(WORKBOOK_RELS_PART)?)?;
        replaced.insert(CONTENT_TYPES_PART.to_string(), content_types);
        replaced.insert(WORKBOOK_RELS_PART.to_string(), relationships);
        dropped.push(CALC_CHAIN_PART);
    }

    log::info!(
        "Replaced sheet '{}' ({}), {} other sheet(s) untouched",
        sheet_name,
        sheet_part,
        workbook.sheets.len() - 1
    );

    package
        .rewrite(&replaced, &dropped)
        .with_context(|| format!("Failed to write workbook with replaced sheet '{}'", sheet_name))
}

fn write_dataset_sheet(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    dataset: &Dataset,
    style: &StyleConfig,
) -> Result<()> {
    worksheet
        .set_name(sheet_name)
        .with_context(|| format!("Invalid sheet name: {}", sheet_name))?;

    let header_format = style.header_format();
    let body_format = style.body_format();
    let datetime_format = style.datetime_format();

    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }

    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let format = if matches!(value, Value::DateTime(_)) {
                &datetime_format
            } else {
                &body_format
            };
            write_value(worksheet, row_num, col as u16, value, format)?;
        }
    }

    for (col, width) in column_widths(dataset, style.width_padding).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width)?;
    }

    Ok(())
}

fn write_value(ws: &mut Worksheet, row: u32, col: u16, value: &Value, format: &Format) -> Result<()> {
    match value {
        Value::Empty => { ws.write_blank(row, col, format)?; }
        Value::String(s) => { ws.write_string_with_format(row, col, s, format)?; }
        Value::Number(n) => { ws.write_number_with_format(row, col, *n, format)?; }
        Value::Bool(b) => { ws.write_boolean_with_format(row, col, *b, format)?; }
        Value::DateTime(dt) => { ws.write_datetime_with_format(row, col, dt, format)?; }
    }
    Ok(())
}
