//! Workbook ingestion and emission

pub mod package;
pub mod reader;
pub mod sheet_part;
pub mod styling;
pub mod writer;

pub use reader::{list_sheets, read_sheet, read_single_sheet_dataset};
pub use styling::StyleConfig;
pub use writer::{render_workbook, replace_sheet_in_workbook};

#[cfg(test)]
pub(crate) mod test_support {
    use rust_xlsxwriter::Workbook;

    /// Build an in-memory workbook; "" cells are left blank
    pub fn workbook_bytes(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    if !cell.is_empty() {
                        worksheet.write_string(r as u32, c as u16, *cell).unwrap();
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }
}
