//! Picks the latest versioned dye plan sheet out of a workbook
//!
//! Dye plan workbooks accumulate one sheet per revision ("Dye plan 8.9",
//! "Dye plan 8.22", ...). The version is the last number in the sheet name,
//! compared component by component, so 8.22 ranks above 8.9.

use regex::Regex;

use crate::consolidate::ConsolidateError;

/// The sheet chosen as the primary table
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSelection {
    /// Selected sheet name
    pub name: String,
    /// Position of the selected sheet in the workbook
    pub index: usize,
    /// Every sheet name that matched the prefix, in workbook order
    pub candidates: Vec<String>,
}

/// Select the primary sheet among `sheet_names` using a case-insensitive prefix
pub fn select_sheet(sheet_names: &[String], prefix: &str) -> Result<SheetSelection, ConsolidateError> {
    let prefix_lower = prefix.trim().to_lowercase();

    let candidates: Vec<(usize, &String)> = sheet_names
        .iter()
        .enumerate()
        .filter(|(_, name)| name.trim_start().to_lowercase().starts_with(&prefix_lower))
        .collect();

    let Some((index, name)) = candidates
        .iter()
        .map(|(idx, name)| (*idx, *name, sheet_version(name)))
        .max_by(|a, b| a.2.cmp(&b.2).then_with(|| a.1.cmp(b.1)))
        .map(|(idx, name, _)| (idx, name.clone()))
    else {
        return Err(ConsolidateError::NoMatchingSheet {
            prefix: prefix.to_string(),
            available: sheet_names.to_vec(),
        });
    };

    if candidates.len() > 1 {
        log::debug!(
            "Sheet prefix '{}' matched {} sheets, selected '{}'",
            prefix,
            candidates.len(),
            name
        );
    }

    Ok(SheetSelection {
        name,
        index,
        candidates: candidates.into_iter().map(|(_, n)| n.clone()).collect(),
    })
}

/// Extract the version of a sheet name: the last number in it, split on '.'
/// e.g., "Dye plan 8.22" -> [8, 22], "Dye plan (v3)" -> [3], "Dye plan" -> None
///
/// Unversioned names compare below every versioned one.
pub fn sheet_version(name: &str) -> Option<Vec<u64>> {
    let re = Regex::new(r"\d+(?:\.\d+)?").ok()?;
    let last = re.find_iter(name).last()?;

    Some(
        last.as_str()
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(u64::MAX))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_numeric_version_beats_string_order() {
        let sheets = names(&["Dye plan 8.9", "Dye plan 8.22", "Dye plan 8.3"]);
        let selection = select_sheet(&sheets, "dye plan").unwrap();
        assert_eq!(selection.name, "Dye plan 8.22");
        assert_eq!(selection.index, 1);
        assert_eq!(selection.candidates.len(), 3);
    }

    #[test]
    fn test_prefix_is_case_insensitive_and_filters() {
        let sheets = names(&["Summary", "DYE PLAN 7.1", "Stock 9.9", "dye plan 7.4"]);
        let selection = select_sheet(&sheets, "Dye plan").unwrap();
        assert_eq!(selection.name, "dye plan 7.4");
        assert_eq!(selection.index, 3);
        assert_eq!(selection.candidates, names(&["DYE PLAN 7.1", "dye plan 7.4"]));
    }

    #[test]
    fn test_single_candidate() {
        let sheets = names(&["Notes", "Dye plan"]);
        let selection = select_sheet(&sheets, "dye plan").unwrap();
        assert_eq!(selection.name, "Dye plan");
        assert_eq!(selection.index, 1);
    }

    #[test]
    fn test_no_matching_sheet() {
        let sheets = names(&["Sheet1", "Plan dye"]);
        let err = select_sheet(&sheets, "dye plan").unwrap_err();
        assert!(matches!(err, ConsolidateError::NoMatchingSheet { ref available, .. } if available.len() == 2));
    }

    #[test]
    fn test_versioned_beats_unversioned() {
        let sheets = names(&["Dye plan final", "Dye plan 1.1"]);
        assert_eq!(select_sheet(&sheets, "dye plan").unwrap().name, "Dye plan 1.1");
    }

    #[test]
    fn test_last_number_in_name_is_the_version() {
        assert_eq!(sheet_version("Dye plan 2024 rev 3.5"), Some(vec![3, 5]));
        assert_eq!(sheet_version("Dye plan 10"), Some(vec![10]));
        assert_eq!(sheet_version("Dye plan"), None);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let sheets = names(&["Dye plan 8.22 (b)", "Dye plan 8.22 (a)"]);
        assert_eq!(select_sheet(&sheets, "dye plan").unwrap().name, "Dye plan 8.22 (b)");
    }

    #[test]
    fn test_major_version_dominates() {
        let sheets = names(&["Dye plan 8.30", "Dye plan 9.1"]);
        assert_eq!(select_sheet(&sheets, "dye plan").unwrap().name, "Dye plan 9.1");
    }
}
