//! Export file names.
//!
//! Whatever the user typed, the download gets a non-empty name ending in
//! `.pdf`. Normalising twice gives the same result as normalising once.

use chrono::{Local, NaiveDate};

/// Extension every exported file name ends with.
pub const PDF_EXTENSION: &str = ".pdf";

/// `document-YYYYMMDD.pdf` for the given date.
pub fn default_file_name(date: NaiveDate) -> String {
    format!("document-{}{}", date.format("%Y%m%d"), PDF_EXTENSION)
}

/// [`default_file_name`] for today's local date.
pub fn default_file_name_today() -> String {
    default_file_name(Local::now().date_naive())
}

/// Trim `input`, fall back to `default` when blank, and make sure the name ends in `.pdf`.
///
/// The extension check is case-insensitive: `"Report.PDF"` is kept as is.
/// A blank `default` falls back to today's date-based name.
pub fn normalize_file_name(input: &str, default: &str) -> String {
    let trimmed = input.trim();
    let name = if !trimmed.is_empty() {
        trimmed.to_string()
    } else if !default.trim().is_empty() {
        default.trim().to_string()
    } else {
        default_file_name_today()
    };

    if has_pdf_extension(&name) {
        name
    } else {
        format!("{name}{PDF_EXTENSION}")
    }
}

fn has_pdf_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(PDF_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan_first() -> String {
        default_file_name(NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"))
    }

    #[test]
    fn default_uses_compact_date() {
        assert_eq!(jan_first(), "document-20240101.pdf");
    }

    #[test]
    fn today_default_has_expected_shape() {
        let name = default_file_name_today();
        assert!(name.starts_with("document-"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), "document-YYYYMMDD.pdf".len());
    }

    #[test]
    fn trims_and_appends_extension() {
        assert_eq!(normalize_file_name("  my report  ", &jan_first()), "my report.pdf");
    }

    #[test]
    fn empty_uses_default() {
        assert_eq!(normalize_file_name("", &jan_first()), "document-20240101.pdf");
        assert_eq!(normalize_file_name(" \t\n", &jan_first()), "document-20240101.pdf");
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(normalize_file_name("Report.PDF", &jan_first()), "Report.PDF");
        assert_eq!(normalize_file_name("notes.Pdf ", &jan_first()), "notes.Pdf");
    }

    #[test]
    fn other_extensions_get_pdf_appended() {
        assert_eq!(normalize_file_name("notes.md", &jan_first()), "notes.md.pdf");
        assert_eq!(normalize_file_name("pdf", &jan_first()), "pdf.pdf");
    }

    #[test]
    fn blank_default_still_yields_a_name() {
        let name = normalize_file_name("", "   ");
        assert!(name.starts_with("document-"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn default_without_extension_is_completed() {
        assert_eq!(normalize_file_name("", "export"), "export.pdf");
    }

    #[test]
    fn normalization_is_idempotent() {
        let default = jan_first();
        let inputs = [
            "",
            "   ",
            "  my report  ",
            "a.pdf",
            "A.PDF",
            "x.pdf.txt",
            ".pdf",
            "  .PdF  ",
            "ünïcødé name",
            "name with trailing dot.",
            "\u{3000}wide space\u{3000}",
        ];
        for input in inputs {
            let once = normalize_file_name(input, &default);
            let twice = normalize_file_name(&once, &default);
            assert_eq!(once, twice, "input {input:?}");
            assert!(!once.is_empty());
            assert!(once.to_ascii_lowercase().ends_with(".pdf"), "input {input:?}");
        }
    }
}
