//! Normalization applied once at load time to every table, and to ids arriving over HTTP.
//!
//! Every join in the service compares normalized ids, so the same function must be used
//! on both sides or joins silently come back empty.

/// Known header misspellings seen across dataset versions, keyed by their normalized form.
const COLUMN_ALIASES: &[(&str, &str)] = &[("work steam", "work stream"), ("jobid", "job id")];

/// Strips thousands separators and surrounding whitespace from a job id.
pub fn normalize_job_id(raw: &str) -> String {
    raw.replace(',', "").trim().to_string()
}

/// Normalizes a header cell: trimmed, lower-cased, inner whitespace collapsed,
/// then known misspellings renamed.
pub fn normalize_column(raw: &str) -> String {
    let collapsed = raw
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    COLUMN_ALIASES
        .iter()
        .find(|(from, _)| *from == collapsed)
        .map(|(_, to)| to.to_string())
        .unwrap_or(collapsed)
}

/// Parses a percentage cell. Blank, non-numeric and non-finite cells are missing values.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trimmed text, `None` when blank.
pub fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Decodes file bytes as UTF-8 (dropping a BOM), falling back to Latin-1.
///
/// The jobs dataset is exported from Excel and is frequently Latin-1 encoded.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_strips_commas_and_whitespace() {
        assert_eq!(normalize_job_id(" 1,234 "), "1234");
        assert_eq!(normalize_job_id("12,345,678"), "12345678");
        assert_eq!(normalize_job_id("JR-77"), "JR-77");
    }

    #[test]
    fn test_column_is_trimmed_and_lowercased() {
        assert_eq!(normalize_column("  Job ID "), "job id");
        assert_eq!(normalize_column("Similarity  %"), "similarity %");
    }

    #[test]
    fn test_column_misspelling_is_renamed() {
        assert_eq!(normalize_column("Work Steam"), "work stream");
        assert_eq!(normalize_column("work stream"), "work stream");
    }

    #[test]
    fn test_column_bom_is_dropped() {
        assert_eq!(normalize_column("\u{feff}Job ID"), "job id");
    }

    #[test]
    fn test_parse_percent_variants() {
        assert_eq!(parse_percent("87.5"), Some(87.5));
        assert_eq!(parse_percent(" 90 % "), Some(90.0));
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("n/a"), None);
        assert_eq!(parse_percent("NaN"), None);
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // "Café" in Latin-1
        let bytes = [0x43, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text(&bytes), "Café");
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        assert_eq!(decode_text("\u{feff}Job ID".as_bytes()), "Job ID");
    }
}
