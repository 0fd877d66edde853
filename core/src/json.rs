use crate::index::SearchResult;
use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write any serializable value as pretty JSON (2-space indent, UTF-8,
/// trailing newline). The sorted map types used throughout the index keep
/// keys in ascending order on the way out.
pub fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// One search hit in the shape the results file uses.
#[derive(Debug, Serialize)]
pub struct ResultRecord {
    pub count: u64,
    pub score: String,
    #[serde(rename = "where")]
    pub location: String,
}

impl From<&SearchResult> for ResultRecord {
    fn from(hit: &SearchResult) -> Self {
        Self {
            count: hit.match_count,
            score: format_score(hit.score),
            location: hit.location.clone(),
        }
    }
}

/// Fixed-point score rendering with eight fractional digits.
pub fn format_score(score: f64) -> String {
    format!("{score:.8}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_keep_eight_digits() {
        assert_eq!(format_score(1.0), "1.00000000");
        assert_eq!(format_score(1.0 / 3.0), "0.33333333");
        assert_eq!(format_score(0.5), "0.50000000");
    }
}
