//! Markdown helpers.

/// A GitHub-flavoured table. Pipes inside cells are escaped.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&row_line(headers.iter().map(|h| h.to_string())));
    out.push_str(&row_line(headers.iter().map(|_| "---".to_string())));
    for row in rows {
        out.push_str(&row_line(row.iter().cloned()));
    }
    out
}

fn row_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

/// `3h 05m 10s`, `12m 00s`, `45s`.
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    let (h, m, s) = (s / 3600, (s % 3600) / 60, s % 60);
    if h > 0 {
        format!("{sign}{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{sign}{m}m {s:02}s")
    } else {
        format!("{sign}{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_layout() {
        let md = table(&["A", "B"], &[vec!["1".into(), "x|y".into()]]);
        assert_eq!(md, "| A | B |\n| --- | --- |\n| 1 | x\\|y |\n");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(720), "12m 00s");
        assert_eq!(format_duration(11_110), "3h 05m 10s");
    }
}
