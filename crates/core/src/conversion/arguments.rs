//! Quoting and tokenising of the flat ffmpeg argument string.

use std::path::Path;

/// Wraps a path in double quotes for the argument string.
pub fn escape_path(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy().replace('"', "\\\""))
}

/// Escapes a path for use as a filter option value (e.g. `subtitles=`).
///
/// Backslashes become forward slashes and colons are escaped so the filter
/// option parser does not treat them as separators.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/").replace(':', "\\:");
    format!("'{}'", normalized)
}

/// Formats a float without trailing zeros (`1.5`, `0.6667`, `2`).
pub fn format_decimal(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Splits the argument string into argv entries.
///
/// Whitespace separates arguments except inside double quotes. Quotes are
/// removed and `\"` inside a quoted section yields a literal quote; any other
/// backslash is kept as is.
pub fn split_arguments(arguments: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = arguments.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    result.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        result.push(current);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_path_quotes() {
        assert_eq!(escape_path(Path::new("/media/in file.mp4")), "\"/media/in file.mp4\"");
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(
            escape_filter_path(Path::new("C:\\subs\\movie.srt")),
            "'C\\:/subs/movie.srt'"
        );
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(1.5), "1.5");
        assert_eq!(format_decimal(2.0), "2");
        assert_eq!(format_decimal(1.0 / 1.5), "0.6667");
        assert_eq!(format_decimal(0.0), "0");
    }

    #[test]
    fn test_split_respects_quotes() {
        let args = split_arguments(
            "-i \"/media/my movie.mp4\" -filter_complex \"[0] overlay=0:0 \" -y \"out.mp4\"",
        );
        assert_eq!(
            args,
            vec![
                "-i",
                "/media/my movie.mp4",
                "-filter_complex",
                "[0] overlay=0:0 ",
                "-y",
                "out.mp4"
            ]
        );
    }

    #[test]
    fn test_split_keeps_empty_quoted_argument() {
        assert_eq!(split_arguments("-metadata title=\"\""), vec!["-metadata", "title="]);
        assert_eq!(split_arguments("a \"\" b"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_unescapes_inner_quotes() {
        let path = Path::new("/tmp/say \"hi\".mp4");
        let args = split_arguments(&format!("-i {}", escape_path(path)));
        assert_eq!(args, vec!["-i", "/tmp/say \"hi\".mp4"]);
    }
}
