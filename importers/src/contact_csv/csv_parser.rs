/// Strips a UTF-8 byte order mark left by spreadsheet exports.
pub fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// Picks `;` when the header line has strictly more semicolons than commas.
pub fn detect_delimiter(header_line: &str) -> char {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();

    if semicolons > commas {
        ';'
    } else {
        ','
    }
}

/// Non-blank lines of the file, with `\r\n` endings tolerated.
pub fn split_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Splits one line into trimmed fields.
///
/// Double quotes open and close quoted sections, `""` inside a quoted section
/// is a literal quote, and the delimiter only separates fields outside quotes.
/// An unterminated quote runs to the end of the line.
pub fn parse_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Parses a line and pads it to `width` fields.
pub fn parse_row(line: &str, delimiter: char, width: usize) -> Vec<String> {
    let mut fields = parse_line(line, delimiter);
    if fields.len() < width {
        fields.resize(width, String::new());
    }
    fields
}
