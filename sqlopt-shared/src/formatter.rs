/// SQL formatting for display and analysis input
///
/// This module normalizes a SQL string before it is shown to the user or sent
/// for analysis. Formatting is deliberately shallow: it uppercases a fixed set
/// of keywords and tidies whitespace around newlines, commas and parentheses.
/// It never reorders or re-indents clauses.
///
/// # Protected Regions
///
/// The input is first split by a small lexer into code and protected regions.
/// Protected regions are copied verbatim:
///
/// - `'string literals'` (with `''` escapes)
/// - `"quoted identifiers"`, `` `backtick identifiers` ``, `[bracket identifiers]`
/// - `-- line comments` (up to, not including, the newline)
/// - `/* block comments */`
///
/// An unterminated region extends to the end of the input.
///
/// # Properties
///
/// - `format_sql(format_sql(s)) == format_sql(s)`
/// - Identifiers, literals and comments keep their original spelling
///
/// # Example
///
/// ```
/// use sqlopt_shared::formatter::format_sql;
///
/// let formatted = format_sql("select * from Orders where id=1");
/// assert_eq!(formatted, "SELECT * FROM Orders WHERE id=1");
///
/// // Keywords inside literals are left alone
/// let formatted = format_sql("select 'select' as kw");
/// assert_eq!(formatted, "SELECT 'select' AS kw");
/// ```

/// Single-word keywords uppercased by the formatter
pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "ON", "AND", "OR", "NOT", "IN", "EXISTS", "BETWEEN",
    "LIKE", "IS", "NULL", "HAVING", "ASC", "DESC", "LIMIT", "OFFSET", "UNION", "INTERSECT",
    "EXCEPT", "WITH", "AS", "CASE", "WHEN", "THEN", "ELSE", "END", "IF", "DISTINCT", "ALL",
    "COUNT", "SUM", "AVG", "MIN", "MAX", "SUBSTRING", "CONCAT", "COALESCE", "CAST", "CONVERT",
    "INSERT", "UPDATE", "DELETE", "CREATE", "DROP", "ALTER", "TABLE", "INDEX", "VIEW",
];

/// Two-word keywords, matched when the words are separated only by whitespace
///
/// `UNION ALL` is covered by the single-word list since both halves are keywords.
pub const KEYWORD_PAIRS: &[(&str, &str)] = &[
    ("LEFT", "JOIN"),
    ("RIGHT", "JOIN"),
    ("INNER", "JOIN"),
    ("OUTER", "JOIN"),
    ("FULL", "JOIN"),
    ("CROSS", "JOIN"),
    ("GROUP", "BY"),
    ("ORDER", "BY"),
];

/// A region of the input as classified by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// SQL text subject to formatting
    Code(&'a str),

    /// Literal, quoted identifier or comment, copied verbatim
    Protected(&'a str),
}

/// Formats a SQL string
///
/// Empty and whitespace-only input is returned unchanged. Otherwise keywords
/// are uppercased, whitespace is normalized, and the result is trimmed.
pub fn format_sql(sql: &str) -> String {
    if sql.trim().is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len());
    for segment in split_segments(sql) {
        match segment {
            Segment::Protected(text) => out.push_str(text),
            Segment::Code(text) => out.push_str(&tidy_whitespace(&uppercase_keywords(text))),
        }
    }

    out.trim().to_string()
}

/// Splits SQL into code and protected segments
///
/// All delimiters are ASCII, so byte offsets found here are always valid
/// char boundaries.
fn split_segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut code_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let end = match bytes[pos] {
            b'\'' | b'"' | b'`' => Some(scan_quoted(bytes, pos, bytes[pos])),
            b'[' => Some(scan_until(bytes, pos + 1, b"]")),
            b'-' if bytes.get(pos + 1) == Some(&b'-') => Some(scan_line_comment(bytes, pos)),
            b'/' if bytes.get(pos + 1) == Some(&b'*') => Some(scan_until(bytes, pos + 2, b"*/")),
            _ => None,
        };

        match end {
            Some(end) => {
                if code_start < pos {
                    segments.push(Segment::Code(&sql[code_start..pos]));
                }
                segments.push(Segment::Protected(&sql[pos..end]));
                pos = end;
                code_start = end;
            }
            None => pos += 1,
        }
    }

    if code_start < bytes.len() {
        segments.push(Segment::Code(&sql[code_start..]));
    }

    segments
}

/// Returns the end offset (exclusive) of a quoted region starting at `start`
///
/// A doubled delimiter inside the region is an escape, not a terminator.
fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut pos = start + 1;
    while pos < bytes.len() {
        if bytes[pos] == quote {
            if bytes.get(pos + 1) == Some(&quote) {
                pos += 2;
                continue;
            }
            return pos + 1;
        }
        pos += 1;
    }
    bytes.len()
}

/// Returns the end offset just past `terminator`, or the input length
fn scan_until(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    bytes[from.min(bytes.len())..]
        .windows(terminator.len())
        .position(|window| window == terminator)
        .map(|offset| from + offset + terminator.len())
        .unwrap_or(bytes.len())
}

/// Returns the offset of the newline ending a `--` comment, or the input length
fn scan_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| start + offset)
        .unwrap_or(bytes.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Splits code into alternating word and non-word runs
fn tokenize_words(code: &str) -> Vec<(bool, &str)> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (offset, c) in code.char_indices() {
        let word = is_word_char(c);
        match current {
            Some(kind) if kind == word => {}
            Some(kind) => {
                tokens.push((kind, &code[start..offset]));
                start = offset;
                current = Some(word);
            }
            None => current = Some(word),
        }
    }

    if let Some(kind) = current {
        tokens.push((kind, &code[start..]));
    }

    tokens
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(word))
}

fn is_pair(first: &str, second: &str) -> bool {
    KEYWORD_PAIRS
        .iter()
        .any(|(a, b)| a.eq_ignore_ascii_case(first) && b.eq_ignore_ascii_case(second))
}

/// Uppercases keywords on word boundaries
fn uppercase_keywords(code: &str) -> String {
    let tokens = tokenize_words(code);
    let mut upper = vec![false; tokens.len()];

    for (i, &(is_word, text)) in tokens.iter().enumerate() {
        if !is_word {
            continue;
        }
        if is_keyword(text) {
            upper[i] = true;
        }
        if let (Some(&(false, gap)), Some(&(true, next))) = (tokens.get(i + 1), tokens.get(i + 2)) {
            if gap.chars().all(char::is_whitespace) && is_pair(text, next) {
                upper[i] = true;
                upper[i + 2] = true;
            }
        }
    }

    tokens
        .iter()
        .zip(upper)
        .map(|(&(_, text), upper)| {
            if upper {
                text.to_ascii_uppercase()
            } else {
                text.to_string()
            }
        })
        .collect()
}

/// Applies the whitespace rules in order
fn tidy_whitespace(code: &str) -> String {
    // Runs of spaces and tabs become one space
    let mut collapsed = String::with_capacity(code.len());
    let mut in_blank = false;
    for c in code.chars() {
        if c == ' ' || c == '\t' {
            if !in_blank {
                collapsed.push(' ');
            }
            in_blank = true;
        } else {
            collapsed.push(c);
            in_blank = false;
        }
    }

    // No spaces on either side of a line break (`\n` or `\r\n`)
    let line_count = collapsed.split('\n').count();
    let lines: Vec<String> = collapsed
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            let line = if i > 0 { line.trim_start_matches(' ') } else { line };
            if i + 1 == line_count {
                return line.to_string();
            }
            let line = line.trim_end_matches(' ');
            match line.strip_suffix('\r') {
                Some(body) => format!("{}\r", body.trim_end_matches(' ')),
                None => line.to_string(),
            }
        })
        .collect();
    let joined = lines.join("\n");

    let no_space_before_comma = joined.replace(" ,", ",");

    let mut spaced = String::with_capacity(no_space_before_comma.len());
    let mut chars = no_space_before_comma.chars().peekable();
    while let Some(c) = chars.next() {
        spaced.push(c);
        if c == ',' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    spaced.push(' ');
                }
            }
        }
    }

    spaced.replace("( ", "(").replace(" )", ")")
}
