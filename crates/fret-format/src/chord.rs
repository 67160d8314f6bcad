//! Chord-symbol and tab-line recognition.
//!
//! Shared by the ASCII and alpha-notation parsers. A chord symbol is a root
//! (A-G), an optional accidental, an optional quality, an optional extension,
//! and an optional slash bass: `Cmaj7`, `F#m`, `Bb7`, `Dsus4`, `Am7/G`.

use std::sync::LazyLock;

use regex::Regex;

/// Root + accidental + quality + extension + optional slash bass.
static CHORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-G][#b]?(?:maj|min|dim|aug|sus[24]?|add\d+|m|M)?\d*(?:/[A-G][#b]?)?$")
        .expect("chord pattern is valid")
});

/// Section headers commonly used in ASCII tabs (freetar-style segmentation).
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[?\s*(intro|verse|chorus|bridge|solo|outro|pre-chorus|interlude)(\s*\d+)?\s*\]?:?\s*$")
        .expect("section header pattern is valid")
});

/// Returns true if the token is a chord symbol.
pub fn is_chord_symbol(token: &str) -> bool {
    CHORD.is_match(token)
}

/// Returns true if every whitespace-separated token on the line is a chord
/// symbol (and there is at least one).
pub fn is_chord_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(is_chord_symbol)
}

/// Returns true if the line looks like a tab-fret line.
///
/// Tab lines are dominated by dashes, digits, and bar characters, e.g.
/// `e|--3--5--7--|`.
pub fn is_tab_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }

    let dashes = trimmed.chars().filter(|&c| c == '-').count();
    let tabbish = trimmed
        .chars()
        .filter(|c| matches!(c, '-' | '|' | '/' | '\\' | '~' | 'h' | 'p' | 'b' | 'r' | 'x') || c.is_ascii_digit())
        .count();

    dashes >= 3 && tabbish * 10 >= trimmed.len() * 7
}

/// Returns the canonical section name if the line is a recognized header.
pub fn section_header(line: &str) -> Option<String> {
    SECTION_HEADER.captures(line.trim()).map(|caps| {
        let name = &caps[1];
        let mut canonical = name.to_ascii_lowercase();
        if let Some(first) = canonical.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        match caps.get(2) {
            Some(num) => format!("{} {}", canonical, num.as_str().trim()),
            None => canonical,
        }
    })
}
