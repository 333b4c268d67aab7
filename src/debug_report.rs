use rulecov::{SynthesisDetails, SynthesizedExample, TokenSummary};
use std::collections::BTreeSet;

use ansi::{Palette, Style};

mod ansi {
    /// Terminal styles used by the report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Style {
        Bold,
        Dim,
        Red,
        Green,
        Yellow,
        Blue,
        Cyan,
        Gray,
    }

    impl Style {
        fn code(self) -> &'static str {
            match self {
                Style::Bold => "1",
                Style::Dim => "2",
                Style::Red => "31",
                Style::Green => "32",
                Style::Yellow => "33",
                Style::Blue => "34",
                Style::Cyan => "36",
                Style::Gray => "90",
            }
        }
    }

    /// Applies styles when color output is on, passes text through otherwise.
    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, style: Style) -> String {
            if self.enabled { format!("\x1b[{}m{}\x1b[0m", style.code(), s.as_ref()) } else { s.as_ref().to_string() }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn paint_respects_enabled_flag() {
            assert_eq!(Palette::new(false).paint("x", Style::Red), "x");
            assert_eq!(Palette::new(true).paint("x", Style::Red), "\x1b[31mx\x1b[0m");
            assert_eq!(Palette::new(true).paint("x", Style::Gray), "\x1b[90mx\x1b[0m");
        }
    }
}

/// Print the synthesis trace of one rule, and its coverage when known.
pub fn print_rule(
    example: &SynthesizedExample,
    details: &SynthesisDetails,
    covered_by: Option<&BTreeSet<String>>,
    color: bool,
) {
    let palette = Palette::new(color);
    let title = palette.paint(format!("⚙  Rule: {}", example.rule_id), Style::Cyan);
    println!("\n{}", palette.paint(title, Style::Bold));

    println!("\n{}", palette.paint("━━━ Tokens ━━━", Style::Gray));
    for token in &details.tokens {
        println!("  {}", fmt_token(token, &palette));
    }

    println!("\n{}", palette.paint("━━━ Example ━━━", Style::Gray));
    if example.sentence.is_empty() {
        println!("{}", palette.paint("  (empty)", Style::Dim));
    } else {
        let sentence = palette.paint(format!("\"{}\"", example.sentence), Style::Green);
        println!("  {}", palette.paint(sentence, Style::Bold));
    }
    if !example.is_complete() {
        let missing: Vec<String> = example.missing().iter().map(|i| format!("#{i}")).collect();
        println!("  {} {}", palette.paint("incomplete:", Style::Yellow), palette.paint(missing.join(", "), Style::Dim));
        println!("\n{}", palette.paint("Possible reasons:", Style::Yellow));
        println!("  • No dictionary word satisfies the token (check tags and exceptions)");
        println!("  • The search hit its pass limit (try --passes)");
        println!("  • A back-reference points at a token without an example");
    }

    if let Some(covered_by) = covered_by {
        println!("\n{}", palette.paint("━━━ Coverage ━━━", Style::Gray));
        if covered_by.is_empty() {
            println!("  {}", palette.paint("✗ novel (no existing rule fires)", Style::Blue));
        } else {
            for id in covered_by {
                println!("  {} {}", palette.paint("✓", Style::Green), palette.paint(id, Style::Cyan));
            }
        }
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", Style::Gray));
    println!(
        "  Total: {}  │  Candidates: {}",
        palette.paint(format!("{:?}", details.total), Style::Green),
        palette.paint(details.candidates.to_string(), Style::Blue),
    );
    println!();
}

fn fmt_token(token: &TokenSummary, palette: &Palette) -> String {
    let example = match &token.example {
        Some(word) if word.is_empty() => palette.paint("(none)", Style::Dim),
        Some(word) => palette.paint(palette.paint(word, Style::Green), Style::Bold),
        None => palette.paint("✗ no example", Style::Red),
    };
    let mut line = format!(
        "{} {} {} {}",
        palette.paint(format!("[{}]", token.index), Style::Gray),
        palette.paint(format!("{:<14}", token.strategy.name()), Style::Blue),
        palette.paint("│", Style::Dim),
        example,
    );
    if token.candidates > 0 {
        let stats = format!("  ({} candidates, {} resets, {:?})", token.candidates, token.resets, token.duration);
        line.push_str(&palette.paint(stats, Style::Dim));
    }
    line
}
