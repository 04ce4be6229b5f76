//! Lists, tables, fenced code and inline definitions.
//!
//! Lists and tables are found by a line scan that skips fenced code, so a
//! shell snippet full of pipes is not reported as a table.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// All content structures found in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentStructures {
    /// Bullet and numbered lists.
    pub lists: Vec<ListBlock>,
    /// Pipe tables.
    pub tables: Vec<TableBlock>,
    /// Fenced code blocks.
    pub code_blocks: Vec<CodeBlock>,
    /// Term/definition pairs.
    pub definitions: Vec<DefinitionEntry>,
}

impl ContentStructures {
    /// Number of structure families present (0 to 4).
    #[must_use]
    pub fn kinds_present(&self) -> usize {
        [
            !self.lists.is_empty(),
            !self.tables.is_empty(),
            !self.code_blocks.is_empty(),
            !self.definitions.is_empty(),
        ]
        .into_iter()
        .filter(|&present| present)
        .count()
    }

    /// Spans of code blocks and tables, sorted by start.
    #[must_use]
    pub fn protected_spans(&self) -> Vec<(usize, usize)> {
        let mut spans: Vec<_> = self
            .code_blocks
            .iter()
            .map(|c| (c.start, c.end))
            .chain(self.tables.iter().map(|t| (t.start, t.end)))
            .collect();
        spans.sort_unstable();
        spans
    }
}

/// Consecutive list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListBlock {
    /// Byte offset of the first item.
    pub start: usize,
    /// Byte offset past the last item.
    pub end: usize,
    /// Number of items.
    pub item_count: usize,
    /// Whether the first item is numbered.
    pub ordered: bool,
}

/// Consecutive pipe-delimited lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBlock {
    /// Byte offset of the first row.
    pub start: usize,
    /// Byte offset past the last row.
    pub end: usize,
    /// Data and header rows, separator rows excluded.
    pub rows: usize,
    /// Cells in the first row.
    pub columns: usize,
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    /// Byte offset of the opening fence.
    pub start: usize,
    /// Byte offset past the closing fence.
    pub end: usize,
    /// Info string after the opening fence.
    pub language: Option<String>,
    /// Lines between the fences.
    pub line_count: usize,
}

/// How a definition was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionStyle {
    /// `Term: definition`
    Colon,
    /// `Term - definition`
    Dash,
    /// `Long Name (ACRONYM)`
    Parenthetical,
}

/// A term and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionEntry {
    /// The defined term.
    pub term: String,
    /// The definition text.
    pub definition: String,
    /// Byte offset of the match.
    pub position: usize,
    /// Which style matched.
    pub style: DefinitionStyle,
}

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:([-*+•])|(\d+)[.)])[ \t]+\S").expect("list item pattern")
});
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s|:\-]+$").expect("table separator pattern"));
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^[ \t]*```([^\n`]*)\n(.*?)^[ \t]*```[ \t]*$").expect("code fence pattern")
});
static COLON_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*)?([A-Z][\w \-]{1,40}?)(?:\*\*)?:[ \t]+(\S[^\n]{5,})$")
        .expect("colon definition pattern")
});
static DASH_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*)?([A-Za-z][\w ]{1,40}?)(?:\*\*)?[ \t]+[\-–—][ \t]+(\S[^\n]{5,})$")
        .expect("dash definition pattern")
});
static PARENTHETICAL_DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?: [A-Z][a-z]+)+) \(([A-Z]{2,10})\)").expect("parenthetical definition pattern")
});

/// Extract all content structures.
pub fn extract(content: &str) -> ContentStructures {
    let code_blocks = code_blocks(content);
    let (lists, tables) = scan_lines(content, &code_blocks);
    ContentStructures {
        lists,
        tables,
        code_blocks,
        definitions: definitions(content),
    }
}

fn code_blocks(content: &str) -> Vec<CodeBlock> {
    CODE_FENCE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let language = caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|lang| !lang.is_empty())
                .map(str::to_string);
            let line_count = caps.get(2).map_or(0, |body| body.as_str().lines().count());
            Some(CodeBlock {
                start: whole.start(),
                end: whole.end(),
                language,
                line_count,
            })
        })
        .collect()
}

#[derive(Default)]
struct ListRun {
    start: usize,
    end: usize,
    items: usize,
    ordered: bool,
}

#[derive(Default)]
struct TableRun {
    start: usize,
    end: usize,
    lines: usize,
    rows: usize,
    columns: usize,
}

fn scan_lines(content: &str, code: &[CodeBlock]) -> (Vec<ListBlock>, Vec<TableBlock>) {
    let mut lists = Vec::new();
    let mut tables = Vec::new();
    let mut list: Option<ListRun> = None;
    let mut table: Option<TableRun> = None;

    let mut offset = 0;
    for raw in content.split_inclusive('\n') {
        let start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        let end = start + line.len();

        if code.iter().any(|c| c.start <= start && start < c.end) {
            flush_list(&mut list, &mut lists);
            flush_table(&mut table, &mut tables);
            continue;
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            let run = list.get_or_insert_with(|| ListRun {
                start,
                ordered: caps.get(2).is_some(),
                ..ListRun::default()
            });
            run.items += 1;
            run.end = end;
        } else {
            flush_list(&mut list, &mut lists);
        }

        if line.matches('|').count() >= 2 {
            let run = table.get_or_insert_with(|| TableRun {
                start,
                columns: line.split('|').filter(|cell| !cell.trim().is_empty()).count(),
                ..TableRun::default()
            });
            run.lines += 1;
            if !TABLE_SEPARATOR.is_match(line) {
                run.rows += 1;
            }
            run.end = end;
        } else {
            flush_table(&mut table, &mut tables);
        }
    }
    flush_list(&mut list, &mut lists);
    flush_table(&mut table, &mut tables);

    (lists, tables)
}

fn flush_list(run: &mut Option<ListRun>, out: &mut Vec<ListBlock>) {
    if let Some(run) = run.take().filter(|r| r.items >= 2) {
        out.push(ListBlock {
            start: run.start,
            end: run.end,
            item_count: run.items,
            ordered: run.ordered,
        });
    }
}

fn flush_table(run: &mut Option<TableRun>, out: &mut Vec<TableBlock>) {
    if let Some(run) = run.take().filter(|r| r.lines >= 2) {
        out.push(TableBlock {
            start: run.start,
            end: run.end,
            rows: run.rows,
            columns: run.columns,
        });
    }
}

fn definitions(content: &str) -> Vec<DefinitionEntry> {
    let styled = [
        (&*COLON_DEFINITION, DefinitionStyle::Colon),
        (&*DASH_DEFINITION, DefinitionStyle::Dash),
    ];

    let mut found = Vec::new();
    for (pattern, style) in styled {
        for caps in pattern.captures_iter(content) {
            let (Some(whole), Some(term), Some(definition)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let term = term.as_str().trim();
            if is_numbered_label(term) {
                continue;
            }
            found.push(DefinitionEntry {
                term: term.to_string(),
                definition: definition.as_str().trim().to_string(),
                position: whole.start(),
                style,
            });
        }
    }

    for caps in PARENTHETICAL_DEFINITION.captures_iter(content) {
        let (Some(whole), Some(expansion), Some(acronym)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        found.push(DefinitionEntry {
            term: acronym.as_str().to_string(),
            definition: expansion.as_str().to_string(),
            position: whole.start(),
            style: DefinitionStyle::Parenthetical,
        });
    }

    found.sort_by_key(|d| d.position);
    found
}

/// `Step 3`, `Section 2`: labels, not terms.
fn is_numbered_label(term: &str) -> bool {
    term.split_whitespace()
        .last()
        .is_some_and(|word| word.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists() {
        let text = "Intro\n- one\n- two\n- three\n\n1. first\n2. second\nEnd";
        let found = extract(text);
        assert_eq!(found.lists.len(), 2);
        assert_eq!(found.lists[0].item_count, 3);
        assert!(!found.lists[0].ordered);
        assert!(found.lists[1].ordered);
        assert_eq!(&text[found.lists[0].start..found.lists[0].end], "- one\n- two\n- three");
    }

    #[test]
    fn test_tables() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\nafter";
        let found = extract(text);
        assert_eq!(found.tables.len(), 1);
        assert_eq!(found.tables[0].rows, 2);
        assert_eq!(found.tables[0].columns, 2);
    }

    #[test]
    fn test_code_blocks_hide_tables() {
        let text = "```bash\ncat a | grep b | wc\nls | sort | uniq\n```\nDone.";
        let found = extract(text);
        assert_eq!(found.code_blocks.len(), 1);
        assert_eq!(found.code_blocks[0].language.as_deref(), Some("bash"));
        assert_eq!(found.code_blocks[0].line_count, 2);
        assert!(found.tables.is_empty());
    }

    #[test]
    fn test_definitions() {
        let text = "Latency: the time a request takes.\n\
                    Throughput - requests handled per second\n\
                    We use the Domain Name System (DNS) daily.\n\
                    Step 1: Install the package now.";
        let found = extract(text).definitions;
        let styles: Vec<_> = found.iter().map(|d| d.style).collect();
        assert_eq!(
            styles,
            vec![DefinitionStyle::Colon, DefinitionStyle::Dash, DefinitionStyle::Parenthetical]
        );
        assert_eq!(found[2].term, "DNS");
        assert_eq!(found[2].definition, "Domain Name System");
    }

    #[test]
    fn test_kinds_present() {
        assert_eq!(ContentStructures::default().kinds_present(), 0);
        let found = extract("- a\n- b\n| x | y |\n| 1 | 2 |");
        assert_eq!(found.kinds_present(), 2);
    }
}
