//! Message rendering
//!
//! Splits raw message text into display segments: fenced code spans first,
//! then links inside the remaining prose. Rendering is lossless, so
//! concatenating [`Segment::raw`] over the output gives back the input.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

const FENCE: &str = "```";

/// A classified fragment of message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link(String),
    /// Inner content of a fenced span, without the fences
    Code(String),
}

impl Segment {
    /// The exact source text this segment was cut from.
    pub fn raw(&self) -> Cow<'_, str> {
        match self {
            Segment::Text(value) | Segment::Link(value) => Cow::Borrowed(value),
            Segment::Code(value) => Cow::Owned(format!("{FENCE}{value}{FENCE}")),
        }
    }
}

/// Segments grouped the way a chat bubble lays them out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A run of text and link segments that flows as one paragraph
    Prose(Vec<Segment>),
    Code(String),
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Shortest match so consecutive fenced spans stay separate
    RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("fence pattern is valid"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("url pattern is valid"))
}

/// Render raw message text into segments.
///
/// An unterminated fence is not code: it and everything after it stay prose.
pub fn render(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in fence_regex().captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_prose(&text[last..whole.start()], &mut segments);
        segments.push(Segment::Code(inner.as_str().to_string()));
        last = whole.end();
    }

    push_prose(&text[last..], &mut segments);
    segments
}

fn push_prose(prose: &str, segments: &mut Vec<Segment>) {
    let mut last = 0;

    for url in url_regex().find_iter(prose) {
        if url.start() > last {
            segments.push(Segment::Text(prose[last..url.start()].to_string()));
        }
        segments.push(Segment::Link(url.as_str().to_string()));
        last = url.end();
    }

    if last < prose.len() {
        segments.push(Segment::Text(prose[last..].to_string()));
    }
}

/// Render and group consecutive text/link segments into prose blocks.
pub fn render_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut prose: Vec<Segment> = Vec::new();

    for segment in render(text) {
        match segment {
            Segment::Code(code) => {
                if !prose.is_empty() {
                    blocks.push(Block::Prose(std::mem::take(&mut prose)));
                }
                blocks.push(Block::Code(code));
            }
            other => prose.push(other),
        }
    }

    if !prose.is_empty() {
        blocks.push(Block::Prose(prose));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(segments: &[Segment]) -> String {
        segments.iter().map(|s| s.raw()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(render("").is_empty());
        assert!(render_blocks("").is_empty());
    }

    #[test]
    fn test_plain_text_is_single_segment() {
        let text = "Himanshu builds web apps with React and Node.";
        assert_eq!(render(text), vec![Segment::Text(text.to_string())]);
    }

    #[test]
    fn test_code_then_link() {
        let text = "check ```print(1)``` and https://example.com";
        let segments = render(text);
        assert_eq!(
            segments,
            vec![
                Segment::Text("check ".to_string()),
                Segment::Code("print(1)".to_string()),
                Segment::Text(" and ".to_string()),
                Segment::Link("https://example.com".to_string()),
            ]
        );

        let blocks = render_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::Prose(vec![Segment::Text("check ".to_string())]));
        assert_eq!(blocks[1], Block::Code("print(1)".to_string()));
        match &blocks[2] {
            Block::Prose(segments) => {
                assert!(segments.contains(&Segment::Link("https://example.com".to_string())));
            }
            other => panic!("expected prose, got {:?}", other),
        }
    }

    #[test]
    fn test_code_keeps_inner_content_exactly() {
        let text = "```\nfn main() {}\n```";
        assert_eq!(render(text), vec![Segment::Code("\nfn main() {}\n".to_string())]);
    }

    #[test]
    fn test_adjacent_fences_stay_separate() {
        let segments = render("```a``````b```");
        assert_eq!(
            segments,
            vec![Segment::Code("a".to_string()), Segment::Code("b".to_string())]
        );
    }

    #[test]
    fn test_unterminated_fence_is_text() {
        let text = "try ```this";
        assert_eq!(render(text), vec![Segment::Text(text.to_string())]);
    }

    #[test]
    fn test_odd_fence_count_tail_is_text() {
        let segments = render("```a``` then ```b");
        assert_eq!(
            segments,
            vec![
                Segment::Code("a".to_string()),
                Segment::Text(" then ```b".to_string()),
            ]
        );
    }

    #[test]
    fn test_links_split_text() {
        let segments = render("see http://a.dev/x and https://b.io now");
        assert_eq!(
            segments,
            vec![
                Segment::Text("see ".to_string()),
                Segment::Link("http://a.dev/x".to_string()),
                Segment::Text(" and ".to_string()),
                Segment::Link("https://b.io".to_string()),
                Segment::Text(" now".to_string()),
            ]
        );
    }

    #[test]
    fn test_link_inside_code_is_not_a_link() {
        let segments = render("```curl https://api.dev```");
        assert_eq!(segments, vec![Segment::Code("curl https://api.dev".to_string())]);
    }

    #[test]
    fn test_raw_reassembles_input() {
        let inputs = [
            "check ```print(1)``` and https://example.com",
            "https://only.link",
            "multi\nline ```\ncode\n``` tail ``` unterminated https://x.y/z",
            "ünïcödé ```ß``` https://ex.com/ä",
        ];
        for input in inputs {
            assert_eq!(reassemble(&render(input)), input);
        }
    }
}
