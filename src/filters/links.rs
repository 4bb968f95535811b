//! Link segmenter: drops the sentences that carry links to a domain.
//!
//! Offsets are byte offsets. Every delimiter and trimmed punctuation mark is
//! ASCII, so slicing the original text at them is always on a char boundary.

/// Punctuation trimmed from either edge of a detected link.
const EDGE_PUNCTUATION: [char; 4] = ['.', ',', '!', '?'];

/// Sentence delimiters.
const DELIMITERS: [u8; 4] = [b'\n', b'.', b'?', b'!'];

/// Byte used to blank out link spans before delimiter search.
const PLACEHOLDER: u8 = b'p';

/// Half-open byte range in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// Remove every sentence containing a link to `domain`.
///
/// Returns `message` unchanged when no word looks like such a link. Only the
/// first occurrence of each distinct link word is detected.
pub fn remove_links(message: &str, domain: &str) -> String {
    let links = find_links(message, domain);
    if links.is_empty() {
        return message.to_owned();
    }

    let mut masked = message.as_bytes().to_vec();
    for link in &links {
        masked[link.start..link.end].fill(PLACEHOLDER);
    }

    let kept: String = segments(&masked)
        .into_iter()
        .filter(|seg| !links.iter().any(|l| seg.start <= l.start && l.start < seg.end))
        .map(|seg| &message[seg.start..seg.end])
        .collect();

    normalize(&kept)
}

/// Whether `word` is a link to `domain`: it contains the domain and has a dot
/// somewhere other than its first or last two characters.
fn is_link(word: &str, domain: &str) -> bool {
    if !word.contains(domain) {
        return false;
    }
    let chars: Vec<char> = word.chars().collect();
    chars.len() >= 3 && chars[1..chars.len() - 2].contains(&'.')
}

fn find_links(message: &str, domain: &str) -> Vec<Span> {
    let mut links = Vec::new();
    for word in message.split_whitespace() {
        if !is_link(word, domain) {
            continue;
        }
        let Some(start) = message.find(word) else {
            continue;
        };
        let mut span = Span {
            start,
            end: start + word.len(),
        };
        if word.starts_with(EDGE_PUNCTUATION) {
            span.start += 1;
        }
        if word.ends_with(EDGE_PUNCTUATION) && span.end > span.start {
            span.end -= 1;
        }
        links.push(span);
    }
    links
}

/// Split into segments, each ending just after a delimiter.
fn segments(text: &[u8]) -> Vec<Span> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, byte) in text.iter().enumerate() {
        if DELIMITERS.contains(byte) {
            out.push(Span { start, end: i + 1 });
            start = i + 1;
        }
    }
    if start < text.len() || out.is_empty() {
        out.push(Span {
            start,
            end: text.len(),
        });
    }
    out
}

fn normalize(text: &str) -> String {
    let text = text.replace("\n ", "\n");
    let text = text
        .trim_start_matches(['\n', ' '])
        .trim_end_matches('\n');
    collapse_blank_lines(text)
}

/// Shrink every run of three or more newlines to two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(c);
    }
    out
}
