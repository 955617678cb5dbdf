//! `@name` mention scanning.
//!
//! A candidate is `@` followed by identifier characters (letters, combining
//! marks, decimal digits, underscore). It only counts as a mention when it stands alone: an
//! identifier character right before the `@` means we are inside an email
//! local part, and an identifier character or another `@` right after means
//! a chain like `a@b@c`.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const IDENTIFIER_CLASS: &str = r"[\p{Alphabetic}\p{M}\p{Nd}_]";

static MENTION_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("@{IDENTIFIER_CLASS}+")).expect("mention pattern must compile")
});

static IDENTIFIER_CHAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{IDENTIFIER_CLASS}$")).expect("identifier pattern must compile")
});

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mention {
    /// The matched token including the leading `@`.
    pub full_text: String,
    pub username: String,
    /// Byte range of `full_text` within the scanned text.
    pub range: Range<usize>,
}

impl Mention {
    pub fn contains(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }
}

/// Lazily yields mentions in `text`, ordered by position.
pub fn mentions(text: &str) -> impl Iterator<Item = Mention> + '_ {
    let mut start = 0;
    std::iter::from_fn(move || {
        let range = next_mention(text, start)?;
        start = range.end;
        Some(Mention {
            full_text: text[range.clone()].to_string(),
            username: text[range.start + 1..range.end].to_string(),
            range,
        })
    })
}

/// Byte range of the first mention starting at or after `start`.
///
/// Neighbouring characters are judged against the whole of `text`, so
/// resuming mid-line gives the same answer as scanning from the beginning.
pub(crate) fn next_mention(text: &str, start: usize) -> Option<Range<usize>> {
    let mut at = start;
    while let Some(candidate) = MENTION_CANDIDATE.find_at(text, at) {
        if stands_alone(text, candidate.range()) {
            return Some(candidate.range());
        }
        at = candidate.end();
    }
    None
}

pub fn find_mentions(text: &str) -> Vec<Mention> {
    mentions(text).collect()
}

/// Syntactic username check: 3 to 20 identifier characters.
pub fn is_valid_username(name: &str) -> bool {
    let length = name.chars().count();
    (USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&length)
        && name.chars().all(is_identifier_char)
}

/// Replace every mention with the output of `replace`.
///
/// Substitutions run back to front so earlier ranges stay valid while later
/// text changes length.
pub fn replace_mentions<F>(text: &str, mut replace: F) -> String
where
    F: FnMut(&Mention) -> String,
{
    let mut output = text.to_string();
    for mention in find_mentions(text).iter().rev() {
        let replacement = replace(mention);
        output.replace_range(mention.range.clone(), &replacement);
    }
    output
}

fn is_identifier_char(c: char) -> bool {
    let mut buffer = [0u8; 4];
    IDENTIFIER_CHAR.is_match(c.encode_utf8(&mut buffer))
}

fn stands_alone(text: &str, range: Range<usize>) -> bool {
    let preceded = text[..range.start]
        .chars()
        .next_back()
        .is_some_and(is_identifier_char);
    let followed = text[range.end..]
        .chars()
        .next()
        .is_some_and(|c| is_identifier_char(c) || c == '@');
    !preceded && !followed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_addresses_are_not_mentions() {
        assert!(find_mentions("a@b.com").is_empty());
        assert!(find_mentions("write to user@domain.tld today").is_empty());
    }

    #[test]
    fn finds_mentions_with_ranges() {
        let text = "hi @bob and @ann2!";
        let found = find_mentions(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].username, "bob");
        assert_eq!(found[0].full_text, "@bob");
        assert_eq!(found[0].range, 3..7);
        assert_eq!(found[1].username, "ann2");
        assert_eq!(found[1].range, 12..17);
        assert_eq!(&text[found[1].range.clone()], "@ann2");
    }

    #[test]
    fn chained_at_signs_are_rejected() {
        assert!(find_mentions("a@b@c").is_empty());
        assert!(find_mentions("@bob@home").is_empty());
    }

    #[test]
    fn mention_at_start_and_after_punctuation() {
        let found = find_mentions("@first, (@second) and @third_one.");
        let names: Vec<_> = found.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, ["first", "second", "third_one"]);
    }

    #[test]
    fn non_ascii_usernames_are_supported() {
        let found = find_mentions("thanks @zoë!");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "zoë");
    }

    #[test]
    fn combining_marks_stay_inside_the_username() {
        let found = find_mentions("hi @नमस्ते there");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "नमस्ते");
        assert_eq!(found[0].range, 3..22);

        let found = find_mentions("@zoe\u{301}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "zoe\u{301}");
        assert!(is_valid_username("zoe\u{301}"));
    }

    #[test]
    fn candidate_and_neighbour_checks_agree() {
        for c in ['a', 'ë', 'न', '\u{94d}', '\u{301}', '7', '_'] {
            assert!(is_identifier_char(c), "{c:?} should be an identifier char");
        }
        for c in ['@', '.', '-', ' ', '!'] {
            assert!(!is_identifier_char(c), "{c:?} should not be an identifier char");
        }
        // A trailing combining mark would otherwise split the token.
        assert!(find_mentions("a\u{301}@bob").is_empty());
    }

    #[test]
    fn resuming_mid_text_matches_a_full_scan() {
        let text = "x@y then @bob and a@b@c then @ann";
        let all: Vec<_> = find_mentions(text).into_iter().map(|m| m.range).collect();
        assert_eq!(all, [9..13, 29..33]);
        assert_eq!(next_mention(text, 10), Some(29..33));
        assert_eq!(next_mention(text, 30), None);
    }

    #[test]
    fn contains_checks_byte_offsets() {
        let mention = &find_mentions("hey @bob")[0];
        assert!(!mention.contains(3));
        assert!(mention.contains(4));
        assert!(mention.contains(7));
        assert!(!mention.contains(8));
    }

    #[test]
    fn username_validation() {
        assert!(is_valid_username("bob"));
        assert!(is_valid_username("ann_2024"));
        assert!(!is_valid_username("al"));
        assert!(!is_valid_username("a_very_long_username_x"));
        assert!(!is_valid_username("bad-name"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn replacement_keeps_surrounding_text_intact() {
        let replaced = replace_mentions("hi @bob and @ann2!", |mention| {
            format!("[{}](/u/{})", mention.full_text, mention.username)
        });
        assert_eq!(replaced, "hi [@bob](/u/bob) and [@ann2](/u/ann2)!");
    }

    #[test]
    fn replacement_without_mentions_is_identity() {
        let text = "mail me at a@b.com";
        assert_eq!(replace_mentions(text, |_| String::new()), text);
    }
}
