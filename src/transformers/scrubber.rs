/*! Target entity scrubbing.

Removes every occurrence of a set of entity variants (candidate names, aliases) from a text.

Matching is done on whole tokens, ignoring case. Tokens are unicode words, themselves split into
segments on case changes, letter/digit changes and inner punctuation, so that concatenated forms are caught too:

```text
RT @DonaldTrump great rally!!   -> RT great rally!!        (donaldtrump)
#TrumpPence2020 all the way     -> #2020 all the way       (trump, pence)
@realDonaldTrump's tweet        -> tweet                   (realdonaldtrump)
Trumpet solo tonight            -> Trumpet solo tonight
```

A scan-and-remove pass is repeated until it makes no removal, with a hard cap on the number of passes.
Texts without any target entity are returned unchanged.
!*/
use std::collections::HashSet;

use itertools::Itertools;
use log::{info, warn};
use rayon::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    config::ScrubConfig,
    error::Error,
    record::{Record, ScrubbedRecord},
};

/// Outcome of the scrubbing of a single word.
#[derive(Debug, PartialEq)]
enum WordScrub {
    Untouched,
    /// The whole word was removed, along with `n` entity occurrences.
    Removed(usize),
    /// Part of the word remains.
    Partial(String, usize),
}

#[derive(Debug)]
struct Piece<'a> {
    text: &'a str,
    separator: bool,
}

pub struct EntityScrubber {
    entities: HashSet<String>,
    // every non-empty prefix of every entity, to stop scanning early
    prefixes: HashSet<String>,
    max_passes: usize,
}

impl EntityScrubber {
    pub fn new<I, S>(entities: I, max_passes: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entities: HashSet<String> = entities
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches(['#', '@']).to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let prefixes = entities
            .iter()
            .flat_map(|e| {
                e.char_indices()
                    .map(move |(idx, c)| e[..idx + c.len_utf8()].to_string())
            })
            .collect();

        Self {
            entities,
            prefixes,
            max_passes: max_passes.max(1),
        }
    }

    pub fn from_config(config: &ScrubConfig) -> Result<Self, Error> {
        Ok(Self::new(config.resolve_entities()?, config.max_passes))
    }

    /// Scrub `text` until a pass removes nothing.
    ///
    /// Returns the scrubbed text and the number of removed occurrences.
    pub fn scrub_text(&self, text: &str) -> (String, usize) {
        let mut current = text.to_string();
        let mut total = 0;

        for _ in 0..self.max_passes {
            match self.pass(&current) {
                Some((next, removed)) => {
                    total += removed;
                    current = next;
                }
                None => return (current, total),
            }
        }

        if self.pass(&current).is_some() {
            warn!(
                "scrubbing did not converge after {} passes: {current:?}",
                self.max_passes
            );
        }
        (current, total)
    }

    pub fn scrub(&self, record: Record) -> ScrubbedRecord {
        let (text, removals) = self.scrub_text(record.text());
        ScrubbedRecord::new(record, text, removals)
    }

    /// Scrub records in parallel. Order is kept.
    pub fn apply(&self, records: Vec<Record>) -> Vec<ScrubbedRecord> {
        info!("[scrub] scrubbing {} records", records.len());

        let scrubbed: Vec<ScrubbedRecord> = records
            .into_par_iter()
            .map(|record| self.scrub(record))
            .collect();

        let touched = scrubbed.iter().filter(|r| r.removals() > 0).count();
        let removals: usize = scrubbed.iter().map(ScrubbedRecord::removals).sum();
        info!("[scrub] removed {removals} entity occurrences from {touched} records");

        scrubbed
    }

    /// Single scan-and-remove pass.
    /// Returns [None] if nothing was removed.
    fn pass(&self, text: &str) -> Option<(String, usize)> {
        if self.entities.is_empty() {
            return None;
        }

        let mut out = String::with_capacity(text.len());
        let mut removed = 0;
        for segment in text.split_word_bounds() {
            if !segment.chars().any(char::is_alphanumeric) {
                out.push_str(segment);
                continue;
            }

            match self.scrub_word(segment) {
                WordScrub::Untouched => out.push_str(segment),
                WordScrub::Removed(n) => {
                    removed += n;
                    // drop the hashtag/mention sigil of a removed word
                    if out.ends_with(|c| c == '#' || c == '@') {
                        out.pop();
                    }
                }
                WordScrub::Partial(rest, n) => {
                    removed += n;
                    out.push_str(&rest);
                }
            }
        }

        if removed == 0 {
            None
        } else {
            Some((out.split_whitespace().join(" "), removed))
        }
    }

    fn scrub_word(&self, word: &str) -> WordScrub {
        let (base, possessive) = split_possessive(word);
        let pieces = pieces(base);
        let mut removed = vec![false; pieces.len()];
        let mut count = 0;

        // greedy, longest match first, left to right
        let mut start = 0;
        while start < pieces.len() {
            if pieces[start].separator {
                start += 1;
                continue;
            }

            let mut spelled = String::new();
            let mut longest = None;
            for (end, piece) in pieces.iter().enumerate().skip(start) {
                if piece.separator {
                    continue;
                }
                spelled.push_str(&piece.text.to_lowercase());
                if !self.prefixes.contains(&spelled) {
                    break;
                }
                if self.entities.contains(&spelled) {
                    longest = Some(end);
                }
            }

            match longest {
                Some(end) => {
                    removed[start..=end].iter_mut().for_each(|r| *r = true);
                    count += 1;
                    start = end + 1;
                }
                None => start += 1,
            }
        }

        if count == 0 {
            return WordScrub::Untouched;
        }

        let rest: String = pieces
            .iter()
            .zip(&removed)
            .filter(|(_, removed)| !**removed)
            .map(|(piece, _)| piece.text)
            .collect();
        let rest = rest.trim_matches(|c: char| !c.is_alphanumeric());

        if rest.is_empty() {
            WordScrub::Removed(count)
        } else {
            WordScrub::Partial(format!("{rest}{possessive}"), count)
        }
    }
}

/// Split a trailing `'s` off a word.
fn split_possessive(word: &str) -> (&str, &str) {
    for suffix in ["'s", "'S", "’s", "’S"] {
        if let Some(base) = word.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base, &word[base.len()..]);
            }
        }
    }
    (word, "")
}

/// Whether a segment boundary lies between `prev` and `cur`.
fn is_boundary(prev: char, cur: char, next: Option<char>) -> bool {
    let (prev_alnum, cur_alnum) = (prev.is_alphanumeric(), cur.is_alphanumeric());
    if prev_alnum != cur_alnum || !prev_alnum {
        return true;
    }

    (prev.is_lowercase() && cur.is_uppercase())
        || (prev.is_alphabetic() && cur.is_numeric())
        || (prev.is_numeric() && cur.is_alphabetic())
        // end of an acronym: MAGATrump -> MAGA|Trump
        || (prev.is_uppercase() && cur.is_uppercase() && next.map_or(false, char::is_lowercase))
}

/// Split a word into camel case/digit segments and single char separators.
fn pieces(word: &str) -> Vec<Piece<'_>> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut pieces = Vec::new();
    if chars.is_empty() {
        return pieces;
    }

    let mut start = 0;
    for i in 1..=chars.len() {
        let boundary = i == chars.len()
            || is_boundary(chars[i - 1].1, chars[i].1, chars.get(i + 1).map(|(_, c)| *c));
        if boundary {
            let end = chars.get(i).map_or(word.len(), |(idx, _)| *idx);
            pieces.push(Piece {
                text: &word[chars[start].0..end],
                separator: !chars[start].1.is_alphanumeric(),
            });
            start = i;
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::{pieces, EntityScrubber, WordScrub};

    fn scrubber() -> EntityScrubber {
        EntityScrubber::new(
            [
                "trump",
                "biden",
                "pence",
                "donaldtrump",
                "realdonaldtrump",
                "#JoeBiden",
            ],
            16,
        )
    }

    #[test]
    fn segments() {
        let texts: Vec<_> = pieces("realDonaldTrump").iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["real", "Donald", "Trump"]);

        let texts: Vec<_> = pieces("MAGATrump2020").iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["MAGA", "Trump", "2020"]);

        let texts: Vec<_> = pieces("Donald_Trump").iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["Donald", "_", "Trump"]);
    }

    #[test]
    fn mention() {
        let s = EntityScrubber::new(["donaldtrump"], 16);
        let (text, removed) = s.scrub_text("RT @DonaldTrump great rally!!");

        assert_eq!(text, "RT great rally!!");
        assert_eq!(removed, 1);
        assert!(!text.to_lowercase().contains("donaldtrump"));
    }

    #[test]
    fn case_variants() {
        let (text, removed) = scrubber().scrub_text("TRUMP trump Trump tRuMp and Biden");
        assert_eq!(text, "and");
        assert_eq!(removed, 5);
    }

    #[test]
    fn concatenated_hashtags() {
        let (text, removed) = scrubber().scrub_text("#TrumpPence2020 all the way");
        assert_eq!(text, "#2020 all the way");
        assert_eq!(removed, 2);

        let (text, _) = scrubber().scrub_text("@realDonaldTrump's latest tweet");
        assert_eq!(text, "latest tweet");

        let (text, _) = scrubber().scrub_text("#NeverBiden #MAGATrump");
        assert_eq!(text, "#Never #MAGA");

        let (text, _) = scrubber().scrub_text("go #joebiden go");
        assert_eq!(text, "go go");
    }

    #[test]
    fn whole_tokens_only() {
        let text = "Trumpet solo by the bidenite crowd";
        let (scrubbed, removed) = scrubber().scrub_text(text);
        assert_eq!(scrubbed, text);
        assert_eq!(removed, 0);
    }

    #[test]
    fn untouched_text_is_unchanged() {
        let text = "Nothing  to see\nhere,\tfolks!";
        assert_eq!(scrubber().scrub_text(text), (text.to_string(), 0));
    }

    #[test]
    fn idempotent() {
        let s = scrubber();
        for text in [
            "RT @DonaldTrump great rally!!",
            "#TrumpPence2020 #BidenHarris",
            "Trump's rally, Biden's speech & Pence",
            "@realDonaldTrump @JoeBiden debate tonight #Debates2020",
        ] {
            let (once, _) = s.scrub_text(text);
            let (twice, removed) = s.scrub_text(&once);
            assert_eq!(once, twice);
            assert_eq!(removed, 0);
        }
    }

    #[test]
    fn word_outcomes() {
        let s = scrubber();
        assert_eq!(s.scrub_word("Trump"), WordScrub::Removed(1));
        assert_eq!(s.scrub_word("Rally"), WordScrub::Untouched);
        assert_eq!(
            s.scrub_word("TrumpTrain"),
            WordScrub::Partial("Train".to_string(), 1)
        );
    }

    #[test]
    fn no_entities() {
        let s = EntityScrubber::new(Vec::<String>::new(), 4);
        assert_eq!(s.scrub_text("Trump"), ("Trump".to_string(), 0));
    }
}
