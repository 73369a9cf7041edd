//! Conversion of fasttext labels to BCP47 tags.
//!
//! `lid.176` emits ISO 639-1 codes (`__label__en`), newer models emit
//! ISO 639-3 codes with an optional script (`__label__eng_Latn`).
//! Both are brought to the shortest available primary language subtag
//! so that they compare equal with a configured target.
use std::collections::HashMap;

use lazy_static::lazy_static;
use oxilangtag::{LanguageTag, LanguageTagParseError};

const LABEL_PREFIX: &str = "__label__";

lazy_static! {
    static ref ISO_639_3_TO_1: HashMap<&'static str, &'static str> = [
        ("ara", "ar"),
        ("ben", "bn"),
        ("cat", "ca"),
        ("ces", "cs"),
        ("cym", "cy"),
        ("dan", "da"),
        ("deu", "de"),
        ("ell", "el"),
        ("eng", "en"),
        ("est", "et"),
        ("eus", "eu"),
        ("fas", "fa"),
        ("fin", "fi"),
        ("fra", "fr"),
        ("gle", "ga"),
        ("glg", "gl"),
        ("heb", "he"),
        ("hin", "hi"),
        ("hun", "hu"),
        ("ind", "id"),
        ("ita", "it"),
        ("jpn", "ja"),
        ("kor", "ko"),
        ("lit", "lt"),
        ("lav", "lv"),
        ("msa", "ms"),
        ("nld", "nl"),
        ("nob", "nb"),
        ("pol", "pl"),
        ("por", "pt"),
        ("ron", "ro"),
        ("rus", "ru"),
        ("slk", "sk"),
        ("slv", "sl"),
        ("spa", "es"),
        ("swe", "sv"),
        ("tgl", "fil"),
        ("tha", "th"),
        ("tur", "tr"),
        ("ukr", "uk"),
        ("urd", "ur"),
        ("vie", "vi"),
        ("zho", "zh"),
    ]
    .into_iter()
    .collect();
}

/// Convert a raw fasttext label (with or without `__label__`) into a [LanguageTag].
pub fn label_to_tag(label: &str) -> Result<LanguageTag<String>, LanguageTagParseError> {
    let label = label.strip_prefix(LABEL_PREFIX).unwrap_or(label);

    // eng_Latn -> (eng, Some(Latn))
    let (language, script) = match label.split_once('_') {
        Some((language, script)) => (language, Some(script)),
        None => (label, None),
    };

    let language = match language {
        // lid.176 quirks
        "sh" => "sr",
        "tl" => "fil",
        "als" => "gsw",
        other => ISO_639_3_TO_1.get(other).copied().unwrap_or(other),
    };

    let tag = match script {
        Some(script) => format!("{language}-{script}"),
        None => language.to_string(),
    };

    LanguageTag::parse_and_normalize(&tag)
}

/// Compare the primary language subtags of two tags, ignoring case.
pub fn same_language<A, B>(a: &LanguageTag<A>, b: &LanguageTag<B>) -> bool
where
    A: std::ops::Deref<Target = str>,
    B: std::ops::Deref<Target = str>,
{
    a.primary_language()
        .eq_ignore_ascii_case(b.primary_language())
}
