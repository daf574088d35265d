//! Word-of-the-day feed and dictionary lookup.

use std::{cell::RefCell, rc::Rc};

use async_trait::async_trait;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use reqwest::{Client, Url};
use tracing::info;

use crate::{
    application::ports::WordSource,
    config::WordSettings,
    domain::{marker::extract_between, word::WordOfDay},
};

use super::{error::InfraError, http};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

#[derive(Debug, Clone)]
pub struct DictionaryClient {
    client: Client,
    rss_url: Url,
    dictionary_url: Url,
    key: String,
}

impl DictionaryClient {
    /// Build a client for the configured feed. Fails when no API key is set.
    pub fn new(client: Client, settings: &WordSettings) -> Result<Self, InfraError> {
        let key = settings
            .key
            .clone()
            .ok_or_else(|| InfraError::configuration("word.key is not set"))?;
        Ok(Self {
            client,
            rss_url: settings.rss_url.clone(),
            dictionary_url: http::with_trailing_slash(&settings.dictionary_url),
            key,
        })
    }

    /// `{dictionary_url}{word}?key={key}`
    pub fn lookup_url(&self, word: &str) -> Result<Url, InfraError> {
        let mut url = self
            .dictionary_url
            .join(word)
            .map_err(|err| InfraError::configuration(format!("invalid dictionary url: {err}")))?;
        url.query_pairs_mut().append_pair("key", &self.key);
        Ok(url)
    }
}

#[async_trait]
impl WordSource for DictionaryClient {
    async fn fetch_word(&self) -> Result<WordOfDay, InfraError> {
        let feed = http::get_text(&self.client, self.rss_url.clone()).await?;
        let word = word_from_feed(&feed)?;

        let entry = http::get_text(&self.client, self.lookup_url(&word)?).await?;
        let mut parsed = parse_entry(&entry)?;
        if parsed.word.is_empty() {
            parsed.word = word;
        }

        info!(
            target = "planner::word",
            op = "word::fetch",
            word = %parsed.word,
            definitions = parsed.definitions.len(),
            "Fetched word of the day"
        );
        Ok(parsed)
    }
}

/// The word is the text of the first CDATA block in the feed.
pub fn word_from_feed(feed: &str) -> Result<String, InfraError> {
    let word = extract_between(feed, CDATA_OPEN, CDATA_CLOSE)
        .map_err(|err| InfraError::decode("word feed", err.to_string()))?
        .trim();
    if word.is_empty() {
        return Err(InfraError::decode("word feed", "empty CDATA block"));
    }
    Ok(word.to_string())
}

#[derive(Debug, Default)]
struct EntryState {
    entries: usize,
    id: Option<String>,
    headword: String,
    pronunciation: String,
    part_of_speech: String,
    definitions: Vec<String>,
}

impl EntryState {
    fn in_first_entry(&self) -> bool {
        self.entries == 1
    }
}

/// Parse the first `<entry>` of a dictionary response.
///
/// The headword comes from `<ew>`, falling back to the entry id with any
/// homograph suffix (`effusion[2]`) removed.
pub fn parse_entry(xml: &str) -> Result<WordOfDay, InfraError> {
    let state = Rc::new(RefCell::new(EntryState::default()));

    rewrite_str(
        xml,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("entry", {
                    let state = Rc::clone(&state);
                    move |el| {
                        let mut state = state.borrow_mut();
                        state.entries += 1;
                        if state.in_first_entry() {
                            state.id = el.get_attribute("id");
                        }
                        Ok(())
                    }
                }),
                text!("entry > ew", {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if state.in_first_entry() {
                            state.headword.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
                text!("entry > pr", {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if state.in_first_entry() {
                            state.pronunciation.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
                text!("entry > fl", {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if state.in_first_entry() {
                            state.part_of_speech.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
                element!("entry > def > dt", {
                    let state = Rc::clone(&state);
                    move |_el| {
                        let mut state = state.borrow_mut();
                        if state.in_first_entry() {
                            state.definitions.push(String::new());
                        }
                        Ok(())
                    }
                }),
                text!("entry > def > dt", {
                    let state = Rc::clone(&state);
                    move |chunk| {
                        let mut state = state.borrow_mut();
                        if state.in_first_entry() {
                            if let Some(current) = state.definitions.last_mut() {
                                current.push_str(chunk.as_str());
                            }
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| InfraError::decode("dictionary entry", err.to_string()))?;

    let state = Rc::try_unwrap(state)
        .map(RefCell::into_inner)
        .map_err(|_| InfraError::decode("dictionary entry", "parser state still borrowed"))?;

    if state.entries == 0 {
        return Err(InfraError::decode("dictionary entry", "no <entry> element"));
    }

    let headword = state.headword.trim();
    let word = if headword.is_empty() {
        state
            .id
            .as_deref()
            .map(strip_homograph)
            .unwrap_or_default()
            .to_string()
    } else {
        headword.to_string()
    };

    Ok(WordOfDay {
        word,
        pronunciation: non_empty(&state.pronunciation),
        part_of_speech: non_empty(&state.part_of_speech),
        definitions: state
            .definitions
            .iter()
            .map(|definition| definition.trim())
            .filter(|definition| !definition.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn strip_homograph(id: &str) -> &str {
    id.split_once('[').map_or(id, |(word, _)| word).trim()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<entry_list version="1.0">
  <entry id="effusion"><ew>effusion</ew><subj>MD</subj><hw>ef*fu*sion</hw>
    <pr>i-ˈfyü-zhən, e-</pr><fl>noun</fl>
    <def><date>15th century</date>
      <sn>1</sn><dt>:an act of effusion</dt>
      <sn>2</sn><dt>:unrestrained expression of words or feelings</dt>
    </def>
  </entry>
  <entry id="effusion[2]"><ew>effusion</ew><fl>verb</fl>
    <def><dt>:should never be read</dt></def>
  </entry>
</entry_list>"#;

    #[test]
    fn first_entry_is_parsed() {
        let word = parse_entry(ENTRY).expect("parsed");
        assert_eq!(word.word, "effusion");
        assert_eq!(word.pronunciation.as_deref(), Some("i-ˈfyü-zhən, e-"));
        assert_eq!(word.part_of_speech.as_deref(), Some("noun"));
        assert_eq!(
            word.definitions,
            vec![
                ":an act of effusion",
                ":unrestrained expression of words or feelings"
            ]
        );
    }

    #[test]
    fn entry_id_is_used_without_headword() {
        let xml = r#"<entry_list><entry id="gambit[1]"><fl>noun</fl></entry></entry_list>"#;
        let word = parse_entry(xml).expect("parsed");
        assert_eq!(word.word, "gambit");
        assert!(word.pronunciation.is_none());
        assert!(word.definitions.is_empty());
    }

    #[test]
    fn response_without_entry_is_rejected() {
        let xml = r#"<entry_list version="1.0"><suggestion>efusion</suggestion></entry_list>"#;
        assert!(matches!(
            parse_entry(xml),
            Err(InfraError::Decode { .. })
        ));
    }

    #[test]
    fn feed_word_is_first_cdata_block() {
        let feed = concat!(
            "<rss><channel><item>",
            "<title><![CDATA[ effusion ]]></title>",
            "<description><![CDATA[<p>ignored</p>]]></description>",
            "</item></channel></rss>",
        );
        assert_eq!(word_from_feed(feed).expect("word"), "effusion");
    }

    #[test]
    fn feed_without_cdata_is_rejected() {
        let err = word_from_feed("<rss><title>plain</title></rss>").expect_err("no cdata");
        assert!(matches!(err, InfraError::Decode { what: "word feed", .. }));
    }
}
