//! Act / scene / block segmentation of the play text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::Chunk;

use super::numerals::roman_to_int;

const ACT_HEADING: &str = r"\bACT\s+([IVXLCDM]+)\b";
const SCENE_HEADING: &str = r"\bSCENE\s+([IVXLCDM]+)\b";
const STAGE_DIRECTION: &str = r"\[_.*?_\]";
const WORD_SEPARATORS: &str = r"[\s,\-;]+";

/// Which text the back-matter marker is searched in.
///
/// Searching the unstripped text for the back-matter marker leaves the
/// front matter (and its contents listing) in the story body. Whether that
/// re-scan is intended is unclear, so both readings are available and
/// `Rescan` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryScan {
    /// Body is the unstripped text up to the back-matter marker
    #[default]
    Rescan,
    /// Body is the text strictly between the two markers
    Stripped,
}

/// Structural markers of the corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Marker that ends the front matter
    pub start_marker: String,
    /// Marker that starts the back matter
    pub end_marker: String,
    /// Marker ending the contents listing; text before it is kept as the preamble
    pub preamble_marker: Option<String>,
    /// Where the back-matter marker is searched
    pub boundary_scan: BoundaryScan,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            start_marker: "*** START OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***"
                .to_string(),
            end_marker: "*** END OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***".to_string(),
            preamble_marker: Some(
                "Scene III. A churchyard; in it a Monument belonging to the Capulets."
                    .to_string(),
            ),
            boundary_scan: BoundaryScan::Rescan,
        }
    }
}

/// Output of one segmentation pass
#[derive(Debug, Clone)]
pub struct SegmentedCorpus {
    /// Blocks in document order (acts, then scenes, then blocks)
    pub chunks: Vec<Chunk>,
    /// Text before the preamble marker, when the marker is present
    pub preamble: Option<String>,
    /// Acts dropped for lacking scene headings, with their text length in bytes
    pub skipped_acts: Vec<(u32, usize)>,
}

/// A scene before it is cut into blocks
struct Scene {
    number: u32,
    text: String,
}

/// Splits the play into act/scene/block chunks
pub struct Segmenter {
    config: SegmenterConfig,
    act_heading: Regex,
    scene_heading: Regex,
    stage_direction: Regex,
    word_separators: Regex,
}

impl Segmenter {
    /// Create a segmenter with the given markers
    pub fn new(config: SegmenterConfig) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::internal(format!("bad pattern {}: {}", pattern, e)))
        };

        Ok(Self {
            config,
            act_heading: compile(ACT_HEADING)?,
            scene_heading: compile(SCENE_HEADING)?,
            stage_direction: compile(STAGE_DIRECTION)?,
            word_separators: compile(WORD_SEPARATORS)?,
        })
    }

    /// Segment raw corpus text into ordered chunks
    pub fn segment(&self, raw_text: &str) -> Result<SegmentedCorpus> {
        let body = self.story_body(raw_text)?;

        let preamble = self
            .config
            .preamble_marker
            .as_deref()
            .and_then(|marker| body.split_once(marker))
            .map(|(before, _)| before.trim().to_string());

        let mut chunks = Vec::new();
        let mut skipped_acts = Vec::new();
        for (act_number, act_text) in self.split_acts(body)? {
            let scenes = self.split_scenes(act_number, act_text)?;
            if scenes.is_empty() {
                let bytes = act_text.trim().len();
                tracing::info!(
                    "ACT {} has no scene headings, skipping {} bytes",
                    act_number,
                    bytes
                );
                skipped_acts.push((act_number, bytes));
                continue;
            }

            let scene_words: Vec<usize> = scenes.iter().map(|s| self.count_words(&s.text)).collect();
            let num_words_in_act: usize = scene_words.iter().sum();

            for (scene, number_words_in_scene) in scenes.iter().zip(scene_words) {
                for block in self.split_blocks(&scene.text) {
                    chunks.push(Chunk {
                        act: act_number,
                        scene: scene.number,
                        num_words_in_act,
                        number_words_in_scene,
                        possible_entities: BTreeSet::new(),
                        chunk_text: block,
                    });
                }
            }
        }

        tracing::info!("Segmented corpus into {} chunks", chunks.len());
        Ok(SegmentedCorpus {
            chunks,
            preamble,
            skipped_acts,
        })
    }

    /// Isolate the story body between the front- and back-matter markers
    fn story_body<'a>(&self, raw_text: &'a str) -> Result<&'a str> {
        let (_, after_start) = raw_text
            .split_once(self.config.start_marker.as_str())
            .ok_or_else(|| Error::parse("front-matter marker not found"))?;

        let scanned = match self.config.boundary_scan {
            BoundaryScan::Rescan => raw_text,
            BoundaryScan::Stripped => after_start,
        };

        let (body, _) = scanned
            .split_once(self.config.end_marker.as_str())
            .ok_or_else(|| Error::parse("back-matter marker not found"))?;

        Ok(body.trim())
    }

    /// Split the body at act headings, dropping anything before the first one
    fn split_acts<'a>(&self, body: &'a str) -> Result<Vec<(u32, &'a str)>> {
        let headings: Vec<_> = self.act_heading.captures_iter(body).collect();
        let mut acts = Vec::with_capacity(headings.len());

        for (i, caps) in headings.iter().enumerate() {
            let (Some(heading), Some(numeral)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = headings
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(body.len(), |m| m.start());

            acts.push((roman_to_int(numeral.as_str())?, &body[heading.end()..end]));
        }

        Ok(acts)
    }

    /// Split an act (heading already removed) into numbered scenes.
    ///
    /// Text before the first scene heading (an act-level chorus) is joined to
    /// the first scene. Headings and non-empty scene texts must pair up.
    fn split_scenes(&self, act_number: u32, act_text: &str) -> Result<Vec<Scene>> {
        let numbers = self
            .scene_heading
            .captures_iter(act_text)
            .filter_map(|caps| caps.get(1))
            .map(|m| roman_to_int(m.as_str()))
            .collect::<Result<Vec<_>>>()?;

        if numbers.is_empty() {
            return Ok(Vec::new());
        }

        let mut pieces = self.scene_heading.split(act_text);
        let lead_in = pieces.next().unwrap_or_default().trim();

        let mut texts: Vec<String> = pieces
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();

        if texts.len() != numbers.len() {
            return Err(Error::parse(format!(
                "ACT {} has {} scene headings but {} scene bodies",
                act_number,
                numbers.len(),
                texts.len()
            )));
        }

        if !lead_in.is_empty() {
            if let Some(first) = texts.first_mut() {
                *first = format!("{}\n\n{}", lead_in, first);
            }
        }

        Ok(numbers
            .into_iter()
            .zip(texts)
            .map(|(number, text)| Scene { number, text })
            .collect())
    }

    /// Cut a scene into blocks, each ending with its stage direction
    fn split_blocks(&self, scene_text: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut last = 0;

        for direction in self.stage_direction.find_iter(scene_text) {
            let segment = scene_text[last..direction.start()].trim();
            let block = format!("{} {}", segment, direction.as_str());
            let block = block.trim();
            if !block.is_empty() {
                blocks.push(block.to_string());
            }
            last = direction.end();
        }

        let tail = scene_text[last..].trim();
        if !tail.is_empty() {
            blocks.push(tail.to_string());
        }

        blocks
    }

    /// Word count by whitespace/punctuation splitting
    fn count_words(&self, text: &str) -> usize {
        self.word_separators
            .split(text)
            .filter(|token| !token.is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "*** START OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***";
    const END: &str = "*** END OF THE PROJECT GUTENBERG EBOOK ROMEO AND JULIET ***";

    fn segmenter() -> Segmenter {
        Segmenter::new(SegmenterConfig::default()).unwrap()
    }

    fn wrap(body: &str) -> String {
        format!("Front matter, license.\n{}\n{}\n{}\nBack matter.", START, body, END)
    }

    #[test]
    fn test_two_act_toy_corpus() {
        let text = wrap(
            "ACT I\n\nSCENE I. Verona.\n\nEnter Sampson and Gregory.\n\n\
             ACT II\n\nSCENE I. An orchard.\n\nEnter Romeo alone.",
        );
        let corpus = segmenter().segment(&text).unwrap();

        assert_eq!(corpus.chunks.len(), 2);
        assert_eq!(corpus.chunks[0].act, 1);
        assert_eq!(corpus.chunks[1].act, 2);
        assert_eq!(corpus.chunks[0].scene, 1);
        assert_eq!(corpus.chunks[1].scene, 1);
        assert!(corpus.chunks[1].chunk_text.contains("Romeo alone"));
    }

    #[test]
    fn test_missing_markers() {
        let s = segmenter();
        let no_start = format!("ACT I\nSCENE I.\ntext\n{}", END);
        assert!(matches!(s.segment(&no_start), Err(Error::Parse(_))));

        let no_end = format!("{}\nACT I\nSCENE I.\ntext", START);
        assert!(matches!(s.segment(&no_end), Err(Error::Parse(_))));
    }

    #[test]
    fn test_blocks_end_with_stage_direction() {
        let text = wrap(
            "ACT I\nSCENE I. A street.\nROMEO. Farewell. [_Exit._]\nJULIET. Stay. [_Exeunt._]\nNURSE. Madam!",
        );
        let chunks = segmenter().segment(&text).unwrap().chunks;
        let blocks: Vec<&str> = chunks.iter().map(|c| c.chunk_text.as_str()).collect();

        assert_eq!(
            blocks,
            vec![
                ". A street.\nROMEO. Farewell. [_Exit._]",
                "JULIET. Stay. [_Exeunt._]",
                "NURSE. Madam!",
            ]
        );
    }

    #[test]
    fn test_word_counts_aggregate_per_act() {
        let text = wrap(
            "ACT I\nSCENE I\none two three\nSCENE II\nfour, five; six-seven [_Exit._] eight\n\
             ACT II\nSCENE I\nnine",
        );
        let chunks = segmenter().segment(&text).unwrap().chunks;

        let act_one: Vec<&Chunk> = chunks.iter().filter(|c| c.act == 1).collect();
        assert_eq!(act_one.len(), 3);
        assert_eq!(act_one[0].number_words_in_scene, 3);
        // four, five, six, seven, [_Exit._], eight
        assert_eq!(act_one[1].number_words_in_scene, 6);
        assert_eq!(act_one[2].number_words_in_scene, 6);
        assert!(act_one.iter().all(|c| c.num_words_in_act == 9));

        let act_two: Vec<&Chunk> = chunks.iter().filter(|c| c.act == 2).collect();
        assert_eq!(act_two.len(), 1);
        assert_eq!(act_two[0].num_words_in_act, 1);
    }

    #[test]
    fn test_monotonic_traversal() {
        let text = wrap(
            "ACT I\nSCENE I.\na [_Exit._] b\nSCENE II.\nc\nSCENE III.\nd [_Exit._] e\n\
             ACT II\nSCENE I.\nf\nSCENE II.\ng [_Exeunt._]\n\
             ACT III\nSCENE I.\nh",
        );
        let chunks = segmenter().segment(&text).unwrap().chunks;
        assert_eq!(chunks.len(), 8);

        for pair in chunks.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.act >= a.act);
            if a.act == b.act {
                assert!(b.scene >= a.scene);
            }
        }
    }

    #[test]
    fn test_act_chorus_joins_first_scene() {
        let text = wrap("ACT II\nEnter Chorus.\nCHORUS. Now old desire\nSCENE I. An open place.\nEnter Romeo.");
        let chunks = segmenter().segment(&text).unwrap().chunks;

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].act, 2);
        assert_eq!(chunks[0].scene, 1);
        assert!(chunks[0].chunk_text.starts_with("Enter Chorus."));
        assert!(chunks[0].chunk_text.ends_with("Enter Romeo."));
    }

    #[test]
    fn test_empty_scene_body_is_parse_error() {
        let text = wrap("ACT I\nSCENE I\nSCENE II\nsome text");
        assert!(matches!(segmenter().segment(&text), Err(Error::Parse(_))));
    }

    #[test]
    fn test_contents_listing_contributes_nothing() {
        // Mixed-case "Scene" entries of a contents listing are not scene headings
        let text = format!(
            "Contents\nACT I\nScene I. A public place.\n{}\nACT I\nSCENE I. A public place.\nEnter Citizens.\n{}",
            START, END
        );
        let corpus = segmenter().segment(&text).unwrap();
        assert_eq!(corpus.chunks.len(), 1);
        assert_eq!(corpus.chunks[0].act, 1);
    }

    #[test]
    fn test_boundary_scan_modes() {
        let text = format!(
            "ACT IV\nSCENE II.\nfront matter scene\n{}\nACT I\nSCENE I.\nbody scene\n{}",
            START, END
        );

        let rescan = segmenter().segment(&text).unwrap().chunks;
        assert_eq!(rescan.len(), 2);
        assert_eq!(rescan[0].act, 4);

        let stripped = Segmenter::new(SegmenterConfig {
            boundary_scan: BoundaryScan::Stripped,
            ..SegmenterConfig::default()
        })
        .unwrap()
        .segment(&text)
        .unwrap()
        .chunks;
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped[0].act, 1);
    }

    #[test]
    fn test_preamble_extraction() {
        let marker = "Scene III. A churchyard; in it a Monument belonging to the Capulets.";
        let text = wrap(&format!(
            "Contents listing\n{}\nACT I\nSCENE I.\nEnter Citizens.",
            marker
        ));
        let corpus = segmenter().segment(&text).unwrap();
        assert_eq!(corpus.preamble.as_deref().map(|p| p.ends_with("Contents listing")), Some(true));

        let without = segmenter().segment(&wrap("ACT I\nSCENE I.\nEnter Citizens.")).unwrap();
        assert!(without.preamble.is_none());
    }

    #[test]
    fn test_prologue_in_contents_act_is_reported() {
        // The Act I chorus follows the last contents entry, before any SCENE heading
        let text = format!(
            "Contents\nACT I\nScene I. A public place.\nACT V\nScene III. A churchyard.\n{}\n\
             THE PROLOGUE\nEnter Chorus.\nTwo households, both alike in dignity.\n\
             ACT I\nSCENE I. A public place.\nEnter Sampson and Gregory.\n{}",
            START, END
        );
        let corpus = segmenter().segment(&text).unwrap();

        assert_eq!(corpus.chunks.len(), 1);
        assert!(!corpus.chunks[0].chunk_text.contains("Two households"));

        let (act, bytes) = *corpus.skipped_acts.last().unwrap();
        assert_eq!(act, 5);
        assert!(bytes > "Two households, both alike in dignity.".len());
        assert_eq!(corpus.skipped_acts.len(), 2);
    }
}
