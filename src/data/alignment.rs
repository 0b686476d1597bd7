// ============================================================
// Layer 4 — Label Alignment Engine
// ============================================================
// Annotators label WORDS; the model scores SUBWORD TOKENS. This
// module turns one into the other.
//
// Input for one sentence:
//   words      ["Mary", "sold", "books"]
//   labels     [{AGENT}, {}, {THEME}]
//   word_ids   [None, 0, 1, 2, 2, None]     ← from the tokenizer
//               <s>  Mary sold bo oks </s>
//
// Output (L = 3, AGENT=0 THEME=1 LOCATION=2):
//   <s>    Ignored
//   Mary   Scored [1,0,0]
//   sold   Scored [0,0,0]     ← empty set is still scored
//   bo     Scored [0,1,0]
//   oks    Scored [0,1,0]     ← LabelAllTokens
//          Ignored            ← FirstTokenOnly
//   </s>   Ignored
//
// A token is a continuation piece when it maps to the same word
// as the token right before it.
//
// Sentences are independent, so a whole corpus is aligned with a
// rayon parallel iterator. collect() keeps the input order.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::dataset::AlignedSample;
use crate::domain::annotation::AnnotatedSentence;
use crate::domain::error::AlignmentError;
use crate::domain::multi_hot::to_vector;
use crate::domain::token_row::TokenRow;
use crate::domain::traits::WordTokenizer;

/// What to do with the second and later subword pieces of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContinuationPolicy {
    /// Every piece carries the word's labels
    #[default]
    LabelAllTokens,

    /// Only the first piece is scored; the rest are ignored
    FirstTokenOnly,
}

#[derive(Debug, Clone, Copy)]
pub struct LabelAligner {
    num_labels: usize,
    policy:     ContinuationPolicy,
}

impl LabelAligner {
    pub fn new(num_labels: usize, policy: ContinuationPolicy) -> Self {
        Self { num_labels, policy }
    }

    /// The continuation policy this aligner applies.
    pub fn policy(&self) -> ContinuationPolicy {
        self.policy
    }

    /// Build one `TokenRow` per subword token of `sentence`.
    pub fn align(
        &self,
        sentence: &AnnotatedSentence,
        word_ids: &[Option<usize>],
    ) -> Result<Vec<TokenRow>, AlignmentError> {
        sentence.validate(self.num_labels)?;

        let word_count   = sentence.word_count();
        let mut rows     = Vec::with_capacity(word_ids.len());
        let mut previous = None;

        for (token, &word) in word_ids.iter().enumerate() {
            let row = match word {
                None => TokenRow::Ignored,
                Some(w) if w >= word_count => {
                    return Err(AlignmentError::WordIndexOutOfRange {
                        token,
                        word_index: w,
                        word_count,
                    });
                }
                Some(w) if previous == Some(w) && self.policy == ContinuationPolicy::FirstTokenOnly => {
                    TokenRow::Ignored
                }
                Some(w) => TokenRow::Scored(to_vector(&sentence.labels[w], self.num_labels)?),
            };
            rows.push(row);
            previous = word;
        }

        Ok(rows)
    }
}

/// Tokenise and align every sentence, preserving input order.
pub fn align_corpus<T: WordTokenizer + ?Sized>(
    tokenizer: &T,
    aligner:   &LabelAligner,
    sentences: &[AnnotatedSentence],
) -> Result<Vec<AlignedSample>> {
    sentences
        .par_iter()
        .enumerate()
        .map(|(i, sentence)| {
            let encoding = tokenizer
                .tokenize_words(&sentence.words)
                .with_context(|| format!("Cannot tokenise sentence {i}"))?;
            let rows = aligner
                .align(sentence, &encoding.word_ids)
                .with_context(|| format!("Cannot align labels of sentence {i}: '{}'", sentence.text()))?;
            Ok(AlignedSample::new(
                encoding.input_ids,
                encoding.attention_mask,
                rows,
                sentence.words.clone(),
            ))
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::SubwordEncoding;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const AGENT: usize = 0;

    /// One piece per three characters of each word, sentence wrapped
    /// in <s> ... </s>.
    struct PieceTokenizer;

    impl WordTokenizer for PieceTokenizer {
        fn tokenize_words(&self, words: &[String]) -> Result<SubwordEncoding> {
            let mut word_ids = vec![None];
            for (w, word) in words.iter().enumerate() {
                let pieces = word.len().div_ceil(3).max(1);
                word_ids.extend(std::iter::repeat(Some(w)).take(pieces));
            }
            word_ids.push(None);
            let n = word_ids.len();
            Ok(SubwordEncoding {
                input_ids: (0..n as u32).collect(),
                attention_mask: vec![1; n],
                word_ids,
            })
        }
    }

    fn sentence(words: &[&str], labels: Vec<BTreeSet<usize>>) -> AnnotatedSentence {
        AnnotatedSentence::new(words.iter().map(|w| w.to_string()).collect(), labels)
    }

    #[test]
    fn test_end_to_end_scenario_label_all_tokens() {
        // word 0 → {AGENT} split into tokens 0 and 1, word 1 → {} is token 2
        let s = sentence(&["Marianne", "ran"], vec![BTreeSet::from([AGENT]), BTreeSet::new()]);
        let aligner = LabelAligner::new(3, ContinuationPolicy::LabelAllTokens);
        let rows = aligner.align(&s, &[Some(0), Some(0), Some(1)]).unwrap();

        assert_eq!(rows, vec![
            TokenRow::Scored(vec![true, false, false]),
            TokenRow::Scored(vec![true, false, false]),
            TokenRow::Scored(vec![false, false, false]),
        ]);
    }

    #[test]
    fn test_first_token_only_ignores_continuation_pieces() {
        let s = sentence(&["Marianne", "ran"], vec![BTreeSet::from([AGENT]), BTreeSet::new()]);
        let aligner = LabelAligner::new(3, ContinuationPolicy::FirstTokenOnly);
        assert_eq!(aligner.policy(), ContinuationPolicy::FirstTokenOnly);

        let rows = aligner.align(&s, &[None, Some(0), Some(0), Some(1), None]).unwrap();
        assert_eq!(rows, vec![
            TokenRow::Ignored,
            TokenRow::Scored(vec![true, false, false]),
            TokenRow::Ignored,
            TokenRow::Scored(vec![false, false, false]),
            TokenRow::Ignored,
        ]);
    }

    #[test]
    fn test_default_policy_labels_all_tokens() {
        assert_eq!(ContinuationPolicy::default(), ContinuationPolicy::LabelAllTokens);
    }

    #[test]
    fn test_structural_tokens_are_ignored() {
        let s = sentence(&["ran"], vec![BTreeSet::from([1])]);
        let aligner = LabelAligner::new(2, ContinuationPolicy::LabelAllTokens);
        let rows = aligner.align(&s, &[None, Some(0), None]).unwrap();
        assert_eq!(rows[0], TokenRow::Ignored);
        assert_eq!(rows[1], TokenRow::Scored(vec![false, true]));
        assert_eq!(rows[2], TokenRow::Ignored);
    }

    #[test]
    fn test_word_index_out_of_range_is_rejected() {
        let s = sentence(&["ran"], vec![BTreeSet::new()]);
        let aligner = LabelAligner::new(2, ContinuationPolicy::LabelAllTokens);
        assert_eq!(
            aligner.align(&s, &[None, Some(0), Some(1)]),
            Err(AlignmentError::WordIndexOutOfRange { token: 2, word_index: 1, word_count: 1 })
        );
    }

    #[test]
    fn test_label_outside_vocabulary_is_rejected() {
        let s = sentence(&["ran"], vec![BTreeSet::from([4])]);
        let aligner = LabelAligner::new(2, ContinuationPolicy::LabelAllTokens);
        assert_eq!(
            aligner.align(&s, &[Some(0)]),
            Err(AlignmentError::LabelOutOfRange { label: 4, num_labels: 2 })
        );
    }

    #[test]
    fn test_corpus_alignment_keeps_sentence_order() {
        let sentences: Vec<_> = (0..64)
            .map(|i| sentence(&[format!("w{i}").as_str(), "x"], vec![BTreeSet::from([i % 3]), BTreeSet::new()]))
            .collect();
        let aligner = LabelAligner::new(3, ContinuationPolicy::LabelAllTokens);
        let samples = align_corpus(&PieceTokenizer, &aligner, &sentences).unwrap();

        assert_eq!(samples.len(), 64);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.words[0], format!("w{i}"));
            let first = sample.rows[1].labels().unwrap();
            assert!(first[i % 3]);
        }
    }

    #[test]
    fn test_corpus_alignment_reports_failing_sentence() {
        let sentences = vec![sentence(&["ok"], vec![BTreeSet::from([7])])];
        let aligner = LabelAligner::new(3, ContinuationPolicy::LabelAllTokens);
        let err = align_corpus(&PieceTokenizer, &aligner, &sentences).unwrap_err();
        assert!(err.to_string().contains("sentence 0"));
    }

    fn arb_sentence() -> impl Strategy<Value = AnnotatedSentence> {
        proptest::collection::vec(
            ("[a-z]{1,10}", proptest::collection::btree_set(0usize..4, 0..=4)),
            1..12,
        )
        .prop_map(|pairs| {
            let (words, labels): (Vec<String>, Vec<BTreeSet<usize>>) = pairs.into_iter().unzip();
            AnnotatedSentence::new(words, labels)
        })
    }

    proptest! {
        #[test]
        fn rows_are_ignored_or_full_width(s in arb_sentence(), first_only in any::<bool>()) {
            let policy = if first_only {
                ContinuationPolicy::FirstTokenOnly
            } else {
                ContinuationPolicy::LabelAllTokens
            };
            let encoding = PieceTokenizer.tokenize_words(&s.words).unwrap();
            let rows = LabelAligner::new(4, policy).align(&s, &encoding.word_ids).unwrap();

            prop_assert_eq!(rows.len(), encoding.word_ids.len());
            for (row, word) in rows.iter().zip(&encoding.word_ids) {
                match row {
                    TokenRow::Scored(v) => {
                        prop_assert_eq!(v.len(), 4);
                        prop_assert!(word.is_some());
                    }
                    TokenRow::Ignored => {}
                }
                if word.is_none() {
                    prop_assert_eq!(row, &TokenRow::Ignored);
                }
            }
        }

        #[test]
        fn continuation_policy_shapes_word_pieces(s in arb_sentence()) {
            let encoding = PieceTokenizer.tokenize_words(&s.words).unwrap();
            let all   = LabelAligner::new(4, ContinuationPolicy::LabelAllTokens).align(&s, &encoding.word_ids).unwrap();
            let first = LabelAligner::new(4, ContinuationPolicy::FirstTokenOnly).align(&s, &encoding.word_ids).unwrap();

            for w in 0..s.word_count() {
                let pieces: Vec<usize> = encoding.word_ids.iter()
                    .enumerate()
                    .filter_map(|(t, id)| (*id == Some(w)).then_some(t))
                    .collect();
                let expected = TokenRow::Scored(to_vector(&s.labels[w], 4).unwrap());

                for &t in &pieces {
                    prop_assert_eq!(&all[t], &expected);
                }
                prop_assert_eq!(&first[pieces[0]], &expected);
                for &t in &pieces[1..] {
                    prop_assert_eq!(&first[t], &TokenRow::Ignored);
                }
            }
        }
    }
}
