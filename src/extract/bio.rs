//! BIO tag decoding for sequence-labelling NER models

use super::Mention;
use rustc_hash::FxHashMap;

const SPECIAL_TOKENS: &[&str] = &["[CLS]", "[SEP]", "[PAD]"];

/// Mentions from `(token, tag)` pairs tagged `B-<type>`, `I-<type>` or `O`.
///
/// `##` word-piece markers are stripped, special tokens are skipped and an
/// `I-` tag outside an entity is ignored. Mentions are deduplicated by text:
/// each keeps the position of its first appearance and the type of its last.
pub fn decode_bio<T, L>(tagged: &[(T, L)]) -> Vec<Mention>
where
    T: AsRef<str>,
    L: AsRef<str>,
{
    let mut mentions = Vec::new();
    let mut current: Option<Mention> = None;

    for (token, tag) in tagged {
        let (token, tag) = (token.as_ref(), tag.as_ref());
        if SPECIAL_TOKENS.contains(&token) {
            continue;
        }
        let piece = token.trim_start_matches("##");

        if let Some(entity_type) = tag.strip_prefix("B-") {
            mentions.extend(current.take());
            current = Some(Mention::new(piece, entity_type));
        } else if tag.starts_with("I-") {
            if let Some(mention) = current.as_mut() {
                mention.text.push_str(piece);
            }
        } else {
            mentions.extend(current.take());
        }
    }
    mentions.extend(current);

    let mut position: FxHashMap<String, usize> = FxHashMap::default();
    let mut unique: Vec<Mention> = Vec::with_capacity(mentions.len());
    for mention in mentions {
        match position.get(&mention.text) {
            Some(&i) => unique[i].entity_type = mention.entity_type,
            None => {
                position.insert(mention.text.clone(), unique.len());
                unique.push(mention);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bio() {
        let tagged = [
            ("[CLS]", "O"),
            ("马", "B-PER"),
            ("云", "I-PER"),
            ("创", "O"),
            ("立", "O"),
            ("阿", "B-ORG"),
            ("##里", "I-ORG"),
            ("巴", "I-ORG"),
            ("巴", "I-ORG"),
            ("[SEP]", "O"),
        ];
        assert_eq!(
            decode_bio(&tagged),
            vec![Mention::new("马云", "PER"), Mention::new("阿里巴巴", "ORG")]
        );
    }

    #[test]
    fn test_entity_at_end_and_stray_inside_tag() {
        let tagged = vec![
            ("在".to_string(), "I-LOC".to_string()),
            ("杭".to_string(), "B-LOC".to_string()),
            ("州".to_string(), "I-LOC".to_string()),
        ];
        assert_eq!(decode_bio(&tagged), vec![Mention::new("杭州", "LOC")]);
    }

    #[test]
    fn test_adjacent_entities_and_duplicates() {
        let tagged = [
            ("腾", "B-ORG"),
            ("讯", "I-ORG"),
            ("腾", "B-ORG"),
            ("讯", "I-ORG"),
            ("深", "B-LOC"),
        ];
        assert_eq!(
            decode_bio(&tagged),
            vec![Mention::new("腾讯", "ORG"), Mention::new("深", "LOC")]
        );
    }

    #[test]
    fn test_duplicate_mention_takes_last_type() {
        let tagged = [
            ("苹", "B-ORG"),
            ("果", "I-ORG"),
            ("和", "O"),
            ("梨", "B-FRUIT"),
            ("苹", "B-FRUIT"),
            ("果", "I-FRUIT"),
        ];
        assert_eq!(
            decode_bio(&tagged),
            vec![Mention::new("苹果", "FRUIT"), Mention::new("梨", "FRUIT")]
        );
    }
}
