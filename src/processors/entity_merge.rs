//! Entity merging.
//!
//! Folds the classifier's per-token tags into text spans. Sub-word pieces of a
//! word are glued back together; every new word starts a new entity, even when
//! it carries the same label as the previous one.

use crate::domain::{ClassifiedToken, Entity, EntityLabel};

/// Merges classified tokens into entities in a single streaming pass.
///
/// Tokens labelled `O` and special tokens are skipped. A token is appended
/// (without separator) to the open entity when it is a continuation piece
/// with the same label; otherwise it opens a new entity anchored at the
/// token's top-left corner.
pub fn merge_entities(tokens: &[ClassifiedToken]) -> Vec<Entity> {
    let mut entities: Vec<Entity> = Vec::new();

    for token in tokens {
        if token.is_special || token.is_outside() {
            continue;
        }

        let label = EntityLabel::from_tag(&token.label);

        match entities.last_mut() {
            Some(open) if token.is_continuation && open.label == label => {
                open.text.push_str(&token.text);
            }
            _ => entities.push(Entity::new(
                token.text.clone(),
                label,
                token.bbox.x0 as i64,
                token.bbox.y0 as i64,
            )),
        }
    }

    entities
}
