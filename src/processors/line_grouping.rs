//! Line grouping.
//!
//! Groups entities into visual rows by vertical position, then orders each row
//! left to right. The tolerance is compared against the entity most recently
//! added to the open row, so a slowly drifting row stays in one line.

use crate::core::constants::LINE_Y_TOLERANCE;
use crate::domain::{Entity, Line};

/// Groups entities into lines using a vertical tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineGrouper {
    y_tolerance: i64,
}

impl Default for LineGrouper {
    fn default() -> Self {
        Self {
            y_tolerance: LINE_Y_TOLERANCE,
        }
    }
}

impl LineGrouper {
    /// Creates a grouper with the default tolerance of 15 normalized units.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the vertical tolerance, in normalized units.
    pub fn with_y_tolerance(mut self, y_tolerance: i64) -> Self {
        self.y_tolerance = y_tolerance;
        self
    }

    /// Returns the vertical tolerance.
    pub fn y_tolerance(&self) -> i64 {
        self.y_tolerance
    }

    /// Groups `entities` into lines ordered top to bottom.
    ///
    /// Entities are stable-sorted by `y`. An entity joins the open line when
    /// `|y - last.y| < tolerance`, where `last` is the previous entity added to
    /// that line; otherwise the line is closed and a new one is started. Each
    /// closed line is stable-sorted by `x`.
    pub fn group(&self, mut entities: Vec<Entity>) -> Vec<Line> {
        if entities.is_empty() {
            return Vec::new();
        }

        entities.sort_by_key(|e| e.y);

        let mut lines = Vec::new();
        let mut current: Vec<Entity> = Vec::new();

        for entity in entities {
            let same_row = current
                .last()
                .is_some_and(|last| (entity.y - last.y).abs() < self.y_tolerance);
            if !same_row && !current.is_empty() {
                lines.push(close_line(std::mem::take(&mut current)));
            }
            current.push(entity);
        }
        lines.push(close_line(current));

        lines
    }
}

fn close_line(mut entities: Vec<Entity>) -> Line {
    entities.sort_by_key(|e| e.x);
    Line::new(entities)
}

/// Groups entities into lines with the default tolerance.
pub fn group_lines(entities: Vec<Entity>) -> Vec<Line> {
    LineGrouper::default().group(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityLabel;

    fn entity(text: &str, x: i64, y: i64) -> Entity {
        Entity::new(text, EntityLabel::Question, x, y)
    }

    fn texts(line: &Line) -> Vec<&str> {
        line.entities().iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input_gives_no_lines() {
        assert!(group_lines(Vec::new()).is_empty());
    }

    #[test]
    fn test_rows_are_split_and_sorted_left_to_right() {
        let entities = vec![
            entity("John", 300, 102),
            entity("Address", 10, 150),
            entity("Name", 10, 100),
            entity("Tunis", 300, 149),
        ];
        let lines = group_lines(entities);
        assert_eq!(lines.len(), 2);
        assert_eq!(texts(&lines[0]), vec!["Name", "John"]);
        assert_eq!(texts(&lines[1]), vec!["Address", "Tunis"]);
    }

    #[test]
    fn test_tolerance_is_strict() {
        let lines = group_lines(vec![entity("a", 0, 100), entity("b", 10, 114)]);
        assert_eq!(lines.len(), 1);

        let lines = group_lines(vec![entity("a", 0, 100), entity("b", 10, 115)]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_tolerance_is_chained_to_last_entity() {
        // Each step is within tolerance of the previous entity, although the
        // first and last are 40 units apart.
        let entities = vec![
            entity("a", 40, 100),
            entity("b", 30, 110),
            entity("c", 20, 120),
            entity("d", 10, 130),
            entity("e", 0, 140),
        ];
        let lines = group_lines(entities);
        assert_eq!(lines.len(), 1);
        assert_eq!(texts(&lines[0]), vec!["e", "d", "c", "b", "a"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let entities = vec![
            entity("first", 50, 10),
            entity("second", 50, 10),
            entity("third", 50, 10),
        ];
        let lines = group_lines(entities);
        assert_eq!(texts(&lines[0]), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_custom_tolerance() {
        let grouper = LineGrouper::new().with_y_tolerance(5);
        assert_eq!(grouper.y_tolerance(), 5);
        let lines = grouper.group(vec![entity("a", 0, 100), entity("b", 10, 110)]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_every_entity_lands_in_exactly_one_line() {
        let mut seed: u64 = 42;
        let mut entities = Vec::new();
        for i in 0..200 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let x = ((seed >> 33) % 1000) as i64;
            let y = ((seed >> 13) % 1000) as i64;
            entities.push(entity(&format!("e{i}"), x, y));
        }

        let lines = group_lines(entities.clone());

        let mut grouped: Vec<Entity> = lines.iter().flat_map(|l| l.entities.clone()).collect();
        let mut expected = entities;
        grouped.sort_by(|a, b| a.text.cmp(&b.text));
        expected.sort_by(|a, b| a.text.cmp(&b.text));
        assert_eq!(grouped, expected);

        let first_ys: Vec<i64> = lines
            .iter()
            .map(|l| l.entities.iter().map(|e| e.y).min().unwrap())
            .collect();
        assert!(first_ys.windows(2).all(|w| w[0] <= w[1]));

        for line in &lines {
            assert!(!line.is_empty());
            assert!(line.entities.windows(2).all(|w| w[0].x <= w[1].x));
        }
    }
}
