use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Position;

/// Position-keyed diagnostic messages of one module.
///
/// Two messages reported at the same position are joined with a newline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(BTreeMap<Position, String>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Position, message: impl Into<String>) {
        let message = message.into();
        self.0
            .entry(position)
            .and_modify(|existing| {
                existing.push('\n');
                existing.push_str(&message);
            })
            .or_insert(message);
    }

    pub fn get(&self, position: Position) -> Option<&str> {
        self.0.get(&position).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &str)> {
        self.0.iter().map(|(position, message)| (*position, message.as_str()))
    }

    /// True if any message at any position contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.0.values().any(|message| message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_at_same_position_are_joined() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add(4, "first");
        diagnostics.add(4, "second");
        diagnostics.add(0, "other");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.get(4), Some("first\nsecond"));
        assert_eq!(diagnostics.get(0), Some("other"));
        assert!(diagnostics.contains("second"));
    }

    #[test]
    fn test_iteration_is_ordered_by_position() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add(30, "c");
        diagnostics.add(10, "a");
        diagnostics.add(20, "b");

        let positions: Vec<_> = diagnostics.iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![10, 20, 30]);
    }
}
