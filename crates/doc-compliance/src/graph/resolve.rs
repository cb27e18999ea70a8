use std::collections::BTreeMap;

use super::{Block, BlockGraph, BlockType, RelationType};

impl BlockGraph {
    /// Report every `LINE` whose text starts with a required prefix but carries
    /// nothing after it. Diagnostics follow line order; a prefix that never
    /// appears produces nothing.
    pub fn scan_missing_fields<P: AsRef<str>>(&self, required_prefixes: &[P]) -> Vec<String> {
        let mut missing = Vec::new();

        for line in self.of_type(&BlockType::Line) {
            let Some(text) = self.text_of(line) else {
                continue;
            };
            let text = text.trim();

            let matched = required_prefixes
                .iter()
                .map(|prefix| prefix.as_ref())
                .filter(|prefix| !prefix.is_empty())
                .find(|prefix| text.starts_with(prefix));

            if let Some(prefix) = matched {
                if text[prefix.len()..].trim().is_empty() {
                    missing.push(format!("{prefix} is missing a value"));
                }
            }
        }

        missing
    }

    /// Map each key's text to the text of the value it points at.
    ///
    /// Keys are visited in original block order, so a repeated key text keeps
    /// the value of the last such key. Keys without a `VALUE` edge, or whose
    /// first target is absent or not a value block, are dropped.
    pub fn resolve_key_value_pairs(&self) -> BTreeMap<String, String> {
        let mut pairs = BTreeMap::new();

        for key in self.of_type(&BlockType::Key) {
            let Some(value) = self.value_for(key) else {
                continue;
            };
            let Some(key_text) = self.text_of(key) else {
                continue;
            };
            let value_text = self.text_of(value).unwrap_or_default();
            pairs.insert(key_text, value_text);
        }

        pairs
    }

    /// Value block bound to a key through the first target of its first
    /// `VALUE` relationship.
    pub fn value_for(&self, key: &Block) -> Option<&Block> {
        let target = key
            .relationships
            .iter()
            .find(|relationship| relationship.kind == RelationType::Value)?
            .ids
            .first()?;

        self.get(target.as_str())
            .filter(|block| block.block_type == BlockType::Value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Block, BlockGraph, BlockType, RelationType, Relationship};
    use serde_json::json;

    fn line(id: &str, text: &str) -> Block {
        Block::new(id, BlockType::Line).with_text(text)
    }

    fn key(id: &str, text: &str, targets: &[&str]) -> Block {
        Block::new(id, BlockType::Key)
            .with_text(text)
            .with_relationship(Relationship::new(
                RelationType::Value,
                targets.iter().copied(),
            ))
    }

    fn value(id: &str, text: &str) -> Block {
        Block::new(id, BlockType::Value).with_text(text)
    }

    const PREFIXES: [&str; 2] = ["Date:", "Signature:"];

    #[test]
    fn bare_label_is_reported_once() {
        let graph = BlockGraph::from_blocks(vec![line("l1", "Date:")]);
        assert_eq!(
            graph.scan_missing_fields(&PREFIXES),
            vec!["Date: is missing a value".to_string()]
        );
    }

    #[test]
    fn filled_label_is_not_reported() {
        let graph = BlockGraph::from_blocks(vec![line("l1", "Date: 2024-01-01")]);
        assert!(graph.scan_missing_fields(&PREFIXES).is_empty());
    }

    #[test]
    fn absent_label_is_not_reported() {
        let graph = BlockGraph::from_blocks(vec![
            line("l1", "Compliance Report"),
            line("l2", "Name: John Doe"),
        ]);
        assert!(graph.scan_missing_fields(&PREFIXES).is_empty());
    }

    #[test]
    fn diagnostics_follow_line_order_and_trim_whitespace() {
        let graph = BlockGraph::from_blocks(vec![
            line("l1", "  Signature:    "),
            Block::new("p1", BlockType::Page),
            line("l2", "Date:\t"),
            line("l3", "Signature: Jane Smith"),
            line("l4", "Signature:"),
        ]);

        assert_eq!(
            graph.scan_missing_fields(&PREFIXES),
            vec![
                "Signature: is missing a value".to_string(),
                "Date: is missing a value".to_string(),
                "Signature: is missing a value".to_string(),
            ]
        );
    }

    #[test]
    fn prefixes_are_case_sensitive() {
        let graph = BlockGraph::from_blocks(vec![line("l1", "date:")]);
        assert!(graph.scan_missing_fields(&PREFIXES).is_empty());
    }

    #[test]
    fn resolves_single_pair() {
        let graph = BlockGraph::from_records(vec![
            json!({"id": "k1", "type": "KEY", "text": "Name",
                   "relationships": [{"type": "VALUE", "targetIds": ["v1"]}]}),
            json!({"id": "v1", "type": "VALUE", "text": "John"}),
        ]);

        let pairs = graph.resolve_key_value_pairs();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.get("Name").map(String::as_str), Some("John"));
    }

    #[test]
    fn dangling_value_target_contributes_nothing() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Name", &["missing"]),
            key("k2", "Department", &["v2"]),
            value("v2", "Sales"),
        ]);

        let pairs = graph.resolve_key_value_pairs();
        assert_eq!(pairs.len(), 1);
        assert!(!pairs.contains_key("Name"));
        assert_eq!(pairs["Department"], "Sales");
    }

    #[test]
    fn keys_without_value_edge_are_dropped() {
        let graph = BlockGraph::from_blocks(vec![
            Block::new("k1", BlockType::Key)
                .with_text("Position")
                .with_relationship(Relationship::new(RelationType::Child, ["v1"])),
            value("v1", "Advisor"),
        ]);

        assert!(graph.resolve_key_value_pairs().is_empty());
    }

    #[test]
    fn only_first_target_is_bound() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Name", &["v1", "v2"]),
            value("v1", "John"),
            value("v2", "Doe"),
        ]);

        assert_eq!(graph.resolve_key_value_pairs()["Name"], "John");
    }

    #[test]
    fn target_of_wrong_type_is_ignored() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Name", &["l1"]),
            line("l1", "John"),
        ]);

        assert!(graph.resolve_key_value_pairs().is_empty());
    }

    #[test]
    fn later_duplicate_key_wins() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Date", &["v1"]),
            value("v1", "01/01/2025"),
            key("k2", "Date", &["v2"]),
            value("v2", "15/01/2025"),
        ]);

        for _ in 0..3 {
            assert_eq!(graph.resolve_key_value_pairs()["Date"], "15/01/2025");
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Name", &["v1"]),
            value("v1", "John Doe"),
            key("k2", "Department", &["v2"]),
            value("v2", "Sales"),
        ]);

        assert_eq!(
            graph.resolve_key_value_pairs(),
            graph.resolve_key_value_pairs()
        );
    }

    #[test]
    fn resolves_service_key_value_sets_through_words() {
        let graph = BlockGraph::from_records(vec![
            json!({"Id": "k1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["KEY"],
                   "Relationships": [{"Type": "VALUE", "Ids": ["v1"]},
                                     {"Type": "CHILD", "Ids": ["w1"]}]}),
            json!({"Id": "v1", "BlockType": "KEY_VALUE_SET", "EntityTypes": ["VALUE"],
                   "Relationships": [{"Type": "CHILD", "Ids": ["w2", "w3"]}]}),
            json!({"Id": "w1", "BlockType": "WORD", "Text": "Reviewed by:"}),
            json!({"Id": "w2", "BlockType": "WORD", "Text": "Jane"}),
            json!({"Id": "w3", "BlockType": "WORD", "Text": "Smith"}),
        ]);

        assert_eq!(graph.resolve_key_value_pairs()["Reviewed by:"], "Jane Smith");
    }

    #[test]
    fn value_without_text_binds_empty_string() {
        let graph = BlockGraph::from_blocks(vec![
            key("k1", "Signature:", &["v1"]),
            Block::new("v1", BlockType::Value),
        ]);

        assert_eq!(graph.resolve_key_value_pairs()["Signature:"], "");
    }
}
