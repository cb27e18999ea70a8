use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque block identifier, unique within one job's result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BlockId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Node classification reported by the analysis service.
///
/// The service also emits `KEY_VALUE_SET` records whose entity type decides
/// whether they act as a key or a value; those are folded into [`BlockType::Key`]
/// and [`BlockType::Value`] while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockType {
    Page,
    Line,
    Key,
    Value,
    Word,
    Other(String),
}

impl BlockType {
    pub fn from_wire(raw: &str, entity_types: &[String]) -> Self {
        match raw {
            "PAGE" => Self::Page,
            "LINE" => Self::Line,
            "KEY" => Self::Key,
            "VALUE" => Self::Value,
            "WORD" => Self::Word,
            "KEY_VALUE_SET" => {
                if entity_types.iter().any(|entity| entity == "KEY") {
                    Self::Key
                } else if entity_types.iter().any(|entity| entity == "VALUE") {
                    Self::Value
                } else {
                    Self::Other(raw.to_string())
                }
            }
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Page => "PAGE",
            Self::Line => "LINE",
            Self::Key => "KEY",
            Self::Value => "VALUE",
            Self::Word => "WORD",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for BlockType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Edge label on a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationType {
    Value,
    Child,
    Other(String),
}

impl RelationType {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "VALUE" => Self::Value,
            "CHILD" => Self::Child,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Value => "VALUE",
            Self::Child => "CHILD",
            Self::Other(raw) => raw,
        }
    }
}

impl Serialize for RelationType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Directed, typed edge from one block to an ordered list of target ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: RelationType,
    #[serde(rename = "targetIds")]
    pub ids: Vec<BlockId>,
}

impl Relationship {
    pub fn new(kind: RelationType, ids: impl IntoIterator<Item = impl Into<BlockId>>) -> Self {
        Self {
            kind,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Single node of an analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock")]
pub struct Block {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
    #[serde(rename = "entityTypes", skip_serializing_if = "Vec::is_empty")]
    pub entity_types: Vec<String>,
    pub relationships: Vec<Relationship>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            text: None,
            confidence: None,
            geometry: None,
            entity_types: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }
}

/// Reasons a record cannot become a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockDecodeError {
    #[error("block record has no id")]
    MissingId,
    #[error("block record {0} has no type")]
    MissingType(String),
}

/// Loose wire shape; accepts both the service's PascalCase keys and camelCase.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawBlock {
    #[serde(default, alias = "Id")]
    id: Option<String>,
    #[serde(default, rename = "type", alias = "BlockType")]
    block_type: Option<String>,
    #[serde(default, alias = "Text")]
    text: Option<String>,
    #[serde(default, alias = "Confidence")]
    confidence: Option<f64>,
    #[serde(default, alias = "Geometry")]
    geometry: Option<Value>,
    #[serde(default, rename = "entityTypes", alias = "EntityTypes")]
    entity_types: Option<Vec<String>>,
    #[serde(default, alias = "Relationships")]
    relationships: Option<Vec<RawRelationship>>,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    #[serde(default, rename = "type", alias = "Type")]
    kind: Option<String>,
    #[serde(default, rename = "targetIds", alias = "Ids")]
    ids: Option<Vec<String>>,
}

impl TryFrom<RawBlock> for Block {
    type Error = BlockDecodeError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or(BlockDecodeError::MissingId)?;
        let block_type = raw
            .block_type
            .filter(|kind| !kind.is_empty())
            .ok_or_else(|| BlockDecodeError::MissingType(id.clone()))?;

        let entity_types = raw.entity_types.unwrap_or_default();
        let relationships = raw
            .relationships
            .unwrap_or_default()
            .into_iter()
            .filter_map(|relationship| {
                let kind = relationship.kind?;
                Some(Relationship {
                    kind: RelationType::from_wire(&kind),
                    ids: relationship
                        .ids
                        .unwrap_or_default()
                        .into_iter()
                        .map(BlockId)
                        .collect(),
                })
            })
            .collect();

        Ok(Block {
            id: BlockId(id),
            block_type: BlockType::from_wire(&block_type, &entity_types),
            text: raw.text,
            confidence: raw.confidence,
            geometry: raw.geometry,
            entity_types,
            relationships,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_service_pascal_case_records() {
        let block: Block = serde_json::from_value(json!({
            "Id": "k1",
            "BlockType": "KEY_VALUE_SET",
            "EntityTypes": ["KEY"],
            "Confidence": 97.5,
            "Geometry": {"BoundingBox": {"Width": 0.1}},
            "Relationships": [{"Type": "VALUE", "Ids": ["v1", "v2"]}]
        }))
        .expect("block decodes");

        assert_eq!(block.id, BlockId::from("k1"));
        assert_eq!(block.block_type, BlockType::Key);
        assert_eq!(block.confidence, Some(97.5));
        assert_eq!(block.relationships[0].kind, RelationType::Value);
        assert_eq!(
            block.relationships[0].ids,
            vec![BlockId::from("v1"), BlockId::from("v2")]
        );
    }

    #[test]
    fn decodes_camel_case_records() {
        let block: Block = serde_json::from_value(json!({
            "id": "l1",
            "type": "LINE",
            "text": "Date: 2024-01-01"
        }))
        .expect("block decodes");

        assert_eq!(block.block_type, BlockType::Line);
        assert_eq!(block.text.as_deref(), Some("Date: 2024-01-01"));
        assert!(block.relationships.is_empty());
    }

    #[test]
    fn unknown_types_are_kept_as_other() {
        let block: Block = serde_json::from_value(json!({"id": "t1", "type": "TABLE"}))
            .expect("block decodes");
        assert_eq!(block.block_type, BlockType::Other("TABLE".to_string()));
    }

    #[test]
    fn missing_id_or_type_is_rejected() {
        let missing_id = serde_json::from_value::<Block>(json!({"type": "LINE"}));
        assert!(missing_id.is_err());

        let raw: RawBlock = serde_json::from_value(json!({"id": "x"})).expect("raw decodes");
        assert_eq!(
            Block::try_from(raw),
            Err(BlockDecodeError::MissingType("x".to_string()))
        );
    }

    #[test]
    fn confidence_and_geometry_survive_serialization() {
        let block: Block = serde_json::from_value(json!({
            "Id": "w1",
            "BlockType": "WORD",
            "Text": "John",
            "Confidence": 88.25,
            "Geometry": {"Polygon": [{"X": 0.5, "Y": 0.25}]}
        }))
        .expect("block decodes");

        let encoded = serde_json::to_value(&block).expect("block encodes");
        assert_eq!(encoded["confidence"], json!(88.25));
        assert_eq!(encoded["geometry"], json!({"Polygon": [{"X": 0.5, "Y": 0.25}]}));

        let decoded: Block = serde_json::from_value(encoded).expect("block decodes again");
        assert_eq!(decoded, block);
    }
}
