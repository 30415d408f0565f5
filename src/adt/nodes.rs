// src/adt/nodes.rs
// =============================================================================
// Node records and the node-structure XML parser.
//
// A node-structure response looks like this (trimmed):
//
//   <asx:abap xmlns:asx="http://www.sap.com/abapxml">
//     <asx:values><DATA><TREE_CONTENT>
//       <SEU_ADT_REPOSITORY_OBJ_NODE>
//         <OBJECT_TYPE>DEVC/K</OBJECT_TYPE>
//         <OBJECT_NAME>ZD256_DEMO</OBJECT_NAME>
//         <TECH_NAME>ZD256_DEMO</TECH_NAME>
//         <OBJECT_URI>/sap/bc/adt/packages/zd256_demo</OBJECT_URI>
//         <OBJECT_VIT_URI>/sap/bc/adt/vit/wb/object_type/devck/object_name/ZD256_DEMO</OBJECT_VIT_URI>
//         <EXPANDABLE>X</EXPANDABLE>
//       </SEU_ADT_REPOSITORY_OBJ_NODE>
//       ...
//
// Every SEU_ADT_REPOSITORY_OBJ_NODE element becomes one NodeRecord.
// A missing or empty child element becomes an empty string.
//
// Rust concepts:
// - serde rename: the Rust fields are snake_case, the CSV columns keep the
//   ADT names
// - serialize_with / deserialize_with: custom text form for a bool
// =============================================================================

use roxmltree::{Document, Node};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

const NODE_TAG: &str = "SEU_ADT_REPOSITORY_OBJ_NODE";

/// ADT marks expandable nodes with "X" and leaves the field empty otherwise.
const EXPANDABLE_FLAG: &str = "X";

/// One entry of a package listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "OBJECT_TYPE")]
    pub object_type: String,
    #[serde(rename = "OBJECT_NAME")]
    pub object_name: String,
    #[serde(rename = "TECH_NAME")]
    pub technical_name: String,
    #[serde(rename = "OBJECT_URI")]
    pub object_uri: String,
    #[serde(rename = "OBJECT_VIT_URI")]
    pub object_vit_uri: String,
    #[serde(
        rename = "EXPANDABLE",
        serialize_with = "serialize_flag",
        deserialize_with = "deserialize_flag"
    )]
    pub expandable: bool,
}

impl NodeRecord {
    fn from_element(node: Node<'_, '_>) -> Self {
        Self {
            object_type: child_text(node, "OBJECT_TYPE"),
            object_name: child_text(node, "OBJECT_NAME"),
            technical_name: child_text(node, "TECH_NAME"),
            object_uri: child_text(node, "OBJECT_URI"),
            object_vit_uri: child_text(node, "OBJECT_VIT_URI"),
            expandable: child_text(node, "EXPANDABLE").trim() == EXPANDABLE_FLAG,
        }
    }
}

// Parses a node-structure body into records, in document order.
//
// A blank body is "no data" and yields an empty list. Callers that care
// about the difference check for blank bodies before calling this.
pub fn parse_node_structure(body: &[u8]) -> Result<Vec<NodeRecord>, ParseError> {
    let text = std::str::from_utf8(body)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let doc = Document::parse(text)?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name(NODE_TAG))
        .map(NodeRecord::from_element)
        .collect())
}

fn child_text(node: Node<'_, '_>, tag: &str) -> String {
    node.children()
        .find(|c| c.has_tag_name(tag))
        .and_then(|c| c.text())
        .unwrap_or_default()
        .to_string()
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { EXPANDABLE_FLAG } else { "" })
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let text = String::deserialize(deserializer)?;
    Ok(text.trim() == EXPANDABLE_FLAG)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<asx:abap xmlns:asx="http://www.sap.com/abapxml" version="1.0">
  <asx:values>
    <DATA>
      <TREE_CONTENT>
        <SEU_ADT_REPOSITORY_OBJ_NODE>
          <OBJECT_TYPE>DEVC/K</OBJECT_TYPE>
          <OBJECT_NAME>PKG_B1</OBJECT_NAME>
          <TECH_NAME>PKG_B1</TECH_NAME>
          <OBJECT_URI>/sap/bc/adt/packages/pkg_b1</OBJECT_URI>
          <OBJECT_VIT_URI>/sap/bc/adt/vit/devck/PKG_B1</OBJECT_VIT_URI>
          <EXPANDABLE>X</EXPANDABLE>
        </SEU_ADT_REPOSITORY_OBJ_NODE>
        <SEU_ADT_REPOSITORY_OBJ_NODE>
          <OBJECT_TYPE>CLAS/OC</OBJECT_TYPE>
          <OBJECT_NAME>ZCL_DEMO</OBJECT_NAME>
          <TECH_NAME>ZCL_DEMO</TECH_NAME>
          <OBJECT_URI>/sap/bc/adt/oo/classes/zcl_demo</OBJECT_URI>
          <OBJECT_VIT_URI/>
          <EXPANDABLE/>
        </SEU_ADT_REPOSITORY_OBJ_NODE>
      </TREE_CONTENT>
    </DATA>
  </asx:values>
</asx:abap>"#;

    #[test]
    fn test_parse_listing_in_document_order() {
        let records = parse_node_structure(LISTING.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].object_type, "DEVC/K");
        assert_eq!(records[0].object_name, "PKG_B1");
        assert!(records[0].expandable);

        assert_eq!(records[1].object_name, "ZCL_DEMO");
        assert_eq!(records[1].object_uri, "/sap/bc/adt/oo/classes/zcl_demo");
        assert_eq!(records[1].object_vit_uri, "");
        assert!(!records[1].expandable);
    }

    #[test]
    fn test_missing_children_become_empty() {
        let body = "<root><SEU_ADT_REPOSITORY_OBJ_NODE><OBJECT_NAME>ONLY</OBJECT_NAME></SEU_ADT_REPOSITORY_OBJ_NODE></root>";
        let records = parse_node_structure(body.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].object_name, "ONLY");
        assert_eq!(records[0].technical_name, "");
        assert!(!records[0].expandable);
    }

    #[test]
    fn test_blank_body_is_empty() {
        assert!(parse_node_structure(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_no_nodes_is_empty() {
        let body = "<asx:abap xmlns:asx=\"http://www.sap.com/abapxml\"><asx:values/></asx:abap>";
        assert!(parse_node_structure(body.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_node_structure(b"<DATA><TREE_CONTENT>").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let err = parse_node_structure(&[0x3c, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::Utf8(_)));
    }

    #[test]
    fn test_only_x_means_expandable() {
        let body = "<r><SEU_ADT_REPOSITORY_OBJ_NODE><EXPANDABLE>Y</EXPANDABLE></SEU_ADT_REPOSITORY_OBJ_NODE></r>";
        let records = parse_node_structure(body.as_bytes()).unwrap();
        assert!(!records[0].expandable);
    }
}
