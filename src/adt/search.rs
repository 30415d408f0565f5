// src/adt/search.rs
// =============================================================================
// Repository information-system search (SEARCH_GENERIC).
//
// The response is a list of object references whose attributes all live in
// the adtcore namespace:
//
//   <adtcore:objectReferences xmlns:adtcore="http://www.sap.com/adt/core">
//     <adtcore:objectReference adtcore:uri="/sap/bc/adt/oo/classes/zcl_demo"
//         adtcore:type="CLAS/OC" adtcore:name="ZCL_DEMO"
//         adtcore:packageName="ZD256_DEMO" adtcore:description="Demo"/>
//   </adtcore:objectReferences>
//
// Attributes are looked up by (namespace, local name), so the prefix the
// server picks does not matter.
// =============================================================================

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::endpoints;
use super::nodes::NodeRecord;
use super::session::Credentials;
use super::transport::{AdtRequest, Transport};
use crate::error::{FetchError, ParseError};

pub const ADT_CORE_NS: &str = "http://www.sap.com/adt/core";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub uri: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    pub package_name: String,
    pub description: String,
}

impl ObjectReference {
    fn from_element(node: Node<'_, '_>) -> Self {
        let attr = |name: &str| {
            node.attribute((ADT_CORE_NS, name))
                .unwrap_or_default()
                .to_string()
        };
        Self {
            uri: attr("uri"),
            object_type: attr("type"),
            name: attr("name"),
            package_name: attr("packageName"),
            description: attr("description"),
        }
    }
}

pub fn parse_object_references(body: &[u8]) -> Result<Vec<ObjectReference>, ParseError> {
    let text = std::str::from_utf8(body)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let doc = Document::parse(text)?;
    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name((ADT_CORE_NS, "objectReference")))
        .map(ObjectReference::from_element)
        .collect())
}

// Runs one generic search. Unlike node listings, search has no per-package
// isolation to fall back on, so every failure is returned to the caller.
#[instrument(skip(transport, credentials, base))]
pub async fn search_objects(
    transport: &dyn Transport,
    credentials: &Credentials,
    base: &url::Url,
    query: &str,
) -> Result<Vec<ObjectReference>, FetchError> {
    info!("Searching objects with query: {}", query);
    let url = endpoints::search_url(base, query)?;
    let response = transport
        .send(credentials.authorize(AdtRequest::get(url)))
        .await?;

    if !response.status.is_success() {
        return Err(FetchError::Status(response.status));
    }

    let objects = parse_object_references(&response.body)?;
    info!("Found {} objects", objects.len());
    Ok(objects)
}

/// One row of the single-pass output: an object reference joined with the
/// node record of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub uri: String,
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    #[serde(rename = "packageName")]
    pub package_name: String,
    pub description: String,
    #[serde(rename = "OBJECT_TYPE")]
    pub node_object_type: String,
    #[serde(rename = "OBJECT_NAME")]
    pub node_object_name: String,
    #[serde(rename = "TECH_NAME")]
    pub technical_name: String,
    #[serde(rename = "OBJECT_URI")]
    pub object_uri: String,
    #[serde(rename = "OBJECT_VIT_URI")]
    pub object_vit_uri: String,
    #[serde(rename = "EXPANDABLE")]
    pub expandable: String,
}

// Inner join on name: every (reference, node) pair with equal names yields
// one row, in reference order then node order. Duplicates are kept.
pub fn join_by_name(
    objects: &[ObjectReference],
    nodes: &[NodeRecord],
) -> Vec<CombinedRecord> {
    let mut rows = Vec::new();
    for obj in objects {
        for node in nodes.iter().filter(|n| n.object_name == obj.name) {
            rows.push(CombinedRecord {
                uri: obj.uri.clone(),
                object_type: obj.object_type.clone(),
                name: obj.name.clone(),
                package_name: obj.package_name.clone(),
                description: obj.description.clone(),
                node_object_type: node.object_type.clone(),
                node_object_name: node.object_name.clone(),
                technical_name: node.technical_name.clone(),
                object_uri: node.object_uri.clone(),
                object_vit_uri: node.object_vit_uri.clone(),
                expandable: if node.expandable { "X" } else { "" }.to_string(),
            });
        }
    }
    rows
}
