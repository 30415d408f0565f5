// src/adt/endpoints.rs
// Fixed ADT endpoint paths and the URLs built from them.

use url::{ParseError, Url};

pub const DISCOVERY_PATH: &str = "/sap/bc/adt/discovery";
pub const NODE_STRUCTURE_PATH: &str = "/sap/bc/adt/repository/nodestructure";
pub const SEARCH_PATH: &str = "/sap/bc/adt/repository/informationsystem/search";

pub fn discovery_url(base: &Url) -> Result<Url, ParseError> {
    base.join(DISCOVERY_PATH)
}

// An empty package name lists the top level, which is requested without
// any parent_name parameter at all.
pub fn node_structure_url(base: &Url, package: &str) -> Result<Url, ParseError> {
    let mut url = base.join(NODE_STRUCTURE_PATH)?;
    if !package.is_empty() {
        url.query_pairs_mut().append_pair("parent_name", package);
    }
    Ok(url)
}

pub fn search_url(base: &Url, query: &str) -> Result<Url, ParseError> {
    let mut url = base.join(SEARCH_PATH)?;
    url.query_pairs_mut()
        .append_pair("operation", "SEARCH_GENERIC")
        .append_pair("query", query);
    Ok(url)
}
