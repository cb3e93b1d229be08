//! Graph documents in, encoded units out.
//!
//! A graph document is the JSON form of [`Graph`]:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "kind": "start" },
//!     { "kind": "number", "insets": [5] },
//!     null,
//!     { "kind": "emit:number", "tag": "show" }
//!   ],
//!   "wires": [
//!     { "from": { "node": 0, "index": 0 }, "to": { "node": 3, "index": 0 } },
//!     { "from": { "node": 1, "index": 0 }, "to": { "node": 3, "index": 1 } }
//!   ],
//!   "entry": 0
//! }
//! ```
//!
//! `null` entries are removed nodes; they keep later node indices stable.

use flow_bytecode::CompiledUnit;
use flow_compile::Graph;

use crate::options::EmitFormat;

/// A document could not be read or a unit could not be written.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid graph document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("cannot encode unit as JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("cannot encode unit as bincode: {0}")]
    Bin(#[source] bincode::Error),
}

/// Parse a graph document.
pub fn parse_graph(text: &str) -> Result<Graph, DocumentError> {
    let graph: Graph = serde_json::from_str(text).map_err(DocumentError::Parse)?;
    tracing::debug!(
        nodes = graph.nodes().count(),
        wires = graph.wires().count(),
        "loaded graph document"
    );
    Ok(graph)
}

/// Encode a unit in the requested format.
pub fn encode_unit(unit: &CompiledUnit, format: EmitFormat) -> Result<Vec<u8>, DocumentError> {
    match format {
        EmitFormat::Listing => Ok(unit.to_string().into_bytes()),
        EmitFormat::Json => {
            let mut text = serde_json::to_string_pretty(unit).map_err(DocumentError::Json)?;
            text.push('\n');
            Ok(text.into_bytes())
        }
        EmitFormat::Bin => bincode::serialize(unit).map_err(DocumentError::Bin),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "tests panic on malformed fixtures"
)]
