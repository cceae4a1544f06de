mod backend;
mod fanout;
mod reconcile;
mod translate;

pub use backend::*;
pub use fanout::*;
pub use reconcile::*;
pub use translate::*;

#[cfg(test)]
mod fanout_test;
#[cfg(test)]
mod translate_test;

use serde_json::Value;

use crate::chess::Board;
use crate::ProbeError;
use crate::Result;

/// Full probe pipeline: validate the position, fan out to every
/// backend, merge their answers per move and render the result for the
/// client.
pub async fn probe_position(prober: &Prober, fen: &str) -> Result<Value> {
    let board = Board::from_fen(fen).map_err(|e| ProbeError::InvalidPosition(e.to_string()))?;
    let responses = prober.probe(fen).await?;
    let merged = merge(&responses);
    Ok(render(&board, &merged))
}
