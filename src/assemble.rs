use ndarray::{concatenate, Array2, Axis};

use crate::types::{RetrievalError, SplitAxis};

/// Concatenates ordered chunk results back into a single matrix.
///
/// The concatenation axis follows the planner's split tag: samples
/// (rows) for a time split, channels (columns) for a channel split or the
/// trivial single-chunk case. Chunk order is preserved, which makes the
/// result time-ordered and channel-ordered by construction.
///
/// Fails with [`RetrievalError::Assembly`] on an empty block list or when
/// the blocks disagree on the non-concatenated dimension.
pub fn assemble(blocks: &[Array2<f64>], axis: SplitAxis) -> Result<Array2<f64>, RetrievalError> {
    if blocks.is_empty() {
        return Err(RetrievalError::Assembly(
            "no chunk results to assemble".to_string(),
        ));
    }

    let concat_axis = match axis {
        SplitAxis::Time => Axis(0),
        SplitAxis::None | SplitAxis::Channel => Axis(1),
    };

    // All blocks must agree on the dimension that is not being concatenated.
    let first = &blocks[0];
    for (index, block) in blocks.iter().enumerate().skip(1) {
        if concat_axis == Axis(0) && block.ncols() != first.ncols() {
            return Err(RetrievalError::Assembly(format!(
                "chunk {} has {} channel(s), expected {}",
                index,
                block.ncols(),
                first.ncols()
            )));
        }
        if concat_axis == Axis(1) && block.nrows() != first.nrows() {
            return Err(RetrievalError::Assembly(format!(
                "chunk {} has {} sample(s), expected {}",
                index,
                block.nrows(),
                first.nrows()
            )));
        }
    }

    let views: Vec<_> = blocks.iter().map(|block| block.view()).collect();
    concatenate(concat_axis, &views).map_err(|err| {
        RetrievalError::Assembly(format!(
            "could not concatenate {} chunk(s): {}",
            blocks.len(),
            err
        ))
    })
}
