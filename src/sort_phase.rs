use std::fmt::{Display, Formatter};

/// States of the external sort engine.
///
/// `Split -> SortChunks -> Merge -> Done`, with `Failed` reachable from every state. The
/// temporary chunk files are removed whichever state the job ends in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortPhase {
    /// Reading the input into bounded chunks
    Split,
    /// Waiting for the workers to sort and spill the chunks
    SortChunks,
    /// k-way merge of the chunk files into the destination
    Merge,
    Done,
    Failed,
}

impl Display for SortPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortPhase::Split => "split",
            SortPhase::SortChunks => "sort chunks",
            SortPhase::Merge => "merge",
            SortPhase::Done => "done",
            SortPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
