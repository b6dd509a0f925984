use thiserror::Error;

/// Layout solver / pipeline failure: logged and the run aborts without
/// writing; previous `SELECTED` state is preserved.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("a node position became non-finite during layout (graph likely disconnected from its anchors)")]
    NonFinitePosition,
}
