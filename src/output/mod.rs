//! Output buffers collected during an evaluation and their commit to disk.

pub mod commit;
pub mod locks;
pub mod registry;

pub use commit::{CommitManager, CommitOutcome};
pub use registry::{BufferState, OutputBuffer, OutputRegistry};

use std::sync::LazyLock;

use crate::constants::{LINE_ENDING, PREAMBLE_TEMPLATE};

static PREAMBLE: LazyLock<String> = LazyLock::new(|| {
    PREAMBLE_TEMPLATE.replace("\r\n", "\n").replace('\n', LINE_ENDING)
});

/// The generated-file header, using the host's native line endings.
pub fn preamble() -> &'static str {
    &PREAMBLE
}
