//! ``src/engine/row.rs``
//!
//! Anything the pipeline stages can carry: a plain record reference, or a
//! record paired with its position in the inventory (used by the view cache).

use crate::model::vm::VmRecord;

pub trait RecordRef {
    fn record(&self) -> &VmRecord;
}

impl RecordRef for &VmRecord {
    #[inline]
    fn record(&self) -> &VmRecord {
        self
    }
}

impl RecordRef for (usize, &VmRecord) {
    #[inline]
    fn record(&self) -> &VmRecord {
        self.1
    }
}
