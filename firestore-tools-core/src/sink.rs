//! Destinations for walker output

use crate::error::Result;
use crate::types::Visit;

/// Receives every node the walker visits, in emission order.
///
/// Implementations should make each record durable (written, flushed)
/// before returning, since a later enumeration failure aborts the walk.
pub trait VisitSink: Send {
    fn emit(&mut self, visit: &Visit) -> Result<()>;
}

impl VisitSink for Vec<Visit> {
    fn emit(&mut self, visit: &Visit) -> Result<()> {
        self.push(visit.clone());
        Ok(())
    }
}

impl<T: VisitSink + ?Sized> VisitSink for &mut T {
    fn emit(&mut self, visit: &Visit) -> Result<()> {
        (**self).emit(visit)
    }
}
