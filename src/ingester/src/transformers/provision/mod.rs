pub mod identify;

/// Which identity keys the source stage writes when it creates a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Brand-local id plus a canonical id derived from the email trait.
    Brand,
    /// Canonical id only: the record's user id already is the canonical id.
    /// No brand mapping is stored on this path.
    Canonical,
}
