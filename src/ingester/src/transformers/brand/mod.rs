pub mod track;

/// How a deployment treats the `brand` track property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandPolicy {
    /// Fill the configured default when the collector omits the brand.
    Default(String),
    /// Narrow contract: the record must already carry a user id and a brand.
    Require,
}
