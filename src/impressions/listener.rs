use crate::Attributes;

use super::Impression;

/// Error returned by an [`ImpressionListener`].
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every impression, regardless of the impressions mode.
///
/// Errors are logged and otherwise ignored.
pub trait ImpressionListener {
    /// Handle one impression and the attributes it was evaluated with.
    fn log_impression(
        &self,
        impression: &Impression,
        attributes: Option<&Attributes>,
    ) -> Result<(), ListenerError>;
}

impl<T: Fn(&Impression, Option<&Attributes>) -> Result<(), ListenerError>> ImpressionListener
    for T
{
    fn log_impression(
        &self,
        impression: &Impression,
        attributes: Option<&Attributes>,
    ) -> Result<(), ListenerError> {
        self(impression, attributes)
    }
}
