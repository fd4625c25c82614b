/// Readers that turn exported field spreadsheets into [`Dataset`]s.
///
/// [`Dataset`]: crate::model::Dataset

pub mod table;
