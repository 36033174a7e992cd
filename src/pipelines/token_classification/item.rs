use std::fmt::Debug;

/// A trait for items that can be used for token classification
pub trait Item: Send + Sync + Clone + Debug {
    /// Returns the input text for the item
    fn input(&self) -> &str;

    /// Returns one class label for each whitespace-separated word of the input
    fn class_labels(&self) -> Vec<&str>;

    /// Whether the item is a real example rather than batch padding
    fn is_real_example(&self) -> bool {
        true
    }
}
