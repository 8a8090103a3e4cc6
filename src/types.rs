/// A settings operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Every scalar setting as `dotted.key = value`.
    List,
    /// The settings file as it would be saved.
    Show,
    Get { key: String },
    /// Check, store and save a value.
    Set { key: String, value: String },
}
