/// Options accepted by `set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Store the value as given, without materializing nested models or
    /// collections and without creating missing intermediate models.
    pub no_traverse: bool,
    /// Apply the mutation without emitting change events.
    pub silent: bool,
}

impl SetOptions {
    pub fn no_traverse() -> Self {
        Self {
            no_traverse: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }
}
