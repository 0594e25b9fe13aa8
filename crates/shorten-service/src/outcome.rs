/// The control-flow signal attached to a successful use case.
///
/// A transport decides what each variant means for its users: an HTTP
/// layer might render a page for [`Outcome::View`] and answer `303 See Other`
/// to the listing for [`Outcome::RedirectToList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Present the value to the caller.
    View(T),
    /// The change is done; send the caller back to the list of mappings.
    RedirectToList(T),
}

impl<T> Outcome<T> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Outcome::RedirectToList(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Outcome::View(value) | Outcome::RedirectToList(value) => value,
        }
    }

    pub fn as_inner(&self) -> &T {
        match self {
            Outcome::View(value) | Outcome::RedirectToList(value) => value,
        }
    }

    /// Transforms the carried value, keeping the signal.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::View(value) => Outcome::View(f(value)),
            Outcome::RedirectToList(value) => Outcome::RedirectToList(f(value)),
        }
    }
}
