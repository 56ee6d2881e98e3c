//! Text-bearing component contract.
//!
//! Any UI unit that owns localized text implements [`TextComponent`]. The
//! coordinator only ever calls these two methods and tracks everything else
//! itself, keyed by the component's identity.

use std::fmt;
use std::rc::Rc;

use crate::types::Rect;

/// A UI unit whose localized text is fetched lazily.
pub trait TextComponent {
    /// Start fetching this component's text.
    ///
    /// Must return immediately. When the fetch finishes (successfully or
    /// not) the component reports back with
    /// [`TextLoadCoordinator::text_loaded`](crate::TextLoadCoordinator::text_loaded).
    fn update_texts(&self);

    /// Viewport-relative bounds of the element that decides visibility,
    /// or `None` while the element is not mounted.
    fn element(&self) -> Option<Rect>;
}

/// Shared handle the coordinator keeps for each registered component.
pub type ComponentHandle = Rc<dyn TextComponent>;

/// Reference identity of a component.
///
/// Two distinct component instances never share a key, even if their state
/// is identical. The key is the address of the component value, so it is the
/// same whether taken from the `Rc` handle or from `&self` inside the
/// component.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKey(usize);

impl ComponentKey {
    pub fn of(component: &dyn TextComponent) -> Self {
        Self(component as *const dyn TextComponent as *const () as usize)
    }

    pub fn of_handle(handle: &ComponentHandle) -> Self {
        Self::of(handle.as_ref())
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKey({:#x})", self.0)
    }
}
