//! Visibility-to-load coordinator.
//!
//! Decides, for every registered [`TextComponent`], when to fetch its
//! localized text:
//!
//! - a component is fetched once it is visible (within the buffer margin)
//!   and neither loaded nor loading
//! - scroll/resize bursts are debounced into one re-evaluation
//! - a language change resets every language-dependent component; one whose
//!   fetch is still in flight is refetched as soon as that fetch completes
//! - `only_once` components are fetched at most once per registration
//!
//! State lives in parallel maps keyed by [`ComponentKey`] (reference
//! identity). Only the coordinator mutates them; components talk to it through
//! `subscribe`, `unsubscribe` and `text_loaded`.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::new();
//! let viewport = ViewportEvents::detect();
//! let coordinator = TextLoadCoordinator::with_viewport(
//!     CoordinatorConfig::default(),
//!     &viewport,
//!     &scheduler,
//! )?;
//!
//! coordinator.subscribe(about_section.clone(), false);
//! scheduler.tick(Instant::now()); // first visibility check
//!
//! // later, from the component's fetch callback
//! coordinator.text_loaded(&*about_section);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use tracing::{debug, trace, warn};

use crate::component::{ComponentHandle, ComponentKey, TextComponent};
use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::geometry::{GeometryOracle, ViewportGeometry};
use crate::scheduler::{debounce, Debounced, Scheduler};
use crate::viewport::ViewportEvents;

// =============================================================================
// TYPES
// =============================================================================

bitflags! {
    /// Viewport events folded into the pending re-evaluation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Trigger: u8 {
        const SCROLL = 1 << 0;
        const RESIZE = 1 << 1;
    }
}

/// Snapshot of one component's load state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentState {
    pub visible: bool,
    pub loaded: bool,
    pub loading: bool,
    pub to_reload: bool,
    pub only_once: bool,
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
struct Registry {
    /// Registration order.
    components: Vec<ComponentHandle>,
    visible: HashMap<ComponentKey, bool>,
    loaded: HashMap<ComponentKey, bool>,
    loading: HashMap<ComponentKey, bool>,
    to_reload: HashMap<ComponentKey, bool>,
    only_once: HashMap<ComponentKey, bool>,
}

impl Registry {
    fn position(&self, key: ComponentKey) -> Option<usize> {
        self.components
            .iter()
            .position(|component| ComponentKey::of_handle(component) == key)
    }

    fn contains(&self, key: ComponentKey) -> bool {
        self.loaded.contains_key(&key)
    }

    fn handle(&self, key: ComponentKey) -> Option<ComponentHandle> {
        self.position(key).map(|index| self.components[index].clone())
    }

    fn keys(&self) -> Vec<ComponentKey> {
        self.components.iter().map(ComponentKey::of_handle).collect()
    }

    fn flag(map: &HashMap<ComponentKey, bool>, key: ComponentKey) -> bool {
        map.get(&key).copied().unwrap_or(false)
    }

    fn state(&self, key: ComponentKey) -> Option<ComponentState> {
        if !self.contains(key) {
            return None;
        }
        Some(ComponentState {
            visible: Self::flag(&self.visible, key),
            loaded: Self::flag(&self.loaded, key),
            loading: Self::flag(&self.loading, key),
            to_reload: Self::flag(&self.to_reload, key),
            only_once: Self::flag(&self.only_once, key),
        })
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

struct Inner {
    config: CoordinatorConfig,
    oracle: Box<dyn GeometryOracle>,
    scheduler: Scheduler,
    registry: RefCell<Registry>,
    refresh: Debounced,
    pending: Cell<Trigger>,
    stream_cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    destroyed: Cell<bool>,
}

impl Inner {
    fn teardown(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        let cleanups: Vec<Box<dyn FnOnce()>> = self.stream_cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups {
            cleanup();
        }
        self.refresh.cancel();
        self.pending.set(Trigger::empty());
        debug!("text load coordinator torn down");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Registry and state machine deciding when components fetch their texts.
///
/// Cloning yields another handle to the same coordinator.
#[derive(Clone)]
pub struct TextLoadCoordinator {
    inner: Rc<Inner>,
}

/// Non-owning handle, for components that must call back into the
/// coordinator without keeping it alive.
#[derive(Clone)]
pub struct WeakCoordinator {
    inner: Weak<Inner>,
}

impl WeakCoordinator {
    pub fn upgrade(&self) -> Option<TextLoadCoordinator> {
        self.inner.upgrade().map(|inner| TextLoadCoordinator { inner })
    }
}

impl TextLoadCoordinator {
    /// Create a coordinator listening to `viewport`, asking `oracle` about
    /// visibility, and running deferred work on `scheduler`.
    pub fn new(
        config: CoordinatorConfig,
        viewport: &ViewportEvents,
        oracle: impl GeometryOracle + 'static,
        scheduler: &Scheduler,
    ) -> Result<Self> {
        config.validate()?;

        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let refresh = debounce(scheduler, config.debounce_window(), move || {
                if let Some(inner) = weak.upgrade() {
                    TextLoadCoordinator { inner }.run_refresh();
                }
            });

            Inner {
                config,
                oracle: Box::new(oracle),
                scheduler: scheduler.clone(),
                registry: RefCell::new(Registry::default()),
                refresh,
                pending: Cell::new(Trigger::empty()),
                stream_cleanups: RefCell::new(Vec::new()),
                destroyed: Cell::new(false),
            }
        });

        let coordinator = Self { inner };
        coordinator.listen(viewport);
        debug!(
            buffer_height = coordinator.inner.config.buffer.height,
            buffer_width = coordinator.inner.config.buffer.width,
            interactive = viewport.is_interactive(),
            "text load coordinator created"
        );
        Ok(coordinator)
    }

    /// Create a coordinator whose oracle reads the live size of `viewport`.
    pub fn with_viewport(
        config: CoordinatorConfig,
        viewport: &ViewportEvents,
        scheduler: &Scheduler,
    ) -> Result<Self> {
        Self::new(config, viewport, ViewportGeometry::new(viewport), scheduler)
    }

    fn listen(&self, viewport: &ViewportEvents) {
        let weak = Rc::downgrade(&self.inner);
        let on_scroll = viewport.on_scroll(move |_| {
            if let Some(inner) = weak.upgrade() {
                TextLoadCoordinator { inner }.request_refresh(Trigger::SCROLL);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let on_resize = viewport.on_resize(move |_| {
            if let Some(inner) = weak.upgrade() {
                TextLoadCoordinator { inner }.request_refresh(Trigger::RESIZE);
            }
        });

        let mut cleanups = self.inner.stream_cleanups.borrow_mut();
        cleanups.push(on_scroll);
        cleanups.push(on_resize);
    }

    pub fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Stop listening to the viewport and drop any pending re-evaluation.
    ///
    /// Safe to call more than once; also runs when the last handle drops.
    pub fn destroy(&self) {
        self.inner.teardown();
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a component.
    ///
    /// The first visibility check runs on the next scheduler tick, once the
    /// component's layout has settled. `only_once` components are fetched at
    /// most once and ignore language changes.
    pub fn subscribe(&self, component: ComponentHandle, only_once: bool) {
        let key = ComponentKey::of_handle(&component);
        {
            let mut reg = self.inner.registry.borrow_mut();
            if reg.contains(key) {
                debug!(component = ?key, "component already subscribed");
                return;
            }
            reg.components.push(component);
            reg.visible.insert(key, false);
            reg.loaded.insert(key, false);
            reg.loading.insert(key, false);
            reg.to_reload.insert(key, false);
            reg.only_once.insert(key, only_once);
        }
        trace!(component = ?key, only_once, "component subscribed");

        let weak = Rc::downgrade(&self.inner);
        self.inner.scheduler.defer(move || {
            if let Some(inner) = weak.upgrade() {
                TextLoadCoordinator { inner }.load_new_texts_of_key(key);
            }
        });
    }

    /// Forget a component. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, component: &dyn TextComponent) -> bool {
        let key = ComponentKey::of(component);
        let mut reg = self.inner.registry.borrow_mut();
        let Some(index) = reg.position(key) else {
            return false;
        };
        reg.components.remove(index);
        reg.visible.remove(&key);
        reg.loaded.remove(&key);
        reg.loading.remove(&key);
        reg.to_reload.remove(&key);
        reg.only_once.remove(&key);
        trace!(component = ?key, "component unsubscribed");
        true
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Recompute visibility of one component. `None` if not registered.
    fn update_visibility_of(&self, key: ComponentKey) -> Option<bool> {
        let handle = self.inner.registry.borrow().handle(key)?;
        let visible = self
            .inner
            .oracle
            .is_into_view(handle.element(), self.inner.config.buffer);

        let mut reg = self.inner.registry.borrow_mut();
        if !reg.contains(key) {
            return None;
        }
        reg.visible.insert(key, visible);
        Some(visible)
    }

    /// Recompute visibility of every component. Never triggers fetches.
    pub fn update_visibility(&self) {
        let keys = self.inner.registry.borrow().keys();
        for key in keys {
            self.update_visibility_of(key);
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Fetch this component's text if it is visible and not loaded or loading.
    pub fn load_new_texts_of(&self, component: &dyn TextComponent) {
        self.load_new_texts_of_key(ComponentKey::of(component));
    }

    fn load_new_texts_of_key(&self, key: ComponentKey) {
        {
            let reg = self.inner.registry.borrow();
            if !reg.contains(key) {
                return;
            }
            let settled = Registry::flag(&reg.loading, key) || Registry::flag(&reg.loaded, key);
            if Registry::flag(&reg.only_once, key) && settled {
                return;
            }
        }

        let Some(visible) = self.update_visibility_of(key) else {
            return;
        };

        let handle = {
            let mut reg = self.inner.registry.borrow_mut();
            if !visible || Registry::flag(&reg.loaded, key) || Registry::flag(&reg.loading, key) {
                return;
            }
            // Mark in flight before calling out: the component may complete synchronously
            reg.loading.insert(key, true);
            reg.handle(key)
        };

        if let Some(handle) = handle {
            debug!(component = ?key, "fetching texts");
            handle.update_texts();
        }
    }

    /// Run [`load_new_texts_of`](Self::load_new_texts_of) for every
    /// component, in registration order.
    pub fn load_new_texts(&self) {
        let keys = self.inner.registry.borrow().keys();
        for key in keys {
            self.load_new_texts_of_key(key);
        }
    }

    /// Called by a component when its fetch finished, successfully or not.
    ///
    /// If a language change arrived while the fetch was in flight, the result
    /// is stale and a new fetch starts immediately. Completions for unknown
    /// components, or for components that are not loading, are ignored.
    pub fn text_loaded(&self, component: &dyn TextComponent) {
        let key = ComponentKey::of(component);
        let reload = {
            let mut reg = self.inner.registry.borrow_mut();
            if !reg.contains(key) {
                trace!(component = ?key, "completion for unregistered component ignored");
                return;
            }
            if !Registry::flag(&reg.loading, key) {
                warn!(component = ?key, "completion for component that is not loading ignored");
                return;
            }

            if Registry::flag(&reg.to_reload, key) {
                reg.to_reload.insert(key, false);
                reg.loaded.insert(key, false);
                reg.loading.insert(key, true);
                reg.handle(key)
            } else {
                reg.loaded.insert(key, true);
                reg.loading.insert(key, false);
                None
            }
        };

        match reload {
            Some(handle) => {
                debug!(component = ?key, "stale texts discarded, fetching again");
                handle.update_texts();
            }
            None => trace!(component = ?key, "texts loaded"),
        }
    }

    /// Whether the current language's text finished loading.
    /// `None` for unregistered components.
    pub fn has_text_loaded(&self, component: &dyn TextComponent) -> Option<bool> {
        let key = ComponentKey::of(component);
        self.inner.registry.borrow().loaded.get(&key).copied()
    }

    // -------------------------------------------------------------------------
    // Language
    // -------------------------------------------------------------------------

    /// The active language changed: reset language-dependent components and
    /// fetch the visible ones again.
    ///
    /// A component with a fetch in flight stays in flight with a reload
    /// queued; [`text_loaded`](Self::text_loaded) refetches it. `only_once`
    /// components are untouched.
    pub fn language_change(&self) {
        {
            let mut guard = self.inner.registry.borrow_mut();
            let reg = &mut *guard;
            let mut deferred = 0usize;
            for key in reg.keys() {
                if Registry::flag(&reg.only_once, key) {
                    continue;
                }
                let in_flight =
                    Registry::flag(&reg.loading, key) && !Registry::flag(&reg.loaded, key);
                if in_flight {
                    reg.to_reload.insert(key, true);
                    deferred += 1;
                } else {
                    reg.loading.insert(key, false);
                }
                reg.loaded.insert(key, false);
            }
            debug!(components = reg.components.len(), deferred, "language changed");
        }
        self.load_new_texts();
    }

    // -------------------------------------------------------------------------
    // Viewport refresh
    // -------------------------------------------------------------------------

    fn request_refresh(&self, trigger: Trigger) {
        if self.is_destroyed() {
            return;
        }
        self.inner.pending.set(self.inner.pending.get() | trigger);
        self.inner.refresh.call();
    }

    fn run_refresh(&self) {
        let causes = self.inner.pending.take();
        trace!(?causes, "re-evaluating visibility");
        self.load_new_texts();
    }

    /// Run a pending scroll/resize re-evaluation now instead of waiting for
    /// the debounce window. Returns `false` if none was pending.
    pub fn flush_refresh(&self) -> bool {
        self.inner.refresh.flush()
    }

    /// Viewport events waiting in the current burst.
    pub fn pending_triggers(&self) -> Trigger {
        self.inner.pending.get()
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn state_of(&self, component: &dyn TextComponent) -> Option<ComponentState> {
        self.inner.registry.borrow().state(ComponentKey::of(component))
    }

    /// Last computed visibility. `None` for unregistered components.
    pub fn is_visible(&self, component: &dyn TextComponent) -> Option<bool> {
        let key = ComponentKey::of(component);
        self.inner.registry.borrow().visible.get(&key).copied()
    }

    pub fn contains(&self, component: &dyn TextComponent) -> bool {
        self.inner.registry.borrow().contains(ComponentKey::of(component))
    }

    pub fn len(&self) -> usize {
        self.inner.registry.borrow().components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FixedViewport;
    use crate::types::{Rect, ViewportSize};
    use std::time::{Duration, Instant};

    const SCREEN: ViewportSize = ViewportSize::new(800.0, 600.0);

    fn on_screen() -> Rect {
        Rect::from_xywh(0.0, 100.0, 400.0, 200.0)
    }

    fn off_screen() -> Rect {
        Rect::from_xywh(0.0, 5000.0, 400.0, 200.0)
    }

    /// Records fetches; bounds are set by the test.
    struct FakeComponent {
        bounds: Cell<Option<Rect>>,
        fetches: Cell<u32>,
    }

    impl FakeComponent {
        fn new(bounds: Rect) -> Rc<Self> {
            Rc::new(Self {
                bounds: Cell::new(Some(bounds)),
                fetches: Cell::new(0),
            })
        }

        fn move_to(&self, bounds: Rect) {
            self.bounds.set(Some(bounds));
        }
    }

    impl TextComponent for FakeComponent {
        fn update_texts(&self) {
            self.fetches.set(self.fetches.get() + 1);
        }

        fn element(&self) -> Option<Rect> {
            self.bounds.get()
        }
    }

    /// Completes its fetch synchronously, inside `update_texts`.
    struct CachedComponent {
        coordinator: WeakCoordinator,
        fetches: Cell<u32>,
    }

    impl TextComponent for CachedComponent {
        fn update_texts(&self) {
            self.fetches.set(self.fetches.get() + 1);
            if let Some(coordinator) = self.coordinator.upgrade() {
                coordinator.text_loaded(self);
            }
        }

        fn element(&self) -> Option<Rect> {
            Some(on_screen())
        }
    }

    fn setup() -> (TextLoadCoordinator, Scheduler, ViewportEvents) {
        let scheduler = Scheduler::new();
        let viewport = ViewportEvents::interactive(SCREEN);
        let config = CoordinatorConfig::default().with_debounce_ms(0);
        let coordinator =
            TextLoadCoordinator::new(config, &viewport, FixedViewport(SCREEN), &scheduler).unwrap();
        (coordinator, scheduler, viewport)
    }

    fn settle(scheduler: &Scheduler) {
        scheduler.run_until_idle(Instant::now() + Duration::from_secs(1));
    }

    fn state(coordinator: &TextLoadCoordinator, component: &FakeComponent) -> ComponentState {
        coordinator.state_of(component).unwrap()
    }

    #[test]
    fn test_subscribe_initializes_state() {
        let (coordinator, _scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());

        coordinator.subscribe(c.clone(), false);

        assert_eq!(coordinator.len(), 1);
        assert_eq!(
            state(&coordinator, &c),
            ComponentState {
                visible: false,
                loaded: false,
                loading: false,
                to_reload: false,
                only_once: false,
            }
        );
    }

    #[test]
    fn test_initial_check_is_deferred() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());

        coordinator.subscribe(c.clone(), false);
        assert_eq!(c.fetches.get(), 0);

        scheduler.tick(Instant::now());
        assert_eq!(c.fetches.get(), 1);
        assert!(state(&coordinator, &c).loading);
        assert_eq!(coordinator.is_visible(&*c), Some(true));
    }

    #[test]
    fn test_unsubscribe_before_deferred_check() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());

        coordinator.subscribe(c.clone(), false);
        assert!(coordinator.unsubscribe(&*c));
        settle(&scheduler);

        assert_eq!(c.fetches.get(), 0);
        assert!(coordinator.is_empty());
    }

    #[test]
    fn test_duplicate_subscribe_ignored() {
        let (coordinator, _scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());

        coordinator.subscribe(c.clone(), false);
        coordinator.subscribe(c.clone(), true);

        assert_eq!(coordinator.len(), 1);
        assert!(!state(&coordinator, &c).only_once);
    }

    #[test]
    fn test_not_visible_not_fetched() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        coordinator.load_new_texts();

        assert_eq!(c.fetches.get(), 0);
        assert!(!state(&coordinator, &c).loading);
        assert_eq!(coordinator.is_visible(&*c), Some(false));
    }

    #[test]
    fn test_becomes_visible_fetched_once() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        c.move_to(on_screen());
        coordinator.load_new_texts();
        assert_eq!(c.fetches.get(), 1);
        assert!(state(&coordinator, &c).loading);

        // Still in flight: no second fetch
        coordinator.load_new_texts();
        coordinator.load_new_texts_of(&*c);
        assert_eq!(c.fetches.get(), 1);
    }

    #[test]
    fn test_text_loaded_completes_cycle() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        coordinator.text_loaded(&*c);

        let s = state(&coordinator, &c);
        assert!(s.loaded);
        assert!(!s.loading);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(true));

        coordinator.load_new_texts();
        assert_eq!(c.fetches.get(), 1);
    }

    #[test]
    fn test_language_change_mid_flight_reloads_on_completion() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);
        assert_eq!(c.fetches.get(), 1);

        coordinator.language_change();
        let s = state(&coordinator, &c);
        assert!(s.to_reload);
        assert!(s.loading);
        assert!(!s.loaded);
        assert_eq!(c.fetches.get(), 1);

        coordinator.text_loaded(&*c);
        assert_eq!(c.fetches.get(), 2);
        let s = state(&coordinator, &c);
        assert!(s.loading);
        assert!(!s.loaded);
        assert!(!s.to_reload);

        coordinator.text_loaded(&*c);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(true));
        assert_eq!(c.fetches.get(), 2);
    }

    #[test]
    fn test_repeated_language_changes_reload_once() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        coordinator.language_change();
        coordinator.language_change();
        coordinator.language_change();
        coordinator.text_loaded(&*c);

        assert_eq!(c.fetches.get(), 2);
    }

    #[test]
    fn test_language_change_after_load_refetches_visible() {
        let (coordinator, scheduler, _viewport) = setup();
        let visible = FakeComponent::new(on_screen());
        let hidden = FakeComponent::new(off_screen());
        coordinator.subscribe(visible.clone(), false);
        coordinator.subscribe(hidden.clone(), false);
        settle(&scheduler);
        coordinator.text_loaded(&*visible);

        coordinator.language_change();

        assert_eq!(visible.fetches.get(), 2);
        assert!(state(&coordinator, &visible).loading);
        assert_eq!(hidden.fetches.get(), 0);
        assert!(!state(&coordinator, &hidden).to_reload);
    }

    #[test]
    fn test_language_change_hidden_loaded_component_waits() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);
        coordinator.text_loaded(&*c);

        c.move_to(off_screen());
        coordinator.language_change();
        assert_eq!(c.fetches.get(), 1);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(false));

        c.move_to(on_screen());
        coordinator.load_new_texts();
        assert_eq!(c.fetches.get(), 2);
    }

    #[test]
    fn test_only_once_ignores_language() {
        let (coordinator, scheduler, _viewport) = setup();
        let d = FakeComponent::new(on_screen());
        coordinator.subscribe(d.clone(), true);
        settle(&scheduler);
        coordinator.text_loaded(&*d);

        let before = state(&coordinator, &d);
        coordinator.language_change();
        coordinator.load_new_texts();

        assert_eq!(state(&coordinator, &d), before);
        assert!(before.loaded);
        assert_eq!(d.fetches.get(), 1);
    }

    #[test]
    fn test_only_once_never_fetches_twice() {
        let (coordinator, scheduler, _viewport) = setup();
        let d = FakeComponent::new(on_screen());
        coordinator.subscribe(d.clone(), true);
        settle(&scheduler);

        // In flight: language change must not flag a reload
        coordinator.language_change();
        assert!(!state(&coordinator, &d).to_reload);
        coordinator.text_loaded(&*d);

        for _ in 0..5 {
            d.move_to(off_screen());
            coordinator.load_new_texts();
            d.move_to(on_screen());
            coordinator.load_new_texts();
            coordinator.language_change();
        }

        assert_eq!(d.fetches.get(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let (coordinator, _scheduler, _viewport) = setup();
        let a = FakeComponent::new(on_screen());
        let b = FakeComponent::new(on_screen());
        let stranger = FakeComponent::new(on_screen());
        coordinator.subscribe(a.clone(), false);
        coordinator.subscribe(b.clone(), false);

        assert!(coordinator.unsubscribe(&*a));
        assert_eq!(coordinator.len(), 1);
        assert!(!coordinator.unsubscribe(&*a));
        assert!(!coordinator.unsubscribe(&*stranger));
        assert_eq!(coordinator.len(), 1);

        assert_eq!(coordinator.has_text_loaded(&*a), None);
        assert_eq!(coordinator.state_of(&*a), None);
        assert!(coordinator.contains(&*b));
    }

    #[test]
    fn test_stray_completions_are_ignored() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(off_screen());
        let stranger = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        coordinator.text_loaded(&*stranger);
        coordinator.text_loaded(&*c);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(false));

        c.move_to(on_screen());
        coordinator.load_new_texts();
        coordinator.text_loaded(&*c);
        coordinator.text_loaded(&*c);
        let s = state(&coordinator, &c);
        assert!(s.loaded);
        assert!(!s.loading);
    }

    #[test]
    fn test_synchronous_completion() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = Rc::new(CachedComponent {
            coordinator: coordinator.downgrade(),
            fetches: Cell::new(0),
        });
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        assert_eq!(c.fetches.get(), 1);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(true));

        coordinator.language_change();
        assert_eq!(c.fetches.get(), 2);
        assert_eq!(coordinator.has_text_loaded(&*c), Some(true));
    }

    #[test]
    fn test_missing_element_not_fetched() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(on_screen());
        c.bounds.set(None);
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        assert_eq!(c.fetches.get(), 0);
        assert_eq!(coordinator.is_visible(&*c), Some(false));
    }

    #[test]
    fn test_update_visibility_does_not_fetch() {
        let (coordinator, scheduler, _viewport) = setup();
        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        c.move_to(on_screen());
        coordinator.update_visibility();

        assert_eq!(coordinator.is_visible(&*c), Some(true));
        assert_eq!(c.fetches.get(), 0);
    }

    #[test]
    fn test_scroll_burst_debounced() {
        let scheduler = Scheduler::new();
        let viewport = ViewportEvents::interactive(SCREEN);
        let config = CoordinatorConfig::default().with_debounce_ms(10);
        let coordinator =
            TextLoadCoordinator::new(config, &viewport, FixedViewport(SCREEN), &scheduler).unwrap();
        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        let start = Instant::now();
        scheduler.tick(start);

        c.move_to(on_screen());
        for offset in 0..10 {
            viewport.emit_scroll(offset as f64);
        }
        viewport.emit_resize(SCREEN);
        assert_eq!(coordinator.pending_triggers(), Trigger::SCROLL | Trigger::RESIZE);
        assert_eq!(c.fetches.get(), 0);

        scheduler.tick(Instant::now() + Duration::from_millis(50));
        assert_eq!(c.fetches.get(), 1);
        assert_eq!(coordinator.pending_triggers(), Trigger::empty());
    }

    #[test]
    fn test_flush_refresh() {
        let (coordinator, scheduler, viewport) = setup();
        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        assert!(!coordinator.flush_refresh());
        c.move_to(on_screen());
        viewport.emit_scroll(300.0);
        assert!(coordinator.flush_refresh());
        assert_eq!(c.fetches.get(), 1);
    }

    #[test]
    fn test_destroy_stops_listening() {
        let (coordinator, scheduler, viewport) = setup();
        assert_eq!(viewport.scroll_listener_count(), 1);
        assert_eq!(viewport.resize_listener_count(), 1);

        let c = FakeComponent::new(off_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);

        coordinator.destroy();
        coordinator.destroy();
        assert!(coordinator.is_destroyed());
        assert_eq!(viewport.scroll_listener_count(), 0);
        assert_eq!(viewport.resize_listener_count(), 0);

        c.move_to(on_screen());
        viewport.emit_scroll(10.0);
        settle(&scheduler);
        assert_eq!(c.fetches.get(), 0);
    }

    #[test]
    fn test_drop_unsubscribes_streams() {
        let (coordinator, _scheduler, viewport) = setup();
        drop(coordinator);
        assert_eq!(viewport.scroll_listener_count(), 0);
        assert_eq!(viewport.resize_listener_count(), 0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let scheduler = Scheduler::new();
        let viewport = ViewportEvents::headless();
        let config = CoordinatorConfig::default()
            .with_buffer(crate::types::BufferFactors::new(-1.0, 0.0));
        let result = TextLoadCoordinator::with_viewport(config, &viewport, &scheduler);
        assert!(result.is_err());
    }

    #[test]
    fn test_headless_never_fetches() {
        let scheduler = Scheduler::new();
        let viewport = ViewportEvents::headless();
        let coordinator =
            TextLoadCoordinator::with_viewport(CoordinatorConfig::default(), &viewport, &scheduler)
                .unwrap();
        let c = FakeComponent::new(on_screen());
        coordinator.subscribe(c.clone(), false);
        settle(&scheduler);
        viewport.emit_scroll(1.0);
        settle(&scheduler);

        assert_eq!(c.fetches.get(), 0);
    }

    #[test]
    fn test_registration_order() {
        let (coordinator, scheduler, _viewport) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));

        struct Ordered {
            id: u8,
            order: Rc<RefCell<Vec<u8>>>,
        }
        impl TextComponent for Ordered {
            fn update_texts(&self) {
                self.order.borrow_mut().push(self.id);
            }
            fn element(&self) -> Option<Rect> {
                Some(on_screen())
            }
        }

        for id in 0..4 {
            coordinator.subscribe(Rc::new(Ordered { id, order: order.clone() }), false);
        }
        settle(&scheduler);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }
}
