//! Hover state shared by the overlays of one chart.
//!
//! State transitions are a pure reducer ([`reduce`]). [`InteractionHandle`] wraps the state
//! for one chart instance and notifies every subscribed overlay after each dispatch, so rulers,
//! hit areas and tooltips always see the same datum. Handles are single-threaded and never
//! shared between charts.

use crate::models::Observation;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MousePosition {
    pub x: f64,
    pub y: f64,
}

impl MousePosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionState {
    pub visible: bool,
    pub datum: Option<Observation>,
    pub mouse: Option<MousePosition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionAction {
    /// Replace the whole state.
    Update(InteractionState),
    /// Hide; the last datum is kept so overlays can fade it out.
    Hide,
}

pub fn reduce(state: &InteractionState, action: InteractionAction) -> InteractionState {
    match action {
        InteractionAction::Update(next) => next,
        InteractionAction::Hide => InteractionState {
            visible: false,
            ..state.clone()
        },
    }
}

/// Subscription id returned by [`InteractionHandle::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

type Listener = Rc<dyn Fn(&InteractionState)>;

#[derive(Default)]
struct Inner {
    state: InteractionState,
    listeners: Vec<(SubscriberId, Listener)>,
    next_id: usize,
}

/// Per-chart interaction store. Clones share the same state.
#[derive(Clone, Default)]
pub struct InteractionHandle {
    inner: Rc<RefCell<Inner>>,
}

impl std::fmt::Debug for InteractionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("InteractionHandle")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl InteractionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> InteractionState {
        self.inner.borrow().state.clone()
    }

    pub fn subscribe(&self, listener: impl Fn(&InteractionState) + 'static) -> SubscriberId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        let listener: Listener = Rc::new(listener);
        inner.listeners.push((id, listener));
        id
    }

    /// Returns whether the subscriber was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(i, _)| *i != id);
        inner.listeners.len() != before
    }

    /// Apply an action and notify every subscriber with the new state.
    ///
    /// Listeners registered when the dispatch starts are notified. They may subscribe,
    /// unsubscribe or dispatch on the same handle; changes take effect from the next dispatch.
    pub fn dispatch(&self, action: InteractionAction) {
        log::trace!("interaction: {action:?}");
        let (state, listeners) = {
            let mut inner = self.inner.borrow_mut();
            let next = reduce(&inner.state, action);
            inner.state = next.clone();
            let listeners: Vec<Listener> =
                inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
            (next, listeners)
        };
        for listener in listeners {
            listener(&state);
        }
    }

    pub fn show(&self, datum: Observation, mouse: MousePosition) {
        self.dispatch(InteractionAction::Update(InteractionState {
            visible: true,
            datum: Some(datum),
            mouse: Some(mouse),
        }));
    }

    pub fn hide(&self) {
        self.dispatch(InteractionAction::Hide);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn hide_keeps_last_datum() {
        let datum = Observation::new().with("year", 2020);
        let shown = reduce(
            &InteractionState::default(),
            InteractionAction::Update(InteractionState {
                visible: true,
                datum: Some(datum.clone()),
                mouse: Some(MousePosition::new(3.0, 4.0)),
            }),
        );
        let hidden = reduce(&shown, InteractionAction::Hide);
        assert!(!hidden.visible);
        assert_eq!(hidden.datum, Some(datum));
    }

    #[test]
    fn every_subscriber_sees_each_dispatch() {
        let handle = InteractionHandle::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let (a2, b2) = (a.clone(), b.clone());
        let id_a = handle.subscribe(move |_| a2.set(a2.get() + 1));
        handle.subscribe(move |s| {
            if s.visible {
                b2.set(b2.get() + 1)
            }
        });

        handle.show(Observation::new(), MousePosition::new(1.0, 1.0));
        handle.hide();
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 1);

        assert!(handle.unsubscribe(id_a));
        assert!(!handle.unsubscribe(id_a));
        handle.hide();
        assert_eq!(a.get(), 2);
    }

    #[test]
    fn listeners_may_subscribe_and_unsubscribe_while_notified() {
        let handle = InteractionHandle::new();
        let mounted = Rc::new(Cell::new(0));
        let inner_calls = Rc::new(Cell::new(0));
        let (h, m, calls) = (handle.clone(), mounted.clone(), inner_calls.clone());
        let id = handle.subscribe(move |s| {
            if s.visible && m.get() == 0 {
                let calls = calls.clone();
                h.subscribe(move |_| calls.set(calls.get() + 1));
                m.set(1);
            }
        });

        handle.show(Observation::new(), MousePosition::new(1.0, 1.0));
        assert_eq!(mounted.get(), 1);
        // Registered mid-dispatch, so only later dispatches reach it.
        assert_eq!(inner_calls.get(), 0);
        handle.hide();
        assert_eq!(inner_calls.get(), 1);

        let h = handle.clone();
        let own = Rc::new(Cell::new(None));
        let own2 = own.clone();
        let self_removing = handle.subscribe(move |_| {
            if let Some(id) = own2.get() {
                h.unsubscribe(id);
            }
        });
        own.set(Some(self_removing));
        handle.hide();
        assert!(!handle.unsubscribe(self_removing));
        assert!(handle.unsubscribe(id));
    }

    #[test]
    fn listeners_may_dispatch_while_notified() {
        let handle = InteractionHandle::new();
        let h = handle.clone();
        handle.subscribe(move |s| {
            if s.visible {
                h.hide();
            }
        });
        handle.show(Observation::new(), MousePosition::new(2.0, 3.0));
        let state = handle.state();
        assert!(!state.visible);
        assert_eq!(state.mouse, Some(MousePosition::new(2.0, 3.0)));
    }

    #[test]
    fn clones_share_state() {
        let handle = InteractionHandle::new();
        let other = handle.clone();
        other.show(Observation::new().with("x", 1), MousePosition::new(0.0, 0.0));
        assert!(handle.state().visible);
    }
}
