use crate::config::QueueConfig;
use crate::errors::GuiError;
use crate::events::event::{Event, EventKind, EventOrigin, EventPayload};
use crate::events::listener::{Listener, ListenerHandle, ListenerId, ListenerOptions, Subscriber};
use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

struct QueueState {
    config: QueueConfig,
    events: Vec<Rc<Event>>,
    listeners: Vec<Rc<Listener>>,
}

/// Publish/subscribe queue. Cloning gives another handle to the same queue.
///
/// The queue is never borrowed while a callback runs, so callbacks may fire,
/// connect and disconnect on the queue that is calling them.
#[derive(Clone)]
pub struct EventQueue {
    label: Rc<str>,
    state: Rc<RefCell<QueueState>>,
}

impl EventQueue {
    pub fn new(label: impl Into<String>, config: QueueConfig) -> Self {
        let label: String = label.into();
        Self {
            label: Rc::from(label),
            state: Rc::new(RefCell::new(QueueState {
                config,
                events: Vec::new(),
                listeners: Vec::new(),
            })),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Registers `callback` for events of `kind`.
    pub fn connect<F>(
        &self,
        subscriber: Subscriber,
        kind: EventKind,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, GuiError>
    where
        F: Fn(&Event) -> Result<(), GuiError> + 'static,
    {
        let mut state = self.state.borrow_mut();
        if state.listeners.len() >= state.config.max_listeners {
            return Err(GuiError::ListenerLimitReached(state.config.max_listeners));
        }

        let listener = Rc::new(Listener {
            id: ListenerId::new(),
            subscriber,
            kind,
            predicate: options.predicate,
            callback: Rc::new(callback),
            oneshot: options.oneshot,
            valid: Cell::new(true),
        });
        log::trace!(
            "[{}] {} listens for {} (listener {})",
            self.label,
            listener.subscriber,
            listener.kind,
            listener.id
        );

        state.listeners.push(listener.clone());
        Ok(ListenerHandle { listener })
    }

    /// Fires an event that expires after the queue's default number of ticks.
    pub fn fire(&self, origin: EventOrigin, payload: EventPayload) -> Result<(), GuiError> {
        let expires_in = self.state.borrow().config.default_expires_in;
        self.fire_with_expiry(origin, payload, expires_in)
    }

    /// Fires an event and synchronously calls every matching listener in registration order.
    ///
    /// Listeners connected by a callback during this call are not invoked for this event.
    /// The first callback error stops delivery and is returned.
    pub fn fire_with_expiry(&self, origin: EventOrigin, payload: EventPayload, expires_in: u32) -> Result<(), GuiError> {
        let (event, snapshot) = {
            let mut state = self.state.borrow_mut();
            if state.events.len() >= state.config.max_events {
                return Err(GuiError::EventLimitReached(state.config.max_events));
            }
            if state.listeners.len() >= state.config.max_listeners {
                return Err(GuiError::ListenerLimitReached(state.config.max_listeners));
            }

            let event = Rc::new(Event::new(origin, payload, expires_in));
            state.events.push(event.clone());
            (event, state.listeners.clone())
        };

        log::trace!("[{}] fire {} from {:?}", self.label, event.kind(), event.origin());

        let event: &Event = &event;
        for listener in snapshot {
            if !listener.accepts(event) {
                continue;
            }

            // Consumed before the call so a nested fire cannot reach it again.
            if listener.oneshot {
                listener.valid.set(false);
            }
            let result = (listener.callback)(event);
            if listener.oneshot {
                self.remove_listener(&listener);
            }
            result?;
        }

        Ok(())
    }

    /// Disconnects a listener.
    ///
    /// Disconnecting a oneshot listener that already disconnected itself does nothing.
    pub fn disconnect(&self, handle: &ListenerHandle) -> Result<(), GuiError> {
        let listener = &handle.listener;
        if !listener.valid.get() {
            if listener.oneshot {
                return Ok(());
            }
            return Err(GuiError::ListenerAlreadyDisconnected(listener.id));
        }

        if !self.remove_listener(listener) {
            return Err(GuiError::UnknownListener(listener.id));
        }
        Ok(())
    }

    /// Disconnects a listener by id.
    pub fn disconnect_id(&self, id: ListenerId) -> Result<(), GuiError> {
        let listener = self
            .state
            .borrow()
            .listeners
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(GuiError::UnknownListener(id))?;

        self.remove_listener(&listener);
        Ok(())
    }

    /// Disconnects every listener registered by `subscriber`, returning how many there were.
    pub fn disconnect_subscriber(&self, subscriber: &Subscriber) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|l| {
            if &l.subscriber == subscriber {
                l.valid.set(false);
                false
            } else {
                true
            }
        });
        before - state.listeners.len()
    }

    fn remove_listener(&self, listener: &Rc<Listener>) -> bool {
        let mut state = self.state.borrow_mut();
        match state.listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(pos) => {
                state.listeners.remove(pos);
                listener.valid.set(false);
                log::trace!("[{}] listener {} disconnected", self.label, listener.id);
                true
            }
            None => false,
        }
    }

    /// Ages every retained event by one tick and drops the expired ones.
    pub fn tick(&self) {
        let mut state = self.state.borrow_mut();
        state.events.retain(|event| !event.advance());
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> Vec<Rc<Event>> {
        self.state.borrow().events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn config(&self) -> QueueConfig {
        self.state.borrow().config.clone()
    }

    /// True when both handles refer to the same queue.
    pub fn ptr_eq(&self, other: &EventQueue) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Debug for EventQueue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.try_borrow();
        let mut s = f.debug_struct("EventQueue");
        s.field("label", &self.label);
        if let Ok(state) = state {
            s.field("events", &state.events.len()).field("listeners", &state.listeners.len());
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn queue() -> EventQueue {
        EventQueue::new("test", QueueConfig::default())
    }

    fn user(tag: &str) -> EventPayload {
        EventPayload::user(tag, serde_json::Value::Null)
    }

    fn kind(tag: &str) -> EventKind {
        EventKind::User(tag.into())
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str) -> impl Fn(&Event) -> Result<(), GuiError> + 'static {
        let log = log.clone();
        move |_| {
            log.borrow_mut().push(name);
            Ok(())
        }
    }

    #[test]
    fn fire_without_listeners_only_retains() {
        let q = queue();
        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert_eq!(q.event_count(), 1);
        assert_eq!(q.listener_count(), 0);
        assert_eq!(q.events()[0].kind(), &kind("x"));
    }

    #[test]
    fn persistent_and_oneshot_listeners() {
        let q = queue();
        let log: Log = Rc::default();
        let l1 = q
            .connect(Subscriber::Other("l1".into()), kind("x"), ListenerOptions::new(), recorder(&log, "L1"))
            .unwrap();
        let l2 = q
            .connect(
                Subscriber::Other("l2".into()),
                kind("x"),
                ListenerOptions::new().oneshot(),
                recorder(&log, "L2"),
            )
            .unwrap();

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert_eq!(*log.borrow(), ["L1", "L2"]);
        assert!(l1.is_valid());
        assert!(!l2.is_valid());

        q.fire(EventOrigin::Other, user("x")).unwrap();
        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert_eq!(*log.borrow(), ["L1", "L2", "L1", "L1"]);
        assert_eq!(q.listener_count(), 1);
    }

    #[test]
    fn only_matching_kind_and_predicate_are_called() {
        let q = queue();
        let log: Log = Rc::default();
        q.connect(Subscriber::App, kind("y"), ListenerOptions::new(), recorder(&log, "y"))
            .unwrap();
        q.connect(
            Subscriber::App,
            EventKind::Render,
            ListenerOptions::new().filter(|e| e.delta() > Some(Duration::from_millis(10))),
            recorder(&log, "slow"),
        )
        .unwrap();

        q.fire(EventOrigin::Window, EventPayload::Render { delta: Duration::from_millis(5) })
            .unwrap();
        q.fire(EventOrigin::Window, EventPayload::Render { delta: Duration::from_millis(20) })
            .unwrap();
        q.fire(EventOrigin::Other, user("x")).unwrap();

        assert_eq!(*log.borrow(), ["slow"]);
    }

    #[test]
    fn rejected_oneshot_stays_connected() {
        let q = queue();
        let log: Log = Rc::default();
        let h = q
            .connect(
                Subscriber::App,
                kind("x"),
                ListenerOptions::new().oneshot().filter(|e| e.origin() == EventOrigin::App),
                recorder(&log, "once"),
            )
            .unwrap();

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert!(h.is_valid());
        q.fire(EventOrigin::App, user("x")).unwrap();
        q.fire(EventOrigin::App, user("x")).unwrap();
        assert_eq!(*log.borrow(), ["once"]);
    }

    #[test]
    fn tick_expires_events() {
        let q = queue();
        q.fire(EventOrigin::Other, user("short")).unwrap();
        q.fire_with_expiry(EventOrigin::Other, user("long"), 3).unwrap();

        q.tick();
        let left: Vec<_> = q.events().iter().map(|e| e.kind().to_string()).collect();
        assert_eq!(left, ["long"]);
        assert_eq!(q.events()[0].age(), 1);

        q.tick();
        assert_eq!(q.event_count(), 1);
        q.tick();
        assert_eq!(q.event_count(), 0);
    }

    #[test]
    fn tick_never_dispatches() {
        let q = queue();
        let log: Log = Rc::default();
        q.connect(Subscriber::App, kind("x"), ListenerOptions::new(), recorder(&log, "x"))
            .unwrap();
        q.fire_with_expiry(EventOrigin::Other, user("x"), 5).unwrap();
        q.tick();
        q.tick();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn event_cap_is_fatal_and_keeps_earlier_events() {
        let q = queue();
        for _ in 0..1024 {
            q.fire(EventOrigin::Other, user("x")).unwrap();
        }
        let err = q.fire(EventOrigin::Other, user("x")).unwrap_err();
        assert_eq!(err, GuiError::EventLimitReached(1024));
        assert_eq!(q.event_count(), 1024);

        q.tick();
        assert!(q.fire(EventOrigin::Other, user("x")).is_ok());
    }

    #[test]
    fn listener_cap_is_fatal_and_keeps_earlier_listeners() {
        let q = queue();
        for _ in 0..1024 {
            q.connect(Subscriber::App, kind("x"), ListenerOptions::new(), |_| Ok(()))
                .unwrap();
        }
        let err = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new(), |_| Ok(()))
            .unwrap_err();
        assert_eq!(err, GuiError::ListenerLimitReached(1024));
        assert_eq!(q.listener_count(), 1024);

        // A full listener list also refuses to fire, without retaining anything.
        assert_eq!(
            q.fire(EventOrigin::Other, user("x")),
            Err(GuiError::ListenerLimitReached(1024))
        );
        assert_eq!(q.event_count(), 0);
    }

    #[test]
    fn disconnect_rules() {
        let q = queue();
        let persistent = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new(), |_| Ok(()))
            .unwrap();
        let once = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new().oneshot(), |_| Ok(()))
            .unwrap();

        q.fire(EventOrigin::Other, user("x")).unwrap();
        // already gone oneshot: silent
        assert!(q.disconnect(&once).is_ok());

        q.disconnect(&persistent).unwrap();
        assert!(!persistent.is_valid());
        assert_eq!(
            q.disconnect(&persistent),
            Err(GuiError::ListenerAlreadyDisconnected(persistent.id()))
        );

        let unknown = ListenerId::new();
        assert_eq!(q.disconnect_id(unknown), Err(GuiError::UnknownListener(unknown)));
    }

    #[test]
    fn handle_from_another_queue_is_unknown() {
        let a = queue();
        let b = queue();
        let h = a
            .connect(Subscriber::App, kind("x"), ListenerOptions::new(), |_| Ok(()))
            .unwrap();
        assert_eq!(b.disconnect(&h), Err(GuiError::UnknownListener(h.id())));
        assert!(h.is_valid());
    }

    #[test]
    fn disconnect_by_id_and_subscriber() {
        let q = queue();
        let a = q
            .connect(Subscriber::Other("a".into()), kind("x"), ListenerOptions::new(), |_| Ok(()))
            .unwrap();
        let b1 = q
            .connect(Subscriber::Other("b".into()), kind("x"), ListenerOptions::new(), |_| Ok(()))
            .unwrap();
        q.connect(Subscriber::Other("b".into()), kind("y"), ListenerOptions::new(), |_| Ok(()))
            .unwrap();

        q.disconnect_id(a.id()).unwrap();
        assert!(!a.is_valid());
        assert_eq!(q.disconnect_subscriber(&Subscriber::Other("b".into())), 2);
        assert!(!b1.is_valid());
        assert_eq!(q.listener_count(), 0);
    }

    #[test]
    fn callback_may_fire_recursively() {
        let q = queue();
        let log: Log = Rc::default();
        let inner = q.clone();
        q.connect(Subscriber::App, kind("outer"), ListenerOptions::new(), move |_| {
            inner.fire(EventOrigin::Other, EventPayload::user("inner", serde_json::Value::Null))
        })
        .unwrap();
        q.connect(Subscriber::App, kind("inner"), ListenerOptions::new(), recorder(&log, "inner"))
            .unwrap();
        q.connect(Subscriber::App, kind("outer"), ListenerOptions::new(), recorder(&log, "outer"))
            .unwrap();

        q.fire(EventOrigin::Other, user("outer")).unwrap();
        assert_eq!(*log.borrow(), ["inner", "outer"]);
        assert_eq!(q.event_count(), 2);
    }

    #[test]
    fn listeners_disconnected_mid_fire_are_skipped() {
        let q = queue();
        let log: Log = Rc::default();
        let victim: Rc<RefCell<Option<ListenerHandle>>> = Rc::default();

        let (q2, v2) = (q.clone(), victim.clone());
        q.connect(Subscriber::App, kind("x"), ListenerOptions::new(), move |_| {
            if let Some(h) = v2.borrow().as_ref() {
                q2.disconnect(h)?;
            }
            Ok(())
        })
        .unwrap();
        let h = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new(), recorder(&log, "victim"))
            .unwrap();
        *victim.borrow_mut() = Some(h);

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert!(log.borrow().is_empty());
        assert_eq!(q.listener_count(), 1);
    }

    #[test]
    fn listeners_connected_mid_fire_wait_for_the_next_one() {
        let q = queue();
        let log: Log = Rc::default();
        let (q2, log2) = (q.clone(), log.clone());
        q.connect(Subscriber::App, kind("x"), ListenerOptions::new().oneshot(), move |_| {
            q2.connect(Subscriber::App, kind("x"), ListenerOptions::new(), recorder(&log2, "late"))?;
            Ok(())
        })
        .unwrap();

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert!(log.borrow().is_empty());
        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert_eq!(*log.borrow(), ["late"]);
    }

    #[test]
    fn oneshot_disconnecting_itself_is_fine() {
        let q = queue();
        let slot: Rc<RefCell<Option<ListenerHandle>>> = Rc::default();
        let (q2, s2) = (q.clone(), slot.clone());
        let h = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new().oneshot(), move |_| {
                if let Some(h) = s2.borrow().as_ref() {
                    q2.disconnect(h)?;
                }
                Ok(())
            })
            .unwrap();
        *slot.borrow_mut() = Some(h.clone());

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert!(!h.is_valid());
        assert!(q.disconnect(&h).is_ok());
        assert_eq!(q.listener_count(), 0);
    }

    #[test]
    fn oneshot_refiring_its_own_kind_runs_once() {
        let q = queue();
        let calls = Rc::new(Cell::new(0));
        let (q2, c2) = (q.clone(), calls.clone());
        let h = q
            .connect(Subscriber::App, kind("x"), ListenerOptions::new().oneshot(), move |_| {
                c2.set(c2.get() + 1);
                if c2.get() < 5 {
                    q2.fire(EventOrigin::Other, EventPayload::user("x", serde_json::Value::Null))?;
                }
                Ok(())
            })
            .unwrap();

        q.fire(EventOrigin::Other, user("x")).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(q.event_count(), 2);
        assert_eq!(q.listener_count(), 0);
        assert!(q.disconnect(&h).is_ok());
    }

    #[test]
    fn callback_error_stops_delivery() {
        let q = queue();
        let log: Log = Rc::default();
        q.connect(Subscriber::App, kind("x"), ListenerOptions::new().oneshot(), |_| {
            Err(GuiError::Lifecycle("boom".into()))
        })
        .unwrap();
        q.connect(Subscriber::App, kind("x"), ListenerOptions::new(), recorder(&log, "after"))
            .unwrap();

        assert_eq!(
            q.fire(EventOrigin::Other, user("x")),
            Err(GuiError::Lifecycle("boom".into()))
        );
        assert!(log.borrow().is_empty());
        // the failing oneshot still counts as invoked
        assert_eq!(q.listener_count(), 1);
    }
}
