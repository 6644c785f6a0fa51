//! End-to-end tests for declared handlers bound to a live bus

use eventbind::prelude::*;
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
struct FirstEvent;
impl Event for FirstEvent {}

#[derive(Debug)]
struct SecondEvent;
impl Event for SecondEvent {}

fn count(counter: &AtomicU32) -> u32 {
    counter.load(Ordering::SeqCst)
}

#[derive(Default)]
struct TestPresenter {
    first_events_handled: AtomicU32,
    second_events_handled: AtomicU32,
    registration: Mutex<Option<BindingHandle>>,
}

#[event_binder]
impl TestPresenter {
    fn bind(self: &Arc<Self>, bus: &EventBus) {
        let handle = self.bind_event_handlers(bus).unwrap();
        *self.registration.lock() = Some(handle);
    }

    fn unbind(&self) {
        if let Some(handle) = self.registration.lock().as_mut() {
            handle.unbind();
        }
    }

    #[event_handler]
    fn on_first_event(&self, _event: &FirstEvent) {
        self.first_events_handled.fetch_add(1, Ordering::SeqCst);
    }

    #[event_handler]
    fn on_second_event(&self, _event: &SecondEvent) {
        self.second_events_handled.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct SubPresenter {
    base: TestPresenter,
    sub_second_events_handled: AtomicU32,
    first_events_handled_again: AtomicU32,
}

#[event_binder(extends = TestPresenter, via = base)]
impl SubPresenter {
    #[event_handler]
    fn on_second_event(&self, _event: &SecondEvent) {
        self.sub_second_events_handled.fetch_add(1, Ordering::SeqCst);
    }

    #[event_handler]
    fn on_first_event_again(&self, _event: &FirstEvent) {
        self.first_events_handled_again.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct QuietPresenter {
    base: TestPresenter,
}

#[event_binder(extends = TestPresenter, via = base)]
impl QuietPresenter {
    fn on_second_event(&self, _event: &SecondEvent) {}
}

#[derive(Default)]
struct AnyEventPresenter {
    either_handled: AtomicU32,
    seen: Mutex<Vec<String>>,
}

#[event_binder]
impl AnyEventPresenter {
    #[event_handler(handles = [FirstEvent, SecondEvent])]
    fn on_first_or_second(&self) {
        self.either_handled.fetch_add(1, Ordering::SeqCst);
    }

    #[event_handler(handles = [SecondEvent, FirstEvent])]
    fn on_any(&self, event: &dyn Event) {
        self.seen.lock().push(event.event_name().to_string());
    }
}

#[derive(Default)]
struct AbstractPresenter;

#[event_binder]
impl AbstractPresenter {
    #[event_handler]
    fn on_anything(&self, _event: &dyn Event) {}
}

#[derive(Default)]
struct MismatchedPresenter;

#[event_binder]
impl MismatchedPresenter {
    #[event_handler(handles = [SecondEvent])]
    fn on_first_event(&self, _event: &FirstEvent) {}
}

struct RelayPresenter {
    bus: EventBus,
    relayed: AtomicU32,
}

#[event_binder]
impl RelayPresenter {
    #[event_handler]
    fn on_first_event(&self, _event: &FirstEvent) {
        self.bus.publish(SecondEvent);
    }

    #[event_handler]
    fn on_second_event(&self, _event: &SecondEvent) {
        self.relayed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct LabelledPresenter {
    firsts: AtomicU32,
}

#[event_binder]
impl LabelledPresenter {
    fn label(&self, prefix: &impl Display) -> String {
        format!("{}: {}", prefix, count(&self.firsts))
    }

    #[event_handler]
    fn on_first_event(&self, _event: &FirstEvent) {
        self.firsts.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_event_binder() {
    init_tracing();
    let bus = EventBus::new();
    let presenter = Arc::new(TestPresenter::default());
    presenter.bind(&bus);

    assert_eq!(count(&presenter.first_events_handled), 0);
    bus.publish(FirstEvent);
    assert_eq!(count(&presenter.first_events_handled), 1);

    assert_eq!(count(&presenter.second_events_handled), 0);
    bus.publish(SecondEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.second_events_handled), 2);
}

#[test]
fn test_unbind_and_rebind() {
    init_tracing();
    let bus = EventBus::new();
    let presenter = Arc::new(TestPresenter::default());
    presenter.bind(&bus);

    bus.publish(FirstEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.first_events_handled), 1);
    assert_eq!(count(&presenter.second_events_handled), 1);

    presenter.unbind();
    bus.publish(FirstEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.first_events_handled), 1);
    assert_eq!(count(&presenter.second_events_handled), 1);

    // Unbinding again changes nothing
    presenter.unbind();
    assert_eq!(bus.total_handlers(), 0);

    presenter.bind(&bus);
    bus.publish(FirstEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.first_events_handled), 2);
    assert_eq!(count(&presenter.second_events_handled), 2);
}

#[test]
fn test_old_handle_does_not_affect_new_binding() {
    let bus = EventBus::new();
    let presenter = Arc::new(TestPresenter::default());

    let mut first = presenter.bind_event_handlers(&bus).unwrap();
    first.unbind();
    let second = presenter.bind_event_handlers(&bus).unwrap();
    first.unbind();

    bus.publish(FirstEvent);
    assert_eq!(count(&presenter.first_events_handled), 1);
    assert_eq!(second.state(), BindingState::Bound);
}

#[test]
fn test_subtype_overrides_and_inherits() {
    init_tracing();
    let bus = EventBus::new();
    let presenter = Arc::new(SubPresenter::default());
    let _handle = presenter.bind_event_handlers(&bus).unwrap();

    bus.publish(FirstEvent);
    assert_eq!(count(&presenter.base.first_events_handled), 1);
    assert_eq!(count(&presenter.first_events_handled_again), 1);

    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.sub_second_events_handled), 1);
    assert_eq!(count(&presenter.base.second_events_handled), 0);
}

#[test]
fn test_subtype_descriptor_order() {
    let binder = EventBinder::<SubPresenter>::shared().unwrap();
    let methods: Vec<_> = binder
        .descriptors()
        .iter()
        .map(|d| (d.declared_by(), d.method()))
        .collect();

    assert_eq!(
        methods,
        vec![
            ("SubPresenter", "on_second_event"),
            ("SubPresenter", "on_first_event_again"),
            ("TestPresenter", "on_first_event"),
        ]
    );
}

#[test]
fn test_unannotated_override_hides_inherited_handler() {
    let bus = EventBus::new();
    let presenter = Arc::new(QuietPresenter::default());
    let _handle = presenter.bind_event_handlers(&bus).unwrap();

    bus.publish(FirstEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.base.first_events_handled), 1);
    assert_eq!(count(&presenter.base.second_events_handled), 0);
    assert_eq!(bus.handler_count::<SecondEvent>(), 0);
}

#[test]
fn test_explicit_event_list() {
    let bus = EventBus::new();
    let presenter = Arc::new(AnyEventPresenter::default());
    let mut handle = presenter.bind_event_handlers(&bus).unwrap();
    assert_eq!(handle.len(), 4);

    bus.publish(FirstEvent);
    bus.publish(SecondEvent);
    assert_eq!(count(&presenter.either_handled), 2);
    assert_eq!(presenter.seen.lock().len(), 2);
    assert!(presenter.seen.lock()[0].ends_with("FirstEvent"));
    assert!(presenter.seen.lock()[1].ends_with("SecondEvent"));

    handle.unbind();
    bus.publish(FirstEvent);
    assert_eq!(count(&presenter.either_handled), 2);
}

#[test]
fn test_explicit_list_order_is_kept() {
    let binder = EventBinder::<AnyEventPresenter>::new().unwrap();
    let on_any = binder
        .descriptors()
        .iter()
        .find(|d| d.method() == "on_any")
        .unwrap();

    let names: Vec<_> = on_any.event_types().iter().map(|t| t.short_name()).collect();
    assert_eq!(names, vec!["SecondEvent", "FirstEvent"]);
}

#[test]
fn test_abstract_parameter_is_rejected() {
    init_tracing();
    let bus = EventBus::new();
    let err = Arc::new(AbstractPresenter).bind_event_handlers(&bus).unwrap_err();

    assert!(matches!(err, ResolveError::AbstractParameter { .. }));
    assert_eq!(err.method(), "on_anything");
    assert!(err.to_string().contains("AbstractPresenter::on_anything"));
    assert_eq!(bus.total_handlers(), 0);
}

#[test]
fn test_unassignable_listed_event_is_rejected() {
    let bus = EventBus::new();
    let err = Arc::new(MismatchedPresenter)
        .bind_event_handlers(&bus)
        .unwrap_err();

    assert!(matches!(err, ResolveError::NotAssignable { .. }));
    assert_eq!(err.method(), "on_first_event");
}

#[test]
fn test_handler_may_publish() {
    let bus = EventBus::new();
    let presenter = Arc::new(RelayPresenter {
        bus: bus.clone(),
        relayed: AtomicU32::new(0),
    });
    let mut handle = presenter.bind_event_handlers(&bus).unwrap();

    bus.publish(FirstEvent);
    assert_eq!(count(&presenter.relayed), 1);

    // The callbacks hold the presenter, and through it the bus, until unbound
    handle.unbind();
    assert_eq!(Arc::strong_count(&presenter), 1);
}

#[test]
fn test_separate_buses_are_isolated() {
    let bus_a = EventBus::new();
    let bus_b = EventBus::new();
    let presenter = Arc::new(TestPresenter::default());
    let _a = presenter.bind_event_handlers(&bus_a).unwrap();

    bus_b.publish(FirstEvent);
    assert_eq!(count(&presenter.first_events_handled), 0);

    bus_a.publish(FirstEvent);
    assert_eq!(count(&presenter.first_events_handled), 1);
}

#[test]
fn test_impl_trait_helper_does_not_affect_binding() {
    let bus = EventBus::new();
    let presenter = Arc::new(LabelledPresenter::default());
    let _handle = presenter.bind_event_handlers(&bus).unwrap();

    bus.publish(FirstEvent);
    assert_eq!(presenter.label(&"firsts"), "firsts: 1");
}
