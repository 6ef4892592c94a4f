//! End-to-end dispatch through the public `courier` API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use courier::core::{BoxedReply, Envelope};
use courier::prelude::*;
use parking_lot::Mutex;

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Message)]
#[message(reply = "String")]
struct Rename {
    name: String,
}

impl Rename {
    fn foo_bar() -> Self {
        Self {
            name: "Foo Bar".to_string(),
        }
    }
}

/// Derived through the umbrella re-export instead of `courier_core`.
#[derive(Message)]
#[message(reply = "u64", crate = "::courier::core")]
struct Count;

#[derive(Debug, Clone)]
struct Account {
    id: u64,
    owner: String,
    touched: Arc<AtomicUsize>,
}

impl Account {
    fn touch(&self) {
        self.touched.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Message)]
#[message(reply = "Option<Account>", name = "accounts.get")]
struct GetAccount {
    id: u64,
}

#[derive(Message)]
#[message(name = "accounts.process")]
struct ProcessAccount {
    account_id: u64,
}

#[derive(Message)]
#[message(reply = "i32")]
struct Total;

#[derive(Message)]
#[message(reply = "Vec<&'static str>")]
struct Steps;

#[derive(Message)]
#[message(reply = "Vec<T>")]
struct Repeat<T: Clone> {
    value: T,
    times: usize,
}

// =============================================================================
// Handlers
// =============================================================================

struct ReturnsName;

impl HandleReply<Rename> for ReturnsName {
    fn handle(&mut self, message: &Rename, _reply: String) -> HandlerResult<String> {
        Ok(message.name.clone())
    }
}

struct NoOp;

impl Handle<Rename> for NoOp {
    fn handle(&mut self, _message: &Rename) -> HandlerResult {
        Ok(())
    }
}

/// Observes every message type it is registered for.
#[derive(Clone, Default)]
struct AuditHook {
    seen: Arc<Mutex<Vec<&'static str>>>,
}

impl<M: Message> Handle<M> for AuditHook {
    fn handle(&mut self, _message: &M) -> HandlerResult {
        self.seen.lock().push(M::message_name());
        Ok(())
    }
}

struct ProcessAccountHandler;

impl HandleWithMediator<ProcessAccount> for ProcessAccountHandler {
    fn handle(&mut self, mediator: &dyn Dispatch, message: &ProcessAccount) -> HandlerResult {
        let account = mediator
            .send(GetAccount {
                id: message.account_id,
            })?
            .ok_or_else(|| anyhow::anyhow!("account {} not found", message.account_id))?;
        account.touch();
        Ok(())
    }
}

struct AccountLookup {
    touched: Arc<AtomicUsize>,
}

impl HandleReply<GetAccount> for AccountLookup {
    fn handle(
        &mut self,
        message: &GetAccount,
        _reply: Option<Account>,
    ) -> HandlerResult<Option<Account>> {
        Ok((message.id == 7).then(|| Account {
            id: 7,
            owner: "ada".to_string(),
            touched: Arc::clone(&self.touched),
        }))
    }
}

fn account_mediator(lookups: Arc<AtomicUsize>, touched: Arc<AtomicUsize>) -> Mediator {
    let mut registry = Registry::new();
    registry
        .register_void(|| vec![Handler::mediated(ProcessAccountHandler)])
        .unwrap();
    registry
        .register_default(move || {
            lookups.fetch_add(1, Ordering::SeqCst);
            vec![Handler::reply(AccountLookup {
                touched: Arc::clone(&touched),
            })]
        })
        .unwrap();
    Mediator::new(registry)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn single_reply_handler_returns_name() {
    let mut registry = Registry::new();
    registry
        .register_default(|| vec![Handler::reply(ReturnsName)])
        .unwrap();
    let mediator = Mediator::new(registry);

    assert_eq!(mediator.send(Rename::foo_bar()).unwrap(), "Foo Bar");
}

#[test]
fn pure_handler_position_does_not_change_reply() {
    let mut before = Registry::new();
    before
        .register_default(|| vec![Handler::pure(NoOp), Handler::reply(ReturnsName)])
        .unwrap();

    let mut after = Registry::new();
    after
        .register_default(|| vec![Handler::reply(ReturnsName), Handler::pure(NoOp)])
        .unwrap();

    for registry in [before, after] {
        let mediator = Mediator::new(registry);
        assert_eq!(mediator.send(Rename::foo_bar()).unwrap(), "Foo Bar");
    }
}

#[test]
fn unregistered_message_is_rejected() {
    let mediator = Mediator::new(Registry::new());

    let err = mediator.send(Rename::foo_bar()).unwrap_err();
    assert!(matches!(err, DispatchError::Unregistered { .. }));
    assert!(err.to_string().contains("Rename"));
}

#[test]
fn second_registration_is_rejected() {
    let mut registry = Registry::new();
    registry
        .register_default(|| vec![Handler::reply(ReturnsName)])
        .unwrap();

    let err = registry
        .register_with(|| vec![Handler::pure(NoOp)], || "seed".to_string())
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));

    // The first registration stays in effect.
    let mediator = Mediator::new(registry);
    assert_eq!(mediator.send(Rename::foo_bar()).unwrap(), "Foo Bar");
}

#[test]
fn nested_send_runs_once_per_outer_send() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let touched = Arc::new(AtomicUsize::new(0));
    let mediator = account_mediator(Arc::clone(&lookups), Arc::clone(&touched));

    mediator.publish(ProcessAccount { account_id: 7 }).unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 1);
    assert_eq!(touched.load(Ordering::SeqCst), 1);

    mediator.publish(ProcessAccount { account_id: 7 }).unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
    assert_eq!(touched.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Chain behaviour
// =============================================================================

#[test]
fn generic_hook_leaves_reply_untouched() {
    let hook = AuditHook::default();
    let seen = Arc::clone(&hook.seen);

    let mut registry = Registry::new();
    {
        let hook = hook.clone();
        registry
            .register_default(move || {
                vec![
                    Handler::pure(hook.clone()),
                    Handler::reply(ReturnsName),
                    Handler::pure(hook.clone()),
                ]
            })
            .unwrap();
    }
    registry
        .register_void(move || {
            vec![
                Handler::pure(hook.clone()),
                Handler::mediated(ProcessAccountHandler),
            ]
        })
        .unwrap();
    registry
        .register_default(|| {
            vec![Handler::reply_fn(|m: &GetAccount, _| {
                Ok(Some(Account {
                    id: m.id,
                    owner: "grace".to_string(),
                    touched: Arc::default(),
                }))
            })]
        })
        .unwrap();
    let mediator = Mediator::new(registry);

    assert_eq!(mediator.send(Rename::foo_bar()).unwrap(), "Foo Bar");
    mediator.publish(ProcessAccount { account_id: 1 }).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            std::any::type_name::<Rename>(),
            std::any::type_name::<Rename>(),
            "accounts.process",
        ]
    );
}

#[test]
fn handlers_are_fresh_for_every_send() {
    struct Counter(usize);

    impl HandleReply<Total> for Counter {
        fn handle(&mut self, _message: &Total, reply: i32) -> HandlerResult<i32> {
            self.0 += 1;
            Ok(reply + self.0 as i32)
        }
    }

    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    {
        let built = Arc::clone(&built);
        registry
            .register_scalar(move || {
                built.fetch_add(1, Ordering::SeqCst);
                vec![Handler::reply(Counter(0))]
            })
            .unwrap();
    }
    let mediator = Mediator::new(registry);

    for _ in 0..3 {
        assert_eq!(mediator.send(Total).unwrap(), 1);
    }
    assert_eq!(built.load(Ordering::SeqCst), 3);
}

#[test]
fn seed_strategies() {
    let mut registry = Registry::new();
    registry
        .register_scalar(|| vec![Handler::pure_fn(|_: &Total| Ok(()))])
        .unwrap();
    registry
        .register_with(
            || {
                vec![Handler::reply_fn(|_: &Steps, mut steps: Vec<&'static str>| {
                    steps.push("handled");
                    Ok(steps)
                })]
            },
            || vec!["seeded"],
        )
        .unwrap();
    registry
        .register_default(|| {
            vec![Handler::reply_fn(|m: &Repeat<char>, mut acc: Vec<char>| {
                acc.extend(std::iter::repeat_n(m.value, m.times));
                Ok(acc)
            })]
        })
        .unwrap();
    let mediator = Mediator::new(registry);

    assert_eq!(mediator.send(Total).unwrap(), 0);
    assert_eq!(mediator.send(Steps).unwrap(), vec!["seeded", "handled"]);
    assert_eq!(
        mediator.send(Repeat { value: 'x', times: 3 }).unwrap(),
        vec!['x', 'x', 'x']
    );
    assert_eq!(
        mediator.send(Repeat { value: 'y', times: 0 }).unwrap(),
        Vec::<char>::new()
    );
}

#[test]
fn handler_error_aborts_chain() {
    let reached = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new();
    {
        let reached = Arc::clone(&reached);
        registry
            .register_default(move || {
                let reached = Arc::clone(&reached);
                vec![
                    Handler::reply(ReturnsName),
                    Handler::reply_fn(|m: &Rename, _| {
                        anyhow::bail!("name {:?} is reserved", m.name)
                    }),
                    Handler::pure_fn(move |_: &Rename| {
                        reached.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                ]
            })
            .unwrap();
    }
    let mediator = Mediator::new(registry);

    let err = mediator.send(Rename::foo_bar()).unwrap_err();
    match &err {
        DispatchError::Handler { index, source, .. } => {
            assert_eq!(*index, 1);
            assert!(source.to_string().contains("reserved"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_handler_error());
    assert_eq!(reached.load(Ordering::SeqCst), 0);
}

#[derive(Debug, thiserror::Error)]
#[error("name {0:?} is taken")]
struct NameTaken(String);

#[test]
fn handler_error_type_is_recoverable() {
    let mut registry = Registry::new();
    registry
        .register_default(|| {
            vec![Handler::reply_fn(|m: &Rename, _| {
                Err(NameTaken(m.name.clone()).into())
            })]
        })
        .unwrap();
    let mediator = Mediator::new(registry);

    let err = mediator.send(Rename::foo_bar()).unwrap_err();
    let DispatchError::Handler { source, .. } = &err else {
        panic!("unexpected error: {err}");
    };
    let taken = source
        .downcast_ref::<NameTaken>()
        .expect("handler error keeps its type");
    assert_eq!(taken.0, "Foo Bar");
}

#[test]
fn derive_through_umbrella_path() {
    let mut registry = Registry::new();
    registry
        .register(
            || vec![Handler::reply_fn(|_: &Count, n| Ok(n + 2))],
            InitialReply::from_fn(|| 40),
        )
        .unwrap();
    let mediator = Mediator::new(registry);

    assert_eq!(mediator.send(Count).unwrap(), 42);
}

#[test]
fn nested_unregistered_surfaces_unchanged() {
    let mut registry = Registry::new();
    registry
        .register_void(|| vec![Handler::mediated(ProcessAccountHandler)])
        .unwrap();
    let mediator = Mediator::new(registry);

    let err = mediator.publish(ProcessAccount { account_id: 7 }).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Unregistered {
            message: "accounts.get"
        }
    ));
}

#[test]
fn missing_account_is_a_handler_error() {
    let mediator = account_mediator(Arc::default(), Arc::default());

    let err = mediator.publish(ProcessAccount { account_id: 99 }).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Handler {
            message: "accounts.process",
            index: 0,
            ..
        }
    ));
}

// =============================================================================
// Fake dispatchers
// =============================================================================

/// Answers `GetAccount` without a registry.
struct FakeAccounts {
    touched: Arc<AtomicUsize>,
}

impl Dispatch for FakeAccounts {
    fn dispatch(&self, envelope: Envelope) -> DispatchResult<BoxedReply> {
        match envelope.downcast_ref::<GetAccount>() {
            Some(query) => Ok(Box::new(Some(Account {
                id: query.id,
                owner: "fake".to_string(),
                touched: Arc::clone(&self.touched),
            }))),
            None => Err(DispatchError::Unregistered {
                message: envelope.name(),
            }),
        }
    }
}

/// Replies with a value of the wrong type for every message.
struct WrongReply;

impl Dispatch for WrongReply {
    fn dispatch(&self, _envelope: Envelope) -> DispatchResult<BoxedReply> {
        Ok(Box::new(42_u8))
    }
}

#[test]
fn mediated_handler_against_fake_dispatcher() {
    let touched = Arc::new(AtomicUsize::new(0));
    let fake = FakeAccounts {
        touched: Arc::clone(&touched),
    };

    let mut handler = Handler::mediated(ProcessAccountHandler);
    handler
        .invoke(&fake, &ProcessAccount { account_id: 3 }, ())
        .unwrap();
    assert_eq!(touched.load(Ordering::SeqCst), 1);

    let account = fake.send(GetAccount { id: 3 }).unwrap().unwrap();
    assert_eq!((account.id, account.owner.as_str()), (3, "fake"));
    assert!(fake.send(Rename::foo_bar()).is_err());
}

#[test]
fn wrong_reply_type_is_a_mismatch() {
    match WrongReply.send(Rename::foo_bar()).unwrap_err() {
        DispatchError::ResultTypeMismatch { expected, .. } => {
            assert_eq!(expected, std::any::type_name::<String>());
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut handler = Handler::mediated(ProcessAccountHandler);
    let err = handler
        .invoke(&WrongReply, &ProcessAccount { account_id: 3 }, ())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DispatchError>(),
        Some(DispatchError::ResultTypeMismatch { .. })
    ));
}

// =============================================================================
// Runtime wiring and sharing
// =============================================================================

#[test]
fn runtime_applies_depth_limit() {
    #[derive(Message)]
    #[message(reply = "u32")]
    struct Dive(u32);

    let mut runtime = Runtime::new(CourierConfig {
        mediator: courier::runtime::MediatorConfig { max_depth: 4 },
        ..Default::default()
    });
    runtime
        .register_default(|| {
            vec![Handler::mediated_reply_fn(|mediator, m: &Dive, _| {
                Ok(mediator.send(Dive(m.0 + 1))?)
            })]
        })
        .unwrap();
    let mediator = runtime.start();

    let err = mediator.send(Dive(0)).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::DepthExceeded { max_depth: 4, .. }
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_share_one_mediator() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let touched = Arc::new(AtomicUsize::new(0));
    let mediator = Arc::new(account_mediator(Arc::clone(&lookups), Arc::clone(&touched)));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let mediator = Arc::clone(&mediator);
            tokio::task::spawn_blocking(move || mediator.publish(ProcessAccount { account_id: 7 }))
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(lookups.load(Ordering::SeqCst), 32);
    assert_eq!(touched.load(Ordering::SeqCst), 32);
}
