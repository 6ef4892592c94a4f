//! Zoo Demo
//!
//! A unit of work per send. The handler factory opens one session on a
//! shared document store and hands it to every handler in the chain; the
//! last handler commits it. A failing handler aborts the chain, so nothing
//! reaches the store.
//!
//! ```text
//! send(RegisterElephant) ── factory: session = store.open_session()
//!   ├── Zoo(session)         stores the elephant, replies with its id
//!   └── UnitOfWork(session)  save_changes()
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package zoo-demo
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Result, bail, ensure};
use courier::prelude::*;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

// ============================================================================
// Document store
// ============================================================================

#[derive(Debug, Clone)]
struct Elephant {
    id: String,
    name: String,
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<String, Elephant>,
    next_id: u64,
}

/// Process-wide store shared by every session.
#[derive(Default)]
struct DocumentStore {
    state: Mutex<StoreState>,
}

impl DocumentStore {
    fn open_session(self: &Arc<Self>) -> Session {
        Session {
            store: Arc::clone(self),
            pending: Vec::new(),
        }
    }

    fn load(&self, id: &str) -> Option<Elephant> {
        self.state.lock().documents.get(id).cloned()
    }

    fn contains_name(&self, name: &str) -> bool {
        self.state
            .lock()
            .documents
            .values()
            .any(|elephant| elephant.name == name)
    }

    fn len(&self) -> usize {
        self.state.lock().documents.len()
    }

    fn reserve_id(&self) -> String {
        let mut state = self.state.lock();
        state.next_id += 1;
        format!("elephants/{}", state.next_id)
    }
}

/// Buffered writes against a [`DocumentStore`].
struct Session {
    store: Arc<DocumentStore>,
    pending: Vec<Elephant>,
}

impl Session {
    fn put(&mut self, name: &str) -> String {
        let id = self.store.reserve_id();
        self.pending.push(Elephant {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    fn save_changes(&mut self) {
        let mut state = self.store.state.lock();
        for elephant in self.pending.drain(..) {
            debug!(id = %elephant.id, "Committing document");
            state.documents.insert(elephant.id.clone(), elephant);
        }
    }
}

// Handlers of one send share the session; they never cross threads.
type SharedSession = Rc<RefCell<Session>>;

// ============================================================================
// Messages and handlers
// ============================================================================

#[derive(Debug, Message)]
#[message(reply = "String", name = "zoo.register_elephant")]
struct RegisterElephant {
    name: String,
}

struct Zoo {
    session: SharedSession,
}

impl HandleReply<RegisterElephant> for Zoo {
    fn handle(&mut self, message: &RegisterElephant, _reply: String) -> HandlerResult<String> {
        ensure!(!message.name.trim().is_empty(), "an elephant needs a name");

        let mut session = self.session.borrow_mut();
        if session.store.contains_name(&message.name) {
            bail!("an elephant called {} already lives here", message.name);
        }
        Ok(session.put(&message.name))
    }
}

/// Commits the send's session; registered last in every chain.
struct UnitOfWork {
    session: SharedSession,
}

impl<M: Message> Handle<M> for UnitOfWork {
    fn handle(&mut self, _message: &M) -> HandlerResult {
        self.session.borrow_mut().save_changes();
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let store = Arc::new(DocumentStore::default());

    let mut runtime = Runtime::builder().build()?;
    {
        let store = Arc::clone(&store);
        runtime.register_default::<RegisterElephant, _>(move || {
            let session = Rc::new(RefCell::new(store.open_session()));
            vec![
                Handler::reply(Zoo {
                    session: Rc::clone(&session),
                }),
                Handler::pure(UnitOfWork { session }),
            ]
        })?;
    }
    let mediator = runtime.start();

    let id = mediator.send(RegisterElephant {
        name: "Ellie".to_string(),
    })?;
    let ellie = store
        .load(&id)
        .ok_or_else(|| anyhow::anyhow!("{id} was not committed"))?;
    info!(id = %ellie.id, name = %ellie.name, "Registered");

    for name in ["Ellie", " ", "Dumbo"] {
        match mediator.send(RegisterElephant {
            name: name.to_string(),
        }) {
            Ok(id) => info!(%id, name, "Registered"),
            Err(e) => warn!(name, error = %e, "Registration rejected"),
        }
    }

    info!(elephants = store.len(), "Zoo population");
    Ok(())
}
