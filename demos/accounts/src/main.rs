//! Accounts Demo
//!
//! A void command whose handler queries an account through the mediator
//! instead of holding a reference to the repository.
//!
//! ```text
//! publish(ProcessAccount)
//! ├── AuditHook                    (any message)
//! └── AccountExpediter             (mediated)
//!     └── send(GetAccount) ──▶ AccountRepository ──▶ Option<Account>
//! ```
//!
//! # Usage
//!
//! ```bash
//! COURIER_LOGGING__LEVEL=debug cargo run --package accounts-demo
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use courier::prelude::*;
use parking_lot::RwLock;
use tracing::{info, warn};

// ============================================================================
// Domain
// ============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: u64,
    owner: String,
    balance: i64,
    expedited: bool,
}

impl Account {
    fn expedite(&mut self) {
        self.expedited = true;
    }
}

type Accounts = Arc<RwLock<HashMap<u64, Account>>>;

// ============================================================================
// Messages
// ============================================================================

/// Marks an account as expedited.
#[derive(Debug, Message)]
#[message(name = "accounts.process")]
struct ProcessAccount {
    account_id: u64,
}

#[derive(Debug, Message)]
#[message(reply = "Option<Account>", name = "accounts.get")]
struct GetAccount {
    id: u64,
}

#[derive(Debug, Message)]
#[message(name = "accounts.save")]
struct SaveAccount {
    account: Account,
}

// ============================================================================
// Handlers
// ============================================================================

/// Logs every message it is registered for.
struct AuditHook;

impl<M: Message> Handle<M> for AuditHook {
    fn handle(&mut self, _message: &M) -> HandlerResult {
        info!(message_type = M::message_name(), "audit");
        Ok(())
    }
}

struct AccountRepository {
    accounts: Accounts,
}

impl HandleReply<GetAccount> for AccountRepository {
    fn handle(
        &mut self,
        message: &GetAccount,
        _reply: Option<Account>,
    ) -> HandlerResult<Option<Account>> {
        Ok(self.accounts.read().get(&message.id).cloned())
    }
}

impl Handle<SaveAccount> for AccountRepository {
    fn handle(&mut self, message: &SaveAccount) -> HandlerResult {
        self.accounts
            .write()
            .insert(message.account.id, message.account.clone());
        Ok(())
    }
}

struct AccountExpediter;

impl HandleWithMediator<ProcessAccount> for AccountExpediter {
    fn handle(&mut self, mediator: &dyn Dispatch, message: &ProcessAccount) -> HandlerResult {
        let mut account = mediator
            .send(GetAccount {
                id: message.account_id,
            })?
            .with_context(|| format!("account {} does not exist", message.account_id))?;

        account.expedite();
        info!(id = account.id, owner = %account.owner, "Account expedited");

        mediator.publish(SaveAccount { account })?;
        Ok(())
    }
}

// ============================================================================
// Wiring
// ============================================================================

fn seed_accounts() -> Accounts {
    let accounts = [
        (1, "ada", 1_200),
        (2, "grace", -40),
        (3, "linus", 0),
    ]
    .into_iter()
    .map(|(id, owner, balance)| {
        let account = Account {
            id,
            owner: owner.to_string(),
            balance,
            expedited: false,
        };
        (id, account)
    })
    .collect();

    Arc::new(RwLock::new(accounts))
}

fn register(runtime: &mut Runtime, accounts: &Accounts) -> Result<()> {
    runtime.register_void::<ProcessAccount, _>(|| {
        vec![
            Handler::pure(AuditHook),
            Handler::mediated(AccountExpediter),
        ]
    })?;

    let lookup = Arc::clone(accounts);
    runtime.register_default::<GetAccount, _>(move || {
        vec![Handler::reply(AccountRepository {
            accounts: Arc::clone(&lookup),
        })]
    })?;

    let store = Arc::clone(accounts);
    runtime.register_void::<SaveAccount, _>(move || {
        vec![
            Handler::pure(AuditHook),
            Handler::pure(AccountRepository {
                accounts: Arc::clone(&store),
            }),
        ]
    })?;

    Ok(())
}

fn main() -> Result<()> {
    let mut runtime = Runtime::builder().build()?;
    let accounts = seed_accounts();
    register(&mut runtime, &accounts)?;

    let mediator = runtime.start();

    for account_id in [1, 3, 42] {
        if let Err(e) = mediator.publish(ProcessAccount { account_id }) {
            warn!(account_id, error = %e, "Processing failed");
        }
    }

    let mut summary: Vec<_> = accounts.read().values().cloned().collect();
    summary.sort_by_key(|account| account.id);
    for account in summary {
        info!(
            id = account.id,
            owner = %account.owner,
            balance = account.balance,
            expedited = account.expedited,
            "Account"
        );
    }

    Ok(())
}
