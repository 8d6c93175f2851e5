//! The ledger's tables, their integrity rules, and the change sets that
//! mutate them.
//!
//! A [`LedgerState`] is immutable once a reader holds it as a snapshot.
//! Stores commit a [`ChangeSet`] with [`LedgerState::apply`], which checks
//! every constraint as it goes and journals each write; a failing change set
//! is undone from the journal, so it either applies completely or not at all.

use super::identity::{Temple, User, email_key};
use super::ids::{PaymentId, TempleId, TicketId, UserId};
use super::payment::{Amount, Payment, PaymentMode, PaymentStatus};
use super::ticket::{Ticket, VisitDatePolicy};
use crate::error::{EntityKind, LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// Points a payment at its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketRef {
    /// A ticket that is already committed.
    Existing(TicketId),
    /// The ticket created by the mutation at this index of the same change set.
    Staged(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateUser {
        name: String,
        email: Option<String>,
        phone: Option<String>,
    },
    UpdateContact {
        user: UserId,
        email: Option<String>,
        phone: Option<String>,
    },
    CreateTemple {
        name: String,
        location: String,
    },
    CreateTicket {
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
        requested_at: DateTime<Utc>,
        /// Checked against the final booking time, after clamping.
        policy: VisitDatePolicy,
    },
    RecordPayment {
        ticket: TicketRef,
        amount: Amount,
        mode: PaymentMode,
    },
    SetPaymentStatus {
        payment: PaymentId,
        status: PaymentStatus,
    },
}

/// An ordered group of mutations committed as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub mutations: Vec<Mutation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(mutation: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
        }
    }

    /// Appends a mutation and returns its index for [`TicketRef::Staged`].
    pub fn push(&mut self, mutation: Mutation) -> usize {
        self.mutations.push(mutation);
        self.mutations.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}

/// The committed record produced by each mutation, index-aligned with the change set.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    UserCreated(User),
    ContactUpdated(User),
    TempleCreated(Temple),
    TicketCreated(Ticket),
    PaymentRecorded(Payment),
    StatusChanged { payment: Payment, from: PaymentStatus },
}

/// The inverse of one write made while applying a change set.
#[derive(Debug)]
enum Undo {
    UserInserted(UserId),
    UserReplaced(User),
    EmailClaimed(String),
    EmailReleased(String, UserId),
    TempleInserted(TempleId),
    TicketInserted(TicketId),
    PaymentInserted(PaymentId, TicketId),
    PaymentReplaced(Payment),
}

#[derive(Debug, Clone, Copy)]
struct Counters {
    next_user: UserId,
    next_temple: TempleId,
    next_ticket: TicketId,
    next_payment: PaymentId,
    last_booked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct LedgerState {
    users: BTreeMap<UserId, User>,
    temples: BTreeMap<TempleId, Temple>,
    tickets: BTreeMap<TicketId, Ticket>,
    payments: BTreeMap<PaymentId, Payment>,
    emails: HashMap<String, UserId>,
    payment_by_ticket: HashMap<TicketId, PaymentId>,
    next_user: UserId,
    next_temple: TempleId,
    next_ticket: TicketId,
    next_payment: PaymentId,
    last_booked_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            users: BTreeMap::new(),
            temples: BTreeMap::new(),
            tickets: BTreeMap::new(),
            payments: BTreeMap::new(),
            emails: HashMap::new(),
            payment_by_ticket: HashMap::new(),
            next_user: UserId::FIRST,
            next_temple: TempleId::FIRST,
            next_ticket: TicketId::FIRST,
            next_payment: PaymentId::FIRST,
            last_booked_at: None,
            version: 0,
        }
    }

    /// Rebuilds a state, including its indexes and id counters, from
    /// previously committed rows.
    pub fn restore(
        users: Vec<User>,
        temples: Vec<Temple>,
        tickets: Vec<Ticket>,
        payments: Vec<Payment>,
    ) -> Result<Self> {
        let mut state = Self::new();
        for user in users {
            if let Some(email) = &user.email
                && state.emails.insert(email_key(email), user.id).is_some()
            {
                return Err(LedgerError::internal(format!(
                    "stored users share email {email}"
                )));
            }
            state.next_user = state.next_user.max(user.id.next());
            state.users.insert(user.id, user);
        }
        for temple in temples {
            state.next_temple = state.next_temple.max(temple.id.next());
            state.temples.insert(temple.id, temple);
        }
        for ticket in tickets {
            state.next_ticket = state.next_ticket.max(ticket.id.next());
            state.last_booked_at = state.last_booked_at.max(Some(ticket.booked_at));
            state.tickets.insert(ticket.id, ticket);
        }
        for payment in payments {
            if state
                .payment_by_ticket
                .insert(payment.ticket_id, payment.id)
                .is_some()
            {
                return Err(LedgerError::internal(format!(
                    "stored payments share ticket {}",
                    payment.ticket_id
                )));
            }
            state.next_payment = state.next_payment.max(payment.id.next());
            state.payments.insert(payment.id, payment);
        }
        Ok(state)
    }

    /// Number of change sets applied to this state since it was created or restored.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Applies every mutation in order, checking all constraints.
    ///
    /// On error every write made so far is undone and `self` is left as it was.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<Vec<Receipt>> {
        self.apply_with(changes, |_| Ok(()))
    }

    /// Like [`apply`](Self::apply), then hands the receipts to `persist`.
    /// A `persist` failure undoes the change set as well.
    pub fn apply_with(
        &mut self,
        changes: &ChangeSet,
        persist: impl FnOnce(&[Receipt]) -> Result<()>,
    ) -> Result<Vec<Receipt>> {
        let counters = self.counters();
        let mut journal = Vec::new();
        let mut receipts = Vec::with_capacity(changes.len());
        let applied = changes.mutations.iter().try_for_each(|mutation| -> Result<()> {
            let receipt = self.apply_one(mutation, &receipts, &mut journal)?;
            receipts.push(receipt);
            Ok(())
        });
        if let Err(e) = applied.and_then(|()| persist(&receipts)) {
            self.undo(journal, counters);
            return Err(e);
        }
        self.version += 1;
        Ok(receipts)
    }

    fn counters(&self) -> Counters {
        Counters {
            next_user: self.next_user,
            next_temple: self.next_temple,
            next_ticket: self.next_ticket,
            next_payment: self.next_payment,
            last_booked_at: self.last_booked_at,
        }
    }

    fn undo(&mut self, journal: Vec<Undo>, counters: Counters) {
        for entry in journal.into_iter().rev() {
            match entry {
                Undo::UserInserted(id) => {
                    self.users.remove(&id);
                }
                Undo::UserReplaced(user) => {
                    self.users.insert(user.id, user);
                }
                Undo::EmailClaimed(key) => {
                    self.emails.remove(&key);
                }
                Undo::EmailReleased(key, owner) => {
                    self.emails.insert(key, owner);
                }
                Undo::TempleInserted(id) => {
                    self.temples.remove(&id);
                }
                Undo::TicketInserted(id) => {
                    self.tickets.remove(&id);
                }
                Undo::PaymentInserted(id, ticket) => {
                    self.payments.remove(&id);
                    self.payment_by_ticket.remove(&ticket);
                }
                Undo::PaymentReplaced(payment) => {
                    self.payments.insert(payment.id, payment);
                }
            }
        }
        self.next_user = counters.next_user;
        self.next_temple = counters.next_temple;
        self.next_ticket = counters.next_ticket;
        self.next_payment = counters.next_payment;
        self.last_booked_at = counters.last_booked_at;
    }

    fn apply_one(
        &mut self,
        mutation: &Mutation,
        staged: &[Receipt],
        journal: &mut Vec<Undo>,
    ) -> Result<Receipt> {
        match mutation {
            Mutation::CreateUser { name, email, phone } => {
                if let Some(email) = email {
                    self.claim_email(email, None)?;
                }
                let id = self.next_user;
                self.next_user = id.next();
                let user = User {
                    id,
                    name: name.clone(),
                    email: email.clone(),
                    phone: phone.clone(),
                };
                if let Some(email) = email {
                    let key = email_key(email);
                    self.emails.insert(key.clone(), id);
                    journal.push(Undo::EmailClaimed(key));
                }
                self.users.insert(id, user.clone());
                journal.push(Undo::UserInserted(id));
                Ok(Receipt::UserCreated(user))
            }
            Mutation::UpdateContact { user, email, phone } => {
                let current = self.users.get(user).ok_or(LedgerError::NotFound {
                    entity: EntityKind::User,
                    id: user.value(),
                })?;
                if let Some(email) = email {
                    self.claim_email(email, Some(*user))?;
                }
                journal.push(Undo::UserReplaced(current.clone()));
                if let Some(old) = &current.email {
                    let key = email_key(old);
                    self.emails.remove(&key);
                    journal.push(Undo::EmailReleased(key, *user));
                }
                if let Some(email) = email {
                    let key = email_key(email);
                    self.emails.insert(key.clone(), *user);
                    journal.push(Undo::EmailClaimed(key));
                }
                let updated = self
                    .users
                    .get_mut(user)
                    .ok_or_else(|| LedgerError::internal("user vanished during update"))?;
                updated.email = email.clone();
                updated.phone = phone.clone();
                Ok(Receipt::ContactUpdated(updated.clone()))
            }
            Mutation::CreateTemple { name, location } => {
                let id = self.next_temple;
                self.next_temple = id.next();
                let temple = Temple {
                    id,
                    name: name.clone(),
                    location: location.clone(),
                };
                self.temples.insert(id, temple.clone());
                journal.push(Undo::TempleInserted(id));
                Ok(Receipt::TempleCreated(temple))
            }
            Mutation::CreateTicket {
                user,
                temple,
                visit_date,
                requested_at,
                policy,
            } => {
                if !self.users.contains_key(user) {
                    return Err(LedgerError::ReferentialIntegrity {
                        entity: EntityKind::User,
                        id: user.value(),
                    });
                }
                if !self.temples.contains_key(temple) {
                    return Err(LedgerError::ReferentialIntegrity {
                        entity: EntityKind::Temple,
                        id: temple.value(),
                    });
                }
                let booked_at = match self.last_booked_at {
                    Some(last) if last > *requested_at => last,
                    _ => *requested_at,
                };
                policy.check(*visit_date, booked_at)?;
                let id = self.next_ticket;
                self.next_ticket = id.next();
                self.last_booked_at = Some(booked_at);
                let ticket = Ticket {
                    id,
                    user_id: *user,
                    temple_id: *temple,
                    visit_date: *visit_date,
                    booked_at,
                };
                self.tickets.insert(id, ticket.clone());
                journal.push(Undo::TicketInserted(id));
                Ok(Receipt::TicketCreated(ticket))
            }
            Mutation::RecordPayment {
                ticket,
                amount,
                mode,
            } => {
                let ticket_id = match ticket {
                    TicketRef::Existing(id) => *id,
                    TicketRef::Staged(index) => match staged.get(*index) {
                        Some(Receipt::TicketCreated(ticket)) => ticket.id,
                        _ => {
                            return Err(LedgerError::InvalidArgument(format!(
                                "change set entry {index} did not create a ticket"
                            )));
                        }
                    },
                };
                if !self.tickets.contains_key(&ticket_id) {
                    return Err(LedgerError::ReferentialIntegrity {
                        entity: EntityKind::Ticket,
                        id: ticket_id.value(),
                    });
                }
                if let Some(existing) = self.payment_by_ticket.get(&ticket_id) {
                    return Err(LedgerError::DuplicateKey {
                        entity: EntityKind::Payment,
                        key: format!("ticket {ticket_id} already has payment {existing}"),
                    });
                }
                let id = self.next_payment;
                self.next_payment = id.next();
                let payment = Payment::new(id, ticket_id, *amount, mode.clone());
                self.payment_by_ticket.insert(ticket_id, id);
                self.payments.insert(id, payment.clone());
                journal.push(Undo::PaymentInserted(id, ticket_id));
                Ok(Receipt::PaymentRecorded(payment))
            }
            Mutation::SetPaymentStatus { payment, status } => {
                let stored = self
                    .payments
                    .get_mut(payment)
                    .ok_or(LedgerError::NotFound {
                        entity: EntityKind::Payment,
                        id: payment.value(),
                    })?;
                let before = stored.clone();
                let from = stored.transition(*status)?;
                journal.push(Undo::PaymentReplaced(before));
                Ok(Receipt::StatusChanged {
                    payment: stored.clone(),
                    from,
                })
            }
        }
    }

    fn claim_email(&self, email: &str, owner: Option<UserId>) -> Result<()> {
        match self.emails.get(&email_key(email)) {
            Some(holder) if Some(*holder) != owner => Err(LedgerError::DuplicateKey {
                entity: EntityKind::User,
                key: format!("email {email}"),
            }),
            _ => Ok(()),
        }
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn temple(&self, id: TempleId) -> Option<&Temple> {
        self.temples.get(&id)
    }

    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.get(&id)
    }

    pub fn payment(&self, id: PaymentId) -> Option<&Payment> {
        self.payments.get(&id)
    }

    pub fn payment_for_ticket(&self, ticket: TicketId) -> Option<&Payment> {
        self.payment_by_ticket
            .get(&ticket)
            .and_then(|id| self.payments.get(id))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn temples(&self) -> impl Iterator<Item = &Temple> {
        self.temples.values()
    }

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values()
    }

    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.payments.values()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }

    /// Tickets matching `filter`, ordered by booking time then id.
    pub fn tickets_where(&self, filter: impl Fn(&Ticket) -> bool) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .values()
            .filter(|t| filter(t))
            .cloned()
            .collect();
        tickets.sort_by_key(|t| (t.booked_at, t.id));
        tickets
    }
}
