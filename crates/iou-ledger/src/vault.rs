use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use iou_core::{
    Amount, CashHolding, Currency, DebtNote, LedgerState, LinearId, SignedTransaction, StateAndRef,
    StateRef, TxId,
};

use crate::error::LedgerError;
use crate::keys::KeyManagementService;

/// A node's view of the ledger.
///
/// Stores every transaction the node has seen and tracks which outputs
/// relevant to the node are still unconsumed. An output is relevant when
/// the node holds one of its participant keys (for notes) or its owner key
/// (for cash).
pub struct NodeVault {
    keys: Arc<KeyManagementService>,
    transactions: DashMap<TxId, SignedTransaction>,
    unconsumed: DashMap<StateRef, StateAndRef<LedgerState>>,
    consumed: DashMap<StateRef, TxId>,
}

impl NodeVault {
    pub fn new(keys: Arc<KeyManagementService>) -> Self {
        Self {
            keys,
            transactions: DashMap::new(),
            unconsumed: DashMap::new(),
            consumed: DashMap::new(),
        }
    }

    fn is_relevant(&self, state: &LedgerState) -> bool {
        match state {
            LedgerState::Iou(note) => note.participant_keys().iter().any(|k| self.keys.owns(k)),
            LedgerState::Cash(cash) => self.keys.owns(&cash.owner),
        }
    }

    /// Record a finalised transaction: consume its inputs and track its
    /// relevant outputs. Recording the same transaction twice is a no-op.
    pub fn record_transaction(&self, stx: &SignedTransaction) {
        let id = stx.id();
        if self.transactions.contains_key(&id) {
            tracing::debug!(tx_id = %id, "transaction already recorded");
            return;
        }
        self.transactions.insert(id, stx.clone());

        for input in &stx.tx.inputs {
            self.unconsumed.remove(input);
            self.consumed.insert(*input, id);
        }

        let mut produced = 0usize;
        for out in stx.tx.out_refs() {
            if self.is_relevant(&out.state) && !self.consumed.contains_key(&out.reference) {
                self.unconsumed.insert(out.reference, out);
                produced += 1;
            }
        }
        tracing::info!(
            tx_id = %id,
            consumed = stx.tx.inputs.len(),
            produced,
            "recorded transaction"
        );
    }

    /// Store a transaction needed only to resolve inputs. Does not touch
    /// the unconsumed set.
    pub fn store_dependency(&self, stx: &SignedTransaction) {
        self.transactions.entry(stx.id()).or_insert_with(|| stx.clone());
    }

    pub fn transaction(&self, id: &TxId) -> Option<SignedTransaction> {
        self.transactions.get(id).map(|t| t.value().clone())
    }

    /// Look up any output of any stored transaction.
    pub fn resolve_state(&self, reference: &StateRef) -> Option<StateAndRef<LedgerState>> {
        self.transactions
            .get(&reference.tx_id)
            .and_then(|stx| stx.tx.out_ref(reference.index as usize))
    }

    pub fn is_consumed(&self, reference: &StateRef) -> bool {
        self.consumed.contains_key(reference)
    }

    fn sorted_unconsumed(&self) -> Vec<StateAndRef<LedgerState>> {
        let mut states: Vec<StateAndRef<LedgerState>> =
            self.unconsumed.iter().map(|e| e.value().clone()).collect();
        states.sort_by(|a, b| a.reference.cmp(&b.reference));
        states
    }

    pub fn unconsumed_notes(&self) -> Vec<StateAndRef<DebtNote>> {
        self.sorted_unconsumed().iter().filter_map(|s| s.to_note()).collect()
    }

    pub fn unconsumed_cash(&self) -> Vec<StateAndRef<CashHolding>> {
        self.sorted_unconsumed().iter().filter_map(|s| s.to_cash()).collect()
    }

    /// The current version of a note. Exactly one unconsumed version must
    /// exist.
    pub fn note_by_id(&self, id: &LinearId) -> Result<StateAndRef<DebtNote>, LedgerError> {
        let mut matches: Vec<StateAndRef<DebtNote>> = self
            .unconsumed_notes()
            .into_iter()
            .filter(|n| n.state.lifecycle_id == *id)
            .collect();
        match matches.len() {
            0 => Err(LedgerError::NoteNotFound(id.clone())),
            1 => Ok(matches.remove(0)),
            count => Err(LedgerError::AmbiguousNote {
                id: id.clone(),
                count,
            }),
        }
    }

    /// Spendable cash in `currency`.
    pub fn cash_balance(&self, currency: Currency) -> Result<Amount, LedgerError> {
        let holdings: Vec<StateAndRef<CashHolding>> = self
            .unconsumed_cash()
            .into_iter()
            .filter(|c| c.state.amount.currency == currency)
            .collect();
        let total = CashHolding::sum_without_issuer(holdings.iter().map(|c| &c.state))?;
        Ok(total.unwrap_or_else(|| Amount::zero(currency)))
    }

    /// Spendable cash per currency held.
    pub fn cash_balances(&self) -> Result<BTreeMap<Currency, Amount>, LedgerError> {
        let mut balances: BTreeMap<Currency, Amount> = BTreeMap::new();
        for holding in self.unconsumed_cash() {
            let amount = holding.state.amount;
            let total = match balances.remove(&amount.currency) {
                Some(existing) => existing.checked_add(&amount)?,
                None => amount,
            };
            balances.insert(total.currency, total);
        }
        Ok(balances)
    }
}
