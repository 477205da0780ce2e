use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::cash::{CashContract, CashHolding};
use crate::contract::IouContract;
use crate::error::{ContractViolation, CoreError};
use crate::note::DebtNote;
use crate::types::{LinearId, OwningKey, Party};

/// BLAKE3 hash of a wire transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidKey(format!("invalid tx id: {}", e)))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::InvalidKey(format!("tx id must be 32 bytes, got {}", bytes.len())))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Pointer to the `index`-th output of transaction `tx_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    pub tx_id: TxId,
    pub index: u32,
}

impl StateRef {
    pub fn new(tx_id: TxId, index: u32) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tx_id, self.index)
    }
}

/// Any state a transaction can consume or produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    Iou(DebtNote),
    Cash(CashHolding),
}

impl LedgerState {
    pub fn as_note(&self) -> Option<&DebtNote> {
        match self {
            Self::Iou(note) => Some(note),
            _ => None,
        }
    }

    pub fn as_cash(&self) -> Option<&CashHolding> {
        match self {
            Self::Cash(cash) => Some(cash),
            _ => None,
        }
    }
}

impl From<DebtNote> for LedgerState {
    fn from(note: DebtNote) -> Self {
        Self::Iou(note)
    }
}

impl From<CashHolding> for LedgerState {
    fn from(cash: CashHolding) -> Self {
        Self::Cash(cash)
    }
}

/// Intents understood by [`IouContract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IouCommand {
    Issue,
    Transfer,
    Settle,
}

impl fmt::Display for IouCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "Issue"),
            Self::Transfer => write!(f, "Transfer"),
            Self::Settle => write!(f, "Settle"),
        }
    }
}

/// Intents understood by [`CashContract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashCommand {
    Issue,
    Move,
}

/// Command payload. `Other` carries commands owned by contracts this ledger
/// does not know; they are ignored by both contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandData {
    Iou(IouCommand),
    Cash(CashCommand),
    Other(String),
}

impl From<IouCommand> for CommandData {
    fn from(cmd: IouCommand) -> Self {
        Self::Iou(cmd)
    }
}

impl From<CashCommand> for CommandData {
    fn from(cmd: CashCommand) -> Self {
        Self::Cash(cmd)
    }
}

/// A command plus the keys that must sign for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub data: CommandData,
    pub signers: Vec<OwningKey>,
}

impl Command {
    pub fn new(data: impl Into<CommandData>, signers: Vec<OwningKey>) -> Self {
        Self {
            data: data.into(),
            signers,
        }
    }

    /// Signers with duplicates collapsed.
    pub fn signer_set(&self) -> BTreeSet<OwningKey> {
        self.signers.iter().copied().collect()
    }
}

/// A resolved state together with where it lives on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef<T> {
    pub state: T,
    pub notary: Party,
    pub reference: StateRef,
}

impl<T: Into<LedgerState>> StateAndRef<T> {
    pub fn into_any(self) -> StateAndRef<LedgerState> {
        StateAndRef {
            state: self.state.into(),
            notary: self.notary,
            reference: self.reference,
        }
    }
}

impl StateAndRef<LedgerState> {
    pub fn to_note(&self) -> Option<StateAndRef<DebtNote>> {
        self.state.as_note().map(|note| StateAndRef {
            state: note.clone(),
            notary: self.notary.clone(),
            reference: self.reference,
        })
    }

    pub fn to_cash(&self) -> Option<StateAndRef<CashHolding>> {
        self.state.as_cash().map(|cash| StateAndRef {
            state: cash.clone(),
            notary: self.notary.clone(),
            reference: self.reference,
        })
    }
}

/// The signed content of a transaction. Inputs are references only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    pub inputs: Vec<StateRef>,
    pub outputs: Vec<LedgerState>,
    pub commands: Vec<Command>,
    pub notary: Party,
    /// Random salt so that otherwise identical transactions get distinct ids.
    pub privacy_salt: uuid::Uuid,
}

impl WireTransaction {
    /// BLAKE3 over the canonical JSON encoding.
    pub fn id(&self) -> TxId {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        TxId(*blake3::hash(&bytes).as_bytes())
    }

    /// Whether the notary has to order this transaction. Only transactions
    /// that consume something can double-spend.
    pub fn needs_notary_signature(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// Every key that must sign: command signers, plus the notary when
    /// inputs are consumed.
    pub fn required_signing_keys(&self) -> BTreeSet<OwningKey> {
        let mut keys: BTreeSet<OwningKey> = self
            .commands
            .iter()
            .flat_map(|c| c.signers.iter().copied())
            .collect();
        if self.needs_notary_signature() {
            keys.insert(self.notary.owning_key);
        }
        keys
    }

    /// The `index`-th output as a ledger reference.
    pub fn out_ref(&self, index: usize) -> Option<StateAndRef<LedgerState>> {
        let id = self.id();
        self.outputs.get(index).map(|state| StateAndRef {
            state: state.clone(),
            notary: self.notary.clone(),
            reference: StateRef::new(id, index as u32),
        })
    }

    /// All outputs as ledger references.
    pub fn out_refs(&self) -> Vec<StateAndRef<LedgerState>> {
        let id = self.id();
        self.outputs
            .iter()
            .enumerate()
            .map(|(index, state)| StateAndRef {
                state: state.clone(),
                notary: self.notary.clone(),
                reference: StateRef::new(id, index as u32),
            })
            .collect()
    }

    /// Resolve input references into states.
    pub fn resolve<F>(&self, mut lookup: F) -> Result<LedgerTransaction, CoreError>
    where
        F: FnMut(&StateRef) -> Option<StateAndRef<LedgerState>>,
    {
        let inputs = self
            .inputs
            .iter()
            .map(|r| lookup(r).ok_or(CoreError::UnresolvedInput(*r)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LedgerTransaction {
            id: self.id(),
            inputs,
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            notary: self.notary.clone(),
        })
    }
}

/// Notes of one lineage within a transaction.
#[derive(Debug)]
pub struct NoteGroup<'a> {
    pub lifecycle_id: &'a LinearId,
    pub inputs: Vec<&'a DebtNote>,
    pub outputs: Vec<&'a DebtNote>,
}

/// A transaction with its inputs resolved; what contracts verify.
#[derive(Debug, Clone)]
pub struct LedgerTransaction {
    pub id: TxId,
    pub inputs: Vec<StateAndRef<LedgerState>>,
    pub outputs: Vec<LedgerState>,
    pub commands: Vec<Command>,
    pub notary: Party,
}

impl LedgerTransaction {
    pub fn input_notes(&self) -> Vec<&DebtNote> {
        self.inputs.iter().filter_map(|i| i.state.as_note()).collect()
    }

    pub fn output_notes(&self) -> Vec<&DebtNote> {
        self.outputs.iter().filter_map(|o| o.as_note()).collect()
    }

    pub fn input_cash(&self) -> Vec<&CashHolding> {
        self.inputs.iter().filter_map(|i| i.state.as_cash()).collect()
    }

    pub fn output_cash(&self) -> Vec<&CashHolding> {
        self.outputs.iter().filter_map(|o| o.as_cash()).collect()
    }

    /// Group input and output notes by lifecycle id, in order of first
    /// appearance.
    pub fn group_notes(&self) -> Vec<NoteGroup<'_>> {
        let mut groups: Vec<NoteGroup<'_>> = Vec::new();
        for note in self.input_notes() {
            match groups.iter_mut().find(|g| *g.lifecycle_id == note.lifecycle_id) {
                Some(group) => group.inputs.push(note),
                None => groups.push(NoteGroup {
                    lifecycle_id: &note.lifecycle_id,
                    inputs: vec![note],
                    outputs: Vec::new(),
                }),
            }
        }
        for note in self.output_notes() {
            match groups.iter_mut().find(|g| *g.lifecycle_id == note.lifecycle_id) {
                Some(group) => group.outputs.push(note),
                None => groups.push(NoteGroup {
                    lifecycle_id: &note.lifecycle_id,
                    inputs: Vec::new(),
                    outputs: vec![note],
                }),
            }
        }
        groups
    }

    pub fn iou_commands(&self) -> Vec<(IouCommand, &Command)> {
        self.commands
            .iter()
            .filter_map(|c| match c.data {
                CommandData::Iou(cmd) => Some((cmd, c)),
                _ => None,
            })
            .collect()
    }

    pub fn cash_commands(&self) -> Vec<(CashCommand, &Command)> {
        self.commands
            .iter()
            .filter_map(|c| match c.data {
                CommandData::Cash(cmd) => Some((cmd, c)),
                _ => None,
            })
            .collect()
    }

    /// Run every contract that governs a state or command in this
    /// transaction.
    pub fn verify(&self) -> Result<(), ContractViolation> {
        let touches_notes = !self.input_notes().is_empty()
            || !self.output_notes().is_empty()
            || !self.iou_commands().is_empty();
        if touches_notes {
            IouContract::verify(self)?;
        }

        let touches_cash = !self.input_cash().is_empty()
            || !self.output_cash().is_empty()
            || !self.cash_commands().is_empty();
        if touches_cash {
            CashContract::verify(self)?;
        }

        tracing::debug!(tx_id = %self.id, "transaction verified");
        Ok(())
    }
}

/// Incrementally assembles a transaction. Inputs are held resolved so the
/// builder can be verified before anything is signed.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    notary: Party,
    inputs: Vec<StateAndRef<LedgerState>>,
    outputs: Vec<LedgerState>,
    commands: Vec<Command>,
    privacy_salt: uuid::Uuid,
}

impl TransactionBuilder {
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            privacy_salt: uuid::Uuid::new_v4(),
        }
    }

    pub fn add_input_state(&mut self, input: StateAndRef<LedgerState>) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn add_output_state(&mut self, state: impl Into<LedgerState>) -> &mut Self {
        self.outputs.push(state.into());
        self
    }

    pub fn add_command(&mut self, data: impl Into<CommandData>, signers: Vec<OwningKey>) -> &mut Self {
        self.commands.push(Command::new(data, signers));
        self
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn inputs(&self) -> &[StateAndRef<LedgerState>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[LedgerState] {
        &self.outputs
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn to_wire_transaction(&self) -> WireTransaction {
        WireTransaction {
            inputs: self.inputs.iter().map(|i| i.reference).collect(),
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            notary: self.notary.clone(),
            privacy_salt: self.privacy_salt,
        }
    }

    pub fn to_ledger_transaction(&self) -> LedgerTransaction {
        let wire = self.to_wire_transaction();
        LedgerTransaction {
            id: wire.id(),
            inputs: self.inputs.clone(),
            outputs: wire.outputs,
            commands: wire.commands,
            notary: wire.notary,
        }
    }

    /// Contract-verify the transaction as built so far.
    pub fn verify(&self) -> Result<(), ContractViolation> {
        self.to_ledger_transaction().verify()
    }
}

/// A signature over a transaction id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub by: OwningKey,
    pub bytes: Vec<u8>,
}

/// A wire transaction plus the signatures collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: WireTransaction,
    pub sigs: Vec<TransactionSignature>,
}

impl SignedTransaction {
    pub fn new(tx: WireTransaction, sigs: Vec<TransactionSignature>) -> Self {
        Self { tx, sigs }
    }

    pub fn id(&self) -> TxId {
        self.tx.id()
    }

    /// Keys that have signed.
    pub fn signing_keys(&self) -> BTreeSet<OwningKey> {
        self.sigs.iter().map(|s| s.by).collect()
    }

    /// Required keys that have not signed yet.
    pub fn missing_signatures(&self) -> BTreeSet<OwningKey> {
        let signed = self.signing_keys();
        self.tx
            .required_signing_keys()
            .into_iter()
            .filter(|k| !signed.contains(k))
            .collect()
    }

    /// A copy with `extra` appended. Signatures from keys that already
    /// signed are dropped.
    pub fn with_additional_signatures(
        &self,
        extra: impl IntoIterator<Item = TransactionSignature>,
    ) -> SignedTransaction {
        let mut sigs = self.sigs.clone();
        for sig in extra {
            if !sigs.iter().any(|s| s.by == sig.by) {
                sigs.push(sig);
            }
        }
        SignedTransaction {
            tx: self.tx.clone(),
            sigs,
        }
    }
}
