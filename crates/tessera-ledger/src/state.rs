use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tessera_core::{Address, AliasId, OutputId, TransactionId};

use crate::error::LedgerError;
use crate::output::{
    compute_storage_deposit, AliasOutput, BasicOutput, Output, OutputFilter, ProtocolParameters,
};
use crate::transaction::Transaction;

/// Effect of an accepted transaction, in the form a store persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub transaction_id: TransactionId,
    /// New outputs with their assigned ids (alias ids filled in).
    pub created: Vec<(OutputId, Output)>,
    pub spent: Vec<OutputId>,
}

/// The unspent output set and the rules for changing it.
#[derive(Debug, Clone)]
pub struct LedgerState {
    params: ProtocolParameters,
    unspent: BTreeMap<OutputId, Output>,
    aliases: HashMap<AliasId, OutputId>,
}

impl LedgerState {
    pub fn new(params: ProtocolParameters) -> Self {
        Self {
            params,
            unspent: BTreeMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Rebuild state from a persisted unspent set.
    pub fn from_outputs(
        params: ProtocolParameters,
        outputs: impl IntoIterator<Item = (OutputId, Output)>,
    ) -> Self {
        let mut state = Self::new(params);
        for (id, output) in outputs {
            state.insert(id, output);
        }
        state
    }

    pub fn params(&self) -> &ProtocolParameters {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.unspent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unspent.is_empty()
    }

    pub fn basic_output_ids(&self, filter: &OutputFilter) -> Vec<OutputId> {
        self.unspent
            .iter()
            .filter_map(|(id, output)| match output {
                Output::Basic(basic) if filter.matches(basic) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn get_output(&self, id: &OutputId) -> Option<&Output> {
        self.unspent.get(id)
    }

    pub fn get_alias_output(&self, alias_id: &AliasId) -> Option<(OutputId, &AliasOutput)> {
        let id = self.aliases.get(alias_id)?;
        let output = self.unspent.get(id)?.as_alias()?;
        Some((*id, output))
    }

    /// The output a faucet request for `address` would create.
    pub fn faucet_output(&self, address: &Address) -> Result<AppliedTransaction, LedgerError> {
        self.check_network(address)?;
        let transaction_id = TransactionId::new(rand::random());
        let id = OutputId::new(transaction_id, 0);
        let output = Output::Basic(BasicOutput::new(self.params.faucet_amount, address.clone()));
        Ok(AppliedTransaction {
            transaction_id,
            created: vec![(id, output)],
            spent: Vec::new(),
        })
    }

    /// Mint the faucet amount to an address.
    pub fn mint(&mut self, address: &Address) -> Result<(OutputId, Output), LedgerError> {
        let minted = self.faucet_output(address)?;
        self.commit(&minted);
        let (id, output) = minted.created.into_iter().next().ok_or_else(|| {
            LedgerError::InvalidTransaction("faucet produced no output".into())
        })?;
        tracing::info!(address = %address, output_id = %id, amount = output.amount(), "Minted faucet output");
        Ok((id, output))
    }

    /// Validate and apply a transaction at unix time `now`.
    ///
    /// Nothing changes unless every check passes.
    pub fn apply_transaction(
        &mut self,
        tx: &Transaction,
        now: u32,
    ) -> Result<AppliedTransaction, LedgerError> {
        let applied = self.check_transaction(tx, now)?;
        self.commit(&applied);
        Ok(applied)
    }

    /// Validate a transaction at unix time `now` and compute its effect
    /// without changing the state.
    pub fn check_transaction(
        &self,
        tx: &Transaction,
        now: u32,
    ) -> Result<AppliedTransaction, LedgerError> {
        let essence = &tx.essence;
        if essence.network != self.params.network_hrp {
            return Err(LedgerError::WrongNetwork {
                expected: self.params.network_hrp.clone(),
                actual: essence.network.clone(),
            });
        }
        if essence.inputs.is_empty() {
            return Err(LedgerError::InvalidTransaction("no inputs".into()));
        }
        if essence.outputs.is_empty() || essence.outputs.len() > u16::MAX as usize {
            return Err(LedgerError::InvalidTransaction(format!(
                "invalid output count {}",
                essence.outputs.len()
            )));
        }
        let unique: HashSet<&OutputId> = essence.inputs.iter().collect();
        if unique.len() != essence.inputs.len() {
            return Err(LedgerError::InvalidTransaction("duplicate input".into()));
        }

        tx.verify_signature()?;
        let signer = tx.signer_address(&self.params.network_hrp)?;

        // Inputs: existence and unlock conditions.
        let mut input_total: u64 = 0;
        let mut returns: HashMap<Address, u64> = HashMap::new();
        let mut consumed_aliases: HashMap<AliasId, &AliasOutput> = HashMap::new();
        for id in &essence.inputs {
            let output = self
                .unspent
                .get(id)
                .ok_or(LedgerError::InputNotFound(*id))?;
            match output {
                Output::Basic(basic) => {
                    if basic.timelock.is_some_and(|t| now < t) {
                        return Err(LedgerError::InputLocked(*id));
                    }
                    let unlock = basic.unlock_address(now);
                    if unlock != &signer {
                        return Err(LedgerError::UnlockFailed(*id));
                    }
                    if let Some(sdr) = &basic.storage_deposit_return {
                        if unlock == &basic.address {
                            *returns.entry(sdr.return_address.clone()).or_default() += sdr.amount;
                        }
                    }
                }
                Output::Alias(alias) => {
                    if alias.state_controller != signer {
                        return Err(LedgerError::UnlockFailed(*id));
                    }
                    consumed_aliases.insert(alias.alias_id, alias);
                }
            }
            input_total = input_total
                .checked_add(output.amount())
                .ok_or_else(|| LedgerError::InvalidTransaction("amount overflow".into()))?;
        }

        // Outputs: network, deposits and totals.
        let mut output_total: u64 = 0;
        for output in &essence.outputs {
            for address in output.addresses() {
                self.check_network(address)?;
            }
            let required = compute_storage_deposit(output, &self.params.rent_structure);
            if output.amount() < required {
                return Err(LedgerError::InsufficientStorageDeposit {
                    required,
                    actual: output.amount(),
                });
            }
            output_total = output_total
                .checked_add(output.amount())
                .ok_or_else(|| LedgerError::InvalidTransaction("amount overflow".into()))?;
        }
        if input_total != output_total {
            return Err(LedgerError::AmountMismatch {
                inputs: input_total,
                outputs: output_total,
            });
        }

        for (return_address, required) in &returns {
            let paid: u64 = essence
                .outputs
                .iter()
                .filter_map(Output::as_basic)
                .filter(|b| &b.address == return_address && !b.has_conditions())
                .map(|b| b.amount)
                .sum();
            if paid < *required {
                return Err(LedgerError::StorageDepositReturn(format!(
                    "{} must receive {} but receives {}",
                    return_address, required, paid
                )));
            }
        }

        let transaction_id = tx.id()?;

        // Alias transitions.
        let mut created = Vec::with_capacity(essence.outputs.len());
        for (index, output) in essence.outputs.iter().enumerate() {
            let id = OutputId::new(transaction_id, index as u16);
            let mut output = output.clone();
            if let Output::Alias(alias) = &mut output {
                if alias.alias_id.is_null() {
                    if alias.state_index != 0 {
                        return Err(LedgerError::AliasTransition(
                            "new alias must start at state index 0".into(),
                        ));
                    }
                    alias.alias_id = AliasId::from_output_id(&id);
                } else {
                    let previous = consumed_aliases.remove(&alias.alias_id).ok_or_else(|| {
                        LedgerError::AliasTransition(format!(
                            "alias {} is not consumed by this transaction",
                            alias.alias_id
                        ))
                    })?;
                    if alias.state_index != previous.state_index.wrapping_add(1) {
                        return Err(LedgerError::AliasTransition(format!(
                            "state index must be {}, got {}",
                            previous.state_index.wrapping_add(1),
                            alias.state_index
                        )));
                    }
                    if alias.governor != previous.governor {
                        return Err(LedgerError::AliasTransition(
                            "governor can not change on a state transition".into(),
                        ));
                    }
                }
            }
            created.push((id, output));
        }

        // Aliases consumed without a successor are destroyed, which only the
        // governor may do.
        for (alias_id, alias) in &consumed_aliases {
            if alias.governor != signer {
                return Err(LedgerError::AliasTransition(format!(
                    "alias {} can only be destroyed by its governor",
                    alias_id
                )));
            }
        }

        Ok(AppliedTransaction {
            transaction_id,
            created,
            spent: essence.inputs.clone(),
        })
    }

    /// Make a checked change visible. `applied` must come from
    /// [`check_transaction`](Self::check_transaction) or
    /// [`faucet_output`](Self::faucet_output) against the current state.
    pub fn commit(&mut self, applied: &AppliedTransaction) {
        for id in &applied.spent {
            if let Some(Output::Alias(alias)) = self.unspent.remove(id) {
                if self.aliases.get(&alias.alias_id) == Some(id) {
                    self.aliases.remove(&alias.alias_id);
                }
            }
        }
        for (id, output) in &applied.created {
            self.insert(*id, output.clone());
        }

        tracing::info!(
            transaction_id = %applied.transaction_id,
            inputs = applied.spent.len(),
            outputs = applied.created.len(),
            "Applied transaction"
        );
    }

    fn insert(&mut self, id: OutputId, output: Output) {
        if let Output::Alias(alias) = &output {
            self.aliases.insert(alias.alias_id, id);
        }
        self.unspent.insert(id, output);
    }

    fn check_network(&self, address: &Address) -> Result<(), LedgerError> {
        if address.hrp() != self.params.network_hrp {
            return Err(LedgerError::WrongNetwork {
                expected: self.params.network_hrp.clone(),
                actual: address.hrp().to_string(),
            });
        }
        Ok(())
    }
}
